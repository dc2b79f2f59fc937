//! File-backed persistence for trained model bundles.

use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::Result;
use crate::ml::inference::TrainedModel;

pub fn save_model(model: &TrainedModel, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let bytes = model.to_bytes()?;
    fs::write(path, &bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), model_id = %model.model_id, "saved model bundle");
    Ok(())
}

pub fn load_model(path: impl AsRef<Path>) -> Result<TrainedModel> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let model = TrainedModel::from_bytes(&bytes)?;
    info!(path = %path.display(), model_id = %model.model_id, "loaded model bundle");
    Ok(model)
}
