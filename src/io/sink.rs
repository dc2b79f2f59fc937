//! Output sink for prediction records.
//!
//! Writes the hourly series as CSV and one JSON summary per calendar date and
//! generation source.

use itertools::Itertools;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::domain::{DailyForecast, EnergySource, PredictionRecord};
use crate::error::{ForecastError, Result};

pub fn write_predictions_csv(path: impl AsRef<Path>, predictions: &[PredictionRecord]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for prediction in predictions {
        writer.serialize(prediction)?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = predictions.len(), "wrote hourly predictions");
    Ok(())
}

/// Daily summaries for every date present in `predictions`
pub fn daily_summaries(predictions: &[PredictionRecord]) -> Vec<DailyForecast> {
    predictions
        .iter()
        .map(|p| p.datetime.date())
        .unique()
        .flat_map(|date| {
            [EnergySource::Solar, EnergySource::Wind, EnergySource::Total]
                .into_iter()
                .map(move |source| DailyForecast::from_predictions(date, source, predictions))
        })
        .collect()
}

/// Write `{source}_energy_forecast_{date}.json` files into `dir`
pub fn write_daily_summaries(
    dir: impl AsRef<Path>,
    predictions: &[PredictionRecord],
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let mut written = Vec::new();
    for summary in daily_summaries(predictions) {
        let path = dir.join(format!(
            "{}_energy_forecast_{}.json",
            summary.source, summary.date
        ));
        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(writer, &summary).map_err(|e| ForecastError::Io(e.into()))?;
        info!(
            path = %path.display(),
            total_kwh = summary.total_generation_kwh,
            "wrote daily forecast"
        );
        written.push(path);
    }

    Ok(written)
}
