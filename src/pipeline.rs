//! Pipeline orchestration
//!
//! Sequences cleaning → feature engineering → training, and feature
//! engineering → prediction for live observations. The first failing stage
//! is surfaced as-is; there is no fallback model or default prediction.

use tracing::info;

use crate::config::{CleaningConfig, Config, ModelConfig, SiteConfig};
use crate::domain::{HistoricalRecord, PredictionRecord, WeatherObservation};
use crate::error::Result;
use crate::ml::cleaning::{CleaningReport, DataCleaner};
use crate::ml::features::{FeatureEngine, FeatureInput, FeatureMode};
use crate::ml::inference::{Predictor, TrainedModel};
use crate::ml::training::Trainer;

/// Model produced by a training run and what the cleaner removed.
///
/// Training fits the encoder on the rows it encodes, so unknown-category
/// degradations only arise at prediction time.
#[derive(Debug)]
pub struct TrainingOutcome {
    pub model: TrainedModel,
    pub cleaning: CleaningReport,
}

#[derive(Debug, Clone)]
pub struct ForecastPipeline {
    model: ModelConfig,
    cleaning: CleaningConfig,
    site: SiteConfig,
}

impl ForecastPipeline {
    pub fn new(model: ModelConfig, cleaning: CleaningConfig, site: SiteConfig) -> Self {
        Self {
            model,
            cleaning,
            site,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.model.clone(),
            config.cleaning.clone(),
            config.site.clone(),
        )
    }

    pub fn train(&self, historical: &[HistoricalRecord]) -> Result<TrainingOutcome> {
        let (cleaned, cleaning) = DataCleaner::new(self.cleaning.clone()).clean(historical)?;

        let inputs: Vec<FeatureInput> = cleaned.iter().map(FeatureInput::from).collect();
        let (batch, state) =
            FeatureEngine::new(&self.model).engineer(&inputs, FeatureMode::Training, None)?;

        let model = Trainer::new(self.model.clone()).train(&batch, state)?;
        info!(
            model_id = %model.model_id,
            rows = cleaned.len(),
            solar_r2 = model.summary.solar_metrics.r2,
            wind_r2 = model.summary.wind_metrics.r2,
            "training pipeline complete"
        );

        Ok(TrainingOutcome { model, cleaning })
    }

    pub fn predict(
        &self,
        observations: &[WeatherObservation],
        model: &TrainedModel,
    ) -> Result<Vec<PredictionRecord>> {
        Predictor::new(self.site.clone()).predict(observations, model)
    }

    /// Train on `historical`, then forecast `observations` with the result
    pub fn run(
        &self,
        historical: &[HistoricalRecord],
        observations: &[WeatherObservation],
    ) -> Result<(TrainingOutcome, Vec<PredictionRecord>)> {
        let outcome = self.train(historical)?;
        let predictions = self.predict(observations, &outcome.model)?;
        Ok((outcome, predictions))
    }
}
