//! Inference over live weather observations
//!
//! A [`TrainedModel`] bundles both forests with the exact encoder and scaler
//! they were trained against. The [`Predictor`] only ever scores features
//! produced through that bundled state and never updates it.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::features::{
    feature_names, EncoderState, FeatureEngine, FeatureInput, FeatureMode,
};
use super::smartcore::SmartcoreRandomForest;
use super::training::TrainingSummary;
use crate::config::{ModelConfig, SiteConfig};
use crate::domain::{PredictionRecord, WeatherObservation};
use crate::error::{ForecastError, Result, Stage};

/// Fitted solar and wind estimators plus the encoder state that produced
/// their training features
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainedModel {
    pub model_id: String,
    pub trained_at: chrono::DateTime<chrono::Utc>,
    pub solar: SmartcoreRandomForest,
    pub wind: SmartcoreRandomForest,
    pub encoder: EncoderState,
    /// Configuration the labels and estimators were derived with
    pub config: ModelConfig,
    pub summary: TrainingSummary,
}

impl TrainedModel {
    pub fn new(
        solar: SmartcoreRandomForest,
        wind: SmartcoreRandomForest,
        encoder: EncoderState,
        config: ModelConfig,
        summary: TrainingSummary,
    ) -> Self {
        Self {
            model_id: format!("energy_model_{}", uuid::Uuid::new_v4()),
            trained_at: chrono::Utc::now(),
            solar,
            wind,
            encoder,
            config,
            summary,
        }
    }

    /// Reject bundles whose parts were not produced by the same pipeline state
    pub fn ensure_consistent(&self) -> Result<()> {
        let expected = feature_names();
        let scaler = self.encoder.scaler.as_ref().ok_or(ForecastError::NotFitted {
            stage: Stage::Prediction,
        })?;

        for estimator in [&self.solar, &self.wind] {
            if estimator.metadata.feature_names != expected {
                return Err(ForecastError::Persistence(format!(
                    "`{}` estimator was trained on a different feature layout",
                    estimator.metadata.target
                )));
            }
        }
        if scaler.n_features() != expected.len() {
            return Err(ForecastError::Persistence(format!(
                "scaler expects {} features, pipeline produces {}",
                scaler.n_features(),
                expected.len()
            )));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| ForecastError::Persistence(format!("failed to serialize model: {e}")))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let model: Self = bincode::deserialize(bytes)
            .map_err(|e| ForecastError::Persistence(format!("failed to deserialize model: {e}")))?;
        model.ensure_consistent()?;
        Ok(model)
    }
}

pub struct Predictor {
    site: SiteConfig,
}

impl Predictor {
    pub fn new(site: SiteConfig) -> Self {
        Self { site }
    }

    /// One prediction per observation, in input order.
    ///
    /// Negative raw estimates are clamped to zero. The total is the sum of
    /// the clamped solar and wind estimates.
    pub fn predict(
        &self,
        observations: &[WeatherObservation],
        model: &TrainedModel,
    ) -> Result<Vec<PredictionRecord>> {
        if observations.is_empty() {
            return Ok(Vec::new());
        }
        model.ensure_consistent()?;

        let inputs: Vec<FeatureInput> = observations
            .iter()
            .map(|o| FeatureInput::from_observation(o, &self.site))
            .collect();

        let (batch, _) = FeatureEngine::new(&model.config)
            .engineer(&inputs, FeatureMode::Inference, Some(&model.encoder))
            .map_err(|e| match e {
                ForecastError::MissingField { row, column, .. } => ForecastError::Prediction {
                    row,
                    reason: format!(
                        "observation at {} is missing required field `{column}`",
                        observations[row].datetime
                    ),
                },
                other => other,
            })?;

        if !batch.degradations.is_empty() {
            warn!(
                rows = batch.degradations.len(),
                category = %self.site.source_type,
                "scoring with unknown source type code"
            );
        }

        let scaled = batch
            .records
            .iter()
            .enumerate()
            .map(|(row, r)| {
                model
                    .encoder
                    .scale(&r.features)
                    .map_err(|e| match e {
                        err @ ForecastError::FeatureMismatch { .. } => ForecastError::Prediction {
                            row,
                            reason: err.to_string(),
                        },
                        other => other,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let solar = model.solar.predict(&scaled)?;
        let wind = model.wind.predict(&scaled)?;
        if solar.len() != observations.len() || wind.len() != observations.len() {
            return Err(ForecastError::Prediction {
                row: solar.len().min(wind.len()),
                reason: "estimator returned fewer predictions than observations".to_string(),
            });
        }

        let predictions: Vec<PredictionRecord> = observations
            .iter()
            .zip(solar.into_iter().zip(wind))
            .map(|(observation, (solar_raw, wind_raw))| {
                let predicted_solar_kwh = clamp_non_negative(solar_raw);
                let predicted_wind_kwh = clamp_non_negative(wind_raw);
                debug!(
                    datetime = %observation.datetime,
                    solar_raw,
                    wind_raw,
                    "scored observation"
                );
                PredictionRecord {
                    datetime: observation.datetime,
                    predicted_solar_kwh,
                    predicted_wind_kwh,
                    predicted_energy_kwh: predicted_solar_kwh + predicted_wind_kwh,
                }
            })
            .collect();

        info!(rows = predictions.len(), model_id = %model.model_id, "generated predictions");
        Ok(predictions)
    }
}

/// Negative or NaN generation estimates become 0.0
fn clamp_non_negative(value: f64) -> f64 {
    if value > 0.0 {
        value
    } else {
        0.0
    }
}
