//! Feature engineering for the solar and wind estimators
//!
//! Turns cleaned historical rows or live weather observations into the fixed
//! feature layout both estimators are trained on. In training mode the
//! source-type encoder is fit and target labels are derived; in inference
//! mode the previously fitted encoder is applied verbatim.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::StandardScaler;
use crate::config::{ModelConfig, SiteConfig};
use crate::domain::{HistoricalRecord, WeatherObservation};
use crate::error::{ForecastError, Result, Stage};

/// Code reserved for categories never seen during training
pub const UNKNOWN_CATEGORY_CODE: u32 = 0;

/// Column order of every engineered feature vector
pub const FEATURE_NAMES: [&str; 11] = [
    "source_type_encoded",
    "solar_irradiance",
    "wind_speed",
    "ambient_temperature",
    "humidity",
    "cloud_cover",
    "panel_area",
    "blade_length",
    "temperature_squared",
    "humidity_temperature_interaction",
    "solar_wind_interaction",
];

pub fn feature_names() -> Vec<String> {
    FEATURE_NAMES.iter().map(|s| s.to_string()).collect()
}

/// Stable category → code table.
///
/// Known categories are numbered from 1 in sorted order; 0 is reserved for
/// anything unseen at fit time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEncoder {
    codes: BTreeMap<String, u32>,
}

impl CategoryEncoder {
    pub fn fit<'a>(categories: impl IntoIterator<Item = &'a str>) -> Self {
        let mut names: Vec<String> = categories.into_iter().map(|c| c.trim().to_string()).collect();
        names.sort();
        names.dedup();

        let codes = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| (name, i as u32 + 1))
            .collect();
        Self { codes }
    }

    /// Code of a category seen at fit time
    pub fn code(&self, category: &str) -> Option<u32> {
        self.codes.get(category.trim()).copied()
    }

    pub fn encode_or_unknown(&self, category: &str) -> u32 {
        self.code(category).unwrap_or(UNKNOWN_CATEGORY_CODE)
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, u32)> {
        self.codes.iter().map(|(name, code)| (name.as_str(), *code))
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Fitted category table plus the feature scaler fit by the trainer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderState {
    pub encoder: CategoryEncoder,
    /// Absent until the trainer has fit it on the training partition
    pub scaler: Option<StandardScaler>,
}

impl EncoderState {
    pub fn new(encoder: CategoryEncoder) -> Self {
        Self {
            encoder,
            scaler: None,
        }
    }

    /// Standardize an engineered row with the bundled scaler
    pub fn scale(&self, features: &FeatureRow) -> Result<Vec<f64>> {
        let scaler = self.scaler.as_ref().ok_or(ForecastError::NotFitted {
            stage: Stage::Prediction,
        })?;
        scaler.transform(&features.to_vec())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureMode {
    Training,
    Inference,
}

/// Raw inputs shared by historical rows and live observations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureInput {
    pub source_type: Option<String>,
    pub solar_irradiance: Option<f64>,
    pub wind_speed: Option<f64>,
    pub ambient_temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub cloud_cover: Option<f64>,
    pub panel_area: Option<f64>,
    pub blade_length: Option<f64>,
}

impl From<&HistoricalRecord> for FeatureInput {
    fn from(record: &HistoricalRecord) -> Self {
        Self {
            source_type: record.source_type.clone(),
            solar_irradiance: record.solar_irradiance,
            wind_speed: record.wind_speed,
            ambient_temperature: record.ambient_temperature,
            humidity: record.humidity,
            cloud_cover: record.cloud_cover,
            panel_area: record.panel_area,
            blade_length: record.blade_length,
        }
    }
}

impl FeatureInput {
    /// Live observation completed with the site-fixed constants
    pub fn from_observation(observation: &WeatherObservation, site: &SiteConfig) -> Self {
        Self {
            source_type: Some(site.source_type.clone()),
            solar_irradiance: observation.solar_irradiance,
            wind_speed: observation.wind_speed,
            ambient_temperature: observation.temperature,
            humidity: observation.humidity,
            cloud_cover: observation.cloud_cover,
            panel_area: Some(site.panel_area_m2),
            blade_length: Some(site.blade_length_m),
        }
    }
}

/// Engineered feature values in [`FEATURE_NAMES`] order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub source_type_encoded: u32,
    pub solar_irradiance: f64,
    pub wind_speed: f64,
    pub ambient_temperature: f64,
    pub humidity: f64,
    pub cloud_cover: f64,
    pub panel_area: f64,
    pub blade_length: f64,
    pub temperature_squared: f64,
    pub humidity_temperature_interaction: f64,
    pub solar_wind_interaction: f64,
}

impl FeatureRow {
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.source_type_encoded as f64,
            self.solar_irradiance,
            self.wind_speed,
            self.ambient_temperature,
            self.humidity,
            self.cloud_cover,
            self.panel_area,
            self.blade_length,
            self.temperature_squared,
            self.humidity_temperature_interaction,
            self.solar_wind_interaction,
        ]
    }
}

/// Physically derived training targets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetLabels {
    pub solar_energy: f64,
    pub wind_energy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineeredRecord {
    pub features: FeatureRow,
    /// Present in training mode only
    pub labels: Option<TargetLabels>,
}

/// Non-fatal signal: a category unseen at training was mapped to the
/// reserved unknown code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingDegradation {
    pub row: usize,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineeredBatch {
    pub records: Vec<EngineeredRecord>,
    pub degradations: Vec<EncodingDegradation>,
}

impl EngineeredBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn feature_matrix(&self) -> Vec<Vec<f64>> {
        self.records.iter().map(|r| r.features.to_vec()).collect()
    }
}

pub struct FeatureEngine {
    solar_efficiency_factor: f64,
    wind_power_coefficient: f64,
}

impl FeatureEngine {
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            solar_efficiency_factor: config.solar_efficiency_factor,
            wind_power_coefficient: config.wind_power_coefficient,
        }
    }

    /// solar_irradiance × panel_area × solar_efficiency_factor
    pub fn solar_label(&self, solar_irradiance: f64, panel_area: f64) -> f64 {
        solar_irradiance * panel_area * self.solar_efficiency_factor
    }

    /// wind_speed³ × blade_length × wind_power_coefficient
    pub fn wind_label(&self, wind_speed: f64, blade_length: f64) -> f64 {
        wind_speed.powi(3) * blade_length * self.wind_power_coefficient
    }

    /// Engineer features (and labels in training mode).
    ///
    /// Training mode fits a fresh encoder from `inputs` and ignores `state`.
    /// Inference mode requires `state` and returns it unchanged.
    pub fn engineer(
        &self,
        inputs: &[FeatureInput],
        mode: FeatureMode,
        state: Option<&EncoderState>,
    ) -> Result<(EngineeredBatch, EncoderState)> {
        let state = match mode {
            FeatureMode::Training => {
                let mut categories = Vec::with_capacity(inputs.len());
                for (row, input) in inputs.iter().enumerate() {
                    match input.source_type.as_deref().map(str::trim) {
                        Some(category) if !category.is_empty() => categories.push(category),
                        _ => {
                            return Err(ForecastError::MissingField {
                                stage: Stage::FeatureEngineering,
                                row,
                                column: "source_type",
                            })
                        }
                    }
                }
                let encoder = CategoryEncoder::fit(categories);
                debug!(categories = encoder.len(), "fitted source type encoder");
                EncoderState::new(encoder)
            }
            FeatureMode::Inference => state
                .cloned()
                .ok_or(ForecastError::NotFitted {
                    stage: Stage::FeatureEngineering,
                })?,
        };

        let mut batch = EngineeredBatch {
            records: Vec::with_capacity(inputs.len()),
            degradations: Vec::new(),
        };

        for (row, input) in inputs.iter().enumerate() {
            let category = input.source_type.as_deref();
            let source_type_encoded = match category.and_then(|c| state.encoder.code(c)) {
                Some(code) => code,
                None => {
                    warn!(row, category = ?category, "unseen source type mapped to unknown code");
                    batch.degradations.push(EncodingDegradation {
                        row,
                        category: input.source_type.clone(),
                    });
                    UNKNOWN_CATEGORY_CODE
                }
            };

            let features = self.derive(row, input, source_type_encoded)?;
            let labels = (mode == FeatureMode::Training).then(|| TargetLabels {
                solar_energy: self.solar_label(features.solar_irradiance, features.panel_area),
                wind_energy: self.wind_label(features.wind_speed, features.blade_length),
            });

            batch.records.push(EngineeredRecord { features, labels });
        }

        Ok((batch, state))
    }

    fn derive(&self, row: usize, input: &FeatureInput, source_type_encoded: u32) -> Result<FeatureRow> {
        let require = |value: Option<f64>, column: &'static str| {
            value
                .filter(|v| !v.is_nan())
                .ok_or(ForecastError::MissingField {
                    stage: Stage::FeatureEngineering,
                    row,
                    column,
                })
        };

        let solar_irradiance = require(input.solar_irradiance, "solar_irradiance")?;
        let wind_speed = require(input.wind_speed, "wind_speed")?;
        let ambient_temperature = require(input.ambient_temperature, "ambient_temperature")?;
        let humidity = require(input.humidity, "humidity")?;
        let cloud_cover = require(input.cloud_cover, "cloud_cover")?;
        let panel_area = require(input.panel_area, "panel_area")?;
        let blade_length = require(input.blade_length, "blade_length")?;

        Ok(FeatureRow {
            source_type_encoded,
            solar_irradiance,
            wind_speed,
            ambient_temperature,
            humidity,
            cloud_cover,
            panel_area,
            blade_length,
            temperature_squared: ambient_temperature.powi(2),
            humidity_temperature_interaction: humidity * ambient_temperature,
            solar_wind_interaction: solar_irradiance * wind_speed,
        })
    }
}
