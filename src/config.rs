use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

use crate::error::{ForecastError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    pub model: ModelConfig,
    pub cleaning: CleaningConfig,
    pub weather: WeatherConfig,
    pub paths: PathsConfig,
}

/// Site-fixed installation constants shared by training and inference
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SiteConfig {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    /// m²
    #[validate(range(min = 0.0))]
    pub panel_area_m2: f64,
    /// m
    #[validate(range(min = 0.0))]
    pub blade_length_m: f64,
    /// Category fed to the source-type encoder for live observations
    pub source_type: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            latitude: 23.07708,
            longitude: 76.85131,
            timezone: "auto".to_string(),
            panel_area_m2: 10.0,
            blade_length_m: 30.0,
            source_type: "Solar".to_string(),
        }
    }
}

/// Target derivation constants and estimator hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ModelConfig {
    #[validate(range(exclusive_min = 0.0))]
    pub solar_efficiency_factor: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub wind_power_coefficient: f64,
    #[validate(range(min = 1))]
    pub n_trees: usize,
    pub max_depth: Option<u16>,
    #[validate(range(min = 2))]
    pub min_samples_split: usize,
    #[validate(range(min = 1))]
    pub min_samples_leaf: usize,
    /// Fraction of rows held out for evaluation
    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub test_size: f64,
    pub seed: u64,
    /// Shuffle (seeded) before splitting; false keeps input order
    pub shuffle: bool,
    #[validate(range(min = 2))]
    pub min_training_rows: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            solar_efficiency_factor: 0.15,
            wind_power_coefficient: 0.01,
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            test_size: 0.2,
            seed: 42,
            shuffle: true,
            min_training_rows: 10,
        }
    }
}

/// How many IQR passes the cleaner runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierMode {
    /// Recompute bounds on the survivors until a pass removes nothing.
    /// Makes cleaning idempotent but can trim rows inside the first-pass
    /// bounds on skewed columns.
    #[default]
    UntilStable,
    /// One pass against bounds computed on the deduplicated rows
    Single,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CleaningConfig {
    #[validate(range(exclusive_min = 0.0))]
    pub iqr_multiplier: f64,
    pub outlier_mode: OutlierMode,
    /// Rows that must survive cleaning for training to proceed
    #[validate(range(min = 1))]
    pub min_rows: usize,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            iqr_multiplier: 1.5,
            outlier_mode: OutlierMode::UntilStable,
            min_rows: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    pub base_url: String,
    pub http_timeout_seconds: u64,
    /// Days ahead of today to forecast (1 = tomorrow)
    pub days_ahead: u32,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.open-meteo.com/v1".to_string(),
            http_timeout_seconds: 30,
            days_ahead: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub historical_csv: PathBuf,
    pub model_file: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            historical_csv: PathBuf::from("data/merged.csv"),
            model_file: PathBuf::from("models/energy_model.bin"),
            output_dir: PathBuf::from("output"),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_figment(
            Figment::from(Serialized::defaults(Config::default()))
                .merge(Toml::file("config/default.toml"))
                .merge(Env::prefixed("FORECAST__").split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let cfg: Config = figment
            .extract()
            .map_err(|e| ForecastError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.site.latitude)
            || !(-180.0..=180.0).contains(&self.site.longitude)
        {
            return Err(ForecastError::Config(format!(
                "site coordinates out of range: ({}, {})",
                self.site.latitude, self.site.longitude
            )));
        }
        self.site.validate()?;
        self.model.validate()?;
        self.cleaning.validate()?;
        Ok(())
    }
}
