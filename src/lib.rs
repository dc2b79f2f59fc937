//! Weather-based hourly solar and wind energy forecasting.
//!
//! Historical labeled records are cleaned, engineered and used to fit two
//! random-forest regressors (solar, wind). The resulting [`ml::inference::TrainedModel`]
//! is then applied to hourly weather observations to produce
//! [`domain::PredictionRecord`]s.

pub mod config;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod io;
pub mod ml;
pub mod pipeline;
pub mod telemetry;

pub use error::{ForecastError, Result, Stage};
pub use pipeline::{ForecastPipeline, TrainingOutcome};
