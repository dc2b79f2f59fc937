use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pipeline stage an error or report originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    Loading,
    Cleaning,
    FeatureEngineering,
    Training,
    Prediction,
    Persistence,
}

/// Forecasting pipeline errors
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Schema error in {stage}: missing required column `{column}`")]
    Schema { stage: Stage, column: String },

    #[error("Insufficient data in {stage}: {rows} rows available, at least {required} required")]
    InsufficientData {
        stage: Stage,
        rows: usize,
        required: usize,
    },

    #[error("Training error: {0}")]
    Training(String),

    #[error("Prediction error at row {row}: {reason}")]
    Prediction { row: usize, reason: String },

    #[error("Missing value in {stage} at row {row}, column `{column}`")]
    MissingField {
        stage: Stage,
        row: usize,
        column: &'static str,
    },

    #[error("Feature vector has {actual} values, expected {expected}")]
    FeatureMismatch { expected: usize, actual: usize },

    /// Whole-batch estimator failure, not attributable to a single row
    #[error("Estimator `{target}` failed: {reason}")]
    Estimator { target: String, reason: String },

    #[error("Encoder state required for {stage} has not been fitted")]
    NotFitted { stage: Stage },

    #[error("Model persistence error: {0}")]
    Persistence(String),

    #[error("Weather source error: {0}")]
    Weather(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ForecastError {
    /// Stage the error belongs to, when it is attributable to one
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ForecastError::Schema { stage, .. }
            | ForecastError::InsufficientData { stage, .. }
            | ForecastError::MissingField { stage, .. }
            | ForecastError::NotFitted { stage } => Some(*stage),
            ForecastError::FeatureMismatch { .. } => Some(Stage::FeatureEngineering),
            ForecastError::Training(_) => Some(Stage::Training),
            ForecastError::Prediction { .. } => Some(Stage::Prediction),
            ForecastError::Persistence(_) => Some(Stage::Persistence),
            _ => None,
        }
    }
}

impl From<validator::ValidationErrors> for ForecastError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ForecastError::Config(errors.to_string())
    }
}

pub type Result<T, E = ForecastError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display_is_snake_case() {
        assert_eq!(Stage::FeatureEngineering.to_string(), "feature_engineering");
        assert_eq!(Stage::Cleaning.to_string(), "cleaning");
    }

    #[test]
    fn test_error_messages_name_stage_row_and_column() {
        let err = ForecastError::MissingField {
            stage: Stage::Prediction,
            row: 3,
            column: "wind_speed",
        };
        let msg = err.to_string();
        assert!(msg.contains("prediction"));
        assert!(msg.contains("row 3"));
        assert!(msg.contains("wind_speed"));
        assert_eq!(err.stage(), Some(Stage::Prediction));
    }

    #[test]
    fn test_batch_level_errors_carry_no_row() {
        let mismatch = ForecastError::FeatureMismatch {
            expected: 11,
            actual: 9,
        };
        assert_eq!(mismatch.stage(), Some(Stage::FeatureEngineering));
        assert!(!mismatch.to_string().contains("row"));

        let estimator = ForecastError::Estimator {
            target: "wind_energy_label".to_string(),
            reason: "empty forest".to_string(),
        };
        assert_eq!(estimator.stage(), None);
        assert!(estimator.to_string().contains("wind_energy_label"));
    }

    #[test]
    fn test_insufficient_data_message() {
        let err = ForecastError::InsufficientData {
            stage: Stage::Training,
            rows: 3,
            required: 10,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient data in training: 3 rows available, at least 10 required"
        );
    }
}
