//! Machine Learning Module
//!
//! Feature engineering, dual random-forest training and hourly inference for
//! solar and wind generation:
//! - Data cleaning ahead of training (missing, duplicate, IQR outlier rows)
//! - Feature engineering with a persisted categorical encoder
//! - Seeded train/test split, standardization and model fitting
//! - Inference over live weather observations
//!
//! The encoder table, the fitted scaler and both forests travel together in a
//! [`inference::TrainedModel`] bundle.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ForecastError, Result, Stage};

pub mod cleaning;
pub mod features;
pub mod inference;
pub mod smartcore;
pub mod training;

/// Metadata attached to every fitted estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_id: String,
    /// Label column the estimator was fit against
    pub target: String,
    pub trained_at: chrono::DateTime<chrono::Utc>,
    pub training_samples: usize,
    /// Held-out evaluation, filled in by the trainer
    pub validation_metrics: Option<ValidationMetrics>,
    pub feature_names: Vec<String>,
}

/// Held-out evaluation metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationMetrics {
    pub mae: f64,  // Mean Absolute Error
    pub rmse: f64, // Root Mean Square Error
    pub mape: f64, // Mean Absolute Percentage Error (%)
    pub r2: f64,   // R-squared
    pub sample_count: usize,
}

impl ValidationMetrics {
    /// Compute metrics of `predictions` against `targets`.
    ///
    /// MAPE skips rows whose target is zero (night-time solar, calm wind)
    /// and is 0.0 when every target is zero.
    pub fn compute(predictions: &[f64], targets: &[f64]) -> Result<Self> {
        if predictions.len() != targets.len() {
            return Err(ForecastError::Training(format!(
                "prediction and target count mismatch: {} predictions, {} targets",
                predictions.len(),
                targets.len()
            )));
        }
        if predictions.is_empty() {
            return Err(ForecastError::Training("no predictions to evaluate".to_string()));
        }

        let n = predictions.len() as f64;

        let mae = predictions
            .iter()
            .zip(targets)
            .map(|(p, t)| (p - t).abs())
            .sum::<f64>()
            / n;

        let ss_res: f64 = predictions
            .iter()
            .zip(targets)
            .map(|(p, t)| (t - p).powi(2))
            .sum();
        let rmse = (ss_res / n).sqrt();

        let percentage_errors: Vec<f64> = predictions
            .iter()
            .zip(targets)
            .filter(|(_, t)| t.abs() > 1e-10)
            .map(|(p, t)| ((p - t) / t).abs() * 100.0)
            .collect();
        let mape = if percentage_errors.is_empty() {
            0.0
        } else {
            percentage_errors.iter().sum::<f64>() / percentage_errors.len() as f64
        };

        let mean_target = targets.iter().sum::<f64>() / n;
        let ss_tot: f64 = targets.iter().map(|t| (t - mean_target).powi(2)).sum();
        let r2 = if ss_tot.abs() < 1e-10 {
            0.0
        } else {
            1.0 - (ss_res / ss_tot)
        };

        Ok(Self {
            mae,
            rmse,
            mape,
            r2,
            sample_count: predictions.len(),
        })
    }

    /// Check if metrics meet quality thresholds
    pub fn meets_quality_threshold(&self, max_mape: f64, min_r2: f64) -> bool {
        self.mape <= max_mape && self.r2 >= min_r2
    }
}

impl fmt::Display for ValidationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "R²={:.3}, RMSE={:.3}, MAE={:.3}, MAPE={:.2}% (n={})",
            self.r2, self.rmse, self.mae, self.mape, self.sample_count
        )
    }
}

/// Zero-mean / unit-variance feature scaler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
}

impl StandardScaler {
    /// Fit per-column mean and population standard deviation
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let first = rows.first().ok_or(ForecastError::InsufficientData {
            stage: Stage::Training,
            rows: 0,
            required: 1,
        })?;
        let n_features = first.len();
        if rows.iter().any(|r| r.len() != n_features) {
            return Err(ForecastError::Training(
                "all feature vectors must have the same length".to_string(),
            ));
        }

        let n = rows.len() as f64;
        let means: Vec<f64> = (0..n_features)
            .map(|j| rows.iter().map(|r| r[j]).sum::<f64>() / n)
            .collect();
        let stds = (0..n_features)
            .map(|j| {
                let variance = rows.iter().map(|r| (r[j] - means[j]).powi(2)).sum::<f64>() / n;
                variance.sqrt()
            })
            .collect();

        Ok(Self { means, stds })
    }

    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    /// Standardize one row; constant training columns map to 0.0
    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.n_features() {
            return Err(ForecastError::FeatureMismatch {
                expected: self.n_features(),
                actual: row.len(),
            });
        }

        Ok(row
            .iter()
            .zip(self.means.iter().zip(self.stds.iter()))
            .map(|(f, (mean, std))| {
                if std.abs() < 1e-10 {
                    0.0
                } else {
                    (f - mean) / std
                }
            })
            .collect())
    }

    pub fn transform_all(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rows.iter().map(|r| self.transform(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaler_fit_and_transform() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 10.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();

        assert_eq!(scaler.means, vec![2.0, 10.0]);
        assert_eq!(scaler.stds, vec![1.0, 0.0]);

        let scaled = scaler.transform(&[3.0, 99.0]).unwrap();
        assert_eq!(scaled, vec![1.0, 0.0]);
    }

    #[test]
    fn test_scaler_rejects_wrong_width() {
        let scaler = StandardScaler::fit(&[vec![1.0, 2.0]]).unwrap();
        assert!(matches!(
            scaler.transform(&[1.0]),
            Err(ForecastError::FeatureMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_scaler_requires_rows() {
        assert!(matches!(
            StandardScaler::fit(&[]),
            Err(ForecastError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_metrics() {
        let predictions = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let targets = vec![1.1, 2.1, 2.9, 4.2, 4.8];

        let metrics = ValidationMetrics::compute(&predictions, &targets).unwrap();

        assert!(metrics.mae < 0.3);
        assert!(metrics.rmse < 0.4);
        assert!(metrics.r2 > 0.9);
        assert_eq!(metrics.sample_count, 5);
        assert!(metrics.meets_quality_threshold(10.0, 0.9));
    }

    #[test]
    fn test_metrics_mape_ignores_zero_targets() {
        let metrics = ValidationMetrics::compute(&[1.0, 10.0], &[0.0, 8.0]).unwrap();
        assert!((metrics.mape - 25.0).abs() < 1e-9);

        let all_zero = ValidationMetrics::compute(&[1.0, 2.0], &[0.0, 0.0]).unwrap();
        assert_eq!(all_zero.mape, 0.0);
        assert_eq!(all_zero.r2, 0.0);
    }

    #[test]
    fn test_metrics_length_mismatch() {
        assert!(ValidationMetrics::compute(&[1.0], &[1.0, 2.0]).is_err());
        assert!(ValidationMetrics::compute(&[], &[]).is_err());
    }
}
