//! SmartCore random forest wrapper
//!
//! Thin wrapper around SmartCore's `RandomForestRegressor` that keeps the
//! hyperparameters and metadata next to the fitted forest so the pair can be
//! persisted as one value.

use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;

use super::ModelMetadata;
use crate::config::ModelConfig;
use crate::error::{ForecastError, Result};

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

#[derive(Debug, Serialize, Deserialize)]
pub struct SmartcoreRandomForest {
    pub metadata: ModelMetadata,
    model: Forest,
    /// Width of the rows the forest was fitted on
    input_width: usize,
    /// Training parameters for reproducibility
    pub n_trees: usize,
    pub max_depth: Option<u16>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl SmartcoreRandomForest {
    pub fn parameters(config: &ModelConfig) -> RandomForestRegressorParameters {
        RandomForestRegressorParameters {
            max_depth: config.max_depth,
            min_samples_leaf: config.min_samples_leaf,
            min_samples_split: config.min_samples_split,
            n_trees: config.n_trees,
            m: None, // sqrt(n_features)
            keep_samples: false,
            seed: config.seed,
        }
    }

    /// Fit a forest on already-scaled rows
    pub fn train(
        x: &[Vec<f64>],
        y: &[f64],
        config: &ModelConfig,
        target: &str,
        feature_names: Vec<String>,
    ) -> Result<Self> {
        if x.is_empty() || y.is_empty() {
            return Err(ForecastError::Training(format!(
                "cannot fit `{target}` on an empty dataset"
            )));
        }
        if x.len() != y.len() {
            return Err(ForecastError::Training(format!(
                "feature and target count mismatch: {} rows, {} targets",
                x.len(),
                y.len()
            )));
        }

        let x_matrix = to_matrix(x)?;
        let model = Forest::fit(&x_matrix, &y.to_vec(), Self::parameters(config))
            .map_err(|e| ForecastError::Training(format!("random forest for `{target}`: {e:?}")))?;

        let metadata = ModelMetadata {
            model_id: format!("smartcore_rf_{}", uuid::Uuid::new_v4()),
            target: target.to_string(),
            trained_at: chrono::Utc::now(),
            training_samples: x.len(),
            validation_metrics: None,
            feature_names,
        };

        Ok(Self {
            input_width: x[0].len(),
            metadata,
            model,
            n_trees: config.n_trees,
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
            seed: config.seed,
        })
    }

    pub fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        if x.is_empty() {
            return Ok(Vec::new());
        }
        if let Some((row, width)) = x
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|(_, len)| *len != self.n_features())
        {
            return Err(ForecastError::Prediction {
                row,
                reason: format!(
                    "`{}` estimator expects {} features, got {width}",
                    self.metadata.target,
                    self.n_features()
                ),
            });
        }
        let x_matrix = to_matrix(x)?;
        self.model.predict(&x_matrix).map_err(|e| ForecastError::Estimator {
            target: self.metadata.target.clone(),
            reason: format!("{e:?}"),
        })
    }

    pub fn n_features(&self) -> usize {
        self.input_width
    }
}

fn to_matrix(x: &[Vec<f64>]) -> Result<DenseMatrix<f64>> {
    let n_samples = x.len();
    let n_features = x.first().map_or(0, Vec::len);

    let mut flat_data = Vec::with_capacity(n_samples * n_features);
    for row in x {
        if row.len() != n_features {
            return Err(ForecastError::Training(
                "all feature vectors must have the same length".to_string(),
            ));
        }
        flat_data.extend_from_slice(row);
    }

    Ok(DenseMatrix::new(n_samples, n_features, flat_data, false))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(n_trees: usize) -> ModelConfig {
        ModelConfig {
            n_trees,
            max_depth: Some(5),
            ..ModelConfig::default()
        }
    }

    fn linear_data() -> (Vec<Vec<f64>>, Vec<f64>) {
        // y = 2x1 + 3x2
        let x: Vec<Vec<f64>> = (0..20)
            .map(|i| vec![(i % 5) as f64, (i / 5) as f64])
            .collect();
        let y = x.iter().map(|r| 2.0 * r[0] + 3.0 * r[1]).collect();
        (x, y)
    }

    #[test]
    fn test_parameters_follow_config() {
        let params = SmartcoreRandomForest::parameters(&small_config(10));
        assert_eq!(params.n_trees, 10);
        assert_eq!(params.max_depth, Some(5));
        assert_eq!(params.seed, 42);
        assert!(!params.keep_samples);
    }

    #[test]
    fn test_train_and_predict() {
        let (x, y) = linear_data();
        let names = vec!["x1".to_string(), "x2".to_string()];
        let model = SmartcoreRandomForest::train(&x, &y, &small_config(20), "y", names).unwrap();

        assert_eq!(model.metadata.training_samples, 20);
        assert_eq!(model.n_features(), 2);

        let predictions = model.predict(&[vec![2.0, 2.0]]).unwrap();
        assert_eq!(predictions.len(), 1);
        // 2*2 + 3*2 = 10
        assert!(predictions[0] > 6.0 && predictions[0] < 14.0);
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (x, y) = linear_data();
        let a = SmartcoreRandomForest::train(&x, &y, &small_config(10), "y", vec![]).unwrap();
        let b = SmartcoreRandomForest::train(&x, &y, &small_config(10), "y", vec![]).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn test_rejects_mismatched_inputs() {
        let cfg = small_config(5);
        assert!(SmartcoreRandomForest::train(&[], &[], &cfg, "y", vec![]).is_err());
        assert!(
            SmartcoreRandomForest::train(&[vec![1.0], vec![2.0]], &[1.0], &cfg, "y", vec![])
                .is_err()
        );
        assert!(
            SmartcoreRandomForest::train(&[vec![1.0], vec![2.0, 3.0]], &[1.0, 2.0], &cfg, "y", vec![])
                .is_err()
        );
    }

    #[test]
    fn test_wrong_width_names_offending_row() {
        let (x, y) = linear_data();
        let names = vec!["x1".to_string(), "x2".to_string()];
        let model = SmartcoreRandomForest::train(&x, &y, &small_config(5), "y", names).unwrap();

        let err = model
            .predict(&[vec![1.0, 1.0], vec![2.0, 2.0], vec![3.0]])
            .unwrap_err();
        assert!(matches!(err, ForecastError::Prediction { row: 2, .. }));
    }

    #[test]
    fn test_empty_prediction_batch() {
        let (x, y) = linear_data();
        let model = SmartcoreRandomForest::train(&x, &y, &small_config(5), "y", vec![]).unwrap();
        assert!(model.predict(&[]).unwrap().is_empty());
    }
}
