//! Dual-model training pipeline
//!
//! Splits an engineered training set with a seeded shuffle, fits the feature
//! scaler on the training partition only, then fits the solar and wind
//! forests on identical inputs and evaluates both on the held-out rows.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::features::{feature_names, EncoderState, EngineeredBatch, TargetLabels};
use super::inference::TrainedModel;
use super::smartcore::SmartcoreRandomForest;
use super::{StandardScaler, ValidationMetrics};
use crate::config::ModelConfig;
use crate::error::{ForecastError, Result, Stage};

/// Row indices of the train and test partitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl DataSplit {
    /// Hold out `ceil(n × test_size)` rows.
    ///
    /// With `shuffle` the order is a permutation seeded by `seed`; otherwise
    /// the last rows are held out.
    pub fn new(n: usize, test_size: f64, seed: u64, shuffle: bool) -> Result<Self> {
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(ForecastError::Config(format!(
                "test size must be between 0 and 1, got {test_size}"
            )));
        }

        let n_test = (n as f64 * test_size).ceil() as usize;
        let n_train = n.saturating_sub(n_test);
        if n_test == 0 || n_train < 2 {
            return Err(ForecastError::Training(format!(
                "cannot split {n} rows into train/test with test size {test_size}"
            )));
        }

        let mut order: Vec<usize> = (0..n).collect();
        if shuffle {
            let mut rng = StdRng::seed_from_u64(seed);
            order.shuffle(&mut rng);
        }
        let test = order.split_off(n_train);

        Ok(Self { train: order, test })
    }
}

/// Outcome of one training run, carried inside the model bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub train_rows: usize,
    pub test_rows: usize,
    pub solar_metrics: ValidationMetrics,
    pub wind_metrics: ValidationMetrics,
}

pub struct Trainer {
    config: ModelConfig,
}

impl Trainer {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    /// Fit the solar and wind estimators on an engineered training batch.
    ///
    /// `state` must be the encoder state returned alongside `batch`; it is
    /// completed with the fitted scaler and bundled into the model.
    pub fn train(&self, batch: &EngineeredBatch, state: EncoderState) -> Result<TrainedModel> {
        if batch.len() < self.config.min_training_rows {
            return Err(ForecastError::InsufficientData {
                stage: Stage::Training,
                rows: batch.len(),
                required: self.config.min_training_rows,
            });
        }

        let labels: Vec<TargetLabels> = batch
            .records
            .iter()
            .enumerate()
            .map(|(row, r)| {
                r.labels.ok_or_else(|| {
                    ForecastError::Training(format!(
                        "row {row} is missing required column `solar_energy_label`/`wind_energy_label`"
                    ))
                })
            })
            .collect::<Result<_>>()?;

        let features = batch.feature_matrix();
        let split = DataSplit::new(
            features.len(),
            self.config.test_size,
            self.config.seed,
            self.config.shuffle,
        )?;

        let pick = |idx: &[usize]| -> Vec<Vec<f64>> { idx.iter().map(|&i| features[i].clone()).collect() };
        let targets = |idx: &[usize], f: fn(&TargetLabels) -> f64| -> Vec<f64> {
            idx.iter().map(|&i| f(&labels[i])).collect()
        };

        let scaler = StandardScaler::fit(&pick(&split.train))?;
        let x_train = scaler.transform_all(&pick(&split.train))?;
        let x_test = scaler.transform_all(&pick(&split.test))?;

        let (solar, solar_metrics) = self.fit_and_evaluate(
            "solar_energy_label",
            &x_train,
            &targets(&split.train, |l| l.solar_energy),
            &x_test,
            &targets(&split.test, |l| l.solar_energy),
        )?;
        let (wind, wind_metrics) = self.fit_and_evaluate(
            "wind_energy_label",
            &x_train,
            &targets(&split.train, |l| l.wind_energy),
            &x_test,
            &targets(&split.test, |l| l.wind_energy),
        )?;

        let summary = TrainingSummary {
            train_rows: split.train.len(),
            test_rows: split.test.len(),
            solar_metrics,
            wind_metrics,
        };

        let state = EncoderState {
            scaler: Some(scaler),
            ..state
        };

        Ok(TrainedModel::new(solar, wind, state, self.config.clone(), summary))
    }

    fn fit_and_evaluate(
        &self,
        target: &str,
        x_train: &[Vec<f64>],
        y_train: &[f64],
        x_test: &[Vec<f64>],
        y_test: &[f64],
    ) -> Result<(SmartcoreRandomForest, ValidationMetrics)> {
        if y_train.windows(2).all(|w| w[0] == w[1]) {
            warn!(label = target, "training target is constant");
        }

        let mut model =
            SmartcoreRandomForest::train(x_train, y_train, &self.config, target, feature_names())?;
        let predictions = model
            .predict(x_test)
            .map_err(|e| ForecastError::Training(format!("evaluating `{target}`: {e}")))?;
        let metrics = ValidationMetrics::compute(&predictions, y_test)?;
        model.metadata.validation_metrics = Some(metrics);

        info!(
            label = target,
            r2 = metrics.r2,
            rmse = metrics.rmse,
            mae = metrics.mae,
            mape = metrics.mape,
            train_rows = x_train.len(),
            test_rows = x_test.len(),
            "trained estimator"
        );

        Ok((model, metrics))
    }
}
