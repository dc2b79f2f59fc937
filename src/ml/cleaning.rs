//! Historical data cleaning
//!
//! Cleaning is a total function over the row collection applied in a fixed
//! order: drop incomplete rows, drop rows outside a column's physical range
//! (negative wind speed, cloud cover above 100%), drop exact duplicates, then
//! drop IQR outliers.
//!
//! With [`OutlierMode::UntilStable`] the IQR filter is re-run on the
//! survivors until a pass removes nothing, so running the cleaner on its own
//! output removes nothing. On a skewed column the later passes also drop rows
//! that were inside the first-pass bounds. [`OutlierMode::Single`] applies
//! the textbook one-pass rule and gives up idempotence.

use itertools::Itertools;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::{debug, info, warn};

use crate::config::{CleaningConfig, OutlierMode};
use crate::domain::{HistoricalRecord, NumericColumn};
use crate::error::{ForecastError, Result, Stage};

/// Row counts removed by each cleaning step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub input_rows: usize,
    pub missing_removed: usize,
    /// Rows with a value outside its column's plausible range
    pub domain_removed: usize,
    pub duplicates_removed: usize,
    pub outliers_removed: usize,
    /// IQR passes run, including the final pass that removed nothing
    pub outlier_passes: usize,
    pub output_rows: usize,
}

impl CleaningReport {
    pub fn total_removed(&self) -> usize {
        self.missing_removed + self.domain_removed + self.duplicates_removed + self.outliers_removed
    }
}

/// Inclusive IQR acceptance interval for one column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IqrBounds {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrBounds {
    pub fn from_values(values: &[f64], multiplier: f64) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let q1 = quantile(&sorted, 0.25);
        let q3 = quantile(&sorted, 0.75);
        let iqr = q3 - q1;

        Some(Self {
            q1,
            q3,
            lower: q1 - multiplier * iqr,
            upper: q3 + multiplier * iqr,
        })
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Linearly interpolated quantile of an ascending slice
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

#[derive(PartialEq, Eq, Hash)]
struct RowKey<'a> {
    source_type: Option<&'a str>,
    energy_output_class: Option<&'a str>,
    values: Vec<Option<OrderedFloat<f64>>>,
}

impl<'a> From<&'a HistoricalRecord> for RowKey<'a> {
    fn from(record: &'a HistoricalRecord) -> Self {
        Self {
            source_type: record.source_type.as_deref(),
            energy_output_class: record.energy_output_class.as_deref(),
            values: NumericColumn::iter()
                .map(|c| record.value(c).map(OrderedFloat))
                .collect(),
        }
    }
}

pub struct DataCleaner {
    config: CleaningConfig,
}

impl DataCleaner {
    pub fn new(config: CleaningConfig) -> Self {
        Self { config }
    }

    /// Clean a copy of `records`; the input is left untouched.
    ///
    /// Fails with `InsufficientData` when fewer than `min_rows` survive.
    pub fn clean(
        &self,
        records: &[HistoricalRecord],
    ) -> Result<(Vec<HistoricalRecord>, CleaningReport)> {
        let mut report = CleaningReport {
            input_rows: records.len(),
            ..Default::default()
        };

        let complete = drop_missing(records);
        report.missing_removed = records.len() - complete.len();

        let plausible = drop_implausible(complete);
        report.domain_removed = records.len() - report.missing_removed - plausible.len();

        let before_dedup = plausible.len();
        let unique = drop_duplicates(plausible);
        report.duplicates_removed = before_dedup - unique.len();

        let before_outliers = unique.len();
        let (cleaned, passes) = self.drop_outliers(unique);
        report.outlier_passes = passes;
        report.outliers_removed = before_outliers - cleaned.len();
        report.output_rows = cleaned.len();

        info!(
            input = report.input_rows,
            missing = report.missing_removed,
            implausible = report.domain_removed,
            duplicates = report.duplicates_removed,
            outliers = report.outliers_removed,
            output = report.output_rows,
            "cleaned historical records"
        );

        if cleaned.len() < self.config.min_rows {
            return Err(ForecastError::InsufficientData {
                stage: Stage::Cleaning,
                rows: cleaned.len(),
                required: self.config.min_rows,
            });
        }

        Ok((cleaned, report))
    }

    /// Apply the IQR filter once, or until a pass removes nothing
    fn drop_outliers(&self, mut rows: Vec<HistoricalRecord>) -> (Vec<HistoricalRecord>, usize) {
        let mut passes = 0;
        loop {
            passes += 1;
            let bounds: Vec<(NumericColumn, IqrBounds)> = NumericColumn::iter()
                .filter_map(|column| {
                    let values: Vec<f64> = rows.iter().filter_map(|r| r.value(column)).collect();
                    IqrBounds::from_values(&values, self.config.iqr_multiplier)
                        .map(|b| (column, b))
                })
                .collect();

            let before = rows.len();
            rows.retain(|row| {
                match bounds
                    .iter()
                    .find(|(column, b)| !row.value(*column).is_some_and(|v| b.contains(v)))
                {
                    Some((column, b)) => {
                        debug!(
                            column = column.name(),
                            value = ?row.value(*column),
                            lower = b.lower,
                            upper = b.upper,
                            "dropping outlier row"
                        );
                        false
                    }
                    None => true,
                }
            });

            if rows.len() == before || self.config.outlier_mode == OutlierMode::Single {
                return (rows, passes);
            }
        }
    }
}

fn drop_missing(records: &[HistoricalRecord]) -> Vec<HistoricalRecord> {
    records
        .iter()
        .enumerate()
        .filter(|(i, r)| match r.first_missing() {
            Some(column) => {
                warn!(row = i, column, "dropping row with missing value");
                false
            }
            None => true,
        })
        .map(|(_, r)| r.clone())
        .collect()
}

fn drop_implausible(records: Vec<HistoricalRecord>) -> Vec<HistoricalRecord> {
    records
        .into_iter()
        .enumerate()
        .filter(|(i, r)| {
            match NumericColumn::iter().find(|c| r.value(*c).is_some_and(|v| !c.accepts(v))) {
                Some(column) => {
                    warn!(
                        row = i,
                        column = column.name(),
                        value = ?r.value(column),
                        "dropping row with implausible value"
                    );
                    false
                }
                None => true,
            }
        })
        .map(|(_, r)| r)
        .collect()
}

fn drop_duplicates(records: Vec<HistoricalRecord>) -> Vec<HistoricalRecord> {
    let keys: Vec<usize> = records
        .iter()
        .enumerate()
        .unique_by(|(_, r)| RowKey::from(*r))
        .map(|(i, _)| i)
        .collect();

    records
        .into_iter()
        .enumerate()
        .filter(|(i, _)| keys.binary_search(i).is_ok())
        .map(|(_, r)| r)
        .collect()
}
