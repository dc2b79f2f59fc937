//! CSV ingest for historical labeled records.
//!
//! Header names are matched case-insensitively with separators ignored, so
//! both `solar_irradiance` and `Solar_Irradiance` resolve to the same column.
//! Empty or `NA` cells become missing values for the cleaner to drop.

use csv::StringRecord;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use crate::domain::HistoricalRecord;
use crate::error::{ForecastError, Result, Stage};

const REQUIRED_COLUMNS: [&str; 10] = [
    "source_type",
    "solar_irradiance",
    "wind_speed",
    "ambient_temperature",
    "humidity",
    "cloud_cover",
    "panel_area",
    "blade_length",
    "storage_capacity",
    "maintenance_schedule",
];

const OPTIONAL_COLUMNS: [&str; 1] = ["energy_output_class"];

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (normalize(h), i))
        .collect()
}

pub fn load_historical_csv(path: impl AsRef<Path>) -> Result<Vec<HistoricalRecord>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let records = read_historical(file)?;
    info!(path = %path.display(), rows = records.len(), "loaded historical records");
    Ok(records)
}

/// Parse historical rows from any CSV source.
///
/// Fails with `Schema` when a required column is absent from the header.
pub fn read_historical<R: Read>(reader: R) -> Result<Vec<HistoricalRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let header_map = build_header_map(reader.headers()?);

    let mut index = HashMap::new();
    for column in REQUIRED_COLUMNS {
        let i = header_map
            .get(&normalize(column))
            .ok_or_else(|| ForecastError::Schema {
                stage: Stage::Loading,
                column: column.to_string(),
            })?;
        index.insert(column, *i);
    }
    for column in OPTIONAL_COLUMNS {
        if let Some(i) = header_map.get(&normalize(column)) {
            index.insert(column, *i);
        }
    }

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let text = |column: &str| -> Option<String> {
            index
                .get(column)
                .and_then(|&i| record.get(i))
                .filter(|s| !is_missing(s))
                .map(str::to_string)
        };
        let number = |column: &'static str| -> Option<f64> {
            let raw = text(column)?;
            match raw.parse::<f64>() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(row, column, value = %raw, "unparsable numeric cell treated as missing");
                    None
                }
            }
        };

        records.push(HistoricalRecord {
            source_type: text("source_type"),
            solar_irradiance: number("solar_irradiance"),
            wind_speed: number("wind_speed"),
            ambient_temperature: number("ambient_temperature"),
            humidity: number("humidity"),
            cloud_cover: number("cloud_cover"),
            panel_area: number("panel_area"),
            blade_length: number("blade_length"),
            storage_capacity: number("storage_capacity"),
            maintenance_schedule: number("maintenance_schedule"),
            energy_output_class: text("energy_output_class"),
        });
    }

    Ok(records)
}

fn is_missing(cell: &str) -> bool {
    cell.is_empty() || matches!(cell.to_ascii_lowercase().as_str(), "na" | "nan" | "null" | "none")
}
