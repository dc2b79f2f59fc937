#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use energy_forecaster::domain::{HistoricalRecord, WeatherObservation};

/// Distinct, outlier-free rows spread around 800 W/m² irradiance
pub fn historical_rows(n: usize) -> Vec<HistoricalRecord> {
    (0..n)
        .map(|i| HistoricalRecord {
            source_type: Some(if i % 2 == 0 { "Solar" } else { "Wind" }.to_string()),
            solar_irradiance: Some(600.0 + ((i * 37) % 100) as f64 * 4.0),
            wind_speed: Some(2.0 + ((i * 13) % 50) as f64 * 0.16),
            ambient_temperature: Some(10.0 + ((i * 7) % 25) as f64),
            humidity: Some(30.0 + ((i * 11) % 40) as f64),
            cloud_cover: Some(((i * 3) % 60) as f64),
            panel_area: Some(10.0),
            blade_length: Some(30.0),
            storage_capacity: Some(400.0 + i as f64),
            maintenance_schedule: Some(10.0 + (i % 5) as f64),
            energy_output_class: Some("Medium".to_string()),
        })
        .collect()
}

pub fn hour(h: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + chrono::Duration::hours(h)
}

pub fn observation(h: i64, solar_irradiance: f64, wind_speed: f64) -> WeatherObservation {
    WeatherObservation {
        datetime: hour(h),
        temperature: Some(22.0),
        wind_speed: Some(wind_speed),
        solar_irradiance: Some(solar_irradiance),
        humidity: Some(50.0),
        cloud_cover: Some(30.0),
    }
}
