//! Weather forecast integration (Open-Meteo)
//!
//! Supplies hourly weather observations for the forecast horizon. Values the
//! service reports as `null` stay missing so the predictor can reject them.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::{SiteConfig, WeatherConfig};
use crate::domain::WeatherObservation;
use crate::error::{ForecastError, Result};

const HOURLY_FIELDS: &str =
    "temperature_2m,wind_speed_10m,shortwave_radiation,cloud_cover,relative_humidity_2m";

/// Source of hourly weather observations for a site
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn hourly_observations(
        &self,
        site: &SiteConfig,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<WeatherObservation>>;
}

/// Open-Meteo API client
pub struct OpenMeteoClient {
    client: Client,
    base_url: String,
}

impl OpenMeteoClient {
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .build()
            .map_err(|e| ForecastError::Weather(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn parse_response(response: OpenMeteoResponse) -> Result<Vec<WeatherObservation>> {
        let hourly = response.hourly;
        let n = hourly.time.len();
        let columns = [
            ("temperature_2m", hourly.temperature_2m.len()),
            ("wind_speed_10m", hourly.wind_speed_10m.len()),
            ("shortwave_radiation", hourly.shortwave_radiation.len()),
            ("cloud_cover", hourly.cloud_cover.len()),
            ("relative_humidity_2m", hourly.relative_humidity_2m.len()),
        ];
        if let Some((name, len)) = columns.iter().find(|(_, len)| *len != n) {
            return Err(ForecastError::Weather(format!(
                "hourly series `{name}` has {len} values for {n} timestamps"
            )));
        }

        hourly
            .time
            .iter()
            .enumerate()
            .map(|(i, time)| {
                let datetime = NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M")
                    .map_err(|e| ForecastError::Weather(format!("invalid timestamp `{time}`: {e}")))?;
                Ok(WeatherObservation {
                    datetime,
                    temperature: hourly.temperature_2m[i],
                    wind_speed: hourly.wind_speed_10m[i],
                    solar_irradiance: hourly.shortwave_radiation[i],
                    humidity: hourly.relative_humidity_2m[i],
                    cloud_cover: hourly.cloud_cover[i],
                })
            })
            .collect()
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoClient {
    async fn hourly_observations(
        &self,
        site: &SiteConfig,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<WeatherObservation>> {
        let url = format!("{}/forecast", self.base_url);
        let start = start.format("%Y-%m-%d").to_string();
        let end = end.format("%Y-%m-%d").to_string();

        debug!(%url, %start, %end, "fetching weather forecast from Open-Meteo");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", site.latitude.to_string()),
                ("longitude", site.longitude.to_string()),
                ("hourly", HOURLY_FIELDS.to_string()),
                ("wind_speed_unit", "ms".to_string()),
                ("start_date", start),
                ("end_date", end),
                ("timezone", site.timezone.clone()),
            ])
            .send()
            .await
            .map_err(|e| ForecastError::Weather(format!("failed to send request: {e}")))?;

        if !response.status().is_success() {
            error!(status = %response.status(), "Open-Meteo returned error status");
            return Err(ForecastError::Weather(format!(
                "Open-Meteo API error: {}",
                response.status()
            )));
        }

        let body: OpenMeteoResponse = response
            .json()
            .await
            .map_err(|e| ForecastError::Weather(format!("failed to parse response: {e}")))?;

        let observations = Self::parse_response(body)?;
        info!(
            latitude = site.latitude,
            longitude = site.longitude,
            hours = observations.len(),
            "fetched weather forecast"
        );
        Ok(observations)
    }
}

// Open-Meteo API response structures
#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    hourly: OpenMeteoHourly,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoHourly {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    wind_speed_10m: Vec<Option<f64>>,
    shortwave_radiation: Vec<Option<f64>>,
    cloud_cover: Vec<Option<f64>>,
    relative_humidity_2m: Vec<Option<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: serde_json::Value) -> OpenMeteoResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_parse_hourly_series() {
        let parsed = OpenMeteoClient::parse_response(response(serde_json::json!({
            "hourly": {
                "time": ["2024-05-01T00:00", "2024-05-01T01:00"],
                "temperature_2m": [21.5, 20.9],
                "wind_speed_10m": [3.2, null],
                "shortwave_radiation": [0.0, 0.0],
                "cloud_cover": [10, 20],
                "relative_humidity_2m": [60, 62]
            }
        })))
        .unwrap();

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].datetime.to_string(), "2024-05-01 00:00:00");
        assert_eq!(parsed[0].temperature, Some(21.5));
        assert_eq!(parsed[1].wind_speed, None);
        assert_eq!(parsed[1].humidity, Some(62.0));
    }

    #[test]
    fn test_mismatched_series_lengths_are_rejected() {
        let result = OpenMeteoClient::parse_response(response(serde_json::json!({
            "hourly": {
                "time": ["2024-05-01T00:00"],
                "temperature_2m": [],
                "wind_speed_10m": [3.2],
                "shortwave_radiation": [0.0],
                "cloud_cover": [10],
                "relative_humidity_2m": [60]
            }
        })));
        assert!(matches!(result, Err(ForecastError::Weather(msg)) if msg.contains("temperature_2m")));
    }

    #[test]
    fn test_invalid_timestamp_is_rejected() {
        let result = OpenMeteoClient::parse_response(response(serde_json::json!({
            "hourly": {
                "time": ["yesterday"],
                "temperature_2m": [1.0],
                "wind_speed_10m": [1.0],
                "shortwave_radiation": [1.0],
                "cloud_cover": [1.0],
                "relative_humidity_2m": [1.0]
            }
        })));
        assert!(result.is_err());
    }
}
