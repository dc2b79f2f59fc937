use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Hourly energy estimate for one weather observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub datetime: NaiveDateTime,
    #[serde(rename = "predicted_solar_kWh")]
    pub predicted_solar_kwh: f64,
    #[serde(rename = "predicted_wind_kWh")]
    pub predicted_wind_kwh: f64,
    /// Solar plus wind contribution
    #[serde(rename = "predicted_energy_kWh")]
    pub predicted_energy_kwh: f64,
}

/// Generation source a daily summary covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EnergySource {
    Solar,
    Wind,
    Total,
}

impl EnergySource {
    pub fn value_of(self, record: &PredictionRecord) -> f64 {
        match self {
            Self::Solar => record.predicted_solar_kwh,
            Self::Wind => record.predicted_wind_kwh,
            Self::Total => record.predicted_energy_kwh,
        }
    }
}

/// Daily summary of an hourly forecast series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub source: EnergySource,
    pub granularity: String,
    pub forecast_series_kwh: Vec<f64>,
    pub total_generation_kwh: f64,
}

impl DailyForecast {
    /// Summarise the predictions falling on `date`, rounded to 0.1 kWh
    pub fn from_predictions(
        date: NaiveDate,
        source: EnergySource,
        predictions: &[PredictionRecord],
    ) -> Self {
        let forecast_series_kwh: Vec<f64> = predictions
            .iter()
            .filter(|p| p.datetime.date() == date)
            .map(|p| round_tenth(source.value_of(p)))
            .collect();
        let total_generation_kwh = round_tenth(forecast_series_kwh.iter().sum());

        Self {
            date,
            source,
            granularity: "hourly".to_string(),
            forecast_series_kwh,
            total_generation_kwh,
        }
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: NaiveDate, hour: u32, solar: f64, wind: f64) -> PredictionRecord {
        PredictionRecord {
            datetime: date.and_hms_opt(hour, 0, 0).unwrap(),
            predicted_solar_kwh: solar,
            predicted_wind_kwh: wind,
            predicted_energy_kwh: solar + wind,
        }
    }

    #[test]
    fn test_daily_forecast_filters_by_date_and_rounds() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let next = day.succ_opt().unwrap();
        let predictions = vec![
            at(day, 10, 1.26, 0.5),
            at(day, 11, 2.04, 0.25),
            at(next, 0, 9.0, 9.0),
        ];

        let solar = DailyForecast::from_predictions(day, EnergySource::Solar, &predictions);
        assert_eq!(solar.forecast_series_kwh, vec![1.3, 2.0]);
        assert_eq!(solar.total_generation_kwh, 3.3);
        assert_eq!(solar.granularity, "hourly");

        let total = DailyForecast::from_predictions(day, EnergySource::Total, &predictions);
        assert_eq!(total.forecast_series_kwh, vec![1.8, 2.3]);
    }

    #[test]
    fn test_prediction_record_serializes_kwh_names() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let json = serde_json::to_value(at(day, 1, 1.0, 2.0)).unwrap();
        assert_eq!(json["predicted_solar_kWh"], 1.0);
        assert_eq!(json["predicted_energy_kWh"], 3.0);
    }
}
