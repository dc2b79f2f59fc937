use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use strum::{EnumIter, IntoStaticStr};

/// Numeric columns of a historical record monitored by the cleaner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum NumericColumn {
    SolarIrradiance,
    WindSpeed,
    AmbientTemperature,
    Humidity,
    CloudCover,
    PanelArea,
    BladeLength,
    StorageCapacity,
    MaintenanceSchedule,
}

impl NumericColumn {
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Physically plausible values, `None` when the column is unbounded
    pub fn valid_range(self) -> Option<RangeInclusive<f64>> {
        match self {
            NumericColumn::SolarIrradiance
            | NumericColumn::WindSpeed
            | NumericColumn::PanelArea
            | NumericColumn::BladeLength => Some(0.0..=f64::INFINITY),
            NumericColumn::Humidity | NumericColumn::CloudCover => Some(0.0..=100.0),
            NumericColumn::AmbientTemperature
            | NumericColumn::StorageCapacity
            | NumericColumn::MaintenanceSchedule => None,
        }
    }

    /// True when `value` lies inside the column's plausible range
    pub fn accepts(self, value: f64) -> bool {
        self.valid_range().map_or(true, |range| range.contains(&value))
    }
}

/// One row of labeled training data as read from the historical store.
///
/// Every field is optional because the store may contain empty cells; the
/// cleaner is responsible for dropping incomplete rows before feature
/// engineering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    /// Categorical generation source, `Solar` or `Wind` in the reference dataset
    pub source_type: Option<String>,
    /// W/m²
    pub solar_irradiance: Option<f64>,
    /// m/s
    pub wind_speed: Option<f64>,
    /// °C
    pub ambient_temperature: Option<f64>,
    /// %
    pub humidity: Option<f64>,
    /// %
    pub cloud_cover: Option<f64>,
    /// m²
    pub panel_area: Option<f64>,
    /// m
    pub blade_length: Option<f64>,
    pub storage_capacity: Option<f64>,
    pub maintenance_schedule: Option<f64>,
    /// Informational only, never used as a feature or target
    pub energy_output_class: Option<String>,
}

impl HistoricalRecord {
    pub fn value(&self, column: NumericColumn) -> Option<f64> {
        match column {
            NumericColumn::SolarIrradiance => self.solar_irradiance,
            NumericColumn::WindSpeed => self.wind_speed,
            NumericColumn::AmbientTemperature => self.ambient_temperature,
            NumericColumn::Humidity => self.humidity,
            NumericColumn::CloudCover => self.cloud_cover,
            NumericColumn::PanelArea => self.panel_area,
            NumericColumn::BladeLength => self.blade_length,
            NumericColumn::StorageCapacity => self.storage_capacity,
            NumericColumn::MaintenanceSchedule => self.maintenance_schedule,
        }
    }

    /// First required column that holds no value, if any
    pub fn first_missing(&self) -> Option<&'static str> {
        if self
            .source_type
            .as_deref()
            .map_or(true, |s| s.trim().is_empty())
        {
            return Some("source_type");
        }
        <NumericColumn as strum::IntoEnumIterator>::iter()
            .find(|c| self.value(*c).map_or(true, f64::is_nan))
            .map(NumericColumn::name)
    }
}

/// One real-time weather row for a forecast hour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub datetime: NaiveDateTime,
    /// °C
    pub temperature: Option<f64>,
    /// m/s
    pub wind_speed: Option<f64>,
    /// W/m²
    pub solar_irradiance: Option<f64>,
    /// %
    pub humidity: Option<f64>,
    /// %
    pub cloud_cover: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> HistoricalRecord {
        HistoricalRecord {
            source_type: Some("Solar".to_string()),
            solar_irradiance: Some(800.0),
            wind_speed: Some(5.0),
            ambient_temperature: Some(25.0),
            humidity: Some(40.0),
            cloud_cover: Some(20.0),
            panel_area: Some(10.0),
            blade_length: Some(30.0),
            storage_capacity: Some(500.0),
            maintenance_schedule: Some(30.0),
            energy_output_class: Some("High".to_string()),
        }
    }

    #[test]
    fn test_plausible_ranges() {
        assert!(!NumericColumn::WindSpeed.accepts(-1.0));
        assert!(NumericColumn::WindSpeed.accepts(0.0));
        assert!(NumericColumn::SolarIrradiance.accepts(1361.0));
        assert!(!NumericColumn::CloudCover.accepts(-2.0));
        assert!(!NumericColumn::Humidity.accepts(100.5));
        assert!(NumericColumn::Humidity.accepts(100.0));
        assert!(NumericColumn::AmbientTemperature.accepts(-40.0));
        assert!(NumericColumn::StorageCapacity.valid_range().is_none());
    }

    #[test]
    fn test_complete_record_has_no_missing_column() {
        assert_eq!(complete().first_missing(), None);
    }

    #[test]
    fn test_missing_columns_are_reported_by_name() {
        let mut record = complete();
        record.humidity = None;
        assert_eq!(record.first_missing(), Some("humidity"));

        let mut record = complete();
        record.source_type = Some("  ".to_string());
        assert_eq!(record.first_missing(), Some("source_type"));

        let mut record = complete();
        record.blade_length = Some(f64::NAN);
        assert_eq!(record.first_missing(), Some("blade_length"));
    }

    #[test]
    fn test_output_class_is_not_required() {
        let mut record = complete();
        record.energy_output_class = None;
        assert_eq!(record.first_missing(), None);
    }

    #[test]
    fn test_numeric_column_names() {
        assert_eq!(NumericColumn::SolarIrradiance.name(), "solar_irradiance");
        assert_eq!(NumericColumn::MaintenanceSchedule.name(), "maintenance_schedule");
    }
}
