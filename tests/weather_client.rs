use chrono::NaiveDate;
use energy_forecaster::config::{SiteConfig, WeatherConfig};
use energy_forecaster::forecast::{OpenMeteoClient, WeatherSource};
use energy_forecaster::ForecastError;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> OpenMeteoClient {
    OpenMeteoClient::new(&WeatherConfig {
        base_url: server.uri(),
        http_timeout_seconds: 5,
        days_ahead: 1,
    })
    .unwrap()
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
}

#[tokio::test]
async fn fetches_hourly_observations_in_metres_per_second() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("wind_speed_unit", "ms"))
        .and(query_param("start_date", "2024-05-02"))
        .and(query_param("end_date", "2024-05-02"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "latitude": 23.08,
            "longitude": 76.85,
            "hourly": {
                "time": ["2024-05-02T11:00", "2024-05-02T12:00"],
                "temperature_2m": [31.2, 32.0],
                "wind_speed_10m": [4.1, 4.6],
                "shortwave_radiation": [780.0, 815.0],
                "cloud_cover": [12, 8],
                "relative_humidity_2m": [35, 33]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let observations = client(&server)
        .hourly_observations(&SiteConfig::default(), day(), day())
        .await
        .unwrap();

    assert_eq!(observations.len(), 2);
    assert_eq!(observations[1].solar_irradiance, Some(815.0));
    assert_eq!(observations[0].wind_speed, Some(4.1));
    assert_eq!(observations[0].datetime.to_string(), "2024-05-02 11:00:00");
}

#[tokio::test]
async fn null_values_stay_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hourly": {
                "time": ["2024-05-02T00:00"],
                "temperature_2m": [null],
                "wind_speed_10m": [2.0],
                "shortwave_radiation": [0.0],
                "cloud_cover": [50],
                "relative_humidity_2m": [80]
            }
        })))
        .mount(&server)
        .await;

    let observations = client(&server)
        .hourly_observations(&SiteConfig::default(), day(), day())
        .await
        .unwrap();
    assert_eq!(observations[0].temperature, None);
}

#[tokio::test]
async fn server_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client(&server)
        .hourly_observations(&SiteConfig::default(), day(), day())
        .await
        .unwrap_err();
    assert!(matches!(err, ForecastError::Weather(ref msg) if msg.contains("503")));
}
