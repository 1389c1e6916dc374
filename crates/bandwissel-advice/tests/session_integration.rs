//! End-to-end advice chain against mock HTTP services.

use bandwissel_advice::{build_service, render_text, AdviceError, Basis, ForecastOrigin};
use bandwissel_core::{
    ClimateSourceKind, Config, FetchFailurePolicy, FixedCoordinates, PositionSourceKind,
};
use bandwissel_weather::LocationOrigin;
use chrono::{Days, NaiveDate};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
}

fn daily_body(mins: &[f64], maxes: &[f64]) -> serde_json::Value {
    let time: Vec<String> = (0..mins.len())
        .map(|i| (today() + Days::new(i as u64)).format("%Y-%m-%d").to_string())
        .collect();
    serde_json::json!({
        "daily": {
            "time": time,
            "temperature_2m_min": mins,
            "temperature_2m_max": maxes,
        }
    })
}

fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.forecast.base_url = Some(server.uri());
    config.location.ip_lookup_url = server.uri();
    config.location.geocode_url = server.uri();
    config.climate.archive_url = server.uri();
    config
}

#[tokio::test]
async fn test_ip_location_and_live_forecast() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "lat": 51.9225,
            "lon": 4.4792,
            "city": "Rotterdam"
        })))
        .mount(&server)
        .await;

    let mut mins = vec![9.0, 8.5];
    mins.extend([5.0; 14]);
    let maxes = vec![12.0; 16];

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("latitude", "51.9225"))
        .respond_with(ResponseTemplate::new(200).set_body_json(daily_body(&mins, &maxes)))
        .expect(1)
        .mount(&server)
        .await;

    // Both seasons are decided by the forecast, the archive is never asked
    Mock::given(method("GET"))
        .and(path("/v1/archive"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let service = build_service(&config_for(&server)).unwrap();
    let report = service.request_advice(today()).await.unwrap();

    assert_eq!(report.location.origin, LocationOrigin::Device);
    assert_eq!(report.location.location.display_name(), "Rotterdam");
    assert_eq!(report.forecast_origin, ForecastOrigin::Live);
    assert_eq!(report.advice.winter.basis, Basis::Forecast);
    assert_eq!(report.advice.winter.effective_date, Some(today() + Days::new(2)));
    assert_eq!(report.advice.summer.effective_date, Some(today()));

    let text = render_text(&report);
    assert!(text.contains("Locatie: Rotterdam"));
    assert!(text.contains("Maandag 19 Oktober 2026"));
}

#[tokio::test]
async fn test_archive_fills_in_when_forecast_is_inconclusive() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(daily_body(&[9.0; 5], &[14.0; 5])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/archive"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "daily": {
                "time": ["2025-11-01", "2025-11-02", "2025-12-01"],
                "temperature_2m_min": [4.0, 2.0, 1.0],
                "temperature_2m_max": [9.0, 8.0, 6.0]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.location.source = PositionSourceKind::Fixed;
    config.location.fixed = Some(FixedCoordinates {
        latitude: 52.0907,
        longitude: 5.1214,
    });
    config.climate.years = 1;

    let service = build_service(&config).unwrap();
    let report = service.request_advice(today()).await.unwrap();

    // Five mild days are not enough for either season
    assert_eq!(report.advice.winter.basis, Basis::Historical);
    // November 2026 starts on a Sunday
    assert_eq!(
        report.advice.winter.effective_date,
        NaiveDate::from_ymd_opt(2026, 11, 2)
    );
    assert_eq!(report.advice.summer.basis, Basis::Historical);
}

#[tokio::test]
async fn test_provider_outage_synthesizes_forecast() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.location.source = PositionSourceKind::None;
    config.climate.source = ClimateSourceKind::Table;
    config.forecast.on_failure = FetchFailurePolicy::Synthesize;

    let service = build_service(&config).unwrap();
    let report = service.request_advice(today()).await.unwrap();

    assert_eq!(report.location.origin, LocationOrigin::Fallback);
    assert_eq!(report.location.location.display_name(), "Amsterdam");
    assert_eq!(report.forecast_origin, ForecastOrigin::Synthetic);
    // De Bilt maxima stay above 7 °C through October
    assert_eq!(report.advice.summer.basis, Basis::Forecast);
    assert_eq!(report.advice.summer.effective_date, Some(today()));
}

#[tokio::test]
async fn test_provider_outage_halts_when_configured() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.location.source = PositionSourceKind::None;
    config.forecast.on_failure = FetchFailurePolicy::Halt;

    let service = build_service(&config).unwrap();
    let err = service.request_advice(today()).await.unwrap_err();

    assert!(matches!(err, AdviceError::Forecast(_)));
    assert!(err.user_message().contains("Locatie niet gevonden"));
}
