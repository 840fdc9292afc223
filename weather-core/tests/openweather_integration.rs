//! End-to-end tests of the `get_weather` pipeline against a mock
//! OpenWeatherMap server.

use std::time::Duration;

use serde_json::{Value, json};
use weather_core::provider::openweather::{Endpoints, OpenWeatherProvider};
use weather_core::{WeatherError, WeatherProvider, WeatherService};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GEO_PATH: &str = "/geo/1.0/direct";
const ONECALL_PATH: &str = "/data/3.0/onecall";

fn service(server: &MockServer, key: Option<&str>, timeout: Duration) -> WeatherService {
    let provider = OpenWeatherProvider::new(
        key.map(str::to_string),
        Endpoints::with_base(&server.uri()),
        timeout,
    )
    .expect("client builds");
    WeatherService::new(Box::new(provider))
}

fn london_geo() -> Value {
    json!([{
        "name": "London",
        "local_names": { "en": "London" },
        "lat": 51.5073219,
        "lon": -0.1276474,
        "country": "GB",
        "state": "England"
    }])
}

fn onecall(daily_count: usize) -> Value {
    let daily: Vec<Value> = (0..daily_count)
        .map(|i| {
            let dt = 1_700_049_600 + i as i64 * 86_400;
            json!({
                "dt": dt,
                "sunrise": dt - 25_000,
                "sunset": dt + 4_000,
                "summary": "There will be rain today",
                "temp": { "day": 11.2, "min": 7.1, "max": 12.4, "night": 8.0, "eve": 10.3, "morn": 7.5 },
                "weather": [{ "id": 501, "main": "Rain", "description": "moderate rain", "icon": "10d" }],
                "pop": 0.8
            })
        })
        .collect();

    json!({
        "lat": 51.5073,
        "lon": -0.1276,
        "timezone": "Europe/London",
        "timezone_offset": 0,
        "current": {
            "dt": 1_700_050_000,
            "sunrise": 1_700_024_600,
            "sunset": 1_700_053_600,
            "temp": 10.5,
            "feels_like": 9.4,
            "pressure": 1003,
            "humidity": 87,
            "clouds": 100,
            "uvi": 0.21,
            "visibility": 9000,
            "wind_speed": 6.17,
            "wind_deg": 200,
            "weather": [{ "id": 804, "main": "Clouds", "description": "overcast clouds", "icon": "04d" }]
        },
        "hourly": [],
        "daily": daily,
        "alerts": [{
            "sender_name": "Met Office",
            "event": "Yellow wind warning",
            "start": 1_700_049_600,
            "end": 1_700_092_800,
            "description": "W".repeat(250),
            "tags": ["Wind"]
        }]
    })
}

async fn mount_geo(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(GEO_PATH))
        .and(query_param("limit", "1"))
        .and(query_param("appid", "test-key"))
        .respond_with(template)
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_report_for_resolved_location() {
    let server = MockServer::start().await;
    mount_geo(&server, ResponseTemplate::new(200).set_body_json(london_geo())).await;

    Mock::given(method("GET"))
        .and(path(ONECALL_PATH))
        .and(query_param("lat", "51.5073219"))
        .and(query_param("lon", "-0.1276474"))
        .and(query_param("exclude", "minutely"))
        .and(query_param("units", "metric"))
        .and(query_param("appid", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(onecall(2)))
        .expect(1)
        .mount(&server)
        .await;

    let json = service(&server, Some("test-key"), Duration::from_secs(5))
        .get_weather("London,uk")
        .await
        .to_json();

    assert!(json.get("error").is_none(), "unexpected error: {json}");
    assert_eq!(json["location"], "London, GB");
    assert_eq!(json["coordinates"]["longitude"], -0.1276474);
    assert_eq!(json["current_weather"]["description"], "overcast clouds");
    assert_eq!(json["current_weather"]["temperature_celsius"], "10.5°C");
    assert_eq!(json["current_weather"]["visibility"], "9000 m");
    assert_eq!(json["today_forecast"]["precipitation_probability"], "80%");
    assert_eq!(json["today_forecast"]["sunrise"], "2023-11-15 05:03 UTC");
    assert_eq!(json["forecast_3_day"].as_array().unwrap().len(), 1);
    assert_eq!(json["forecast_3_day"][0]["date"], "2023-11-16 12:00 UTC");

    let alert = &json["alerts"][0];
    assert_eq!(alert["event"], "Yellow wind warning");
    assert_eq!(alert["description"].as_str().unwrap().chars().count(), 203);
    assert_eq!(alert["end"], "2023-11-16 00:00 UTC");
}

#[tokio::test]
async fn test_empty_geocoding_result_is_location_not_found() {
    let server = MockServer::start().await;
    mount_geo(&server, ResponseTemplate::new(200).set_body_json(json!([]))).await;

    Mock::given(path(ONECALL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(onecall(1)))
        .expect(0)
        .mount(&server)
        .await;

    let json = service(&server, Some("test-key"), Duration::from_secs(5))
        .get_weather("Nowhereville")
        .await
        .to_json();

    assert_eq!(
        json,
        json!({ "error": "location not found for 'Nowhereville'. Please check the location name." })
    );
}

#[tokio::test]
async fn test_missing_key_makes_no_requests() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let svc = service(&server, None, Duration::from_secs(5));
    assert!(!svc.is_configured());

    let json = svc.get_weather("London").await.to_json();
    assert!(json["error"].as_str().unwrap().contains("not configured"));
}

#[tokio::test]
async fn test_geocoding_401_is_authentication_failure() {
    let server = MockServer::start().await;
    mount_geo(
        &server,
        ResponseTemplate::new(401).set_body_json(json!({ "cod": 401, "message": "Invalid API key." })),
    )
    .await;

    let err = service(&server, Some("test-key"), Duration::from_secs(5))
        .try_get_weather("London")
        .await
        .unwrap_err();

    assert!(err.to_string().starts_with("authentication failed"), "{err}");
    assert!(err.to_string().contains("OpenWeatherMap API key"));
}

#[tokio::test]
async fn test_geocoding_404_is_location_not_found() {
    let server = MockServer::start().await;
    mount_geo(&server, ResponseTemplate::new(404)).await;

    let err = service(&server, Some("test-key"), Duration::from_secs(5))
        .try_get_weather("Atlantis")
        .await
        .unwrap_err();

    assert_eq!(
        err,
        WeatherError::LocationNotFound {
            location: "Atlantis".into()
        }
    );
}

#[tokio::test]
async fn test_geocoding_server_error_is_generic_api_error() {
    let server = MockServer::start().await;
    mount_geo(&server, ResponseTemplate::new(503).set_body_string("maintenance")).await;

    let err = service(&server, Some("test-key"), Duration::from_secs(5))
        .try_get_weather("London")
        .await
        .unwrap_err();

    let msg = err.to_string();
    assert!(msg.starts_with("Geocoding API error: HTTP 503"), "{msg}");
    assert!(msg.contains("maintenance"));
    assert!(!msg.contains("test-key"));
}

async fn weather_error_for(status: u16) -> WeatherError {
    let server = MockServer::start().await;
    mount_geo(&server, ResponseTemplate::new(200).set_body_json(london_geo())).await;

    Mock::given(method("GET"))
        .and(path(ONECALL_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "cod": status, "message": "nope" })))
        .expect(1)
        .mount(&server)
        .await;

    service(&server, Some("test-key"), Duration::from_secs(5))
        .try_get_weather("London")
        .await
        .unwrap_err()
}

#[tokio::test]
async fn test_weather_429_is_rate_limited() {
    let err = weather_error_for(429).await;
    assert_eq!(err, WeatherError::RateLimited);
    assert!(err.to_string().contains("rate limit exceeded"));
}

#[tokio::test]
async fn test_weather_401_mentions_subscription_tier() {
    let err = weather_error_for(401).await;
    assert!(err.to_string().starts_with("authentication failed"));
    assert!(err.to_string().contains("subscription tier"));
}

#[tokio::test]
async fn test_weather_402_is_subscription_required() {
    assert_eq!(weather_error_for(402).await, WeatherError::SubscriptionRequired);
}

#[tokio::test]
async fn test_weather_500_is_generic_api_error() {
    let err = weather_error_for(500).await;
    assert!(err.to_string().starts_with("Weather API error: HTTP 500"), "{err}");
}

#[tokio::test]
async fn test_timeout_is_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(GEO_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(london_geo())
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = service(&server, Some("test-key"), Duration::from_millis(200))
        .try_get_weather("London")
        .await
        .unwrap_err();

    assert!(matches!(err, WeatherError::Network { .. }), "{err:?}");
    assert!(err.to_string().starts_with("network error"));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };

    let provider = OpenWeatherProvider::new(
        Some("test-key".into()),
        Endpoints::with_base(&uri),
        Duration::from_secs(2),
    )
    .unwrap();

    let err = provider.geocode("London").await.unwrap_err();
    assert!(matches!(err, WeatherError::Network { .. }), "{err:?}");
}

#[tokio::test]
async fn test_missing_current_field_is_malformed_payload() {
    let server = MockServer::start().await;
    mount_geo(&server, ResponseTemplate::new(200).set_body_json(london_geo())).await;

    let mut body = onecall(0);
    body["current"].as_object_mut().unwrap().remove("uvi");

    Mock::given(method("GET"))
        .and(path(ONECALL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let json = service(&server, Some("test-key"), Duration::from_secs(5))
        .get_weather("London")
        .await
        .to_json();

    assert_eq!(json, json!({ "error": "unexpected data format: missing field current.uvi" }));
}

#[tokio::test]
async fn test_non_json_body_is_unexpected_error() {
    let server = MockServer::start().await;
    mount_geo(&server, ResponseTemplate::new(200).set_body_string("<html>oops</html>")).await;

    let err = service(&server, Some("test-key"), Duration::from_secs(5))
        .try_get_weather("London")
        .await
        .unwrap_err();

    assert!(matches!(err, WeatherError::Unknown(_)));
    assert!(err.to_string().starts_with("an unexpected error occurred"));
}

#[tokio::test]
async fn test_dropped_request_returns_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(GEO_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(london_geo())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let svc = service(&server, Some("test-key"), Duration::from_secs(10));
    let result = tokio::time::timeout(Duration::from_millis(100), svc.get_weather("London")).await;
    assert!(result.is_err());
}
