//! Integration tests for the WeatherAPI history extractor using wiremock.
//!
//! These tests verify the extractor's behavior against a mock HTTP server,
//! covering hour selection, batch extraction, and failure handling.

use chrono::NaiveDate;
use ingest_core::{ApiConfig, ExtractError, ExtractionRequest, Extractor, WeatherApiExtractor};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

/// Sample history payload: 24 hour entries for 2024-03-01, with a
/// distinguished 13:00 observation.
fn sample_history_response() -> serde_json::Value {
    let hours: Vec<serde_json::Value> = (0..24)
        .map(|h| {
            if h == 13 {
                serde_json::json!({
                    "time": "2024-03-01 13:00",
                    "temp_c": 10.5,
                    "condition": { "text": "Partly cloudy" }
                })
            } else {
                serde_json::json!({
                    "time": format!("2024-03-01 {h:02}:00"),
                    "temp_c": 6.0 + f64::from(h) * 0.25,
                    "condition": { "text": "Overcast" }
                })
            }
        })
        .collect();

    serde_json::json!({
        "location": { "name": "London" },
        "forecast": { "forecastday": [ { "hour": hours } ] }
    })
}

/// Create a test extractor configured to use the mock server.
///
/// # Panics
///
/// Panics if the client cannot be created (should not happen in tests).
fn test_extractor(mock_server: &MockServer) -> WeatherApiExtractor {
    let config = ApiConfig {
        base_url: mock_server.uri(),
        location: "London".to_string(),
        timeout_secs: 5,
    };
    WeatherApiExtractor::new("TEST_KEY".to_string(), config).expect("Failed to create extractor")
}

fn hourly_request() -> ExtractionRequest {
    let ts = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(13, 0, 0)
        .unwrap();
    ExtractionRequest::hourly(ts)
}

fn daily_request() -> ExtractionRequest {
    ExtractionRequest::daily(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
}

/// Setup a mock for the /history.json endpoint with the given response.
async fn setup_history_mock(mock_server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/history.json"))
        .respond_with(response)
        .mount(mock_server)
        .await;
}

// ============================================================================
// Success scenarios
// ============================================================================

#[tokio::test]
async fn hourly_selects_the_matching_hour() {
    let mock_server = MockServer::start().await;

    setup_history_mock(
        &mock_server,
        ResponseTemplate::new(200).set_body_json(sample_history_response()),
    )
    .await;

    let records = test_extractor(&mock_server)
        .extract(&hourly_request())
        .await
        .expect("extraction should succeed");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].location, "London");
    assert_eq!(records[0].time, "2024-03-01 13:00");
    assert_eq!(records[0].temp_celsius, 10.5);
    assert_eq!(records[0].condition, "Partly cloudy");
}

#[tokio::test]
async fn daily_returns_all_hours_in_order() {
    let mock_server = MockServer::start().await;

    setup_history_mock(
        &mock_server,
        ResponseTemplate::new(200).set_body_json(sample_history_response()),
    )
    .await;

    let records = test_extractor(&mock_server)
        .extract(&daily_request())
        .await
        .expect("extraction should succeed");

    assert_eq!(records.len(), 24);
    for (h, record) in records.iter().enumerate() {
        // Hour labels come back byte-identical and in source order.
        assert_eq!(record.time, format!("2024-03-01 {h:02}:00"));
        assert_eq!(record.location, "London");
    }
    assert_eq!(records[13].temp_celsius, 10.5);
}

#[tokio::test]
async fn request_carries_key_location_and_date() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/history.json"))
        .and(query_param("key", "TEST_KEY"))
        .and(query_param("q", "London"))
        .and(query_param("dt", "2024-03-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_history_response()))
        .expect(1)
        .mount(&mock_server)
        .await;

    test_extractor(&mock_server)
        .extract(&daily_request())
        .await
        .expect("extraction should succeed when all query params match");
}

// ============================================================================
// Failure scenarios
// ============================================================================

#[tokio::test]
async fn server_error_surfaces_status_and_raw_body() {
    let mock_server = MockServer::start().await;

    setup_history_mock(&mock_server, ResponseTemplate::new(500).set_body_string("server error"))
        .await;

    let err = test_extractor(&mock_server)
        .extract(&daily_request())
        .await
        .unwrap_err();

    match err {
        ExtractError::Upstream { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "server error");
        }
        other => panic!("expected Upstream, got: {other:?}"),
    }
}

#[tokio::test]
async fn unauthorized_is_upstream_not_malformed() {
    let mock_server = MockServer::start().await;

    setup_history_mock(
        &mock_server,
        ResponseTemplate::new(401)
            .set_body_string(r#"{"error":{"code":2006,"message":"API key is invalid."}}"#),
    )
    .await;

    let err = test_extractor(&mock_server)
        .extract(&hourly_request())
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::Upstream { status: 401, .. }));
}

#[tokio::test]
async fn hourly_without_matching_hour_fails_explicitly() {
    let mock_server = MockServer::start().await;

    // 13:30 labels only, so the 13:00 logical minute has no match.
    let response = serde_json::json!({
        "location": { "name": "London" },
        "forecast": { "forecastday": [ { "hour": [
            { "time": "2024-03-01 13:30", "temp_c": 10.5, "condition": { "text": "Partly cloudy" } }
        ] } ] }
    });
    setup_history_mock(&mock_server, ResponseTemplate::new(200).set_body_json(response)).await;

    let err = test_extractor(&mock_server)
        .extract(&hourly_request())
        .await
        .unwrap_err();

    match err {
        ExtractError::MalformedResponse(msg) => {
            assert!(msg.contains("2024-03-01 13:00"), "message was: {msg}");
        }
        other => panic!("expected MalformedResponse, got: {other:?}"),
    }
}

#[tokio::test]
async fn missing_forecast_day_is_malformed() {
    let mock_server = MockServer::start().await;

    let response = serde_json::json!({
        "location": { "name": "London" },
        "forecast": { "forecastday": [] }
    });
    setup_history_mock(&mock_server, ResponseTemplate::new(200).set_body_json(response)).await;

    let err = test_extractor(&mock_server)
        .extract(&daily_request())
        .await
        .unwrap_err();

    match err {
        ExtractError::MalformedResponse(msg) => {
            assert!(msg.contains("no forecast-day entry"), "message was: {msg}");
        }
        other => panic!("expected MalformedResponse, got: {other:?}"),
    }
}

#[tokio::test]
async fn undecodable_body_is_malformed() {
    let mock_server = MockServer::start().await;

    setup_history_mock(&mock_server, ResponseTemplate::new(200).set_body_string("not json")).await;

    let err = test_extractor(&mock_server)
        .extract(&daily_request())
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::MalformedResponse(_)));
}
