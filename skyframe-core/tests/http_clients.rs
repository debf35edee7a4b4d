//! HTTP collaborators exercised against a wiremock server.

use std::sync::Arc;
use std::time::Duration;

use skyframe_core::render::{JobParams, RemoteStatus};
use skyframe_core::{
    Coordinates, FusionBrainClient, GenerationError, GeocodeError, ImageGenerator,
    NominatimGeocoder, PollSettings, RenderError, RenderPipeline, ReverseGeocoder,
    VisualCrossingProvider, WeatherError, WeatherProvider,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, header, method, path, query_param},
};

const MOSCOW: Coordinates = Coordinates {
    lat: 55.75,
    lon: 37.62,
};

fn weather_client(server: &MockServer) -> VisualCrossingProvider {
    #[allow(clippy::expect_used)]
    VisualCrossingProvider::new(
        server.uri(),
        "WKEY".into(),
        "metric".into(),
        Duration::from_secs(5),
    )
    .expect("client")
}

fn geocoder(server: &MockServer) -> NominatimGeocoder {
    #[allow(clippy::expect_used)]
    NominatimGeocoder::new(server.uri(), Duration::from_secs(5)).expect("client")
}

fn render_client(server: &MockServer) -> FusionBrainClient {
    #[allow(clippy::expect_used)]
    FusionBrainClient::new(
        server.uri(),
        "RKEY".into(),
        "RSECRET".into(),
        Duration::from_secs(5),
    )
    .expect("client")
}

// ============================================================================
// Visual Crossing
// ============================================================================

#[tokio::test]
async fn weather_payload_is_returned_untouched() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "resolvedAddress": "Москва, Россия",
        "currentConditions": { "temp": 3.5, "icon": "snow" },
        "days": []
    });

    Mock::given(method("GET"))
        .and(path("/VisualCrossingWebServices/rest/services/timeline/55.75,37.62"))
        .and(query_param("key", "WKEY"))
        .and(query_param("unitGroup", "metric"))
        .and(query_param("contentType", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let payload = weather_client(&server).get_weather(MOSCOW).await.expect("payload");
    assert_eq!(payload, body);
}

#[tokio::test]
async fn weather_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("No account found"))
        .mount(&server)
        .await;

    let err = weather_client(&server).get_weather(MOSCOW).await.unwrap_err();
    match err {
        WeatherError::Status { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("No account"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn weather_invalid_json_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = weather_client(&server).get_weather(MOSCOW).await.unwrap_err();
    assert!(matches!(err, WeatherError::Parse(_)));
}

// ============================================================================
// Nominatim
// ============================================================================

#[tokio::test]
async fn geocoder_prefers_city_then_town() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("format", "json"))
        .and(query_param("lat", "55.75"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "address": { "town": "Химки", "village": "Подрезково" }
        })))
        .mount(&server)
        .await;

    let place = geocoder(&server).resolve_place(MOSCOW).await.expect("place");
    assert_eq!(place, "Химки");
}

#[tokio::test]
async fn geocoder_without_address_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "error": "Unable to geocode"
        })))
        .mount(&server)
        .await;

    let err = geocoder(&server).resolve_place(MOSCOW).await.unwrap_err();
    assert!(matches!(err, GeocodeError::NoAddress));
}

#[tokio::test]
async fn geocoder_server_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = geocoder(&server).resolve_place(MOSCOW).await.unwrap_err();
    assert!(matches!(err, GeocodeError::Status { status: 503, .. }));
}

// ============================================================================
// Fusion Brain
// ============================================================================

async fn mount_pipelines(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/key/api/v1/pipelines"))
        .and(header("X-Key", "Key RKEY"))
        .and(header("X-Secret", "Secret RSECRET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "id": "pipe-42", "name": "Kandinsky", "status": "ACTIVE" },
            { "id": "pipe-7", "name": "Other", "status": "ACTIVE" }
        ])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn pipelines_are_listed_with_credentials() {
    let server = MockServer::start().await;
    mount_pipelines(&server).await;

    let pipelines = render_client(&server).list_pipelines().await.expect("pipelines");
    let ids: Vec<&str> = pipelines.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["pipe-42", "pipe-7"]);
}

#[tokio::test]
async fn submit_sends_multipart_generation_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/key/api/v1/pipeline/run"))
        .and(header("X-Key", "Key RKEY"))
        .and(body_string_contains("name=\"pipeline_id\""))
        .and(body_string_contains("pipe-42"))
        .and(body_string_contains("\"type\":\"GENERATE\""))
        .and(body_string_contains("\"query\":\"foggy morning\""))
        .and(body_string_contains("\"width\":512"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "uuid": "job-uuid", "status": "INITIAL", "status_time": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let job_id = render_client(&server)
        .submit_job("pipe-42", "foggy morning", JobParams::default())
        .await
        .expect("job id");
    assert_eq!(job_id, "job-uuid");
}

#[tokio::test]
async fn submit_without_uuid_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/key/api/v1/pipeline/run"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({ "status": "INITIAL" })),
        )
        .mount(&server)
        .await;

    let err = render_client(&server)
        .submit_job("pipe-42", "x", JobParams::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RenderError::Parse(_)));
}

#[tokio::test]
async fn status_report_carries_files() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/key/api/v1/pipeline/status/job-uuid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "uuid": "job-uuid",
            "status": "DONE",
            "result": { "files": ["aGVsbG8="], "censored": false }
        })))
        .mount(&server)
        .await;

    let report = render_client(&server).get_job_status("job-uuid").await.expect("report");
    assert_eq!(report.status, RemoteStatus::Done);
    assert_eq!(report.result_images, vec!["aGVsbG8=".to_string()]);
}

#[tokio::test]
async fn workflow_end_to_end_against_mock_server() {
    let server = MockServer::start().await;
    mount_pipelines(&server).await;

    Mock::given(method("POST"))
        .and(path("/key/api/v1/pipeline/run"))
        .and(body_string_contains("pipe-42"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({ "uuid": "job-uuid" })),
        )
        .mount(&server)
        .await;

    // First check still processing, then done.
    Mock::given(method("GET"))
        .and(path("/key/api/v1/pipeline/status/job-uuid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "uuid": "job-uuid", "status": "PROCESSING"
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/key/api/v1/pipeline/status/job-uuid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "uuid": "job-uuid", "status": "DONE", "result": { "files": ["aGVsbG8="] }
        })))
        .mount(&server)
        .await;

    let settings = PollSettings {
        interval: Duration::from_millis(50),
        ceiling: Duration::from_secs(5),
        ..PollSettings::default()
    };
    let generator = ImageGenerator::new(Arc::new(render_client(&server)), settings);

    let image = generator.generate_image("foggy morning").await.expect("image");
    assert_eq!(image.bytes(), b"hello");
}

#[tokio::test]
async fn rejected_submission_maps_to_submission_rejected() {
    let server = MockServer::start().await;
    mount_pipelines(&server).await;

    Mock::given(method("POST"))
        .and(path("/key/api/v1/pipeline/run"))
        .respond_with(ResponseTemplate::new(400).set_body_string("{\"error\":\"bad params\"}"))
        .mount(&server)
        .await;

    let generator = ImageGenerator::new(Arc::new(render_client(&server)), PollSettings::default());
    let err = generator.generate_image("x").await.unwrap_err();
    assert!(matches!(err, GenerationError::SubmissionRejected(msg) if msg.contains("400")));
}

#[tokio::test]
async fn unauthorized_discovery_maps_to_pipeline_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/key/api/v1/pipelines"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let generator = ImageGenerator::new(Arc::new(render_client(&server)), PollSettings::default());
    let err = generator.generate_image("x").await.unwrap_err();
    assert!(matches!(err, GenerationError::PipelineUnavailable(_)));
}
