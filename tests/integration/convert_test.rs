//! End-to-end tests of the conversion endpoint.

mod helpers;

use axum::http::{Method, StatusCode};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use helpers::TestApp;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\npreview";

#[tokio::test]
async fn test_public_url_conversion_succeeds() {
    let app = TestApp::new().await;
    app.seed_source("u1/123.dwg", b"AC1027").await;
    app.mount_successful_job(PNG).await;

    let response = app
        .convert(
            "p1",
            "https://store.example/object/public/project-files/u1/123.dwg",
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json(),
        json!({ "success": true, "previewUrl": "previews/p1_preview.png" })
    );
    assert_eq!(
        app.records.preview_of("p1").as_deref(),
        Some("previews/p1_preview.png")
    );
    assert_eq!(
        app.stored("previews/p1_preview.png").await.as_deref(),
        Some(PNG)
    );
}

#[tokio::test]
async fn test_bare_path_on_functions_route() {
    let app = TestApp::new().await;
    app.seed_source("u1/123.dwg", b"AC1027").await;
    app.mount_successful_job(PNG).await;

    let body = json!({ "projectId": "p2", "fileName": "u1/123.dwg" }).to_string();
    let response = app
        .request(Method::POST, "/functions/v1/convert-cad", Some(body))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["previewUrl"], "previews/p2_preview.png");
}

#[tokio::test]
async fn test_missing_source_reports_download_failure() {
    let app = TestApp::new().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&app.conversion_api)
        .await;

    let response = app.convert("p1", "u1/absent.dwg").await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = response.json()["error"].as_str().unwrap().to_string();
    assert!(
        error.starts_with("Failed to download file: "),
        "unexpected error: {error}"
    );
    assert!(app.records.preview_of("p1").is_none());
}

#[tokio::test]
async fn test_failed_job_reports_task_message() {
    let app = TestApp::new().await;
    app.seed_source("u1/123.dwg", b"AC1027").await;
    app.mount_job_api(
        json!({
            "data": {
                "id": "job-1",
                "status": "error",
                "tasks": [
                    { "name": "import-file", "status": "finished" },
                    { "name": "convert-file", "status": "error", "message": "Unsupported input format" }
                ]
            }
        }),
        PNG,
    )
    .await;

    let response = app.convert("p1", "u1/123.dwg").await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json(),
        json!({ "error": "CloudConvert conversion failed: Unsupported input format" })
    );
    assert!(app.stored("previews/p1_preview.png").await.is_none());
    assert!(app.records.preview_of("p1").is_none());
}

#[tokio::test]
async fn test_job_that_never_finishes_times_out() {
    let app = TestApp::new().await;
    app.seed_source("u1/123.dwg", b"AC1027").await;
    app.mount_job_api(
        json!({ "data": { "id": "job-1", "status": "processing", "tasks": [] } }),
        PNG,
    )
    .await;

    let response = app.convert("p1", "u1/123.dwg").await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json()["error"],
        "CloudConvert conversion timeout after 3 status checks"
    );

    let status_checks = app
        .conversion_api
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "GET" && r.url.path() == "/jobs/job-1")
        .count();
    assert_eq!(status_checks, 3);
}

#[tokio::test]
async fn test_missing_api_key_fails_without_external_calls() {
    let app = TestApp::with_api_key("").await;
    app.seed_source("u1/123.dwg", b"AC1027").await;

    let response = app.convert("p1", "u1/123.dwg").await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json(),
        json!({ "error": "CloudConvert API key not configured" })
    );
    assert!(
        app.conversion_api
            .received_requests()
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_url_without_bucket_marker_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .convert("p1", "https://cdn.example/files/u1/123.dwg")
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json()["error"],
        "Unrecognized file reference: https://cdn.example/files/u1/123.dwg"
    );
}

#[tokio::test]
async fn test_repeated_conversion_overwrites_preview() {
    let app = TestApp::new().await;
    app.seed_source("u1/123.dwg", b"AC1027").await;
    app.mount_successful_job(PNG).await;

    let first = app.convert("p1", "u1/123.dwg").await;
    let second = app.convert("p1", "u1/123.dwg").await;

    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(first.json(), second.json());
}

#[tokio::test]
async fn test_malformed_body_uses_error_shape() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::POST, "/convert-cad", Some("{\"projectId\":".to_string()))
        .await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.json()["error"].is_string());

    let response = app
        .request(
            Method::POST,
            "/convert-cad",
            Some(json!({ "projectId": "", "fileName": "u1/123.dwg" }).to_string()),
        )
        .await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json()["error"], "projectId is required");
}

#[tokio::test]
async fn test_shutdown_cancels_conversions() {
    let app = TestApp::new().await;
    app.seed_source("u1/123.dwg", b"AC1027").await;
    app.mount_successful_job(PNG).await;
    app.shutdown.cancel();

    let response = app.convert("p1", "u1/123.dwg").await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json()["error"], "Conversion was cancelled");
}

#[tokio::test]
async fn test_health_reports_metrics() {
    let app = TestApp::new().await;
    app.seed_source("u1/123.dwg", b"AC1027").await;
    app.mount_successful_job(PNG).await;
    app.convert("p1", "u1/123.dwg").await;
    app.convert("p1", "u1/absent.dwg").await;

    let response = app.request(Method::GET, "/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage_provider"], "local");
    assert_eq!(body["metrics"]["conversions_started"], 2);
    assert_eq!(body["metrics"]["conversions_succeeded"], 1);
    assert_eq!(body["metrics"]["conversions_failed"], 1);
}

#[tokio::test]
async fn test_health_is_degraded_without_api_key() {
    let app = TestApp::with_api_key("").await;

    let body = app.request(Method::GET, "/health", None).await.json();

    assert_eq!(body["status"], "degraded");
    assert_eq!(body["missing_configuration"], "CloudConvert API key not configured");
}

#[tokio::test]
async fn test_health_is_degraded_when_records_are_down() {
    let app = TestApp::new().await;
    app.records.set_offline(true);

    let body = app.request(Method::GET, "/health", None).await.json();

    assert_eq!(body["status"], "degraded");
    assert_eq!(body["unreachable"], json!(["project records: connection refused"]));
    assert!(body.get("missing_configuration").is_none());
}

#[tokio::test]
async fn test_health_is_degraded_when_store_is_gone() {
    let app = TestApp::new().await;
    std::fs::remove_dir_all(app.storage_root()).unwrap();

    let body = app.request(Method::GET, "/health", None).await.json();

    assert_eq!(body["status"], "degraded");
    assert_eq!(body["unreachable"], json!(["object store (local) unreachable"]));
}

#[tokio::test]
async fn test_output_downloaded_once_after_job_finishes() {
    let app = TestApp::new().await;
    app.seed_source("u1/123.dwg", b"AC1027").await;
    Mock::given(method("GET"))
        .and(path("/jobs/job-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": { "id": "job-1", "status": "processing" } })),
        )
        .up_to_n_times(2)
        .expect(2)
        .mount(&app.conversion_api)
        .await;
    app.mount_successful_job(PNG).await;

    let response = app.convert("p1", "u1/123.dwg").await;
    assert_eq!(response.status, StatusCode::OK);

    let paths: Vec<String> = app
        .conversion_api
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect();
    let output_at = paths
        .iter()
        .position(|p| p == "/output/preview.png")
        .expect("output downloaded");
    let last_status_at = paths
        .iter()
        .rposition(|p| p == "/jobs/job-1")
        .expect("status checked");
    assert_eq!(paths.iter().filter(|p| *p == "/output/preview.png").count(), 1);
    assert!(output_at > last_status_at);
}
