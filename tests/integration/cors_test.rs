//! CORS behaviour of the HTTP surface.

mod helpers;

use axum::http::{Method, StatusCode, header};

use helpers::TestApp;

fn allowed_headers(response: &helpers::TestResponse) -> String {
    response.headers[header::ACCESS_CONTROL_ALLOW_HEADERS]
        .to_str()
        .unwrap()
        .to_ascii_lowercase()
}

#[tokio::test]
async fn test_preflight_is_empty_ok_with_cors_headers() {
    let app = TestApp::new().await;

    for path in ["/convert-cad", "/functions/v1/convert-cad"] {
        let response = app.request(Method::OPTIONS, path, None).await;

        assert_eq!(response.status, StatusCode::OK, "{path}");
        assert!(response.raw.is_empty(), "{path}");
        assert_eq!(response.headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let allowed = allowed_headers(&response);
        for name in ["authorization", "x-client-info", "apikey", "content-type"] {
            assert!(allowed.contains(name), "missing {name} in {allowed}");
        }
    }
}

#[tokio::test]
async fn test_preflight_makes_no_conversion() {
    let app = TestApp::new().await;

    app.request(Method::OPTIONS, "/convert-cad", None).await;

    assert!(
        app.conversion_api
            .received_requests()
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_error_responses_carry_allow_origin() {
    let app = TestApp::with_api_key("").await;

    let response = app.convert("p1", "u1/123.dwg").await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}
