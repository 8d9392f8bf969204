use std::{path::Path, sync::Arc};

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::{
    TestServer,
    multipart::{MultipartForm, Part},
};
use clap::Parser;
use nutriscan_api::{
    application::http::server::http_server::{router, state},
    args::Args,
};
use serde_json::Value;
use tempfile::{TempDir, tempdir};

async fn server() -> (TestServer, TempDir) {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let arg = |p: &str| root.join(p).to_string_lossy().into_owned();

    let args = Args::parse_from([
        "nutriscan".to_string(),
        "--gemini-api-key".to_string(),
        "test-key".to_string(),
        "--gemini-base-url".to_string(),
        "http://127.0.0.1:9".to_string(),
        "--cache-dir".to_string(),
        arg("cache"),
        "--upload-dir".to_string(),
        arg("uploads"),
        "--profile-dir".to_string(),
        arg("profiles"),
        "--max-upload-bytes".to_string(),
        "1024".to_string(),
    ]);

    let app_state = state(Arc::new(args)).await.unwrap();
    let server = TestServer::new(router(app_state).unwrap()).unwrap();
    (server, dir)
}

fn uploads_are_empty(root: &Path) -> bool {
    std::fs::read_dir(root.join("uploads")).unwrap().count() == 0
}

#[tokio::test]
async fn test_health_check() {
    let (server, _dir) = server().await;
    server.get("/health").await.assert_status_ok();
}

#[tokio::test]
async fn test_disallowed_extension_is_bad_request() {
    let (server, dir) = server().await;

    let form = MultipartForm::new().add_part(
        "image",
        Part::bytes(b"plain text".to_vec())
            .file_name("notes.txt")
            .mime_type("text/plain"),
    );
    let response = server
        .post("/products/analyze")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("req-42"),
        )
        .multipart(form)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.header("x-request-id"), "req-42");

    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "INVALID_EXTENSION");
    assert_eq!(body["error"]["type"], "ValidationError");
    assert_eq!(body["metadata"]["requestId"], "req-42");
    assert!(uploads_are_empty(dir.path()));
}

#[tokio::test]
async fn test_oversized_image_is_rejected() {
    let (server, dir) = server().await;

    let form = MultipartForm::new().add_part(
        "image",
        Part::bytes(vec![0u8; 4096])
            .file_name("label.jpg")
            .mime_type("image/jpeg"),
    );
    let response = server.post("/products/analyze").multipart(form).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "FILE_TOO_LARGE");
    assert!(uploads_are_empty(dir.path()));
}

#[tokio::test]
async fn test_missing_image_field_is_no_file() {
    let (server, _dir) = server().await;

    let form = MultipartForm::new().add_text("note", "no image here");
    let response = server.post("/products/analyze").multipart(form).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "NO_FILE");
    assert!(body["metadata"]["requestId"].is_string());
}

#[tokio::test]
async fn test_health_analysis_requires_user() {
    let (server, _dir) = server().await;

    let form = MultipartForm::new().add_part(
        "image",
        Part::bytes(b"jpeg".to_vec())
            .file_name("label.jpg")
            .mime_type("image/jpeg"),
    );
    let response = server
        .post("/health/analyze")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("req-401"),
        )
        .multipart(form)
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    assert_eq!(body["error"]["type"], "AuthenticationError");
    assert_eq!(body["metadata"]["requestId"], "req-401");
}

#[tokio::test]
async fn test_health_analysis_validates_upload_for_user() {
    let (server, _dir) = server().await;

    let form = MultipartForm::new().add_part(
        "image",
        Part::bytes(b"gif".to_vec())
            .file_name("label.gif")
            .mime_type("image/gif"),
    );
    let response = server
        .post("/health/analyze")
        .add_header(
            HeaderName::from_static("x-user-id"),
            HeaderValue::from_static("user-9"),
        )
        .multipart(form)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "INVALID_EXTENSION");
    assert_eq!(body["metadata"]["userId"], "user-9");
}
