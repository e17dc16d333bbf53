#![cfg(all(unix, feature = "server"))]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use bg_remover::config::UploadConfig;
use bg_remover::http::{AppState, REMOVE_BG_PATH, UploadStore, create_router};
use bg_remover::{BackgroundRemover, ToolSettings};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "bg-remover-test-boundary";

fn stub_tool(script: &str) -> ToolSettings {
    ToolSettings::new("sh").with_args(["-c", script, "stub-tool"])
}

/// A router running `settings`, storing files under `<temp dir>/uploads`.
async fn app_with_settings(settings: ToolSettings) -> (Router, TempDir) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let uploads = UploadStore::init(&UploadConfig {
        dir: dir.path().join("uploads"),
        url_prefix: "/uploads".to_string(),
    })
    .await
    .expect("failed to init upload store");
    let remover = BackgroundRemover::new(settings);
    (create_router(AppState::new(remover, uploads)), dir)
}

/// A router whose tool runs `script` through `sh -c`.
async fn app_with_tool(script: &str) -> (Router, TempDir) {
    app_with_settings(stub_tool(script)).await
}

/// Names of stored uploads (not outputs) left in the uploads directory.
fn stored_uploads(dir: &TempDir) -> Vec<String> {
    std::fs::read_dir(dir.path().join("uploads"))
        .expect("failed to read uploads dir")
        .map(|entry| entry.expect("failed to read entry").file_name())
        .filter_map(|name| name.into_string().ok())
        .filter(|name| name.starts_with("upload-"))
        .collect()
}

/// Multipart form parts: `(name, Some(file_name) | None, body)`.
fn multipart_body(parts: &[(&str, Option<&str>, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file_name, content) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(content.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(REMOVE_BG_PATH)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .expect("failed to build request")
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    (status, bytes.to_vec())
}

async fn send_json(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, request).await;
    let json = serde_json::from_slice(&bytes).expect("expected a JSON body");
    (status, json)
}

#[tokio::test]
async fn get_is_method_not_allowed() {
    let (app, _dir) = app_with_tool("exit 0").await;
    let request = Request::builder()
        .method(Method::GET)
        .uri(REMOVE_BG_PATH)
        .body(Body::empty())
        .unwrap();

    let (status, json) = send_json(app, request).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(json["error"], "Method not allowed");
}

#[tokio::test]
async fn missing_image_field_is_bad_request() {
    let (app, _dir) = app_with_tool("exit 0").await;
    let request = upload_request(&[("model", None, "silueta")]);

    let (status, json) = send_json(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No image file provided");
}

#[tokio::test]
async fn non_multipart_body_is_bad_request() {
    let (app, _dir) = app_with_tool("exit 0").await;
    let request = Request::builder()
        .method(Method::POST)
        .uri(REMOVE_BG_PATH)
        .body(Body::empty())
        .unwrap();

    let (status, json) = send_json(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No image file provided");
}

#[tokio::test]
async fn successful_upload_returns_output_urls() {
    let (app, _dir) = app_with_tool(": > \"$2\"").await;
    let request = upload_request(&[("image", Some("photo.png"), "not really a png")]);

    let (status, json) = send_json(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Background removed successfully");
    assert!(json["svgUrl"].is_null());

    let output_url = json["outputUrl"].as_str().expect("outputUrl is a string");
    assert!(output_url.starts_with("/uploads/output-"));
    assert!(output_url.ends_with(".png"));
    let output_path = json["outputPath"].as_str().expect("outputPath is a string");
    assert!(output_path.ends_with(output_url.trim_start_matches("/uploads/")));
}

#[tokio::test]
async fn vector_request_adds_svg_url_with_same_base() {
    let (app, _dir) = app_with_tool("exit 0").await;
    let request = upload_request(&[
        ("image", Some("photo.jpg"), "jpeg bytes"),
        ("vector", None, "true"),
    ]);

    let (status, json) = send_json(app, request).await;
    assert_eq!(status, StatusCode::OK);

    let output_url = json["outputUrl"].as_str().expect("outputUrl is a string");
    let svg_url = json["svgUrl"].as_str().expect("svgUrl is a string");
    assert_eq!(svg_url, output_url.replace(".png", ".svg"));
}

#[tokio::test]
async fn form_fields_reach_the_tool_with_defaults_filled_in() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let record = dir.path().join("args.txt");
    let (app, _uploads) =
        app_with_tool(&format!("printf '%s\\n' \"$@\" > '{}'", record.display())).await;
    let request = upload_request(&[
        ("image", Some("photo.png"), "png bytes"),
        ("enhance", None, "true"),
    ]);

    let (status, _) = send_json(app, request).await;
    assert_eq!(status, StatusCode::OK);

    let recorded = std::fs::read_to_string(&record).expect("failed to read recorded args");
    let args: Vec<&str> = recorded.lines().collect();
    assert_eq!(
        args[2..],
        [
            "--background",
            "linear-gradient(to right, #ff7e5f, #feb47b)",
            "--enhance",
            "--model",
            "silueta",
        ]
    );
}

#[tokio::test]
async fn tool_failure_is_internal_server_error() {
    let (app, _dir) = app_with_tool("printf boom >&2; exit 1").await;
    let request = upload_request(&[("image", Some("photo.png"), "png bytes")]);

    let (status, json) = send_json(app, request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "boom");
    assert!(json["details"].as_str().is_some_and(|d| d.contains("Exit")));
}

#[tokio::test]
async fn unsupported_upload_is_internal_server_error() {
    let (app, _dir) = app_with_tool("exit 0").await;
    let request = upload_request(&[("image", Some("anim.gif"), "GIF89a")]);

    let (status, json) = send_json(app, request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        json["error"]
            .as_str()
            .is_some_and(|e| e.contains("Unsupported file format"))
    );
}

#[tokio::test]
async fn rejected_uploads_are_not_kept() {
    for file_name in ["anim.gif", "page.html"] {
        let (app, dir) = app_with_tool("exit 0").await;
        let request = upload_request(&[("image", Some(file_name), "<script>alert(1)</script>")]);

        let (status, json) = send_json(app, request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(
            json["details"]
                .as_str()
                .is_some_and(|d| !d.contains(".html"))
        );
        assert!(stored_uploads(&dir).is_empty(), "{file_name} left behind");
    }
}

#[tokio::test]
async fn failed_tool_run_discards_the_upload() {
    let (app, dir) = app_with_tool("exit 3").await;
    let request = upload_request(&[("image", Some("photo.png"), "png bytes")]);

    let (status, _) = send_json(app, request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(stored_uploads(&dir).is_empty());
}

#[tokio::test]
async fn successful_upload_is_kept() {
    let (app, dir) = app_with_tool("exit 0").await;
    let request = upload_request(&[("image", Some("Photo.PNG"), "png bytes")]);

    let (status, _) = send_json(app, request).await;
    assert_eq!(status, StatusCode::OK);
    let stored = stored_uploads(&dir);
    assert_eq!(stored.len(), 1);
    assert!(stored[0].ends_with(".png"));
}

#[tokio::test]
async fn body_over_the_limit_is_payload_too_large() {
    let mut settings = stub_tool("exit 0");
    settings.max_input_bytes = 1024;
    let (app, dir) = app_with_settings(settings).await;
    let oversized = "x".repeat(2 * 1024 * 1024);
    let request = upload_request(&[("image", Some("photo.png"), &oversized)]);

    let (status, json) = send_json(app, request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(json["error"].is_string());
    assert!(stored_uploads(&dir).is_empty());
}

#[tokio::test]
async fn outputs_are_served_from_uploads_prefix() {
    let (app, _dir) = app_with_tool("printf processed > \"$2\"").await;
    let request = upload_request(&[("image", Some("photo.png"), "png bytes")]);

    let (status, json) = send_json(app.clone(), request).await;
    assert_eq!(status, StatusCode::OK);
    let output_url = json["outputUrl"].as_str().expect("outputUrl is a string");

    let fetch = Request::builder().uri(output_url).body(Body::empty()).unwrap();
    let (status, body) = send(app, fetch).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"processed");
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _dir) = app_with_tool("exit 0").await;
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, json) = send_json(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
}
