//! End-to-end tests for the upload and stories endpoints.

use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use serde_json::{Value, json};
use social_media_uploads::config::Config;
use social_media_uploads::media::{ErrorResponse, MAX_UPLOAD_BYTES, UploadResponse};
use social_media_uploads::routes::{AppState, router};
use social_media_uploads::stories::Story;
use tempfile::TempDir;

fn test_server(temp_dir: &TempDir) -> TestServer {
    let config = Config {
        public_dir: temp_dir.path().to_path_buf(),
        settle_delay: Duration::from_millis(1),
        ..Config::default()
    };
    TestServer::new(router(AppState::from_config(&config))).expect("Failed to create test server")
}

fn form(
    bytes: Vec<u8>,
    file_name: &str,
    media_type: &str,
    category: Option<&str>,
) -> MultipartForm {
    let part = Part::bytes(bytes).file_name(file_name).mime_type(media_type);
    let form = MultipartForm::new().add_part("file", part);
    match category {
        Some(category) => form.add_text("type", category),
        None => form,
    }
}

fn assert_generated_path(path: &str, category: &str, ext: &str) {
    let prefix = format!("/uploads/{category}/");
    assert!(path.starts_with(&prefix), "unexpected path {path}");
    let name = &path[prefix.len()..];
    let (stem, actual_ext) = name.rsplit_once('.').unwrap();
    assert_eq!(actual_ext, ext);
    let (ts, id) = stem.split_once('-').unwrap();
    assert!(ts.parse::<i64>().is_ok());
    assert!(uuid::Uuid::parse_str(id).is_ok());
}

#[tokio::test]
async fn jpeg_upload_is_stored_and_served() {
    let temp_dir = TempDir::new().unwrap();
    let server = test_server(&temp_dir);
    let bytes = vec![0xFFu8; 2048];

    let response = server
        .post("/api/upload")
        .multipart(form(bytes.clone(), "cat.jpg", "image/jpeg", Some("posts")))
        .await;
    response.assert_status(StatusCode::OK);
    let body: UploadResponse = response.json();
    assert!(body.success);
    assert_eq!(body.original_name, "cat.jpg");
    assert_eq!(body.size, 2048);
    assert_generated_path(&body.file_path, "posts", "jpg");

    let served = server.get(&body.file_path).await;
    served.assert_status(StatusCode::OK);
    assert_eq!(served.as_bytes().as_ref(), bytes.as_slice());
}

#[tokio::test]
async fn unknown_category_lands_in_posts() {
    let temp_dir = TempDir::new().unwrap();
    let server = test_server(&temp_dir);

    let response = server
        .post("/api/upload")
        .multipart(form(vec![1u8; 10], "clip.mp4", "video/mp4", Some("banners")))
        .await;
    response.assert_status(StatusCode::OK);
    let body: UploadResponse = response.json();
    assert_generated_path(&body.file_path, "posts", "mp4");

    let response = server
        .post("/api/upload")
        .multipart(form(vec![1u8; 10], "me.png", "image/png", Some("profiles")))
        .await;
    let body: UploadResponse = response.json();
    assert_generated_path(&body.file_path, "profiles", "png");
}

#[tokio::test]
async fn empty_file_fails_on_primary_endpoint() {
    let temp_dir = TempDir::new().unwrap();
    let server = test_server(&temp_dir);

    let response = server
        .post("/api/upload")
        .multipart(form(Vec::new(), "blank.png", "image/png", None))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorResponse = response.json();
    assert_eq!(body.error, "Uploaded file is empty");
}

#[tokio::test]
async fn pdf_is_rejected_with_bad_request() {
    let temp_dir = TempDir::new().unwrap();
    let server = test_server(&temp_dir);

    let response = server
        .post("/api/upload")
        .multipart(form(vec![1u8; 10], "doc.pdf", "application/pdf", None))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post("/api/upload-fallback")
        .multipart(form(vec![1u8; 10], "doc.pdf", "application/pdf", None))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body.get("error").is_some());
    assert!(body.get("success").is_none());
}

#[tokio::test]
async fn oversize_upload_is_rejected_before_writing() {
    let temp_dir = TempDir::new().unwrap();
    let server = test_server(&temp_dir);

    let response = server
        .post("/api/upload")
        .multipart(form(vec![0u8; MAX_UPLOAD_BYTES], "big.jpg", "image/jpeg", Some("stories")))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(!temp_dir.path().join("uploads").join("stories").exists());

    let response = server
        .post("/api/upload-fallback")
        .multipart(form(vec![0u8; MAX_UPLOAD_BYTES], "big.jpg", "image/jpeg", Some("stories")))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_form_is_rejected_by_both_endpoints() {
    let temp_dir = TempDir::new().unwrap();
    let server = test_server(&temp_dir);
    let filler = "a".repeat(30 * 1024 * 1024);

    for endpoint in ["/api/upload", "/api/upload-fallback"] {
        let file = Part::bytes(vec![0x89u8; 16])
            .file_name("tiny.png")
            .mime_type("image/png");
        let multipart = MultipartForm::new()
            .add_text("filler", filler.clone())
            .add_part("file", file);
        let response = server.post(endpoint).multipart(multipart).await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
    assert!(!temp_dir.path().join("uploads").join("posts").exists());
}

#[tokio::test]
async fn fallback_rejects_oversized_type_field() {
    let temp_dir = TempDir::new().unwrap();
    let server = test_server(&temp_dir);

    let response = server
        .post("/api/upload-fallback")
        .multipart(form(vec![1u8; 16], "a.png", "image/png", Some(&"x".repeat(4096))))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(!temp_dir.path().join("uploads").join("posts").exists());
}

#[tokio::test]
async fn missing_file_field_is_bad_request() {
    let temp_dir = TempDir::new().unwrap();
    let server = test_server(&temp_dir);

    let response = server
        .post("/api/upload")
        .multipart(MultipartForm::new().add_text("type", "posts"))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: ErrorResponse = response.json();
    assert_eq!(body.error, "No file uploaded");
}

#[tokio::test]
async fn fallback_endpoint_stores_file() {
    let temp_dir = TempDir::new().unwrap();
    let server = test_server(&temp_dir);

    let response = server
        .post("/api/upload-fallback")
        .multipart(form(vec![3u8; 512], "story.webm", "video/webm", Some("stories")))
        .await;
    response.assert_status(StatusCode::OK);
    let body: UploadResponse = response.json();
    assert_generated_path(&body.file_path, "stories", "webm");
    assert_eq!(body.size, 512);

    let on_disk = temp_dir.path().join(body.file_path.trim_start_matches('/'));
    assert_eq!(std::fs::metadata(on_disk).unwrap().len(), 512);
}

#[tokio::test]
async fn orchestrated_endpoint_passes_unconvertible_avif_through() {
    let temp_dir = TempDir::new().unwrap();
    let server = test_server(&temp_dir);

    let response = server
        .post("/api/media")
        .multipart(form(vec![0x11u8; 64], "pic.avif", "image/avif", Some("posts")))
        .await;
    response.assert_status(StatusCode::OK);
    let body: UploadResponse = response.json();
    assert_generated_path(&body.file_path, "posts", "avif");
    assert_eq!(body.original_name, "pic.avif");
}

#[tokio::test]
async fn orchestrated_empty_file_fails_after_fallback() {
    let temp_dir = TempDir::new().unwrap();
    let server = test_server(&temp_dir);

    let response = server
        .post("/api/media")
        .multipart(form(Vec::new(), "blank.png", "image/png", None))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorResponse = response.json();
    assert!(body.error.starts_with("Fallback upload failed"));
}

#[tokio::test]
async fn stories_lifecycle() {
    let temp_dir = TempDir::new().unwrap();
    let server = test_server(&temp_dir);

    let response = server
        .post("/api/stories")
        .json(&json!({ "userId": "u1", "mediaUrl": "/uploads/stories/1-a.png" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let story: Story = response.json();
    assert!(story.expires_at > story.created_at);

    let listed: Vec<Story> = server.get("/api/stories").await.json();
    assert_eq!(listed.len(), 1);

    let viewed: Story = server
        .post(&format!("/api/stories/{}/view", story.id))
        .json(&json!({ "userId": "u2" }))
        .await
        .json();
    assert_eq!(viewed.viewers, vec!["u2".to_string()]);

    server
        .get(&format!("/api/stories/{}", story.id))
        .await
        .assert_status(StatusCode::OK);
    server
        .delete(&format!("/api/stories/{}", story.id))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .get(&format!("/api/stories/{}", story.id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn story_requires_media_url() {
    let temp_dir = TempDir::new().unwrap();
    let server = test_server(&temp_dir);

    let response = server
        .post("/api/stories")
        .json(&json!({ "userId": "u1", "mediaUrl": "  " }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_reports_ok() {
    let temp_dir = TempDir::new().unwrap();
    let server = test_server(&temp_dir);
    let body: Value = server.get("/health").await.json();
    assert_eq!(body, json!({ "status": "ok" }));
}
