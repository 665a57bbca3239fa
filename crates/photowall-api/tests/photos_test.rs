//! Photo API integration tests.
//!
//! Run with: `cargo test -p photowall-api --test photos_test`

mod helpers;

use axum_test::multipart::{MultipartForm, Part};
use base64::{engine::general_purpose, Engine as _};
use helpers::{create_test_jpeg, create_test_png, setup_test_app, wait_for, BASE_URL};
use regex::Regex;
use serde_json::{json, Value};
use std::time::Duration;

fn filename_pattern() -> Regex {
    Regex::new(r"^\d{4}-\d{2}-\d{2}-\d{2}-\d{2}-\d{2}-\d{8}\.(jpg|jpeg|png|gif|webp)$").unwrap()
}

fn image_name(body: &Value) -> String {
    body["photo"]["image_name"]
        .as_str()
        .expect("Expected photo.image_name in upload response")
        .to_string()
}

#[tokio::test]
async fn test_upload_json_base64() {
    let app = setup_test_app(&[]).await;
    let png = create_test_png(640, 480);

    let response = app
        .client()
        .post("/api/photos")
        .json(&json!({
            "image_content": general_purpose::STANDARD.encode(&png),
            "image_name": "Beach Day.PNG",
        }))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    let name = image_name(&body);
    assert!(filename_pattern().is_match(&name), "unexpected name {}", name);
    assert!(name.ends_with(".png"));

    assert_eq!(
        body["photo"]["image_url"],
        format!("{}/media/{}", BASE_URL, name)
    );
    assert_eq!(
        body["photo"]["thumbnail_url"],
        format!("{}/media/thumbnails/{}", BASE_URL, name)
    );
    assert_eq!(
        body["photo"]["preview_url"],
        format!("{}/media/previews/{}", BASE_URL, name)
    );

    let stored = std::fs::read(app.photos_dir().join(&name)).unwrap();
    assert_eq!(stored, png);

    // Derived assets are JPEG whatever the original's extension.
    let thumb = image::load_from_memory(&std::fs::read(app.thumbnail_path(&name)).unwrap()).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (200, 200));
    let preview =
        image::load_from_memory(&std::fs::read(app.preview_path(&name)).unwrap()).unwrap();
    assert_eq!((preview.width(), preview.height()), (640, 480));
}

#[tokio::test]
async fn test_upload_json_data_url() {
    let app = setup_test_app(&[]).await;
    let jpeg = create_test_jpeg(64, 64);

    let response = app
        .client()
        .post("/api/photos")
        .json(&json!({
            "image_content": format!("data:image/jpeg;base64,{}", general_purpose::STANDARD.encode(&jpeg)),
            "image_name": "camera-roll",
        }))
        .await;

    assert_eq!(response.status_code(), 200);
    let name = image_name(&response.json());
    assert!(name.ends_with(".jpg"));
}

#[tokio::test]
async fn test_upload_multipart() {
    let app = setup_test_app(&[]).await;
    let png = create_test_png(120, 80);

    let part = Part::bytes(bytes::Bytes::from(png.clone()))
        .file_name("scan.png")
        .mime_type("image/png");
    let form = MultipartForm::new()
        .add_text("caption", "ignored")
        .add_part("file", part);

    let response = app.client().post("/api/photos").multipart(form).await;

    assert_eq!(response.status_code(), 200);
    let name = image_name(&response.json());
    assert!(filename_pattern().is_match(&name));
    assert_eq!(std::fs::read(app.photos_dir().join(&name)).unwrap(), png);
    assert!(app.thumbnail_path(&name).exists());
}

#[tokio::test]
async fn test_upload_multipart_declared_type_is_not_trusted() {
    let app = setup_test_app(&[]).await;

    let part = Part::bytes(bytes::Bytes::from(create_test_png(16, 16)))
        .file_name("upload")
        .mime_type("image/jpeg");
    let form = MultipartForm::new().add_part("file", part);

    let response = app.client().post("/api/photos").multipart(form).await;

    assert_eq!(response.status_code(), 200);
    assert!(image_name(&response.json()).ends_with(".png"));
}

#[tokio::test]
async fn test_upload_multipart_without_file_field() {
    let app = setup_test_app(&[]).await;
    let form = MultipartForm::new().add_text("caption", "no file here");

    let response = app.client().post("/api/photos").multipart(form).await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert!(body["message"].as_str().unwrap().contains("file"));
}

#[tokio::test]
async fn test_upload_rejects_non_image_content() {
    let app = setup_test_app(&[]).await;

    let response = app
        .client()
        .post("/api/photos")
        .json(&json!({
            "image_content": general_purpose::STANDARD.encode(b"%PDF-1.4 this is not a photo"),
            "image_name": "report.jpg",
        }))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert!(body["message"].as_str().unwrap().contains("Unsupported image type"));

    let entries = std::fs::read_dir(app.photos_dir())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .count();
    assert_eq!(entries, 0);
}

#[tokio::test]
async fn test_upload_rejects_bad_base64() {
    let app = setup_test_app(&[]).await;

    let response = app
        .client()
        .post("/api/photos")
        .json(&json!({ "image_content": "***", "image_name": "a.png" }))
        .await;

    assert_eq!(response.status_code(), 400);
    assert!(response.json::<Value>()["message"].is_string());
}

#[tokio::test]
async fn test_upload_rejects_malformed_json() {
    let app = setup_test_app(&[]).await;

    let response = app
        .client()
        .post("/api/photos")
        .json(&json!({ "image_name": "missing-content.png" }))
        .await;

    assert_eq!(response.status_code(), 400);
    assert!(response.json::<Value>()["message"].is_string());
}

#[tokio::test]
async fn test_upload_too_large() {
    let app = setup_test_app(&[("MAX_UPLOAD_MB", "1")]).await;
    let oversized = vec![0xAB_u8; 2 * 1024 * 1024];

    let response = app
        .client()
        .post("/api/photos")
        .json(&json!({
            "image_content": general_purpose::STANDARD.encode(&oversized),
            "image_name": "huge.png",
        }))
        .await;

    assert_eq!(response.status_code(), 413);
}

#[tokio::test]
async fn test_upload_without_derivation() {
    let app = setup_test_app(&[("DERIVATION_MODE", "disabled")]).await;

    let response = app
        .client()
        .post("/api/photos")
        .json(&json!({
            "image_content": general_purpose::STANDARD.encode(create_test_png(32, 32)),
            "image_name": "a.png",
        }))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert!(body["photo"].get("thumbnail_url").is_none());
    assert!(body["photo"].get("preview_url").is_none());
    assert!(!app.photos_dir().join("thumbnails").exists());

    // Originals-only deployments list everything.
    let listing: Value = app.client().get("/api/photos").await.json();
    assert_eq!(listing["photos"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_queued_upload_is_derived_by_worker() {
    let app = setup_test_app(&[("DERIVATION_MODE", "queued")]).await;

    let response = app
        .client()
        .post("/api/photos")
        .json(&json!({
            "image_content": general_purpose::STANDARD.encode(create_test_png(300, 300)),
            "image_name": "queued.png",
        }))
        .await;
    assert_eq!(response.status_code(), 200);
    let name = image_name(&response.json());

    let thumbnail = app.thumbnail_path(&name);
    let preview = app.preview_path(&name);
    assert!(
        wait_for(Duration::from_secs(10), || thumbnail.exists() && preview.exists()).await,
        "worker did not derive assets"
    );

    let listing: Value = app.client().get("/api/photos").await.json();
    assert_eq!(listing["photos"][0]["image_name"], name);

    app.shutdown().await;
}

#[tokio::test]
async fn test_queue_failure_does_not_fail_upload() {
    let app = setup_test_app(&[("DERIVATION_MODE", "queued")]).await;
    app.state.shutdown().await;

    let response = app
        .client()
        .post("/api/photos")
        .json(&json!({
            "image_content": general_purpose::STANDARD.encode(create_test_png(16, 16)),
            "image_name": "a.png",
        }))
        .await;

    assert_eq!(response.status_code(), 200);
    let name = image_name(&response.json());
    assert!(app.photos_dir().join(&name).exists());
}

#[tokio::test]
async fn test_list_pagination() {
    let app = setup_test_app(&[("REQUIRE_DERIVED_ASSETS", "false")]).await;
    for second in 0..25 {
        app.seed_original(&format!("2024-03-01-10-00-{:02}-00000001.jpg", second));
    }

    let response = app.client().get("/api/photos").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["page"], 1);
    assert_eq!(body["total_pages"], 3);
    let photos = body["photos"].as_array().unwrap();
    assert_eq!(photos.len(), 10);
    assert_eq!(photos[0]["image_name"], "2024-03-01-10-00-24-00000001.jpg");
    assert_eq!(
        photos[0]["image_url"],
        format!("{}/media/2024-03-01-10-00-24-00000001.jpg", BASE_URL)
    );
    assert!(photos[0].get("thumbnail_url").is_none());

    let body: Value = app.client().get("/api/photos?page=3&per_page=10").await.json();
    let photos = body["photos"].as_array().unwrap();
    assert_eq!(photos.len(), 5);
    assert_eq!(photos[4]["image_name"], "2024-03-01-10-00-00-00000001.jpg");

    let body: Value = app.client().get("/api/photos?page=4").await.json();
    assert_eq!(body["photos"].as_array().unwrap().len(), 0);
    assert_eq!(body["page"], 4);
    assert_eq!(body["total_pages"], 3);

    let body: Value = app.client().get("/api/photos?perPage=20").await.json();
    assert_eq!(body["photos"].as_array().unwrap().len(), 20);
    assert_eq!(body["total_pages"], 2);
}

#[tokio::test]
async fn test_list_bad_parameters_fall_back() {
    let app = setup_test_app(&[("REQUIRE_DERIVED_ASSETS", "false")]).await;
    for second in 0..15 {
        app.seed_original(&format!("2024-03-01-10-00-{:02}-00000001.png", second));
    }

    let body: Value = app
        .client()
        .get("/api/photos?page=abc&per_page=-4")
        .await
        .json();
    assert_eq!(body["page"], 1);
    assert_eq!(body["photos"].as_array().unwrap().len(), 10);

    let body: Value = app.client().get("/api/photos?per_page=1000").await.json();
    assert_eq!(body["photos"].as_array().unwrap().len(), 15);
    assert_eq!(body["total_pages"], 1);
}

#[tokio::test]
async fn test_list_hides_items_without_derived_assets() {
    let app = setup_test_app(&[]).await;
    app.seed_original("2024-05-05-12-00-00-00000001.jpg");
    app.seed_original("2024-05-05-12-00-01-00000002.jpg");
    app.seed_derived("2024-05-05-12-00-00-00000001.jpg");

    let body: Value = app.client().get("/api/photos").await.json();
    let photos = body["photos"].as_array().unwrap();
    assert_eq!(photos.len(), 1);
    assert_eq!(photos[0]["image_name"], "2024-05-05-12-00-00-00000001.jpg");
    assert_eq!(
        photos[0]["thumbnail_url"],
        format!("{}/media/thumbnails/2024-05-05-12-00-00-00000001.jpg", BASE_URL)
    );
    assert_eq!(body["total_pages"], 1);
}

#[tokio::test]
async fn test_list_ignores_non_image_files() {
    let app = setup_test_app(&[("REQUIRE_DERIVED_ASSETS", "false")]).await;
    app.seed_original("2024-05-05-12-00-00-00000001.jpg");
    std::fs::write(app.photos_dir().join("notes.txt"), b"hello").unwrap();
    std::fs::write(app.photos_dir().join(".upload-abc.partial"), b"half").unwrap();

    let body: Value = app.client().get("/api/photos").await.json();
    assert_eq!(body["photos"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_empty_catalog() {
    let app = setup_test_app(&[]).await;

    let body: Value = app.client().get("/api/photos").await.json();
    assert_eq!(body["photos"].as_array().unwrap().len(), 0);
    assert_eq!(body["total_pages"], 0);
    assert_eq!(body["page"], 1);
}

#[tokio::test]
async fn test_delete_photo() {
    let app = setup_test_app(&[("REQUIRE_DERIVED_ASSETS", "false")]).await;
    let name = "2024-05-05-12-00-00-00000001.jpg";
    app.seed_original(name);

    let response = app.client().delete(&format!("/api/photos/{}", name)).await;
    assert_eq!(response.status_code(), 204);
    assert!(!app.photos_dir().join(name).exists());

    let response = app.client().delete(&format!("/api/photos/{}", name)).await;
    assert_eq!(response.status_code(), 404);
    assert!(response.json::<Value>()["message"].is_string());
}

#[tokio::test]
async fn test_media_is_served() {
    let app = setup_test_app(&[]).await;
    let png = create_test_png(16, 16);

    let response = app
        .client()
        .post("/api/photos")
        .json(&json!({
            "image_content": general_purpose::STANDARD.encode(&png),
            "image_name": "a.png",
        }))
        .await;
    let name = image_name(&response.json());

    let response = app.client().get(&format!("/media/{}", name)).await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.as_bytes().as_ref(), png.as_slice());

    let response = app.client().get(&format!("/media/thumbnails/{}", name)).await;
    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn test_health() {
    let app = setup_test_app(&[]).await;

    let response = app.client().get("/health").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], "healthy");
    assert_eq!(body["queue"], "disabled");
    assert!(body.get("queue_length").is_none());
}

#[tokio::test]
async fn test_health_reports_queue() {
    let app = setup_test_app(&[("DERIVATION_MODE", "queued")]).await;

    let body: Value = app.client().get("/health").await.json();
    assert_eq!(body["queue"], "healthy");
    assert_eq!(body["queue_length"], 0);

    app.state.shutdown().await;
    let body: Value = app.client().get("/health").await.json();
    assert_eq!(body["status"], "degraded");
    assert!(body["queue"].as_str().unwrap().starts_with("unavailable"));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = setup_test_app(&[]).await;

    let response = app
        .client()
        .get("/health")
        .add_header("x-request-id", "trace-123")
        .await;

    assert_eq!(response.header("x-request-id"), "trace-123");
}
