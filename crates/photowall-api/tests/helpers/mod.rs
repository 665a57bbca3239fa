//! Shared setup for API integration tests.
//!
//! Each test gets the real router over a fresh temp directory. Queued deployments use
//! the in-memory queue, so nothing external is needed.

#![allow(dead_code)]

use axum_test::TestServer;
use image::{DynamicImage, ImageFormat, RgbImage};
use photowall_api::setup::initialize_app;
use photowall_api::AppState;
use photowall_core::Config;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const BASE_URL: &str = "http://photos.test";

pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn photos_dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn thumbnail_path(&self, filename: &str) -> PathBuf {
        self.dir.path().join("thumbnails").join(filename)
    }

    pub fn preview_path(&self, filename: &str) -> PathBuf {
        self.dir.path().join("previews").join(filename)
    }

    /// Place an original directly on disk, bypassing the API.
    pub fn seed_original(&self, filename: &str) {
        std::fs::write(self.dir.path().join(filename), create_test_png(4, 4)).unwrap();
    }

    pub fn seed_derived(&self, filename: &str) {
        std::fs::create_dir_all(self.dir.path().join("thumbnails")).unwrap();
        std::fs::create_dir_all(self.dir.path().join("previews")).unwrap();
        std::fs::write(self.thumbnail_path(filename), b"thumb").unwrap();
        std::fs::write(self.preview_path(filename), b"preview").unwrap();
    }

    pub async fn shutdown(self) {
        self.state.shutdown().await;
    }
}

/// Start the app with `overrides` applied on top of test defaults.
pub async fn setup_test_app(overrides: &[(&str, &str)]) -> TestApp {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    let mut vars: HashMap<String, String> = HashMap::from([
        ("BASE_URL".to_string(), BASE_URL.to_string()),
        (
            "PHOTOS_DIR".to_string(),
            dir.path().to_string_lossy().to_string(),
        ),
        ("DERIVATION_MODE".to_string(), "inline".to_string()),
        ("QUEUE_BACKEND".to_string(), "memory".to_string()),
        ("WORKER_POLL_TIMEOUT_SECS".to_string(), "1".to_string()),
        ("ENVIRONMENT".to_string(), "test".to_string()),
    ]);
    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }

    let config = Config::from_lookup(|key| vars.get(key).cloned()).expect("Invalid test config");
    let (state, app) = initialize_app(config)
        .await
        .expect("Failed to initialize app");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp { server, state, dir }
}

pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 90])
    });
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .expect("Failed to encode PNG");
    buffer
}

pub fn create_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, image::Rgb([30, 160, 60]));
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)
        .expect("Failed to encode JPEG");
    buffer
}

/// Poll until `check` holds or `timeout` passes.
pub async fn wait_for<F>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
