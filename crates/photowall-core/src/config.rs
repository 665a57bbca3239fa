//! Configuration module
//!
//! Configuration is read from the environment (after loading `.env` with `dotenvy`) and
//! validated once at startup so misconfiguration fails fast.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8739;
const BASE_URL: &str = "http://localhost:8739";
const PHOTOS_DIR: &str = "media";
const THUMBNAIL_SIZE: u32 = 200;
const THUMBNAIL_QUALITY: u8 = 85;
const QUEUE_DATABASE_URL: &str = "postgresql://localhost/photowall";
const QUEUE_NAME: &str = "image_processing_queue";
const WORKER_POLL_TIMEOUT_SECS: u64 = 5;
const MAX_UPLOAD_MB: usize = 25;

/// Thumbnail edge lengths a deployment may choose from.
pub const THUMBNAIL_SIZES: [u32; 2] = [200, 400];

/// How derived assets are produced. Chosen once per deployment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DerivationMode {
    /// Thumbnail and preview are generated right after the original is written.
    Inline,
    /// The filename is pushed to the work queue for an external worker.
    Queued,
    /// Originals only.
    Disabled,
}

impl FromStr for DerivationMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inline" | "sync" => Ok(DerivationMode::Inline),
            "queued" | "async" | "queue" => Ok(DerivationMode::Queued),
            "disabled" | "none" | "off" => Ok(DerivationMode::Disabled),
            other => Err(anyhow::anyhow!(
                "Invalid DERIVATION_MODE '{}'. Expected inline, queued or disabled",
                other
            )),
        }
    }
}

/// Backing store for the work queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueBackend {
    Postgres,
    Memory,
}

impl FromStr for QueueBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(QueueBackend::Postgres),
            "memory" | "in-memory" => Ok(QueueBackend::Memory),
            other => Err(anyhow::anyhow!(
                "Invalid QUEUE_BACKEND '{}'. Expected postgres or memory",
                other
            )),
        }
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub base_url: String,
    pub photos_dir: PathBuf,
    pub derivation_mode: DerivationMode,
    /// Hide items from listings until both thumbnail and preview exist.
    pub require_derived_assets: bool,
    pub thumbnail_size: u32,
    pub thumbnail_quality: u8,
    pub queue_backend: QueueBackend,
    pub queue_database_url: String,
    pub queue_name: String,
    pub worker_poll_timeout: Duration,
    pub max_upload_bytes: usize,
    pub cors_origins: Vec<String>,
    pub serve_media: bool,
    pub environment: String,
    pub log_json: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| -> String {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let derivation_mode: DerivationMode = var("DERIVATION_MODE", "inline").parse()?;
        let require_default = if derivation_mode == DerivationMode::Disabled {
            "false"
        } else {
            "true"
        };

        let config = Config {
            host: var("HOST", HOST),
            port: parse_var(&var("PORT", &PORT.to_string()), "PORT")?,
            base_url: var("BASE_URL", BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            photos_dir: PathBuf::from(var("PHOTOS_DIR", PHOTOS_DIR)),
            derivation_mode,
            require_derived_assets: parse_bool(
                &var("REQUIRE_DERIVED_ASSETS", require_default),
                "REQUIRE_DERIVED_ASSETS",
            )?,
            thumbnail_size: parse_var(
                &var("THUMBNAIL_SIZE", &THUMBNAIL_SIZE.to_string()),
                "THUMBNAIL_SIZE",
            )?,
            thumbnail_quality: parse_var(
                &var("THUMBNAIL_QUALITY", &THUMBNAIL_QUALITY.to_string()),
                "THUMBNAIL_QUALITY",
            )?,
            queue_backend: var("QUEUE_BACKEND", "postgres").parse()?,
            queue_database_url: var("QUEUE_DATABASE_URL", QUEUE_DATABASE_URL),
            queue_name: var("QUEUE_NAME", QUEUE_NAME),
            worker_poll_timeout: Duration::from_secs(parse_var(
                &var(
                    "WORKER_POLL_TIMEOUT_SECS",
                    &WORKER_POLL_TIMEOUT_SECS.to_string(),
                ),
                "WORKER_POLL_TIMEOUT_SECS",
            )?),
            max_upload_bytes: parse_var::<usize>(
                &var("MAX_UPLOAD_MB", &MAX_UPLOAD_MB.to_string()),
                "MAX_UPLOAD_MB",
            )? * 1024
                * 1024,
            cors_origins: var("CORS_ORIGINS", "*")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            serve_media: parse_bool(&var("SERVE_MEDIA", "true"), "SERVE_MEDIA")?,
            environment: lookup("ENVIRONMENT")
                .or_else(|| lookup("APP_ENV"))
                .unwrap_or_else(|| "development".to_string()),
            log_json: var("LOG_FORMAT", "text").eq_ignore_ascii_case("json"),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "BASE_URL must start with http:// or https://"
            ));
        }

        if !THUMBNAIL_SIZES.contains(&self.thumbnail_size) {
            return Err(anyhow::anyhow!(
                "THUMBNAIL_SIZE must be one of {:?}",
                THUMBNAIL_SIZES
            ));
        }

        if !(85..=95).contains(&self.thumbnail_quality) {
            return Err(anyhow::anyhow!(
                "THUMBNAIL_QUALITY must be between 85 and 95"
            ));
        }

        if self.queue_name.is_empty() {
            return Err(anyhow::anyhow!("QUEUE_NAME must not be empty"));
        }

        if self.derivation_mode == DerivationMode::Queued
            && self.queue_backend == QueueBackend::Postgres
            && !(self.queue_database_url.starts_with("postgres://")
                || self.queue_database_url.starts_with("postgresql://"))
        {
            return Err(anyhow::anyhow!(
                "QUEUE_DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.max_upload_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_MB must be greater than zero"));
        }

        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: FromStr>(value: &str, key: &str) -> Result<T, anyhow::Error> {
    value
        .parse::<T>()
        .map_err(|_| anyhow::anyhow!("{} has an invalid value: '{}'", key, value))
}

fn parse_bool(value: &str, key: &str) -> Result<bool, anyhow::Error> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow::anyhow!("{} must be a boolean, got '{}'", key, value)),
    }
}
