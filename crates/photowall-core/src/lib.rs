//! Photowall Core Library
//!
//! This crate provides the domain models, error taxonomy, configuration, filename
//! generation and public URL building shared by every Photowall component.

pub mod config;
pub mod error;
pub mod models;
pub mod naming;
pub mod urls;

// Re-export commonly used types
pub use config::{Config, DerivationMode, QueueBackend};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{DerivedKind, ImageKind, Photo, SUPPORTED_EXTENSIONS};
pub use naming::generate_filename;
pub use urls::UrlBuilder;
