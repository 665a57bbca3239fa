//! Photowall API Library
//!
//! HTTP handlers, application state and setup for the photo upload service.

mod handlers;
pub mod error;
pub mod services;
pub mod setup;
pub mod state;
mod utils;

pub use error::HttpAppError;
pub use services::{CatalogPage, CatalogService, DerivationStrategy, IngestService, StoredUpload};
pub use state::AppState;
