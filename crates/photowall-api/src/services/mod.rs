//! Business logic behind the HTTP handlers

pub mod catalog;
pub mod ingest;

pub use catalog::{CatalogPage, CatalogService};
pub use ingest::{DerivationStrategy, IngestService, StoredUpload};
