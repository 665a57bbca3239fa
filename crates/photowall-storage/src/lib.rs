//! Photowall Storage Library
//!
//! This crate owns the on-disk layout of the photo collection:
//!
//! - `<root>/{filename}` for originals
//! - `<root>/thumbnails/{filename}` and `<root>/previews/{filename}` for derived assets
//!
//! Filenames are identical across the three directories. Every write goes to a hidden
//! temporary file in the destination directory and is renamed into place, so listings
//! never observe a partially written file.

pub mod error;
pub mod local;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use local::{LocalAssetStore, StagedFile};
