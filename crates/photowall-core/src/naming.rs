//! Storage filename generation.
//!
//! Names have the form `YYYY-MM-DD-HH-MM-SS-RRRRRRRR.<ext>`. The timestamp prefix makes a
//! descending lexical sort equal to newest-first. The 8-digit random suffix only makes
//! collisions within the same second unlikely; callers that need a guarantee commit with
//! no-clobber semantics and retry with a fresh name.

use chrono::{DateTime, Utc};
use rand::Rng;
use std::path::Path;

use crate::models::{ImageKind, SUPPORTED_EXTENSIONS};

/// Largest value of the random suffix (inclusive).
pub const RANDOM_SUFFIX_MAX: u32 = 99_999_999;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// Generate a storage filename for an upload received now.
pub fn generate_filename(original_name: &str, kind: ImageKind) -> String {
    let suffix = rand::rng().random_range(0..=RANDOM_SUFFIX_MAX);
    generate_filename_at(Utc::now(), suffix, original_name, kind)
}

/// Deterministic form of [`generate_filename`].
pub fn generate_filename_at(
    now: DateTime<Utc>,
    suffix: u32,
    original_name: &str,
    kind: ImageKind,
) -> String {
    format!(
        "{}-{:08}.{}",
        now.format(TIMESTAMP_FORMAT),
        suffix.min(RANDOM_SUFFIX_MAX),
        storage_extension(original_name, kind)
    )
}

/// Extension hint from the client name when it is one the store lists, otherwise the
/// extension mapped from the detected kind.
pub fn storage_extension(original_name: &str, kind: ImageKind) -> String {
    Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| SUPPORTED_EXTENSIONS.contains(&e.as_str()))
        .unwrap_or_else(|| kind.extension().to_string())
}
