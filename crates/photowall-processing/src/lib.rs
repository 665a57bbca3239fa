//! Photowall Processing Library
//!
//! Content sniffing for uploads and generation of derived assets (thumbnail and preview)
//! from stored originals.

pub mod image;
pub mod pipeline;
pub mod sniff;

pub use self::image::{DeriveError, DerivedImages};
pub use pipeline::{DerivationOutcome, DerivationPipeline, DerivationSettings};
pub use sniff::{sniff, sniff_reader, SNIFF_LEN};
