//! Image processing module
//!
//! Decoding with EXIF auto-orientation, the crop/fit geometry used for derived assets,
//! and JPEG encoding of the results.

pub mod derive;
pub mod resize;

pub use derive::{DeriveError, DerivedImages};
pub use resize::{center_square, fit_within, RESAMPLE_FILTER};
