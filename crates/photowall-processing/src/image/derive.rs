//! Thumbnail and preview rendering

use super::resize::{center_square, fit_within, RESAMPLE_FILTER};
use image::codecs::jpeg::JpegEncoder;
use image::metadata::Orientation;
use image::{DynamicImage, GenericImageView, ImageDecoder, ImageReader};
use std::io::Cursor;

#[derive(Debug, thiserror::Error)]
pub enum DeriveError {
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode JPEG: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Image has zero width or height")]
    Empty,
}

/// Derived asset renderer
pub struct DerivedImages;

impl DerivedImages {
    /// Decode an original and apply its EXIF orientation.
    pub fn decode(data: &[u8]) -> Result<DynamicImage, DeriveError> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| DeriveError::Decode(e.into()))?;
        let mut decoder = reader.into_decoder().map_err(DeriveError::Decode)?;

        let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
        let mut img = DynamicImage::from_decoder(decoder).map_err(DeriveError::Decode)?;

        if orientation != Orientation::NoTransforms {
            tracing::debug!(orientation = ?orientation, "Applying EXIF orientation");
            img.apply_orientation(orientation);
        }

        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(DeriveError::Empty);
        }

        Ok(img)
    }

    /// Center-cropped square of `size` x `size`, JPEG at `quality`.
    pub fn thumbnail(img: &DynamicImage, size: u32, quality: u8) -> Result<Vec<u8>, DeriveError> {
        let (width, height) = img.dimensions();
        let (x, y, side) = center_square(width, height);

        let square = if side == width && side == height {
            img.clone()
        } else {
            img.crop_imm(x, y, side, side)
        };
        let resized = square.resize_exact(size, size, RESAMPLE_FILTER);

        Self::encode_jpeg(&resized, quality)
    }

    /// Aspect-preserving fit within `max_edge`, JPEG at `quality`. No cropping.
    pub fn preview(img: &DynamicImage, max_edge: u32, quality: u8) -> Result<Vec<u8>, DeriveError> {
        let (width, height) = img.dimensions();
        let (target_width, target_height) = fit_within(width, height, max_edge);

        if (target_width, target_height) == (width, height) {
            return Self::encode_jpeg(img, quality);
        }

        let resized = img.resize_exact(target_width, target_height, RESAMPLE_FILTER);
        Self::encode_jpeg(&resized, quality)
    }

    /// JPEG has no alpha channel, so everything is flattened to RGB first.
    pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, DeriveError> {
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();

        let mut buffer = Vec::with_capacity(width as usize * height as usize / 4);
        let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
        rgb.write_with_encoder(encoder).map_err(DeriveError::Encode)?;

        Ok(buffer)
    }
}
