use image::imageops::FilterType;

/// Resampling filter for every derived asset.
pub const RESAMPLE_FILTER: FilterType = FilterType::Lanczos3;

/// Largest centered square inside a `width` x `height` image, as `(x, y, side)`.
///
/// Wide images lose equal columns on the left and right, tall images equal rows at the
/// top and bottom. Square images are returned whole.
pub fn center_square(width: u32, height: u32) -> (u32, u32, u32) {
    let side = width.min(height);
    ((width - side) / 2, (height - side) / 2, side)
}

/// Dimensions that fit inside a `max_edge` square while preserving aspect ratio.
///
/// Images already within bounds keep their size; nothing is upscaled.
pub fn fit_within(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    if width <= max_edge && height <= max_edge {
        return (width, height);
    }

    if width >= height {
        let h = (height as f64 * max_edge as f64 / width as f64).round() as u32;
        (max_edge, h.max(1))
    } else {
        let w = (width as f64 * max_edge as f64 / height as f64).round() as u32;
        (w.max(1), max_edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_square_wide() {
        assert_eq!(center_square(1600, 900), (350, 0, 900));
    }

    #[test]
    fn test_center_square_tall() {
        assert_eq!(center_square(900, 1600), (0, 350, 900));
    }

    #[test]
    fn test_center_square_square() {
        assert_eq!(center_square(500, 500), (0, 0, 500));
    }

    #[test]
    fn test_center_square_odd_difference() {
        // One leftover column goes to the right edge.
        assert_eq!(center_square(101, 100), (0, 0, 100));
        assert_eq!(center_square(103, 100), (1, 0, 100));
    }

    #[test]
    fn test_fit_within_landscape() {
        assert_eq!(fit_within(3000, 2000, 1024), (1024, 683));
        assert_eq!(fit_within(2048, 1024, 1024), (1024, 512));
    }

    #[test]
    fn test_fit_within_portrait() {
        assert_eq!(fit_within(2000, 3000, 1024), (683, 1024));
    }

    #[test]
    fn test_fit_within_small_image_unchanged() {
        assert_eq!(fit_within(800, 600, 1024), (800, 600));
        assert_eq!(fit_within(1024, 1024, 1024), (1024, 1024));
    }

    #[test]
    fn test_fit_within_extreme_aspect() {
        assert_eq!(fit_within(10_000, 2, 1024), (1024, 1));
    }
}
