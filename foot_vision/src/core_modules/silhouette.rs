// THEORY:
// The `SilhouetteExtractor` is the first analytical stage. It decides, pixel by
// pixel, whether we are looking at the foot or at the white sheet under it.
//
// The sheet is bright and the foot (or sock) is darker, so the cut is inverted:
// a pixel is foreground when its intensity is at or below the threshold. The raw
// cut is then cleaned with two morphological passes using a square kernel:
//   - closing (dilate, then erode) first, to fill pin-holes and specular gaps
//     inside the foot;
//   - opening (erode, then dilate) second, to wipe out dust, shadows and other
//     small blobs on the sheet.
// Running the opening first would thin the toes away before the gaps between
// them had a chance to be filled.
//
// An empty mask after cleaning means there is nothing to measure. That is a hard
// stop for the run.

use crate::core_modules::binary_mask::{BinaryMask, morphology};
use crate::core_modules::rectified_image::RectifiedImage;
use crate::error::{MeasureError, Result};
use tracing::debug;

pub const DEFAULT_INTENSITY_THRESHOLD: u8 = 150;
pub const DEFAULT_KERNEL_SIZE: u32 = 5;

/// Inverse binary threshold: foreground where intensity is at or below `threshold`.
pub fn binarize(image: &RectifiedImage, threshold: u8) -> BinaryMask {
    BinaryMask::from_fn(image.width(), image.height(), |x, y| {
        image.intensity(x, y) <= threshold
    })
}

/// Closing followed by opening with a square kernel of side `kernel_size`.
pub fn clean(mask: &BinaryMask, kernel_size: u32) -> BinaryMask {
    let closed = morphology::close(mask, kernel_size);
    morphology::open(&closed, kernel_size)
}

/// Binarizes and cleans the image, failing with `NoFootDetected` when no
/// foreground survives.
pub fn extract_silhouette(
    image: &RectifiedImage,
    threshold: u8,
    kernel_size: u32,
) -> Result<BinaryMask> {
    if kernel_size == 0 {
        return Err(MeasureError::InvalidInput(
            "morphological kernel size must be greater than 0".to_string(),
        ));
    }

    let raw = binarize(image, threshold);
    let cleaned = clean(&raw, kernel_size);
    debug!(
        raw_foreground = raw.count_foreground(),
        cleaned_foreground = cleaned.count_foreground(),
        threshold,
        kernel_size,
        "silhouette extracted"
    );

    if cleaned.is_empty() {
        return Err(MeasureError::NoFootDetected);
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::rectified_image::SheetSize;
    use image::{Rgb, RgbImage};

    fn sheet_with_dark_rect(x0: u32, y0: u32, x1: u32, y1: u32) -> RectifiedImage {
        let mut pixels = RgbImage::from_pixel(60, 80, Rgb([240, 240, 240]));
        for y in y0..=y1 {
            for x in x0..=x1 {
                pixels.put_pixel(x, y, Rgb([60, 50, 45]));
            }
        }
        RectifiedImage::new(pixels, SheetSize::A4)
    }

    #[test]
    fn dark_pixels_become_foreground() {
        let image = sheet_with_dark_rect(10, 20, 30, 50);
        let mask = binarize(&image, DEFAULT_INTENSITY_THRESHOLD);
        assert!(mask.get(10, 20));
        assert!(mask.get(30, 50));
        assert!(!mask.get(9, 20));
        assert!(!mask.get(0, 0));
    }

    #[test]
    fn threshold_is_inclusive() {
        let pixels = RgbImage::from_pixel(3, 3, Rgb([150, 150, 150]));
        let image = RectifiedImage::new(pixels, SheetSize::A4);
        assert!(binarize(&image, 150).get(1, 1));
        assert!(!binarize(&image, 149).get(1, 1));
    }

    #[test]
    fn all_background_image_reports_no_foot() {
        let pixels = RgbImage::from_pixel(40, 40, Rgb([255, 255, 255]));
        let image = RectifiedImage::new(pixels, SheetSize::A4);
        let err = extract_silhouette(&image, DEFAULT_INTENSITY_THRESHOLD, DEFAULT_KERNEL_SIZE)
            .unwrap_err();
        assert_eq!(err, MeasureError::NoFootDetected);
    }

    #[test]
    fn speck_alone_is_cleaned_away() {
        let image = sheet_with_dark_rect(30, 30, 31, 31);
        let err = extract_silhouette(&image, DEFAULT_INTENSITY_THRESHOLD, DEFAULT_KERNEL_SIZE)
            .unwrap_err();
        assert_eq!(err, MeasureError::NoFootDetected);
    }

    #[test]
    fn noise_and_holes_are_cleaned() {
        let mut raw = sheet_with_dark_rect(10, 20, 40, 60).pixels().clone();
        raw.put_pixel(25, 40, Rgb([250, 250, 250]));
        raw.put_pixel(50, 70, Rgb([0, 0, 0]));
        let image = RectifiedImage::new(raw, SheetSize::A4);

        let mask = extract_silhouette(&image, DEFAULT_INTENSITY_THRESHOLD, DEFAULT_KERNEL_SIZE)
            .unwrap();
        assert!(mask.get(25, 40));
        assert!(!mask.get(50, 70));
        assert_eq!(mask.vertical_extent(), Some((20, 60)));
        assert_eq!(mask.row_extent(40), Some((10, 40)));
    }

    #[test]
    fn zero_kernel_is_invalid() {
        let image = sheet_with_dark_rect(10, 20, 40, 60);
        assert!(matches!(
            extract_silhouette(&image, 150, 0),
            Err(MeasureError::InvalidInput(_))
        ));
    }
}
