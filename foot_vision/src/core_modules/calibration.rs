// THEORY:
// Calibration turns pixels into millimetres. Because the input raster is already
// rectified, the mapping is a pure per-axis scale: the sheet's physical width is
// spread across the raster's pixel width, and likewise for height. The two axes
// are kept separate since a rectified raster need not have square pixels.
//
// The factors are derived once per run and never change afterwards, so every
// later stage converts with the exact same numbers.

use crate::core_modules::rectified_image::RectifiedImage;
use crate::error::{MeasureError, Result};

/// Millimetres covered by one pixel along each axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionFactors {
    pub mm_per_pixel_x: f64,
    pub mm_per_pixel_y: f64,
}

impl ConversionFactors {
    /// Derives the factors from raster and sheet dimensions.
    ///
    /// Fails with `InvalidInput` when a pixel dimension is zero or a physical
    /// dimension is not a positive, finite number.
    pub fn from_dimensions(
        pixel_width: u32,
        pixel_height: u32,
        physical_width_mm: f64,
        physical_height_mm: f64,
    ) -> Result<Self> {
        if pixel_width == 0 || pixel_height == 0 {
            return Err(MeasureError::InvalidInput(format!(
                "image dimensions must be non-zero, got {pixel_width}x{pixel_height}"
            )));
        }
        for (axis, value) in [("width", physical_width_mm), ("height", physical_height_mm)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(MeasureError::InvalidInput(format!(
                    "physical sheet {axis} must be positive, got {value}"
                )));
            }
        }

        Ok(Self {
            mm_per_pixel_x: physical_width_mm / pixel_width as f64,
            mm_per_pixel_y: physical_height_mm / pixel_height as f64,
        })
    }

    /// Derives the factors for a rectified image and the sheet it spans.
    pub fn for_image(image: &RectifiedImage) -> Result<Self> {
        let (width_mm, height_mm) = image.physical_dimensions_mm();
        Self::from_dimensions(image.width(), image.height(), width_mm, height_mm)
    }

    pub fn x_to_mm(&self, pixels: f64) -> f64 {
        pixels * self.mm_per_pixel_x
    }

    pub fn y_to_mm(&self, pixels: f64) -> f64 {
        pixels * self.mm_per_pixel_y
    }

    pub fn mm_to_x(&self, mm: f64) -> f64 {
        mm / self.mm_per_pixel_x
    }

    pub fn mm_to_y(&self, mm: f64) -> f64 {
        mm / self.mm_per_pixel_y
    }
}
