// THEORY:
// The `RectifiedImage` is the single input of the whole measurement engine. By the
// time a photo reaches this crate, an external perspective-correction step has
// already warped it so that the reference sheet fills the raster edge to edge.
// That means every pixel maps linearly to a fixed patch of paper, and the only
// extra knowledge we need is the physical size of that sheet.
//
// Key architectural principles:
// 1.  **Immutable Input**: The image is owned by the caller and never mutated. Every
//     later stage derives new values (masks, samples) from it.
// 2.  **Paired Geometry**: Pixel dimensions and physical dimensions travel together,
//     so calibration can never be computed against the wrong sheet.
// 3.  **Single-Channel View**: Segmentation only cares about brightness. The
//     `intensity` accessor folds RGB into one luma byte using the Rec. 601
//     weights, the same definition the rest of the engine has always used for
//     "how bright is this pixel".

use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The reference sheet the foot was photographed on, with dimensions in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SheetSize {
    /// A4: 210 × 297 mm
    #[default]
    A4,
    /// US Letter: 215.9 × 279.4 mm (8.5 × 11 inches)
    Letter,
    /// A3: 297 × 420 mm
    A3,
    /// Any other sheet, measured by hand.
    Custom { width_mm: f64, height_mm: f64 },
}

impl SheetSize {
    /// Returns (width, height) in millimetres.
    pub fn dimensions_mm(&self) -> (f64, f64) {
        match self {
            SheetSize::A4 => (210.0, 297.0),
            SheetSize::Letter => (215.9, 279.4),
            SheetSize::A3 => (297.0, 420.0),
            SheetSize::Custom { width_mm, height_mm } => (*width_mm, *height_mm),
        }
    }
}

impl fmt::Display for SheetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetSize::A4 => write!(f, "A4 (210×297mm)"),
            SheetSize::Letter => write!(f, "Letter (8.5×11in)"),
            SheetSize::A3 => write!(f, "A3 (297×420mm)"),
            SheetSize::Custom { width_mm, height_mm } => {
                write!(f, "Custom ({width_mm}×{height_mm}mm)")
            }
        }
    }
}

/// A top-down raster of the reference sheet, already perspective-corrected.
#[derive(Debug, Clone)]
pub struct RectifiedImage {
    /// The RGB pixel data.
    pixels: RgbImage,
    /// The sheet the raster spans from edge to edge.
    sheet: SheetSize,
}

impl RectifiedImage {
    pub fn new(pixels: RgbImage, sheet: SheetSize) -> Self {
        Self { pixels, sheet }
    }

    /// Accepts any decoded image; non-RGB formats are converted to 8-bit RGB.
    pub fn from_dynamic(image: DynamicImage, sheet: SheetSize) -> Self {
        Self::new(image.to_rgb8(), sheet)
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn sheet(&self) -> SheetSize {
        self.sheet
    }

    /// Physical (width, height) of the raster in millimetres.
    pub fn physical_dimensions_mm(&self) -> (f64, f64) {
        self.sheet.dimensions_mm()
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    /// Rec. 601 luma of the pixel at (x, y), rounded to a byte.
    pub fn intensity(&self, x: u32, y: u32) -> u8 {
        let [r, g, b] = self.pixels.get_pixel(x, y).0;
        let luma = 0.299_f64 * r as f64 + 0.587_f64 * g as f64 + 0.114_f64 * b as f64;
        luma.round().clamp(0.0, 255.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn sheet_dimensions() {
        assert_eq!(SheetSize::A4.dimensions_mm(), (210.0, 297.0));
        assert_eq!(SheetSize::A3.dimensions_mm(), (297.0, 420.0));
        let custom = SheetSize::Custom { width_mm: 100.0, height_mm: 150.0 };
        assert_eq!(custom.dimensions_mm(), (100.0, 150.0));
    }

    #[test]
    fn intensity_uses_rec601_weights() {
        let mut pixels = RgbImage::from_pixel(2, 1, Rgb([255, 255, 255]));
        pixels.put_pixel(1, 0, Rgb([100, 0, 0]));
        let image = RectifiedImage::new(pixels, SheetSize::A4);

        assert_eq!(image.intensity(0, 0), 255);
        // 0.299 * 100 = 29.9
        assert_eq!(image.intensity(1, 0), 30);
    }

    #[test]
    fn sheet_size_deserializes_from_snake_case() {
        let sheet: SheetSize = serde_json::from_str("\"letter\"").unwrap();
        assert_eq!(sheet, SheetSize::Letter);
    }
}
