// THEORY:
// The `WidthProfiler` turns the corrected silhouette into a width profile: the
// foot's left edge, right edge, centre and width sampled at fixed physical steps
// from the toe towards the heel.
//
// Key architectural principles:
// 1.  **Physical Spacing**: Steps are defined in millimetres, not rows. Sample `i`
//     sits at `i * interval_mm` from the toe, and the row to scan is found by
//     converting that distance back to pixels with the vertical factor. The
//     profile therefore means the same thing at any image resolution.
// 2.  **Fresh Extents**: The vertical extent is recomputed from the corrected
//     mask. Clipping the heel can shorten the foot slightly, and the profile has
//     to agree with the mask it actually reads.
// 3.  **Honest Gaps**: A row with no foreground produces no sample. Its index is
//     still consumed, so later samples keep their true distances. Nothing is
//     interpolated across the gap.
// 4.  **Lazy, Restartable Iteration**: `WidthProfile` only borrows the mask and
//     holds the scan parameters. Each call to `samples()` returns a new
//     iterator starting at the toe, so nothing mutable is shared between passes.

use crate::core_modules::binary_mask::BinaryMask;
use crate::core_modules::calibration::ConversionFactors;
use crate::error::{MeasureError, Result};

pub const DEFAULT_MEASUREMENT_INTERVAL_MM: f64 = 5.0;

/// Width of the foot on a single sampled row, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidthSample {
    /// Distance from the toe (the topmost foreground row).
    pub distance_from_toe_mm: f64,
    pub left_edge_mm: f64,
    pub right_edge_mm: f64,
    pub center_mm: f64,
    pub width_mm: f64,
    /// The pixel row that was scanned.
    pub row: u32,
}

/// Sampling plan over a corrected mask.
#[derive(Debug, Clone, Copy)]
pub struct WidthProfile<'a> {
    mask: &'a BinaryMask,
    factors: ConversionFactors,
    interval_mm: f64,
    top_y: u32,
    bottom_y: u32,
}

impl<'a> WidthProfile<'a> {
    pub fn new(mask: &'a BinaryMask, factors: ConversionFactors, interval_mm: f64) -> Result<Self> {
        if !interval_mm.is_finite() || interval_mm <= 0.0 {
            return Err(MeasureError::InvalidInput(format!(
                "measurement interval must be positive, got {interval_mm}"
            )));
        }
        let (top_y, bottom_y) = mask.vertical_extent().ok_or(MeasureError::NoFootDetected)?;
        Ok(Self { mask, factors, interval_mm, top_y, bottom_y })
    }

    pub fn top_y(&self) -> u32 {
        self.top_y
    }

    pub fn bottom_y(&self) -> u32 {
        self.bottom_y
    }

    pub fn interval_mm(&self) -> f64 {
        self.interval_mm
    }

    pub fn foot_length_pixels(&self) -> u32 {
        self.bottom_y - self.top_y
    }

    pub fn foot_length_mm(&self) -> f64 {
        self.factors.y_to_mm(self.foot_length_pixels() as f64)
    }

    /// A new iterator over the samples, starting at the toe.
    pub fn samples(&self) -> WidthSamples<'a> {
        WidthSamples { profile: *self, index: 0, finished: false }
    }
}

impl<'a> IntoIterator for &WidthProfile<'a> {
    type Item = WidthSample;
    type IntoIter = WidthSamples<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples()
    }
}

/// Iterator over the recorded samples of a `WidthProfile`.
#[derive(Debug, Clone)]
pub struct WidthSamples<'a> {
    profile: WidthProfile<'a>,
    index: u64,
    finished: bool,
}

impl Iterator for WidthSamples<'_> {
    type Item = WidthSample;

    fn next(&mut self) -> Option<WidthSample> {
        let profile = &self.profile;
        while !self.finished {
            let distance_mm = self.index as f64 * profile.interval_mm;
            let offset = profile.factors.mm_to_y(distance_mm).round();
            let row = profile.top_y as f64 + offset;
            if row >= profile.bottom_y as f64 {
                self.finished = true;
                break;
            }
            self.index += 1;

            let row = row as u32;
            let Some((left_x, right_x)) = profile.mask.row_extent(row) else {
                continue;
            };
            let factors = &profile.factors;
            return Some(WidthSample {
                distance_from_toe_mm: distance_mm,
                left_edge_mm: factors.x_to_mm(left_x as f64),
                right_edge_mm: factors.x_to_mm(right_x as f64),
                center_mm: factors.x_to_mm((left_x + right_x) as f64 / 2.0),
                width_mm: factors.x_to_mm((right_x - left_x) as f64),
                row,
            });
        }
        None
    }
}

impl std::iter::FusedIterator for WidthSamples<'_> {}
