// THEORY:
// The `HeelCorrector` repairs a known weakness of plain thresholding. Around the
// heel the foot casts a soft shadow onto the sheet and the threshold tends to
// swallow it, so the heel comes out squared off like the end of a box instead of
// round. Left alone, that inflates the width samples near the back of the foot.
//
// The correction works in three steps:
// 1.  **Heel Line**: Find the foot's vertical extent and place a horizontal line a
//     fixed fraction (82%) of the way from the toe to the heel. Empirically, this
//     is where the heel's rounded region begins.
// 2.  **Ellipse Fit**: Read the foot's left and right edge on that line. An ellipse
//     is centred on the line between those edges, with the measured half-width
//     as its horizontal semi-axis and the distance to the bottom of the image as
//     its vertical semi-axis.
// 3.  **Clip**: Every foreground pixel at or below the heel line that falls outside
//     the ellipse is turned into background. Nothing above the line is touched.
//
// When the heel line crosses no foreground (a broken silhouette), there is no
// width to fit to. The correction is skipped, the input mask is passed through,
// and the outcome is recorded as `HeelCorrection::Skipped` so callers can see it.

use crate::core_modules::binary_mask::BinaryMask;
use crate::error::{MeasureError, Result};
use tracing::{debug, warn};

/// Fraction of the foot length, measured from the toe, where the heel begins.
pub const DEFAULT_HEEL_START_FRACTION: f64 = 0.82;

/// Axis-aligned ellipse in pixel coordinates bounding the heel region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeelEllipse {
    pub center_x: f64,
    pub center_y: f64,
    /// Horizontal semi-axis in pixels.
    pub semi_width: f64,
    /// Vertical semi-axis in pixels.
    pub semi_height: f64,
}

impl HeelEllipse {
    /// Normalized-distance containment test:
    /// `((x - cx) / sw)^2 + ((y - cy) / sh)^2 <= 1`.
    ///
    /// A zero semi-axis collapses that axis to the centre line: only points
    /// exactly on it pass.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        normalized_sq(x - self.center_x, self.semi_width)
            + normalized_sq(y - self.center_y, self.semi_height)
            <= 1.0
    }
}

fn normalized_sq(delta: f64, semi_axis: f64) -> f64 {
    if semi_axis > 0.0 {
        (delta / semi_axis).powi(2)
    } else if delta == 0.0 {
        0.0
    } else {
        f64::INFINITY
    }
}

/// What the corrector did with the mask.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeelCorrection {
    /// The heel region was clipped to `ellipse`.
    Applied { heel_start_y: u32, ellipse: HeelEllipse },
    /// No foreground on the heel line; the mask was passed through unchanged.
    Skipped { heel_start_y: u32 },
}

impl HeelCorrection {
    pub fn is_applied(&self) -> bool {
        matches!(self, HeelCorrection::Applied { .. })
    }

    pub fn heel_start_y(&self) -> u32 {
        match *self {
            HeelCorrection::Applied { heel_start_y, .. } => heel_start_y,
            HeelCorrection::Skipped { heel_start_y } => heel_start_y,
        }
    }
}

/// The corrected mask together with the outcome that produced it.
#[derive(Debug, Clone)]
pub struct HeelCorrected {
    pub mask: BinaryMask,
    pub correction: HeelCorrection,
}

/// Row where the heel region begins: `top + round(fraction * (bottom - top))`.
pub fn heel_start_row(top_y: u32, bottom_y: u32, fraction: f64) -> u32 {
    let length = (bottom_y - top_y) as f64;
    top_y + (fraction * length).round() as u32
}

/// Fits the heel ellipse to the foreground on `heel_start_y`, or `None` if the
/// row is empty.
pub fn fit_heel_ellipse(mask: &BinaryMask, heel_start_y: u32) -> Option<HeelEllipse> {
    let (left_x, right_x) = mask.row_extent(heel_start_y)?;
    Some(HeelEllipse {
        center_x: (left_x + right_x) as f64 / 2.0,
        center_y: heel_start_y as f64,
        semi_width: (right_x - left_x) as f64 / 2.0,
        semi_height: (mask.height() - 1 - heel_start_y) as f64,
    })
}

/// Returns a copy of `mask` with every foreground pixel at or below
/// `heel_start_y` that lies outside `ellipse` cleared.
pub fn clip_to_ellipse(mask: &BinaryMask, ellipse: &HeelEllipse, heel_start_y: u32) -> BinaryMask {
    let mut clipped = mask.clone();
    for y in heel_start_y..mask.height() {
        for x in 0..mask.width() {
            if mask.get(x, y) && !ellipse.contains(x as f64, y as f64) {
                clipped.set(x, y, false);
            }
        }
    }
    clipped
}

/// Runs the full heel correction on a cleaned silhouette.
pub fn correct_heel(mask: &BinaryMask, heel_start_fraction: f64) -> Result<HeelCorrected> {
    let (top_y, bottom_y) = mask.vertical_extent().ok_or(MeasureError::NoFootDetected)?;
    let heel_start_y = heel_start_row(top_y, bottom_y, heel_start_fraction);

    let Some(ellipse) = fit_heel_ellipse(mask, heel_start_y) else {
        warn!(heel_start_y, "no foreground on heel line, skipping ellipse correction");
        return Ok(HeelCorrected {
            mask: mask.clone(),
            correction: HeelCorrection::Skipped { heel_start_y },
        });
    };

    let corrected = clip_to_ellipse(mask, &ellipse, heel_start_y);
    debug!(
        heel_start_y,
        center_x = ellipse.center_x,
        semi_width = ellipse.semi_width,
        semi_height = ellipse.semi_height,
        removed = mask.count_foreground() - corrected.count_foreground(),
        "heel ellipse correction applied"
    );

    Ok(HeelCorrected {
        mask: corrected,
        correction: HeelCorrection::Applied { heel_start_y, ellipse },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heel_line_sits_at_82_percent() {
        assert_eq!(heel_start_row(50, 290, 0.82), 247);
        assert_eq!(heel_start_row(0, 100, 0.82), 82);
        assert_eq!(heel_start_row(7, 7, 0.82), 7);
    }

    #[test]
    fn ellipse_containment() {
        let ellipse = HeelEllipse { center_x: 10.0, center_y: 0.0, semi_width: 4.0, semi_height: 8.0 };
        assert!(ellipse.contains(10.0, 0.0));
        assert!(ellipse.contains(14.0, 0.0));
        assert!(ellipse.contains(10.0, 8.0));
        assert!(!ellipse.contains(14.0, 1.0));
        assert!(!ellipse.contains(10.0, 8.5));
    }

    #[test]
    fn zero_semi_width_keeps_only_the_centre_column() {
        let ellipse = HeelEllipse { center_x: 5.0, center_y: 0.0, semi_width: 0.0, semi_height: 10.0 };
        assert!(ellipse.contains(5.0, 9.0));
        assert!(!ellipse.contains(6.0, 0.0));
    }

    #[test]
    fn heel_already_inside_the_ellipse_is_unchanged() {
        // top = 1, bottom = 100, heel line = 1 + round(0.82 * 99) = 82
        let ellipse = HeelEllipse { center_x: 50.0, center_y: 82.0, semi_width: 20.0, semi_height: 18.0 };
        let mask = BinaryMask::from_fn(101, 101, |x, y| {
            if y == 0 {
                false
            } else if y < 82 {
                (30..=70).contains(&x)
            } else {
                ellipse.contains(x as f64, y as f64)
            }
        });

        let corrected = correct_heel(&mask, DEFAULT_HEEL_START_FRACTION).unwrap();
        assert_eq!(corrected.correction, HeelCorrection::Applied { heel_start_y: 82, ellipse });
        assert_eq!(corrected.mask, mask);
    }

    #[test]
    fn rows_above_heel_line_are_never_modified() {
        // Checkerboard above the heel line, a box below it.
        let mask = BinaryMask::from_fn(60, 100, |x, y| {
            if y < 10 {
                false
            } else if y < 70 {
                (x + y) % 2 == 0 && (10..50).contains(&x)
            } else {
                (5..55).contains(&x)
            }
        });

        let corrected = correct_heel(&mask, DEFAULT_HEEL_START_FRACTION).unwrap();
        let heel_start_y = corrected.correction.heel_start_y();
        assert_eq!(heel_start_y, 10 + (0.82_f64 * 89.0).round() as u32);
        assert!(corrected.correction.is_applied());
        for y in 0..heel_start_y {
            assert_eq!(corrected.mask.row(y), mask.row(y), "row {y} changed");
        }
        // The squared-off bottom corners were cut.
        assert!(!corrected.mask.get(5, 99));
        assert!(!corrected.mask.get(54, 99));
    }

    #[test]
    fn full_width_heel_line_rounds_the_corners() {
        let mask = BinaryMask::from_fn(41, 50, |_, y| y >= 10);
        let corrected = correct_heel(&mask, DEFAULT_HEEL_START_FRACTION).unwrap();
        let heel_start_y = corrected.correction.heel_start_y();

        assert_eq!(corrected.mask.row_extent(heel_start_y), Some((0, 40)));
        let mut previous_width = 40;
        for y in heel_start_y + 1..50 {
            let (left, right) = corrected.mask.row_extent(y).unwrap();
            assert!(right - left <= previous_width);
            previous_width = right - left;
        }
        assert!(!corrected.mask.get(0, 49));
        assert!(!corrected.mask.get(40, 49));
        assert!(corrected.mask.get(20, 49));
    }

    #[test]
    fn single_column_heel_line_is_a_no_op() {
        let mask = BinaryMask::from_fn(11, 30, |x, y| x == 5 && y >= 3);
        let corrected = correct_heel(&mask, DEFAULT_HEEL_START_FRACTION).unwrap();
        assert!(corrected.correction.is_applied());
        assert_eq!(corrected.mask, mask);
    }

    #[test]
    fn empty_heel_line_skips_correction() {
        // Two disconnected blocks; the heel line (row 81) falls in the gap.
        let mask = BinaryMask::from_fn(30, 100, |x, y| (5..25).contains(&x) && (y <= 10 || y >= 90));
        let corrected = correct_heel(&mask, DEFAULT_HEEL_START_FRACTION).unwrap();
        assert_eq!(corrected.correction, HeelCorrection::Skipped { heel_start_y: 81 });
        assert_eq!(corrected.mask, mask);
    }

    #[test]
    fn empty_mask_reports_no_foot() {
        let mask = BinaryMask::new_filled(10, 10, false);
        assert_eq!(
            correct_heel(&mask, DEFAULT_HEEL_START_FRACTION).unwrap_err(),
            MeasureError::NoFootDetected
        );
    }
}
