// THEORY:
// The `summary` module is the last stage of the core. It folds the ordered width
// profile into the handful of scalars the size lookup needs: foot length,
// maximum width and where it occurs, and mean width.
//
// It is pure aggregation. The samples are read, never reordered or edited. The
// two conditions the pipeline recovers from are carried on the result as
// `Notice`s rather than hidden:
//   - `HeelFitUnavailable`: the heel line had no foreground and the mask was used
//     uncorrected.
//   - `EmptyProfile`: no row was sampled, so max and mean width are undefined.
//     They are `None` here; the flat record writes them as zero.

use crate::core_modules::width_profiler::WidthSample;

/// The widest sample of a profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaxWidth {
    pub width_mm: f64,
    pub distance_from_toe_mm: f64,
}

/// A recoverable condition met during the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    HeelFitUnavailable,
    EmptyProfile,
}

/// Widest sample, ties resolved to the one closest to the toe.
pub fn max_width(samples: &[WidthSample]) -> Option<MaxWidth> {
    samples
        .iter()
        .fold(None::<&WidthSample>, |best, sample| match best {
            Some(b) if b.width_mm >= sample.width_mm => Some(b),
            _ => Some(sample),
        })
        .map(|s| MaxWidth { width_mm: s.width_mm, distance_from_toe_mm: s.distance_from_toe_mm })
}

/// Arithmetic mean of all sample widths, `None` for an empty profile.
pub fn mean_width(samples: &[WidthSample]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    Some(samples.iter().map(|s| s.width_mm).sum::<f64>() / samples.len() as f64)
}

/// Terminal output of the measurement core.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementResult {
    pub foot_length_mm: f64,
    /// Ordered by increasing distance from the toe.
    pub samples: Vec<WidthSample>,
    pub max_width: Option<MaxWidth>,
    pub mean_width_mm: Option<f64>,
    pub measurement_interval_mm: f64,
    pub heel_correction_applied: bool,
    pub notices: Vec<Notice>,
}

impl MeasurementResult {
    pub fn summarize(
        foot_length_mm: f64,
        samples: Vec<WidthSample>,
        measurement_interval_mm: f64,
        heel_correction_applied: bool,
    ) -> Self {
        let mut notices = Vec::new();
        if !heel_correction_applied {
            notices.push(Notice::HeelFitUnavailable);
        }
        if samples.is_empty() {
            notices.push(Notice::EmptyProfile);
        }

        Self {
            foot_length_mm,
            max_width: max_width(&samples),
            mean_width_mm: mean_width(&samples),
            samples,
            measurement_interval_mm,
            heel_correction_applied,
            notices,
        }
    }

    pub fn is_empty_profile(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn has_notice(&self, notice: Notice) -> bool {
        self.notices.contains(&notice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(distance: f64, width: f64) -> WidthSample {
        WidthSample {
            distance_from_toe_mm: distance,
            left_edge_mm: 50.0,
            right_edge_mm: 50.0 + width,
            center_mm: 50.0 + width / 2.0,
            width_mm: width,
            row: (distance * 2.0) as u32,
        }
    }

    #[test]
    fn max_and_mean() {
        let samples = vec![sample(0.0, 40.0), sample(5.0, 95.0), sample(10.0, 80.0), sample(15.0, 65.0)];
        assert_eq!(
            max_width(&samples),
            Some(MaxWidth { width_mm: 95.0, distance_from_toe_mm: 5.0 })
        );
        assert_eq!(mean_width(&samples), Some(70.0));
    }

    #[test]
    fn max_width_ties_go_to_the_first_sample() {
        let samples = vec![sample(0.0, 30.0), sample(5.0, 90.0), sample(10.0, 90.0), sample(15.0, 90.0)];
        assert_eq!(max_width(&samples).unwrap().distance_from_toe_mm, 5.0);
    }

    #[test]
    fn empty_profile_is_flagged() {
        let result = MeasurementResult::summarize(0.0, Vec::new(), 5.0, true);
        assert!(result.is_empty_profile());
        assert_eq!(result.max_width, None);
        assert_eq!(result.mean_width_mm, None);
        assert_eq!(result.notices, vec![Notice::EmptyProfile]);
    }

    #[test]
    fn skipped_heel_correction_is_flagged() {
        let result = MeasurementResult::summarize(100.0, vec![sample(0.0, 40.0)], 5.0, false);
        assert!(!result.heel_correction_applied);
        assert!(result.has_notice(Notice::HeelFitUnavailable));
        assert!(!result.has_notice(Notice::EmptyProfile));
    }
}
