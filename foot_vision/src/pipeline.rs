// THEORY:
// The `pipeline` module is the top-level API of the measurement engine. It wires
// the core stages together in their one valid order:
//
//     Calibration -> SilhouetteExtractor -> HeelCorrector -> WidthProfiler -> summary
//
// Each stage takes the previous stage's output by reference and returns a new
// value. No stage reaches back, and nothing is accumulated on the side. The run
// either finishes and yields a `MeasurementReport`, or fails fast with a
// `MeasureError`.
//
// The report carries more than the bare `MeasurementResult`. It also holds the
// masks before and after heel correction, and the heel outcome, so that
// visualizers and debugging tools can show why the numbers are what they are.

use crate::core_modules::binary_mask::BinaryMask;
use crate::core_modules::calibration::ConversionFactors;
use crate::core_modules::heel_corrector::{self, DEFAULT_HEEL_START_FRACTION, HeelCorrection};
use crate::core_modules::rectified_image::{RectifiedImage, SheetSize};
use crate::core_modules::silhouette::{self, DEFAULT_INTENSITY_THRESHOLD, DEFAULT_KERNEL_SIZE};
use crate::core_modules::width_profiler::{DEFAULT_MEASUREMENT_INTERVAL_MM, WidthProfile};
use crate::error::{MeasureError, Result};
use crate::record::MeasurementRecord;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

// Re-export key data structures for the public API.
pub use crate::core_modules::heel_corrector::HeelEllipse;
pub use crate::core_modules::summary::{MaxWidth, MeasurementResult, Notice};
pub use crate::core_modules::width_profiler::WidthSample;

/// Configuration for the FootPipeline, allowing for tunable behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementConfig {
    /// Pixels at or below this intensity are treated as foot.
    pub intensity_threshold: u8,
    /// Side of the square structuring element used for closing and opening.
    pub kernel_size: u32,
    /// Where the heel begins, as a fraction of foot length from the toe.
    pub heel_start_fraction: f64,
    /// Physical spacing between width samples.
    pub measurement_interval_mm: f64,
    /// The reference sheet the rectified image spans.
    pub sheet: SheetSize,
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            intensity_threshold: DEFAULT_INTENSITY_THRESHOLD,
            kernel_size: DEFAULT_KERNEL_SIZE,
            heel_start_fraction: DEFAULT_HEEL_START_FRACTION,
            measurement_interval_mm: DEFAULT_MEASUREMENT_INTERVAL_MM,
            sheet: SheetSize::A4,
        }
    }
}

impl MeasurementConfig {
    pub fn validate(&self) -> Result<()> {
        if self.kernel_size == 0 {
            return Err(MeasureError::InvalidInput(
                "kernel_size must be greater than 0".to_string(),
            ));
        }
        if !self.measurement_interval_mm.is_finite() || self.measurement_interval_mm <= 0.0 {
            return Err(MeasureError::InvalidInput(format!(
                "measurement_interval_mm must be positive, got {}",
                self.measurement_interval_mm
            )));
        }
        if !(0.0..=1.0).contains(&self.heel_start_fraction) {
            return Err(MeasureError::InvalidInput(format!(
                "heel_start_fraction must be within [0, 1], got {}",
                self.heel_start_fraction
            )));
        }
        Ok(())
    }
}

/// Everything one run produced: the result plus its diagnostics.
#[derive(Debug, Clone)]
pub struct MeasurementReport {
    pub result: MeasurementResult,
    pub factors: ConversionFactors,
    /// The cleaned silhouette before heel correction.
    pub raw_mask: BinaryMask,
    /// The silhouette the width profile was sampled from.
    pub corrected_mask: BinaryMask,
    pub heel_correction: HeelCorrection,
    /// Distance of the heel line from the (post-correction) toe.
    pub heel_start_mm: f64,
}

impl MeasurementReport {
    pub fn to_record(&self) -> MeasurementRecord {
        MeasurementRecord::from(&self.result)
    }
}

/// The main, top-level struct for the measurement engine.
#[derive(Debug, Clone, Default)]
pub struct FootPipeline {
    config: MeasurementConfig,
}

impl FootPipeline {
    pub fn new(config: MeasurementConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MeasurementConfig {
        &self.config
    }

    /// Measures a rectified image against the sheet it carries.
    pub fn measure(&self, image: &RectifiedImage) -> Result<MeasurementReport> {
        let config = &self.config;

        // Stage 1: Calibration
        let factors = ConversionFactors::for_image(image)?;
        debug!(
            mm_per_pixel_x = factors.mm_per_pixel_x,
            mm_per_pixel_y = factors.mm_per_pixel_y,
            sheet = %image.sheet(),
            "calibration derived"
        );

        // Stage 2: Silhouette extraction
        let raw_mask = silhouette::extract_silhouette(image, config.intensity_threshold, config.kernel_size)?;

        // Stage 3: Heel correction
        let corrected = heel_corrector::correct_heel(&raw_mask, config.heel_start_fraction)?;

        // Stage 4: Width profile on the corrected mask
        let profile = WidthProfile::new(&corrected.mask, factors, config.measurement_interval_mm)?;
        let samples: Vec<WidthSample> = profile.samples().collect();
        let heel_start_y = corrected.correction.heel_start_y();
        let heel_start_mm = factors.y_to_mm(heel_start_y.saturating_sub(profile.top_y()) as f64);
        let foot_length_mm = profile.foot_length_mm();

        // Stage 5: Summary
        let result = MeasurementResult::summarize(
            foot_length_mm,
            samples,
            config.measurement_interval_mm,
            corrected.correction.is_applied(),
        );

        if result.is_empty_profile() {
            warn!(foot_length_mm, "width profile is empty, max and mean width are undefined");
        }
        info!(
            foot_length_mm,
            max_width_mm = result.max_width.map(|m| m.width_mm),
            mean_width_mm = result.mean_width_mm,
            samples = result.samples.len(),
            heel_correction_applied = result.heel_correction_applied,
            "foot measured"
        );

        Ok(MeasurementReport {
            result,
            factors,
            raw_mask,
            corrected_mask: corrected.mask,
            heel_correction: corrected.correction,
            heel_start_mm,
        })
    }

    /// Measures a bare raster, assuming it spans the configured sheet.
    pub fn measure_raster(&self, pixels: RgbImage) -> Result<MeasurementReport> {
        self.measure(&RectifiedImage::new(pixels, self.config.sheet))
    }
}

/// Measures with the default configuration.
pub fn measure_foot(image: &RectifiedImage) -> Result<MeasurementReport> {
    FootPipeline::default().measure(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_reference_constants() {
        let config = MeasurementConfig::default();
        assert_eq!(config.intensity_threshold, 150);
        assert_eq!(config.kernel_size, 5);
        assert_eq!(config.heel_start_fraction, 0.82);
        assert_eq!(config.measurement_interval_mm, 5.0);
        assert_eq!(config.sheet, SheetSize::A4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let bad = [
            MeasurementConfig { kernel_size: 0, ..Default::default() },
            MeasurementConfig { measurement_interval_mm: 0.0, ..Default::default() },
            MeasurementConfig { measurement_interval_mm: f64::INFINITY, ..Default::default() },
            MeasurementConfig { heel_start_fraction: 1.5, ..Default::default() },
        ];
        for config in bad {
            assert!(matches!(FootPipeline::new(config), Err(MeasureError::InvalidInput(_))));
        }
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let config: MeasurementConfig =
            serde_json::from_str(r#"{ "intensity_threshold": 120, "sheet": "letter" }"#).unwrap();
        assert_eq!(config.intensity_threshold, 120);
        assert_eq!(config.sheet, SheetSize::Letter);
        assert_eq!(config.kernel_size, 5);
    }
}
