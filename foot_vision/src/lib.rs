// THEORY:
// This file is the main entry point for the `foot_vision` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the public
// API that will be exposed to external consumers (like the `foot_tester` CLI).
//
// The primary goal is to export the `FootPipeline` and its associated data
// structures (`MeasurementConfig`, `MeasurementReport`, `MeasurementRecord`) as the
// high-level interface for turning a rectified photo into foot measurements. The
// individual stages live in `core_modules` and stay public so they can be tested
// and reused one at a time, but most callers only need the pipeline.

pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;
pub mod record;

pub use core_modules::binary_mask::BinaryMask;
pub use core_modules::rectified_image::{RectifiedImage, SheetSize};
pub use error::{MeasureError, Result};
pub use pipeline::{FootPipeline, MeasurementConfig, MeasurementReport, measure_foot};
pub use record::MeasurementRecord;
