pub mod binary_mask;
pub mod calibration;
pub mod heel_corrector;
pub mod rectified_image;
pub mod silhouette;
pub mod sizing;
pub mod summary;
pub mod width_profiler;
