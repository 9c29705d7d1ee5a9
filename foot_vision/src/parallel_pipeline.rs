// THEORY:
// A single measurement is synchronous and CPU-bound. When a caller has a whole
// batch of photos (a clinic's day of scans, a regression corpus) the runs are
// fully independent: each one owns its image and allocates its own masks. That
// makes the batch embarrassingly parallel with no locking at all.
//
// `ParallelPipeline` fans the runs out onto tokio's blocking pool, keeping at
// most one run in flight per CPU core. Results come back in input order, and a
// failure only affects the image that caused it.

use crate::core_modules::rectified_image::RectifiedImage;
use crate::error::{MeasureError, Result};
use crate::pipeline::{FootPipeline, MeasurementConfig, MeasurementReport};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::debug;

pub struct ParallelPipeline {
    pipeline: Arc<FootPipeline>,
    max_in_flight: usize,
}

impl ParallelPipeline {
    pub fn new(config: MeasurementConfig) -> Result<Self> {
        Ok(Self::with_pipeline(FootPipeline::new(config)?))
    }

    pub fn with_pipeline(pipeline: FootPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            max_in_flight: num_cpus::get().max(1),
        }
    }

    /// Caps the number of concurrent runs; values below 1 are raised to 1.
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    /// Measures one image on the blocking pool.
    pub async fn measure(&self, image: RectifiedImage) -> Result<MeasurementReport> {
        run_blocking(Arc::clone(&self.pipeline), image).await
    }

    /// Measures every image, returning one result per input in input order.
    pub async fn measure_all(&self, images: Vec<RectifiedImage>) -> Vec<Result<MeasurementReport>> {
        debug!(images = images.len(), max_in_flight = self.max_in_flight, "batch measurement started");
        stream::iter(images)
            .map(|image| run_blocking(Arc::clone(&self.pipeline), image))
            .buffered(self.max_in_flight)
            .collect()
            .await
    }
}

async fn run_blocking(pipeline: Arc<FootPipeline>, image: RectifiedImage) -> Result<MeasurementReport> {
    tokio::task::spawn_blocking(move || pipeline.measure(&image))
        .await
        .map_err(|e| MeasureError::Worker(e.to_string()))?
}
