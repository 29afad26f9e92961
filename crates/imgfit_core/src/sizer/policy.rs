//! Scale and quality choices for each encode pass.
//!
//! Encoded size is taken to grow roughly with pixel count, so the linear
//! scale needed to hit a byte ratio `r` is about `sqrt(r)`. Each pass also
//! applies a safety margin. Corrective passes always shrink the image
//! further and step lossy quality down one notch, so every pass is cheaper
//! than the one before it.

use crate::config::ProcessingSettings;
use crate::media::{Dimensions, ImageFormat, ImageProbe, Quality};

/// A corrective pass keeps at most this fraction of the previous scale.
const MAX_SCALE_RETAINED: f64 = 0.98;

/// Parameters for one encode pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassPlan {
    pub scale: f64,
    pub dimensions: Dimensions,
    pub quality: Quality,
}

/// Chooses pass parameters from sizes observed so far.
#[derive(Debug, Clone, Copy)]
pub struct ResizePolicy {
    margin: f64,
    max_attempts: u32,
    min_dimension: u32,
}

impl ResizePolicy {
    pub fn new(margin: f64, max_attempts: u32, min_dimension: u32) -> Self {
        let margin = if margin.is_finite() && margin > 0.0 {
            margin.min(1.0)
        } else {
            tracing::warn!("Invalid safety margin {}; using 0.95", margin);
            0.95
        };
        Self {
            margin,
            max_attempts: max_attempts.max(1),
            min_dimension: min_dimension.max(1),
        }
    }

    pub fn from_settings(settings: &ProcessingSettings) -> Self {
        Self::new(
            settings.safety_margin,
            settings.max_attempts,
            settings.min_dimension,
        )
    }

    /// Total passes allowed per file, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// First pass for an image larger than `target`.
    ///
    /// `None` when the image cannot shrink far enough without dropping under
    /// the minimum dimension.
    pub fn first_pass(
        &self,
        probe: &ImageProbe,
        format: ImageFormat,
        target: u64,
    ) -> Option<PassPlan> {
        let scale = self.step(target, probe.size_bytes).min(1.0);
        self.plan(probe.dimensions, scale, format.default_quality())
    }

    /// Next pass after `previous` produced `last_output` bytes, still over `target`.
    ///
    /// The scale is strictly below the previous one and the dimensions are
    /// strictly smaller on at least one side.
    pub fn corrective_pass(
        &self,
        original: Dimensions,
        previous: &PassPlan,
        last_output: u64,
        target: u64,
    ) -> Option<PassPlan> {
        let scale = (previous.scale * self.step(target, last_output))
            .min(previous.scale * MAX_SCALE_RETAINED);

        let mut next = self.plan(original, scale, previous.quality.degraded())?;
        if next.dimensions == previous.dimensions {
            let shrunk = Dimensions::new(
                previous.dimensions.width.saturating_sub(1).max(1),
                previous.dimensions.height.saturating_sub(1).max(1),
            );
            if shrunk == previous.dimensions || shrunk.min_side() < self.floor(original) {
                return None;
            }
            next.dimensions = shrunk;
        }
        Some(next)
    }

    fn step(&self, target: u64, current: u64) -> f64 {
        if current == 0 {
            return self.margin;
        }
        (target as f64 / current as f64).sqrt() * self.margin
    }

    /// Smallest side a pass may produce; images already smaller keep their own.
    fn floor(&self, original: Dimensions) -> u32 {
        self.min_dimension.min(original.min_side())
    }

    fn plan(&self, original: Dimensions, scale: f64, quality: Quality) -> Option<PassPlan> {
        let dimensions = original.scaled(scale);
        if dimensions.min_side() < self.floor(original) {
            tracing::debug!(
                "Scale {:.3} would give {}, under the {}px minimum",
                scale,
                dimensions,
                self.min_dimension
            );
            return None;
        }
        Some(PassPlan {
            scale,
            dimensions,
            quality,
        })
    }
}

impl Default for ResizePolicy {
    fn default() -> Self {
        Self::from_settings(&ProcessingSettings::default())
    }
}
