//! Stroke engine - turns raw samples into a live smoothed preview path

use super::RawPoint;
use crate::geometry::Point;
use crate::stroke::{SmoothPath, DEFAULT_WIDTH};

/// Incremental smoothing for the stroke in progress.
///
/// The path is rebuilt from all samples on every update so the preview always
/// matches what the committed stroke will render.
#[derive(Debug, Clone)]
pub struct StrokeEngine {
    samples: Vec<RawPoint>,
    path: SmoothPath,
    /// Width in per-mille page units
    stroke_width: f32,
}

impl StrokeEngine {
    pub fn new() -> Self {
        Self {
            samples: Vec::new(),
            path: SmoothPath::new(),
            stroke_width: DEFAULT_WIDTH,
        }
    }

    pub fn start(&mut self, point: RawPoint) {
        self.samples.clear();
        self.samples.push(point);
        self.path = SmoothPath::starting_at(point.position());
    }

    /// Append samples; returns true when the preview path changed.
    pub fn process(&mut self, new_samples: &[RawPoint]) -> bool {
        if new_samples.is_empty() {
            return false;
        }

        self.samples.extend_from_slice(new_samples);
        if self.samples.len() < 3 {
            return false;
        }

        self.path = SmoothPath::from_points(&self.positions());
        true
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.path.clear();
    }

    /// Current preview path and every raw sample of the stroke
    pub fn finalize(&self) -> (SmoothPath, Vec<RawPoint>) {
        (self.path.clone(), self.samples.clone())
    }

    pub fn path(&self) -> &SmoothPath {
        &self.path
    }

    pub fn samples(&self) -> &[RawPoint] {
        &self.samples
    }

    pub fn positions(&self) -> Vec<Point> {
        self.samples.iter().map(RawPoint::position).collect()
    }

    pub fn is_active(&self) -> bool {
        !self.samples.is_empty()
    }

    pub fn stroke_width(&self) -> f32 {
        self.stroke_width
    }

    pub fn set_stroke_width(&mut self, width: f32) {
        self.stroke_width = width.max(0.0);
    }
}

impl Default for StrokeEngine {
    fn default() -> Self {
        Self::new()
    }
}
