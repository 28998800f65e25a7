//! Viewport - uniform scale plus offset between document and screen space

use super::Point;
use serde::{Deserialize, Serialize};

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 10.0;
/// Share of the window's shorter edge the page covers after fitting
const FIT_MARGIN: f32 = 0.95;

/// `screen = model * base_scale * zoom + offset`, one model unit being the
/// page edge. `base_scale` comes from fitting the window; `zoom` is the user's
/// pinch factor on top of it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    base_scale: f32,
    zoom: f32,
    offset: Point,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            base_scale: 1.0,
            zoom: 1.0,
            offset: Point::ZERO,
        }
    }
}

impl Viewport {
    pub fn new(base_scale: f32, offset: Point) -> Self {
        Self {
            base_scale,
            zoom: 1.0,
            offset,
        }
    }

    /// Screen pixels per model unit
    pub fn scale(&self) -> f32 {
        self.base_scale * self.zoom
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn offset(&self) -> Point {
        self.offset
    }

    /// Apply one pinch/pan frame.
    ///
    /// The model point under `pivot` stays under `pivot` (before `pan`); the
    /// resulting zoom is clamped to `[MIN_ZOOM, MAX_ZOOM]`.
    pub fn transform(&mut self, pivot: Point, pan: Point, zoom: f32) {
        let old = self.scale();
        self.zoom = (self.zoom * zoom).clamp(MIN_ZOOM, MAX_ZOOM);
        let new = self.scale();

        let pivot_model = (pivot - self.offset) / old;
        self.offset = pivot - pivot_model * new + pan;
    }

    pub fn screen_to_model(&self, p: Point) -> Point {
        (p - self.offset) / self.scale()
    }

    pub fn model_to_screen(&self, p: Point) -> Point {
        p * self.scale() + self.offset
    }

    /// Center the whole page in a window and reset zoom
    pub fn fit_to_window(&mut self, width: f32, height: f32) {
        let scale = width.min(height) * FIT_MARGIN;
        if scale <= 0.0 {
            return;
        }
        self.base_scale = scale;
        self.zoom = 1.0;
        self.offset = Point::new((width - scale) / 2.0, (height - scale) / 2.0);
    }
}
