//! Input module - raw pointer samples, the ink queue and the smoothing engine

mod engine;
mod queue;

pub use engine::StrokeEngine;
pub use queue::InkInputQueue;

use crate::geometry::Point;
use serde::{Deserialize, Serialize};

/// Raw pointer sample in document space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    pub x: f32,
    pub y: f32,
    /// Timestamp in milliseconds
    pub timestamp_ms: u64,
}

impl RawPoint {
    /// Create a sample stamped with the current time
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            timestamp_ms: current_time_ms(),
        }
    }

    pub fn at(x: f32, y: f32, timestamp_ms: u64) -> Self {
        Self { x, y, timestamp_ms }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

impl From<RawPoint> for Point {
    fn from(p: RawPoint) -> Self {
        p.position()
    }
}

/// Get current time in milliseconds
pub(crate) fn current_time_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
