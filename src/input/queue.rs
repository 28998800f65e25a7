//! Thread-safe FIFO between pointer event delivery and stroke processing

use parking_lot::Mutex;
use std::collections::VecDeque;

use super::RawPoint;

/// Samples pushed from the event thread, drained by the render loop
#[derive(Debug, Default)]
pub struct InkInputQueue {
    events: Mutex<VecDeque<RawPoint>>,
}

impl InkInputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, point: RawPoint) {
        self.events.lock().push_back(point);
    }

    pub fn extend<I: IntoIterator<Item = RawPoint>>(&self, points: I) {
        self.events.lock().extend(points);
    }

    /// Drain every queued sample in arrival order
    pub fn poll_events(&self) -> Vec<RawPoint> {
        self.events.lock().drain(..).collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}
