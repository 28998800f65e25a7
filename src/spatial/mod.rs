//! Spatial indexing of committed strokes
//!
//! [`SpatialIndex`] is the capability the document and the segment eraser
//! depend on. [`QuadTree`] is the default backend; [`FlatIndex`] scans
//! linearly and doubles as the reference for tests.

mod eraser;
mod flat;
mod quadtree;

pub use eraser::{erase_candidates, find_erased};
pub use flat::FlatIndex;
pub use quadtree::QuadTree;

use crate::geometry::{Point, Rect};
use crate::stroke::StrokeRef;

pub trait SpatialIndex: Send + Sync {
    /// Add a stroke. Strokes outside the indexed area are ignored.
    fn insert(&mut self, stroke: StrokeRef);

    /// Remove by identity; returns whether the stroke was found.
    fn remove(&mut self, stroke: &StrokeRef) -> bool;

    /// Every stroke whose bounds overlap `range`
    fn query(&self, range: &Rect) -> Vec<StrokeRef>;

    /// Strokes with a raw point closer than `threshold` to `point`
    fn hit_test(&self, point: Point, threshold: f32) -> Vec<StrokeRef> {
        let search = Rect::from_center(point, threshold, threshold);
        self.query(&search)
            .into_iter()
            .filter(|stroke| is_hit(stroke, point, threshold))
            .collect()
    }

    fn clear(&mut self);

    fn all(&self) -> Vec<StrokeRef>;

    fn len(&self) -> usize {
        self.all().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the contents with `strokes`
    fn rebuild(&mut self, strokes: &[StrokeRef]) {
        self.clear();
        for stroke in strokes {
            self.insert(StrokeRef::clone(stroke));
        }
    }
}

fn is_hit(stroke: &StrokeRef, point: Point, threshold: f32) -> bool {
    if !stroke.bounds().inflate(threshold).contains(point) {
        return false;
    }
    stroke.points().iter().any(|p| p.distance(point) < threshold)
}
