//! Linear-scan index for small stroke sets

use super::SpatialIndex;
use crate::geometry::Rect;
use crate::stroke::StrokeRef;
use std::sync::Arc;

#[derive(Debug, Default, Clone)]
pub struct FlatIndex {
    strokes: Vec<StrokeRef>,
}

impl FlatIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpatialIndex for FlatIndex {
    fn insert(&mut self, stroke: StrokeRef) {
        self.strokes.push(stroke);
    }

    fn remove(&mut self, stroke: &StrokeRef) -> bool {
        match self.strokes.iter().position(|s| Arc::ptr_eq(s, stroke)) {
            Some(pos) => {
                self.strokes.remove(pos);
                true
            }
            None => false,
        }
    }

    fn query(&self, range: &Rect) -> Vec<StrokeRef> {
        self.strokes
            .iter()
            .filter(|s| range.overlaps(&s.bounds()))
            .cloned()
            .collect()
    }

    fn clear(&mut self) {
        self.strokes.clear();
    }

    fn all(&self) -> Vec<StrokeRef> {
        self.strokes.clone()
    }

    fn len(&self) -> usize {
        self.strokes.len()
    }
}
