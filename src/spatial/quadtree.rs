//! Region quadtree over normalized document space
//!
//! A stroke lives in the deepest node whose quadrant fully contains its bounds.
//! Strokes straddling a split line stay at the ancestor, so a node's local list
//! is always scanned while only child subtrees are pruned.

use super::SpatialIndex;
use crate::geometry::Rect;
use crate::stroke::StrokeRef;
use std::sync::Arc;

pub const DEFAULT_CAPACITY: usize = 4;
pub const DEFAULT_MAX_DEPTH: u32 = 10;

#[derive(Debug)]
struct QuadNode {
    boundary: Rect,
    depth: u32,
    strokes: Vec<StrokeRef>,
    /// TL, TR, BL, BR
    children: Option<Box<[QuadNode; 4]>>,
}

impl QuadNode {
    fn new(boundary: Rect, depth: u32) -> Self {
        Self {
            boundary,
            depth,
            strokes: Vec::new(),
            children: None,
        }
    }

    /// Quadrant that fully contains `rect`, if any.
    ///
    /// A rect touching a split line belongs to no quadrant.
    fn child_index(&self, rect: &Rect) -> Option<usize> {
        let mid = self.boundary.center();

        let top = rect.top < mid.y && rect.bottom < mid.y;
        let bottom = rect.top > mid.y;
        let left = rect.left < mid.x && rect.right < mid.x;
        let right = rect.left > mid.x;

        let index = match (left, right, top, bottom) {
            (true, _, true, _) => 0,
            (_, true, true, _) => 1,
            (true, _, _, true) => 2,
            (_, true, _, true) => 3,
            _ => return None,
        };

        let children = self.children.as_ref()?;
        children[index]
            .boundary
            .contains_rect(rect)
            .then_some(index)
    }

    fn subdivide(&mut self) {
        let Rect {
            left,
            top,
            right,
            bottom,
        } = self.boundary;
        let mid = self.boundary.center();
        let depth = self.depth + 1;

        self.children = Some(Box::new([
            QuadNode::new(Rect::new(left, top, mid.x, mid.y), depth),
            QuadNode::new(Rect::new(mid.x, top, right, mid.y), depth),
            QuadNode::new(Rect::new(left, mid.y, mid.x, bottom), depth),
            QuadNode::new(Rect::new(mid.x, mid.y, right, bottom), depth),
        ]));
    }

    fn insert(&mut self, stroke: StrokeRef, capacity: usize, max_depth: u32) {
        if let Some(index) = self.child_index(&stroke.bounds()) {
            if let Some(children) = self.children.as_mut() {
                children[index].insert(stroke, capacity, max_depth);
                return;
            }
        }

        self.strokes.push(stroke);

        if self.strokes.len() > capacity && self.children.is_none() && self.depth < max_depth {
            self.subdivide();

            let local = std::mem::take(&mut self.strokes);
            for s in local {
                match self.child_index(&s.bounds()) {
                    Some(index) => {
                        if let Some(children) = self.children.as_mut() {
                            children[index].insert(s, capacity, max_depth);
                        }
                    }
                    None => self.strokes.push(s),
                }
            }
        }
    }

    fn remove(&mut self, stroke: &StrokeRef) -> bool {
        if let Some(pos) = self.strokes.iter().position(|s| Arc::ptr_eq(s, stroke)) {
            self.strokes.remove(pos);
            return true;
        }

        match (self.child_index(&stroke.bounds()), self.children.as_mut()) {
            (Some(index), Some(children)) => children[index].remove(stroke),
            _ => false,
        }
    }

    fn query(&self, range: &Rect, found: &mut Vec<StrokeRef>) {
        found.extend(
            self.strokes
                .iter()
                .filter(|s| range.overlaps(&s.bounds()))
                .cloned(),
        );

        if let Some(children) = &self.children {
            for child in children.iter() {
                if child.boundary.overlaps(range) {
                    child.query(range, found);
                }
            }
        }
    }

    fn collect(&self, out: &mut Vec<StrokeRef>) {
        out.extend(self.strokes.iter().cloned());
        if let Some(children) = &self.children {
            for child in children.iter() {
                child.collect(out);
            }
        }
    }

    fn max_depth_reached(&self) -> u32 {
        match &self.children {
            Some(children) => children
                .iter()
                .map(QuadNode::max_depth_reached)
                .max()
                .unwrap_or(self.depth),
            None => self.depth,
        }
    }
}

#[derive(Debug)]
pub struct QuadTree {
    root: QuadNode,
    capacity: usize,
    max_depth: u32,
    len: usize,
}

impl QuadTree {
    /// Quadtree over the unit page with default capacity and depth
    pub fn new() -> Self {
        Self::with_params(Rect::UNIT, DEFAULT_CAPACITY, DEFAULT_MAX_DEPTH)
    }

    pub fn with_params(boundary: Rect, capacity: usize, max_depth: u32) -> Self {
        Self {
            root: QuadNode::new(boundary, 0),
            capacity: capacity.max(1),
            max_depth,
            len: 0,
        }
    }

    pub fn from_config(config: &crate::core::CanvasConfig) -> Self {
        Self::with_params(Rect::UNIT, config.quadtree_capacity, config.quadtree_max_depth)
    }

    pub fn boundary(&self) -> Rect {
        self.root.boundary
    }

    /// Deepest level that has been subdivided into
    pub fn depth(&self) -> u32 {
        self.root.max_depth_reached()
    }
}

impl Default for QuadTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialIndex for QuadTree {
    fn insert(&mut self, stroke: StrokeRef) {
        if !self.root.boundary.overlaps(&stroke.bounds()) {
            tracing::debug!("Stroke outside index bounds ignored: {:?}", stroke.bounds());
            return;
        }
        self.root.insert(stroke, self.capacity, self.max_depth);
        self.len += 1;
    }

    fn remove(&mut self, stroke: &StrokeRef) -> bool {
        let removed = self.root.remove(stroke);
        if removed {
            self.len -= 1;
        }
        removed
    }

    fn query(&self, range: &Rect) -> Vec<StrokeRef> {
        let mut found = Vec::new();
        self.root.query(range, &mut found);
        found
    }

    fn clear(&mut self) {
        self.root = QuadNode::new(self.root.boundary, 0);
        self.len = 0;
    }

    fn all(&self) -> Vec<StrokeRef> {
        let mut out = Vec::with_capacity(self.len);
        self.root.collect(&mut out);
        out
    }

    fn len(&self) -> usize {
        self.len
    }
}
