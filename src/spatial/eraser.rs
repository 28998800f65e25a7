//! Segment eraser - removes whole strokes crossed by the eraser trail

use super::SpatialIndex;
use crate::geometry::{segments_intersect, Point, Rect};
use crate::stroke::StrokeRef;

/// Strokes on `layer` that the trail could touch.
///
/// Eraser strokes and strokes with fewer than two points are never candidates.
pub fn erase_candidates(
    index: &dyn SpatialIndex,
    trail: &[Point],
    layer: usize,
    tolerance: f32,
) -> Vec<StrokeRef> {
    if trail.len() < 2 {
        return Vec::new();
    }

    let range = Rect::bounding(trail).inflate(tolerance);
    index
        .query(&range)
        .into_iter()
        .filter(|s| s.layer() == layer && !s.is_eraser() && s.points().len() >= 2)
        .collect()
}

/// Strokes whose polyline crosses the trail polyline
pub fn find_erased(
    index: &dyn SpatialIndex,
    trail: &[Point],
    layer: usize,
    tolerance: f32,
) -> Vec<StrokeRef> {
    let erased: Vec<StrokeRef> = erase_candidates(index, trail, layer, tolerance)
        .into_iter()
        .filter(|s| polylines_cross(s.points(), trail))
        .collect();

    if !erased.is_empty() {
        tracing::debug!(
            "Segment eraser hit {} strokes on layer {}",
            erased.len(),
            layer
        );
    }
    erased
}

fn polylines_cross(a: &[Point], b: &[Point]) -> bool {
    a.windows(2).any(|sa| {
        b.windows(2)
            .any(|sb| segments_intersect(sa[0], sa[1], sb[0], sb[1]))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::spatial::QuadTree;
    use crate::stroke::{Stroke, DEFAULT_COLOR};
    use std::sync::Arc;

    fn stroke(points: &[(f32, f32)], layer: i32, is_eraser: bool) -> StrokeRef {
        Stroke::new(
            points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
            DEFAULT_COLOR,
            5.0,
            is_eraser,
            layer,
        )
        .unwrap()
        .into_ref()
    }

    fn trail(points: &[(f32, f32)]) -> Vec<Point> {
        points.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn test_crossing_stroke_erased() {
        let mut index = QuadTree::new();
        let target = stroke(&[(0.1, 0.5), (0.9, 0.5)], 1, false);
        index.insert(Arc::clone(&target));

        let erased = find_erased(&index, &trail(&[(0.5, 0.4), (0.5, 0.6)]), 1, 0.005);
        assert_eq!(erased.len(), 1);
        assert!(Arc::ptr_eq(&erased[0], &target));
    }

    #[test]
    fn test_far_trail_erases_nothing() {
        let mut index = QuadTree::new();
        index.insert(stroke(&[(0.1, 0.1), (0.2, 0.2)], 1, false));

        let erased = find_erased(&index, &trail(&[(0.8, 0.8), (0.9, 0.9)]), 1, 0.005);
        assert!(erased.is_empty());
    }

    #[test]
    fn test_other_layer_and_eraser_strokes_skipped() {
        let mut index = QuadTree::new();
        index.insert(stroke(&[(0.1, 0.5), (0.9, 0.5)], 0, false));
        index.insert(stroke(&[(0.1, 0.5), (0.9, 0.5)], 1, true));
        index.insert(stroke(&[(0.5, 0.5)], 1, false));

        let erased = find_erased(&index, &trail(&[(0.5, 0.4), (0.5, 0.6)]), 1, 0.005);
        assert!(erased.is_empty());
    }

    #[test]
    fn test_single_point_trail_erases_nothing() {
        let mut index = QuadTree::new();
        index.insert(stroke(&[(0.1, 0.5), (0.9, 0.5)], 1, false));

        assert!(find_erased(&index, &trail(&[(0.5, 0.5)]), 1, 0.005).is_empty());
    }

    #[test]
    fn test_parallel_nearby_trail_not_erased() {
        let mut index = QuadTree::new();
        index.insert(stroke(&[(0.1, 0.5), (0.9, 0.5)], 1, false));

        // Within tolerance of the bounds but never crossing
        let erased = find_erased(&index, &trail(&[(0.2, 0.503), (0.8, 0.503)]), 1, 0.005);
        assert!(erased.is_empty());
    }
}
