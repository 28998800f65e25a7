//! Geometry primitives shared by the stroke model, the spatial index and the renderers

mod normalize;
mod viewport;

pub use normalize::{is_legacy_position, normalize_legacy_position, normalize_points};
pub use viewport::Viewport;

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

/// A point in document space (normalized 0..1 unless stated otherwise)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Point {
    type Output = Point;
    fn mul(self, rhs: f32) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f32> for Point {
    type Output = Point;
    fn div(self, rhs: f32) -> Point {
        Point::new(self.x / rhs, self.y / rhs)
    }
}

/// Axis-aligned rectangle given by its edges
///
/// Overlap and containment are closed-interval: rectangles that share an edge
/// overlap, and zero-area rectangles are valid.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub const ZERO: Rect = Rect::new(0.0, 0.0, 0.0, 0.0);
    /// The full normalized page
    pub const UNIT: Rect = Rect::new(0.0, 0.0, 1.0, 1.0);

    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn from_center(center: Point, half_width: f32, half_height: f32) -> Self {
        Self::new(
            center.x - half_width,
            center.y - half_height,
            center.x + half_width,
            center.y + half_height,
        )
    }

    /// Bounding box of a point list; the zero rect when empty
    pub fn bounding(points: &[Point]) -> Self {
        let Some(first) = points.first() else {
            return Rect::ZERO;
        };

        points.iter().skip(1).fold(
            Rect::new(first.x, first.y, first.x, first.y),
            |acc, p| Rect::new(acc.left.min(p.x), acc.top.min(p.y), acc.right.max(p.x), acc.bottom.max(p.y)),
        )
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.left + self.width() / 2.0,
            self.top + self.height() / 2.0,
        )
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left <= other.right
            && other.left <= self.right
            && self.top <= other.bottom
            && other.top <= self.bottom
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left && point.x <= self.right && point.y >= self.top && point.y <= self.bottom
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.right <= self.right
            && other.top >= self.top
            && other.bottom <= self.bottom
    }

    pub fn inflate(&self, delta: f32) -> Rect {
        Rect::new(
            self.left - delta,
            self.top - delta,
            self.right + delta,
            self.bottom + delta,
        )
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Rect {
        Rect::new(self.left + dx, self.top + dy, self.right + dx, self.bottom + dy)
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right.max(other.right),
            self.bottom.max(other.bottom),
        )
    }
}

/// Returns true if segment `p1..p2` crosses segment `p3..p4`.
///
/// Orientation test only; collinear overlaps are not special-cased.
pub fn segments_intersect(p1: Point, p2: Point, p3: Point, p4: Point) -> bool {
    fn ccw(a: Point, b: Point, c: Point) -> bool {
        (c.y - a.y) * (b.x - a.x) > (b.y - a.y) * (c.x - a.x)
    }

    ccw(p1, p3, p4) != ccw(p2, p3, p4) && ccw(p1, p2, p3) != ccw(p1, p2, p4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_empty_is_zero() {
        assert_eq!(Rect::bounding(&[]), Rect::ZERO);
    }

    #[test]
    fn test_bounding_points() {
        let points = [
            Point::new(0.3, 0.2),
            Point::new(0.1, 0.6),
            Point::new(0.5, 0.4),
        ];
        assert_eq!(Rect::bounding(&points), Rect::new(0.1, 0.2, 0.5, 0.6));
    }

    #[test]
    fn test_overlap_is_closed() {
        let a = Rect::new(0.0, 0.0, 0.5, 0.5);
        let b = Rect::new(0.5, 0.5, 1.0, 1.0);
        let c = Rect::new(0.6, 0.0, 1.0, 0.4);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));

        // Degenerate rect (single point) still overlaps what contains it
        let dot = Rect::new(0.25, 0.25, 0.25, 0.25);
        assert!(a.overlaps(&dot));
    }

    #[test]
    fn test_segments_cross() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(1.0, 1.0);
        let c = Point::new(0.0, 1.0);
        let d = Point::new(1.0, 0.0);
        assert!(segments_intersect(a, b, c, d));
    }

    #[test]
    fn test_segments_apart() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(0.4, 0.0);
        let c = Point::new(0.5, -0.5);
        let d = Point::new(0.5, 0.5);
        assert!(!segments_intersect(a, b, c, d));
    }

    #[test]
    fn test_point_math() {
        let p = Point::new(3.0, 4.0);
        assert_eq!(p.distance(Point::ZERO), 5.0);
        assert_eq!(p.midpoint(Point::ZERO), Point::new(1.5, 2.0));
        assert_eq!((p - Point::new(1.0, 1.0)) * 2.0, Point::new(4.0, 6.0));
    }
}
