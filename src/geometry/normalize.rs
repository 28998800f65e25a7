//! Legacy 0..1000 coordinate detection

use super::Point;
use crate::core::config::{LEGACY_PAGE_SIZE, LEGACY_THRESHOLD};

/// True when a stored position uses the legacy 0..1000 scale
#[inline]
pub fn is_legacy_position(x: f32, y: f32) -> bool {
    x > LEGACY_THRESHOLD || y > LEGACY_THRESHOLD
}

/// Map a stored position into normalized document space.
///
/// Both axes are rescaled together when either one is legacy.
pub fn normalize_legacy_position(x: f32, y: f32) -> (f32, f32) {
    if is_legacy_position(x, y) {
        (x / LEGACY_PAGE_SIZE, y / LEGACY_PAGE_SIZE)
    } else {
        (x, y)
    }
}

/// Normalize a stroke's point list.
///
/// The whole stroke is treated as legacy if any of its points is, so a stroke
/// that dips below 1.1 near the origin is not split between two scales.
pub fn normalize_points(points: Vec<Point>) -> Vec<Point> {
    if !points.iter().any(|p| is_legacy_position(p.x, p.y)) {
        return points;
    }

    points
        .into_iter()
        .map(|p| Point::new(p.x / LEGACY_PAGE_SIZE, p.y / LEGACY_PAGE_SIZE))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_value_rescaled() {
        assert_eq!(normalize_legacy_position(500.0, 250.0), (0.5, 0.25));
    }

    #[test]
    fn test_modern_value_unchanged() {
        assert_eq!(normalize_legacy_position(0.5, 0.5), (0.5, 0.5));
    }

    #[test]
    fn test_threshold_boundary() {
        assert!(!is_legacy_position(1.1, 0.0));
        assert!(is_legacy_position(1.100001, 0.0));
        assert_eq!(normalize_legacy_position(1.1, 0.2), (1.1, 0.2));
    }

    #[test]
    fn test_one_axis_triggers_both() {
        let (x, y) = normalize_legacy_position(0.5, 800.0);
        assert!((x - 0.0005).abs() < 1e-7);
        assert!((y - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_points_rescaled_as_a_whole() {
        let points = vec![Point::new(1.0, 1.0), Point::new(500.0, 600.0)];
        let normalized = normalize_points(points);
        assert!((normalized[0].x - 0.001).abs() < 1e-7);
        assert!((normalized[1].y - 0.6).abs() < 1e-6);
    }
}
