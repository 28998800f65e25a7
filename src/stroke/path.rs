//! Midpoint quadratic smoothing

use crate::geometry::Point;
use tiny_skia::PathBuilder;

/// A single path instruction in normalized space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    /// Control point, end point
    QuadTo(Point, Point),
}

/// Renderable smoothed path
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SmoothPath {
    commands: Vec<PathCommand>,
}

impl SmoothPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the smoothed path for a sample list.
    ///
    /// Fewer than 3 samples are joined with straight lines. Otherwise each
    /// sample becomes the control point of a quad ending at the midpoint to the
    /// next one; the first segment is a line to the first midpoint and the path
    /// ends with a line to the last sample.
    pub fn from_points(points: &[Point]) -> Self {
        let Some(&first) = points.first() else {
            return Self::default();
        };

        let mut commands = Vec::with_capacity(points.len() + 1);
        commands.push(PathCommand::MoveTo(first));

        if points.len() < 3 {
            commands.extend(points[1..].iter().map(|&p| PathCommand::LineTo(p)));
            return Self { commands };
        }

        for i in 1..points.len() {
            let prev = points[i - 1];
            let mid = prev.midpoint(points[i]);
            if i == 1 {
                commands.push(PathCommand::LineTo(mid));
            } else {
                commands.push(PathCommand::QuadTo(prev, mid));
            }
        }
        commands.push(PathCommand::LineTo(points[points.len() - 1]));

        Self { commands }
    }

    /// A path holding only a move to `point`
    pub fn starting_at(point: Point) -> Self {
        Self {
            commands: vec![PathCommand::MoveTo(point)],
        }
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Convert to a tiny-skia path with every coordinate multiplied by `scale`.
    ///
    /// Returns `None` for paths with nothing to draw (empty or a bare move).
    pub fn to_skia(&self, scale: f32) -> Option<tiny_skia::Path> {
        let mut pb = PathBuilder::with_capacity(self.commands.len(), self.commands.len() * 2);
        for cmd in &self.commands {
            match *cmd {
                PathCommand::MoveTo(p) => pb.move_to(p.x * scale, p.y * scale),
                PathCommand::LineTo(p) => pb.line_to(p.x * scale, p.y * scale),
                PathCommand::QuadTo(c, p) => {
                    pb.quad_to(c.x * scale, c.y * scale, p.x * scale, p.y * scale)
                }
            }
        }
        pb.finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_points() {
        assert!(SmoothPath::from_points(&[]).is_empty());
    }

    #[test]
    fn test_two_points_are_lines() {
        let a = Point::new(0.1, 0.1);
        let b = Point::new(0.2, 0.2);
        let path = SmoothPath::from_points(&[a, b]);
        assert_eq!(
            path.commands(),
            &[PathCommand::MoveTo(a), PathCommand::LineTo(b)]
        );
    }

    #[test]
    fn test_three_points_smoothed() {
        let p0 = Point::new(0.0, 0.0);
        let p1 = Point::new(0.2, 0.0);
        let p2 = Point::new(0.2, 0.2);
        let path = SmoothPath::from_points(&[p0, p1, p2]);
        assert_eq!(
            path.commands(),
            &[
                PathCommand::MoveTo(p0),
                PathCommand::LineTo(Point::new(0.1, 0.0)),
                PathCommand::QuadTo(p1, Point::new(0.2, 0.1)),
                PathCommand::LineTo(p2),
            ]
        );
    }

    #[test]
    fn test_bare_move_has_no_skia_path() {
        assert!(SmoothPath::starting_at(Point::new(0.5, 0.5)).to_skia(100.0).is_none());
    }

    #[test]
    fn test_to_skia_scales() {
        let path = SmoothPath::from_points(&[Point::new(0.0, 0.0), Point::new(1.0, 0.5)]);
        let skia = path.to_skia(200.0).unwrap();
        let bounds = skia.bounds();
        assert_eq!(bounds.right(), 200.0);
        assert_eq!(bounds.bottom(), 100.0);
    }
}
