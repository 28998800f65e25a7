//! Stroke model - immutable ink strokes with precomputed bounds and smoothed path

pub mod codec;
mod path;

pub use codec::{deserialize_strokes, serialize_strokes};
pub use path::{PathCommand, SmoothPath};

use crate::core::config::{DEFAULT_LAYER, LAYER_COUNT};
use crate::geometry::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Opaque black, the fallback stroke color
pub const DEFAULT_COLOR: u32 = 0xFF00_0000;
/// Default width in per-mille page units
pub const DEFAULT_WIDTH: f32 = 5.0;

/// Shared handle to a committed stroke.
///
/// Identity (for index removal and eraser batches) is pointer identity.
pub type StrokeRef = Arc<Stroke>;

/// How a stroke is composited into its layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    /// Source-over
    #[default]
    Normal,
    /// Erase to transparent
    Clear,
}

impl BlendMode {
    pub fn to_skia(self) -> tiny_skia::BlendMode {
        match self {
            BlendMode::Normal => tiny_skia::BlendMode::SourceOver,
            BlendMode::Clear => tiny_skia::BlendMode::Clear,
        }
    }
}

/// A finished ink stroke in normalized document space
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    points: Vec<Point>,
    /// Packed ARGB
    color: u32,
    /// Per-mille of the page edge
    width: f32,
    is_eraser: bool,
    layer: u8,
    bounds: Rect,
    path: SmoothPath,
}

impl Stroke {
    /// Build a stroke; `None` when there are no points.
    ///
    /// Out-of-range layers are clamped into the valid layer range.
    pub fn new(points: Vec<Point>, color: u32, width: f32, is_eraser: bool, layer: i32) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        let bounds = Rect::bounding(&points);
        let path = SmoothPath::from_points(&points);

        Some(Self {
            points,
            color,
            width,
            is_eraser,
            layer: clamp_layer(layer),
            bounds,
            path,
        })
    }

    /// Pen stroke with default color and width on the default layer
    pub fn with_points(points: Vec<Point>) -> Option<Self> {
        Self::new(points, DEFAULT_COLOR, DEFAULT_WIDTH, false, DEFAULT_LAYER as i32)
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn color(&self) -> u32 {
        self.color
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn is_eraser(&self) -> bool {
        self.is_eraser
    }

    pub fn layer(&self) -> usize {
        self.layer as usize
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn path(&self) -> &SmoothPath {
        &self.path
    }

    pub fn blend_mode(&self) -> BlendMode {
        if self.is_eraser {
            BlendMode::Clear
        } else {
            BlendMode::Normal
        }
    }

    pub fn into_ref(self) -> StrokeRef {
        Arc::new(self)
    }
}

impl AsRef<Stroke> for Stroke {
    fn as_ref(&self) -> &Stroke {
        self
    }
}

/// Clamp a raw layer index into `0..LAYER_COUNT`
pub fn clamp_layer(layer: i32) -> u8 {
    layer.clamp(0, LAYER_COUNT as i32 - 1) as u8
}

/// Split a packed ARGB color into a tiny-skia color
pub fn argb_to_color(argb: u32) -> tiny_skia::Color {
    let a = (argb >> 24) as u8;
    let r = (argb >> 16) as u8;
    let g = (argb >> 8) as u8;
    let b = argb as u8;
    tiny_skia::Color::from_rgba8(r, g, b, a)
}

/// Replace the alpha channel of a packed ARGB color
pub fn with_alpha(argb: u32, alpha: f32) -> u32 {
    let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u32;
    (argb & 0x00FF_FFFF) | (a << 24)
}
