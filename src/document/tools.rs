//! Drawing tools and the brush state they read from

use crate::core::config::DEFAULT_LAYER;
use crate::stroke::{clamp_layer, with_alpha, BlendMode, DEFAULT_WIDTH};
use serde::{Deserialize, Serialize};

pub const PEN_COLOR: u32 = 0xFF22_2222;
/// Paint-clear eraser width, per-mille
pub const ERASER_WIDTH: f32 = 40.0;
/// Width of the visible segment eraser trail, per-mille
pub const SEGMENT_TRAIL_WIDTH: f32 = 10.0;
pub const MARKER_ALPHA: f32 = 0.4;

const ERASER_PREVIEW: u32 = 0x80FF_FFFF;
const SEGMENT_PREVIEW: u32 = 0x33FF_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    #[default]
    Pen,
    /// Paints transparency into the layer
    Eraser,
    /// Removes whole strokes crossed by the trail
    SegmentEraser,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrushState {
    pub tool: Tool,
    /// Pen color, packed ARGB
    pub color: u32,
    /// Pen width, per-mille
    pub width: f32,
    pub marker: bool,
    pub layer: u8,
}

impl Default for BrushState {
    fn default() -> Self {
        Self {
            tool: Tool::Pen,
            color: PEN_COLOR,
            width: DEFAULT_WIDTH,
            marker: false,
            layer: DEFAULT_LAYER,
        }
    }
}

impl BrushState {
    pub fn set_layer(&mut self, layer: i32) {
        self.layer = clamp_layer(layer);
    }

    pub fn layer(&self) -> usize {
        self.layer as usize
    }

    pub fn is_eraser(&self) -> bool {
        self.tool == Tool::Eraser
    }

    /// Color written into the committed stroke
    pub fn stroke_color(&self) -> u32 {
        match self.tool {
            Tool::Pen if self.marker => with_alpha(self.color, MARKER_ALPHA),
            Tool::Pen => self.color,
            Tool::Eraser | Tool::SegmentEraser => 0,
        }
    }

    pub fn stroke_width(&self) -> f32 {
        match self.tool {
            Tool::Pen => self.width,
            Tool::Eraser => ERASER_WIDTH,
            Tool::SegmentEraser => SEGMENT_TRAIL_WIDTH,
        }
    }

    pub fn blend_mode(&self) -> BlendMode {
        if self.is_eraser() {
            BlendMode::Clear
        } else {
            BlendMode::Normal
        }
    }

    /// Color of the live preview path
    pub fn preview_color(&self) -> u32 {
        match self.tool {
            Tool::Pen => self.stroke_color(),
            Tool::Eraser => ERASER_PREVIEW,
            Tool::SegmentEraser => SEGMENT_PREVIEW,
        }
    }
}
