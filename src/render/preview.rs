//! Day preview data for the year grid
//!
//! A preview only needs the parsed strokes, the stickers and the region of the
//! page that actually holds content, so the grid can zoom onto it.

use crate::document::Sticker;
use crate::geometry::Rect;
use crate::stroke::{deserialize_strokes, Stroke};

/// Padding around the content bounds, normalized (20 page units)
pub const PREVIEW_PADDING: f32 = 0.02;

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewSticker {
    pub sticker: Sticker,
    /// Rotated, scaled bounds in normalized space
    pub bounds: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayRenderData {
    pub entry_id: i64,
    pub strokes: Vec<Stroke>,
    pub stickers: Vec<PreviewSticker>,
    /// Padded union of everything drawn; the full page when empty
    pub content_bounds: Rect,
}

impl DayRenderData {
    /// Build preview data from a stored stroke string and the day's stickers.
    ///
    /// `base_size` is the sticker base edge in normalized units.
    pub fn compute(entry_id: i64, stroke_data: &str, stickers: Vec<Sticker>, base_size: f32) -> Self {
        let strokes = deserialize_strokes(stroke_data);
        let stickers: Vec<PreviewSticker> = stickers
            .into_iter()
            .map(|sticker| PreviewSticker {
                bounds: sticker.bounds(base_size),
                sticker,
            })
            .collect();

        let content_bounds = strokes
            .iter()
            .map(Stroke::bounds)
            .chain(stickers.iter().map(|s| s.bounds))
            .reduce(|acc, r| acc.union(&r))
            .map(|r| r.inflate(PREVIEW_PADDING))
            .unwrap_or(Rect::UNIT);

        Self {
            entry_id,
            strokes,
            stickers,
            content_bounds,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty() && self.stickers.is_empty()
    }
}
