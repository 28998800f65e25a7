//! Snapshot generator - deterministic thumbnails for persistence
//!
//! Renders straight from the stroke and sticker lists, never from the live
//! layer buffers, so the output only depends on document data. Coordinates are
//! normalized ×`document_size` page units, then ×`fit_scale` output pixels.

use super::layers::stroke_into;
use super::{fill_center_cropped, image_ops, solid_paint, CONTENT_BACKGROUND, PLACEHOLDER_COLOR};
use crate::cache::ImageCache;
use crate::core::config::{LAYER_COUNT, LEGACY_PAGE_SIZE};
use crate::core::{CanvasConfig, CoreError, CoreResult};
use crate::document::{Sticker, StickerContent};
use crate::geometry::{Point, Rect};
use crate::stroke::{BlendMode, Stroke};
use tiny_skia::{FillRule, PathBuilder, Pixmap, Transform};

/// Card shadow, black at 20%
const SHADOW_COLOR: u32 = 0x3300_0000;
const SHADOW_OFFSET: f32 = 0.05;
/// Content inset relative to the card edge
const CONTENT_INSET: f32 = 6.0 / 150.0;
const PLACEHOLDER_RADIUS: f32 = 0.25;

const BACKGROUND: u32 = 0xFFFF_FFFF;

/// Geometry of one sticker card in output pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StickerCard {
    pub center: Point,
    /// Card edge including the sticker's own scale
    pub size: f32,
    /// Degrees
    pub rotation: f32,
    /// Unrotated card rectangle
    pub bounds: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotGenerator {
    output_size: u32,
    document_size: f32,
    base_sticker_size: f32,
}

impl SnapshotGenerator {
    pub fn new(config: &CanvasConfig) -> Self {
        Self {
            output_size: config.snapshot_size,
            document_size: LEGACY_PAGE_SIZE,
            base_sticker_size: config.base_sticker_size,
        }
    }

    /// Generator for an explicit page size in page units
    pub fn with_document_size(output_size: u32, document_size: f32, base_sticker_size: f32) -> Self {
        Self {
            output_size,
            document_size: document_size.max(1.0),
            base_sticker_size,
        }
    }

    pub fn output_size(&self) -> u32 {
        self.output_size
    }

    /// Output pixels per page unit
    pub fn fit_scale(&self) -> f32 {
        self.output_size as f32 / self.document_size
    }

    /// Centering offset of the page inside the square output
    fn offset(&self) -> f32 {
        (self.output_size as f32 - self.document_size * self.fit_scale()) / 2.0
    }

    pub fn sticker_card(&self, sticker: &Sticker) -> StickerCard {
        let fit = self.fit_scale();
        let offset = self.offset();
        let half_base = self.base_sticker_size / 2.0;

        let center = Point::new(
            (sticker.x * self.document_size + half_base) * fit + offset,
            (sticker.y * self.document_size + half_base) * fit + offset,
        );
        let size = self.base_sticker_size * fit * sticker.scale;
        StickerCard {
            center,
            size,
            rotation: sticker.rotation,
            bounds: Rect::from_center(center, size / 2.0, size / 2.0),
        }
    }

    /// Render the document onto a white square.
    ///
    /// Layers are drawn bottom to top; within a layer strokes come first, then
    /// that layer's stickers. Images are fetched through `images`; a sticker
    /// whose image cannot be loaded keeps its gray content box.
    pub fn capture<S: AsRef<Stroke>>(
        &self,
        strokes: &[S],
        stickers: &[Sticker],
        images: &ImageCache,
    ) -> CoreResult<Pixmap> {
        let mut out = Pixmap::new(self.output_size, self.output_size).ok_or_else(|| {
            CoreError::Raster(format!("cannot allocate {0}x{0} snapshot", self.output_size))
        })?;
        out.fill(tiny_skia::Color::WHITE);

        let fit = self.fit_scale();
        let offset = self.offset();
        let placement = Transform::from_translate(offset, offset);

        for layer in 0..LAYER_COUNT {
            for stroke in strokes.iter().map(AsRef::as_ref).filter(|s| s.layer() == layer) {
                let color = if stroke.is_eraser() { BACKGROUND } else { stroke.color() };
                stroke_into(
                    &mut out,
                    stroke.path(),
                    self.document_size * fit,
                    stroke.width() * fit,
                    color,
                    BlendMode::Normal,
                    placement,
                );
            }
            for sticker in stickers.iter().filter(|s| s.layer() == layer) {
                self.draw_card(&mut out, sticker, images);
            }
        }

        tracing::debug!(
            "Snapshot {}px: {} strokes, {} stickers",
            self.output_size,
            strokes.len(),
            stickers.len()
        );
        Ok(out)
    }

    /// Capture and encode as PNG
    pub fn capture_png<S: AsRef<Stroke>>(
        &self,
        strokes: &[S],
        stickers: &[Sticker],
        images: &ImageCache,
    ) -> CoreResult<Vec<u8>> {
        image_ops::encode_png(&self.capture(strokes, stickers, images)?)
    }

    fn draw_card(&self, out: &mut Pixmap, sticker: &Sticker, images: &ImageCache) {
        let card = self.sticker_card(sticker);
        let base = self.base_sticker_size * self.fit_scale();
        let half = base / 2.0;

        let transform = Transform::from_translate(card.center.x, card.center.y)
            .pre_concat(Transform::from_rotate(card.rotation))
            .pre_scale(sticker.scale, sticker.scale);

        let shadow = base * SHADOW_OFFSET;
        let inset = base * CONTENT_INSET;
        let (Some(shadow_rect), Some(card_rect), Some(content_rect)) = (
            tiny_skia::Rect::from_xywh(-half + shadow, -half + shadow, base, base),
            tiny_skia::Rect::from_xywh(-half, -half, base, base),
            tiny_skia::Rect::from_xywh(-half + inset, -half + inset, base - inset * 2.0, base - inset * 2.0),
        ) else {
            return;
        };

        out.fill_rect(shadow_rect, &solid_paint(SHADOW_COLOR), transform, None);
        out.fill_rect(card_rect, &solid_paint(BACKGROUND), transform, None);
        out.fill_rect(content_rect, &solid_paint(CONTENT_BACKGROUND), transform, None);

        match sticker.content() {
            StickerContent::Image(path) => {
                if let Some(image) = images.get_or_load(&path) {
                    let clip = PathBuilder::from_rect(content_rect);
                    fill_center_cropped(out, &image, content_rect, &clip, transform);
                }
            }
            _ => {
                let radius = content_rect.width() * PLACEHOLDER_RADIUS;
                if let Some(circle) = PathBuilder::from_circle(0.0, 0.0, radius) {
                    out.fill_path(
                        &circle,
                        &solid_paint(PLACEHOLDER_COLOR),
                        FillRule::Winding,
                        transform,
                        None,
                    );
                }
            }
        }
    }
}
