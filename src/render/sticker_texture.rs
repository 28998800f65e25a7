//! Sticker textures - the framed photo card drawn on the canvas

use super::{fill_center_cropped, image_ops, rounded_rect_path, solid_paint};
use crate::core::CanvasConfig;
use crate::document::StickerContent;
use tiny_skia::{FillRule, Pixmap, Rect, Transform};

/// Corner radius and inner padding as fractions of the visible card
const FRAME_CORNER: f32 = 0.04;
const FRAME_PADDING: f32 = 0.04;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StickerTextureStyle {
    /// Texture edge in pixels
    pub size: u32,
    /// Fraction of the texture covered by the card
    pub content_scale: f32,
}

impl StickerTextureStyle {
    pub fn from_config(config: &CanvasConfig) -> Self {
        Self {
            size: config.sticker_texture_size,
            content_scale: config.content_scale_margin,
        }
    }
}

impl Default for StickerTextureStyle {
    fn default() -> Self {
        Self::from_config(&CanvasConfig::default())
    }
}

/// Render the texture for a sticker's content.
///
/// Only image content produces a texture; emoji, loading and empty stickers
/// return `None`, as do images that are missing or fail to decode.
pub fn generate_sticker_texture(content: &StickerContent, style: StickerTextureStyle) -> Option<Pixmap> {
    let path = content.image_path()?;
    if !path.exists() {
        tracing::debug!("Sticker image missing: {:?}", path);
        return None;
    }

    let image = match image_ops::load_downsampled(path, style.size)
        .and_then(|img| image_ops::rgba_to_pixmap(&img))
    {
        Ok(image) => image,
        Err(e) => {
            tracing::warn!("Failed to decode sticker {:?}: {}", path, e);
            return None;
        }
    };

    let size = style.size as f32;
    let visual = size * style.content_scale;
    let margin = (size - visual) / 2.0;
    let corner = visual * FRAME_CORNER;
    let pad = visual * FRAME_PADDING;

    let mut texture = Pixmap::new(style.size, style.size)?;

    let frame = Rect::from_xywh(margin, margin, visual, visual)?;
    let frame_path = rounded_rect_path(frame, corner * 2.0)?;
    texture.fill_path(
        &frame_path,
        &solid_paint(0xFFFF_FFFF),
        FillRule::Winding,
        Transform::identity(),
        None,
    );

    let content_size = visual - pad * 2.0;
    let content = Rect::from_xywh(margin + pad, margin + pad, content_size, content_size)?;
    let clip = rounded_rect_path(content, (corner - pad).max(0.0) * 2.0)?;
    fill_center_cropped(&mut texture, &image, content, &clip, Transform::identity());

    Some(texture)
}
