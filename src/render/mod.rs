//! Rendering - layer baking, snapshots, sticker textures and previews

pub mod image_ops;
mod layers;
mod preview;
mod snapshot;
mod sticker_texture;

pub use layers::{LayerManager, StickerPlacement};
pub use preview::{DayRenderData, PreviewSticker, PREVIEW_PADDING};
pub use snapshot::{SnapshotGenerator, StickerCard};
pub use sticker_texture::{generate_sticker_texture, StickerTextureStyle};

use tiny_skia::{
    FillRule, FilterQuality, Paint, Path, PathBuilder, Pattern, Pixmap, Rect, SpreadMode, Transform,
};

/// Light gray behind sticker content
pub(crate) const CONTENT_BACKGROUND: u32 = 0xFFCC_CCCC;
/// Amber placeholder for stickers without image content
pub(crate) const PLACEHOLDER_COLOR: u32 = 0xFFFF_B300;

pub(crate) fn solid_paint(argb: u32) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(crate::stroke::argb_to_color(argb));
    paint.anti_alias = true;
    paint
}

/// Rectangle with circular corners of `radius`
pub(crate) fn rounded_rect_path(rect: Rect, radius: f32) -> Option<Path> {
    let r = radius.min(rect.width() / 2.0).min(rect.height() / 2.0).max(0.0);
    if r == 0.0 {
        return Some(PathBuilder::from_rect(rect));
    }

    // Cubic approximation of a quarter circle
    let k = r * 0.552_284_8;
    let (l, t, rt, b) = (rect.left(), rect.top(), rect.right(), rect.bottom());

    let mut pb = PathBuilder::new();
    pb.move_to(l + r, t);
    pb.line_to(rt - r, t);
    pb.cubic_to(rt - r + k, t, rt, t + r - k, rt, t + r);
    pb.line_to(rt, b - r);
    pb.cubic_to(rt, b - r + k, rt - r + k, b, rt - r, b);
    pb.line_to(l + r, b);
    pb.cubic_to(l + r - k, b, l, b - r + k, l, b - r);
    pb.line_to(l, t + r);
    pb.cubic_to(l, t + r - k, l + r - k, t, l + r, t);
    pb.close();
    pb.finish()
}

/// Fill `clip` with `image` scaled to cover `dst` and centered, cropping the
/// overflow on the longer axis.
pub(crate) fn fill_center_cropped(
    target: &mut Pixmap,
    image: &Pixmap,
    dst: Rect,
    clip: &Path,
    transform: Transform,
) {
    let (w, h) = (image.width() as f32, image.height() as f32);
    if w == 0.0 || h == 0.0 {
        return;
    }

    let k = (dst.width() / w).max(dst.height() / h);
    let tx = dst.left() + (dst.width() - w * k) / 2.0;
    let ty = dst.top() + (dst.height() - h * k) / 2.0;

    let mut paint = Paint::default();
    paint.anti_alias = true;
    paint.shader = Pattern::new(
        image.as_ref(),
        SpreadMode::Pad,
        FilterQuality::Bilinear,
        1.0,
        Transform::from_translate(tx, ty).pre_scale(k, k),
    );
    target.fill_path(clip, &paint, FillRule::Winding, transform, None);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rounded_rect_bounds() {
        let rect = Rect::from_xywh(10.0, 20.0, 100.0, 50.0).unwrap();
        let path = rounded_rect_path(rect, 8.0).unwrap();
        let b = path.bounds();
        assert_eq!((b.left(), b.top(), b.right(), b.bottom()), (10.0, 20.0, 110.0, 70.0));
    }

    #[test]
    fn test_center_crop_uses_middle_of_wide_image() {
        // Left third red, middle blue, right third red
        let mut image = Pixmap::new(30, 10).unwrap();
        image.fill(tiny_skia::Color::from_rgba8(255, 0, 0, 255));
        let blue = solid_paint(0xFF00_00FF);
        image.fill_rect(
            Rect::from_xywh(10.0, 0.0, 10.0, 10.0).unwrap(),
            &blue,
            Transform::identity(),
            None,
        );

        let mut target = Pixmap::new(20, 20).unwrap();
        let dst = Rect::from_xywh(0.0, 0.0, 20.0, 20.0).unwrap();
        fill_center_cropped(&mut target, &image, dst, &PathBuilder::from_rect(dst), Transform::identity());

        let middle = target.pixel(10, 10).unwrap();
        assert!(middle.blue() > 200 && middle.red() < 50);
    }
}
