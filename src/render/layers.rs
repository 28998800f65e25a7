//! Layer manager - fixed-resolution rasters holding baked ink
//!
//! Each layer is a square premultiplied pixmap. Committed strokes are baked in
//! permanently; destructive edits clear the layers and replay the stroke list.

use rayon::prelude::*;
use tiny_skia::{
    FilterQuality, LineCap, LineJoin, Paint, Pixmap, PixmapPaint, Stroke as SkStroke, Transform,
};

use super::image_ops;
use crate::core::config::{LAYER_COUNT, LEGACY_PAGE_SIZE};
use crate::core::{CanvasConfig, CoreError, CoreResult};
use crate::geometry::Point;
use crate::stroke::{argb_to_color, clamp_layer, BlendMode, SmoothPath, Stroke};
use std::path::Path;

/// Where and how large a sticker texture is drawn, in normalized space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StickerPlacement {
    pub center: Point,
    /// Visible edge length in normalized units
    pub size: f32,
    /// Degrees, clockwise
    pub rotation: f32,
    pub scale: f32,
}

pub struct LayerManager {
    buffers: Vec<Pixmap>,
    dim: u32,
    content_margin: f32,
    padding_scale: f32,
}

impl std::fmt::Debug for LayerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerManager")
            .field("layers", &self.buffers.len())
            .field("dim", &self.dim)
            .finish()
    }
}

impl LayerManager {
    pub fn new(buffer_dim: u32) -> CoreResult<Self> {
        Self::with_config(&CanvasConfig {
            buffer_dim,
            ..CanvasConfig::default()
        })
    }

    pub fn with_config(config: &CanvasConfig) -> CoreResult<Self> {
        let dim = config.buffer_dim;
        let buffers = (0..LAYER_COUNT)
            .map(|_| {
                Pixmap::new(dim, dim)
                    .ok_or_else(|| CoreError::Raster(format!("cannot allocate {dim}x{dim} layer")))
            })
            .collect::<CoreResult<Vec<_>>>()?;

        tracing::debug!("Allocated {} layers at {}px", LAYER_COUNT, dim);
        Ok(Self {
            buffers,
            dim,
            content_margin: config.content_scale_margin,
            padding_scale: config.thumbnail_padding_scale,
        })
    }

    pub fn buffer_dim(&self) -> u32 {
        self.dim
    }

    /// Pixels per normalized unit
    pub fn buffer_scale(&self) -> f32 {
        self.dim as f32
    }

    pub fn layer(&self, index: usize) -> Option<&Pixmap> {
        self.buffers.get(index)
    }

    pub fn layers(&self) -> &[Pixmap] {
        &self.buffers
    }

    /// Permanently draw a path into a layer.
    ///
    /// `width` is in per-mille page units; `layer` is clamped to the valid range.
    pub fn bake_stroke(
        &mut self,
        path: &SmoothPath,
        width: f32,
        color: u32,
        blend: BlendMode,
        layer: i32,
    ) {
        let dim = self.dim as f32;
        let target = &mut self.buffers[clamp_layer(layer) as usize];
        stroke_into(target, path, dim, width * (dim / LEGACY_PAGE_SIZE), color, blend, Transform::identity());
    }

    /// Bake a committed stroke using its own smoothed path
    pub fn bake(&mut self, stroke: &Stroke) {
        self.bake_stroke(
            stroke.path(),
            stroke.width(),
            stroke.color(),
            stroke.blend_mode(),
            stroke.layer() as i32,
        );
    }

    pub fn clear_all(&mut self) {
        for buffer in &mut self.buffers {
            buffer.fill(tiny_skia::Color::TRANSPARENT);
        }
    }

    /// Clear and replay `strokes` in list order.
    ///
    /// Layers do not interact, so each one is rebuilt on its own rayon task.
    pub fn restore_from_paths<S: AsRef<Stroke> + Sync>(&mut self, strokes: &[S]) {
        let dim = self.dim as f32;
        let width_scale = dim / LEGACY_PAGE_SIZE;

        self.buffers
            .par_iter_mut()
            .enumerate()
            .for_each(|(index, buffer)| {
                buffer.fill(tiny_skia::Color::TRANSPARENT);
                for stroke in strokes.iter().map(AsRef::as_ref).filter(|s| s.layer() == index) {
                    stroke_into(
                        buffer,
                        stroke.path(),
                        dim,
                        stroke.width() * width_scale,
                        stroke.color(),
                        stroke.blend_mode(),
                        Transform::identity(),
                    );
                }
            });

        tracing::debug!("Restored {} strokes into {} layers", strokes.len(), LAYER_COUNT);
    }

    /// Draw a sticker texture centered at `placement.center`.
    ///
    /// The texture carries a shadow margin, so its drawn edge is
    /// `size / content_margin` to keep the visible card at `size`.
    pub fn bake_sticker(
        &self,
        target: &mut Pixmap,
        base: Transform,
        image: &Pixmap,
        placement: StickerPlacement,
    ) {
        let dim = self.dim as f32;
        let edge = placement.size / self.content_margin * dim * placement.scale;
        if edge <= 0.0 || image.width() == 0 || image.height() == 0 {
            return;
        }
        let half = edge / 2.0;

        let transform = base
            .pre_translate(placement.center.x * dim, placement.center.y * dim)
            .pre_concat(Transform::from_rotate(placement.rotation))
            .pre_translate(-half, -half)
            .pre_scale(edge / image.width() as f32, edge / image.height() as f32);

        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        target.draw_pixmap(0, 0, image.as_ref(), &paint, transform, None);
    }

    /// Render all layers onto white, shrunk about the center so edge content
    /// stays inside the frame.
    ///
    /// `draw_stickers` is called once per layer, after that layer's strokes,
    /// with the padding transform the stickers must be drawn under.
    pub fn generate_padded_thumbnail<S, F>(&self, strokes: &[S], mut draw_stickers: F) -> CoreResult<Pixmap>
    where
        S: AsRef<Stroke>,
        F: FnMut(&mut Pixmap, Transform, usize),
    {
        let mut out = Pixmap::new(self.dim, self.dim)
            .ok_or_else(|| CoreError::Raster("cannot allocate thumbnail".into()))?;
        out.fill(tiny_skia::Color::WHITE);

        let dim = self.dim as f32;
        let c = dim / 2.0;
        let padding = Transform::from_translate(c, c)
            .pre_scale(self.padding_scale, self.padding_scale)
            .pre_translate(-c, -c);

        for layer in 0..LAYER_COUNT {
            for stroke in strokes
                .iter()
                .map(AsRef::as_ref)
                .filter(|s| s.layer() == layer && !s.is_eraser())
            {
                stroke_into(
                    &mut out,
                    stroke.path(),
                    dim,
                    stroke.width() * (dim / LEGACY_PAGE_SIZE),
                    stroke.color(),
                    BlendMode::Normal,
                    padding,
                );
            }
            draw_stickers(&mut out, padding, layer);
        }

        Ok(out)
    }

    /// All layers blended bottom to top over transparency
    pub fn composite(&self) -> CoreResult<Pixmap> {
        let mut out = Pixmap::new(self.dim, self.dim)
            .ok_or_else(|| CoreError::Raster("cannot allocate composite".into()))?;
        for buffer in &self.buffers {
            out.draw_pixmap(0, 0, buffer.as_ref(), &PixmapPaint::default(), Transform::identity(), None);
        }
        Ok(out)
    }

    pub fn save_layer_png(&self, index: usize, path: &Path) -> CoreResult<()> {
        let buffer = self
            .buffers
            .get(index)
            .ok_or_else(|| CoreError::InvalidInput(format!("no layer {index}")))?;
        image_ops::write_png(buffer, path)
    }

    /// Replace a layer with a decoded PNG, scaled to the buffer size
    pub fn load_layer_png(&mut self, index: usize, path: &Path) -> CoreResult<()> {
        let dim = self.dim;
        let image = image_ops::decode_pixmap(path)?;
        let buffer = self
            .buffers
            .get_mut(index)
            .ok_or_else(|| CoreError::InvalidInput(format!("no layer {index}")))?;

        buffer.fill(tiny_skia::Color::TRANSPARENT);
        let transform = Transform::from_scale(
            dim as f32 / image.width() as f32,
            dim as f32 / image.height() as f32,
        );
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        buffer.draw_pixmap(0, 0, image.as_ref(), &paint, transform, None);
        Ok(())
    }
}

/// Stroke a normalized path with round caps and joins.
///
/// `scale` maps normalized coordinates to target pixels; `width_px` is already
/// in target pixels before `transform`.
pub(crate) fn stroke_into(
    target: &mut Pixmap,
    path: &SmoothPath,
    scale: f32,
    width_px: f32,
    color: u32,
    blend: BlendMode,
    transform: Transform,
) {
    let Some(path) = path.to_skia(scale) else {
        return;
    };

    let mut paint = Paint::default();
    paint.set_color(argb_to_color(color));
    paint.anti_alias = true;
    paint.blend_mode = blend.to_skia();

    let stroke = SkStroke {
        width: width_px,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..SkStroke::default()
    };
    target.stroke_path(&path, &paint, &stroke, transform, None);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::stroke::{StrokeRef, DEFAULT_COLOR};

    const DIM: u32 = 200;

    fn stroke(points: &[(f32, f32)], width: f32, is_eraser: bool, layer: i32) -> StrokeRef {
        Stroke::new(
            points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
            if is_eraser { 0 } else { DEFAULT_COLOR },
            width,
            is_eraser,
            layer,
        )
        .unwrap()
        .into_ref()
    }

    fn alpha_at(pixmap: &Pixmap, x: u32, y: u32) -> u8 {
        pixmap.pixel(x, y).unwrap().alpha()
    }

    fn is_transparent(pixmap: &Pixmap) -> bool {
        pixmap.pixels().iter().all(|p| p.alpha() == 0)
    }

    #[test]
    fn test_bake_stroke_marks_layer() {
        let mut layers = LayerManager::new(DIM).unwrap();
        let s = stroke(&[(0.1, 0.5), (0.5, 0.5), (0.9, 0.5)], 20.0, false, 1);
        layers.bake(&s);

        assert_eq!(alpha_at(layers.layer(1).unwrap(), 100, 100), 255);
        assert!(is_transparent(layers.layer(0).unwrap()));
        assert!(is_transparent(layers.layer(2).unwrap()));
    }

    #[test]
    fn test_bake_clamps_layer() {
        let mut layers = LayerManager::new(DIM).unwrap();
        let s = stroke(&[(0.1, 0.5), (0.9, 0.5)], 20.0, false, 1);
        layers.bake_stroke(s.path(), 20.0, DEFAULT_COLOR, BlendMode::Normal, 9);
        assert_eq!(alpha_at(layers.layer(2).unwrap(), 100, 100), 255);
    }

    #[test]
    fn test_restore_empty_is_transparent() {
        let mut layers = LayerManager::new(DIM).unwrap();
        layers.bake(&stroke(&[(0.1, 0.1), (0.9, 0.9)], 30.0, false, 0));
        layers.bake(&stroke(&[(0.1, 0.9), (0.9, 0.1)], 30.0, false, 2));

        let none: Vec<StrokeRef> = Vec::new();
        layers.restore_from_paths(&none);
        assert!(layers.layers().iter().all(is_transparent));
    }

    #[test]
    fn test_restore_is_idempotent() {
        let strokes = vec![
            stroke(&[(0.1, 0.1), (0.4, 0.3), (0.8, 0.2)], 12.0, false, 1),
            stroke(&[(0.2, 0.6), (0.6, 0.9)], 8.0, false, 0),
            stroke(&[(0.3, 0.2), (0.5, 0.2)], 30.0, true, 1),
        ];

        let mut layers = LayerManager::new(DIM).unwrap();
        layers.restore_from_paths(&strokes);
        let first: Vec<Vec<u8>> = layers.layers().iter().map(|p| p.data().to_vec()).collect();

        layers.restore_from_paths(&strokes);
        let second: Vec<Vec<u8>> = layers.layers().iter().map(|p| p.data().to_vec()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_live_bake_matches_replay() {
        let strokes = vec![
            stroke(&[(0.1, 0.1), (0.4, 0.3), (0.8, 0.2), (0.7, 0.7)], 12.0, false, 1),
            stroke(&[(0.5, 0.5)], 8.0, false, 1),
            stroke(&[(0.2, 0.6), (0.6, 0.9)], 8.0, false, 2),
            stroke(&[(0.3, 0.2), (0.5, 0.2), (0.5, 0.4)], 30.0, true, 1),
        ];

        let mut live = LayerManager::new(DIM).unwrap();
        for s in &strokes {
            live.bake(s);
        }
        let mut replayed = LayerManager::new(DIM).unwrap();
        replayed.restore_from_paths(&strokes);

        for (a, b) in live.layers().iter().zip(replayed.layers()) {
            assert_eq!(a.data(), b.data());
        }
    }

    #[test]
    fn test_eraser_clears_pixels() {
        let mut layers = LayerManager::new(DIM).unwrap();
        layers.bake(&stroke(&[(0.1, 0.5), (0.9, 0.5)], 20.0, false, 1));
        layers.bake(&stroke(&[(0.5, 0.1), (0.5, 0.9)], 40.0, true, 1));

        assert_eq!(alpha_at(layers.layer(1).unwrap(), 100, 100), 0);
        assert_eq!(alpha_at(layers.layer(1).unwrap(), 30, 100), 255);
    }

    #[test]
    fn test_padded_thumbnail_shrinks_toward_center() {
        let layers = LayerManager::new(DIM).unwrap();
        // Vertical line at the very left edge
        let strokes = vec![
            stroke(&[(0.0, 0.0), (0.0, 1.0)], 50.0, false, 1),
            stroke(&[(0.5, 0.0), (0.5, 1.0)], 10.0, true, 1),
        ];
        let mut calls = Vec::new();
        let thumb = layers
            .generate_padded_thumbnail(&strokes, |_, _, layer| calls.push(layer))
            .unwrap();

        assert_eq!(calls, vec![0, 1, 2]);
        // Left edge moves to 10% of the width; the eraser stroke is not drawn
        let edge = thumb.pixel(10, 100).unwrap();
        assert!(edge.red() < 50);
        let center = thumb.pixel(100, 100).unwrap();
        assert_eq!(center.red(), 255);
        let corner = thumb.pixel(2, 2).unwrap();
        assert_eq!((corner.red(), corner.alpha()), (255, 255));
    }

    #[test]
    fn test_bake_sticker_centered() {
        let layers = LayerManager::new(DIM).unwrap();
        let mut target = Pixmap::new(DIM, DIM).unwrap();
        let mut image = Pixmap::new(16, 16).unwrap();
        image.fill(tiny_skia::Color::from_rgba8(0, 0, 255, 255));

        layers.bake_sticker(
            &mut target,
            Transform::identity(),
            &image,
            StickerPlacement {
                center: Point::new(0.5, 0.5),
                size: 0.09,
                rotation: 45.0,
                scale: 1.0,
            },
        );

        // Drawn edge = 0.09 / 0.9 * 200 = 20px around the center
        assert!(target.pixel(100, 100).unwrap().blue() > 250);
        assert_eq!(target.pixel(150, 150).unwrap().alpha(), 0);
    }

    #[test]
    fn test_layer_png_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layer_1.png");

        let mut layers = LayerManager::new(DIM).unwrap();
        layers.bake(&stroke(&[(0.1, 0.5), (0.9, 0.5)], 20.0, false, 1));
        layers.save_layer_png(1, &path).unwrap();

        let mut restored = LayerManager::new(DIM).unwrap();
        restored.load_layer_png(1, &path).unwrap();
        assert_eq!(alpha_at(restored.layer(1).unwrap(), 100, 100), 255);
        assert!(restored.load_layer_png(5, &path).is_err());
    }
}
