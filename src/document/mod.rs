//! Document - the stroke list, the sticker list and the layer rasters of one page
//!
//! The stroke list is the source of truth. Layer buffers and the spatial index
//! are derived from it: appends are baked and indexed incrementally, every
//! destructive edit (segment erase, undo, redo, clear, load) rebuilds both.

mod background;
mod history;
mod sticker;
mod tools;

pub use background::BackgroundCanvasStore;
pub use history::{StrokeHistory, MAX_HISTORY};
pub use sticker::{
    deserialize_stickers, normalized_base_size, serialize_stickers,
    PlaceholderIds, Sticker, StickerContent, StickerGesture, StickerTransform, DROP_POSITION,
    EMOJI_PREFIX, LOADING_SENTINEL, MAX_SCALE, MIN_SCALE,
};
pub use tools::{BrushState, Tool, ERASER_WIDTH, MARKER_ALPHA, PEN_COLOR, SEGMENT_TRAIL_WIDTH};

use crate::cache::{ImageCache, StickerTextureCache};
use crate::core::config::LAYER_COUNT;
use crate::core::{CanvasConfig, CoreError, CoreResult};
use crate::geometry::Point;
use crate::input::StrokeEngine;
use crate::render::{LayerManager, SnapshotGenerator, StickerPlacement};
use crate::spatial::{find_erased, QuadTree, SpatialIndex};
use crate::stroke::{deserialize_strokes, serialize_strokes, Stroke, StrokeRef};
use tiny_skia::{Pixmap, PixmapPaint, Transform};

/// What finishing a pointer gesture did to the document
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    Committed(StrokeRef),
    /// Number of strokes removed by the segment eraser
    Erased(usize),
    Ignored,
}

pub struct Document {
    entry_id: i64,
    config: CanvasConfig,
    strokes: Vec<StrokeRef>,
    stickers: Vec<Sticker>,
    layers: LayerManager,
    index: Box<dyn SpatialIndex>,
    history: StrokeHistory,
    placeholder_ids: PlaceholderIds,
    gesture: Option<StickerGesture>,
}

impl Document {
    pub fn new(entry_id: i64, config: &CanvasConfig) -> CoreResult<Self> {
        Self::with_index(entry_id, config, Box::new(QuadTree::from_config(config)))
    }

    /// Document backed by a caller-chosen spatial index
    pub fn with_index(
        entry_id: i64,
        config: &CanvasConfig,
        index: Box<dyn SpatialIndex>,
    ) -> CoreResult<Self> {
        Ok(Self {
            entry_id,
            config: config.clone(),
            strokes: Vec::new(),
            stickers: Vec::new(),
            layers: LayerManager::with_config(config)?,
            index,
            history: StrokeHistory::default(),
            placeholder_ids: PlaceholderIds::new(),
            gesture: None,
        })
    }

    pub fn entry_id(&self) -> i64 {
        self.entry_id
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn strokes(&self) -> &[StrokeRef] {
        &self.strokes
    }

    pub fn stickers(&self) -> &[Sticker] {
        &self.stickers
    }

    pub fn layers(&self) -> &LayerManager {
        &self.layers
    }

    pub(crate) fn layers_mut(&mut self) -> &mut LayerManager {
        &mut self.layers
    }

    pub fn index(&self) -> &dyn SpatialIndex {
        self.index.as_ref()
    }

    pub fn history(&self) -> &StrokeHistory {
        &self.history
    }

    /// Replace the whole content, rebaking and reindexing.
    ///
    /// History is reset; loading is not undoable.
    pub fn load(&mut self, strokes: Vec<Stroke>, stickers: Vec<Sticker>) {
        self.strokes = strokes.into_iter().map(Stroke::into_ref).collect();
        self.stickers = stickers.into_iter().map(Sticker::normalized).collect();
        self.history.clear();
        self.gesture = None;
        self.rebuild();
        tracing::info!(
            "Loaded entry {}: {} strokes, {} stickers",
            self.entry_id,
            self.strokes.len(),
            self.stickers.len()
        );
    }

    /// Install content whose layers were already baked off-thread.
    ///
    /// Falls back to a local rebake when the rasters have a different size.
    pub fn load_baked(&mut self, strokes: Vec<StrokeRef>, stickers: Vec<Sticker>, layers: LayerManager) {
        self.strokes = strokes;
        self.stickers = stickers.into_iter().map(Sticker::normalized).collect();
        self.history.clear();
        self.gesture = None;
        if layers.buffer_dim() == self.layers.buffer_dim() {
            self.layers = layers;
        } else {
            tracing::warn!(
                "Prebaked layers are {}px, expected {}px; rebaking",
                layers.buffer_dim(),
                self.layers.buffer_dim()
            );
            self.layers.restore_from_paths(&self.strokes);
        }
        self.index.rebuild(&self.strokes);
    }

    /// Load from the stroke wire format; malformed data yields an empty page
    pub fn load_serialized(&mut self, stroke_data: &str, stickers: Vec<Sticker>) {
        self.load(deserialize_strokes(stroke_data), stickers);
    }

    pub fn serialize_strokes(&self) -> String {
        serialize_strokes(&self.strokes)
    }

    // === Strokes ===

    /// Append a stroke: bake it, index it, record history
    pub fn commit_stroke(&mut self, stroke: Stroke) -> StrokeRef {
        let stroke = stroke.into_ref();
        self.history.commit(self.strokes.clone());
        self.layers.bake(&stroke);
        self.index.insert(StrokeRef::clone(&stroke));
        self.strokes.push(StrokeRef::clone(&stroke));
        stroke
    }

    /// Remove every stroke on `layer` crossed by `trail` and rebuild the layers.
    ///
    /// Returns the number of strokes removed; a miss leaves history untouched.
    pub fn erase_segments(&mut self, trail: &[Point], layer: usize) -> usize {
        let erased = find_erased(self.index.as_ref(), trail, layer, self.config.eraser_tolerance);
        if erased.is_empty() {
            return 0;
        }

        self.history.commit(self.strokes.clone());
        for stroke in &erased {
            self.index.remove(stroke);
        }
        self.strokes
            .retain(|s| !erased.iter().any(|e| StrokeRef::ptr_eq(s, e)));
        self.layers.restore_from_paths(&self.strokes);

        tracing::debug!(
            "Erased {} strokes, {} remain",
            erased.len(),
            self.strokes.len()
        );
        erased.len()
    }

    /// Turn the engine's finished samples into an edit according to the brush.
    ///
    /// The engine is cleared either way.
    pub fn finish_gesture(&mut self, engine: &mut StrokeEngine, brush: &BrushState) -> GestureOutcome {
        let (_, samples) = engine.finalize();
        engine.clear();
        let points: Vec<Point> = samples.iter().map(|s| s.position()).collect();

        match brush.tool {
            Tool::SegmentEraser => {
                if points.len() < 2 {
                    return GestureOutcome::Ignored;
                }
                GestureOutcome::Erased(self.erase_segments(&points, brush.layer()))
            }
            Tool::Pen | Tool::Eraser => {
                match Stroke::new(
                    points,
                    brush.stroke_color(),
                    brush.stroke_width(),
                    brush.is_eraser(),
                    brush.layer as i32,
                ) {
                    Some(stroke) => GestureOutcome::Committed(self.commit_stroke(stroke)),
                    None => GestureOutcome::Ignored,
                }
            }
        }
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo(self.strokes.clone()) {
            Some(previous) => {
                self.strokes = previous;
                self.rebuild();
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(self.strokes.clone()) {
            Some(next) => {
                self.strokes = next;
                self.rebuild();
                true
            }
            None => false,
        }
    }

    /// Remove all strokes (undoable)
    pub fn clear_strokes(&mut self) {
        if self.strokes.is_empty() {
            return;
        }
        self.history.commit(std::mem::take(&mut self.strokes));
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.layers.restore_from_paths(&self.strokes);
        self.index.rebuild(&self.strokes);
    }

    // === Stickers ===

    pub fn sticker(&self, id: i64) -> Option<&Sticker> {
        self.stickers.iter().find(|s| s.id == id)
    }

    /// Add an emoji at the drop position; returns its placeholder id
    pub fn add_emoji_sticker(&mut self, glyph: &str, layer: i32) -> i64 {
        let id = self.placeholder_ids.allocate();
        self.stickers.push(Sticker::emoji(id, self.entry_id, glyph, layer));
        id
    }

    /// Add an image sticker whose import is still running
    pub fn add_loading_sticker(&mut self, layer: i32) -> i64 {
        let id = self.placeholder_ids.allocate();
        self.stickers
            .push(Sticker::image(id, self.entry_id, LOADING_SENTINEL, layer));
        id
    }

    /// Point a loading sticker at its imported file
    pub fn resolve_loading_sticker(&mut self, id: i64, path: &str) -> bool {
        match self.stickers.iter_mut().find(|s| s.id == id && s.is_loading()) {
            Some(sticker) => {
                sticker.content_path = path.to_string();
                true
            }
            None => false,
        }
    }

    /// Replace a placeholder id with the id assigned by the store
    pub fn assign_sticker_id(&mut self, placeholder: i64, id: i64) -> bool {
        match self.stickers.iter_mut().find(|s| s.id == placeholder) {
            Some(sticker) => {
                sticker.id = id;
                true
            }
            None => false,
        }
    }

    pub fn remove_sticker(&mut self, id: i64) -> Option<Sticker> {
        let position = self.stickers.iter().position(|s| s.id == id)?;
        if self.gesture.as_ref().is_some_and(|g| g.sticker_id() == id) {
            self.gesture = None;
        }
        Some(self.stickers.remove(position))
    }

    /// Topmost sticker under `point`: higher layers first, later stickers
    /// above earlier ones on the same layer.
    pub fn sticker_at(&self, point: Point) -> Option<i64> {
        let base = self.config.base_sticker_size_normalized();
        (0..LAYER_COUNT).rev().find_map(|layer| {
            self.stickers
                .iter()
                .rev()
                .filter(|s| s.layer() == layer)
                .find(|s| s.contains(point, base))
                .map(|s| s.id)
        })
    }

    pub fn begin_sticker_gesture(&mut self, id: i64) -> bool {
        match self.sticker(id) {
            Some(sticker) => {
                self.gesture = Some(StickerGesture::begin(sticker));
                true
            }
            None => false,
        }
    }

    /// Accumulate one frame; the sticker itself is not modified yet
    pub fn update_sticker_gesture(&mut self, pan: Point, zoom: f32, rotation_delta: f32) {
        if let Some(gesture) = self.gesture.as_mut() {
            gesture.update(pan, zoom, rotation_delta);
        }
    }

    pub fn sticker_gesture(&self) -> Option<&StickerGesture> {
        self.gesture.as_ref()
    }

    /// Commit the in-flight gesture to its sticker
    pub fn end_sticker_gesture(&mut self) -> Option<StickerTransform> {
        let gesture = self.gesture.take()?;
        let id = gesture.sticker_id();
        let transform = gesture.finish();

        let sticker = self.stickers.iter_mut().find(|s| s.id == id)?;
        sticker.x = transform.position.x;
        sticker.y = transform.position.y;
        sticker.scale = transform.scale;
        sticker.rotation = transform.rotation;
        Some(transform)
    }

    pub fn cancel_sticker_gesture(&mut self) {
        self.gesture = None;
    }

    // === Rendering ===

    fn placement(&self, sticker: &Sticker) -> StickerPlacement {
        let base = self.config.base_sticker_size_normalized();
        let (center, scale, rotation) = match &self.gesture {
            Some(g) if g.sticker_id() == sticker.id => {
                let pos = g.position();
                (Point::new(pos.x + base / 2.0, pos.y + base / 2.0), g.scale(), g.rotation())
            }
            _ => (sticker.center(base), sticker.scale, sticker.rotation),
        };
        StickerPlacement {
            center,
            size: base,
            rotation,
            scale,
        }
    }

    /// Layers and sticker textures flattened bottom to top at buffer size.
    ///
    /// A sticker mid-gesture is drawn at its in-flight transform.
    pub fn render_composite(&self, textures: &StickerTextureCache) -> CoreResult<Pixmap> {
        let dim = self.layers.buffer_dim();
        let mut out = Pixmap::new(dim, dim)
            .ok_or_else(|| CoreError::Raster("cannot allocate composite".into()))?;

        for (layer, buffer) in self.layers.layers().iter().enumerate() {
            out.draw_pixmap(0, 0, buffer.as_ref(), &PixmapPaint::default(), Transform::identity(), None);
            for sticker in self.stickers.iter().filter(|s| s.layer() == layer) {
                if let Some(texture) = textures.get_or_generate(&sticker.content()) {
                    self.layers
                        .bake_sticker(&mut out, Transform::identity(), &texture, self.placement(sticker));
                }
            }
        }
        Ok(out)
    }

    /// White-backed thumbnail at buffer size with edge padding
    pub fn padded_thumbnail(&self, textures: &StickerTextureCache) -> CoreResult<Pixmap> {
        self.layers
            .generate_padded_thumbnail(&self.strokes, |target, transform, layer| {
                for sticker in self.stickers.iter().filter(|s| s.layer() == layer) {
                    if sticker.is_loading() {
                        continue;
                    }
                    if let Some(texture) = textures.get_or_generate(&sticker.content()) {
                        self.layers
                            .bake_sticker(target, transform, &texture, self.placement(sticker));
                    }
                }
            })
    }

    /// Persistable snapshot rendered from the document data
    pub fn snapshot(&self, generator: &SnapshotGenerator, images: &ImageCache) -> CoreResult<Pixmap> {
        generator.capture(&self.strokes, &self.stickers, images)
    }
}
