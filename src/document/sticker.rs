//! Stickers - placed photos and emoji on the page

use crate::core::config::{DEFAULT_LAYER, LEGACY_PAGE_SIZE};
use crate::geometry::{normalize_legacy_position, Point, Rect};
use crate::stroke::{clamp_layer, codec::format_float};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};

/// Content path of an image sticker whose import has not finished
pub const LOADING_SENTINEL: &str = "LOADING";
pub const EMOJI_PREFIX: &str = "emoji:";

pub const MIN_SCALE: f32 = 0.1;
pub const MAX_SCALE: f32 = 10.0;

/// Normalized top-left where new stickers are dropped
pub const DROP_POSITION: Point = Point::new(0.425, 0.425);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sticker {
    /// Negative until persisted
    pub id: i64,
    pub entry_id: i64,
    /// Top-left of the unrotated base box, normalized
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    /// Degrees
    pub rotation: f32,
    pub content_path: String,
    /// Free-form type tag ("image", "emoji", ...)
    #[serde(rename = "type")]
    pub kind: String,
    pub layer: u8,
}

/// What a sticker's content path refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StickerContent {
    Empty,
    Loading,
    Emoji(String),
    Image(PathBuf),
}

impl StickerContent {
    /// Classify a stored content path.
    ///
    /// Short text without path separators is treated as an emoji even without
    /// the `emoji:` prefix.
    pub fn classify(path: &str) -> Self {
        if path.is_empty() {
            return StickerContent::Empty;
        }
        if path == LOADING_SENTINEL {
            return StickerContent::Loading;
        }
        if let Some(glyph) = path.strip_prefix(EMOJI_PREFIX) {
            return StickerContent::Emoji(glyph.to_string());
        }
        if path.chars().count() < 10 && !path.contains('/') && !path.contains('\\') {
            return StickerContent::Emoji(path.to_string());
        }
        StickerContent::Image(PathBuf::from(path))
    }

    pub fn image_path(&self) -> Option<&Path> {
        match self {
            StickerContent::Image(path) => Some(path),
            _ => None,
        }
    }
}

impl Sticker {
    pub fn new(id: i64, entry_id: i64, position: Point, content_path: impl Into<String>, kind: impl Into<String>, layer: i32) -> Self {
        Self {
            id,
            entry_id,
            x: position.x,
            y: position.y,
            scale: 1.0,
            rotation: 0.0,
            content_path: content_path.into(),
            kind: kind.into(),
            layer: clamp_layer(layer),
        }
    }

    /// Rescale a legacy page-unit position into normalized space
    pub fn normalized(mut self) -> Self {
        let (x, y) = normalize_legacy_position(self.x, self.y);
        self.x = x;
        self.y = y;
        self
    }

    /// Emoji sticker at the drop position
    pub fn emoji(id: i64, entry_id: i64, glyph: &str, layer: i32) -> Self {
        Self::new(id, entry_id, DROP_POSITION, format!("{EMOJI_PREFIX}{glyph}"), "emoji", layer)
    }

    /// Image sticker at the drop position; `path` may be [`LOADING_SENTINEL`]
    pub fn image(id: i64, entry_id: i64, path: &str, layer: i32) -> Self {
        Self::new(id, entry_id, DROP_POSITION, path, "image", layer)
    }

    pub fn content(&self) -> StickerContent {
        StickerContent::classify(&self.content_path)
    }

    pub fn is_loading(&self) -> bool {
        self.content_path == LOADING_SENTINEL
    }

    pub fn is_placeholder(&self) -> bool {
        self.id < 0
    }

    pub fn layer(&self) -> usize {
        self.layer as usize
    }

    /// Center of the base box for a given base edge length
    pub fn center(&self, base_size: f32) -> Point {
        Point::new(self.x + base_size / 2.0, self.y + base_size / 2.0)
    }

    /// Axis-aligned bounds of the scaled and rotated base box
    pub fn bounds(&self, base_size: f32) -> Rect {
        let pivot = self.center(base_size);
        let half = base_size / 2.0 * self.scale;
        let (sin, cos) = self.rotation.to_radians().sin_cos();

        let corners = [(-half, -half), (half, -half), (half, half), (-half, half)];
        let points: Vec<Point> = corners
            .iter()
            .map(|&(dx, dy)| Point::new(pivot.x + dx * cos - dy * sin, pivot.y + dx * sin + dy * cos))
            .collect();
        Rect::bounding(&points)
    }

    /// Axis-aligned hit test against the rotated bounds
    pub fn contains(&self, point: Point, base_size: f32) -> bool {
        self.bounds(base_size).contains(point)
    }
}

/// Hands out negative ids for stickers not yet persisted
#[derive(Debug)]
pub struct PlaceholderIds {
    next: AtomicI64,
}

impl PlaceholderIds {
    pub fn new() -> Self {
        Self {
            next: AtomicI64::new(-1),
        }
    }

    pub fn allocate(&self) -> i64 {
        self.next.fetch_sub(1, Ordering::Relaxed)
    }
}

impl Default for PlaceholderIds {
    fn default() -> Self {
        Self::new()
    }
}

/// Ephemeral transform applied while a sticker is being dragged, pinched or
/// rotated. Nothing reaches the document until [`StickerGesture::finish`].
#[derive(Debug, Clone, PartialEq)]
pub struct StickerGesture {
    sticker_id: i64,
    origin: Point,
    offset: Point,
    scale: f32,
    rotation: f32,
}

impl StickerGesture {
    pub fn begin(sticker: &Sticker) -> Self {
        Self {
            sticker_id: sticker.id,
            origin: Point::new(sticker.x, sticker.y),
            offset: Point::ZERO,
            scale: sticker.scale,
            rotation: sticker.rotation,
        }
    }

    pub fn sticker_id(&self) -> i64 {
        self.sticker_id
    }

    /// Accumulate one gesture frame (normalized pan, zoom factor, degrees)
    pub fn update(&mut self, pan: Point, zoom: f32, rotation_delta: f32) {
        self.offset = self.offset + pan;
        self.scale = (self.scale * zoom).clamp(MIN_SCALE, MAX_SCALE);
        self.rotation += rotation_delta;
    }

    /// Position shown while the gesture is in flight
    pub fn position(&self) -> Point {
        self.origin + self.offset
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Final transform: position, scale, rotation
    pub fn finish(self) -> StickerTransform {
        StickerTransform {
            position: self.position(),
            scale: self.scale,
            rotation: self.rotation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StickerTransform {
    pub position: Point,
    pub scale: f32,
    pub rotation: f32,
}

/// Write stickers in the `#`/`|` separated 9-field record format
pub fn serialize_stickers(stickers: &[Sticker]) -> String {
    stickers
        .iter()
        .map(|s| {
            format!(
                "{}|{}|{}|{}|{}|{}|{}|{}|{}",
                s.id,
                s.entry_id,
                format_float(s.x),
                format_float(s.y),
                format_float(s.scale),
                format_float(s.rotation),
                s.content_path,
                s.kind,
                s.layer
            )
        })
        .collect::<Vec<_>>()
        .join("#")
}

/// Parse the 9-field record format; short or unparseable records are dropped.
pub fn deserialize_stickers(data: &str) -> Vec<Sticker> {
    data.split('#')
        .filter(|record| !record.trim().is_empty())
        .filter_map(|record| {
            let sticker = parse_sticker(record);
            if sticker.is_none() {
                tracing::debug!("Dropping sticker record {:?}", record);
            }
            sticker
        })
        .collect()
}

fn parse_sticker(record: &str) -> Option<Sticker> {
    let fields: Vec<&str> = record.split('|').collect();
    if fields.len() < 9 {
        return None;
    }

    let raw_x = fields[2].trim().parse::<f32>().ok()?;
    let raw_y = fields[3].trim().parse::<f32>().ok()?;
    let (x, y) = normalize_legacy_position(raw_x, raw_y);

    Some(Sticker {
        id: fields[0].trim().parse().ok()?,
        entry_id: fields[1].trim().parse().ok()?,
        x,
        y,
        scale: fields[4].trim().parse().ok()?,
        rotation: fields[5].trim().parse().ok()?,
        content_path: fields[6].to_string(),
        kind: fields[7].to_string(),
        layer: fields[8]
            .trim()
            .parse::<i32>()
            .map(clamp_layer)
            .unwrap_or(DEFAULT_LAYER),
    })
}

/// Base sticker edge in normalized units for a base size in page units
pub fn normalized_base_size(base_page_units: f32) -> f32 {
    base_page_units / LEGACY_PAGE_SIZE
}
