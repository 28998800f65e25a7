//! Background canvas store - the shared backdrop page persisted as plain files
//!
//! Layout inside the store directory:
//! - `stickers.txt`: sticker records
//! - `strokes.txt`: stroke wire format
//! - `layer_N.png`: one raster per layer

use super::{deserialize_stickers, serialize_stickers, Document};
use crate::core::config::LAYER_COUNT;
use crate::core::CoreResult;
use crate::stroke::deserialize_strokes;
use std::path::{Path, PathBuf};

const STICKERS_FILE: &str = "stickers.txt";
const STROKES_FILE: &str = "strokes.txt";

pub struct BackgroundCanvasStore {
    dir: PathBuf,
}

impl BackgroundCanvasStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn layer_file(&self, index: usize) -> PathBuf {
        self.dir.join(format!("layer_{index}.png"))
    }

    pub fn save(&self, document: &Document) -> CoreResult<()> {
        std::fs::create_dir_all(&self.dir)?;

        std::fs::write(self.dir.join(STICKERS_FILE), serialize_stickers(document.stickers()))?;
        for index in 0..LAYER_COUNT {
            document.layers().save_layer_png(index, &self.layer_file(index))?;
        }
        std::fs::write(self.dir.join(STROKES_FILE), document.serialize_strokes())?;

        tracing::info!(
            "Saved background: {} strokes, {} stickers",
            document.strokes().len(),
            document.stickers().len()
        );
        Ok(())
    }

    /// Load into `document`; returns false when nothing was stored yet.
    ///
    /// Strokes are replayed when present so the rasters match the stroke list
    /// exactly; otherwise the layer PNGs are used as-is.
    pub fn load(&self, document: &mut Document) -> CoreResult<bool> {
        if !self.dir.exists() {
            return Ok(false);
        }

        let stickers = match read_if_exists(&self.dir.join(STICKERS_FILE))? {
            Some(text) => deserialize_stickers(&text),
            None => Vec::new(),
        };

        let strokes = match read_if_exists(&self.dir.join(STROKES_FILE))? {
            Some(text) if !text.trim().is_empty() => deserialize_strokes(&text),
            _ => Vec::new(),
        };

        if !strokes.is_empty() {
            document.load(strokes, stickers);
            return Ok(true);
        }

        document.load(Vec::new(), stickers);
        let mut restored = 0;
        for index in 0..LAYER_COUNT {
            let file = self.layer_file(index);
            if !file.exists() {
                continue;
            }
            match document.layers_mut().load_layer_png(index, &file) {
                Ok(()) => restored += 1,
                Err(e) => tracing::warn!("Skipping background layer {:?}: {}", file, e),
            }
        }

        tracing::debug!("Background restored {} layer images", restored);
        Ok(true)
    }
}

fn read_if_exists(path: &Path) -> CoreResult<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
