//! Canvas configuration and on-disk locations.
//!
//! Defaults mirror the values the journal has always rendered with; a
//! `config.json` in the data directory may override any subset of them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Data directory name under the platform data dir
pub const APP_DATA_DIR_NAME: &str = "com.dayink";

/// Edge length of the square layer rasters in pixels
pub const BUFFER_DIM: u32 = 2160;
/// Number of drawing layers (bottom, middle, top)
pub const LAYER_COUNT: usize = 3;
/// Layer used when none is recorded
pub const DEFAULT_LAYER: u8 = 1;
/// Page edge in legacy document units; also the divisor for stroke widths
pub const LEGACY_PAGE_SIZE: f32 = 1000.0;
/// Raw coordinates strictly above this are legacy 0..1000 values
pub const LEGACY_THRESHOLD: f32 = 1.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanvasConfig {
    /// Layer raster edge in pixels
    pub buffer_dim: u32,
    /// Persisted thumbnail edge in pixels
    pub snapshot_size: u32,
    /// Fraction of a sticker texture covered by visible content (rest is shadow margin)
    pub content_scale_margin: f32,
    /// Uniform scale applied about the center of padded thumbnails
    pub thumbnail_padding_scale: f32,
    /// Sticker card edge in page units (1000 = full page)
    pub base_sticker_size: f32,
    /// Sticker texture edge in pixels
    pub sticker_texture_size: u32,
    pub quadtree_capacity: usize,
    pub quadtree_max_depth: u32,
    /// Inflation of the eraser trail bounds before candidate selection
    pub eraser_tolerance: f32,
    pub thumbnail_cache_capacity: usize,
    pub sticker_cache_capacity: usize,
    pub recent_sticker_limit: usize,
    /// Longest edge of imported sticker images
    pub max_import_dimension: u32,
    /// JPEG quality (1-100) for opaque imports
    pub jpeg_quality: u8,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            buffer_dim: BUFFER_DIM,
            snapshot_size: 1024,
            content_scale_margin: 0.9,
            thumbnail_padding_scale: 0.9,
            base_sticker_size: 150.0,
            sticker_texture_size: 1024,
            quadtree_capacity: 4,
            quadtree_max_depth: 10,
            eraser_tolerance: 0.005,
            thumbnail_cache_capacity: 64,
            sticker_cache_capacity: 32,
            recent_sticker_limit: 24,
            max_import_dimension: 1600,
            jpeg_quality: 85,
        }
    }
}

impl CanvasConfig {
    /// Load configuration from a JSON file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!("No config at {:?}, using defaults", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str::<CanvasConfig>(&json) {
                Ok(config) => config.sanitized(),
                Err(err) => {
                    tracing::warn!("Ignoring malformed config {:?}: {}", path, err);
                    Self::default()
                }
            },
            Err(err) => {
                tracing::warn!("Failed to read config {:?}: {}", path, err);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> crate::core::CoreResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Page units per normalized unit for the sticker card size
    pub fn base_sticker_size_normalized(&self) -> f32 {
        self.base_sticker_size / LEGACY_PAGE_SIZE
    }

    /// Replace nonsensical values with defaults
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.buffer_dim == 0 {
            self.buffer_dim = defaults.buffer_dim;
        }
        if self.snapshot_size == 0 {
            self.snapshot_size = defaults.snapshot_size;
        }
        if self.sticker_texture_size == 0 {
            self.sticker_texture_size = defaults.sticker_texture_size;
        }
        if !(self.content_scale_margin > 0.0 && self.content_scale_margin <= 1.0) {
            self.content_scale_margin = defaults.content_scale_margin;
        }
        if !(self.thumbnail_padding_scale > 0.0 && self.thumbnail_padding_scale <= 1.0) {
            self.thumbnail_padding_scale = defaults.thumbnail_padding_scale;
        }
        self.quadtree_capacity = self.quadtree_capacity.max(1);
        self.thumbnail_cache_capacity = self.thumbnail_cache_capacity.max(1);
        self.sticker_cache_capacity = self.sticker_cache_capacity.max(1);
        self.jpeg_quality = self.jpeg_quality.clamp(1, 100);
        self
    }
}

/// Locations of everything the canvas engine persists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    root: PathBuf,
}

impl AppPaths {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Platform data directory, or the working directory when unavailable
    pub fn default_location() -> Self {
        Self::new(
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DATA_DIR_NAME),
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn thumbnails_dir(&self) -> PathBuf {
        self.root.join("thumbnails")
    }

    pub fn stickers_dir(&self) -> PathBuf {
        self.root.join("stickers")
    }

    pub fn background_dir(&self) -> PathBuf {
        self.root.join("background")
    }

    pub fn recent_stickers_file(&self) -> PathBuf {
        self.root.join("recent_stickers.txt")
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.json")
    }

    /// Create the directory tree; failures are logged, not returned.
    pub fn ensure_dirs(&self) {
        for dir in [
            self.thumbnails_dir(),
            self.stickers_dir(),
            self.background_dir(),
        ] {
            if let Err(e) = std::fs::create_dir_all(&dir) {
                tracing::warn!("Failed to create data dir {:?}: {}", dir, e);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "bufferDim": 512, "jpegQuality": 250 }"#).unwrap();

        let config = CanvasConfig::load(&path);
        assert_eq!(config.buffer_dim, 512);
        assert_eq!(config.jpeg_quality, 100);
        assert_eq!(config.snapshot_size, 1024);
        assert_eq!(config.quadtree_capacity, 4);
    }

    #[test]
    fn test_malformed_config_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert_eq!(CanvasConfig::load(&path), CanvasConfig::default());
    }

    #[test]
    fn test_config_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::new(dir.path().to_path_buf());
        let config = CanvasConfig {
            eraser_tolerance: 0.01,
            ..Default::default()
        };
        config.save(&paths.config_file()).unwrap();

        assert_eq!(CanvasConfig::load(&paths.config_file()), config);
    }

    #[test]
    fn test_paths_layout() {
        let paths = AppPaths::new(PathBuf::from("/data"));
        assert_eq!(paths.thumbnails_dir(), PathBuf::from("/data/thumbnails"));
        assert_eq!(paths.stickers_dir(), PathBuf::from("/data/stickers"));
        assert_eq!(
            paths.recent_stickers_file(),
            PathBuf::from("/data/recent_stickers.txt")
        );
    }
}
