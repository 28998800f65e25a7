//! Recently used sticker images, most recent first, persisted one path per line

use crate::core::{AppPaths, CanvasConfig, CoreResult};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct RecentStickers {
    file: PathBuf,
    limit: usize,
    paths: Vec<String>,
}

impl RecentStickers {
    /// Load the list, dropping entries whose file no longer exists.
    ///
    /// A missing or unreadable list file starts an empty list.
    pub fn load(file: &Path, limit: usize) -> Self {
        let paths = match std::fs::read_to_string(file) {
            Ok(text) => text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .filter(|line| Path::new(line).exists())
                .take(limit)
                .map(str::to_string)
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read recent stickers {:?}: {}", file, e);
                Vec::new()
            }
        };

        tracing::debug!("Loaded {} recent stickers", paths.len());
        Self {
            file: file.to_path_buf(),
            limit,
            paths,
        }
    }

    /// The app-wide list at its usual location, capped by the configured limit
    pub fn open(paths: &AppPaths, config: &CanvasConfig) -> Self {
        Self::load(&paths.recent_stickers_file(), config.recent_sticker_limit)
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Move `path` to the front and persist
    pub fn add(&mut self, path: &str) -> CoreResult<()> {
        self.paths.retain(|p| p != path);
        self.paths.insert(0, path.to_string());
        self.paths.truncate(self.limit);
        self.save()
    }

    pub fn remove(&mut self, path: &str) -> CoreResult<()> {
        let before = self.paths.len();
        self.paths.retain(|p| p != path);
        if self.paths.len() == before {
            return Ok(());
        }
        self.save()
    }

    pub fn save(&self) -> CoreResult<()> {
        if let Some(parent) = self.file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.file, self.paths.join("\n"))?;
        Ok(())
    }
}
