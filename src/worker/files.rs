//! File housekeeping for thumbnails and imported sticker images

use crate::core::CoreResult;
use crate::input::current_time_ms;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Write `{entry}_{millis}.png`, deleting older thumbnails of the same entry first
pub fn save_thumbnail_file(dir: &Path, entry_id: i64, png: &[u8]) -> CoreResult<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let prefix = format!("{entry_id}_");
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_old = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.starts_with(&prefix) && name.ends_with(".png"));
        if !is_old {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!("Failed to delete old thumbnail {:?}: {}", path, e),
        }
    }

    let path = dir.join(format!("{}{}.png", prefix, current_time_ms()));
    std::fs::write(&path, png)?;
    tracing::debug!("Wrote thumbnail {:?} (replaced {})", path, removed);
    Ok(path)
}

/// Delete files in `stickers_dir` that no stored sticker references.
///
/// References are compared as full paths. Returns the number of files deleted;
/// files that fail to delete are logged and skipped.
pub fn remove_orphan_stickers(stickers_dir: &Path, referenced: &[String]) -> CoreResult<usize> {
    if !stickers_dir.exists() {
        return Ok(0);
    }

    let referenced: HashSet<PathBuf> = referenced.iter().map(PathBuf::from).collect();
    let mut removed = 0;
    for entry in std::fs::read_dir(stickers_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if referenced.contains(&path) {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("Removed orphan sticker {:?}", path);
                removed += 1;
            }
            Err(e) => tracing::warn!("Failed to remove orphan {:?}: {}", path, e),
        }
    }

    tracing::info!("Orphan cleanup removed {} files", removed);
    Ok(removed)
}
