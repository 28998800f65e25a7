//! Sticker caches - generated textures and decoded source images

use crate::document::StickerContent;
use crate::render::image_ops;
use crate::render::{generate_sticker_texture, StickerTextureStyle};
use hashlink::LruCache;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tiny_skia::Pixmap;

/// LRU of shared pixmaps keyed by file path
struct PixmapLru {
    name: &'static str,
    entries: Mutex<LruCache<PathBuf, Arc<Pixmap>>>,
}

impl PixmapLru {
    fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            entries: Mutex::new(LruCache::new(capacity.max(1))),
        }
    }

    fn get_or_insert_with(&self, path: &Path, make: impl FnOnce() -> Option<Pixmap>) -> Option<Arc<Pixmap>> {
        if let Some(hit) = self.entries.lock().get(path) {
            return Some(Arc::clone(hit));
        }

        // Built outside the lock; two racing misses both build, last insert wins
        let pixmap = Arc::new(make()?);

        let mut entries = self.entries.lock();
        if entries.len() >= entries.capacity() && !entries.contains_key(path) {
            if let Some((evicted, _)) = entries.remove_lru() {
                tracing::debug!("Evicted {} {:?}", self.name, evicted);
            }
        }
        entries.insert(path.to_path_buf(), Arc::clone(&pixmap));
        Some(pixmap)
    }

    fn remove(&self, path: &Path) {
        self.entries.lock().remove(path);
    }

    fn clear(&self) {
        self.entries.lock().clear();
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

/// Framed sticker textures for on-canvas drawing
pub struct StickerTextureCache {
    textures: PixmapLru,
    style: StickerTextureStyle,
}

impl StickerTextureCache {
    pub fn new(capacity: usize, style: StickerTextureStyle) -> Self {
        Self {
            textures: PixmapLru::new("sticker texture", capacity),
            style,
        }
    }

    /// Texture for image content; `None` for emoji, loading and empty content
    /// and for images that fail to load. Failures are not cached.
    pub fn get_or_generate(&self, content: &StickerContent) -> Option<Arc<Pixmap>> {
        let path = content.image_path()?;
        self.textures
            .get_or_insert_with(path, || generate_sticker_texture(content, self.style))
    }

    pub fn invalidate(&self, path: &Path) {
        self.textures.remove(path);
    }

    pub fn clear(&self) {
        self.textures.clear();
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decoded sticker source images, downsampled for snapshot rendering
pub struct ImageCache {
    images: PixmapLru,
    max_dim: u32,
}

impl ImageCache {
    pub fn new(capacity: usize, max_dim: u32) -> Self {
        Self {
            images: PixmapLru::new("decoded image", capacity),
            max_dim,
        }
    }

    pub fn get_or_load(&self, path: &Path) -> Option<Arc<Pixmap>> {
        self.images.get_or_insert_with(path, || {
            if !path.exists() {
                tracing::debug!("Sticker image missing: {:?}", path);
                return None;
            }
            match image_ops::load_downsampled(path, self.max_dim)
                .and_then(|img| image_ops::rgba_to_pixmap(&img))
            {
                Ok(pixmap) => Some(pixmap),
                Err(e) => {
                    tracing::warn!("Failed to decode sticker image {:?}: {}", path, e);
                    None
                }
            }
        })
    }

    pub fn clear(&self) {
        self.images.clear();
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_image(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(20, 20, Rgb([1, 2, 3])).save(&path).unwrap();
        path
    }

    #[test]
    fn test_texture_cache_shares_and_evicts() {
        let dir = tempfile::tempdir().unwrap();
        let a = StickerContent::Image(write_image(dir.path(), "a.png"));
        let b = StickerContent::Image(write_image(dir.path(), "b.png"));
        let style = StickerTextureStyle {
            size: 64,
            content_scale: 0.9,
        };
        let cache = StickerTextureCache::new(1, style);

        let first = cache.get_or_generate(&a).unwrap();
        let again = cache.get_or_generate(&a).unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(first.width(), 64);

        cache.get_or_generate(&b).unwrap();
        assert_eq!(cache.len(), 1);
        let regenerated = cache.get_or_generate(&a).unwrap();
        assert!(!Arc::ptr_eq(&first, &regenerated));
    }

    #[test]
    fn test_texture_cache_skips_non_images() {
        let cache = StickerTextureCache::new(4, StickerTextureStyle::default());
        assert!(cache.get_or_generate(&StickerContent::Emoji("⭐".into())).is_none());
        assert!(cache
            .get_or_generate(&StickerContent::Image(PathBuf::from("/no/such/file.png")))
            .is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_image_cache_loads_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(dir.path(), "c.png");
        let cache = ImageCache::new(4, 256);

        let first = cache.get_or_load(&path).unwrap();
        assert_eq!((first.width(), first.height()), (20, 20));
        std::fs::remove_file(&path).unwrap();
        // Still served from memory
        assert!(cache.get_or_load(&path).is_some());
        cache.clear();
        assert!(cache.get_or_load(&path).is_none());
    }
}
