//! Thumbnail cache - rendered day snapshots keyed by entry and content hash
//!
//! Pixels are kept LZ4 compressed; a blank-ish thumbnail compresses to a few
//! percent of its raw size.

use hashlink::LruCache;
use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use tiny_skia::{IntSize, Pixmap};

#[derive(Debug, Clone)]
struct CachedThumbnail {
    /// LZ4 compressed premultiplied RGBA (with prepended size)
    data: Vec<u8>,
    width: u32,
    height: u32,
}

type ThumbnailKey = (i64, String);

/// Hash of everything a thumbnail depends on
pub fn content_hash(stroke_data: &str, sticker_data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(stroke_data.as_bytes());
    hasher.update([0u8]);
    hasher.update(sticker_data.as_bytes());
    hex::encode(hasher.finalize())
}

pub struct ThumbnailCache {
    entries: Mutex<LruCache<ThumbnailKey, CachedThumbnail>>,
}

impl ThumbnailCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity.max(1))),
        }
    }

    pub fn insert(&self, entry_id: i64, hash: &str, pixmap: &Pixmap) {
        let raw = pixmap.data();
        let compressed = compress_prepend_size(raw);
        tracing::debug!(
            "Thumbnail {}: {} -> {} bytes ({:.1}% of original)",
            entry_id,
            raw.len(),
            compressed.len(),
            compressed.len() as f64 / raw.len().max(1) as f64 * 100.0
        );

        let key = (entry_id, hash.to_string());
        let mut entries = self.entries.lock();
        if entries.len() >= entries.capacity() && !entries.contains_key(&key) {
            if let Some(((evicted, _), _)) = entries.remove_lru() {
                tracing::debug!("Evicted thumbnail for entry {}", evicted);
            }
        }
        entries.insert(
            key,
            CachedThumbnail {
                data: compressed,
                width: pixmap.width(),
                height: pixmap.height(),
            },
        );
    }

    /// Decompressed thumbnail, if one is cached for exactly this content
    pub fn get(&self, entry_id: i64, hash: &str) -> Option<Pixmap> {
        let cached = {
            let mut entries = self.entries.lock();
            entries.get(&(entry_id, hash.to_string()))?.clone()
        };

        let data = match decompress_size_prepended(&cached.data) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Corrupt cached thumbnail for entry {}: {}", entry_id, e);
                return None;
            }
        };
        Pixmap::from_vec(data, IntSize::from_wh(cached.width, cached.height)?)
    }

    /// Drop every cached version of an entry
    pub fn invalidate(&self, entry_id: i64) {
        let mut entries = self.entries.lock();
        let stale: Vec<ThumbnailKey> = entries
            .iter()
            .filter(|((id, _), _)| *id == entry_id)
            .map(|(key, _)| key.clone())
            .collect();
        for key in stale {
            entries.remove(&key);
        }
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
