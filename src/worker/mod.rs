//! Background worker - loads, saves, imports and cleanup off the interactive thread
//!
//! Every job runs on tokio's blocking pool and reports back through an
//! unbounded channel; the interactive side applies the messages. Loads carry a
//! generation number so a newer request supersedes older ones.

mod files;
mod session;

pub use files::{remove_orphan_stickers, save_thumbnail_file};
pub use session::{EditorSession, EditorStatus};

use crate::cache::{content_hash, ImageCache, ThumbnailCache};
use crate::core::{AppPaths, CanvasConfig, CoreError, CoreResult};
use crate::document::{serialize_stickers, Sticker};
use crate::render::image_ops::{self, DOWNSAMPLE_DEFAULT_DIM};
use crate::render::{LayerManager, SnapshotGenerator};
use crate::stroke::{deserialize_strokes, serialize_strokes, Stroke, StrokeRef};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A day entry's canvas as the store keeps it
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoredDocument {
    pub entry_id: i64,
    /// Stroke wire format
    pub stroke_data: String,
    pub stickers: Vec<Sticker>,
    pub thumbnail_path: Option<PathBuf>,
}

/// Persistence collaborator; the database lives outside this crate.
pub trait DocumentStore: Send + Sync {
    /// `None` for an entry with no canvas yet
    fn load_document(&self, entry_id: i64) -> CoreResult<Option<StoredDocument>>;

    fn save_document(&self, document: &StoredDocument) -> CoreResult<()>;

    /// Content paths of every stored sticker across all entries
    fn referenced_sticker_paths(&self) -> CoreResult<Vec<String>>;
}

#[derive(Debug)]
pub enum WorkerEvent {
    Loaded {
        generation: u64,
        entry_id: i64,
        strokes: Vec<StrokeRef>,
        stickers: Vec<Sticker>,
        layers: LayerManager,
    },
    LoadFailed {
        generation: u64,
        entry_id: i64,
        error: String,
    },
    StickerImported {
        placeholder_id: i64,
        result: Result<PathBuf, String>,
    },
    OrphansRemoved(usize),
}

/// Everything a save needs, captured on the interactive thread
#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub entry_id: i64,
    pub strokes: Vec<StrokeRef>,
    pub stickers: Vec<Sticker>,
}

#[derive(Clone)]
pub struct BackgroundWorker {
    store: Arc<dyn DocumentStore>,
    paths: AppPaths,
    config: CanvasConfig,
    images: Arc<ImageCache>,
    thumbnails: Arc<ThumbnailCache>,
    generation: Arc<AtomicU64>,
    events: mpsc::UnboundedSender<WorkerEvent>,
}

impl BackgroundWorker {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        paths: AppPaths,
        config: CanvasConfig,
    ) -> (Self, mpsc::UnboundedReceiver<WorkerEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let worker = Self {
            store,
            paths,
            images: Arc::new(ImageCache::new(config.sticker_cache_capacity, DOWNSAMPLE_DEFAULT_DIM)),
            thumbnails: Arc::new(ThumbnailCache::new(config.thumbnail_cache_capacity)),
            config,
            generation: Arc::new(AtomicU64::new(0)),
            events,
        };
        (worker, rx)
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn thumbnails(&self) -> &ThumbnailCache {
        &self.thumbnails
    }

    /// Generation of the most recent load request
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.current_generation()
    }

    /// Load and prebake an entry; the result arrives as [`WorkerEvent::Loaded`].
    ///
    /// Returns the generation of this request. Older requests still finish,
    /// but their results no longer match [`Self::current_generation`].
    pub fn request_load(&self, entry_id: i64) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let store = Arc::clone(&self.store);
        let config = self.config.clone();
        let events = self.events.clone();

        tracing::debug!("Load requested for entry {} (generation {})", entry_id, generation);
        tokio::task::spawn_blocking(move || {
            let event = match load_and_bake(store.as_ref(), &config, entry_id) {
                Ok((strokes, stickers, layers)) => WorkerEvent::Loaded {
                    generation,
                    entry_id,
                    strokes,
                    stickers,
                    layers,
                },
                Err(e) => {
                    tracing::error!("Failed to load entry {}: {}", entry_id, e);
                    WorkerEvent::LoadFailed {
                        generation,
                        entry_id,
                        error: e.to_string(),
                    }
                }
            };
            if events.send(event).is_err() {
                tracing::debug!("Load result for entry {} dropped, no listener", entry_id);
            }
        });
        generation
    }

    /// Serialize, render the thumbnail and persist.
    ///
    /// Completes only after the store has accepted the document.
    pub async fn save(&self, request: SaveRequest) -> CoreResult<StoredDocument> {
        let worker = self.clone();
        tokio::task::spawn_blocking(move || worker.save_blocking(request))
            .await
            .map_err(|e| CoreError::InvalidInput(format!("save task failed: {e}")))?
    }

    fn save_blocking(&self, request: SaveRequest) -> CoreResult<StoredDocument> {
        let stroke_data = serialize_strokes(&request.strokes);
        let sticker_data = serialize_stickers(&request.stickers);
        let hash = content_hash(&stroke_data, &sticker_data);

        let snapshot = match self.thumbnails.get(request.entry_id, &hash) {
            Some(cached) => cached,
            None => {
                let generator = SnapshotGenerator::new(&self.config);
                let pixmap = generator.capture(&request.strokes, &request.stickers, &self.images)?;
                self.thumbnails.invalidate(request.entry_id);
                self.thumbnails.insert(request.entry_id, &hash, &pixmap);
                pixmap
            }
        };

        let png = image_ops::encode_png(&snapshot)?;
        let thumbnail = save_thumbnail_file(&self.paths.thumbnails_dir(), request.entry_id, &png)?;

        let document = StoredDocument {
            entry_id: request.entry_id,
            stroke_data,
            stickers: request.stickers,
            thumbnail_path: Some(thumbnail),
        };
        self.store.save_document(&document)?;

        tracing::info!(
            "Saved entry {}: {} strokes, {} stickers",
            document.entry_id,
            request.strokes.len(),
            document.stickers.len()
        );
        Ok(document)
    }

    /// Shrink and copy an image into the stickers directory.
    ///
    /// The outcome arrives as [`WorkerEvent::StickerImported`] for `placeholder_id`.
    pub fn import_sticker(&self, placeholder_id: i64, source: PathBuf) -> JoinHandle<()> {
        let dest = self.paths.stickers_dir();
        let max_dim = self.config.max_import_dimension;
        let quality = self.config.jpeg_quality;
        let events = self.events.clone();

        tokio::task::spawn_blocking(move || {
            let result = image_ops::optimize_image(&source, &dest, max_dim, quality).map_err(|e| {
                tracing::warn!("Sticker import of {:?} failed: {}", source, e);
                e.to_string()
            });
            let _ = events.send(WorkerEvent::StickerImported {
                placeholder_id,
                result,
            });
        })
    }

    /// Fire-and-forget deletion of unreferenced sticker files.
    ///
    /// `in_use` holds content paths of open documents that may not be saved
    /// yet; they are kept alongside everything the store references.
    pub fn spawn_orphan_cleanup(&self, in_use: Vec<String>) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let dir = self.paths.stickers_dir();
        let events = self.events.clone();

        tokio::task::spawn_blocking(move || {
            let removed = store
                .referenced_sticker_paths()
                .and_then(|mut referenced| {
                    referenced.extend(in_use);
                    remove_orphan_stickers(&dir, &referenced)
                });
            match removed {
                Ok(count) => {
                    let _ = events.send(WorkerEvent::OrphansRemoved(count));
                }
                Err(e) => tracing::warn!("Orphan cleanup failed: {}", e),
            }
        })
    }
}

type LoadedContent = (Vec<StrokeRef>, Vec<Sticker>, LayerManager);

fn load_and_bake(store: &dyn DocumentStore, config: &CanvasConfig, entry_id: i64) -> CoreResult<LoadedContent> {
    let stored = store.load_document(entry_id)?.unwrap_or_default();
    let strokes: Vec<StrokeRef> = deserialize_strokes(&stored.stroke_data)
        .into_iter()
        .map(Stroke::into_ref)
        .collect();

    let stickers: Vec<Sticker> = stored.stickers.into_iter().map(Sticker::normalized).collect();

    let mut layers = LayerManager::with_config(config)?;
    layers.restore_from_paths(&strokes);
    Ok((strokes, stickers, layers))
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::testing::{small_config, MemoryStore};
    use super::*;
    use crate::geometry::Point;
    use image::{Rgb, RgbImage};

    fn worker(store: Arc<MemoryStore>, root: &std::path::Path) -> (BackgroundWorker, mpsc::UnboundedReceiver<WorkerEvent>) {
        BackgroundWorker::new(store, AppPaths::new(root.to_path_buf()), small_config())
    }

    #[tokio::test]
    async fn test_load_missing_entry_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let (worker, mut rx) = worker(Arc::new(MemoryStore::default()), dir.path());

        let generation = worker.request_load(9);
        match rx.recv().await.unwrap() {
            WorkerEvent::Loaded {
                generation: g,
                entry_id,
                strokes,
                layers,
                ..
            } => {
                assert_eq!(g, generation);
                assert_eq!(entry_id, 9);
                assert!(strokes.is_empty());
                assert_eq!(layers.buffer_dim(), 128);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_load_failure_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore {
            fail_loads: true,
            ..MemoryStore::default()
        };
        let (worker, mut rx) = worker(Arc::new(store), dir.path());

        worker.request_load(1);
        assert!(matches!(rx.recv().await.unwrap(), WorkerEvent::LoadFailed { entry_id: 1, .. }));
    }

    #[tokio::test]
    async fn test_newer_request_supersedes() {
        let dir = tempfile::tempdir().unwrap();
        let (worker, _rx) = worker(Arc::new(MemoryStore::default()), dir.path());

        let first = worker.request_load(1);
        let second = worker.request_load(1);
        assert!(second > first);
        assert!(!worker.is_current(first));
        assert!(worker.is_current(second));
    }

    #[tokio::test]
    async fn test_save_writes_thumbnail_and_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::default());
        let (worker, _rx) = worker(Arc::clone(&store), dir.path());

        let stroke = Stroke::with_points(vec![Point::new(0.1, 0.1), Point::new(0.9, 0.9)])
            .unwrap()
            .into_ref();
        let request = SaveRequest {
            entry_id: 4,
            strokes: vec![stroke],
            stickers: vec![Sticker::emoji(-1, 4, "⭐", 1)],
        };

        let saved = worker.save(request.clone()).await.unwrap();
        let thumb = saved.thumbnail_path.clone().unwrap();
        assert_eq!(image::image_dimensions(&thumb).unwrap(), (64, 64));
        assert_eq!(store.documents.lock().get(&4), Some(&saved));
        assert_eq!(worker.thumbnails().len(), 1);

        // Same content again reuses the cached render but still writes a file
        let again = worker.save(request).await.unwrap();
        assert!(again.thumbnail_path.unwrap().exists());
        assert_eq!(worker.thumbnails().len(), 1);
        assert_eq!(std::fs::read_dir(worker.paths().thumbnails_dir()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_import_and_cleanup_events() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::default());
        let (worker, mut rx) = worker(Arc::clone(&store), dir.path());

        let source = dir.path().join("photo.png");
        RgbImage::from_pixel(40, 30, Rgb([9, 9, 9])).save(&source).unwrap();

        worker.import_sticker(-3, source).await.unwrap();
        let imported = match rx.recv().await.unwrap() {
            WorkerEvent::StickerImported {
                placeholder_id: -3,
                result: Ok(path),
            } => path,
            other => panic!("unexpected {other:?}"),
        };
        assert!(imported.starts_with(worker.paths().stickers_dir()));

        // Held by an open document only
        let in_use = vec![imported.to_string_lossy().into_owned()];
        worker.spawn_orphan_cleanup(in_use).await.unwrap();
        assert!(matches!(rx.recv().await.unwrap(), WorkerEvent::OrphansRemoved(0)));
        assert!(imported.exists());

        // Nothing references the import
        worker.spawn_orphan_cleanup(Vec::new()).await.unwrap();
        assert!(matches!(rx.recv().await.unwrap(), WorkerEvent::OrphansRemoved(1)));
        assert!(!imported.exists());

        worker.import_sticker(-4, dir.path().join("missing.png")).await.unwrap();
        assert!(matches!(
            rx.recv().await.unwrap(),
            WorkerEvent::StickerImported { result: Err(_), .. }
        ));
    }
}
