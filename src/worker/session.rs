//! Editor session - one open day entry on the interactive thread
//!
//! Owns the document and the live input state, forwards heavy work to the
//! [`BackgroundWorker`] and applies its messages as they arrive.

use super::{BackgroundWorker, SaveRequest, StoredDocument, WorkerEvent};
use crate::cache::{RecentStickers, StickerTextureCache};
use crate::core::CoreResult;
use crate::document::{BrushState, Document, GestureOutcome};
use crate::geometry::Viewport;
use crate::input::{InkInputQueue, StrokeEngine};
use crate::render::StickerTextureStyle;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EditorStatus {
    Initializing,
    Loading,
    Ready,
    Error,
}

pub struct EditorSession {
    status: EditorStatus,
    document: Document,
    pub brush: BrushState,
    pub viewport: Viewport,
    engine: StrokeEngine,
    input: Arc<InkInputQueue>,
    textures: StickerTextureCache,
    recent: Option<RecentStickers>,
    worker: BackgroundWorker,
    events: mpsc::UnboundedReceiver<WorkerEvent>,
}

impl EditorSession {
    pub fn new(
        entry_id: i64,
        worker: BackgroundWorker,
        events: mpsc::UnboundedReceiver<WorkerEvent>,
    ) -> CoreResult<Self> {
        let config = worker.config().clone();
        Ok(Self {
            status: EditorStatus::Initializing,
            document: Document::new(entry_id, &config)?,
            brush: BrushState::default(),
            viewport: Viewport::default(),
            engine: StrokeEngine::new(),
            input: Arc::new(InkInputQueue::new()),
            textures: StickerTextureCache::new(
                config.sticker_cache_capacity,
                StickerTextureStyle::from_config(&config),
            ),
            recent: None,
            worker,
            events,
        })
    }

    /// Track recently used sticker images in `recent`
    pub fn with_recent_stickers(mut self, recent: RecentStickers) -> Self {
        self.recent = Some(recent);
        self
    }

    pub fn status(&self) -> EditorStatus {
        self.status
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn textures(&self) -> &StickerTextureCache {
        &self.textures
    }

    pub fn recent_stickers(&self) -> Option<&RecentStickers> {
        self.recent.as_ref()
    }

    /// Queue shared with the event source that feeds raw samples
    pub fn input_queue(&self) -> Arc<InkInputQueue> {
        Arc::clone(&self.input)
    }

    pub fn engine(&self) -> &StrokeEngine {
        &self.engine
    }

    /// Start loading; only the first call does anything
    pub fn load(&mut self) -> bool {
        if self.status != EditorStatus::Initializing {
            return false;
        }
        self.reload();
        true
    }

    /// Request a fresh load, superseding any load still in flight
    pub fn reload(&mut self) {
        self.status = EditorStatus::Loading;
        self.worker.request_load(self.document.entry_id());
    }

    /// Apply every message already delivered; returns how many were applied
    pub fn poll_worker(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Wait for the next worker message and apply it.
    ///
    /// Returns false once the worker side is gone.
    pub async fn next_event(&mut self) -> bool {
        match self.events.recv().await {
            Some(event) => {
                self.apply(event);
                true
            }
            None => false,
        }
    }

    pub fn apply(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Loaded {
                generation,
                entry_id,
                strokes,
                stickers,
                layers,
            } => {
                if !self.accepts(generation, entry_id) {
                    tracing::debug!("Discarding stale load (generation {})", generation);
                    return;
                }
                self.document.load_baked(strokes, stickers, layers);
                self.status = EditorStatus::Ready;
                tracing::info!(
                    "Entry {} ready: {} strokes, {} stickers",
                    entry_id,
                    self.document.strokes().len(),
                    self.document.stickers().len()
                );
            }
            WorkerEvent::LoadFailed {
                generation,
                entry_id,
                error,
            } => {
                if !self.accepts(generation, entry_id) {
                    return;
                }
                tracing::error!("Entry {} failed to load: {}", entry_id, error);
                self.status = EditorStatus::Error;
            }
            WorkerEvent::StickerImported {
                placeholder_id,
                result,
            } => match result {
                Ok(path) => {
                    let path = path.to_string_lossy().into_owned();
                    if self.document.resolve_loading_sticker(placeholder_id, &path) {
                        if let Some(Err(e)) = self.recent.as_mut().map(|r| r.add(&path)) {
                            tracing::warn!("Failed to update recent stickers: {}", e);
                        }
                    }
                }
                Err(error) => {
                    tracing::warn!("Dropping sticker {}: {}", placeholder_id, error);
                    self.document.remove_sticker(placeholder_id);
                }
            },
            WorkerEvent::OrphansRemoved(count) => {
                tracing::debug!("{} orphan sticker files removed", count);
            }
        }
    }

    fn accepts(&self, generation: u64, entry_id: i64) -> bool {
        self.status == EditorStatus::Loading
            && entry_id == self.document.entry_id()
            && self.worker.is_current(generation)
    }

    // === Input ===

    /// Feed queued samples into the stroke engine; true when the preview changed
    pub fn pump_input(&mut self) -> bool {
        let samples = self.input.poll_events();
        let Some((first, rest)) = samples.split_first() else {
            return false;
        };

        if self.engine.is_active() {
            self.engine.process(&samples)
        } else {
            self.engine.start(*first);
            self.engine.set_stroke_width(self.brush.stroke_width());
            self.engine.process(rest)
        }
    }

    /// Pointer released: drain the queue and commit or erase
    pub fn finish_stroke(&mut self) -> GestureOutcome {
        self.pump_input();
        if self.status != EditorStatus::Ready {
            self.engine.clear();
            return GestureOutcome::Ignored;
        }
        self.document.finish_gesture(&mut self.engine, &self.brush)
    }

    // === Stickers ===

    /// Add a loading placeholder and import `source` in the background
    pub fn import_sticker(&mut self, source: PathBuf) -> i64 {
        let id = self.document.add_loading_sticker(self.brush.layer as i32);
        self.worker.import_sticker(id, source);
        id
    }

    pub fn add_emoji(&mut self, glyph: &str) -> i64 {
        self.document.add_emoji_sticker(glyph, self.brush.layer as i32)
    }

    // === Persistence ===

    /// Persist the current state; returns once the store has it
    pub async fn save(&self) -> CoreResult<StoredDocument> {
        let request = SaveRequest {
            entry_id: self.document.entry_id(),
            strokes: self.document.strokes().to_vec(),
            stickers: self
                .document
                .stickers()
                .iter()
                .filter(|s| !s.is_loading())
                .cloned()
                .collect(),
        };
        self.worker.save(request).await
    }

    /// Remove sticker files nothing refers to, keeping this page's unsaved imports
    pub fn cleanup_orphans(&self) -> tokio::task::JoinHandle<()> {
        let in_use = self
            .document
            .stickers()
            .iter()
            .map(|s| s.content_path.clone())
            .collect();
        self.worker.spawn_orphan_cleanup(in_use)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::testing::{small_config, MemoryStore};
    use super::*;
    use crate::core::AppPaths;
    use crate::document::{Sticker, Tool};
    use crate::geometry::Point;
    use crate::input::RawPoint;
    use crate::worker::StoredDocument;
    use image::{Rgb, RgbImage};

    fn session(store: Arc<MemoryStore>, root: &std::path::Path, entry_id: i64) -> EditorSession {
        let (worker, events) = BackgroundWorker::new(store, AppPaths::new(root.to_path_buf()), small_config());
        EditorSession::new(entry_id, worker, events).unwrap()
    }

    fn store_with_entry(entry_id: i64, stroke_data: &str) -> Arc<MemoryStore> {
        let store = MemoryStore::default();
        store.documents.lock().insert(
            entry_id,
            StoredDocument {
                entry_id,
                stroke_data: stroke_data.to_string(),
                ..StoredDocument::default()
            },
        );
        Arc::new(store)
    }

    fn draw(session: &mut EditorSession, points: &[(f32, f32)]) -> GestureOutcome {
        let queue = session.input_queue();
        for (i, &(x, y)) in points.iter().enumerate() {
            queue.push(RawPoint::at(x, y, i as u64));
        }
        session.finish_stroke()
    }

    #[tokio::test]
    async fn test_load_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_entry(2, "0.1,0.5;0.9,0.5|-16777216|20.0|0|1");
        let mut session = session(store, dir.path(), 2);

        assert_eq!(session.status(), EditorStatus::Initializing);
        assert!(session.load());
        assert!(!session.load());
        assert_eq!(session.status(), EditorStatus::Loading);

        assert!(session.next_event().await);
        assert_eq!(session.status(), EditorStatus::Ready);
        assert_eq!(session.document().strokes().len(), 1);
        assert_eq!(session.document().index().len(), 1);
        let layer = session.document().layers().layer(1).unwrap();
        assert_eq!(layer.pixel(64, 64).unwrap().alpha(), 255);
    }

    #[tokio::test]
    async fn test_load_rescales_page_unit_stickers() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_entry(4, "500.0,500.0;600.0,600.0|-16777216|5.0|0|1");
        store.documents.lock().get_mut(&4).unwrap().stickers =
            vec![Sticker::new(7, 4, Point::new(500.0, 250.0), "emoji:⭐", "emoji", 1)];
        let mut session = session(store, dir.path(), 4);

        session.load();
        assert!(session.next_event().await);
        assert_eq!(session.status(), EditorStatus::Ready);

        let stroke = &session.document().strokes()[0];
        assert_eq!(stroke.points()[0], Point::new(0.5, 0.5));
        let sticker = session.document().sticker(7).unwrap();
        assert_eq!((sticker.x, sticker.y), (0.5, 0.25));
    }

    #[tokio::test]
    async fn test_stale_load_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_entry(2, "0.1,0.5;0.9,0.5|-16777216|20.0|0|1");
        let mut session = session(Arc::clone(&store), dir.path(), 2);

        session.load();
        // Data changes before the second request; only its result may land
        store.documents.lock().get_mut(&2).unwrap().stroke_data = "[]".into();
        session.reload();

        assert!(session.next_event().await);
        assert!(session.next_event().await);
        assert_eq!(session.status(), EditorStatus::Ready);
        assert!(session.document().strokes().is_empty());
    }

    #[tokio::test]
    async fn test_load_error_status() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore {
            fail_loads: true,
            ..MemoryStore::default()
        };
        let mut session = session(Arc::new(store), dir.path(), 1);
        session.load();
        assert!(session.next_event().await);
        assert_eq!(session.status(), EditorStatus::Error);
    }

    #[tokio::test]
    async fn test_draw_erase_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::default());
        let mut session = session(Arc::clone(&store), dir.path(), 3);

        // Input before the page is ready is dropped
        assert_eq!(draw(&mut session, &[(0.1, 0.2), (0.5, 0.2)]), GestureOutcome::Ignored);

        session.load();
        session.next_event().await;
        assert!(matches!(
            draw(&mut session, &[(0.1, 0.5), (0.5, 0.5), (0.9, 0.5)]),
            GestureOutcome::Committed(_)
        ));
        assert!(matches!(
            draw(&mut session, &[(0.1, 0.8), (0.9, 0.8)]),
            GestureOutcome::Committed(_)
        ));

        session.brush.tool = Tool::SegmentEraser;
        assert_eq!(draw(&mut session, &[(0.5, 0.4), (0.5, 0.6)]), GestureOutcome::Erased(1));

        session.add_emoji("⭐");
        let saved = session.save().await.unwrap();
        assert_eq!(saved.stickers.len(), 1);
        assert!(saved.thumbnail_path.unwrap().exists());

        let stored = store.documents.lock().get(&3).cloned().unwrap();
        assert_eq!(stored.stroke_data, session.document().serialize_strokes());
    }

    #[tokio::test]
    async fn test_sticker_import_resolves_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("cat.png");
        RgbImage::from_pixel(24, 24, Rgb([200, 100, 50])).save(&source).unwrap();

        let paths = AppPaths::new(dir.path().to_path_buf());
        let mut session = session(Arc::new(MemoryStore::default()), dir.path(), 1)
            .with_recent_stickers(RecentStickers::open(&paths, &small_config()));
        session.load();
        session.next_event().await;

        let id = session.import_sticker(source);
        let missing = session.import_sticker(dir.path().join("gone.png"));
        assert!(session.document().sticker(id).unwrap().is_loading());
        // Loading placeholders are never persisted
        assert!(session.save().await.unwrap().stickers.is_empty());

        session.next_event().await;
        session.next_event().await;
        let sticker = session.document().sticker(id).unwrap();
        assert!(!sticker.is_loading());
        assert_eq!(session.recent_stickers().unwrap().paths(), &[sticker.content_path.clone()]);
        assert!(session.document().sticker(missing).is_none());
    }

    #[tokio::test]
    async fn test_cleanup_keeps_unsaved_imports() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("dog.png");
        RgbImage::from_pixel(24, 24, Rgb([20, 40, 60])).save(&source).unwrap();

        let mut session = session(Arc::new(MemoryStore::default()), dir.path(), 5);
        session.load();
        session.next_event().await;

        let id = session.import_sticker(source);
        session.next_event().await;
        let imported = PathBuf::from(&session.document().sticker(id).unwrap().content_path);
        assert!(imported.exists());

        // The store has never seen this sticker
        session.cleanup_orphans().await.unwrap();
        session.next_event().await;
        assert!(imported.exists());

        session.document_mut().remove_sticker(id);
        session.cleanup_orphans().await.unwrap();
        session.next_event().await;
        assert!(!imported.exists());
    }
}
