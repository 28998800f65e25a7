//! Bounded caches owned by the editor and handed to renderers
//!
//! All caches use interior locking (parking_lot, which doesn't poison) so a
//! shared reference can be passed to worker tasks.

mod recent;
mod sticker;
mod thumbnail;

pub use recent::RecentStickers;
pub use sticker::{ImageCache, StickerTextureCache};
pub use thumbnail::{content_hash, ThumbnailCache};
