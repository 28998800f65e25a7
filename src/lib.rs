//! Dayink - canvas engine for a day-by-day visual journal
//!
//! Each day owns a page of multi-layer ink and stickers. This crate holds the
//! stroke model, spatial index, smoothing engine, layer baking, snapshots and
//! the background worker; UI and database live elsewhere.

pub mod cache;
pub mod core;
pub mod document;
pub mod geometry;
pub mod input;
pub mod render;
pub mod spatial;
pub mod stroke;
pub mod worker;

pub use crate::core::{AppPaths, CanvasConfig, CoreError, CoreResult};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the default filter. Calling twice is harmless.
pub fn init_logging() {
    let result = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dayink=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if result.is_ok() {
        tracing::info!("Dayink initializing...");
    }
}

/// Logging, data directories and configuration for the default location
pub fn init() -> (AppPaths, CanvasConfig) {
    init_logging();

    let paths = AppPaths::default_location();
    paths.ensure_dirs();
    let config = CanvasConfig::load(&paths.config_file());
    tracing::debug!("Data root {:?}, buffer {}px", paths.root(), config.buffer_dim);
    (paths, config)
}
