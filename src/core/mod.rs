//! Shared core types: errors, configuration and application paths.
//!
//! This module is platform-agnostic and does not depend on any UI toolkit.

pub mod config;
pub mod errors;

pub use config::{AppPaths, CanvasConfig};
pub use errors::{CoreError, CoreResult};
