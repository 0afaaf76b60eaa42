//! Panorama media handling
//!
//! This module handles:
//! - Local object URLs for uploaded files (object_url.rs)
//! - Discovering the bundled gallery (assets.rs)
//! - Decoding panoramas off the UI thread (loader.rs)
//! - Generating in-memory thumbnails (thumbnail.rs)

pub mod assets;
pub mod loader;
pub mod object_url;
pub mod thumbnail;

pub use object_url::ObjectUrls;

/// Errors produced while resolving or decoding panorama sources.
///
/// Carried inside UI messages, so causes are kept as strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MediaError {
    #[error("no file behind '{0}' (revoked or never created)")]
    UnknownSource(String),

    #[error("failed to read {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("background task failed: {0}")]
    Join(String),
}
