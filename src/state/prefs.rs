//! User preferences for the viewer
//!
//! Stored as JSON in the user's config directory:
//! - Linux: ~/.config/pano-viewer/preferences.json
//! - macOS: ~/Library/Application Support/pano-viewer/preferences.json
//! - Windows: %APPDATA%\pano-viewer\preferences.json
//!
//! Every field has a serde default, so a partial file only overrides what it names.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Current preferences file format version
pub const PREFS_VERSION: u32 = 1;

/// Errors that can occur when loading preferences
#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    #[error("failed to parse preferences: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("preferences version {found} is newer than supported version {supported}")]
    VersionTooNew { found: u32, supported: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Autorotation behaviour at startup
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct AutorotatePrefs {
    /// Start rotating as soon as the viewer is created
    pub autostart: bool,
    /// Rotation speed in revolutions per minute
    pub speed_rpm: f32,
    /// Pitch (radians) the camera eases toward while rotating
    pub pitch: f32,
}

impl Default for AutorotatePrefs {
    fn default() -> Self {
        Self {
            autostart: true,
            speed_rpm: 2.0,
            pitch: 0.0,
        }
    }
}

/// All user-tunable settings
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Preferences {
    /// File format version
    pub version: u32,

    /// Folder scanned for the bundled gallery
    pub assets_dir: PathBuf,

    /// Index of the panorama shown first (clamped to the gallery size)
    pub initial_index: usize,

    /// Initial zoom level (0 = widest, 100 = closest)
    pub default_zoom_lvl: f32,

    /// Wider field of view
    pub fisheye: bool,

    /// Show the zoom readout bar under the viewer
    pub navbar: bool,

    pub autorotate: AutorotatePrefs,

    /// Extra delay between "panorama loaded" and re-anchoring markers
    pub marker_settle_ms: u64,

    /// Default log filter when RUST_LOG is unset
    pub log_level: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            version: PREFS_VERSION,
            assets_dir: PathBuf::from("assets"),
            initial_index: 1,
            default_zoom_lvl: 30.0,
            fisheye: true,
            navbar: false,
            autorotate: AutorotatePrefs::default(),
            marker_settle_ms: 0,
            log_level: "info".to_string(),
        }
    }
}

impl Preferences {
    /// Convert to JSON string for storage
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse from JSON, rejecting files written by a newer version
    pub fn from_json(json: &str) -> Result<Self, PrefsError> {
        let prefs: Self = serde_json::from_str(json)?;

        if prefs.version > PREFS_VERSION {
            return Err(PrefsError::VersionTooNew {
                found: prefs.version,
                supported: PREFS_VERSION,
            });
        }

        Ok(prefs)
    }

    /// Get the path where preferences are stored
    pub fn default_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir().or_else(dirs::home_dir)?;
        path.push("pano-viewer");
        path.push("preferences.json");
        Some(path)
    }

    /// Read preferences from a file
    pub fn load_from(path: &Path) -> Result<Self, PrefsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load from the default path, falling back to defaults.
    ///
    /// Runs before the logger is configured, so problems are returned
    /// alongside the defaults and logged by the caller.
    pub fn load_or_default() -> (Self, Option<PrefsError>) {
        let Some(path) = Self::default_path() else {
            return (Self::default(), None);
        };

        if !path.exists() {
            return (Self::default(), None);
        }

        match Self::load_from(&path) {
            Ok(prefs) => (prefs, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Autorotation step per second, in radians
    pub fn autorotate_speed(&self) -> f32 {
        self.autorotate.speed_rpm * std::f32::consts::TAU / 60.0
    }
}
