//! Shared data structures for the application state
//!
//! These structs represent the data model that flows between
//! the session store, the interaction controller and the UI layer.

/// A named viewing direction anchored on one panorama
#[derive(Debug, Clone, PartialEq)]
pub struct CameraPos {
    /// `{imageId}_{pitch}_{yaw}`, unique within the owning image
    pub id: String,
    /// Vertical angle in radians
    pub pitch: f64,
    /// Horizontal angle in radians
    pub yaw: f64,
    /// Panorama opened when this hotspot is selected in browse mode
    pub target: Option<String>,
}

impl CameraPos {
    /// Build the deterministic marker id for a position on an image.
    ///
    /// Uses the shortest round-trip float formatting, so `10.0` renders
    /// as `10` and `C_10_45` is the id for pitch 10, yaw 45 on image `C`.
    pub fn make_id(image_id: &str, pitch: f64, yaw: f64) -> String {
        format!("{}_{}_{}", image_id, pitch, yaw)
    }
}

/// Represents a single panorama in the gallery
#[derive(Debug, Clone, PartialEq)]
pub struct PanoramaItem {
    /// Unique session id (file stem for bundled assets, `pano-<millis>` for uploads)
    pub id: String,
    /// Bundled asset path or local object URL
    pub url: String,
    /// Whether this is the panorama currently shown
    pub active: bool,
    /// Hotspots placed on this panorama, in creation order
    pub camera_pos: Vec<CameraPos>,
}

impl PanoramaItem {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            active: false,
            camera_pos: Vec::new(),
        }
    }
}

/// What a click on the viewer does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    /// Selecting a marker jumps to its target panorama
    #[default]
    Browse,
    /// Clicking the surface places a marker, selecting a marker deletes it
    Edit,
}

impl InteractionMode {
    /// Label for the mode toggle button
    pub fn toggle_label(&self) -> &'static str {
        match self {
            InteractionMode::Browse => "Edit camera positions",
            InteractionMode::Edit => "Done editing",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            InteractionMode::Browse => InteractionMode::Edit,
            InteractionMode::Edit => InteractionMode::Browse,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_id_formatting() {
        assert_eq!(CameraPos::make_id("C", 10.0, 45.0), "C_10_45");
        assert_eq!(CameraPos::make_id("pano-1", -0.25, 1.5), "pano-1_-0.25_1.5");
    }

    #[test]
    fn test_mode_toggles_back() {
        let mode = InteractionMode::default();
        assert_eq!(mode, InteractionMode::Browse);
        assert_eq!(mode.toggled(), InteractionMode::Edit);
        assert_eq!(mode.toggled().toggled(), InteractionMode::Browse);
    }
}
