//! Panorama renderer and its construction boundary
//!
//! Architecture:
//! - `sphere.rs` - the renderer instance (`SphereViewer`): current image, camera, plugins, listeners
//! - `camera.rs` - viewing direction, zoom and screen <-> sphere mapping
//! - `markers.rs` - hotspot overlay plugin
//! - `autorotate.rs` - continuous yaw rotation plugin
//!
//! `ViewerHandle` owns the renderer and guarantees it is released exactly once.
//! The renderer holds no authoritative state: it only reflects the session.

pub mod autorotate;
pub mod camera;
pub mod markers;
pub mod sphere;

use std::any::Any;

use crate::media::MediaError;

pub use autorotate::{AutorotateConfig, AutorotatePlugin};
pub use camera::Camera;
pub use markers::{Marker, MarkersPlugin, Position};
pub use sphere::SphereViewer;

/// Errors raised by the renderer
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViewerError {
    #[error("viewer needs a container")]
    MissingContainer,

    #[error("marker '{0}' already exists")]
    DuplicateMarker(String),

    #[error(transparent)]
    Load(#[from] MediaError),
}

/// Plugins activated at construction
#[derive(Debug, Clone, PartialEq)]
pub enum PluginConfig {
    Autorotate(AutorotateConfig),
    Markers,
}

/// Everything needed to construct a renderer
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    /// Name of the surface the renderer draws into
    pub container: String,
    /// Initial panorama URL
    pub panorama: String,
    /// Wider field of view
    pub fisheye: bool,
    /// Initial zoom, 0..=100
    pub default_zoom_lvl: f32,
    /// Show the zoom readout bar
    pub navbar: bool,
    pub plugins: Vec<PluginConfig>,
}

/// A renderer extension reachable through [`SphereViewer::plugin`]
pub trait Plugin: Any {
    fn name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Kinds of events a listener can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerEventKind {
    Click,
    SelectMarker,
    PanoramaLoaded,
}

/// Events published by the renderer
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    /// The panorama surface was clicked at this direction
    Click { pitch: f64, yaw: f64 },
    /// A marker was clicked
    SelectMarker { id: String },
    /// The panorama at `url` finished loading and is displayed
    PanoramaLoaded { url: String },
}

impl ViewerEvent {
    pub fn kind(&self) -> ViewerEventKind {
        match self {
            ViewerEvent::Click { .. } => ViewerEventKind::Click,
            ViewerEvent::SelectMarker { .. } => ViewerEventKind::SelectMarker,
            ViewerEvent::PanoramaLoaded { .. } => ViewerEventKind::PanoramaLoaded,
        }
    }
}

/// Registration returned by `add_event_listener`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Owns the renderer between construction and teardown.
///
/// The default handle owns nothing, as if already destroyed.
#[derive(Debug, Default)]
pub struct ViewerHandle {
    inner: Option<SphereViewer>,
}

impl ViewerHandle {
    /// Construct the renderer described by `config`
    pub fn create(config: ViewerConfig) -> Result<Self, ViewerError> {
        let viewer = SphereViewer::new(config)?;
        Ok(Self {
            inner: Some(viewer),
        })
    }

    /// The underlying renderer, None once destroyed
    pub fn get(&self) -> Option<&SphereViewer> {
        self.inner.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut SphereViewer> {
        self.inner.as_mut()
    }

    /// Release the renderer. Returns false if it was already released.
    pub fn destroy(&mut self) -> bool {
        match self.inner.take() {
            Some(viewer) => {
                log::info!("Destroying viewer in '{}'", viewer.container());
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> ViewerConfig {
    ViewerConfig {
        container: "viewer".to_string(),
        panorama: "assets/1.jpg".to_string(),
        fisheye: false,
        default_zoom_lvl: 50.0,
        navbar: false,
        plugins: vec![
            PluginConfig::Autorotate(AutorotateConfig::default()),
            PluginConfig::Markers,
        ],
    }
}
