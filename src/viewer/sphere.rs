use cgmath::Vector2;
use std::time::Instant;

use super::{
    AutorotatePlugin, Camera, ListenerId, MarkersPlugin, Plugin, PluginConfig, ViewerConfig,
    ViewerError, ViewerEvent, ViewerEventKind,
};
use crate::media::loader::LoadedPanorama;
use crate::media::MediaError;

/// The renderer instance: what is shown, from where, and who is listening.
pub struct SphereViewer {
    container: String,
    /// URL of the panorama on screen
    source: Option<String>,
    /// URL requested by `set_panorama` and not loaded yet
    pending: Option<String>,
    image: Option<LoadedPanorama>,
    camera: Camera,
    navbar: bool,
    plugins: Vec<Box<dyn Plugin>>,
    listeners: Vec<(ListenerId, ViewerEventKind)>,
    next_listener: u64,
}

impl SphereViewer {
    pub(super) fn new(config: ViewerConfig) -> Result<Self, ViewerError> {
        if config.container.trim().is_empty() {
            return Err(ViewerError::MissingContainer);
        }

        let plugins: Vec<Box<dyn Plugin>> = config
            .plugins
            .into_iter()
            .map(|plugin| -> Box<dyn Plugin> {
                match plugin {
                    PluginConfig::Autorotate(cfg) => Box::new(AutorotatePlugin::new(cfg)),
                    PluginConfig::Markers => Box::new(MarkersPlugin::new()),
                }
            })
            .collect();

        log::info!(
            "Created viewer in '{}' (fisheye: {}, zoom: {}, plugins: [{}])",
            config.container,
            config.fisheye,
            config.default_zoom_lvl,
            plugins.iter().map(|p| p.name()).collect::<Vec<_>>().join(", ")
        );

        Ok(Self {
            container: config.container,
            source: None,
            pending: (!config.panorama.is_empty()).then_some(config.panorama),
            image: None,
            camera: Camera::new(config.default_zoom_lvl, config.fisheye),
            navbar: config.navbar,
            plugins,
            listeners: Vec::new(),
            next_listener: 0,
        })
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn navbar(&self) -> bool {
        self.navbar
    }

    /// The decoded panorama currently displayed
    pub fn image(&self) -> Option<&LoadedPanorama> {
        self.image.as_ref()
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// URL waiting for `finish_load`
    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Request a panorama swap. The current image stays on screen until
    /// the new one is delivered through `finish_load`.
    pub fn set_panorama(&mut self, url: &str) {
        log::debug!("Loading panorama {}", url);
        self.pending = Some(url.to_string());
    }

    /// Deliver the result of loading `url`.
    ///
    /// Returns `Ok(None)` when `url` is no longer the requested panorama,
    /// otherwise the `PanoramaLoaded` event (if anyone listens for it).
    pub fn finish_load(
        &mut self,
        url: &str,
        result: Result<LoadedPanorama, MediaError>,
    ) -> Result<Option<ViewerEvent>, ViewerError> {
        if self.pending.as_deref() != Some(url) {
            log::debug!("Discarding stale load of {}", url);
            return Ok(None);
        }
        self.pending = None;

        let loaded = result?;
        self.image = Some(loaded);
        self.source = Some(url.to_string());

        Ok(self.emit(ViewerEvent::PanoramaLoaded {
            url: url.to_string(),
        }))
    }

    /// Look up an activated plugin by type
    pub fn plugin<P: Plugin>(&self) -> Option<&P> {
        self.plugins
            .iter()
            .find_map(|plugin| plugin.as_any().downcast_ref::<P>())
    }

    pub fn plugin_mut<P: Plugin>(&mut self) -> Option<&mut P> {
        find_plugin_mut(&mut self.plugins)
    }

    pub fn add_event_listener(&mut self, kind: ViewerEventKind) -> ListenerId {
        self.next_listener += 1;
        let id = ListenerId::new(self.next_listener);
        self.listeners.push((id, kind));
        id
    }

    /// Returns false if the listener was not registered
    pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    pub fn has_listener(&self, kind: ViewerEventKind) -> bool {
        self.listeners.iter().any(|(_, k)| *k == kind)
    }

    /// Publish an event; it is delivered only if a listener wants its kind
    pub fn emit(&self, event: ViewerEvent) -> Option<ViewerEvent> {
        self.has_listener(event.kind()).then_some(event)
    }

    /// Resolve a click on a `width` x `height` surface into an event:
    /// a marker selection if a marker is under the cursor, else a surface click
    pub fn click_at(&self, x: f32, y: f32, width: f32, height: f32) -> Option<ViewerEvent> {
        let hit = self
            .plugin::<MarkersPlugin>()
            .and_then(|markers| markers.hit_test(&self.camera, x, y, width, height));

        match hit {
            Some(marker) => self.emit(ViewerEvent::SelectMarker {
                id: marker.id.clone(),
            }),
            None => {
                let (pitch, yaw) = self.camera.screen_to_spherical(x, y, width, height);
                self.emit(ViewerEvent::Click { pitch, yaw })
            }
        }
    }

    /// User drag. Manual navigation stops autorotation.
    pub fn pan(&mut self, delta: Vector2<f32>, width: f32) {
        if let Some(autorotate) = find_plugin_mut::<AutorotatePlugin>(&mut self.plugins) {
            autorotate.stop();
        }
        self.camera.pan(delta, width);
    }

    pub fn zoom_by(&mut self, delta: f32) {
        self.camera.zoom_by(delta);
    }

    /// Whether the renderer needs animation frames
    pub fn is_animating(&self) -> bool {
        self.plugin::<AutorotatePlugin>()
            .is_some_and(AutorotatePlugin::is_running)
    }

    /// Animation frame
    pub fn tick(&mut self, now: Instant) {
        if let Some(autorotate) = find_plugin_mut::<AutorotatePlugin>(&mut self.plugins) {
            autorotate.advance(&mut self.camera, now);
        }
    }
}

fn find_plugin_mut<P: Plugin>(plugins: &mut [Box<dyn Plugin>]) -> Option<&mut P> {
    plugins
        .iter_mut()
        .find_map(|plugin| plugin.as_any_mut().downcast_mut::<P>())
}

impl std::fmt::Debug for SphereViewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SphereViewer")
            .field("container", &self.container)
            .field("source", &self.source)
            .field("pending", &self.pending)
            .field("camera", &self.camera)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
