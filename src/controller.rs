//! Interaction controller
//!
//! Translates viewer events and UI actions into session mutations and
//! renderer calls. Owns the browse/edit state machine:
//!
//! | Mode   | Event           | Action                                   |
//! |--------|-----------------|------------------------------------------|
//! | Browse | marker selected | switch to the marker's target panorama   |
//! | Browse | edit toggle     | attach the surface click listener → Edit |
//! | Edit   | surface click   | add a camera position + visual marker    |
//! | Edit   | marker selected | remove the camera position + marker      |
//! | Edit   | edit toggle     | detach the surface click listener → Browse |
//!
//! Markers are re-anchored only once the renderer reports the new panorama
//! loaded. Every switch bumps a generation counter, and completions that
//! carry an older generation are dropped.

use std::time::Duration;

use crate::media::ObjectUrls;
use crate::picker::UrlFile;
use crate::state::data::{CameraPos, InteractionMode, PanoramaItem};
use crate::state::session::{Session, StoreError};
use crate::viewer::{
    ListenerId, Marker, MarkersPlugin, Position, SphereViewer, ViewerEvent, ViewerEventKind,
};

/// A panorama the UI must decode and hand back via `SphereViewer::finish_load`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub generation: u64,
    pub panorama_id: String,
    pub url: String,
}

/// Follow-up work the UI has to schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    None,
    Load(LoadRequest),
    /// Call `settle(generation)` after `delay`
    Settle { generation: u64, delay: Duration },
}

#[derive(Debug)]
pub struct InteractionController {
    /// Surface click listener, present only in edit mode
    click_listener: Option<ListenerId>,
    generation: u64,
    /// Generation and panorama id still waiting for markers
    anchoring: Option<(u64, String)>,
    settle_delay: Duration,
}

impl InteractionController {
    pub fn new(settle_delay: Duration) -> Self {
        Self {
            click_listener: None,
            generation: 0,
            anchoring: None,
            settle_delay,
        }
    }

    /// Register the listeners that stay for the whole session
    pub fn attach(&mut self, viewer: &mut SphereViewer) {
        viewer.add_event_listener(ViewerEventKind::SelectMarker);
        viewer.add_event_listener(ViewerEventKind::PanoramaLoaded);
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Flip between browse and edit mode
    pub fn toggle_mode(&mut self, session: &mut Session, viewer: &mut SphereViewer) {
        let next = session.mode().toggled();

        match next {
            InteractionMode::Edit => {
                if self.click_listener.is_none() {
                    self.click_listener = Some(viewer.add_event_listener(ViewerEventKind::Click));
                }
            }
            InteractionMode::Browse => {
                if let Some(listener) = self.click_listener.take() {
                    viewer.remove_event_listener(listener);
                }
            }
        }

        log::info!("Interaction mode: {:?}", next);
        session.set_mode(next);
    }

    /// React to an event delivered by the renderer
    pub fn handle_event(
        &mut self,
        session: &mut Session,
        viewer: &mut SphereViewer,
        event: ViewerEvent,
    ) -> Outcome {
        match (session.mode(), event) {
            (InteractionMode::Browse, ViewerEvent::SelectMarker { id }) => {
                let current = session.snapshot();
                let target = current
                    .active()
                    .and_then(|item| current.camera_pos(&item.id, &id))
                    .and_then(|pos| pos.target.clone());

                match target {
                    Some(target) => self
                        .switch_panorama(session, viewer, &target)
                        .map_or(Outcome::None, Outcome::Load),
                    None => {
                        log::debug!("Marker '{}' has no reachable target", id);
                        Outcome::None
                    }
                }
            }
            (InteractionMode::Edit, ViewerEvent::Click { pitch, yaw }) => {
                self.add_camera_pos(session, viewer, pitch, yaw);
                Outcome::None
            }
            (InteractionMode::Edit, ViewerEvent::SelectMarker { id }) => {
                self.remove_camera_pos(session, viewer, &id);
                Outcome::None
            }
            (_, ViewerEvent::PanoramaLoaded { url }) => self.panorama_loaded(session, viewer, &url),
            (mode, event) => {
                log::debug!("Ignoring {:?} in {:?} mode", event, mode);
                Outcome::None
            }
        }
    }

    /// Show another panorama.
    ///
    /// Requests the new source, marks it active, clears the rendered markers
    /// and returns the load the UI must perform. None if `id` is unknown.
    pub fn switch_panorama(
        &mut self,
        session: &mut Session,
        viewer: &mut SphereViewer,
        id: &str,
    ) -> Option<LoadRequest> {
        let url = session.find(id)?.url.clone();

        viewer.set_panorama(&url);
        session.set_active(id);
        if let Some(markers) = viewer.plugin_mut::<MarkersPlugin>() {
            markers.clear_markers();
        }

        self.generation += 1;
        self.anchoring = Some((self.generation, id.to_string()));

        Some(LoadRequest {
            generation: self.generation,
            panorama_id: id.to_string(),
            url,
        })
    }

    /// Add an uploaded file to the gallery as `id` and switch to it.
    ///
    /// On a duplicate id the object URL is revoked and nothing else changes.
    pub fn upload(
        &mut self,
        session: &mut Session,
        viewer: &mut SphereViewer,
        urls: &ObjectUrls,
        file: UrlFile,
        id: String,
    ) -> Result<LoadRequest, StoreError> {
        if let Err(e) = session.add_panorama(PanoramaItem::new(id.clone(), file.url.clone())) {
            log::warn!("Rejected upload of {}: {}", file.file.name, e);
            urls.revoke(&file.url);
            return Err(e);
        }

        log::info!("Uploaded {} as '{}'", file.file.name, id);
        // Just appended, so the lookup cannot miss
        self.switch_panorama(session, viewer, &id)
            .ok_or_else(|| StoreError::DuplicateId(id))
    }

    /// The load requested for `generation` failed.
    ///
    /// The renderer keeps showing the previous panorama, so the session goes
    /// back to it and its markers are drawn again.
    pub fn load_failed(&mut self, session: &mut Session, viewer: &mut SphereViewer, generation: u64) {
        if self.anchoring.as_ref().map(|(pending, _)| *pending) != Some(generation) {
            log::debug!("Dropping stale failure for generation {}", generation);
            return;
        }
        self.anchoring = None;

        let shown = viewer
            .source()
            .and_then(|url| session.items().iter().find(|item| item.url == url))
            .map(|item| item.id.clone());

        match shown {
            Some(id) => {
                session.set_active(&id);
                anchor_markers(session, viewer, &id);
                log::info!("Back on '{}' after a failed load", id);
            }
            None => {
                // Nothing on screen yet: keep the active item, show its markers
                if let Some(id) = session.active().map(|item| item.id.clone()) {
                    anchor_markers(session, viewer, &id);
                }
            }
        }
    }

    /// Settle delay elapsed for `generation`
    pub fn settle(&mut self, session: &Session, viewer: &mut SphereViewer, generation: u64) {
        match &self.anchoring {
            Some((pending, id)) if *pending == generation && Self::is_active(session, id) => {
                let id = id.clone();
                self.anchoring = None;
                anchor_markers(session, viewer, &id);
            }
            _ => log::debug!("Dropping stale settle for generation {}", generation),
        }
    }

    fn panorama_loaded(&mut self, session: &Session, viewer: &mut SphereViewer, url: &str) -> Outcome {
        let Some((generation, id)) = self.anchoring.clone() else {
            return Outcome::None;
        };

        let current = session.find(&id).is_some_and(|item| item.url == url);
        if !current || !Self::is_active(session, &id) {
            log::debug!("Loaded {} is not the panorama waiting for markers", url);
            return Outcome::None;
        }

        if self.settle_delay.is_zero() {
            self.settle(session, viewer, generation);
            Outcome::None
        } else {
            Outcome::Settle {
                generation,
                delay: self.settle_delay,
            }
        }
    }

    fn is_active(session: &Session, id: &str) -> bool {
        session.active().is_some_and(|item| item.id == id)
    }

    fn add_camera_pos(&self, session: &mut Session, viewer: &mut SphereViewer, pitch: f64, yaw: f64) {
        let Some(active) = session.active().map(|item| item.id.clone()) else {
            return;
        };
        let Some(pos) = session.add_camera_pos(&active, pitch, yaw) else {
            return;
        };

        log::info!("Added camera position {} on '{}'", pos.id, active);

        // While a swap is in flight the anchoring pass will draw it
        if self.anchoring.is_some() {
            return;
        }
        if let Some(markers) = viewer.plugin_mut::<MarkersPlugin>() {
            if let Err(e) = markers.add_marker(marker_for(&pos)) {
                log::debug!("{}", e);
            }
        }
    }

    fn remove_camera_pos(&self, session: &mut Session, viewer: &mut SphereViewer, marker_id: &str) {
        let Some(active) = session.active().map(|item| item.id.clone()) else {
            return;
        };

        if session.remove_camera_pos(&active, marker_id).is_some() {
            log::info!("Removed camera position {} from '{}'", marker_id, active);
        }
        if let Some(markers) = viewer.plugin_mut::<MarkersPlugin>() {
            markers.remove_marker(marker_id);
        }
    }
}

fn marker_for(pos: &CameraPos) -> Marker {
    Marker {
        id: pos.id.clone(),
        position: Position {
            pitch: pos.pitch,
            yaw: pos.yaw,
        },
        scale: 1.0,
    }
}

/// Replace the rendered markers with the camera positions of `panorama_id`
fn anchor_markers(session: &Session, viewer: &mut SphereViewer, panorama_id: &str) {
    let Some(item) = session.find(panorama_id) else {
        return;
    };
    let Some(markers) = viewer.plugin_mut::<MarkersPlugin>() else {
        return;
    };

    markers.clear_markers();
    for pos in &item.camera_pos {
        if let Err(e) = markers.add_marker(marker_for(pos)) {
            log::warn!("{}", e);
        }
    }
    log::debug!("Anchored {} markers on '{}'", item.camera_pos.len(), panorama_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::loader::LoadedPanorama;
    use crate::media::MediaError;
    use crate::picker::PickedFile;
    use std::path::PathBuf;
    use crate::viewer::{test_config, ViewerHandle};
    use iced::widget::image::Handle;

    fn setup(delay_ms: u64) -> (InteractionController, Session, ViewerHandle) {
        let items = ["A", "B", "C"]
            .iter()
            .map(|id| PanoramaItem::new(*id, format!("assets/{}.jpg", id)))
            .collect();
        let session = Session::seeded(items, 1);
        let mut handle = ViewerHandle::create(test_config()).unwrap();
        let mut controller = InteractionController::new(Duration::from_millis(delay_ms));
        controller.attach(handle.get_mut().unwrap());
        (controller, session, handle)
    }

    fn loaded() -> LoadedPanorama {
        LoadedPanorama {
            handle: Handle::from_rgba(1, 1, vec![0u8; 4]),
            width: 1,
            height: 1,
        }
    }

    /// Deliver a finished load through the renderer, as the UI does
    fn complete(
        controller: &mut InteractionController,
        session: &mut Session,
        viewer: &mut SphereViewer,
        request: &LoadRequest,
    ) -> Outcome {
        match viewer.finish_load(&request.url, Ok(loaded())).unwrap() {
            Some(event) => controller.handle_event(session, viewer, event),
            None => Outcome::None,
        }
    }

    fn rendered(viewer: &SphereViewer) -> Vec<String> {
        viewer
            .plugin::<MarkersPlugin>()
            .unwrap()
            .markers()
            .iter()
            .map(|m| m.id.clone())
            .collect()
    }

    #[test]
    fn test_mode_round_trip_leaves_session_untouched() {
        let (mut controller, mut session, mut handle) = setup(0);
        let viewer = handle.get_mut().unwrap();
        session.add_camera_pos("B", 0.1, 0.2);
        let before = session.clone();

        controller.toggle_mode(&mut session, viewer);
        assert_eq!(session.mode(), InteractionMode::Edit);
        assert!(viewer.has_listener(ViewerEventKind::Click));

        controller.toggle_mode(&mut session, viewer);
        assert_eq!(session.mode(), InteractionMode::Browse);
        assert!(!viewer.has_listener(ViewerEventKind::Click));
        assert_eq!(session, before);
    }

    #[test]
    fn test_edit_click_adds_and_select_removes() {
        let (mut controller, mut session, mut handle) = setup(0);
        let viewer = handle.get_mut().unwrap();
        controller.toggle_mode(&mut session, viewer);

        let event = viewer.emit(ViewerEvent::Click { pitch: 10.0, yaw: 45.0 }).unwrap();
        assert_eq!(controller.handle_event(&mut session, viewer, event), Outcome::None);
        assert_eq!(session.find("B").unwrap().camera_pos.len(), 1);
        assert_eq!(rendered(viewer), vec!["B_10_45".to_string()]);

        let event = ViewerEvent::SelectMarker { id: "B_10_45".to_string() };
        controller.handle_event(&mut session, viewer, event);
        assert!(session.find("B").unwrap().camera_pos.is_empty());
        assert!(rendered(viewer).is_empty());
    }

    #[test]
    fn test_browse_ignores_surface_clicks() {
        let (mut controller, mut session, mut handle) = setup(0);
        let viewer = handle.get_mut().unwrap();
        let before = session.clone();

        // No click listener outside edit mode
        assert!(viewer.emit(ViewerEvent::Click { pitch: 0.0, yaw: 0.0 }).is_none());
        controller.handle_event(&mut session, viewer, ViewerEvent::Click { pitch: 0.0, yaw: 0.0 });
        assert_eq!(session, before);
    }

    #[test]
    fn test_browse_marker_jumps_and_reanchors() {
        let (mut controller, mut session, mut handle) = setup(0);
        let viewer = handle.get_mut().unwrap();
        let to_c = session.add_camera_pos("B", 0.0, 0.0).unwrap();
        session.add_camera_pos("C", 0.3, 0.4);
        session.add_camera_pos("C", -0.3, 1.4);

        let outcome = controller.handle_event(
            &mut session,
            viewer,
            ViewerEvent::SelectMarker { id: to_c.id },
        );
        let Outcome::Load(request) = outcome else {
            panic!("expected a load request, got {:?}", outcome);
        };
        assert_eq!(request.panorama_id, "C");
        assert_eq!(session.active().unwrap().id, "C");
        assert_eq!(viewer.pending(), Some("assets/C.jpg"));
        assert!(rendered(viewer).is_empty());

        let outcome = complete(&mut controller, &mut session, viewer, &request);
        assert_eq!(outcome, Outcome::None);
        assert_eq!(rendered(viewer), vec!["C_0.3_0.4".to_string(), "C_-0.3_1.4".to_string()]);
    }

    #[test]
    fn test_switch_to_unknown_panorama_is_noop() {
        let (mut controller, mut session, mut handle) = setup(0);
        let viewer = handle.get_mut().unwrap();
        let before = session.clone();

        assert!(controller.switch_panorama(&mut session, viewer, "Z").is_none());
        assert_eq!(session, before);
        assert_eq!(controller.generation(), 0);
    }

    #[test]
    fn test_settle_delay_and_stale_generation() {
        let (mut controller, mut session, mut handle) = setup(1000);
        let viewer = handle.get_mut().unwrap();
        session.add_camera_pos("A", 0.1, 0.1);
        session.add_camera_pos("C", 0.2, 0.2);

        let to_a = controller.switch_panorama(&mut session, viewer, "A").unwrap();
        let outcome = complete(&mut controller, &mut session, viewer, &to_a);
        assert_eq!(
            outcome,
            Outcome::Settle {
                generation: to_a.generation,
                delay: Duration::from_millis(1000)
            }
        );

        // User moves on before the delay elapses
        let to_c = controller.switch_panorama(&mut session, viewer, "C").unwrap();
        controller.settle(&session, viewer, to_a.generation);
        assert!(rendered(viewer).is_empty());

        complete(&mut controller, &mut session, viewer, &to_c);
        controller.settle(&session, viewer, to_c.generation);
        assert_eq!(rendered(viewer), vec!["C_0.2_0.2".to_string()]);
    }

    #[test]
    fn test_stale_load_does_not_anchor() {
        let (mut controller, mut session, mut handle) = setup(0);
        let viewer = handle.get_mut().unwrap();
        session.add_camera_pos("A", 0.1, 0.1);

        let to_a = controller.switch_panorama(&mut session, viewer, "A").unwrap();
        let to_c = controller.switch_panorama(&mut session, viewer, "C").unwrap();

        // The renderer drops A's result because C is now requested
        assert_eq!(complete(&mut controller, &mut session, viewer, &to_a), Outcome::None);
        assert!(rendered(viewer).is_empty());

        complete(&mut controller, &mut session, viewer, &to_c);
        assert!(rendered(viewer).is_empty());
        assert_eq!(session.active().unwrap().id, "C");
    }

    #[test]
    fn test_failed_load_returns_to_shown_panorama() {
        let (mut controller, mut session, mut handle) = setup(0);
        let viewer = handle.get_mut().unwrap();
        session.add_camera_pos("B", 0.1, 0.1);

        let to_b = controller.switch_panorama(&mut session, viewer, "B").unwrap();
        complete(&mut controller, &mut session, viewer, &to_b);
        controller.toggle_mode(&mut session, viewer);

        let to_a = controller.switch_panorama(&mut session, viewer, "A").unwrap();
        let err = MediaError::Decode {
            path: to_a.url.clone(),
            reason: "bad".to_string(),
        };
        assert!(viewer.finish_load(&to_a.url, Err(err)).is_err());
        controller.load_failed(&mut session, viewer, to_a.generation);

        assert_eq!(viewer.source(), Some("assets/B.jpg"));
        assert_eq!(session.active().unwrap().id, "B");
        assert_eq!(rendered(viewer), vec!["B_0.1_0.1".to_string()]);

        // Clicks land on the panorama actually on screen, and are drawn
        controller.handle_event(&mut session, viewer, ViewerEvent::Click { pitch: 0.2, yaw: 0.3 });
        controller.handle_event(&mut session, viewer, ViewerEvent::Click { pitch: 0.4, yaw: 0.5 });
        assert!(session.find("A").unwrap().camera_pos.is_empty());
        assert_eq!(session.find("B").unwrap().camera_pos.len(), 3);
        assert_eq!(rendered(viewer).len(), 3);
    }

    #[test]
    fn test_stale_failure_ignored() {
        let (mut controller, mut session, mut handle) = setup(0);
        let viewer = handle.get_mut().unwrap();

        let to_a = controller.switch_panorama(&mut session, viewer, "A").unwrap();
        let to_c = controller.switch_panorama(&mut session, viewer, "C").unwrap();
        controller.load_failed(&mut session, viewer, to_a.generation);

        assert_eq!(session.active().unwrap().id, "C");
        complete(&mut controller, &mut session, viewer, &to_c);
        assert_eq!(viewer.source(), Some("assets/C.jpg"));
    }

    #[test]
    fn test_upload_appends_and_switches() {
        let (mut controller, mut session, mut handle) = setup(0);
        let viewer = handle.get_mut().unwrap();
        let urls = ObjectUrls::new();
        let file = UrlFile {
            url: urls.create(PathBuf::from("/tmp/new.jpg")),
            file: PickedFile::new("/tmp/new.jpg"),
        };
        let url = file.url.clone();

        let request = controller
            .upload(&mut session, viewer, &urls, file, "pano-1700000000000".to_string())
            .unwrap();

        assert_eq!(request.panorama_id, "pano-1700000000000");
        assert_eq!(request.url, url);
        assert_eq!(session.len(), 4);
        assert_eq!(session.items().last().unwrap().url, url);
        assert_eq!(session.active().unwrap().id, "pano-1700000000000");
        assert_eq!(viewer.pending(), Some(url.as_str()));
        assert!(urls.resolve(&url).is_some());
    }

    #[test]
    fn test_upload_with_taken_id_revokes_url() {
        let (mut controller, mut session, mut handle) = setup(0);
        let viewer = handle.get_mut().unwrap();
        let urls = ObjectUrls::new();
        let file = UrlFile {
            url: urls.create(PathBuf::from("/tmp/new.jpg")),
            file: PickedFile::new("/tmp/new.jpg"),
        };
        let url = file.url.clone();
        let before = session.clone();
        let generation = controller.generation();

        let err = controller
            .upload(&mut session, viewer, &urls, file, "C".to_string())
            .unwrap_err();

        assert_eq!(err, StoreError::DuplicateId("C".to_string()));
        assert_eq!(session, before);
        assert_eq!(controller.generation(), generation);
        assert!(urls.resolve(&url).is_none());
        assert_ne!(viewer.pending(), Some(url.as_str()));
    }

    #[test]
    fn test_edit_click_during_swap_drawn_once() {
        let (mut controller, mut session, mut handle) = setup(0);
        let viewer = handle.get_mut().unwrap();
        controller.toggle_mode(&mut session, viewer);

        let request = controller.switch_panorama(&mut session, viewer, "A").unwrap();
        controller.handle_event(&mut session, viewer, ViewerEvent::Click { pitch: 0.5, yaw: 0.5 });
        assert!(rendered(viewer).is_empty());

        complete(&mut controller, &mut session, viewer, &request);
        assert_eq!(rendered(viewer), vec!["A_0.5_0.5".to_string()]);
    }
}
