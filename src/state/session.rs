use super::data::{CameraPos, InteractionMode, PanoramaItem};

/// Errors raised by session mutations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A panorama with this id is already in the gallery
    #[error("panorama id '{0}' is already in the gallery")]
    DuplicateId(String),
}

/// The Session holds the gallery, the active panorama and the interaction mode.
///
/// All operations are synchronous. Lookups that miss leave the state untouched
/// and report the miss through their return value instead of an error.
#[derive(Clone, Default, PartialEq)]
pub struct Session {
    items: Vec<PanoramaItem>,
    mode: InteractionMode,
}

impl Session {
    /// Create a session seeded with the given gallery.
    ///
    /// `initial` is clamped to the gallery size; an empty gallery has no active item.
    pub fn seeded(items: Vec<PanoramaItem>, initial: usize) -> Self {
        let mut session = Session {
            items,
            mode: InteractionMode::Browse,
        };

        if let Some(last) = session.items.len().checked_sub(1) {
            let id = session.items[initial.min(last)].id.clone();
            session.set_active(&id);
        }

        session
    }

    /// Read-only view of the current state.
    ///
    /// Views and event handlers read the gallery through this at the moment
    /// they run and never keep a copy, so a later mutation cannot leave them
    /// looking at a stale gallery. The borrow checker enforces it: the view
    /// cannot outlive the next `&mut` call on the session.
    pub fn snapshot(&self) -> &Self {
        self
    }

    pub fn items(&self) -> &[PanoramaItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: InteractionMode) {
        self.mode = mode;
    }

    pub fn find(&self, id: &str) -> Option<&PanoramaItem> {
        self.items.iter().find(|item| item.id == id)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut PanoramaItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    /// Get the panorama currently shown, if any
    pub fn active(&self) -> Option<&PanoramaItem> {
        self.items.iter().find(|item| item.active)
    }

    /// Make `id` the only active panorama.
    /// Returns false (and changes nothing) if the id is unknown.
    pub fn set_active(&mut self, id: &str) -> bool {
        if self.find(id).is_none() {
            log::debug!("set_active: no panorama '{}'", id);
            return false;
        }

        for item in &mut self.items {
            item.active = item.id == id;
        }
        true
    }

    /// Append a panorama to the gallery.
    /// The caller decides whether it becomes active.
    pub fn add_panorama(&mut self, mut item: PanoramaItem) -> Result<(), StoreError> {
        if self.find(&item.id).is_some() {
            return Err(StoreError::DuplicateId(item.id));
        }

        // Activation goes through set_active only
        item.active = false;
        log::info!("Added panorama '{}' ({})", item.id, item.url);
        self.items.push(item);
        Ok(())
    }

    /// Place a camera position on an image.
    ///
    /// The new hotspot targets the gallery item after `image_id` (wrapping).
    /// Returns the existing marker when the same position is added twice,
    /// and None when the image is unknown.
    pub fn add_camera_pos(&mut self, image_id: &str, pitch: f64, yaw: f64) -> Option<CameraPos> {
        let target = self.next_id(image_id);
        let item = self.find_mut(image_id)?;

        let id = CameraPos::make_id(image_id, pitch, yaw);
        if let Some(existing) = item.camera_pos.iter().find(|pos| pos.id == id) {
            return Some(existing.clone());
        }

        let pos = CameraPos {
            id,
            pitch,
            yaw,
            target,
        };
        item.camera_pos.push(pos.clone());
        Some(pos)
    }

    /// Remove a camera position by id. Removing twice is a no-op.
    pub fn remove_camera_pos(&mut self, image_id: &str, marker_id: &str) -> Option<CameraPos> {
        let item = self.find_mut(image_id)?;
        let index = item.camera_pos.iter().position(|pos| pos.id == marker_id)?;
        Some(item.camera_pos.remove(index))
    }

    /// Look up a marker on an image
    pub fn camera_pos(&self, image_id: &str, marker_id: &str) -> Option<&CameraPos> {
        self.find(image_id)?
            .camera_pos
            .iter()
            .find(|pos| pos.id == marker_id)
    }

    /// Id of the item following `id` in gallery order, wrapping around.
    /// None for a single-item gallery or an unknown id.
    fn next_id(&self, id: &str) -> Option<String> {
        let index = self.items.iter().position(|item| item.id == id)?;
        let next = &self.items[(index + 1) % self.items.len()];
        (next.id != id).then(|| next.id.clone())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("items", &self.items.len())
            .field("active", &self.active().map(|item| item.id.as_str()))
            .field("mode", &self.mode)
            .finish()
    }
}
