use std::any::Any;

use super::{Camera, Plugin, ViewerError};

/// Click radius of a marker at scale 1.0, in pixels
pub const MARKER_RADIUS: f32 = 14.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub pitch: f64,
    pub yaw: f64,
}

/// A hotspot drawn over the panorama
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: String,
    pub position: Position,
    pub scale: f32,
}

/// Overlay of clickable markers anchored to sphere directions
#[derive(Debug, Default)]
pub struct MarkersPlugin {
    markers: Vec<Marker>,
}

impl MarkersPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn add_marker(&mut self, marker: Marker) -> Result<(), ViewerError> {
        if self.markers.iter().any(|m| m.id == marker.id) {
            return Err(ViewerError::DuplicateMarker(marker.id));
        }
        self.markers.push(marker);
        Ok(())
    }

    /// Returns false if no marker had this id
    pub fn remove_marker(&mut self, id: &str) -> bool {
        let before = self.markers.len();
        self.markers.retain(|m| m.id != id);
        self.markers.len() != before
    }

    pub fn clear_markers(&mut self) {
        self.markers.clear();
    }

    /// The marker under a screen point, nearest first
    pub fn hit_test(&self, camera: &Camera, x: f32, y: f32, width: f32, height: f32) -> Option<&Marker> {
        self.markers
            .iter()
            .filter_map(|marker| {
                let (mx, my) = camera.spherical_to_screen(
                    marker.position.pitch,
                    marker.position.yaw,
                    width,
                    height,
                )?;
                let distance = ((mx - x).powi(2) + (my - y).powi(2)).sqrt();
                (distance <= MARKER_RADIUS * marker.scale).then_some((marker, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(marker, _)| marker)
    }
}

impl Plugin for MarkersPlugin {
    fn name(&self) -> &'static str {
        "markers"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
