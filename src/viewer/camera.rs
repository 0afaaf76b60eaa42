//! Viewing direction and screen mapping
//!
//! The panorama is drawn as a flat equirectangular strip: one screen pixel
//! covers the same angle horizontally and vertically, and the strip wraps
//! every full turn of yaw.

use cgmath::Vector2;
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Field of view at zoom 100, degrees
pub const MIN_FOV_DEG: f64 = 30.0;
/// Field of view at zoom 0, degrees
pub const MAX_FOV_DEG: f64 = 90.0;
/// Field of view at zoom 0 with fisheye enabled, degrees
pub const FISHEYE_MAX_FOV_DEG: f64 = 120.0;

/// Screen rectangle covered by one copy of the panorama
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Radians in [-PI, PI)
    pub yaw: f64,
    /// Radians in [-PI/2, PI/2]
    pub pitch: f64,
    /// 0 (widest) ..= 100 (closest)
    pub zoom_lvl: f32,
    pub fisheye: bool,
}

impl Camera {
    pub fn new(zoom_lvl: f32, fisheye: bool) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            zoom_lvl: zoom_lvl.clamp(0.0, 100.0),
            fisheye,
        }
    }

    /// Horizontal field of view in radians
    pub fn fov(&self) -> f64 {
        let max = if self.fisheye { FISHEYE_MAX_FOV_DEG } else { MAX_FOV_DEG };
        let t = f64::from(self.zoom_lvl) / 100.0;
        (max + (MIN_FOV_DEG - max) * t).to_radians()
    }

    fn radians_per_pixel(&self, width: f32) -> f64 {
        self.fov() / f64::from(width.max(1.0))
    }

    pub fn rotate(&mut self, d_yaw: f64, d_pitch: f64) {
        self.yaw = wrap_angle(self.yaw + d_yaw);
        self.pitch = (self.pitch + d_pitch).clamp(-FRAC_PI_2, FRAC_PI_2);
    }

    /// Drag the view by a screen-space delta (pixels)
    pub fn pan(&mut self, delta: Vector2<f32>, width: f32) {
        let rpp = self.radians_per_pixel(width);
        // Dragging right pulls the scene right, so the camera turns left
        self.rotate(-f64::from(delta.x) * rpp, f64::from(delta.y) * rpp);
    }

    pub fn zoom_by(&mut self, delta: f32) {
        self.zoom_lvl = (self.zoom_lvl + delta).clamp(0.0, 100.0);
    }

    /// Direction under a point of a `width` x `height` surface, as (pitch, yaw)
    pub fn screen_to_spherical(&self, x: f32, y: f32, width: f32, height: f32) -> (f64, f64) {
        let rpp = self.radians_per_pixel(width);
        let dx = f64::from(x - width / 2.0);
        let dy = f64::from(y - height / 2.0);

        let yaw = wrap_angle(self.yaw + dx * rpp);
        let pitch = (self.pitch - dy * rpp).clamp(-FRAC_PI_2, FRAC_PI_2);
        (pitch, yaw)
    }

    /// Screen point of a direction, None when it falls outside the surface
    pub fn spherical_to_screen(
        &self,
        pitch: f64,
        yaw: f64,
        width: f32,
        height: f32,
    ) -> Option<(f32, f32)> {
        let rpp = self.radians_per_pixel(width);
        let x = width / 2.0 + (wrap_angle(yaw - self.yaw) / rpp) as f32;
        let y = height / 2.0 - ((pitch - self.pitch) / rpp) as f32;

        let visible = (0.0..=width).contains(&x) && (0.0..=height).contains(&y);
        visible.then_some((x, y))
    }

    /// Placement of the panorama strip; repeat it every `width` to wrap
    pub fn image_rect(&self, width: f32, height: f32) -> ImageRect {
        let rpp = self.radians_per_pixel(width);
        let strip_width = (TAU / rpp) as f32;
        let strip_height = (PI / rpp) as f32;

        // Left edge of the strip is yaw -PI, top edge is pitch +PI/2
        let x = width / 2.0 - ((self.yaw + PI) / rpp) as f32;
        let y = height / 2.0 - ((FRAC_PI_2 - self.pitch) / rpp) as f32;

        ImageRect {
            x,
            y,
            width: strip_width,
            height: strip_height,
        }
    }
}

/// Normalize an angle to [-PI, PI)
pub fn wrap_angle(angle: f64) -> f64 {
    (angle + PI).rem_euclid(TAU) - PI
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_center_maps_to_camera_direction() {
        let mut camera = Camera::new(50.0, false);
        camera.rotate(1.0, 0.25);

        let (pitch, yaw) = camera.screen_to_spherical(400.0, 300.0, 800.0, 600.0);
        assert!((pitch - 0.25).abs() < EPS);
        assert!((yaw - 1.0).abs() < EPS);
    }

    #[test]
    fn test_screen_round_trip() {
        let camera = Camera::new(30.0, true);
        let (pitch, yaw) = camera.screen_to_spherical(120.0, 80.0, 800.0, 600.0);
        let (x, y) = camera.spherical_to_screen(pitch, yaw, 800.0, 600.0).unwrap();
        assert!((x - 120.0).abs() < 1e-3);
        assert!((y - 80.0).abs() < 1e-3);
    }

    #[test]
    fn test_behind_camera_not_visible() {
        let camera = Camera::new(0.0, false);
        assert!(camera.spherical_to_screen(0.0, PI - 0.1, 800.0, 600.0).is_none());
    }

    #[test]
    fn test_yaw_wraps_and_pitch_clamps() {
        let mut camera = Camera::new(0.0, false);
        camera.rotate(PI + 0.5, 10.0);
        assert!((camera.yaw - (-PI + 0.5)).abs() < EPS);
        assert_eq!(camera.pitch, FRAC_PI_2);
    }

    #[test]
    fn test_zoom_narrows_fov() {
        let mut camera = Camera::new(0.0, false);
        assert!((camera.fov() - MAX_FOV_DEG.to_radians()).abs() < EPS);
        camera.zoom_by(250.0);
        assert_eq!(camera.zoom_lvl, 100.0);
        assert!((camera.fov() - MIN_FOV_DEG.to_radians()).abs() < EPS);
    }

    #[test]
    fn test_image_rect_centers_on_yaw_zero() {
        let camera = Camera::new(0.0, false);
        let rect = camera.image_rect(900.0, 600.0);
        // 90 degrees across 900px: the strip spans 3600px, centred on screen
        assert!((rect.width - 3600.0).abs() < 1e-2);
        assert!((rect.x + rect.width / 2.0 - 450.0).abs() < 1e-2);
        assert!((rect.y + rect.height / 2.0 - 300.0).abs() < 1e-2);
    }

    #[test]
    fn test_pan_turns_against_drag() {
        let mut camera = Camera::new(0.0, false);
        camera.pan(Vector2::new(100.0, 0.0), 900.0);
        assert!((camera.yaw + 10f64.to_radians()).abs() < 1e-9);
    }
}
