use std::any::Any;
use std::time::Instant;

use super::{Camera, Plugin};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutorotateConfig {
    /// Radians per second
    pub speed: f64,
    /// Pitch the camera eases toward while rotating
    pub autorotate_pitch: f64,
}

impl Default for AutorotateConfig {
    fn default() -> Self {
        Self {
            // 2 rpm
            speed: std::f64::consts::TAU / 30.0,
            autorotate_pitch: 0.0,
        }
    }
}

/// Continuous yaw rotation, driven by `tick`
#[derive(Debug)]
pub struct AutorotatePlugin {
    config: AutorotateConfig,
    running: bool,
    last_tick: Option<Instant>,
}

impl AutorotatePlugin {
    pub fn new(config: AutorotateConfig) -> Self {
        Self {
            config,
            running: false,
            last_tick: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start(&mut self) {
        if !self.running {
            log::debug!("Autorotate started");
        }
        self.running = true;
        self.last_tick = None;
    }

    pub fn stop(&mut self) {
        if self.running {
            log::debug!("Autorotate stopped");
        }
        self.running = false;
        self.last_tick = None;
    }

    pub fn toggle(&mut self) {
        if self.running {
            self.stop();
        } else {
            self.start();
        }
    }

    /// Advance the camera by the time elapsed since the previous tick
    pub fn advance(&mut self, camera: &mut Camera, now: Instant) {
        if !self.running {
            return;
        }

        let Some(last) = self.last_tick.replace(now) else {
            return;
        };
        let dt = now.saturating_duration_since(last).as_secs_f64();

        // Ease pitch toward the target over roughly half a second
        let ease = (dt * 2.0).min(1.0);
        let d_pitch = (self.config.autorotate_pitch - camera.pitch) * ease;
        camera.rotate(self.config.speed * dt, d_pitch);
    }
}

impl Plugin for AutorotatePlugin {
    fn name(&self) -> &'static str {
        "autorotate"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
