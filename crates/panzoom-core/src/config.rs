//! Tunables for zoom speed and kinetic decay.

use crate::error::{PanZoomError, PanZoomResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-tick zoom speed used by wheel and pinch.
pub const DEFAULT_ZOOM_SPEED: f64 = 0.065;

/// Per-frame velocity multiplier during kinetic decay.
pub const DEFAULT_DAMPING: f64 = 0.9;

/// Speed (px/frame) below which kinetic decay stops.
pub const DEFAULT_MIN_SPEED: f64 = 0.01;

/// Number of recent pan deltas averaged into the release velocity.
pub const DEFAULT_VELOCITY_SAMPLES: usize = 4;

/// Pan deltas older than this (ms) at release do not count toward velocity.
pub const DEFAULT_VELOCITY_WINDOW_MS: u64 = 100;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanZoomConfig {
    /// Zoom speed `s`: multipliers are `1 - s` (out) and `1 + s` (in).
    pub zoom_speed: f64,
    /// Velocity damping per frame, in `(0, 1)`.
    pub damping: f64,
    /// Decay halts once the velocity magnitude drops below this.
    pub min_speed: f64,
    /// How many recent deltas feed the release velocity.
    pub velocity_samples: usize,
    /// Age limit in milliseconds for deltas feeding the release velocity.
    pub velocity_window_ms: u64,
}

impl Default for PanZoomConfig {
    fn default() -> Self {
        Self {
            zoom_speed: DEFAULT_ZOOM_SPEED,
            damping: DEFAULT_DAMPING,
            min_speed: DEFAULT_MIN_SPEED,
            velocity_samples: DEFAULT_VELOCITY_SAMPLES,
            velocity_window_ms: DEFAULT_VELOCITY_WINDOW_MS,
        }
    }
}

impl PanZoomConfig {
    /// Check every value is usable.
    pub fn validate(&self) -> PanZoomResult<()> {
        if !(self.zoom_speed > 0.0 && self.zoom_speed < 1.0) {
            return Err(PanZoomError::Configuration(format!(
                "zoom_speed must be in (0, 1), got {}",
                self.zoom_speed
            )));
        }
        if !(self.damping > 0.0 && self.damping < 1.0) {
            return Err(PanZoomError::Configuration(format!(
                "damping must be in (0, 1), got {}",
                self.damping
            )));
        }
        if !(self.min_speed > 0.0 && self.min_speed.is_finite()) {
            return Err(PanZoomError::Configuration(format!(
                "min_speed must be positive, got {}",
                self.min_speed
            )));
        }
        if self.velocity_samples == 0 {
            return Err(PanZoomError::Configuration(
                "velocity_samples must be at least 1".to_string(),
            ));
        }
        if self.velocity_window_ms == 0 {
            return Err(PanZoomError::Configuration(
                "velocity_window_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The velocity window as a [`Duration`].
    pub fn velocity_window(&self) -> Duration {
        Duration::from_millis(self.velocity_window_ms)
    }

    /// Scale multiplier for a signed zoom direction.
    ///
    /// Positive deltas zoom out, negative deltas zoom in, zero is neutral.
    pub fn scale_multiplier(&self, delta: f64) -> f64 {
        if delta > 0.0 {
            1.0 - self.zoom_speed
        } else if delta < 0.0 {
            1.0 + self.zoom_speed
        } else {
            1.0
        }
    }
}
