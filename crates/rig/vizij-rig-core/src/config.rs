//! Controller configuration.

use serde::{Deserialize, Serialize};

use crate::error::RigError;

/// Frame rate used by the frame-indexed helpers when nothing else is configured.
pub const DEFAULT_FRAME_RATE: f32 = 30.0;

/// Configuration for a [`Controller`](crate::Controller).
/// Keep this minimal; expand as needed without breaking API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Frames per second for `play_at_frame` / `go_to_frame_and_pause` / frame counts.
    pub frame_rate: f32,
    /// Initial capacity hint for the event timeline.
    pub event_capacity: usize,
    /// Lanes accepted by `play`; a lane index must be `< lane_count`.
    pub lane_count: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frame_rate: DEFAULT_FRAME_RATE,
            event_capacity: 64,
            lane_count: 4,
        }
    }
}

impl Config {
    /// Parse a config from JSON; missing fields take their defaults.
    pub fn from_json(s: &str) -> Result<Self, RigError> {
        let cfg: Config = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), RigError> {
        if !self.frame_rate.is_finite() || self.frame_rate <= 0.0 {
            return Err(RigError::InvalidConfig(format!(
                "frame_rate must be finite and > 0, got {}",
                self.frame_rate
            )));
        }
        if self.lane_count == 0 {
            return Err(RigError::InvalidConfig("lane_count must be >= 1".into()));
        }
        Ok(())
    }

    /// Convert a frame index into seconds at the configured frame rate.
    #[inline]
    pub fn frame_to_time(&self, frame: u32) -> f32 {
        frame as f32 / self.frame_rate
    }
}
