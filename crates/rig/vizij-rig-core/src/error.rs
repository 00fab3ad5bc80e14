//! Errors for the fallible, non-tick surfaces (rig loading, configuration).
//!
//! Scheduling and playback operations never return these; they signal failure
//! through `false` / `None` / `-1` so a host frame loop is never aborted.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RigError {
    #[error("rig json parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("animation '{name}' has invalid duration {duration}")]
    InvalidDuration { name: String, duration: f32 },
    #[error("duplicate animation '{0}'")]
    DuplicateAnimation(String),
    #[error("event '{event}' references unknown animation '{animation}'")]
    UnknownAnimation { animation: String, event: String },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
