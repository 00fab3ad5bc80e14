//! Rig descriptions: clip metadata plus authored frame events, loaded from JSON.

use hashbrown::HashSet;
use log::warn;
use serde::Deserialize;

use crate::clip_engine::{ClipData, ClipEngine};
use crate::config::Config;
use crate::error::RigError;
use crate::event::UserEvent;

/// A parsed rig: clips (name + duration) and the frame events authored on them.
#[derive(Clone, Debug, PartialEq)]
pub struct RigData {
    pub name: String,
    pub frame_rate: Option<f32>,
    pub animations: Vec<ClipData>,
    pub events: Vec<UserEvent>,
}

impl RigData {
    /// A [`ClipEngine`] preloaded with this rig's clips.
    pub fn clip_engine(&self) -> ClipEngine {
        ClipEngine::with_clips(self.animations.iter().cloned())
    }

    /// Default config with this rig's frame rate, when it declares one.
    pub fn config(&self) -> Config {
        let mut cfg = Config::default();
        if let Some(fps) = self.frame_rate {
            cfg.frame_rate = fps;
        }
        cfg
    }

    pub fn animation(&self, name: &str) -> Option<&ClipData> {
        self.animations.iter().find(|a| a.name == name)
    }
}

/// Parse rig JSON:
///
/// ```json
/// {
///   "name": "hero",
///   "frameRate": 30,
///   "animations": [{ "name": "attack", "duration": 1.2 }],
///   "events": [{ "animation": "attack", "name": "hit", "time": 0.5, "payload": {} }]
/// }
/// ```
///
/// Durations and times are seconds. Animation names must be unique and durations
/// finite and non-negative; `frameRate`, when present, must be finite and
/// positive; events must name a known animation. Repeated event
/// identities are kept here and dropped (with a warning) when installed into a
/// timeline.
pub fn parse_rig_json(s: &str) -> Result<RigData, RigError> {
    let raw: RawRig = serde_json::from_str(s)?;

    let mut names: HashSet<&str> = HashSet::with_capacity(raw.animations.len());
    let mut animations = Vec::with_capacity(raw.animations.len());
    for a in &raw.animations {
        if !a.duration.is_finite() || a.duration < 0.0 {
            return Err(RigError::InvalidDuration {
                name: a.name.clone(),
                duration: a.duration,
            });
        }
        if !names.insert(a.name.as_str()) {
            return Err(RigError::DuplicateAnimation(a.name.clone()));
        }
        animations.push(ClipData::new(a.name.clone(), a.duration));
    }

    let mut events = Vec::with_capacity(raw.events.len());
    for e in raw.events {
        if !names.contains(e.animation.as_str()) {
            return Err(RigError::UnknownAnimation {
                animation: e.animation,
                event: e.name,
            });
        }
        if e.time < 0.0 {
            warn!(
                "rig '{}': event '{}/{}' has negative time {}",
                raw.name, e.animation, e.name, e.time
            );
        }
        events.push(UserEvent::new(e.animation, e.name, e.time, e.payload));
    }

    let rig = RigData {
        name: raw.name,
        frame_rate: raw.frame_rate,
        animations,
        events,
    };
    rig.config().validate()?;
    Ok(rig)
}

// ----- JSON schema (serde) -----

#[derive(Debug, Deserialize)]
struct RawRig {
    name: String,
    #[serde(default, rename = "frameRate")]
    frame_rate: Option<f32>,
    #[serde(default)]
    animations: Vec<RawAnimation>,
    #[serde(default)]
    events: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
struct RawAnimation {
    name: String,
    duration: f32,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    animation: String,
    name: String,
    time: f32,
    #[serde(default)]
    payload: serde_json::Value,
}
