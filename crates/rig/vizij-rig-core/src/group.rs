//! Playback groups: one speed factor and pause switch shared by many controllers.
//!
//! Groups are pulled, not pushed. Controllers hold a `Weak` handle and read the
//! group once per tick, so a group never needs to know its members and mutations
//! are observed on each member's next `update`.

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;
use serde::{Deserialize, Serialize};

/// Shared handle. Single-threaded by construction (`Rc`), which rules out
/// racing start/stop calls.
pub type SharedGroup = Rc<RefCell<PlaybackGroup>>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupState {
    Stopped,
    Running,
    Paused,
}

/// Serializable view of a group, e.g. for diagnostics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupSnapshot {
    pub state: GroupState,
    pub speed_factor: f32,
    pub generation: u64,
}

#[derive(Debug)]
pub struct PlaybackGroup {
    speed_factor: f32,
    running: bool,
    paused: bool,
    /// Bumped on every effective mutation.
    generation: u64,
}

impl Default for PlaybackGroup {
    fn default() -> Self {
        Self {
            speed_factor: 1.0,
            running: false,
            paused: false,
            generation: 0,
        }
    }
}

impl PlaybackGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// New group wrapped for sharing between controllers.
    pub fn shared() -> SharedGroup {
        Rc::new(RefCell::new(Self::new()))
    }

    #[inline]
    fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn state(&self) -> GroupState {
        match (self.running, self.paused) {
            (false, _) => GroupState::Stopped,
            (true, false) => GroupState::Running,
            (true, true) => GroupState::Paused,
        }
    }

    #[inline]
    pub fn speed_factor(&self) -> f32 {
        self.speed_factor
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Raw pause flag; may be set while stopped (see [`pause`](Self::pause)).
    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether member ticks are currently suppressed. Only a running, paused group
    /// holds its members; a stopped group leaves them to their own pause state.
    #[inline]
    pub fn holds_members(&self) -> bool {
        self.state() == GroupState::Paused
    }

    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.bump();
        debug!("playback group started (paused={})", self.paused);
    }

    /// Back to `Stopped`: clears the pause flag and restores speed factor 1.
    pub fn stop(&mut self) {
        if !self.running && !self.paused && self.speed_factor == 1.0 {
            return;
        }
        self.running = false;
        self.paused = false;
        self.speed_factor = 1.0;
        self.bump();
        debug!("playback group stopped");
    }

    /// Set the pause flag. While stopped the flag is recorded but holds nobody
    /// until the group is started.
    pub fn pause(&mut self) {
        if self.paused {
            return;
        }
        self.paused = true;
        self.bump();
    }

    pub fn resume(&mut self) {
        if !self.paused {
            return;
        }
        self.paused = false;
        self.bump();
    }

    /// Store a new speed factor for members to pick up. Returns false (no
    /// mutation) when `factor` equals the current value.
    pub fn set_speed_factor(&mut self, factor: f32) -> bool {
        if factor == self.speed_factor {
            return false;
        }
        self.speed_factor = factor;
        self.bump();
        true
    }

    pub fn snapshot(&self) -> GroupSnapshot {
        GroupSnapshot {
            state: self.state(),
            speed_factor: self.speed_factor,
            generation: self.generation,
        }
    }
}
