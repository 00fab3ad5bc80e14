//! Track handles and per-play listeners.

use serde::{Deserialize, Serialize};

use crate::engine::PoseEngine;
use crate::ids::EntryId;

/// Handle for one `play` on one lane. Handles are replaced, never mutated: a new
/// `play` on the same lane issues a new [`EntryId`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    lane: usize,
    animation: String,
    loop_count: i32,
    entry: EntryId,
}

impl Track {
    pub(crate) fn new(lane: usize, animation: &str, loop_count: i32, entry: EntryId) -> Self {
        Self {
            lane,
            animation: animation.to_string(),
            loop_count,
            entry,
        }
    }

    #[inline]
    pub fn lane(&self) -> usize {
        self.lane
    }

    #[inline]
    pub fn animation(&self) -> &str {
        &self.animation
    }

    #[inline]
    pub fn loop_count(&self) -> i32 {
        self.loop_count
    }

    #[inline]
    pub fn entry(&self) -> EntryId {
        self.entry
    }

    #[inline]
    pub fn is_looping(&self) -> bool {
        self.loop_count < 0
    }

    /// Current animation time of this track, or `None` if the engine's lane no
    /// longer plays this track's animation.
    pub fn current_time<E: PoseEngine + ?Sized>(&self, engine: &E) -> Option<f32> {
        if engine.active_animation(self.lane)? != self.animation {
            return None;
        }
        engine.lane_time(self.lane)
    }
}

/// Optional callbacks for one `play`. All methods default to no-ops.
pub trait TrackListener {
    fn on_start(&mut self, _track: &Track) {}
    fn on_complete(&mut self, _track: &Track, _loops: u32) {}
    fn on_end(&mut self, _track: &Track) {}
}
