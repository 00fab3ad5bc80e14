//! Contract with the posing engine that owns skeletons, lanes and pose math.
//!
//! The controller only drives the engine's clock and reads back lane time; bone
//! transforms, blending and skinning stay behind this trait.

use serde::{Deserialize, Serialize};

/// Discrete lane signals reported by the engine, drained once per tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LaneNotice {
    /// An animation was queued on the lane.
    Started { lane: usize, animation: String },
    /// The lane finished a full pass of its animation; `loops` counts passes so far.
    Completed { lane: usize, loops: u32 },
    /// The lane played its last pass and holds the final pose.
    Ended { lane: usize },
}

impl LaneNotice {
    #[inline]
    pub fn lane(&self) -> usize {
        match self {
            LaneNotice::Started { lane, .. }
            | LaneNotice::Completed { lane, .. }
            | LaneNotice::Ended { lane } => *lane,
        }
    }
}

/// Posing engine operations needed by a [`Controller`](crate::Controller).
///
/// Loop counts follow the usual convention: `0` plays once, a negative value
/// loops forever, `n > 0` plays `n` passes.
pub trait PoseEngine {
    /// Duration in seconds of a known animation.
    fn animation_duration(&self, animation: &str) -> Option<f32>;

    fn has_animation(&self, animation: &str) -> bool {
        self.animation_duration(animation).is_some()
    }

    /// Queue `animation` on `lane`, replacing whatever played there. Returns false
    /// if the animation is unknown.
    fn set_animation(&mut self, lane: usize, animation: &str, loop_count: i32) -> bool;

    fn clear_lane(&mut self, lane: usize);

    fn clear_lanes(&mut self);

    /// Number of lane slots currently allocated (occupied or not).
    fn lane_count(&self) -> usize;

    fn time_scale(&self) -> f32;

    fn set_time_scale(&mut self, scale: f32);

    /// Set the engine-wide animation time base.
    fn set_global_time(&mut self, time: f32);

    /// Current animation time on `lane` (seconds into its animation).
    fn lane_time(&self, lane: usize) -> Option<f32>;

    /// Jump `lane` to `time` and forget its last observed time. Returns false if
    /// the lane is empty.
    fn set_lane_time(&mut self, lane: usize, time: f32) -> bool;

    /// Name of the animation queued on `lane`.
    fn active_animation(&self, lane: usize) -> Option<&str>;

    /// Advance every lane by `delta` seconds (before time scale) and apply the
    /// resulting pose. A zero delta re-evaluates the pose in place.
    fn advance(&mut self, delta: f32);

    /// Restore the animation-independent rest pose.
    fn reset_to_setup_pose(&mut self);

    /// Move pending lane notices into `out` (caller-owned scratch).
    fn drain_notices(&mut self, out: &mut Vec<LaneNotice>);
}
