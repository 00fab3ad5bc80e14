//! ClipEngine: a [`PoseEngine`] that keeps lane clocks but poses nothing.
//!
//! Useful for hosts that only need event timing (servers, headless replays) and as
//! the reference engine for tests. Lane time is mapped into clip time with the
//! lane's loop policy; completed passes are reported as [`LaneNotice`]s.

use serde::{Deserialize, Serialize};

use crate::engine::{LaneNotice, PoseEngine};

/// Animation metadata: name and duration in seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClipData {
    pub name: String,
    pub duration: f32,
}

impl ClipData {
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            duration,
        }
    }
}

/// Minimal clip library storage.
#[derive(Default, Debug)]
struct ClipLib {
    items: Vec<ClipData>,
}

impl ClipLib {
    fn upsert(&mut self, clip: ClipData) {
        match self.items.iter_mut().find(|c| c.name == clip.name) {
            Some(existing) => *existing = clip,
            None => self.items.push(clip),
        }
    }
    fn get(&self, name: &str) -> Option<&ClipData> {
        self.items.iter().find(|c| c.name == name)
    }
}

fn fmod(a: f32, b: f32) -> f32 {
    if b == 0.0 {
        return 0.0;
    }
    let m = a % b;
    if (m < 0.0 && b > 0.0) || (m > 0.0 && b < 0.0) {
        m + b
    } else {
        m
    }
}

/// One occupied lane.
#[derive(Debug)]
struct Lane {
    animation: String,
    duration: f32,
    loop_count: i32,
    /// Unwrapped lane time in seconds.
    time: f32,
    /// Time observed before the latest advance; `None` after a jump.
    last_time: Option<f32>,
    completed: u32,
    ended: bool,
}

impl Lane {
    fn new(clip: &ClipData, loop_count: i32) -> Self {
        Self {
            animation: clip.name.clone(),
            duration: clip.duration,
            loop_count,
            time: 0.0,
            last_time: None,
            completed: 0,
            ended: false,
        }
    }

    /// Passes to play before ending; `None` loops forever.
    fn passes(&self) -> Option<u32> {
        match self.loop_count {
            n if n < 0 => None,
            0 => Some(1),
            n => Some(n as u32),
        }
    }

    fn passes_at(&self, time: f32) -> u32 {
        if self.duration <= 0.0 {
            return if time >= 0.0 { 1 } else { 0 };
        }
        (time / self.duration).floor().max(0.0) as u32
    }

    fn sync_completed(&mut self) {
        let passes = self.passes_at(self.time);
        self.completed = match self.passes() {
            Some(limit) => passes.min(limit),
            None => passes,
        };
        self.ended = self.passes().is_some_and(|limit| self.completed >= limit);
    }

    /// Lane time mapped into clip time.
    fn clip_time(&self) -> f32 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        if self.ended {
            return self.duration;
        }
        fmod(self.time.max(0.0), self.duration)
    }
}

/// Engine over clip metadata only.
#[derive(Debug)]
pub struct ClipEngine {
    clips: ClipLib,
    lanes: Vec<Option<Lane>>,
    time_scale: f32,
    global_time: f32,
    notices: Vec<LaneNotice>,
    /// Counters exposed for hosts and tests.
    setup_resets: u32,
    pose_evaluations: u64,
}

impl Default for ClipEngine {
    fn default() -> Self {
        Self {
            clips: ClipLib::default(),
            lanes: Vec::new(),
            time_scale: 1.0,
            global_time: 0.0,
            notices: Vec::new(),
            setup_resets: 0,
            pose_evaluations: 0,
        }
    }
}

impl ClipEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine preloaded with `clips`.
    pub fn with_clips(clips: impl IntoIterator<Item = ClipData>) -> Self {
        let mut engine = Self::new();
        for clip in clips {
            engine.load_clip(clip);
        }
        engine
    }

    /// Register (or replace) a clip by name.
    pub fn load_clip(&mut self, clip: ClipData) {
        self.clips.upsert(clip);
    }

    pub fn global_time(&self) -> f32 {
        self.global_time
    }

    /// How many times the setup pose was restored.
    pub fn setup_resets(&self) -> u32 {
        self.setup_resets
    }

    /// How many times a pose was applied (one per `advance`).
    pub fn pose_evaluations(&self) -> u64 {
        self.pose_evaluations
    }

    /// Lane time observed before the most recent advance.
    pub fn last_lane_time(&self, lane: usize) -> Option<f32> {
        self.lane(lane).and_then(|l| l.last_time)
    }

    fn lane(&self, lane: usize) -> Option<&Lane> {
        self.lanes.get(lane).and_then(Option::as_ref)
    }
}

impl PoseEngine for ClipEngine {
    fn animation_duration(&self, animation: &str) -> Option<f32> {
        self.clips.get(animation).map(|c| c.duration)
    }

    fn set_animation(&mut self, lane: usize, animation: &str, loop_count: i32) -> bool {
        let Some(clip) = self.clips.get(animation) else {
            return false;
        };
        let entry = Lane::new(clip, loop_count);
        if self.lanes.len() <= lane {
            self.lanes.resize_with(lane + 1, || None);
        }
        self.lanes[lane] = Some(entry);
        self.notices.push(LaneNotice::Started {
            lane,
            animation: animation.to_string(),
        });
        true
    }

    fn clear_lane(&mut self, lane: usize) {
        if let Some(slot) = self.lanes.get_mut(lane) {
            *slot = None;
        }
    }

    fn clear_lanes(&mut self) {
        self.lanes.clear();
        self.notices.clear();
    }

    fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    fn time_scale(&self) -> f32 {
        self.time_scale
    }

    fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale;
    }

    fn set_global_time(&mut self, time: f32) {
        self.global_time = time;
    }

    fn lane_time(&self, lane: usize) -> Option<f32> {
        self.lane(lane).map(Lane::clip_time)
    }

    fn set_lane_time(&mut self, lane: usize, time: f32) -> bool {
        let Some(entry) = self.lanes.get_mut(lane).and_then(Option::as_mut) else {
            return false;
        };
        entry.time = time;
        entry.last_time = None;
        entry.sync_completed();
        true
    }

    fn active_animation(&self, lane: usize) -> Option<&str> {
        self.lane(lane).map(|l| l.animation.as_str())
    }

    fn advance(&mut self, delta: f32) {
        let scaled = delta * self.time_scale;
        self.global_time += scaled;
        for (index, slot) in self.lanes.iter_mut().enumerate() {
            let Some(lane) = slot else {
                continue;
            };
            lane.last_time = Some(lane.time);
            if lane.ended {
                continue;
            }
            lane.time += scaled;
            let passes = lane.passes_at(lane.time);
            while lane.completed < passes {
                lane.completed += 1;
                self.notices.push(LaneNotice::Completed {
                    lane: index,
                    loops: lane.completed,
                });
                if lane.passes().is_some_and(|limit| lane.completed >= limit) {
                    lane.ended = true;
                    self.notices.push(LaneNotice::Ended { lane: index });
                    break;
                }
            }
        }
        self.pose_evaluations += 1;
    }

    fn reset_to_setup_pose(&mut self) {
        self.setup_resets += 1;
    }

    fn drain_notices(&mut self, out: &mut Vec<LaneNotice>) {
        out.append(&mut self.notices);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) {
        assert!((a - b).abs() <= 1e-5, "left={a} right={b}");
    }

    fn engine() -> ClipEngine {
        ClipEngine::with_clips([ClipData::new("walk", 1.0), ClipData::new("idle", 2.0)])
    }

    fn drain(e: &mut ClipEngine) -> Vec<LaneNotice> {
        let mut out = Vec::new();
        e.drain_notices(&mut out);
        out
    }

    #[test]
    fn fmod_wraps_negative() {
        approx(fmod(-0.25, 1.0), 0.75);
        approx(fmod(2.5, 1.0), 0.5);
        approx(fmod(1.0, 0.0), 0.0);
    }

    #[test]
    fn unknown_animation_is_rejected() {
        let mut e = engine();
        assert!(!e.set_animation(0, "fly", 0));
        assert_eq!(e.lane_count(), 0);
    }

    #[test]
    fn looping_lane_wraps_and_reports_each_pass() {
        let mut e = engine();
        assert!(e.set_animation(0, "walk", -1));
        e.advance(0.75);
        approx(e.lane_time(0).unwrap(), 0.75);
        e.advance(0.5);
        approx(e.lane_time(0).unwrap(), 0.25);
        let notices = drain(&mut e);
        assert_eq!(
            notices,
            vec![
                LaneNotice::Started {
                    lane: 0,
                    animation: "walk".into()
                },
                LaneNotice::Completed { lane: 0, loops: 1 },
            ]
        );
    }

    #[test]
    fn once_lane_holds_last_frame_and_ends() {
        let mut e = engine();
        e.set_animation(0, "walk", 0);
        drain(&mut e);
        e.advance(1.5);
        approx(e.lane_time(0).unwrap(), 1.0);
        assert_eq!(
            drain(&mut e),
            vec![
                LaneNotice::Completed { lane: 0, loops: 1 },
                LaneNotice::Ended { lane: 0 },
            ]
        );
        e.advance(1.0);
        assert!(drain(&mut e).is_empty());
        approx(e.lane_time(0).unwrap(), 1.0);
    }

    #[test]
    fn time_scale_applies_to_lanes_and_global_time() {
        let mut e = engine();
        e.set_animation(1, "idle", -1);
        e.set_time_scale(0.5);
        e.advance(1.0);
        approx(e.lane_time(1).unwrap(), 0.5);
        approx(e.global_time(), 0.5);
        assert_eq!(e.lane_count(), 2);
        assert_eq!(e.lane_time(0), None);
    }

    #[test]
    fn set_lane_time_invalidates_last_observed() {
        let mut e = engine();
        e.set_animation(0, "idle", -1);
        e.advance(0.5);
        assert_eq!(e.last_lane_time(0), Some(0.0));
        assert!(e.set_lane_time(0, 1.5));
        assert_eq!(e.last_lane_time(0), None);
        approx(e.lane_time(0).unwrap(), 1.5);
        assert!(!e.set_lane_time(3, 0.0));
    }

    #[test]
    fn clear_lanes_drops_pending_notices() {
        let mut e = engine();
        e.set_animation(0, "walk", -1);
        e.clear_lanes();
        assert!(drain(&mut e).is_empty());
        assert_eq!(e.active_animation(0), None);
    }
}
