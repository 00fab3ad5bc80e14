//! Controller: per-instance playback orchestrator.
//!
//! Per tick: pull the group's pause flag and speed factor → read elapsed wall
//! time from the [`Clock`] → advance the pose engine by
//! that delta → route lane notices to track listeners → advance the
//! [`EventTimeline`] against lane 0's animation time and active animation.
//!
//! Nothing here returns an error or panics; invalid input is reported with
//! `false` / `None` / `-1`, and a tick without a lane-0 track is skipped.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::{debug, trace, warn};

use crate::clock::{Clock, TimeSource};
use crate::config::Config;
use crate::engine::{LaneNotice, PoseEngine};
use crate::event::{EventSink, UserEvent};
use crate::group::{PlaybackGroup, SharedGroup};
use crate::ids::IdAllocator;
use crate::rig::RigData;
use crate::timeline::{EventTimeline, TIME_EPSILON};
use crate::track::{Track, TrackListener};

/// Lane the event timeline follows.
const EVENT_LANE: usize = 0;

struct TrackSlot {
    track: Track,
    listener: Option<Box<dyn TrackListener>>,
}

pub struct Controller<E: PoseEngine> {
    cfg: Config,
    engine: E,
    clock: Clock,
    timeline: EventTimeline,
    group: Option<Weak<RefCell<PlaybackGroup>>>,
    /// Group speed factor last pushed into the engine; `None` until the first
    /// grouped tick.
    applied_speed: Option<f32>,
    tracks: Vec<Option<TrackSlot>>,
    ids: IdAllocator,
    sink: Option<Box<dyn EventSink>>,
    notices: Vec<LaneNotice>,
    attached: bool,
    paused: bool,
}

impl<E: PoseEngine> std::fmt::Debug for Controller<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("cfg", &self.cfg)
            .field("clock", &self.clock)
            .field("timeline", &self.timeline)
            .field("attached", &self.attached)
            .field("paused", &self.paused)
            .finish_non_exhaustive()
    }
}

impl<E: PoseEngine> Controller<E> {
    /// Create a detached controller reading wall time from `source`.
    pub fn new(engine: E, cfg: Config, source: impl TimeSource + 'static) -> Self {
        Self {
            timeline: EventTimeline::with_capacity(cfg.event_capacity),
            cfg,
            engine,
            clock: Clock::new(source),
            group: None,
            applied_speed: None,
            tracks: Vec::new(),
            ids: IdAllocator::new(),
            sink: None,
            notices: Vec::new(),
            attached: false,
            paused: false,
        }
    }

    /// Create a detached controller on the monotonic system clock.
    pub fn with_system_clock(engine: E, cfg: Config) -> Self {
        Self::new(engine, cfg, crate::clock::SystemTimeSource::new())
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn events(&self) -> &EventTimeline {
        &self.timeline
    }

    /// Where fired frame events go. Without a sink events still advance the cursor.
    pub fn set_event_sink(&mut self, sink: impl EventSink + 'static) {
        self.sink = Some(Box::new(sink));
    }

    pub fn clear_event_sink(&mut self) {
        self.sink = None;
    }

    // ----- visibility -----

    /// The instance became visible: ticks are accepted again, starting with a
    /// re-sync tick.
    pub fn on_attached(&mut self) {
        if !self.attached {
            debug!("controller attached");
        }
        self.attached = true;
        self.clock.invalidate();
    }

    /// The instance left the scene: ticks are ignored and the clock is
    /// invalidated. Pause state is kept.
    pub fn on_detached(&mut self) {
        if self.attached {
            debug!("controller detached");
        }
        self.attached = false;
        self.clock.invalidate();
    }

    #[inline]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    // ----- groups -----

    /// Join `group`. The controller holds a weak reference only.
    pub fn set_group(&mut self, group: &SharedGroup) {
        self.group = Some(Rc::downgrade(group));
        self.applied_speed = None;
        debug!("controller joined playback group");
    }

    pub fn clear_group(&mut self) {
        self.group = None;
        self.applied_speed = None;
    }

    /// The bound group, if it is still alive.
    pub fn group(&self) -> Option<SharedGroup> {
        self.group.as_ref().and_then(Weak::upgrade)
    }

    // ----- pause -----

    pub fn pause(&mut self) {
        if self.paused {
            return;
        }
        self.paused = true;
        self.clock.invalidate();
    }

    pub fn resume(&mut self) {
        if !self.paused {
            return;
        }
        self.paused = false;
        self.clock.invalidate();
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // ----- playback -----

    /// Restore the setup pose and queue `animation` on `lane`, replacing the lane's
    /// track. `loop_count`: `0` once, negative forever, `n` passes. Restarts the
    /// event cursor. Returns `None` for an unknown animation or a lane outside the
    /// configured range.
    pub fn play(
        &mut self,
        animation: &str,
        loop_count: i32,
        lane: usize,
        listener: Option<Box<dyn TrackListener>>,
    ) -> Option<Track> {
        if lane >= self.cfg.lane_count {
            debug!("play '{animation}' rejected: lane {lane} out of range");
            return None;
        }
        if !self.engine.has_animation(animation) {
            debug!("play '{animation}' rejected: unknown animation");
            return None;
        }
        self.engine.reset_to_setup_pose();
        self.discard_lane_notices(lane);
        if !self.engine.set_animation(lane, animation, loop_count) {
            return None;
        }
        let track = Track::new(lane, animation, loop_count, self.ids.alloc_entry());
        if self.tracks.len() <= lane {
            self.tracks.resize_with(lane + 1, || None);
        }
        self.tracks[lane] = Some(TrackSlot {
            track: track.clone(),
            listener,
        });
        self.timeline.reset_cursor();
        debug!("play '{animation}' on lane {lane} (loops {loop_count})");
        Some(track)
    }

    /// Clear one lane and forget its track. The clock re-synchronizes on the next
    /// tick; stopping the event lane also restarts the event cursor.
    pub fn stop(&mut self, lane: usize) {
        if lane < self.engine.lane_count() {
            self.engine.clear_lane(lane);
        }
        self.discard_lane_notices(lane);
        if let Some(slot) = self.tracks.get_mut(lane) {
            *slot = None;
        }
        if lane == EVENT_LANE {
            self.timeline.reset_cursor();
        }
        self.clock.invalidate();
        debug!("stop lane {lane}");
    }

    /// Clear every lane and all pending listener notices, optionally restoring the
    /// setup pose.
    pub fn stop_all(&mut self, reset_pose: bool) {
        self.engine.clear_lanes();
        // Anything the engine queued before clearing is discarded, not delivered.
        self.notices.clear();
        self.engine.drain_notices(&mut self.notices);
        self.notices.clear();
        self.tracks.clear();
        if reset_pose {
            self.engine.reset_to_setup_pose();
        }
        self.timeline.reset_cursor();
        self.clock.invalidate();
        debug!("stop all lanes (reset_pose={reset_pose})");
    }

    /// Jump `lane` to `time` and reposition the event cursor. Returns true when the
    /// cursor moved, i.e. the caller should force a pose re-evaluation. Returns
    /// false with no mutation for an out-of-range lane or an empty one.
    pub fn set_animation_time(&mut self, lane: usize, time: f32) -> bool {
        if lane >= self.engine.lane_count() || self.track(lane).is_none() {
            return false;
        }
        if !self.engine.set_lane_time(lane, time) {
            return false;
        }
        self.engine.set_global_time(time);
        self.timeline.seek(time)
    }

    /// Play from a frame index: `time = frame / frame_rate`; `looping` maps to a
    /// loop count of -1, otherwise 1.
    pub fn play_at_frame(&mut self, animation: &str, frame: u32, looping: bool) -> Option<Track> {
        let loop_count = if looping { -1 } else { 1 };
        let track = self.play(animation, loop_count, EVENT_LANE, None)?;
        self.set_animation_time(EVENT_LANE, self.cfg.frame_to_time(frame));
        Some(track)
    }

    /// Land on a frame and hold it: the pose is evaluated once at the landing time
    /// before pausing. Events at the landing frame fire once playback resumes.
    pub fn go_to_frame_and_pause(&mut self, animation: &str, frame: u32) -> Option<Track> {
        let track = self.play_at_frame(animation, frame, false)?;
        self.engine.advance(0.0);
        self.pause();
        Some(track)
    }

    /// One frame tick. See the module docs for the sequence.
    pub fn update(&mut self) {
        if self.paused || !self.attached {
            return;
        }
        let now = self.clock.now();

        if let Some(group) = self.group() {
            let group = group.borrow();
            if group.holds_members() {
                // Re-sync once the group resumes rather than replaying the hold.
                self.clock.invalidate();
                trace!("tick held by paused group");
                return;
            }
            let factor = group.speed_factor();
            if !factor.is_nan() && self.applied_speed != Some(factor) {
                self.engine.set_time_scale(factor);
                self.applied_speed = Some(factor);
            }
        }

        let Some(last) = self.clock.last_tick() else {
            self.clock.mark(now);
            return;
        };
        let delta = now - last;
        if delta.abs() < f64::from(TIME_EPSILON) {
            return;
        }
        self.engine.advance(delta as f32);
        let wrapped = self.dispatch_notices();
        self.fire_events(wrapped);
        self.clock.mark(now);
    }

    /// Drop notices still pending for `lane` so a replaced or stopped track never
    /// sees its predecessor's signals. Notices of other lanes stay queued.
    fn discard_lane_notices(&mut self, lane: usize) {
        self.engine.drain_notices(&mut self.notices);
        self.notices.retain(|notice| notice.lane() != lane);
    }

    /// Route drained lane notices to their listeners. Returns true when the event
    /// lane finished a pass and keeps playing.
    fn dispatch_notices(&mut self) -> bool {
        let mut notices = std::mem::take(&mut self.notices);
        self.engine.drain_notices(&mut notices);
        let mut completed = false;
        let mut ended = false;
        for notice in notices.drain(..) {
            let lane = notice.lane();
            if lane == EVENT_LANE {
                match notice {
                    LaneNotice::Completed { .. } => completed = true,
                    LaneNotice::Ended { .. } => ended = true,
                    LaneNotice::Started { .. } => {}
                }
            }
            let Some(slot) = self.tracks.get_mut(lane).and_then(Option::as_mut) else {
                continue;
            };
            let Some(listener) = slot.listener.as_mut() else {
                continue;
            };
            match notice {
                LaneNotice::Started { .. } => listener.on_start(&slot.track),
                LaneNotice::Completed { loops, .. } => listener.on_complete(&slot.track, loops),
                LaneNotice::Ended { .. } => listener.on_end(&slot.track),
            }
        }
        self.notices = notices;
        completed && !ended
    }

    fn fire_events(&mut self, wrapped: bool) {
        let Some(active) = self.engine.active_animation(EVENT_LANE) else {
            trace!("no track on lane {EVENT_LANE}; events not advanced");
            return;
        };
        let Some(time) = self.engine.lane_time(EVENT_LANE) else {
            return;
        };
        let mut discard = |_: &UserEvent| {};
        let sink: &mut dyn EventSink = match self.sink.as_deref_mut() {
            Some(sink) => sink,
            None => &mut discard,
        };
        if wrapped {
            // Flush the tail of the finished pass, then start the next one fresh.
            if let Some(duration) = self.engine.animation_duration(active) {
                self.timeline.advance(duration, active, &mut *sink);
            }
            self.timeline.reset_cursor();
        }
        self.timeline.advance(time, active, &mut *sink);
    }

    // ----- metadata -----

    pub fn animation_duration(&self, animation: &str) -> Option<f32> {
        self.engine.animation_duration(animation)
    }

    /// `floor(frame_rate * duration) + 1`, or -1 for an unknown animation.
    pub fn animation_frame_count(&self, animation: &str) -> i32 {
        match self.engine.animation_duration(animation) {
            // `as` saturates; very long clips clamp to i32::MAX.
            Some(duration) => {
                let frames = (self.cfg.frame_rate * duration).floor() as i32;
                frames.saturating_add(1)
            }
            None => -1,
        }
    }

    pub fn track(&self, lane: usize) -> Option<&Track> {
        self.tracks
            .get(lane)
            .and_then(Option::as_ref)
            .map(|slot| &slot.track)
    }

    /// Animation on the event lane.
    pub fn active_animation(&self) -> Option<&str> {
        self.engine.active_animation(EVENT_LANE)
    }

    /// Animation time on the event lane.
    pub fn current_time(&self) -> Option<f32> {
        self.engine.lane_time(EVENT_LANE)
    }

    // ----- frame events -----

    pub fn add_event(
        &mut self,
        animation: &str,
        event: &str,
        trigger_time: f32,
        payload: serde_json::Value,
    ) -> bool {
        self.timeline.add(animation, event, trigger_time, payload)
    }

    pub fn remove_event(&mut self, animation: &str, event: &str) -> bool {
        self.timeline.remove(animation, event)
    }

    pub fn remove_events_for_animation(&mut self, animation: &str) -> usize {
        self.timeline.remove_all_for_animation(animation)
    }

    pub fn has_event(&self, animation: &str, event: &str) -> bool {
        self.timeline.has_event(animation, event)
    }

    pub fn reset_events(&mut self) {
        self.timeline.reset_cursor();
    }

    /// Install every event of `rig`; duplicates are skipped with a warning.
    /// Returns how many were added.
    pub fn load_rig_events(&mut self, rig: &RigData) -> usize {
        let mut added = 0;
        for event in &rig.events {
            if self.timeline.insert(event.clone()) {
                added += 1;
            } else {
                warn!(
                    "rig '{}': duplicate frame event '{}/{}' skipped",
                    rig.name,
                    event.animation_name(),
                    event.event_name()
                );
            }
        }
        added
    }
}
