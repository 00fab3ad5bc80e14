//! Sorted frame-event list with a fired-index cursor.
//!
//! The backing vector is ordered by `trigger_time` ascending at all times; events
//! with equal times keep insertion order (newest last). The only mutable
//! scheduling state is `last_fired`, the index of the most recently fired event.
//! The index a forward pass starts from is derived from it on every call.

use log::trace;

use crate::event::{EventSink, UserEvent};

/// Tolerance for time comparisons. Matches single-precision granularity
/// (1.192092896e-7) so accumulated delta-time error does not skip an event placed
/// exactly on a frame.
pub const TIME_EPSILON: f32 = f32::EPSILON;

/// `time` has reached `trigger`: strictly past it, or equal within epsilon.
#[inline]
fn reached(time: f32, trigger: f32) -> bool {
    time > trigger || (time - trigger).abs() <= TIME_EPSILON
}

/// Ordered frame events owned by one controller.
#[derive(Clone, Debug, Default)]
pub struct EventTimeline {
    events: Vec<UserEvent>,
    last_fired: Option<usize>,
}

impl EventTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
            last_fired: None,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events in firing order.
    #[inline]
    pub fn events(&self) -> &[UserEvent] {
        &self.events
    }

    /// Index of the most recently fired event, `None` if nothing fired since the
    /// last reset.
    #[inline]
    pub fn last_fired(&self) -> Option<usize> {
        self.last_fired
    }

    /// First index the next forward pass will consider.
    #[inline]
    pub fn next_index(&self) -> usize {
        self.last_fired.map_or(0, |i| i + 1)
    }

    fn position(&self, animation_name: &str, event_name: &str) -> Option<usize> {
        self.events
            .iter()
            .position(|e| e.is(animation_name, event_name))
    }

    pub fn has_event(&self, animation_name: &str, event_name: &str) -> bool {
        self.position(animation_name, event_name).is_some()
    }

    /// Insert an event, keeping the list sorted. Returns false (and leaves the
    /// timeline untouched) if the identity already exists.
    pub fn add(
        &mut self,
        animation_name: &str,
        event_name: &str,
        trigger_time: f32,
        payload: serde_json::Value,
    ) -> bool {
        self.insert(UserEvent::new(
            animation_name,
            event_name,
            trigger_time,
            payload,
        ))
    }

    /// Same as [`add`](Self::add) for an already-built event.
    pub fn insert(&mut self, event: UserEvent) -> bool {
        if self.has_event(event.animation_name(), event.event_name()) {
            return false;
        }
        let at = self.insertion_index(event.trigger_time());
        self.events.insert(at, event);
        // Everything from `at` shifted right by one; keep the fired boundary on the
        // same event. An event inserted inside the fired region counts as passed.
        if let Some(cursor) = self.last_fired {
            if at <= cursor {
                self.last_fired = Some(cursor + 1);
            }
        }
        true
    }

    /// Rightmost insertion point: just after the last event (scanning from the
    /// tail) whose time is below `time` or equal to it within epsilon.
    fn insertion_index(&self, time: f32) -> usize {
        self.events
            .iter()
            .rposition(|e| {
                let t = e.trigger_time();
                t < time || (t - time).abs() <= TIME_EPSILON
            })
            .map_or(0, |i| i + 1)
    }

    /// Remove one event by identity. Returns false if it was not present.
    pub fn remove(&mut self, animation_name: &str, event_name: &str) -> bool {
        let Some(at) = self.position(animation_name, event_name) else {
            return false;
        };
        self.events.remove(at);
        if let Some(cursor) = self.last_fired {
            if at <= cursor {
                self.last_fired = cursor.checked_sub(1);
            }
        }
        true
    }

    /// Remove every event of `animation_name` in one pass; returns how many went.
    pub fn remove_all_for_animation(&mut self, animation_name: &str) -> usize {
        let before = self.events.len();
        let cursor = self.last_fired;
        let mut index = 0usize;
        let mut kept_through_cursor = 0usize;
        self.events.retain(|e| {
            let keep = e.animation_name() != animation_name;
            if keep && cursor.is_some_and(|c| index <= c) {
                kept_through_cursor += 1;
            }
            index += 1;
            keep
        });
        // Equivalent to decrementing once per removed index at or before the cursor.
        if cursor.is_some() {
            self.last_fired = kept_through_cursor.checked_sub(1);
        }
        before - self.events.len()
    }

    /// Forget what has fired; the next pass starts from the head.
    #[inline]
    pub fn reset_cursor(&mut self) {
        self.last_fired = None;
    }

    /// Reposition the cursor after an explicit jump to `time`.
    ///
    /// The last event lying strictly before `time` (by more than epsilon) becomes
    /// the fired boundary and `true` is returned. An event sitting on `time` stays
    /// pending so the next [`advance`](Self::advance) at `time` fires it. When no
    /// event lies before `time` the cursor is left as it was and `false` is
    /// returned.
    pub fn seek(&mut self, time: f32) -> bool {
        let boundary = self.events.iter().rposition(|e| {
            let t = e.trigger_time();
            t < time && (time - t) > TIME_EPSILON
        });
        match boundary {
            Some(index) => {
                self.last_fired = Some(index);
                true
            }
            None => false,
        }
    }

    /// Forward pass: fire every pending event of `active_animation` whose trigger
    /// time has been reached by `time`, in index order. Events of other animations
    /// are stepped over without firing. Returns the number fired.
    pub fn advance<S>(&mut self, time: f32, active_animation: &str, sink: &mut S) -> usize
    where
        S: EventSink + ?Sized,
    {
        let mut fired = 0;
        for index in self.next_index()..self.events.len() {
            let event = &self.events[index];
            if event.animation_name() != active_animation || !reached(time, event.trigger_time())
            {
                continue;
            }
            trace!(
                "frame event '{}/{}' fired at t={time} (trigger {})",
                event.animation_name(),
                event.event_name(),
                event.trigger_time()
            );
            sink.on_event(event);
            self.last_fired = Some(index);
            fired += 1;
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventLog;
    use serde_json::Value;

    fn names(tl: &EventTimeline) -> Vec<&str> {
        tl.events().iter().map(|e| e.event_name()).collect()
    }

    fn hit_end() -> EventTimeline {
        let mut tl = EventTimeline::new();
        assert!(tl.add("A", "hit", 0.5, Value::Null));
        assert!(tl.add("A", "end", 1.0, Value::Null));
        tl
    }

    #[test]
    fn forward_passes_fire_in_order() {
        let mut tl = hit_end();
        assert_eq!(names(&tl), vec!["hit", "end"]);
        let mut log = EventLog::new();

        assert_eq!(tl.advance(0.4, "A", &mut log), 0);
        assert_eq!(tl.last_fired(), None);

        assert_eq!(tl.advance(0.5, "A", &mut log), 1);
        assert_eq!(tl.last_fired(), Some(0));

        assert_eq!(tl.advance(1.2, "A", &mut log), 1);
        assert_eq!(tl.last_fired(), Some(1));
        assert_eq!(log.names(), vec!["hit", "end"]);

        // Nothing left to fire without a rewind.
        assert_eq!(tl.advance(5.0, "A", &mut log), 0);
    }

    #[test]
    fn seek_past_first_event_fires_only_the_rest() {
        let mut tl = hit_end();
        assert!(tl.seek(0.6));
        assert_eq!(tl.last_fired(), Some(0));
        let mut log = EventLog::new();
        tl.advance(1.2, "A", &mut log);
        assert_eq!(log.names(), vec!["end"]);
    }

    #[test]
    fn seek_landing_on_event_time_keeps_it_pending() {
        let mut tl = hit_end();
        // Nothing strictly before 0.5: no jump, cursor untouched.
        assert!(!tl.seek(0.5));
        assert_eq!(tl.last_fired(), None);
        let mut log = EventLog::new();
        tl.advance(0.5, "A", &mut log);
        assert_eq!(log.names(), vec!["hit"]);

        // Landing on `end` treats `hit` as passed and leaves `end` to fire.
        let mut tl = hit_end();
        assert!(tl.seek(1.0));
        assert_eq!(tl.last_fired(), Some(0));
        let mut log = EventLog::new();
        tl.advance(1.0, "A", &mut log);
        assert_eq!(log.names(), vec!["end"]);
    }

    #[test]
    fn seek_before_everything_leaves_cursor() {
        let mut tl = hit_end();
        let mut log = EventLog::new();
        tl.advance(2.0, "A", &mut log);
        assert!(!tl.seek(0.1));
        assert_eq!(tl.last_fired(), Some(1));
    }

    #[test]
    fn other_animations_are_skipped_not_blocking() {
        let mut tl = EventTimeline::new();
        tl.add("B", "b0", 0.1, Value::Null);
        tl.add("A", "a0", 0.2, Value::Null);
        tl.add("B", "b1", 0.3, Value::Null);
        let mut log = EventLog::new();
        assert_eq!(tl.advance(1.0, "A", &mut log), 1);
        assert_eq!(log.names(), vec!["a0"]);
        assert_eq!(tl.last_fired(), Some(1));
    }

    #[test]
    fn epsilon_absorbs_sub_tolerance_shortfall() {
        let mut tl = EventTimeline::new();
        tl.add("A", "tick", 0.3, Value::Null);
        let mut log = EventLog::new();

        let well_short = 0.3f32 - TIME_EPSILON * 4.0;
        assert_eq!(tl.advance(well_short, "A", &mut log), 0);

        let just_short = 0.3f32 - TIME_EPSILON / 2.0;
        assert!(just_short < 0.3);
        assert_eq!(tl.advance(just_short, "A", &mut log), 1);
    }

    #[test]
    fn duplicate_identity_is_rejected_without_mutation() {
        let mut tl = hit_end();
        let before: Vec<UserEvent> = tl.events().to_vec();
        assert!(!tl.add("A", "hit", 0.1, Value::Bool(true)));
        assert_eq!(tl.events(), before.as_slice());
        // Same event name on another animation is a different identity.
        assert!(tl.add("B", "hit", 0.1, Value::Null));
    }

    #[test]
    fn equal_times_keep_insertion_order() {
        let mut tl = EventTimeline::new();
        tl.add("A", "first", 0.5, Value::Null);
        tl.add("A", "second", 0.5, Value::Null);
        tl.add("A", "early", 0.2, Value::Null);
        tl.add("A", "third", 0.5, Value::Null);
        assert_eq!(names(&tl), vec!["early", "first", "second", "third"]);
    }

    #[test]
    fn insert_inside_fired_region_shifts_cursor() {
        let mut tl = hit_end();
        let mut log = EventLog::new();
        tl.advance(0.7, "A", &mut log);
        assert_eq!(tl.last_fired(), Some(0));

        tl.add("A", "windup", 0.2, Value::Null);
        assert_eq!(names(&tl), vec!["windup", "hit", "end"]);
        assert_eq!(tl.last_fired(), Some(1));

        // Inserting after the boundary leaves it alone.
        tl.add("A", "mid", 0.8, Value::Null);
        assert_eq!(tl.last_fired(), Some(1));

        log.clear();
        tl.advance(1.0, "A", &mut log);
        assert_eq!(log.names(), vec!["mid", "end"]);
    }

    #[test]
    fn remove_compensates_cursor() {
        let mut tl = hit_end();
        tl.add("A", "tail", 1.5, Value::Null);
        let mut log = EventLog::new();
        tl.advance(1.1, "A", &mut log);
        assert_eq!(tl.last_fired(), Some(1));

        assert!(!tl.remove("A", "missing"));
        assert_eq!(tl.len(), 3);

        assert!(tl.remove("A", "hit"));
        assert_eq!(tl.last_fired(), Some(0));
        assert!(tl.remove("A", "end"));
        assert_eq!(tl.last_fired(), None);

        // Removing past the cursor does not move it.
        let mut tl = hit_end();
        tl.advance(0.6, "A", &mut log);
        assert!(tl.remove("A", "end"));
        assert_eq!(tl.last_fired(), Some(0));
    }

    #[test]
    fn remove_all_for_animation_matches_per_item_compensation() {
        let mut tl = EventTimeline::new();
        tl.add("A", "a0", 0.1, Value::Null);
        tl.add("B", "b0", 0.2, Value::Null);
        tl.add("A", "a1", 0.3, Value::Null);
        tl.add("B", "b1", 0.4, Value::Null);
        tl.add("A", "a2", 0.5, Value::Null);
        let mut log = EventLog::new();
        tl.advance(0.35, "A", &mut log);
        assert_eq!(tl.last_fired(), Some(2));

        assert_eq!(tl.remove_all_for_animation("A"), 3);
        assert_eq!(names(&tl), vec!["b0", "b1"]);
        // a0 and a1 were at or before the cursor: 2 - 2 = 0 (b0).
        assert_eq!(tl.last_fired(), Some(0));

        assert_eq!(tl.remove_all_for_animation("B"), 2);
        assert_eq!(tl.last_fired(), None);
        assert_eq!(tl.remove_all_for_animation("B"), 0);
    }

    #[test]
    fn reset_cursor_allows_refire() {
        let mut tl = hit_end();
        let mut log = EventLog::new();
        tl.advance(2.0, "A", &mut log);
        tl.reset_cursor();
        assert_eq!(tl.next_index(), 0);
        tl.advance(2.0, "A", &mut log);
        assert_eq!(log.len(), 4);
    }
}
