//! Frame events and the host-side sink they are delivered to.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// A host-defined event attached to a point on one animation's timeline.
///
/// Identity is the `(animation_name, event_name)` pair; a timeline holds at most
/// one event per identity. Values are immutable once built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserEvent {
    animation_name: String,
    event_name: String,
    /// Seconds from the start of the animation. Not validated; negative times
    /// simply sort first and are reached immediately.
    trigger_time: f32,
    #[serde(default)]
    payload: serde_json::Value,
}

impl UserEvent {
    pub fn new(
        animation_name: impl Into<String>,
        event_name: impl Into<String>,
        trigger_time: f32,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            animation_name: animation_name.into(),
            event_name: event_name.into(),
            trigger_time,
            payload,
        }
    }

    #[inline]
    pub fn animation_name(&self) -> &str {
        &self.animation_name
    }

    #[inline]
    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    #[inline]
    pub fn trigger_time(&self) -> f32 {
        self.trigger_time
    }

    #[inline]
    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    /// True when this event has the given identity.
    #[inline]
    pub fn is(&self, animation_name: &str, event_name: &str) -> bool {
        self.animation_name == animation_name && self.event_name == event_name
    }
}

/// Receives events as playback crosses them.
pub trait EventSink {
    fn on_event(&mut self, event: &UserEvent);
}

impl<F> EventSink for F
where
    F: FnMut(&UserEvent),
{
    fn on_event(&mut self, event: &UserEvent) {
        self(event)
    }
}

/// Shared, clonable recording sink. Hand one clone to a controller and keep the
/// other to inspect what fired.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    fired: Rc<RefCell<Vec<UserEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything recorded so far.
    pub fn take(&self) -> Vec<UserEvent> {
        std::mem::take(&mut *self.fired.borrow_mut())
    }

    /// Event names recorded so far, in firing order.
    pub fn names(&self) -> Vec<String> {
        self.fired
            .borrow()
            .iter()
            .map(|e| e.event_name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fired.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.fired.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.fired.borrow_mut().clear();
    }
}

impl EventSink for EventLog {
    fn on_event(&mut self, event: &UserEvent) {
        self.fired.borrow_mut().push(event.clone());
    }
}
