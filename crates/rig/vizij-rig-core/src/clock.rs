//! Wall-clock time sources and the per-controller tick clock.

use std::cell::Cell;
use std::rc::Rc;

/// Source of monotonic wall time in seconds.
pub trait TimeSource {
    fn now_seconds(&self) -> f64;
}

/// Monotonic system time measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: instant::Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self {
            origin: instant::Instant::now(),
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn now_seconds(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Host-driven time. Clones share the same cell, so a host (or a test) can keep
/// one handle and move the other into a controller.
#[derive(Debug, Clone, Default)]
pub struct ManualTimeSource {
    now: Rc<Cell<f64>>,
}

impl ManualTimeSource {
    pub fn new(start: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn set(&self, seconds: f64) {
        self.now.set(seconds);
    }

    pub fn advance(&self, seconds: f64) {
        self.now.set(self.now.get() + seconds);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_seconds(&self) -> f64 {
        self.now.get()
    }
}

/// Delta accumulator with a "last tick" marker.
///
/// An unset marker means the clock needs to re-synchronize: the next tick only
/// records the current time and produces no delta.
pub struct Clock {
    source: Box<dyn TimeSource>,
    last_tick: Option<f64>,
}

impl std::fmt::Debug for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clock")
            .field("last_tick", &self.last_tick)
            .finish_non_exhaustive()
    }
}

impl Clock {
    pub fn new(source: impl TimeSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            last_tick: None,
        }
    }

    #[inline]
    pub fn now(&self) -> f64 {
        self.source.now_seconds()
    }

    #[inline]
    pub fn last_tick(&self) -> Option<f64> {
        self.last_tick
    }

    #[inline]
    pub fn mark(&mut self, now: f64) {
        self.last_tick = Some(now);
    }

    /// Drop the marker so the next tick re-synchronizes instead of applying the
    /// whole gap as one delta.
    #[inline]
    pub fn invalidate(&mut self) {
        self.last_tick = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_source_is_shared_between_clones() {
        let host = ManualTimeSource::new(1.0);
        let clock = Clock::new(host.clone());
        host.advance(0.5);
        assert_eq!(clock.now(), 1.5);
        host.set(10.0);
        assert_eq!(clock.now(), 10.0);
    }

    #[test]
    fn invalidate_clears_marker() {
        let mut clock = Clock::new(ManualTimeSource::new(0.0));
        assert_eq!(clock.last_tick(), None);
        clock.mark(2.0);
        assert_eq!(clock.last_tick(), Some(2.0));
        clock.invalidate();
        assert_eq!(clock.last_tick(), None);
    }

    #[test]
    fn system_source_is_monotonic() {
        let src = SystemTimeSource::new();
        let a = src.now_seconds();
        let b = src.now_seconds();
        assert!(b >= a);
    }
}
