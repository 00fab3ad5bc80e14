//! Vizij Rig Core (engine-agnostic)
//!
//! Drives skeletal animation playback on a per-instance clock and schedules
//! host-defined frame events against the playback time of lane 0. Posing itself is
//! delegated to a [`PoseEngine`]; this crate only advances its clock, reads back
//! lane time and fires the events that were crossed.
//!
//! Building blocks, leaves first:
//! - [`EventTimeline`]: sorted frame events plus a fired-index cursor.
//! - [`PlaybackGroup`]: shared speed factor / pause flag pulled by member controllers.
//! - [`Clock`]: wall-clock delta source with an invalidatable last-tick marker.
//! - [`Controller`]: per-instance orchestrator tying the above to a pose engine.

pub mod clip_engine;
pub mod clock;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod event;
pub mod group;
pub mod ids;
pub mod rig;
pub mod timeline;
pub mod track;

// Re-exports for consumers (hosts and adapters)
pub use clip_engine::{ClipData, ClipEngine};
pub use clock::{Clock, ManualTimeSource, SystemTimeSource, TimeSource};
pub use config::Config;
pub use controller::Controller;
pub use engine::{LaneNotice, PoseEngine};
pub use error::RigError;
pub use event::{EventLog, EventSink, UserEvent};
pub use group::{GroupSnapshot, GroupState, PlaybackGroup, SharedGroup};
pub use ids::{EntryId, IdAllocator};
pub use rig::{parse_rig_json, RigData};
pub use timeline::{EventTimeline, TIME_EPSILON};
pub use track::{Track, TrackListener};
