//! Turns discrete "object moved" events into dense, continuously evaluable trajectories.
//!
//! Each object's log is replayed from scratch whenever it changes. A replay is a
//! small state machine: attaching to a parent or travelling along a pipe opens a
//! run, and the next position change (or the end of the log) flushes it into
//! samples. Objects riding on a parent copy the parent's samples for the attached
//! window, so parents are always replayed before the objects that depend on them.

mod event;
mod replay;
mod sampled;
mod store;

pub use event::{EventInfo, PackageEvent, PackageInfo, PackagePosition};
pub use replay::SceneLookup;
pub use sampled::{Sample, SampledPosition};
pub use store::{ObjectState, TrajectoryStore};

use chrono::{DateTime, Utc};

/// Identifier of an animated object.
pub type PackageId = u32;

/// Seconds from `epoch` to `time`, negative when `time` is earlier.
pub fn seconds_since(epoch: DateTime<Utc>, time: DateTime<Utc>) -> f64 {
    let delta = time - epoch;
    match delta.num_microseconds() {
        Some(micros) => micros as f64 / 1e6,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}
