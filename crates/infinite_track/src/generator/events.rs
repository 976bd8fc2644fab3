//! Event types and sinks for observing the generator.
//!
//! Every state-changing operation on [`crate::generator::TrackGenerator`] has a
//! `*_with_events` variant that reports what happened through an [`EventSink`].
use glam::Vec3;

use crate::catalog::PrototypeId;
use crate::history::Lane;
use crate::pool::ObjectId;

/// Describes events emitted by the generator.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum TrackEvent {
    /// The game was started.
    Started,

    /// A piece was placed.
    Spawned {
        id: ObjectId,
        prototype: PrototypeId,
        lane: Lane,
        /// World position of the instance.
        position: Vec3,
        /// Lane distance at which the piece starts.
        distance: f32,
    },

    /// A piece fell behind the removal horizon and went back to the pool.
    Retired {
        id: ObjectId,
        prototype: PrototypeId,
        lane: Lane,
    },

    /// A turn platform was placed; branches are generated until a side is chosen.
    TurnPending {
        head: ObjectId,
        left: bool,
        right: bool,
    },

    /// The player committed to a branch.
    Turned {
        lane: Lane,
        /// Offset that keeps the player aligned with the new center lane.
        offset: Vec3,
    },

    /// A turn was taken away from a turn platform; nothing spawns until reset.
    SpawnsStopped,

    /// The world was shifted down after a sloped platform was retired.
    HeightTransition { amount: f32 },

    /// No platform could be selected; the lane stalls until conditions change.
    SpawnStalled {
        lane: Lane,
        distance: f32,
        section: i32,
        /// Section being left, when a transition piece was required.
        transition_from: Option<i32>,
    },

    /// A collidable was collected and removed ahead of its platform.
    Collected { id: ObjectId },

    /// A delayed once-off animation is due.
    OnceOffAnimation { id: ObjectId, name: String },

    /// The run was archived and the next one laid out behind it.
    Reset,

    /// Archived pieces were released and the next run became visible.
    ReadyFromReset,

    /// Non-fatal warning.
    Warning {
        /// Context string (e.g. lane, prototype).
        context: String,
        /// Human-readable message.
        message: String,
    },
}

/// Receives the [`TrackEvent`]s emitted by the `_with_events` generator operations.
pub trait EventSink {
    fn send(&mut self, event: TrackEvent);
}

/// Discards every event.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: TrackEvent) {}
}

/// Forwards events to a closure, e.g. to log or count them as they happen.
pub struct FnSink<F: FnMut(TrackEvent)>(pub F);

impl<F: FnMut(TrackEvent)> FnSink<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F: FnMut(TrackEvent)> EventSink for FnSink<F> {
    #[inline]
    fn send(&mut self, event: TrackEvent) {
        (self.0)(event);
    }
}

/// Records events in emission order.
#[derive(Debug, Default)]
pub struct VecSink {
    events: Vec<TrackEvent>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[TrackEvent] {
        &self.events
    }

    /// Number of recorded events matching `pred`.
    pub fn count(&self, pred: impl Fn(&TrackEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: TrackEvent) {
        self.events.push(event);
    }
}
