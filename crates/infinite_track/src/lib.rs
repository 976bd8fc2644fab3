#![forbid(unsafe_code)]
//! infinite_track: endless-runner track streaming around a stationary player.
//!
//! Modules:
//! - catalog: prototypes (platforms, scenes, collidables), appearance rules and slot masks
//! - curve: distance-keyed piecewise curves and Bezier platform paths
//! - pool: object pool with parent/child links and prototype selection
//! - history: per-lane spawn bookkeeping, branching and turn merging
//! - section: themed section progression along the track
//! - generator: the track generator, its config, collaborators and events
//! - timer: countdown timers for delayed animations
//! - transform: placement math shared by the other modules
//!
//! For a walkthrough, see the README.
pub mod catalog;
pub mod curve;
pub mod error;
pub mod generator;
pub mod history;
pub mod pool;
mod random;
pub mod section;
pub mod timer;
pub mod transform;

/// Convenient re-exports for common types. Import with `use infinite_track::prelude::*;`.
pub mod prelude {
    pub use crate::catalog::{
        AppearanceRules, CollidableTraits, ObjectCategory, OnceOffAnimation, PlatformSlope,
        PlatformTraits, Prototype, PrototypeCatalog, PrototypeId, SlotMask, SpacingRule,
        SupportsOnceOffAnimation,
    };
    pub use crate::curve::{CurveCursor, DistanceCurve, DistanceValue, PlatformCurve};
    pub use crate::error::{Error, Result};
    pub use crate::generator::{
        EventSink, FnSink, GeneratorConfig, GeneratorState, HeightOffset, HeightTransition,
        PlayerPose, PlayerView, StartupLayout, TrackEvent, TrackGenerator, VecSink,
    };
    pub use crate::history::{Lane, SpawnHistory};
    pub use crate::pool::{pick_weighted_random, ObjectId, ObjectPool, ObjectState};
    pub use crate::section::{SectionConfig, SectionMode};
    pub use crate::transform::Transform;
}
