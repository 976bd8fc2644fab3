//! Prototype selection for the next spawn of a category.
//!
//! [`select_prototype`] filters a category's prototypes by section, transition state, slot
//! availability and spacing, rolls the category-wide suppress curve, then draws among the
//! survivors with [`pick_weighted_random`] using each prototype's appearance weight at the
//! current distance.
use rand::Rng;
use tracing::trace;

use crate::catalog::{ObjectCategory, PrototypeCatalog, PrototypeId, SlotMask};
use crate::random::{rand01, roll};

/// Everything selection needs to know about the spawn being decided.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnContext {
    /// Lane distance at which the object would spawn.
    pub distance: f32,
    pub section: i32,
    pub previous_section: i32,
    /// The section changed and no transition piece has been spawned yet.
    pub section_transition: bool,
    /// Whether transition pieces are required on section changes.
    pub use_transitions: bool,
    /// Free lateral slots on the host platform (collidables only).
    pub slots: SlotMask,
    /// Scenes only: how far the scene chain trails the platform chain.
    pub scene_room: f32,
    /// Scenes only: room to leave free for the largest scene piece.
    pub scene_margin: f32,
}

impl SpawnContext {
    pub fn new(distance: f32, section: i32) -> Self {
        Self {
            distance,
            section,
            previous_section: section,
            section_transition: false,
            use_transitions: false,
            slots: SlotMask::all(),
            scene_room: f32::INFINITY,
            scene_margin: 0.0,
        }
    }

    pub fn with_transition(mut self, previous_section: i32, use_transitions: bool) -> Self {
        self.previous_section = previous_section;
        self.section_transition = previous_section != self.section;
        self.use_transitions = use_transitions;
        self
    }

    pub fn with_slots(mut self, slots: SlotMask) -> Self {
        self.slots = slots;
        self
    }

    pub fn with_scene_room(mut self, room: f32, margin: f32) -> Self {
        self.scene_room = room;
        self.scene_margin = margin;
        self
    }

    /// Whether this decision must be served by a transition piece.
    #[inline]
    pub fn needs_transition(&self) -> bool {
        self.use_transitions && self.section_transition
    }
}

/// A prototype that survived filtering, with its draw weight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub index: usize,
    pub allowed: bool,
    pub weight: f32,
}

pub fn pick_weighted_random(results: &[Candidate], rng: &mut dyn Rng) -> Option<usize> {
    let placeable: Vec<_> = results.iter().filter(|r| r.allowed).collect();
    if placeable.is_empty() {
        return None;
    }

    let total_weight: f32 = placeable.iter().map(|r| r.weight).sum();
    if total_weight <= 0.0 {
        return None;
    }

    let mut roll = rand01(rng) * total_weight;
    for r in &placeable {
        roll -= r.weight;
        if roll < 0.0 {
            return Some(r.index);
        }
    }

    placeable
        .iter()
        .rev()
        .find(|r| r.weight > 0.0)
        .map(|r| r.index)
}

/// Chooses the prototype index to spawn next in `category`, or `None` if nothing may spawn.
///
/// `last_spawn` reports the distance at which a prototype was last spawned, for spacing rules.
pub fn select_prototype(
    catalog: &mut PrototypeCatalog,
    category: ObjectCategory,
    ctx: &SpawnContext,
    last_spawn: &dyn Fn(PrototypeId) -> Option<f32>,
    rng: &mut dyn Rng,
) -> Option<usize> {
    if category == ObjectCategory::Scene && ctx.scene_room <= ctx.scene_margin {
        return None;
    }

    let needs_transition = ctx.needs_transition();
    let eligible: Vec<usize> = catalog
        .prototypes(category)
        .iter()
        .enumerate()
        .filter(|(_, p)| {
            if needs_transition {
                p.transition.is_some_and(|t| {
                    t.from == ctx.previous_section && t.to == ctx.section
                })
            } else {
                p.transition.is_none() && p.allows_section(ctx.section)
            }
        })
        .filter(|(_, p)| {
            !category.is_collidable()
                || p.collidable_traits()
                    .is_some_and(|c| c.slots.intersects(ctx.slots))
        })
        .filter(|(_, p)| p.appearance.spacing_allows(ctx.distance, last_spawn))
        .map(|(i, _)| i)
        .collect();

    if eligible.is_empty() {
        trace!(?category, section = ctx.section, needs_transition, "no eligible prototype");
        return None;
    }

    if let Some(suppress) = catalog.suppress_mut(category) {
        if roll(rng, suppress.value(ctx.distance)) {
            return None;
        }
    }

    let prototypes = catalog.prototypes_mut(category);
    let candidates: Vec<Candidate> = eligible
        .into_iter()
        .map(|index| {
            let weight = prototypes[index].appearance.probability(ctx.distance, rng);
            Candidate {
                index,
                allowed: weight > 0.0,
                weight,
            }
        })
        .collect();

    pick_weighted_random(&candidates, rng)
}
