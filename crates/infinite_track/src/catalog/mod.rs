//! Prototype catalogs: the static facts about everything the generator can spawn.
//!
//! A [`PrototypeCatalog`] holds one list of [`Prototype`]s per [`ObjectCategory`]. It is
//! supplied by the embedder (optionally deserialized with the `serde` feature) and owned by the
//! [`crate::pool::ObjectPool`] once the generator is built.
use bitflags::bitflags;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::curve::DistanceCurve;
use crate::error::{Error, Result};

pub mod appearance;
pub mod prototype;

pub use appearance::{AppearanceRules, SpacingRule};
pub use prototype::{
    CollidableTraits, OnceOffAnimation, PlatformSlope, PlatformTraits, Prototype,
    PrototypeTraits, SectionTransition, SupportsOnceOffAnimation, MAX_COLLIDABLE_POSITIONS,
};

/// Broad class of a spawnable object.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectCategory {
    Platform,
    Scene,
    Obstacle,
    PowerUp,
    Coin,
}

impl ObjectCategory {
    pub const COUNT: usize = 5;

    pub const ALL: [ObjectCategory; Self::COUNT] = [
        ObjectCategory::Platform,
        ObjectCategory::Scene,
        ObjectCategory::Obstacle,
        ObjectCategory::PowerUp,
        ObjectCategory::Coin,
    ];

    /// Attach order used when decorating a platform.
    pub const COLLIDABLES: [ObjectCategory; 3] = [
        ObjectCategory::Obstacle,
        ObjectCategory::Coin,
        ObjectCategory::PowerUp,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub const fn is_collidable(self) -> bool {
        matches!(
            self,
            ObjectCategory::Obstacle | ObjectCategory::PowerUp | ObjectCategory::Coin
        )
    }

    /// Top-level categories are chained per lane in the spawn history.
    #[inline]
    pub const fn is_top_level(self) -> bool {
        matches!(self, ObjectCategory::Platform | ObjectCategory::Scene)
    }
}

/// Identifies a prototype by category and index within that category.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrototypeId {
    pub category: ObjectCategory,
    pub index: usize,
}

impl PrototypeId {
    pub const fn new(category: ObjectCategory, index: usize) -> Self {
        Self { category, index }
    }

    pub const fn platform(index: usize) -> Self {
        Self::new(ObjectCategory::Platform, index)
    }

    pub const fn scene(index: usize) -> Self {
        Self::new(ObjectCategory::Scene, index)
    }
}

bitflags! {
    /// Lateral slots (left/center/right) on a platform.
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SlotMask: u8 {
        const LEFT = 1;
        const CENTER = 2;
        const RIGHT = 4;
    }
}

impl SlotMask {
    /// Lateral multiplier (-1, 0, 1) for each single slot, in left-to-right order.
    pub fn lateral_signs(self) -> impl Iterator<Item = (SlotMask, f32)> {
        [
            (SlotMask::LEFT, -1.0),
            (SlotMask::CENTER, 0.0),
            (SlotMask::RIGHT, 1.0),
        ]
        .into_iter()
        .filter(move |(slot, _)| self.contains(*slot))
    }
}

/// Every prototype the generator may spawn, grouped by category.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default)]
pub struct PrototypeCatalog {
    prototypes: [Vec<Prototype>; ObjectCategory::COUNT],
    /// Per-category chance that nothing of the category spawns at a position.
    suppress: [Option<DistanceCurve>; ObjectCategory::COUNT],
}

impl PrototypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a prototype and returns its id.
    pub fn add(&mut self, category: ObjectCategory, prototype: Prototype) -> PrototypeId {
        let list = &mut self.prototypes[category.index()];
        list.push(prototype);
        PrototypeId::new(category, list.len() - 1)
    }

    /// Builder-style [`PrototypeCatalog::add`].
    pub fn with(mut self, category: ObjectCategory, prototype: Prototype) -> Self {
        self.add(category, prototype);
        self
    }

    /// Sets the category-wide suppress curve.
    pub fn with_suppress(mut self, category: ObjectCategory, curve: DistanceCurve) -> Self {
        self.suppress[category.index()] = Some(curve);
        self
    }

    pub fn prototypes(&self, category: ObjectCategory) -> &[Prototype] {
        &self.prototypes[category.index()]
    }

    pub fn prototypes_mut(&mut self, category: ObjectCategory) -> &mut [Prototype] {
        &mut self.prototypes[category.index()]
    }

    pub fn suppress_mut(&mut self, category: ObjectCategory) -> Option<&mut DistanceCurve> {
        self.suppress[category.index()].as_mut()
    }

    pub fn get(&self, id: PrototypeId) -> Option<&Prototype> {
        self.prototypes[id.category.index()].get(id.index)
    }

    pub fn try_get(&self, id: PrototypeId) -> Result<&Prototype> {
        self.get(id).ok_or(Error::UnknownPrototype {
            category: id.category,
            index: id.index,
        })
    }

    pub fn len(&self, category: ObjectCategory) -> usize {
        self.prototypes[category.index()].len()
    }

    pub fn total_len(&self) -> usize {
        self.prototypes.iter().map(Vec::len).sum()
    }

    /// Longest scene piece; scenery waits for this much room unless a turn forces catch-up.
    pub fn largest_scene_length(&self) -> f32 {
        self.prototypes(ObjectCategory::Scene)
            .iter()
            .map(|p| p.extents.z)
            .fold(0.0, f32::max)
    }

    /// Checks that every prototype's traits match its category and that extents are usable.
    pub fn validate(&self) -> Result<()> {
        if self.prototypes(ObjectCategory::Platform).is_empty() {
            return Err(Error::InvalidConfig(
                "catalog must contain at least one platform prototype".into(),
            ));
        }

        for category in ObjectCategory::ALL {
            for (index, p) in self.prototypes(category).iter().enumerate() {
                let matches = match (&p.traits, category) {
                    (PrototypeTraits::Platform(_), ObjectCategory::Platform) => true,
                    (PrototypeTraits::Scene, ObjectCategory::Scene) => true,
                    (PrototypeTraits::Collidable(_), c) => c.is_collidable(),
                    _ => false,
                };
                if !matches {
                    return Err(Error::InvalidConfig(format!(
                        "{category:?} prototype #{index} ('{}') has traits of another category",
                        p.name
                    )));
                }
                if category.is_top_level() && p.extents.z <= 0.0 {
                    return Err(Error::InvalidConfig(format!(
                        "{category:?} prototype #{index} ('{}') needs a positive length",
                        p.name
                    )));
                }
                if let Some(t) = p.platform_traits() {
                    if t.collidable_positions > MAX_COLLIDABLE_POSITIONS {
                        return Err(Error::InvalidConfig(format!(
                            "platform prototype #{index} ('{}') has {} collidable positions, \
                             at most {MAX_COLLIDABLE_POSITIONS} are supported",
                            p.name, t.collidable_positions
                        )));
                    }
                }
                for rule in &p.appearance.spacing {
                    self.try_get(rule.target)?;
                }
            }
        }

        Ok(())
    }
}
