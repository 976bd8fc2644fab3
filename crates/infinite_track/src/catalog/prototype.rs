//! Prototype definitions.
use glam::Vec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::catalog::appearance::AppearanceRules;
use crate::catalog::SlotMask;
use crate::curve::PlatformCurve;

/// A reusable template for pooled instances.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct Prototype {
    pub name: String,
    /// World-space bounding size: x width, y height (rise for sloped platforms), z length.
    pub extents: Vec3,
    /// Offset from the placement point to the instance origin, in the prototype's frame.
    pub anchor: Vec3,
    /// Sections this prototype may spawn in. Empty means every section.
    pub sections: Vec<i32>,
    /// Marks a piece that bridges two sections.
    pub transition: Option<SectionTransition>,
    pub appearance: AppearanceRules,
    pub traits: PrototypeTraits,
}

/// A `(from, to)` section pair bridged by a transition piece.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SectionTransition {
    pub from: i32,
    pub to: i32,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub enum PrototypeTraits {
    Platform(PlatformTraits),
    Scene,
    Collidable(CollidableTraits),
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlatformSlope {
    #[default]
    None,
    Up,
    Down,
}

/// Platforms track taken collidable positions in a 32-bit mask.
pub const MAX_COLLIDABLE_POSITIONS: u8 = 32;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct PlatformTraits {
    pub left_turn: bool,
    pub right_turn: bool,
    /// Junction point of a turn platform, relative to its center
    /// (x along the turn direction, z along the approach direction).
    pub turn_center_offset: Vec3,
    /// Sloped platforms rise (or drop) by `extents.y` over their length.
    pub slope: PlatformSlope,
    /// Number of longitudinal positions that may hold a collidable, at most
    /// [`MAX_COLLIDABLE_POSITIONS`].
    pub collidable_positions: u8,
    /// Lateral slots collidables may use on this platform.
    pub slots: SlotMask,
    /// At most one collidable of each category per platform.
    pub force_distinct: bool,
    pub curve: Option<PlatformCurve>,
}

impl Default for PlatformTraits {
    fn default() -> Self {
        Self {
            left_turn: false,
            right_turn: false,
            turn_center_offset: Vec3::ZERO,
            slope: PlatformSlope::None,
            collidable_positions: 0,
            slots: SlotMask::all(),
            force_distinct: false,
            curve: None,
        }
    }
}

impl PlatformTraits {
    #[inline]
    pub fn is_turn(&self) -> bool {
        self.left_turn || self.right_turn
    }
}

/// Once-off animation played some time after a trigger (e.g. obstacle destruction).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct OnceOffAnimation {
    pub name: String,
    /// Seconds between the trigger and the animation start.
    pub delay: f32,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default)]
pub struct CollidableTraits {
    /// Slots this collidable can occupy.
    pub slots: SlotMask,
    /// Destructible obstacles carry the animation played when attacked.
    pub destruction: Option<OnceOffAnimation>,
}

/// Capability of objects that can play a once-off animation.
pub trait SupportsOnceOffAnimation {
    fn once_off_animation(&self) -> Option<&OnceOffAnimation>;
}

impl SupportsOnceOffAnimation for CollidableTraits {
    fn once_off_animation(&self) -> Option<&OnceOffAnimation> {
        self.destruction.as_ref()
    }
}

impl SupportsOnceOffAnimation for Prototype {
    fn once_off_animation(&self) -> Option<&OnceOffAnimation> {
        match &self.traits {
            PrototypeTraits::Collidable(c) => c.once_off_animation(),
            _ => None,
        }
    }
}

impl Prototype {
    fn with_traits(name: impl Into<String>, extents: Vec3, traits: PrototypeTraits) -> Self {
        Self {
            name: name.into(),
            extents,
            anchor: Vec3::ZERO,
            sections: Vec::new(),
            transition: None,
            appearance: AppearanceRules::default(),
            traits,
        }
    }

    pub fn platform(name: impl Into<String>, extents: Vec3) -> Self {
        Self::with_traits(name, extents, PrototypeTraits::Platform(PlatformTraits::default()))
    }

    pub fn scene(name: impl Into<String>, extents: Vec3) -> Self {
        Self::with_traits(name, extents, PrototypeTraits::Scene)
    }

    pub fn collidable(name: impl Into<String>, extents: Vec3, slots: SlotMask) -> Self {
        Self::with_traits(
            name,
            extents,
            PrototypeTraits::Collidable(CollidableTraits {
                slots,
                destruction: None,
            }),
        )
    }

    pub fn with_anchor(mut self, anchor: Vec3) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn with_sections(mut self, sections: Vec<i32>) -> Self {
        self.sections = sections;
        self
    }

    pub fn with_transition(mut self, from: i32, to: i32) -> Self {
        self.transition = Some(SectionTransition { from, to });
        self
    }

    pub fn with_appearance(mut self, appearance: AppearanceRules) -> Self {
        self.appearance = appearance;
        self
    }

    /// Applies `f` to the platform traits; no-op for other kinds.
    pub fn with_platform(mut self, f: impl FnOnce(&mut PlatformTraits)) -> Self {
        if let PrototypeTraits::Platform(p) = &mut self.traits {
            f(p);
        }
        self
    }

    /// Applies `f` to the collidable traits; no-op for other kinds.
    pub fn with_collidable(mut self, f: impl FnOnce(&mut CollidableTraits)) -> Self {
        if let PrototypeTraits::Collidable(c) = &mut self.traits {
            f(c);
        }
        self
    }

    pub fn platform_traits(&self) -> Option<&PlatformTraits> {
        match &self.traits {
            PrototypeTraits::Platform(p) => Some(p),
            _ => None,
        }
    }

    pub fn collidable_traits(&self) -> Option<&CollidableTraits> {
        match &self.traits {
            PrototypeTraits::Collidable(c) => Some(c),
            _ => None,
        }
    }

    /// True if the prototype may spawn in `section` (no sections means any).
    pub fn allows_section(&self, section: i32) -> bool {
        self.sections.is_empty() || self.sections.contains(&section)
    }

    pub fn is_turn(&self) -> bool {
        self.platform_traits().is_some_and(PlatformTraits::is_turn)
    }

    /// Height gained from the start to the end of a platform. Negative on downward slopes.
    pub fn rise(&self) -> f32 {
        match self.platform_traits().map(|p| p.slope) {
            Some(PlatformSlope::Up) => self.extents.y,
            Some(PlatformSlope::Down) => -self.extents.y,
            _ => 0.0,
        }
    }
}
