//! Distance-gated appearance rules for a single prototype.
use rand::Rng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::catalog::PrototypeId;
use crate::curve::DistanceCurve;
use crate::random::roll;

/// Minimum traveled distance since the last spawn of `target`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpacingRule {
    pub target: PrototypeId,
    pub min_distance: f32,
}

impl SpacingRule {
    pub fn new(target: PrototypeId, min_distance: f32) -> Self {
        Self {
            target,
            min_distance,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct AppearanceRules {
    /// Weight of this prototype at a distance.
    pub occur: DistanceCurve,
    /// Chance that this prototype is skipped outright at a distance.
    pub suppress: Option<DistanceCurve>,
    pub spacing: Vec<SpacingRule>,
}

impl Default for AppearanceRules {
    fn default() -> Self {
        Self::always()
    }
}

impl AppearanceRules {
    /// Constant weight of 1 everywhere.
    pub fn always() -> Self {
        Self::with_occur(DistanceCurve::constant(1.0))
    }

    pub fn with_occur(occur: DistanceCurve) -> Self {
        Self {
            occur,
            suppress: None,
            spacing: Vec::new(),
        }
    }

    pub fn with_suppress(mut self, suppress: DistanceCurve) -> Self {
        self.suppress = Some(suppress);
        self
    }

    pub fn with_spacing(mut self, rule: SpacingRule) -> Self {
        self.spacing.push(rule);
        self
    }

    /// Selection weight at `distance`, after rolling the suppress curve.
    pub fn probability(&mut self, distance: f32, rng: &mut dyn Rng) -> f32 {
        if let Some(suppress) = self.suppress.as_mut() {
            if !suppress.is_empty() && roll(rng, suppress.value(distance)) {
                return 0.0;
            }
        }
        self.occur.value(distance)
    }

    /// True if every spacing rule is satisfied. `last_spawn` yields the distance at which a
    /// prototype was last spawned, if ever.
    pub fn spacing_allows(
        &self,
        distance: f32,
        last_spawn: impl Fn(PrototypeId) -> Option<f32>,
    ) -> bool {
        self.spacing.iter().all(|rule| match last_spawn(rule.target) {
            Some(at) => distance - at >= rule.min_distance,
            None => true,
        })
    }

    pub fn reset(&mut self) {
        self.occur.reset();
        if let Some(s) = self.suppress.as_mut() {
            s.reset();
        }
    }
}
