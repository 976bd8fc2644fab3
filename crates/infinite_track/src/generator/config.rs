#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::curve::DistanceCurve;
use crate::error::{Error, Result};
use crate::section::SectionConfig;

/// Configuration for a [`crate::generator::TrackGenerator`].
#[non_exhaustive]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// How far ahead of the player pieces are spawned. Compared squared.
    pub spawn_horizon: f32,
    /// Player-local z below which the oldest piece of a chain is retired.
    pub remove_horizon: f32,
    /// Lateral distance between collidable slots.
    pub slot_distance: f32,
    /// Keep scenery level with platforms instead of waiting for room for the largest piece.
    pub spawn_full_length: bool,
    /// Shift the world back down when a sloped platform is retired.
    pub height_reposition: bool,
    /// Chance, by distance, that a platform gets no collidables at all.
    pub no_collidable_probability: DistanceCurve,
    /// Score gained per unit of distance moved.
    pub score_multiplier: f32,
    /// Seed for the generator's random stream.
    pub seed: u64,
    pub sections: SectionConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            spawn_horizon: 100.0,
            remove_horizon: -25.0,
            slot_distance: 2.0,
            spawn_full_length: false,
            height_reposition: true,
            no_collidable_probability: DistanceCurve::default(),
            score_multiplier: 1.0,
            seed: 0,
            sections: SectionConfig::default(),
        }
    }
}

impl GeneratorConfig {
    pub fn new(spawn_horizon: f32, remove_horizon: f32) -> Self {
        Self {
            spawn_horizon,
            remove_horizon,
            ..Default::default()
        }
    }

    pub fn with_slot_distance(mut self, slot_distance: f32) -> Self {
        self.slot_distance = slot_distance;
        self
    }

    pub fn with_spawn_full_length(mut self, spawn_full_length: bool) -> Self {
        self.spawn_full_length = spawn_full_length;
        self
    }

    pub fn with_height_reposition(mut self, height_reposition: bool) -> Self {
        self.height_reposition = height_reposition;
        self
    }

    pub fn with_no_collidable_probability(mut self, curve: DistanceCurve) -> Self {
        self.no_collidable_probability = curve;
        self
    }

    pub fn with_score_multiplier(mut self, score_multiplier: f32) -> Self {
        self.score_multiplier = score_multiplier;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_sections(mut self, sections: SectionConfig) -> Self {
        self.sections = sections;
        self
    }

    /// Squared spawn horizon, as used by the spawn loop.
    #[inline]
    pub fn spawn_horizon_sq(&self) -> f32 {
        self.spawn_horizon * self.spawn_horizon
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.spawn_horizon.is_nan() || self.spawn_horizon <= 0.0 {
            return Err(Error::InvalidConfig("spawn_horizon must be > 0".into()));
        }
        if self.remove_horizon.is_nan() || self.remove_horizon >= self.spawn_horizon {
            return Err(Error::InvalidConfig(
                "remove_horizon must lie behind spawn_horizon".into(),
            ));
        }
        if self.slot_distance < 0.0 {
            return Err(Error::InvalidConfig("slot_distance must be >= 0".into()));
        }
        if self.score_multiplier < 0.0 {
            return Err(Error::InvalidConfig("score_multiplier must be >= 0".into()));
        }
        self.sections.validate()
    }
}
