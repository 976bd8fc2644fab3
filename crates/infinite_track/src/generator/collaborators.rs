//! Interfaces the generator consumes from the embedding game.
//!
//! Vectors cross this boundary as [`mint`] types so embedders can use any math library.
use glam::Vec3;

use crate::transform::Transform;

/// Anything that must follow the world when it is shifted vertically.
pub trait HeightTransition {
    fn transition_height(&mut self, amount: f32);
}

/// No-op collaborator.
impl HeightTransition for () {
    #[inline]
    fn transition_height(&mut self, _amount: f32) {}
}

/// The player as seen by the generator.
pub trait PlayerView: HeightTransition {
    fn position(&self) -> mint::Vector3<f32>;
    fn forward(&self) -> mint::Vector3<f32>;

    /// World transform used for removal checks.
    fn transform(&self) -> Transform {
        let forward = Vec3::from(self.forward());
        let forward = if forward.length_squared() > 0.0 {
            forward
        } else {
            Vec3::Z
        };
        Transform::looking(Vec3::from(self.position()), forward)
    }
}

/// A player that stands still while the world moves past it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerPose {
    pub position: Vec3,
    pub forward: Vec3,
}

impl Default for PlayerPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: Vec3::Z,
        }
    }
}

impl PlayerPose {
    pub fn new(position: Vec3, forward: Vec3) -> Self {
        Self { position, forward }
    }
}

impl HeightTransition for PlayerPose {
    fn transition_height(&mut self, amount: f32) {
        self.position.y -= amount;
    }
}

impl PlayerView for PlayerPose {
    fn position(&self) -> mint::Vector3<f32> {
        self.position.into()
    }

    fn forward(&self) -> mint::Vector3<f32> {
        self.forward.into()
    }
}

/// Collects height transitions, e.g. for a chase camera.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HeightOffset(pub f32);

impl HeightTransition for HeightOffset {
    fn transition_height(&mut self, amount: f32) {
        self.0 -= amount;
    }
}
