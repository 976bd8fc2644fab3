//! Rigid transforms for pooled objects. Y is up, rotations are yaw-only in practice.
use glam::{Quat, Vec3};

/// Yaw in degrees, in [0, 360), of a direction on the XZ plane (0 faces +Z, 90 faces +X).
pub fn yaw_degrees(direction: Vec3) -> f32 {
    direction.x.atan2(direction.z).to_degrees().rem_euclid(360.0)
}

/// Rotation facing `direction` on the XZ plane.
pub fn look_rotation(direction: Vec3) -> Quat {
    Quat::from_rotation_y(direction.x.atan2(direction.z))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Transform at `position` facing `direction`.
    pub fn looking(position: Vec3, direction: Vec3) -> Self {
        Self::new(position, look_rotation(direction))
    }

    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    #[inline]
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn yaw_degrees(&self) -> f32 {
        yaw_degrees(self.forward())
    }

    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }

    pub fn inverse_transform_point(&self, world: Vec3) -> Vec3 {
        self.rotation.inverse() * (world - self.position)
    }
}
