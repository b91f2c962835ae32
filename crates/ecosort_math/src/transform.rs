//! 3D transform component.
//!
//! [`Transform`] represents position, rotation, and scale in 3D space. Nearly
//! every object in a scene has one: cameras, lights, belts, rubbish.

use ecosort_ecs::Component;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position, rotation and per-axis scale of an object.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Transform {
    /// World-space position.
    pub position: Vec3,
    /// Rotation as a unit quaternion.
    pub rotation: Quat,
    /// Per-axis scale factor.
    pub scale: Vec3,
}

impl Transform {
    /// The identity transform: origin, no rotation, unit scale.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Create a new transform with the given position and default rotation/scale.
    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Create a new transform with position and scale.
    #[must_use]
    pub fn from_position_scale(position: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            scale,
            ..Self::IDENTITY
        }
    }

    /// Compute the 4×4 model matrix for this transform.
    #[must_use]
    pub fn to_matrix(&self) -> glam::Mat4 {
        glam::Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Translate the transform by the given offset.
    #[must_use]
    pub fn translated(mut self, offset: Vec3) -> Self {
        self.position += offset;
        self
    }

    /// Rotate the transform by the given quaternion.
    #[must_use]
    pub fn rotated(mut self, rotation: Quat) -> Self {
        self.rotation = rotation * self.rotation;
        self
    }

    /// Half of the scaled unit cube's extent along each axis, ignoring rotation.
    #[must_use]
    pub fn half_extents(&self) -> Vec3 {
        self.scale.abs() * 0.5
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Component for Transform {
    fn type_name() -> &'static str {
        "Transform"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_transform() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
    }

    #[test]
    fn test_translated() {
        let t = Transform::IDENTITY.translated(Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(t.position, Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_matrix_identity() {
        assert_eq!(Transform::IDENTITY.to_matrix(), glam::Mat4::IDENTITY);
    }

    #[test]
    fn test_matrix_applies_scale_before_translation() {
        let t = Transform::from_position_scale(Vec3::new(1.0, 0.0, 0.0), Vec3::splat(2.0));
        let p = t.to_matrix().transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(p, Vec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn test_half_extents() {
        let t = Transform::from_position_scale(Vec3::ZERO, Vec3::new(4.0, -2.0, 1.0));
        assert_eq!(t.half_extents(), Vec3::new(2.0, 1.0, 0.5));
    }
}
