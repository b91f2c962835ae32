//! Axis-aligned bounding boxes.

use glam::Vec3;

use crate::transform::Transform;

/// An axis-aligned box given by its minimum and maximum corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Box centred on `center` with the given half extents.
    #[must_use]
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        let half = half_extents.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Bounds of a transform's scaled unit cube, ignoring rotation.
    #[must_use]
    pub fn from_transform(transform: &Transform) -> Self {
        Self::from_center(transform.position, transform.half_extents())
    }

    /// Returns `true` if the boxes overlap or touch.
    #[must_use]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    /// Returns `true` if `point` lies inside or on the box.
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        self.min.cmple(point).all() && point.cmple(self.max).all()
    }

    /// Grow the box by `margin` on every side.
    #[must_use]
    pub fn expanded(self, margin: f32) -> Self {
        Self {
            min: self.min - Vec3::splat(margin),
            max: self.max + Vec3::splat(margin),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersects() {
        let a = Aabb::from_center(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::from_center(Vec3::new(1.5, 0.0, 0.0), Vec3::ONE);
        let c = Aabb::from_center(Vec3::new(5.0, 0.0, 0.0), Vec3::ONE);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_touching_boxes_intersect() {
        let a = Aabb::from_center(Vec3::ZERO, Vec3::splat(0.5));
        let b = Aabb::from_center(Vec3::new(0.0, 1.0, 0.0), Vec3::splat(0.5));
        assert!(a.intersects(&b));
    }

    #[test]
    fn test_from_transform_and_contains() {
        let t = Transform::from_position_scale(Vec3::new(0.0, 1.0, 0.0), Vec3::splat(2.0));
        let aabb = Aabb::from_transform(&t);
        assert!(aabb.contains(Vec3::new(0.9, 1.9, -0.9)));
        assert!(!aabb.contains(Vec3::new(0.0, 2.5, 0.0)));
        assert!(aabb.expanded(1.0).contains(Vec3::new(0.0, 2.5, 0.0)));
    }
}
