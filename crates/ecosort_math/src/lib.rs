//! # ecosort_math
//!
//! Math types for EcoSort. Re-exports [`glam`] for linear algebra and defines
//! the spatial components that implement
//! [`Component`](ecosort_ecs::Component).

pub mod bounds;
pub mod transform;

// Re-export glam types for convenience.
pub use glam::{EulerRot, Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

pub use bounds::Aabb;
pub use transform::Transform;
