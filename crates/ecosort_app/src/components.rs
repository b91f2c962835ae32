//! Gameplay components attached to scene objects.
//!
//! [`Transform`](ecosort_math::Transform) lives in `ecosort_math`; everything
//! here is specific to the sorting game.

use ecosort_ecs::{Component, ComponentRef};
use ecosort_math::Vec3;
use serde::{Deserialize, Serialize};

/// Human-readable object name, used in logs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
}

impl Tag {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Perspective camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Vertical field of view in degrees.
    pub fov: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self { fov: 45.0 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightKind {
    #[default]
    Point,
    Spot,
    Directional,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub colour: Vec3,
    pub kind: LightKind,
    /// Falloff distance; ignored for directional lights.
    pub distance: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            colour: Vec3::ONE,
            kind: LightKind::Point,
            distance: 5.0,
        }
    }
}

/// Whether a body moves under simulation or stays fixed in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyType {
    Static,
    #[default]
    Dynamic,
}

/// Simulated body. Its extents come from the object's
/// [`Transform`](ecosort_math::Transform) scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RigidBody {
    pub body_type: BodyType,
    pub velocity: Vec3,
    /// Set while the body sits on top of a static body.
    pub resting: bool,
}

impl RigidBody {
    /// A body that never moves.
    #[must_use]
    pub fn fixed() -> Self {
        Self {
            body_type: BodyType::Static,
            ..Self::default()
        }
    }

    /// A dynamic body starting with `velocity`.
    #[must_use]
    pub fn dynamic(velocity: Vec3) -> Self {
        Self {
            body_type: BodyType::Dynamic,
            velocity,
            resting: false,
        }
    }

    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.body_type == BodyType::Dynamic
    }

    /// Drop velocity and contact state, as when a scene is switched away from.
    pub fn reset_motion(&mut self) {
        self.velocity = Vec3::ZERO;
        self.resting = false;
    }
}

/// A belt that carries the bodies resting on it.
///
/// `touching` holds references into the scene registry. They are refreshed
/// every frame and may go invalid at any time when rubbish is destroyed.
#[derive(Debug, Clone)]
pub struct Conveyor {
    /// Unit direction of travel.
    pub direction: Vec3,
    /// Belt speed in units per second.
    pub speed: f32,
    pub touching: Vec<ComponentRef<RigidBody>>,
}

impl Default for Conveyor {
    fn default() -> Self {
        Self {
            direction: Vec3::X,
            speed: 1.5,
            touching: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PusherPhase {
    #[default]
    Idle,
    Extending,
    Retracting,
}

/// A paddle beside the belt that shoves rubbish of one kind off the belt
/// towards its collector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pusher {
    /// Extension in `0.0..=1.0`.
    pub progress: f32,
    pub phase: PusherPhase,
    /// Unit direction the paddle extends in.
    pub direction: Vec3,
    /// Distance travelled at full extension.
    pub reach: f32,
    /// Which rubbish this pusher fires for.
    pub sorts: RubbishKind,
}

impl Pusher {
    /// Extension or retraction rate, in full strokes per second.
    pub const STROKE_RATE: f32 = 4.0;

    #[must_use]
    pub fn new(direction: Vec3, reach: f32, sorts: RubbishKind) -> Self {
        Self {
            progress: 0.0,
            phase: PusherPhase::Idle,
            direction,
            reach,
            sorts,
        }
    }

    /// Start a stroke. Returns `false` if one is already under way.
    pub fn trigger(&mut self) -> bool {
        if self.phase != PusherPhase::Idle {
            return false;
        }
        self.phase = PusherPhase::Extending;
        true
    }

    /// Advance the stroke by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        let step = Self::STROKE_RATE * dt;
        match self.phase {
            PusherPhase::Idle => {}
            PusherPhase::Extending => {
                self.progress = (self.progress + step).min(1.0);
                if self.progress >= 1.0 {
                    self.phase = PusherPhase::Retracting;
                }
            }
            PusherPhase::Retracting => {
                self.progress = (self.progress - step).max(0.0);
                if self.progress <= 0.0 {
                    self.phase = PusherPhase::Idle;
                }
            }
        }
    }

    /// Offset of the paddle from its resting position.
    #[must_use]
    pub fn offset(&self) -> Vec3 {
        self.direction * self.reach * self.progress
    }
}

impl Default for Pusher {
    fn default() -> Self {
        Self::new(Vec3::Z, 2.0, RubbishKind::Rubbish)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RubbishKind {
    #[default]
    Rubbish,
    Recycling,
    Food,
}

impl RubbishKind {
    pub const ALL: [RubbishKind; 3] = [Self::Rubbish, Self::Recycling, Self::Food];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Rubbish => "rubbish",
            Self::Recycling => "recycling",
            Self::Food => "food",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rubbish {
    pub kind: RubbishKind,
}

/// A bin that accepts one kind of rubbish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collector {
    pub accepts: RubbishKind,
}

/// Marks objects that belong to the current round and are cleared when a
/// new round starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsGameFlag;

macro_rules! impl_component {
    ($($ty:ident),* $(,)?) => {
        $(
            impl Component for $ty {
                fn type_name() -> &'static str {
                    stringify!($ty)
                }
            }
        )*
    };
}

impl_component!(Tag, Camera, Light, RigidBody, Conveyor, Pusher, Rubbish, Collector, IsGameFlag);
