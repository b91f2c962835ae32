//! Hard-coded scene layouts.
//!
//! The belt runs along +X with its top face at `y = 0.5`. Pushers sit on the
//! far side (negative Z) and shove rubbish across the belt into collectors on
//! the near side.

use ecosort_math::{Quat, Transform, Vec3};
use tracing::info;

use crate::components::{
    Camera, Collector, Conveyor, Light, LightKind, Pusher, RigidBody, RubbishKind,
};
use crate::context::GameContext;
use crate::scene::Scene;

/// Where new rubbish appears: just above the head of the belt.
pub const SPAWN_POINT: Vec3 = Vec3::new(-6.5, 1.5, 0.0);
/// Edge length of a rubbish cube.
pub const RUBBISH_SIZE: f32 = 0.5;

const BELT_LENGTH: f32 = 14.0;
const BELT_WIDTH: f32 = 2.0;
const BELT_SPEED: f32 = 1.5;
const PUSHER_REACH: f32 = 2.0;

/// Lane position along the belt for each kind's pusher and collector.
const LANES: [(RubbishKind, f32); 3] = [
    (RubbishKind::Recycling, -3.0),
    (RubbishKind::Food, 0.0),
    (RubbishKind::Rubbish, 3.0),
];

fn add_camera(scene: &mut Scene, position: Vec3, pitch: f32) {
    let transform = Transform::from_position(position).rotated(Quat::from_rotation_x(pitch));
    scene
        .create_object("camera")
        .with(transform)
        .with(Camera::default());
}

fn add_sun(scene: &mut Scene) {
    scene
        .create_object("sun")
        .with(Transform::from_position(Vec3::new(0.0, 20.0, 0.0)))
        .with(Light {
            colour: Vec3::new(1.0, 0.95, 0.85),
            kind: LightKind::Directional,
            distance: 0.0,
        });
}

fn add_floor(scene: &mut Scene) {
    scene
        .create_object("floor")
        .with(Transform::from_position_scale(
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(40.0, 1.0, 40.0),
        ))
        .with(RigidBody::fixed());
}

/// Camera, sun, floor, and a crate dropping onto the floor behind the menu.
#[must_use]
pub fn menu_scene() -> Scene {
    let mut scene = Scene::new("menu");
    add_camera(&mut scene, Vec3::new(0.0, 3.0, 8.0), -0.3);
    add_sun(&mut scene);
    add_floor(&mut scene);
    scene
        .create_object("crate")
        .with(Transform::from_position(Vec3::new(0.0, 5.0, 0.0)))
        .with(RigidBody::dynamic(Vec3::ZERO));
    scene
}

/// The sorting floor: one belt, and a pusher and collector per rubbish kind.
#[must_use]
pub fn game_scene() -> Scene {
    let mut scene = Scene::new("game");
    add_camera(&mut scene, Vec3::new(0.0, 8.0, 9.0), -0.7);
    add_sun(&mut scene);
    add_floor(&mut scene);

    scene
        .create_object("belt")
        .with(Transform::from_position_scale(
            Vec3::ZERO,
            Vec3::new(BELT_LENGTH, 1.0, BELT_WIDTH),
        ))
        .with(RigidBody::fixed())
        .with(Conveyor {
            direction: Vec3::X,
            speed: BELT_SPEED,
            touching: Vec::new(),
        });

    for (kind, x) in LANES {
        scene
            .create_object(&format!("{} pusher", kind.name()))
            .with(Transform::from_position_scale(
                Vec3::new(x, 0.75, -BELT_WIDTH * 0.5 - 0.75),
                Vec3::new(1.0, 0.5, 0.5),
            ))
            .with(Pusher::new(Vec3::Z, PUSHER_REACH, kind));
        scene
            .create_object(&format!("{} collector", kind.name()))
            .with(Transform::from_position_scale(
                Vec3::new(x, -0.25, BELT_WIDTH * 0.5 + 1.75),
                Vec3::new(2.5, 0.5, 1.5),
            ))
            .with(Collector { accepts: kind });
        scene
            .create_object(&format!("{} lamp", kind.name()))
            .with(Transform::from_position(Vec3::new(x, 3.0, 2.0)))
            .with(Light::default());
    }
    scene
}

/// Build both scenes and a context starting in the menu.
#[must_use]
pub fn build_context() -> GameContext {
    let menu = menu_scene();
    let game = game_scene();
    info!(
        menu_objects = menu.object_count(),
        game_objects = game.object_count(),
        "scenes loaded"
    );
    GameContext::new(menu, game)
}
