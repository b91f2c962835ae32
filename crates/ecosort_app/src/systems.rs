//! Per-frame gameplay systems.
//!
//! Each system is a plain function over a scene's registry. Systems never
//! hold component borrows across a mutation: they query, read what they
//! need through the returned handles, then write back.

use ecosort_ecs::{ComponentRef, Entity, Registry, Result};
use ecosort_math::{Aabb, Transform, Vec3};
use tracing::{debug, trace};

use crate::components::{
    Collector, Conveyor, IsGameFlag, Pusher, PusherPhase, RigidBody, Rubbish, RubbishKind,
};
use crate::context::{ActiveScene, GameContext};
use crate::levels::{RUBBISH_SIZE, SPAWN_POINT};
use crate::scene::Scene;

/// Downward acceleration in units per second squared.
pub const GRAVITY: f32 = -9.81;
/// Speed given to rubbish struck by an extending pusher.
pub const PUSH_SPEED: f32 = 4.0;
/// Slack used when testing whether two boxes are in contact.
pub const CONTACT_MARGIN: f32 = 0.05;
/// Rubbish resting below this height has fallen off the belt onto the floor.
pub const FLOOR_HEIGHT: f32 = 0.0;
/// Anything below this height is gone for good.
pub const KILL_DEPTH: f32 = -10.0;

/// Spawn one rubbish item at the head of the belt every `interval` frames.
///
/// Kinds cycle through [`RubbishKind::ALL`] in order.
pub fn spawn_rubbish(scene: &mut Scene, frame: u64, interval: u64) -> Option<Entity> {
    if interval == 0 || frame % interval != 0 {
        return None;
    }
    let index = frame / interval;
    let kind = RubbishKind::ALL[(index % RubbishKind::ALL.len() as u64) as usize];

    let name = format!("{} #{index}", kind.name());
    let entity = scene
        .create_object(&name)
        .with(Transform::from_position_scale(SPAWN_POINT, Vec3::splat(RUBBISH_SIZE)))
        .with(RigidBody::dynamic(Vec3::ZERO))
        .with(Rubbish { kind })
        .with(IsGameFlag)
        .id();
    debug!(%entity, kind = kind.name(), "spawned rubbish");
    Some(entity)
}

/// Refresh every conveyor's list of dynamic bodies lying on it.
///
/// Handles to destroyed bodies and bodies that have left the belt are
/// dropped; newly touching bodies are appended once each.
pub fn detect_contacts(registry: &mut Registry) -> Result<()> {
    let conveyors = registry.find_all::<(Conveyor, Transform)>();
    let bodies = registry.find_all::<(RigidBody, Transform)>();

    for (_, (conveyor_ref, belt_ref)) in &conveyors {
        let belt = Aabb::from_transform(belt_ref.get(registry)?).expanded(CONTACT_MARGIN);
        let on_belt = |body: &ComponentRef<RigidBody>| -> bool {
            body.valid(registry)
                && registry
                    .component::<Transform>(body.entity())
                    .is_some_and(|t| Aabb::from_transform(t).intersects(&belt))
        };

        let mut touching: Vec<ComponentRef<RigidBody>> = conveyor_ref
            .get(registry)?
            .touching
            .iter()
            .copied()
            .filter(|body| on_belt(body))
            .collect();

        for (_, (body_ref, _)) in &bodies {
            if !body_ref.get(registry)?.is_dynamic() || !on_belt(&body_ref) {
                continue;
            }
            if !touching.iter().any(|held| held.same_slot(&body_ref, registry)) {
                touching.push(body_ref);
            }
        }

        trace!(entity = %conveyor_ref.entity(), touching = touching.len(), "conveyor contacts");
        conveyor_ref.get_mut(registry)?.touching = touching;
    }
    Ok(())
}

/// Carry every touching body along its conveyor at belt speed.
pub fn drive_conveyors(registry: &mut Registry) -> Result<()> {
    let conveyors = registry.find_all::<(Conveyor,)>();
    for (_, (conveyor_ref,)) in &conveyors {
        let conveyor = conveyor_ref.get(registry)?;
        let direction = conveyor.direction.normalize_or_zero();
        let speed = conveyor.speed;
        let touching = conveyor.touching.clone();

        for body_ref in touching {
            // Bodies destroyed since contacts were gathered are skipped.
            if !body_ref.valid(registry) {
                continue;
            }
            let body = body_ref.get_mut(registry)?;
            let along = body.velocity.dot(direction);
            body.velocity += direction * (speed - along);
        }
    }
    Ok(())
}

/// Fire idle pushers at matching rubbish in their lane, advance strokes,
/// and shove whatever an extending paddle touches.
pub fn operate_pushers(registry: &mut Registry, dt: f32) -> Result<()> {
    let pushers = registry.find_all::<(Pusher, Transform)>();
    let items = registry.find_all::<(Rubbish, RigidBody, Transform)>();

    for (entity, (pusher_ref, transform_ref)) in &pushers {
        let mut pusher = *pusher_ref.get(registry)?;
        let transform = *transform_ref.get(registry)?;
        let half = transform.half_extents();

        if pusher.phase == PusherPhase::Idle {
            let lane = Aabb::from_center(
                transform.position + pusher.direction * pusher.reach * 0.5,
                half + pusher.direction.abs() * pusher.reach * 0.5,
            );
            for (_, (rubbish_ref, body_ref, item_ref)) in &items {
                let ready = rubbish_ref.get(registry)?.kind == pusher.sorts
                    && body_ref.get(registry)?.resting
                    && Aabb::from_transform(item_ref.get(registry)?).intersects(&lane);
                if ready && pusher.trigger() {
                    debug!(%entity, kind = pusher.sorts.name(), "pusher fired");
                    break;
                }
            }
        }

        pusher.advance(dt);

        if pusher.phase == PusherPhase::Extending {
            let paddle = Aabb::from_center(transform.position + pusher.offset(), half);
            for (_, (_, body_ref, item_ref)) in &items {
                if !Aabb::from_transform(item_ref.get(registry)?).intersects(&paddle) {
                    continue;
                }
                let body = body_ref.get_mut(registry)?;
                let along = body.velocity.dot(pusher.direction);
                body.velocity += pusher.direction * (PUSH_SPEED - along).max(0.0);
            }
        }

        *pusher_ref.get_mut(registry)? = pusher;
    }
    Ok(())
}

/// Apply gravity and velocity to dynamic bodies and rest them on top of
/// any static body they land on.
pub fn integrate_bodies(registry: &mut Registry, dt: f32) -> Result<()> {
    let bodies = registry.find_all::<(RigidBody, Transform)>();

    let mut supports = Vec::new();
    for (_, (body_ref, transform_ref)) in &bodies {
        if !body_ref.get(registry)?.is_dynamic() {
            supports.push(Aabb::from_transform(transform_ref.get(registry)?));
        }
    }

    for (_, (body_ref, transform_ref)) in &bodies {
        let mut body = *body_ref.get(registry)?;
        if !body.is_dynamic() {
            continue;
        }
        let mut transform = *transform_ref.get(registry)?;
        let half = transform.half_extents();
        let previous_bottom = transform.position.y - half.y;

        if !body.resting {
            body.velocity.y += GRAVITY * dt;
        }
        transform.position += body.velocity * dt;

        let moved = Aabb::from_transform(&transform);
        let support_top = supports
            .iter()
            .filter(|support| moved.intersects(&support.expanded(CONTACT_MARGIN)))
            .map(|support| support.max.y)
            .filter(|&top| previous_bottom >= top - CONTACT_MARGIN)
            .reduce(f32::max);

        body.resting = support_top.is_some();
        if let Some(top) = support_top {
            transform.position.y = top + half.y;
            body.velocity.y = body.velocity.y.max(0.0);
        }

        *body_ref.get_mut(registry)? = body;
        *transform_ref.get_mut(registry)? = transform;
    }
    Ok(())
}

/// What happened to one rubbish item removed by [`sort_rubbish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOutcome {
    pub entity: Entity,
    pub kind: RubbishKind,
    /// The collector it landed in, or `None` if it hit the floor.
    pub collector: Option<RubbishKind>,
}

impl SortOutcome {
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.collector == Some(self.kind)
    }
}

/// Remove rubbish that reached a collector or fell to the floor.
///
/// Items are gathered first and destroyed afterwards, so the query is
/// never walked while its pools change.
pub fn sort_rubbish(registry: &mut Registry) -> Result<Vec<SortOutcome>> {
    let mut collectors = Vec::new();
    for (_, (collector_ref, transform_ref)) in &registry.find_all::<(Collector, Transform)>() {
        collectors.push((
            collector_ref.get(registry)?.accepts,
            Aabb::from_transform(transform_ref.get(registry)?),
        ));
    }

    let mut outcomes = Vec::new();
    for (entity, (rubbish_ref, body_ref, transform_ref)) in
        &registry.find_all::<(Rubbish, RigidBody, Transform)>()
    {
        let kind = rubbish_ref.get(registry)?.kind;
        let transform = transform_ref.get(registry)?;
        let bounds = Aabb::from_transform(transform);

        if let Some((accepts, _)) = collectors.iter().find(|(_, bin)| bin.intersects(&bounds)) {
            outcomes.push(SortOutcome {
                entity,
                kind,
                collector: Some(*accepts),
            });
        } else if transform.position.y < KILL_DEPTH
            || (body_ref.get(registry)?.resting && transform.position.y < FLOOR_HEIGHT)
        {
            outcomes.push(SortOutcome {
                entity,
                kind,
                collector: None,
            });
        }
    }

    for outcome in &outcomes {
        registry.destroy_entity(outcome.entity)?;
        debug!(
            entity = %outcome.entity,
            kind = outcome.kind.name(),
            collector = outcome.collector.map(RubbishKind::name),
            correct = outcome.is_correct(),
            "rubbish sorted"
        );
    }
    Ok(outcomes)
}

/// Leave the menu for the game once it has been shown for `menu_frames`.
pub fn advance_menu(context: &mut GameContext, menu_frames: u64) -> bool {
    context.active() == ActiveScene::Menu
        && context.frames_in_scene() >= menu_frames
        && context.activate(ActiveScene::Game)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Tag;

    const DT: f32 = 1.0 / 60.0;

    fn floor(registry: &mut Registry) -> Entity {
        registry
            .spawn()
            .with(Transform::from_position_scale(
                Vec3::new(0.0, -1.0, 0.0),
                Vec3::new(40.0, 1.0, 40.0),
            ))
            .with(RigidBody::fixed())
            .id()
    }

    fn belt(registry: &mut Registry) -> Entity {
        registry
            .spawn()
            .with(Transform::from_position_scale(Vec3::ZERO, Vec3::new(10.0, 1.0, 2.0)))
            .with(RigidBody::fixed())
            .with(Conveyor::default())
            .id()
    }

    fn item(registry: &mut Registry, kind: RubbishKind, position: Vec3) -> Entity {
        registry
            .spawn()
            .with(Transform::from_position_scale(position, Vec3::splat(0.5)))
            .with(RigidBody::dynamic(Vec3::ZERO))
            .with(Rubbish { kind })
            .id()
    }

    #[test]
    fn test_spawn_rubbish_interval_and_kinds() {
        let mut scene = Scene::new("game");
        let spawned: Vec<Entity> = (0..10)
            .filter_map(|frame| spawn_rubbish(&mut scene, frame, 3))
            .collect();
        let kinds: Vec<RubbishKind> = spawned
            .iter()
            .map(|&e| scene.registry().component::<Rubbish>(e).unwrap().kind)
            .collect();

        assert_eq!(kinds, vec![
            RubbishKind::Rubbish,
            RubbishKind::Recycling,
            RubbishKind::Food,
            RubbishKind::Rubbish,
        ]);
        assert_eq!(scene.find_all::<(Rubbish, IsGameFlag, Tag)>().len(), 4);
        assert!(spawn_rubbish(&mut scene, 1, 0).is_none());
    }

    #[test]
    fn test_contacts_track_bodies_on_belt() {
        let mut registry = Registry::new();
        let belt = belt(&mut registry);
        let on = item(&mut registry, RubbishKind::Food, Vec3::new(0.0, 0.75, 0.0));
        item(&mut registry, RubbishKind::Food, Vec3::new(0.0, 5.0, 0.0));

        detect_contacts(&mut registry).unwrap();
        detect_contacts(&mut registry).unwrap();

        let touching = &registry.component::<Conveyor>(belt).unwrap().touching;
        assert_eq!(touching.len(), 1);
        assert_eq!(touching[0].entity(), on);
    }

    #[test]
    fn test_contacts_drop_destroyed_bodies() {
        let mut registry = Registry::new();
        let belt = belt(&mut registry);
        let doomed = item(&mut registry, RubbishKind::Food, Vec3::new(0.0, 0.75, 0.0));
        let kept = item(&mut registry, RubbishKind::Food, Vec3::new(1.0, 0.75, 0.0));
        detect_contacts(&mut registry).unwrap();

        registry.destroy_entity(doomed).unwrap();
        // The stale handle is still held until the next refresh.
        drive_conveyors(&mut registry).unwrap();
        detect_contacts(&mut registry).unwrap();

        let touching = &registry.component::<Conveyor>(belt).unwrap().touching;
        assert_eq!(touching.len(), 1);
        assert_eq!(touching[0].entity(), kept);
    }

    #[test]
    fn test_conveyor_drives_touching_bodies() {
        let mut registry = Registry::new();
        belt(&mut registry);
        let e = item(&mut registry, RubbishKind::Rubbish, Vec3::new(0.0, 0.75, 0.0));

        detect_contacts(&mut registry).unwrap();
        drive_conveyors(&mut registry).unwrap();

        let body = registry.component::<RigidBody>(e).unwrap();
        assert_eq!(body.velocity, Vec3::new(Conveyor::default().speed, 0.0, 0.0));
    }

    #[test]
    fn test_body_falls_and_rests_on_floor() {
        let mut registry = Registry::new();
        floor(&mut registry);
        let e = item(&mut registry, RubbishKind::Food, Vec3::new(0.0, 2.0, 0.0));

        for _ in 0..120 {
            integrate_bodies(&mut registry, DT).unwrap();
        }

        let body = registry.component::<RigidBody>(e).unwrap();
        let transform = registry.component::<Transform>(e).unwrap();
        assert!(body.resting);
        assert_eq!(body.velocity.y, 0.0);
        assert!((transform.position.y - -0.25).abs() < 1e-5);
    }

    #[test]
    fn test_static_bodies_do_not_move() {
        let mut registry = Registry::new();
        let floor = floor(&mut registry);
        integrate_bodies(&mut registry, DT).unwrap();
        assert_eq!(
            registry.component::<Transform>(floor).unwrap().position,
            Vec3::new(0.0, -1.0, 0.0)
        );
    }

    #[test]
    fn test_pusher_fires_for_matching_rubbish_only() {
        let mut registry = Registry::new();
        let pusher = registry
            .spawn()
            .with(Transform::from_position_scale(
                Vec3::new(0.0, 0.75, -1.75),
                Vec3::new(1.0, 0.5, 0.5),
            ))
            .with(Pusher::new(Vec3::Z, 2.0, RubbishKind::Food))
            .id();
        let wrong = item(&mut registry, RubbishKind::Recycling, Vec3::new(0.0, 0.75, 0.0));
        registry.component_mut::<RigidBody>(wrong).unwrap().resting = true;

        operate_pushers(&mut registry, DT).unwrap();
        assert_eq!(registry.component::<Pusher>(pusher).unwrap().phase, PusherPhase::Idle);

        registry.destroy_entity(wrong).unwrap();
        let right = item(&mut registry, RubbishKind::Food, Vec3::new(0.0, 0.75, 0.0));
        registry.component_mut::<RigidBody>(right).unwrap().resting = true;

        for _ in 0..10 {
            operate_pushers(&mut registry, DT).unwrap();
        }
        assert!(registry.component::<Pusher>(pusher).unwrap().progress > 0.0);
        assert_eq!(registry.component::<RigidBody>(right).unwrap().velocity.z, PUSH_SPEED);
    }

    #[test]
    fn test_sort_scores_collector_and_floor() {
        let mut registry = Registry::new();
        registry
            .spawn()
            .with(Transform::from_position_scale(
                Vec3::new(0.0, -0.25, 3.0),
                Vec3::new(2.0, 0.5, 2.0),
            ))
            .with(Collector {
                accepts: RubbishKind::Food,
            });
        let good = item(&mut registry, RubbishKind::Food, Vec3::new(0.0, -0.25, 3.0));
        let wrong_bin = item(&mut registry, RubbishKind::Rubbish, Vec3::new(0.5, -0.25, 3.0));
        let missed = item(&mut registry, RubbishKind::Food, Vec3::new(8.0, -0.25, 0.0));
        registry.component_mut::<RigidBody>(missed).unwrap().resting = true;
        let riding = item(&mut registry, RubbishKind::Food, Vec3::new(0.0, 0.75, 0.0));

        let outcomes = sort_rubbish(&mut registry).unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().any(|o| o.entity == good && o.is_correct()));
        assert!(outcomes.iter().any(|o| o.entity == wrong_bin && !o.is_correct()));
        assert!(outcomes.iter().any(|o| o.entity == missed && o.collector.is_none()));
        assert!(!registry.entity_exists(good));
        assert!(registry.entity_exists(riding));
    }

    #[test]
    fn test_advance_menu_after_delay() {
        let mut context = GameContext::new(Scene::new("menu"), Scene::new("game"));
        assert!(!advance_menu(&mut context, 2));
        context.advance_frame();
        context.advance_frame();
        assert!(advance_menu(&mut context, 2));
        assert_eq!(context.active(), ActiveScene::Game);
        assert!(!advance_menu(&mut context, 2));
    }
}
