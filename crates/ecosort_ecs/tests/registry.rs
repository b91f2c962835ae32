//! Cross-module registry properties: lifecycle, reference stability and
//! query behaviour over realistic scenes.

use ecosort_ecs::{Component, ComponentRef, EcsError, Registry};

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Transform {
    x: f32,
    y: f32,
}

impl Component for Transform {
    fn type_name() -> &'static str {
        "Transform"
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Mesh {
    asset: String,
}

impl Component for Mesh {
    fn type_name() -> &'static str {
        "Mesh"
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Tag(u32);

impl Component for Tag {
    fn type_name() -> &'static str {
        "Tag"
    }
}

#[test]
fn transform_mesh_scenario() {
    let mut registry = Registry::new();
    let e1 = registry.create_entity();
    let e2 = registry.create_entity();
    let e3 = registry.create_entity();

    registry.add_component::<Transform>(e1).unwrap();
    registry.add_component::<Transform>(e2).unwrap();
    registry
        .add_component_with(e2, Mesh { asset: "crate.obj".into() })
        .unwrap();
    registry.add_component::<Mesh>(e3).unwrap();

    let result = registry.find_all::<(Transform, Mesh)>();
    assert_eq!(result.len(), 1);
    let (entity, (transform, mesh)) = result.into_iter().next().unwrap();
    assert_eq!(entity, e2);
    assert!(transform.valid(&registry));
    assert_eq!(mesh.get(&registry).unwrap().asset, "crate.obj");

    registry.destroy_entity(e2).unwrap();
    assert!(registry.find_all::<(Transform, Mesh)>().is_empty());
}

#[test]
fn destroy_invalidates_every_held_reference() {
    let mut registry = Registry::new();
    let e = registry.create_entity();
    let transform = registry.add_component::<Transform>(e).unwrap();
    let mesh = registry.add_component::<Mesh>(e).unwrap();
    let tag = registry.add_component::<Tag>(e).unwrap();

    registry.destroy_entity(e).unwrap();

    assert!(!registry.entity_exists(e));
    assert!(!transform.valid(&registry));
    assert!(!mesh.valid(&registry));
    assert!(!tag.valid(&registry));
    assert_eq!(tag.get(&registry).unwrap_err(), EcsError::EntityNotFound(e));
}

#[test]
fn reference_survives_pool_growth() {
    const N: u32 = 10_000;

    let mut registry = Registry::new();
    let mut held: Option<ComponentRef<Tag>> = None;
    let mut held_entity = None;

    for i in 0..N {
        let e = registry.create_entity();
        let reference = registry.add_component_with(e, Tag(i)).unwrap();
        if i == N / 2 {
            held = Some(reference);
            held_entity = Some(e);
        }
    }

    let held = held.unwrap();
    assert_eq!(held.entity(), held_entity.unwrap());
    assert_eq!(held.get(&registry).unwrap(), &Tag(N / 2));
    assert_eq!(registry.pool::<Tag>().unwrap().len(), N as usize);
}

#[test]
fn reference_survives_removal_of_earlier_entries() {
    let mut registry = Registry::new();
    let entities: Vec<_> = (0..8)
        .map(|i| registry.spawn().with(Tag(i)).id())
        .collect();
    let last = registry.get_component::<Tag>(entities[7]);

    for &e in &entities[..4] {
        registry.destroy_entity(e).unwrap();
    }

    assert_eq!(last.get(&registry).unwrap(), &Tag(7));
}

#[test]
fn stale_id_never_aliases_recycled_slot() {
    let mut registry = Registry::new();
    let old = registry.create_entity();
    let old_ref = registry.add_component_with(old, Tag(1)).unwrap();
    registry.destroy_entity(old).unwrap();

    let new = registry.create_entity();
    registry.add_component_with(new, Tag(2)).unwrap();

    assert_eq!(new.index(), old.index());
    assert!(!registry.entity_exists(old));
    assert!(!old_ref.valid(&registry));
    assert!(registry.component::<Tag>(old).is_none());
    assert_eq!(registry.component::<Tag>(new), Some(&Tag(2)));
}

#[test]
fn query_then_collect_then_mutate() {
    let mut registry = Registry::new();
    for i in 0..6 {
        registry.spawn().with(Transform::default()).with(Tag(i));
    }

    let result = registry.find_all::<(Transform, Tag)>();
    let doomed: Vec<_> = result
        .iter()
        .filter(|(_, (_, tag))| tag.get(&registry).is_ok_and(|t| t.0 % 2 == 0))
        .map(|(entity, _)| entity)
        .collect();
    assert!(!result.is_stale(&registry));

    for entity in doomed {
        registry.destroy_entity(entity).unwrap();
    }

    assert!(result.is_stale(&registry));
    assert_eq!(registry.find_all::<(Transform, Tag)>().len(), 3);
}

#[test]
fn mutating_the_iterated_pool_is_detectable() {
    let mut registry = Registry::new();
    for _ in 0..3 {
        registry.spawn().with(Tag(0));
    }

    let result = registry.find_all::<(Tag,)>();
    let mut detected = false;
    for (entity, _) in &result {
        if result.ensure_fresh(&registry).is_err() {
            detected = true;
            break;
        }
        // Adding while walking the same pool is the hazard being detected.
        let spawned = registry.create_entity();
        registry.add_component_with(spawned, Tag(entity.index())).unwrap();
    }
    assert!(detected);
}

#[test]
fn registries_are_independent() {
    let mut menu = Registry::new();
    let mut game = Registry::new();

    let menu_camera = menu.spawn().with(Transform { x: 1.0, y: 0.0 }).id();
    game.spawn().with(Transform { x: 2.0, y: 0.0 });

    assert_eq!(menu.find_all::<(Transform,)>().len(), 1);
    assert_eq!(game.find_all::<(Transform,)>().len(), 1);

    menu.destroy_entity(menu_camera).unwrap();
    assert!(menu.find_all::<(Transform,)>().is_empty());
    assert_eq!(game.find_all::<(Transform,)>().len(), 1);
}
