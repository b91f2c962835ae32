//! Multi-component queries.
//!
//! A query selects the entities of a registry whose component-type set
//! satisfies a [`QueryMode`] over a tuple of requested types, and yields one
//! [`ComponentRef`] per requested type for each of them:
//!
//! ```rust
//! # use ecosort_ecs::{Component, Registry};
//! # #[derive(Default)] struct Transform;
//! # impl Component for Transform { fn type_name() -> &'static str { "Transform" } }
//! # #[derive(Default)] struct Mesh;
//! # impl Component for Mesh { fn type_name() -> &'static str { "Mesh" } }
//! let mut registry = Registry::new();
//! registry.spawn().with(Transform).with(Mesh);
//!
//! for (entity, (transform, mesh)) in registry.find_all::<(Transform, Mesh)>() {
//!     assert!(transform.valid(&registry) && mesh.valid(&registry));
//!     # let _ = entity;
//! }
//! ```
//!
//! Results are snapshots. They record the structural epoch of every pool they
//! looked at, so code that mutates the registry while walking a result can
//! detect it with [`QueryResult::is_stale`]. The safe pattern is: query,
//! collect the work, then mutate.

use std::collections::{BTreeSet, HashSet};

use crate::component::{Component, ComponentInfo, ComponentTypeId};
use crate::entity::Entity;
use crate::error::{EcsError, Result};
use crate::reference::{ComponentRef, RegistryId};
use crate::registry::Registry;

/// How an entity's component set is matched against the requested types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryMode {
    /// The entity has every requested type.
    All,
    /// The entity has at least one requested type.
    Any,
    /// The entity's component set is exactly the requested set.
    Match,
}

/// A tuple of component types that can be queried together.
///
/// Implemented for tuples of one to eight [`Component`] types.
pub trait ComponentSet: 'static {
    /// One [`ComponentRef`] per type in the tuple.
    type Refs: Copy;

    /// Descriptors of the requested types, in tuple order.
    fn infos() -> Vec<ComponentInfo>;

    /// Builds the handles for `entity` in registry `registry`.
    fn refs(registry: RegistryId, entity: Entity) -> Self::Refs;
}

macro_rules! impl_component_set {
    ($($name:ident),+) => {
        impl<$($name: Component),+> ComponentSet for ($($name,)+) {
            type Refs = ($(ComponentRef<$name>,)+);

            fn infos() -> Vec<ComponentInfo> {
                vec![$($name::info()),+]
            }

            fn refs(registry: RegistryId, entity: Entity) -> Self::Refs {
                ($(ComponentRef::<$name>::new(registry, entity),)+)
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);
impl_component_set!(A, B, C, D, E, F, G);
impl_component_set!(A, B, C, D, E, F, G, H);

/// Snapshot of the entities matched by a query.
pub struct QueryResult<Q: ComponentSet> {
    registry: RegistryId,
    items: Vec<(Entity, Q::Refs)>,
    /// Pool epochs at query time; `None` when the pool did not exist yet.
    epochs: Vec<(ComponentInfo, Option<u64>)>,
}

impl<Q: ComponentSet> QueryResult<Q> {
    /// Number of matched entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if nothing matched. An empty result is not an error.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over `(entity, refs)` items without consuming the result.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, Q::Refs)> + '_ {
        self.items.iter().copied()
    }

    /// The matched entities, in result order.
    #[must_use]
    pub fn entities(&self) -> Vec<Entity> {
        self.items.iter().map(|(entity, _)| *entity).collect()
    }

    /// Returns `true` if any pool this query looked at has gained or lost
    /// components since the query ran, or if `registry` did not produce it.
    #[must_use]
    pub fn is_stale(&self, registry: &Registry) -> bool {
        self.ensure_fresh(registry).is_err()
    }

    /// Errors if the snapshot no longer reflects `registry`'s structure.
    ///
    /// # Errors
    ///
    /// [`EcsError::StaleQuery`] naming the first pool that changed.
    pub fn ensure_fresh(&self, registry: &Registry) -> Result<()> {
        for (info, epoch) in &self.epochs {
            let current = registry.erased_pool(info.type_id).map(|pool| pool.epoch());
            if registry.id() != self.registry || current != *epoch {
                return Err(EcsError::StaleQuery {
                    component: info.name,
                });
            }
        }
        Ok(())
    }
}

impl<Q: ComponentSet> IntoIterator for QueryResult<Q> {
    type Item = (Entity, Q::Refs);
    type IntoIter = std::vec::IntoIter<(Entity, Q::Refs)>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'q, Q: ComponentSet> IntoIterator for &'q QueryResult<Q> {
    type Item = (Entity, Q::Refs);
    type IntoIter = std::iter::Copied<std::slice::Iter<'q, (Entity, Q::Refs)>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter().copied()
    }
}

impl<Q: ComponentSet> std::fmt::Debug for QueryResult<Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&'static str> = self.epochs.iter().map(|(info, _)| info.name).collect();
        f.debug_struct("QueryResult")
            .field("components", &names)
            .field("entities", &self.entities())
            .finish()
    }
}

impl Registry {
    /// Run a query over the component types in `Q`.
    ///
    /// For [`QueryMode::All`] and [`QueryMode::Match`] the smallest requested
    /// pool drives iteration; a requested type with no pool matches nothing.
    /// For [`QueryMode::Any`] the pools are visited in tuple order and each
    /// entity is reported once, at its first appearance. Within the driving
    /// pool, results follow insertion order.
    ///
    /// In `Any` mode some handles of an item may be invalid, since the entity does
    /// not have every type. Check [`ComponentRef::valid`] before use.
    #[must_use]
    pub fn query<Q: ComponentSet>(&self, mode: QueryMode) -> QueryResult<Q> {
        let infos = Q::infos();
        let epochs: Vec<(ComponentInfo, Option<u64>)> = infos
            .iter()
            .map(|info| (*info, self.erased_pool(info.type_id).map(|pool| pool.epoch())))
            .collect();

        let matched = match mode {
            QueryMode::All | QueryMode::Match => self.match_required(&infos, mode),
            QueryMode::Any => self.match_any(&infos),
        };

        QueryResult {
            registry: self.id(),
            items: matched
                .into_iter()
                .map(|entity| (entity, Q::refs(self.id(), entity)))
                .collect(),
            epochs,
        }
    }

    fn match_required(&self, infos: &[ComponentInfo], mode: QueryMode) -> Vec<Entity> {
        let mut pools = Vec::with_capacity(infos.len());
        for info in infos {
            match self.erased_pool(info.type_id) {
                Some(pool) => pools.push(pool),
                None => return Vec::new(),
            }
        }
        let Some(driver) = pools.iter().min_by_key(|pool| pool.len()) else {
            return Vec::new();
        };
        let requested: BTreeSet<ComponentTypeId> = infos.iter().map(|info| info.type_id).collect();

        driver
            .entities()
            .iter()
            .copied()
            .filter(|&entity| self.entity_exists(entity))
            .filter(|&entity| pools.iter().all(|pool| pool.contains_entity(entity)))
            .filter(|&entity| mode != QueryMode::Match || self.component_types(entity) == requested)
            .collect()
    }

    fn match_any(&self, infos: &[ComponentInfo]) -> Vec<Entity> {
        let mut seen = HashSet::new();
        let mut visited = HashSet::new();
        let mut matched = Vec::new();
        for info in infos {
            if !visited.insert(info.type_id) {
                continue;
            }
            let Some(pool) = self.erased_pool(info.type_id) else {
                continue;
            };
            for &entity in pool.entities() {
                if self.entity_exists(entity) && seen.insert(entity) {
                    matched.push(entity);
                }
            }
        }
        matched
    }

    /// Entities that have every type in `Q`.
    #[must_use]
    pub fn find_all<Q: ComponentSet>(&self) -> QueryResult<Q> {
        self.query(QueryMode::All)
    }

    /// Entities that have at least one type in `Q`.
    #[must_use]
    pub fn find_any<Q: ComponentSet>(&self) -> QueryResult<Q> {
        self.query(QueryMode::Any)
    }

    /// Entities whose component set is exactly the types in `Q`.
    #[must_use]
    pub fn find_match<Q: ComponentSet>(&self) -> QueryResult<Q> {
        self.query(QueryMode::Match)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    struct A(u32);
    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    struct B(u32);
    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    struct C(u32);
    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    struct Unused;

    impl Component for A {
        fn type_name() -> &'static str {
            "A"
        }
    }
    impl Component for B {
        fn type_name() -> &'static str {
            "B"
        }
    }
    impl Component for C {
        fn type_name() -> &'static str {
            "C"
        }
    }
    impl Component for Unused {
        fn type_name() -> &'static str {
            "Unused"
        }
    }

    /// Entities with {A}, {A,B}, {B,C} and {A,B,C}.
    fn fixture() -> (Registry, [Entity; 4]) {
        let mut registry = Registry::new();
        let a = registry.spawn().with(A(1)).id();
        let ab = registry.spawn().with(A(2)).with(B(2)).id();
        let bc = registry.spawn().with(B(3)).with(C(3)).id();
        let abc = registry.spawn().with(A(4)).with(B(4)).with(C(4)).id();
        (registry, [a, ab, bc, abc])
    }

    #[test]
    fn test_find_all() {
        let (registry, [_, ab, _, abc]) = fixture();
        let result = registry.find_all::<(A, B)>();
        assert_eq!(result.entities(), vec![ab, abc]);
        for (entity, (a, b)) in &result {
            assert_eq!(a.get(&registry).unwrap().0, b.get(&registry).unwrap().0);
            assert_eq!(a.entity(), entity);
        }
    }

    #[test]
    fn test_find_any_deduplicates() {
        let (registry, [a, ab, bc, abc]) = fixture();
        let result = registry.find_any::<(A, C)>();
        assert_eq!(result.entities(), vec![a, ab, abc, bc]);

        let (_, (_, c)) = result.iter().next().unwrap();
        assert!(!c.valid(&registry));
    }

    #[test]
    fn test_find_match_is_exact() {
        let (registry, [_, ab, _, _]) = fixture();
        assert_eq!(registry.find_match::<(A, B)>().entities(), vec![ab]);
        assert_eq!(registry.find_match::<(B, A)>().entities(), vec![ab]);
    }

    #[test]
    fn test_empty_results_are_valid() {
        let (registry, _) = fixture();
        assert!(registry.find_all::<(A, Unused)>().is_empty());
        assert!(registry.find_any::<(Unused,)>().is_empty());
        assert!(registry.find_match::<(C,)>().is_empty());

        let empty = Registry::new();
        let result = empty.find_all::<(A,)>();
        assert_eq!(result.len(), 0);
        assert_eq!(result.into_iter().count(), 0);
    }

    #[test]
    fn test_smallest_pool_drives_in_insertion_order() {
        let mut registry = Registry::new();
        let mut expected = Vec::new();
        for i in 0..10 {
            let mut handle = registry.spawn();
            handle.with(A(i));
            if i % 3 == 0 {
                handle.with(B(i));
                expected.push(handle.id());
            }
        }
        assert_eq!(registry.find_all::<(A, B)>().entities(), expected);
        assert_eq!(registry.find_all::<(B, A)>().entities(), expected);
    }

    #[test]
    fn test_result_is_a_snapshot() {
        let (mut registry, _) = fixture();
        let result = registry.find_all::<(A,)>();
        let late = registry.spawn().with(A(9)).id();
        assert_eq!(result.len(), 3);
        assert!(!result.entities().contains(&late));
    }

    #[test]
    fn test_structural_change_makes_result_stale() {
        let (mut registry, [a, ..]) = fixture();
        let result = registry.find_all::<(A, B)>();
        assert!(result.ensure_fresh(&registry).is_ok());

        registry.remove_component::<A>(a);
        assert_eq!(
            result.ensure_fresh(&registry),
            Err(EcsError::StaleQuery { component: "A" })
        );
    }

    #[test]
    fn test_value_mutation_keeps_result_fresh() {
        let (mut registry, _) = fixture();
        let result = registry.find_all::<(A, B)>();
        for (_, (a, _)) in &result {
            a.get_mut(&mut registry).unwrap().0 += 10;
        }
        assert!(!result.is_stale(&registry));
    }

    #[test]
    fn test_result_is_stale_for_other_registry() {
        let (registry, _) = fixture();
        let (other, _) = fixture();
        assert!(registry.find_all::<(A,)>().is_stale(&other));
    }

    #[test]
    fn test_missing_pool_created_later_makes_result_stale() {
        let (mut registry, [a, ..]) = fixture();
        let result = registry.find_any::<(A, Unused)>();
        registry.add_component::<Unused>(a).unwrap();
        assert!(result.is_stale(&registry));
    }
}
