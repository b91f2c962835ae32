//! The entity-component registry.
//!
//! A [`Registry`] owns the entity allocator and one type-erased
//! [`ComponentPool`] per component type for a single scene. It is the only
//! way to create and destroy entities and to attach, read, overwrite and
//! detach their components. Registries are fully independent of each other.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, trace, warn};

use crate::component::{Component, ComponentTypeId};
use crate::entity::{Entity, EntityAllocator};
use crate::error::{EcsError, Result};
use crate::pool::{ComponentPool, ErasedPool};
use crate::reference::{ComponentRef, RegistryId};

/// Owner of all entities and component storage for one scene.
pub struct Registry {
    id: RegistryId,
    allocator: EntityAllocator,
    pools: HashMap<ComponentTypeId, Box<dyn ErasedPool>>,
}

impl Registry {
    /// Create a new, empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: RegistryId::next(),
            allocator: EntityAllocator::new(),
            pools: HashMap::new(),
        }
    }

    /// Returns this registry's process-unique identity.
    #[must_use]
    pub fn id(&self) -> RegistryId {
        self.id
    }

    // -- Entity lifecycle --

    /// Create a new entity with no components.
    pub fn create_entity(&mut self) -> Entity {
        let entity = self.allocator.allocate();
        trace!(%entity, "created entity");
        entity
    }

    /// Create a new entity and return a handle for attaching its components.
    pub fn spawn(&mut self) -> EntityMut<'_> {
        let entity = self.create_entity();
        EntityMut {
            registry: self,
            entity,
        }
    }

    /// Returns a handle to an existing entity, or `None` if it does not exist.
    pub fn entity_mut(&mut self, entity: Entity) -> Option<EntityMut<'_>> {
        self.entity_exists(entity).then_some(EntityMut {
            registry: self,
            entity,
        })
    }

    /// Destroy an entity and every component attached to it.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if the entity was already
    /// destroyed or never existed.
    pub fn destroy_entity(&mut self, entity: Entity) -> Result<()> {
        if !self.allocator.free(entity) {
            warn!(%entity, "destroy of an entity that does not exist");
            return Err(EcsError::EntityNotFound(entity));
        }
        let mut purged = 0usize;
        for pool in self.pools.values_mut() {
            if pool.remove_entity(entity) {
                purged += 1;
            }
        }
        trace!(%entity, purged, "destroyed entity");
        Ok(())
    }

    /// Returns `true` if the entity currently exists.
    #[must_use]
    pub fn entity_exists(&self, entity: Entity) -> bool {
        self.allocator.is_alive(entity)
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.allocator.alive_count()
    }

    /// Iterates over every live entity in slot order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.allocator.iter_alive()
    }

    /// Destroy every entity in the registry.
    pub fn clear(&mut self) {
        let entities: Vec<Entity> = self.entities().collect();
        for entity in entities {
            // Every collected entity is alive, so this cannot fail.
            let _ = self.destroy_entity(entity);
        }
    }

    // -- Component operations --

    fn ensure_alive(&self, entity: Entity, component: &'static str) -> Result<()> {
        if self.entity_exists(entity) {
            Ok(())
        } else {
            warn!(%entity, component, "component operation on an entity that does not exist");
            Err(EcsError::EntityNotFound(entity))
        }
    }

    /// Attach a default-constructed `T` to `entity`.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityNotFound`] for a dead entity,
    /// [`EcsError::DuplicateComponent`] if it already has a `T`.
    pub fn add_component<T: Component + Default>(
        &mut self,
        entity: Entity,
    ) -> Result<ComponentRef<T>> {
        self.add_component_with(entity, T::default())
    }

    /// Attach `value` to `entity`.
    ///
    /// # Errors
    ///
    /// Same as [`add_component`](Self::add_component).
    pub fn add_component_with<T: Component>(
        &mut self,
        entity: Entity,
        value: T,
    ) -> Result<ComponentRef<T>> {
        self.ensure_alive(entity, T::type_name())?;
        if let Err(err) = self.pool_or_insert::<T>().add(entity, value) {
            warn!(%entity, component = T::type_name(), "duplicate component");
            return Err(err);
        }
        Ok(ComponentRef::new(self.id, entity))
    }

    /// Returns a handle to `entity`'s `T` component.
    ///
    /// This never fails: when the entity or component is absent the handle is
    /// simply not [`valid`](ComponentRef::valid). Check it before use.
    #[must_use]
    pub fn get_component<T: Component>(&self, entity: Entity) -> ComponentRef<T> {
        ComponentRef::new(self.id, entity)
    }

    /// Borrow `entity`'s `T` component, if present.
    #[must_use]
    pub fn component<T: Component>(&self, entity: Entity) -> Option<&T> {
        if !self.entity_exists(entity) {
            return None;
        }
        self.pool::<T>()?.get(entity)
    }

    /// Mutably borrow `entity`'s `T` component, if present.
    pub fn component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.entity_exists(entity) {
            return None;
        }
        self.pool_mut::<T>()?.get_mut(entity)
    }

    /// Detach and return `entity`'s `T` component.
    ///
    /// Removing a component that is not there is a no-op returning `None`.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        let removed = self.pool_mut::<T>().and_then(|pool| pool.remove(entity));
        if removed.is_none() {
            debug!(%entity, component = T::type_name(), "remove of an absent component");
        }
        removed
    }

    /// Returns `true` if `entity` exists and has a `T` component.
    #[must_use]
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.entity_exists(entity) && self.pool::<T>().is_some_and(|pool| pool.contains(entity))
    }

    /// Overwrite `entity`'s `T` component, attaching it if absent.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityNotFound`] for a dead entity.
    pub fn set_component<T: Component>(
        &mut self,
        entity: Entity,
        value: T,
    ) -> Result<ComponentRef<T>> {
        self.ensure_alive(entity, T::type_name())?;
        self.pool_or_insert::<T>().set(entity, value);
        Ok(ComponentRef::new(self.id, entity))
    }

    /// Returns the set of component types attached to `entity`.
    #[must_use]
    pub fn component_types(&self, entity: Entity) -> BTreeSet<ComponentTypeId> {
        if !self.entity_exists(entity) {
            return BTreeSet::new();
        }
        self.pools
            .iter()
            .filter(|(_, pool)| pool.contains_entity(entity))
            .map(|(&type_id, _)| type_id)
            .collect()
    }

    // -- Pools --

    /// Returns the pool for `T`, if any `T` was ever attached.
    #[must_use]
    pub fn pool<T: Component>(&self) -> Option<&ComponentPool<T>> {
        self.pools
            .get(&ComponentTypeId::of::<T>())
            .and_then(|pool| pool.as_any().downcast_ref::<ComponentPool<T>>())
    }

    /// Iterate every `T` mutably, in insertion order. Values may be changed
    /// in place; attaching or removing components needs the registry itself.
    pub fn components_mut<T: Component>(&mut self) -> impl Iterator<Item = (Entity, &mut T)> + '_ {
        self.pool_mut::<T>()
            .into_iter()
            .flat_map(|pool| pool.iter_mut())
    }

    fn pool_mut<T: Component>(&mut self) -> Option<&mut ComponentPool<T>> {
        self.pools
            .get_mut(&ComponentTypeId::of::<T>())
            .and_then(|pool| pool.as_any_mut().downcast_mut::<ComponentPool<T>>())
    }

    fn pool_or_insert<T: Component>(&mut self) -> &mut ComponentPool<T> {
        self.pools
            .entry(ComponentTypeId::of::<T>())
            .or_insert_with(|| {
                debug!(component = T::type_name(), "created component pool");
                Box::new(ComponentPool::<T>::new())
            })
            .as_any_mut()
            .downcast_mut::<ComponentPool<T>>()
            .expect("pool keyed by its own type id")
    }

    /// Type-erased pool lookup.
    pub(crate) fn erased_pool(&self, type_id: ComponentTypeId) -> Option<&dyn ErasedPool> {
        self.pools.get(&type_id).map(|pool| &**pool)
    }

    /// Number of component pools (distinct component types ever attached).
    #[must_use]
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pools: Vec<(&'static str, usize)> = self
            .pools
            .values()
            .map(|pool| (pool.component_name(), pool.len()))
            .collect();
        f.debug_struct("Registry")
            .field("id", &self.id)
            .field("entities", &self.entity_count())
            .field("pools", &pools)
            .finish()
    }
}

/// A live entity together with its registry.
///
/// Returned by [`Registry::spawn`] and [`Registry::entity_mut`]; saves
/// threading the entity ID through every component call during setup.
pub struct EntityMut<'r> {
    registry: &'r mut Registry,
    entity: Entity,
}

impl EntityMut<'_> {
    /// The wrapped entity.
    #[must_use]
    pub fn id(&self) -> Entity {
        self.entity
    }

    /// See [`Registry::add_component`].
    ///
    /// # Errors
    ///
    /// [`EcsError::DuplicateComponent`] if the entity already has a `T`.
    pub fn add<T: Component + Default>(&mut self) -> Result<ComponentRef<T>> {
        self.registry.add_component::<T>(self.entity)
    }

    /// Attach `value`, chaining. A duplicate is logged and left unchanged.
    pub fn with<T: Component>(&mut self, value: T) -> &mut Self {
        let _ = self.registry.add_component_with(self.entity, value);
        self
    }

    /// See [`Registry::get_component`].
    #[must_use]
    pub fn get<T: Component>(&self) -> ComponentRef<T> {
        self.registry.get_component::<T>(self.entity)
    }

    /// See [`Registry::component_mut`].
    pub fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.registry.component_mut::<T>(self.entity)
    }

    /// See [`Registry::remove_component`].
    pub fn remove<T: Component>(&mut self) -> Option<T> {
        self.registry.remove_component::<T>(self.entity)
    }

    /// See [`Registry::has_component`].
    #[must_use]
    pub fn has<T: Component>(&self) -> bool {
        self.registry.has_component::<T>(self.entity)
    }

    /// See [`Registry::set_component`].
    pub fn set<T: Component>(&mut self, value: T) -> ComponentRef<T> {
        // The wrapped entity is alive for the lifetime of the handle.
        let _ = self.registry.set_component(self.entity, value);
        self.registry.get_component::<T>(self.entity)
    }
}
