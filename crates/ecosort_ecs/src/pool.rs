//! Per-type component storage.
//!
//! A [`ComponentPool`] maps entities to component values of one type. Values
//! live in a packed dense array (cache-friendly iteration over "all T") and
//! are located through a sparse index keyed by entity slot, so lookup by
//! entity stays O(1).
//!
//! The dense array may reallocate on insert and shifts on removal. Borrows
//! into the pool therefore never outlive the next mutation; long-lived
//! handles go through [`ComponentRef`](crate::ComponentRef) instead.

use std::any::Any;

use crate::component::Component;
use crate::entity::Entity;
use crate::error::{EcsError, Result};

const EMPTY: u32 = u32::MAX;

/// Type-erased view of a pool, used by the registry to manage pools of every
/// component type uniformly.
pub trait ErasedPool: Any {
    /// Drops the component stored for `entity`, if any. Returns `true` if one
    /// was removed.
    fn remove_entity(&mut self, entity: Entity) -> bool;

    /// Returns `true` if the pool holds a component for `entity`.
    fn contains_entity(&self, entity: Entity) -> bool;

    /// Number of components stored.
    fn len(&self) -> usize;

    /// Returns `true` if the pool stores no components.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Structural mutation counter, see [`ComponentPool::epoch`].
    fn epoch(&self) -> u64;

    /// Entities with a component in this pool, in dense (insertion) order.
    fn entities(&self) -> &[Entity];

    /// Name of the stored component type.
    fn component_name(&self) -> &'static str;

    /// Upcast for typed downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Upcast for typed downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Dense storage for components of type `T`.
pub struct ComponentPool<T> {
    /// Entity slot index → position in `dense`, or `EMPTY`.
    sparse: Vec<u32>,
    /// Owning entity of each value, parallel to `data`.
    dense: Vec<Entity>,
    data: Vec<T>,
    epoch: u64,
}

impl<T: Component> ComponentPool<T> {
    /// Create a new, empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sparse: Vec::new(),
            dense: Vec::new(),
            data: Vec::new(),
            epoch: 0,
        }
    }

    /// Returns the dense position of `entity`'s component, checking the
    /// generation so a recycled slot never matches a stale ID.
    fn position(&self, entity: Entity) -> Option<usize> {
        let dense_idx = *self.sparse.get(entity.index() as usize)?;
        if dense_idx == EMPTY {
            return None;
        }
        let dense_idx = dense_idx as usize;
        (self.dense[dense_idx] == entity).then_some(dense_idx)
    }

    /// Registers a component for `entity` and returns a borrow of it.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::DuplicateComponent`] if `entity` already has a `T`.
    pub fn add(&mut self, entity: Entity, value: T) -> Result<&mut T> {
        if self.contains(entity) {
            return Err(EcsError::DuplicateComponent {
                entity,
                component: T::type_name(),
            });
        }
        let dense_idx = self.insert_new(entity, value);
        Ok(&mut self.data[dense_idx])
    }

    fn insert_new(&mut self, entity: Entity, value: T) -> usize {
        let slot = entity.index() as usize;
        if slot >= self.sparse.len() {
            self.sparse.resize(slot + 1, EMPTY);
        }
        // A leftover entry for an older generation of this slot is replaced.
        if self.sparse[slot] != EMPTY {
            let stale = self.dense[self.sparse[slot] as usize];
            self.remove(stale);
        }

        let dense_idx = self.dense.len();
        self.sparse[slot] = dense_idx as u32;
        self.dense.push(entity);
        self.data.push(value);
        self.epoch += 1;
        dense_idx
    }

    /// Overwrites `entity`'s component, inserting it if absent.
    ///
    /// Returns `true` if the value was newly inserted.
    pub fn set(&mut self, entity: Entity, value: T) -> bool {
        match self.position(entity) {
            Some(dense_idx) => {
                self.data[dense_idx] = value;
                false
            }
            None => {
                self.insert_new(entity, value);
                true
            }
        }
    }

    /// Returns `entity`'s component, if present.
    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.position(entity).map(|dense_idx| &self.data[dense_idx])
    }

    /// Returns `entity`'s component mutably, if present.
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.position(entity).map(|dense_idx| &mut self.data[dense_idx])
    }

    /// Returns `true` if `entity` has a component in this pool.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.position(entity).is_some()
    }

    /// Removes and returns `entity`'s component.
    ///
    /// The remaining components keep their relative order.
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let dense_idx = self.position(entity)?;
        self.sparse[entity.index() as usize] = EMPTY;
        self.dense.remove(dense_idx);
        let value = self.data.remove(dense_idx);
        for moved in &self.dense[dense_idx..] {
            self.sparse[moved.index() as usize] -= 1;
        }
        self.epoch += 1;
        Some(value)
    }

    /// Number of components stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Returns `true` if the pool stores no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Structural mutation counter.
    ///
    /// Bumped by every insertion and removal, never by value updates through
    /// [`get_mut`](Self::get_mut) or [`set`](Self::set) on an existing entry.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Entities with a component in this pool, in insertion order.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.dense
    }

    /// Iterates over `(entity, component)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.dense.iter().copied().zip(self.data.iter())
    }

    /// Iterates mutably over `(entity, component)` pairs in insertion order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.dense.iter().copied().zip(self.data.iter_mut())
    }

    /// Current dense slot of `entity`'s component, for slot-identity checks.
    pub(crate) fn slot(&self, entity: Entity) -> Option<usize> {
        self.position(entity)
    }
}

impl<T: Component> Default for ComponentPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component + std::fmt::Debug> std::fmt::Debug for ComponentPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<T: Component> ErasedPool for ComponentPool<T> {
    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.remove(entity).is_some()
    }

    fn contains_entity(&self, entity: Entity) -> bool {
        self.contains(entity)
    }

    fn len(&self) -> usize {
        self.dense.len()
    }

    fn epoch(&self) -> u64 {
        self.epoch
    }

    fn entities(&self) -> &[Entity] {
        &self.dense
    }

    fn component_name(&self) -> &'static str {
        T::type_name()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
