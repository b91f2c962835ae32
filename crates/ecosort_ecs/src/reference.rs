//! Revalidating component handles.
//!
//! Pools move their values around when they grow or when entries are removed,
//! so plain borrows cannot be kept from one frame to the next. A
//! [`ComponentRef`] stores only *which* component it names (the issuing
//! registry, the entity and the component type) and looks the value up again
//! on every access.

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

use crate::component::Component;
use crate::entity::Entity;
use crate::error::{EcsError, Result};
use crate::registry::Registry;

/// Process-unique identity of a [`Registry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistryId(u64);

impl RegistryId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A weak, revalidating handle to the `T` component of one entity.
///
/// Handles are issued by the [`Registry`] (and by queries); they never own the
/// component. Use [`valid`](Self::valid) before dereferencing when absence is
/// a normal outcome; dereferencing an invalid handle returns an error.
///
/// Handles deliberately do not implement `PartialEq`; use
/// [`same_slot`](Self::same_slot), which resolves both sides.
pub struct ComponentRef<T> {
    registry: RegistryId,
    entity: Entity,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Component> ComponentRef<T> {
    pub(crate) fn new(registry: RegistryId, entity: Entity) -> Self {
        Self {
            registry,
            entity,
            _marker: PhantomData,
        }
    }

    /// The entity this handle points at.
    #[must_use]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Returns `true` if `registry` issued this handle and the entity still
    /// exists with a `T` component.
    #[must_use]
    pub fn valid(&self, registry: &Registry) -> bool {
        registry.id() == self.registry && registry.has_component::<T>(self.entity)
    }

    fn check(&self, registry: &Registry) -> Result<()> {
        if registry.id() != self.registry {
            warn!(entity = %self.entity, component = T::type_name(), "dereferenced a reference from another registry");
            return Err(EcsError::ForeignRegistry {
                entity: self.entity,
                component: T::type_name(),
            });
        }
        if !registry.entity_exists(self.entity) {
            warn!(entity = %self.entity, component = T::type_name(), "dereferenced a reference to a destroyed entity");
            return Err(EcsError::EntityNotFound(self.entity));
        }
        Ok(())
    }

    fn missing(&self) -> EcsError {
        warn!(entity = %self.entity, component = T::type_name(), "dereferenced a reference to a removed component");
        EcsError::ComponentNotFound {
            entity: self.entity,
            component: T::type_name(),
        }
    }

    /// Resolves the handle to the current value.
    ///
    /// # Errors
    ///
    /// [`EcsError::ForeignRegistry`], [`EcsError::EntityNotFound`] or
    /// [`EcsError::ComponentNotFound`] when the handle is not
    /// [`valid`](Self::valid) for `registry`.
    pub fn get<'r>(&self, registry: &'r Registry) -> Result<&'r T> {
        self.check(registry)?;
        registry
            .component::<T>(self.entity)
            .ok_or_else(|| self.missing())
    }

    /// Resolves the handle to the current value, mutably.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub fn get_mut<'r>(&self, registry: &'r mut Registry) -> Result<&'r mut T> {
        self.check(registry)?;
        match registry.component_mut::<T>(self.entity) {
            Some(value) => Ok(value),
            None => Err(self.missing()),
        }
    }

    /// Returns `true` if both handles currently resolve to the same storage
    /// slot in `registry`. Invalid handles never compare equal.
    #[must_use]
    pub fn same_slot(&self, other: &Self, registry: &Registry) -> bool {
        if !self.valid(registry) || !other.valid(registry) {
            return false;
        }
        let Some(pool) = registry.pool::<T>() else {
            return false;
        };
        match (pool.slot(self.entity), pool.slot(other.entity)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl<T> Clone for ComponentRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ComponentRef<T> {}

impl<T: Component> fmt::Debug for ComponentRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRef")
            .field("component", &T::type_name())
            .field("entity", &self.entity)
            .field("registry", &self.registry)
            .finish()
    }
}
