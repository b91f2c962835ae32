//! # ecosort_ecs
//!
//! The entity-component registry behind every EcoSort scene.
//!
//! This crate provides:
//!
//! - [`Entity`]: generational entity identifiers, issued by [`EntityAllocator`].
//! - [`Component`] trait: the contract all component data satisfies.
//! - [`ComponentPool`]: dense per-type storage behind the [`ErasedPool`] trait.
//! - [`ComponentRef`]: a revalidating handle that survives pool reallocation.
//! - [`Registry`]: the per-scene facade over entities and pools.
//! - [`QueryResult`]: `find_all` / `find_any` / `find_match` query snapshots.
//!
//! The registry is single-threaded and calls nothing outward; rendering,
//! physics and gameplay code consume it.

pub mod component;
pub mod entity;
pub mod error;
pub mod pool;
pub mod query;
pub mod reference;
pub mod registry;

pub use component::{Component, ComponentInfo, ComponentTypeId};
pub use entity::{Entity, EntityAllocator};
pub use error::{EcsError, Result};
pub use pool::{ComponentPool, ErasedPool};
pub use query::{ComponentSet, QueryMode, QueryResult};
pub use reference::{ComponentRef, RegistryId};
pub use registry::{EntityMut, Registry};
