//! Scenes: a named world of objects.
//!
//! A [`Scene`] owns exactly one [`Registry`]. Objects are registry entities;
//! everything about an object lives in its components.

use ecosort_ecs::{ComponentSet, Entity, EntityMut, QueryResult, Registry};
use tracing::debug;

use crate::components::Tag;

/// A named collection of objects backed by its own registry.
#[derive(Debug)]
pub struct Scene {
    name: String,
    registry: Registry,
}

impl Scene {
    /// Create an empty scene.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registry: Registry::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Create an object carrying a [`Tag`] with `name`. Further components
    /// are attached through the returned handle.
    pub fn create_object(&mut self, name: &str) -> EntityMut<'_> {
        let mut object = self.registry.spawn();
        object.with(Tag::new(name));
        debug!(scene = %self.name, entity = %object.id(), name, "created object");
        object
    }

    /// Destroy an object and all of its components.
    ///
    /// # Errors
    ///
    /// Fails if the object does not exist in this scene.
    pub fn remove_object(&mut self, entity: Entity) -> ecosort_ecs::Result<()> {
        self.registry.destroy_entity(entity)?;
        debug!(scene = %self.name, %entity, "removed object");
        Ok(())
    }

    /// Objects carrying every component in `Q`.
    #[must_use]
    pub fn find_all<Q: ComponentSet>(&self) -> QueryResult<Q> {
        self.registry.find_all::<Q>()
    }

    /// Look an object up by its tag name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<Entity> {
        self.registry
            .pool::<Tag>()?
            .iter()
            .find(|(_, tag)| tag.name == name)
            .map(|(entity, _)| entity)
    }

    #[must_use]
    pub fn object_count(&self) -> usize {
        self.registry.entity_count()
    }
}
