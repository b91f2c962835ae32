//! Registry error types.

use crate::entity::Entity;

/// Usage errors reported by the registry.
///
/// These are programmer errors: the registry logs them and hands them back
/// so the caller can decide whether to continue. Not-found results (`None`,
/// an invalid [`ComponentRef`](crate::ComponentRef), an empty query) are never
/// errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    /// The entity does not exist (never created, or already destroyed).
    #[error("{0} does not exist")]
    EntityNotFound(Entity),

    /// The entity already has a component of this type.
    #[error("{entity} already has a {component} component")]
    DuplicateComponent {
        /// The entity the component was added to.
        entity: Entity,
        /// Name of the component type.
        component: &'static str,
    },

    /// The entity has no component of this type.
    #[error("{entity} has no {component} component")]
    ComponentNotFound {
        /// The entity that was looked up.
        entity: Entity,
        /// Name of the component type.
        component: &'static str,
    },

    /// A component reference was resolved against a registry that did not
    /// issue it.
    #[error("reference to {component} of {entity} belongs to another registry")]
    ForeignRegistry {
        /// The referenced entity.
        entity: Entity,
        /// Name of the component type.
        component: &'static str,
    },

    /// A query result was used after one of its pools changed structurally.
    #[error("query result is stale: the {component} pool changed since it was taken")]
    StaleQuery {
        /// Name of the component type whose pool changed.
        component: &'static str,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = EcsError> = std::result::Result<T, E>;
