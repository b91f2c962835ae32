//! Core [`Component`] trait and component type identity.
//!
//! Every piece of data stored in a registry must implement [`Component`]. A
//! component type is identified at runtime by its [`ComponentTypeId`], which
//! keys the registry's map of type-erased pools.

use std::any::TypeId;

/// A unique identifier for a component type.
///
/// Backed by the Rust [`TypeId`], so two distinct types never share an ID even
/// when their [`Component::type_name`] strings collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentTypeId(TypeId);

impl ComponentTypeId {
    /// Returns the [`ComponentTypeId`] for component type `T`.
    #[must_use]
    pub fn of<T: Component>() -> Self {
        Self(TypeId::of::<T>())
    }
}

/// Static description of a component type, used in logs and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentInfo {
    /// The unique type identifier.
    pub type_id: ComponentTypeId,
    /// The human-readable name of the component (e.g. `"Transform"`).
    pub name: &'static str,
}

/// The core component trait.
///
/// Components are plain data records. Any `'static` type can be a component;
/// the trait only asks for a stable, human-readable name used when reporting
/// usage errors.
///
/// # Examples
///
/// ```rust
/// use ecosort_ecs::Component;
///
/// #[derive(Debug, Default)]
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Component for Health {
///     fn type_name() -> &'static str { "Health" }
/// }
/// ```
pub trait Component: 'static {
    /// A human-readable name for this component type.
    fn type_name() -> &'static str;

    /// Returns the [`ComponentTypeId`] for this component.
    fn component_type_id() -> ComponentTypeId
    where
        Self: Sized,
    {
        ComponentTypeId::of::<Self>()
    }

    /// Returns the [`ComponentInfo`] descriptor for this component type.
    fn info() -> ComponentInfo
    where
        Self: Sized,
    {
        ComponentInfo {
            type_id: Self::component_type_id(),
            name: Self::type_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Health {
        _current: f32,
    }

    impl Component for Health {
        fn type_name() -> &'static str {
            "Health"
        }
    }

    mod other {
        use crate::Component;

        pub struct Health;

        impl Component for Health {
            fn type_name() -> &'static str {
                "Health"
            }
        }
    }

    #[test]
    fn test_component_type_id_is_stable() {
        assert_eq!(Health::component_type_id(), Health::component_type_id());
        assert_eq!(Health::component_type_id(), ComponentTypeId::of::<Health>());
    }

    #[test]
    fn test_same_name_different_type_differs() {
        assert_ne!(
            Health::component_type_id(),
            other::Health::component_type_id()
        );
    }

    #[test]
    fn test_component_info() {
        let info = Health::info();
        assert_eq!(info.name, "Health");
        assert_eq!(info.type_id, ComponentTypeId::of::<Health>());
    }
}
