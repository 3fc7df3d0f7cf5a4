use core::any::Any;

use serde_json::{Map, Value};

use crate::error::{ReadError, WriteError};
use crate::graph::{FromType, TypeTrait};
use crate::persist::Persist;
use crate::serde::{DeserializeDriver, SerializeDriver};

// -----------------------------------------------------------------------------
// CustomSerializable

/// The custom-serialization capability: a type's ability to inspect and
/// mutate its own serialized node, bypassing declarative property mapping.
///
/// `on_serialized` runs after the declared properties have been written and
/// may mutate or augment the node in place — derived fields, computed
/// fields, anything the property list cannot express. `on_deserialized`
/// runs after construction and the upgrade chain, receives the original
/// node, and may return a different value entirely (full replacement, not
/// just mutation).
pub trait CustomSerializable: Persist + Sized {
    /// Hook invoked with the constructed node before it is emitted.
    fn on_serialized(
        &self,
        driver: &SerializeDriver<'_>,
        node: &mut Map<String, Value>,
    ) -> Result<(), WriteError>;

    /// Hook invoked with the original node after deserialization; the
    /// returned value replaces `self`.
    fn on_deserialized(
        self,
        driver: &DeserializeDriver<'_>,
        node: &Map<String, Value>,
    ) -> Result<Box<dyn Persist>, ReadError>;
}

// -----------------------------------------------------------------------------
// TypeTraitCustom

/// Capability entry exposing [`CustomSerializable`] to the conversion
/// drivers. Registered on a descriptor via
/// [`FromType`](crate::graph::FromType).
pub struct TypeTraitCustom {
    on_serialized:
        fn(&dyn Persist, &SerializeDriver<'_>, &mut Map<String, Value>) -> Result<(), WriteError>,
    on_deserialized: fn(
        Box<dyn Persist>,
        &DeserializeDriver<'_>,
        &Map<String, Value>,
    ) -> Result<Box<dyn Persist>, ReadError>,
}

impl TypeTraitCustom {
    /// Invokes the type's `on_serialized` hook.
    ///
    /// # Panics
    ///
    /// Panics if `value` is not of the type this entry was registered for;
    /// that indicates a corrupted registration.
    #[inline]
    pub fn on_serialized(
        &self,
        value: &dyn Persist,
        driver: &SerializeDriver<'_>,
        node: &mut Map<String, Value>,
    ) -> Result<(), WriteError> {
        (self.on_serialized)(value, driver, node)
    }

    /// Invokes the type's `on_deserialized` hook.
    ///
    /// # Panics
    ///
    /// Panics if `value` is not of the type this entry was registered for;
    /// that indicates a corrupted registration.
    #[inline]
    pub fn on_deserialized(
        &self,
        value: Box<dyn Persist>,
        driver: &DeserializeDriver<'_>,
        node: &Map<String, Value>,
    ) -> Result<Box<dyn Persist>, ReadError> {
        (self.on_deserialized)(value, driver, node)
    }
}

impl<T: CustomSerializable> FromType<T> for TypeTraitCustom {
    fn from_type() -> Self {
        Self {
            on_serialized: |value, driver, node| {
                let value = value.downcast_ref::<T>().unwrap_or_else(|| {
                    panic!(
                        "`TypeTraitCustom` registered for `{}` received a value of type `{}`",
                        core::any::type_name::<T>(),
                        value.type_name(),
                    )
                });
                value.on_serialized(driver, node)
            },
            on_deserialized: |value, driver, node| match value.take::<T>() {
                Ok(value) => value.on_deserialized(driver, node),
                Err(value) => panic!(
                    "`TypeTraitCustom` registered for `{}` received a value of type `{}`",
                    core::any::type_name::<T>(),
                    (*value).type_name(),
                ),
            },
        }
    }
}

impl TypeTrait for TypeTraitCustom {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }
}
