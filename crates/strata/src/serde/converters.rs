use core::any::TypeId;
use std::sync::{LazyLock, PoisonError, RwLock};

use serde_core::Serialize;
use serde_core::de::DeserializeOwned;
use serde_json::Value;
use strata_utils::TypeIdMap;

use crate::error::{ReadError, WriteError};
use crate::persist::Persist;

// -----------------------------------------------------------------------------
// ScalarCodec

/// Converts one leaf type to and from document nodes.
///
/// Built-in codecs cover the primitive types the document model supports
/// out of the box; [`ScalarCodec::of`] derives one for any type with serde
/// implementations, and [`ScalarCodec::new`] accepts hand-written
/// conversion functions for everything else.
#[derive(Clone, Copy)]
pub struct ScalarCodec {
    write: fn(&dyn Persist) -> Result<Value, WriteError>,
    read: fn(&Value) -> Result<Box<dyn Persist>, ReadError>,
}

impl ScalarCodec {
    /// A codec from hand-written conversion functions.
    pub fn new(
        write: fn(&dyn Persist) -> Result<Value, WriteError>,
        read: fn(&Value) -> Result<Box<dyn Persist>, ReadError>,
    ) -> Self {
        Self { write, read }
    }

    /// A codec derived from the type's serde implementations.
    pub fn of<T: Persist + Serialize + DeserializeOwned>() -> Self {
        Self {
            write: |value| {
                let value = value
                    .downcast_ref::<T>()
                    .ok_or_else(|| WriteError::not_serializable(value.type_name()))?;
                serde_json::to_value(value).map_err(WriteError::Document)
            },
            read: |node| {
                let value: T = serde_json::from_value(node.clone()).map_err(ReadError::Document)?;
                Ok(Box::new(value))
            },
        }
    }

    /// Writes a value through this codec.
    #[inline]
    pub fn write(&self, value: &dyn Persist) -> Result<Value, WriteError> {
        (self.write)(value)
    }

    /// Reads a value back through this codec.
    #[inline]
    pub fn read(&self, node: &Value) -> Result<Box<dyn Persist>, ReadError> {
        (self.read)(node)
    }
}

// -----------------------------------------------------------------------------
// Registries

// Codecs for the leaf types the document model supports on every platform.
static BUILT_IN: LazyLock<TypeIdMap<ScalarCodec>> = LazyLock::new(|| {
    fn add<T: Persist + Serialize + DeserializeOwned>(table: &mut TypeIdMap<ScalarCodec>) {
        table.insert(TypeId::of::<T>(), ScalarCodec::of::<T>());
    }

    let mut table = TypeIdMap::new();
    add::<()>(&mut table);
    add::<bool>(&mut table);
    add::<char>(&mut table);
    add::<u8>(&mut table);
    add::<u16>(&mut table);
    add::<u32>(&mut table);
    add::<u64>(&mut table);
    add::<u128>(&mut table);
    add::<usize>(&mut table);
    add::<i8>(&mut table);
    add::<i16>(&mut table);
    add::<i32>(&mut table);
    add::<i64>(&mut table);
    add::<i128>(&mut table);
    add::<isize>(&mut table);
    add::<f32>(&mut table);
    add::<f64>(&mut table);
    add::<String>(&mut table);
    // Raw document trees pass through untouched.
    add::<Value>(&mut table);
    table
});

// Application-registered codecs for types outside the built-in set.
// Process-wide and read-mostly; consulted before the built-ins so an
// application can override a default.
static CUSTOM: LazyLock<RwLock<TypeIdMap<ScalarCodec>>> =
    LazyLock::new(|| RwLock::new(TypeIdMap::new()));

/// Registers a codec for `T`, replacing any previous registration.
///
/// # Examples
///
/// ```
/// use serde_json::Value;
/// use strata::serde::{ScalarCodec, add_converter};
///
/// #[derive(Debug, PartialEq)]
/// struct Flag(bool);
///
/// add_converter::<Flag>(ScalarCodec::new(
///     |value| {
///         let flag = value.downcast_ref::<Flag>().unwrap();
///         Ok(Value::from(if flag.0 { "on" } else { "off" }))
///     },
///     |node| {
///         Ok(Box::new(Flag(node.as_str() == Some("on"))))
///     },
/// ));
/// ```
pub fn add_converter<T: Persist>(codec: ScalarCodec) {
    CUSTOM
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(TypeId::of::<T>(), codec);
}

/// Removes the codec registered for `T`, if any.
///
/// Intended for tests that must not leak registrations into each other;
/// production registries are append-only.
pub fn remove_converter<T: Persist>() {
    CUSTOM
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(&TypeId::of::<T>());
}

/// The codec for the given type, custom registrations first.
pub(crate) fn converter_for(type_id: &TypeId) -> Option<ScalarCodec> {
    let custom = CUSTOM
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(type_id)
        .copied();
    custom.or_else(|| BUILT_IN.get(type_id).copied())
}

#[cfg(test)]
mod tests {
    use super::{ScalarCodec, add_converter, converter_for, remove_converter};
    use core::any::TypeId;
    use serde_json::{Value, json};

    #[test]
    fn built_ins_round_trip() {
        let codec = converter_for(&TypeId::of::<i64>()).unwrap();
        let node = codec.write(&41_i64).unwrap();
        assert_eq!(node, json!(41));
        let value = codec.read(&node).unwrap();
        assert_eq!(value.downcast_ref::<i64>(), Some(&41));
    }

    #[test]
    fn built_in_read_rejects_wrong_shapes() {
        let codec = converter_for(&TypeId::of::<String>()).unwrap();
        assert!(codec.read(&json!(3)).is_err());
    }

    #[test]
    fn custom_converters_can_be_added_and_removed() {
        #[derive(Debug, PartialEq)]
        struct Temperature(i64);

        assert!(converter_for(&TypeId::of::<Temperature>()).is_none());

        add_converter::<Temperature>(ScalarCodec::new(
            |value| {
                let value = value.downcast_ref::<Temperature>().unwrap();
                Ok(Value::from(format!("{}C", value.0)))
            },
            |node| {
                let text = node.as_str().unwrap_or_default();
                let degrees = text.trim_end_matches('C').parse().unwrap_or_default();
                Ok(Box::new(Temperature(degrees)))
            },
        ));

        let codec = converter_for(&TypeId::of::<Temperature>()).unwrap();
        let node = codec.write(&Temperature(21)).unwrap();
        assert_eq!(node, json!("21C"));
        let value = codec.read(&node).unwrap();
        assert_eq!(value.downcast_ref::<Temperature>(), Some(&Temperature(21)));

        remove_converter::<Temperature>();
        assert!(converter_for(&TypeId::of::<Temperature>()).is_none());
    }
}
