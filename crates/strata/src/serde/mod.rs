//! Document conversion: the discriminator-driven engine that writes typed
//! values into self-describing JSON nodes and reads them back.
//!
//! # Overview
//!
//! - [`SerializeDriver`]: writes one typed node — discriminator, version,
//!   persisted properties — recursing through containers and substituting
//!   each value's registered runtime type for its declared type.
//! - [`DeserializeDriver`]: the mirror. The embedded discriminator selects
//!   the descriptor; absent collections reconcile against declared
//!   defaults; the constructed value walks its upgrade chain and passes
//!   through the custom hook before it is returned.
//! - [`ScalarCodec`] with [`add_converter`]/[`remove_converter`]: leaf
//!   conversion, built-in for the primitive types, extensible for
//!   application types outside the descriptor system.
//!
//! The free functions at the module root ([`to_value`], [`from_value`],
//! [`to_string_pretty`], [`from_str`], …) cover the common one-shot cases.

// -----------------------------------------------------------------------------
// Modules

mod converters;
mod de;
mod ser;

// -----------------------------------------------------------------------------
// Exports

pub use converters::{ScalarCodec, add_converter, remove_converter};
pub use de::DeserializeDriver;
pub use ser::SerializeDriver;

use serde_json::Value;

use crate::blackboard::Blackboard;
use crate::error::{ReadError, WriteError};
use crate::graph::TypeGraph;
use crate::persist::Persist;

// -----------------------------------------------------------------------------
// Document fields

/// Type discriminator field embedded in every serialized object node.
/// Selects the concrete descriptor on read, which is what makes
/// interface-typed fields round-trip to their runtime type.
pub const TYPE_FIELD: &str = "$type";

/// Version field embedded in every serialized object node. Distinguishes
/// successive persisted shapes of the same logical type id, which is what
/// makes models upgradeable.
pub const VERSION_FIELD: &str = "$v";

// -----------------------------------------------------------------------------
// Conveniences

/// Serializes an identifiable value to a document node.
pub fn to_value(graph: &TypeGraph, value: &dyn Persist) -> Result<Value, WriteError> {
    SerializeDriver::new(graph).write(value)
}

/// Serializes an identifiable value to pretty-printed document text.
pub fn to_string_pretty(graph: &TypeGraph, value: &dyn Persist) -> Result<String, WriteError> {
    serde_json::to_string_pretty(&to_value(graph, value)?).map_err(WriteError::Document)
}

/// Deserializes a document node into a value of type `T`.
pub fn from_value<T: Persist>(graph: &TypeGraph, node: &Value) -> Result<T, ReadError> {
    DeserializeDriver::new(graph).read_as(node)
}

/// Deserializes a document node into a value of type `T`, with `deps`
/// available to upgrade steps.
pub fn from_value_with<T: Persist>(
    graph: &TypeGraph,
    deps: &Blackboard,
    node: &Value,
) -> Result<T, ReadError> {
    DeserializeDriver::with_dependencies(graph, deps).read_as(node)
}

/// Deserializes document text into a value of type `T`.
pub fn from_str<T: Persist>(graph: &TypeGraph, document: &str) -> Result<T, ReadError> {
    let node = serde_json::from_str(document).map_err(ReadError::Document)?;
    from_value(graph, &node)
}

/// Deserializes document text into a value of type `T`, with `deps`
/// available to upgrade steps.
pub fn from_str_with<T: Persist>(
    graph: &TypeGraph,
    deps: &Blackboard,
    document: &str,
) -> Result<T, ReadError> {
    let node = serde_json::from_str(document).map_err(ReadError::Document)?;
    from_value_with(graph, deps, &node)
}
