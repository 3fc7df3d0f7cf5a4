//! Declared-type descriptions consumed by the conversion drivers.
//!
//! Descriptors in this module are plain data produced once — by the
//! application or by generated tooling — and treated as immutable for the
//! process lifetime. [`TypeNode`] describes a declared type (possibly a
//! generic container), [`PropertyInfo`] describes one property of an
//! identifiable type, and [`NamedValues`] carries construction-time property
//! values into a type's construct function.

// -----------------------------------------------------------------------------
// Modules

mod named_values;
mod property_info;
mod type_node;

// -----------------------------------------------------------------------------
// Exports

pub use named_values::NamedValues;
pub use property_info::{Getter, PropertyInfo, Setter};
pub use type_node::{NodeKind, TypeNode};
