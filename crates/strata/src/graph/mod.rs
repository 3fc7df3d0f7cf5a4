//! The type graph: the registry of identifiable type descriptors the
//! conversion drivers resolve discriminators against.
//!
//! A [`TypeMeta`] describes one concrete identifiable type — its stable
//! string id, its version, its properties, its constructor, and a table of
//! optional capabilities ([`TypeTrait`] entries such as [`TypeTraitOutdated`]
//! and [`TypeTraitCustom`]). The [`TypeGraph`] stores descriptors and
//! indexes them by `TypeId`, by (id, version), and by id alone for
//! version-less peeking.
//!
//! Descriptors are produced once — by the application or by generated
//! tooling, via [`GetTypeMeta`] — and treated as immutable afterwards.

// -----------------------------------------------------------------------------
// Modules

mod from_type;
mod traits;
mod type_graph;
mod type_meta;

// -----------------------------------------------------------------------------
// Exports

pub use from_type::FromType;
pub use traits::{CustomSerializable, Outdated, TypeTrait, TypeTraitCustom, TypeTraitOutdated};
pub use type_graph::TypeGraph;
pub use type_meta::{ConstructFn, FactoryFn, GetTypeMeta, TypeMeta};

#[cfg(feature = "auto_register")]
pub use type_graph::AutoRegistration;
