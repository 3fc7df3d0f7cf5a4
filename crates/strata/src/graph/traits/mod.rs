// -----------------------------------------------------------------------------
// Modules

mod custom;
mod outdated;

// -----------------------------------------------------------------------------
// Exports

pub use custom::{CustomSerializable, TypeTraitCustom};
pub use outdated::{Outdated, TypeTraitOutdated};

// -----------------------------------------------------------------------------
// TypeTrait

use core::any::Any;

/// A type-erased capability entry stored in a descriptor's trait table.
///
/// Entries are looked up by their own type through
/// [`TypeMeta::get_trait`](crate::graph::TypeMeta::get_trait), which is how
/// the conversion drivers discover optional behavior — upgrading, custom
/// hooks — without vtable dispatch on the value itself.
pub trait TypeTrait: Any + Send + Sync {
    /// Casts this entry to [`&dyn Any`](Any) for downcasting.
    fn as_any(&self) -> &dyn Any;
}
