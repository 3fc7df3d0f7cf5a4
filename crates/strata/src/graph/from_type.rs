use crate::persist::Persist;

/// Trait used to generate a [`TypeTrait`] entry from a concrete type.
///
/// Capability entries are function tables; `FromType<T>` is where the
/// functions are monomorphized for `T` before the entry is type-erased into
/// the descriptor's table.
///
/// # Examples
///
/// ```
/// use strata::Blackboard;
/// use strata::graph::{FromType, TypeTraitCustom};
///
/// let entry: TypeTraitCustom = FromType::<Blackboard>::from_type();
/// # let _ = entry;
/// ```
///
/// [`TypeTrait`]: crate::graph::TypeTrait
pub trait FromType<T: Persist> {
    /// Builds the capability entry for `T`.
    fn from_type() -> Self;
}
