use core::any::Any;

use crate::blackboard::Blackboard;
use crate::graph::{FromType, TypeTrait};
use crate::persist::Persist;

// -----------------------------------------------------------------------------
// Outdated

/// The self-upgrade capability of an outdated type version.
///
/// Each obsolete version of a type only knows how to step to the *next*
/// version; the deserializer walks the chain until the result no longer
/// reports itself outdated. Chains must be acyclic and strictly
/// version-increasing — the walk is unbounded and a cycle would never
/// terminate.
///
/// # Examples
///
/// ```
/// use strata::Blackboard;
/// use strata::graph::Outdated;
/// use strata::persist::Persist;
///
/// #[derive(Debug, PartialEq)]
/// struct SettingsV1 { volume: i64 }
///
/// #[derive(Debug, PartialEq)]
/// struct SettingsV2 { volume: f64 }
///
/// impl Outdated for SettingsV1 {
///     fn upgrade(self, _deps: &Blackboard) -> Box<dyn Persist> {
///         Box::new(SettingsV2 { volume: self.volume as f64 / 10.0 })
///     }
/// }
/// ```
pub trait Outdated: Persist + Sized {
    /// Produces the next-version equivalent of this value.
    ///
    /// `deps` is a read-only view of whatever dependency store the caller
    /// supplied to the deserializer; read it with
    /// [`Blackboard::peek`].
    fn upgrade(self, deps: &Blackboard) -> Box<dyn Persist>;
}

// -----------------------------------------------------------------------------
// TypeTraitOutdated

/// Capability entry exposing [`Outdated`] to the deserializer.
///
/// Registered on a descriptor via
/// [`FromType`](crate::graph::FromType):
///
/// ```
/// use strata::Blackboard;
/// use strata::graph::{FromType, TypeMeta, TypeTraitOutdated, Outdated};
/// use strata::persist::Persist;
///
/// # #[derive(Debug, PartialEq)]
/// # struct LegacyModel;
/// # #[derive(Debug, PartialEq)]
/// # struct Model;
/// # impl Outdated for LegacyModel {
/// #     fn upgrade(self, _deps: &Blackboard) -> Box<dyn Persist> { Box::new(Model) }
/// # }
/// let meta = TypeMeta::of::<LegacyModel>("model", 1)
///     .with_factory(|| Box::new(LegacyModel))
///     .with_trait::<TypeTraitOutdated>(FromType::<LegacyModel>::from_type());
/// ```
pub struct TypeTraitOutdated {
    func: fn(Box<dyn Persist>, &Blackboard) -> Box<dyn Persist>,
}

impl TypeTraitOutdated {
    /// Replaces `value` with its next-version equivalent.
    ///
    /// # Panics
    ///
    /// Panics if `value` is not of the type this entry was registered for;
    /// that indicates a corrupted registration.
    #[inline]
    pub fn upgrade(&self, value: Box<dyn Persist>, deps: &Blackboard) -> Box<dyn Persist> {
        (self.func)(value, deps)
    }
}

impl<T: Outdated> FromType<T> for TypeTraitOutdated {
    fn from_type() -> Self {
        Self {
            func: |value, deps| match value.take::<T>() {
                Ok(value) => value.upgrade(deps),
                Err(value) => panic!(
                    "`TypeTraitOutdated` registered for `{}` received a value of type `{}`",
                    core::any::type_name::<T>(),
                    (*value).type_name(),
                ),
            },
        }
    }
}

impl TypeTrait for TypeTraitOutdated {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }
}
