use strata_utils::hash::HashMap;

use crate::error::ReadError;
use crate::persist::{Persist, take_value};

// -----------------------------------------------------------------------------
// NamedValues

/// Decoded construction-time property values, keyed by property name.
///
/// The deserializer accumulates the values of init-flagged properties here
/// and passes the collection to the owning type's construct function, which
/// pulls each value out by name. This is the first half of two-phase
/// construction: an init-time property cannot be set once the value exists,
/// so everything it needs must be gathered up front.
#[derive(Default, Debug)]
pub struct NamedValues {
    values: HashMap<&'static str, Box<dyn Persist>>,
}

impl NamedValues {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self {
            values: HashMap::default(),
        }
    }

    /// Inserts a decoded value under the given property name, returning the
    /// previous value if one was present.
    pub fn insert(
        &mut self,
        name: &'static str,
        value: Box<dyn Persist>,
    ) -> Option<Box<dyn Persist>> {
        self.values.insert(name, value)
    }

    /// Returns `true` if a value is present for the given property name.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Returns the number of values present.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no values are present.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Removes and returns the value for a required property.
    ///
    /// Fails with [`ReadError::MalformedDocument`] when the property is
    /// absent or decoded to a different type. A type mismatch leaves the
    /// value in place.
    pub fn take<T: Persist>(&mut self, name: &'static str) -> Result<T, ReadError> {
        let value = self.values.remove(name).ok_or_else(|| {
            ReadError::malformed(format!("missing required property `{name}`"))
        })?;
        match take_value::<T>(value) {
            Ok(value) => Ok(value),
            Err(value) => {
                let detail = format!(
                    "property `{name}` decoded to `{}` where `{}` was required",
                    (*value).type_name(),
                    core::any::type_name::<T>(),
                );
                self.values.insert(name, value);
                Err(ReadError::malformed(detail))
            }
        }
    }

    /// Removes and returns the value for an optional property, or `None`
    /// when it is absent.
    pub fn take_opt<T: Persist>(&mut self, name: &'static str) -> Result<Option<T>, ReadError> {
        if !self.values.contains_key(name) {
            return Ok(None);
        }
        self.take(name).map(Some)
    }
}
