//! The saved-state container: a typed slot store that knows which of its
//! slots must be persisted.

use core::any::TypeId;
use std::borrow::Cow;
use std::{error, fmt};

use serde_json::{Map, Value};
use strata_utils::TypeIdMap;

use crate::error::{ReadError, WriteError};
use crate::graph::{CustomSerializable, FromType, GetTypeMeta, TypeMeta, TypeTraitCustom};
use crate::persist::Persist;
use crate::serde::{DeserializeDriver, SerializeDriver, VERSION_FIELD};

// -----------------------------------------------------------------------------
// Constants

/// Document field holding the blackboard's persisted values map.
pub const VALUES_FIELD: &str = "values";

/// The blackboard's own discriminator id.
pub const BLACKBOARD_ID: &str = "blackboard";

// -----------------------------------------------------------------------------
// Registration

/// A factory producing a slot value for a save-registered type.
pub type SaveFactory = Box<dyn Fn() -> Box<dyn Persist> + Send + Sync>;

struct SaveRegistration {
    type_name: &'static str,
    factory: SaveFactory,
    // Persistence filter: the slot is skipped while its value is
    // equivalent to this.
    reference: Option<Box<dyn Persist>>,
}

// -----------------------------------------------------------------------------
// Blackboard

/// A typed slot store whose contents are selectively, lazily, and
/// conditionally persisted.
///
/// Each runtime type occupies at most one slot, and a type lives in at most
/// one of two registries: explicitly [`set`](Self::set) values, or types
/// [registered for save](Self::save). Crossing the two in either direction
/// is a [`BlackboardError::DuplicateRegistration`] — the contract exists so
/// a persisted type can never shadow a directly assigned one.
///
/// Save-registered types are instantiated lazily: [`get`](Self::get) runs
/// the registered factory on first access, and an optional reference value
/// suppresses persistence while the instance is still equivalent to it.
///
/// The blackboard is itself a serializable node (id `"blackboard"`): its
/// body carries a [`values`](VALUES_FIELD) map from each persisted type's
/// id to that value's own serialized node.
///
/// Instances are not thread-safe; concurrent access must be synchronized
/// externally.
///
/// # Examples
///
/// ```
/// use strata::Blackboard;
///
/// #[derive(Debug, PartialEq)]
/// struct Progress { level: u64 }
///
/// let mut blackboard = Blackboard::new();
/// blackboard.save(|| Progress { level: 1 }).unwrap();
///
/// assert!(blackboard.has::<Progress>());
/// assert_eq!(blackboard.get::<Progress>().unwrap().level, 1);
/// ```
pub struct Blackboard {
    slots: TypeIdMap<Box<dyn Persist>>,
    registrations: TypeIdMap<SaveRegistration>,
}

impl Blackboard {
    /// Creates an empty blackboard.
    pub const fn new() -> Self {
        Self {
            slots: TypeIdMap::new(),
            registrations: TypeIdMap::new(),
        }
    }

    /// Registers type `T` for persistence with no reference-value
    /// filtering.
    ///
    /// The factory runs only if no instance is present when one is needed —
    /// on first [`get`](Self::get), on
    /// [`instantiate_missing`](Self::instantiate_missing), or while
    /// serializing.
    ///
    /// Fails with [`BlackboardError::DuplicateRegistration`] if a value of
    /// type `T` was already [`set`](Self::set).
    pub fn save<T, F>(&mut self, factory: F) -> Result<(), BlackboardError>
    where
        T: Persist,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.save_object(
            TypeId::of::<T>(),
            core::any::type_name::<T>(),
            Box::new(move || Box::new(factory())),
            None,
        )
    }

    /// Registers a type for persistence by its [`TypeId`], with an optional
    /// reference value.
    ///
    /// The non-generic form of [`save`](Self::save). While the current
    /// instance is equivalent to `reference` (by the type's own equality),
    /// the type is excluded from the persisted map; it is included once the
    /// instance diverges.
    pub fn save_object(
        &mut self,
        type_id: TypeId,
        type_name: &'static str,
        factory: SaveFactory,
        reference: Option<Box<dyn Persist>>,
    ) -> Result<(), BlackboardError> {
        if self.slots.contains(&type_id) {
            return Err(BlackboardError::DuplicateRegistration {
                type_name: type_name.into(),
            });
        }
        self.registrations.insert(
            type_id,
            SaveRegistration {
                type_name,
                factory,
                reference,
            },
        );
        Ok(())
    }

    /// Assigns a value directly.
    ///
    /// Fails with [`BlackboardError::DuplicateRegistration`] if type `T` is
    /// registered for save, or if a value of type `T` is already present.
    pub fn set<T: Persist>(&mut self, value: T) -> Result<(), BlackboardError> {
        let type_id = TypeId::of::<T>();
        if self.registrations.contains(&type_id) || self.slots.contains(&type_id) {
            return Err(BlackboardError::DuplicateRegistration {
                type_name: core::any::type_name::<T>().into(),
            });
        }
        self.slots.insert(type_id, Box::new(value));
        Ok(())
    }

    /// Assigns a value unconditionally, replacing any existing slot of the
    /// same type. Deserialization loads slots through this.
    pub fn overwrite<T: Persist>(&mut self, value: T) {
        self.slots.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Assigns an erased value unconditionally, replacing any existing slot
    /// of its exact runtime type.
    pub fn overwrite_object(&mut self, value: Box<dyn Persist>) {
        let type_id = (*value).ty_id();
        self.slots.insert(type_id, value);
    }

    /// Returns the current instance of type `T`, lazily instantiating it
    /// through the registered factory if the type is save-registered but
    /// not yet materialized.
    ///
    /// Fails with [`BlackboardError::MissingSlot`] if `T` is neither set
    /// nor registered for save.
    pub fn get<T: Persist>(&mut self) -> Result<&T, BlackboardError> {
        let type_id = TypeId::of::<T>();
        if !self.slots.contains(&type_id) {
            let value = match self.registrations.get(&type_id) {
                Some(registration) => (registration.factory)(),
                None => return Err(BlackboardError::missing::<T>()),
            };
            self.slots.insert(type_id, value);
        }
        self.slots
            .get(&type_id)
            .and_then(|value| (**value).as_any().downcast_ref())
            .ok_or_else(BlackboardError::missing::<T>)
    }

    /// Returns the current instance of type `T` mutably, lazily
    /// instantiating it like [`get`](Self::get).
    pub fn get_mut<T: Persist>(&mut self) -> Result<&mut T, BlackboardError> {
        let type_id = TypeId::of::<T>();
        if !self.slots.contains(&type_id) {
            let value = match self.registrations.get(&type_id) {
                Some(registration) => (registration.factory)(),
                None => return Err(BlackboardError::missing::<T>()),
            };
            self.slots.insert(type_id, value);
        }
        self.slots
            .get_mut(&type_id)
            .and_then(|value| (**value).as_any_mut().downcast_mut())
            .ok_or_else(BlackboardError::missing::<T>)
    }

    /// Returns the current instance of type `T` without instantiating
    /// anything. This is the read-only view upgrade steps see.
    pub fn peek<T: Persist>(&self) -> Result<&T, BlackboardError> {
        self.slots
            .get(&TypeId::of::<T>())
            .and_then(|value| (**value).as_any().downcast_ref())
            .ok_or_else(BlackboardError::missing::<T>)
    }

    /// Returns `true` if [`get`](Self::get) for `T` would succeed: a value
    /// is present, or the type is registered for save.
    pub fn has<T: Persist>(&self) -> bool {
        let type_id = TypeId::of::<T>();
        self.slots.contains(&type_id) || self.registrations.contains(&type_id)
    }

    /// Eagerly materializes every save-registered type that has no
    /// instance yet.
    pub fn instantiate_missing(&mut self) {
        let Self {
            slots,
            registrations,
        } = self;
        for (type_id, registration) in registrations.iter() {
            if !slots.contains(type_id) {
                slots.insert(*type_id, (registration.factory)());
            }
        }
    }

    /// The types registered for persistence.
    pub fn saved_types(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.registrations.keys().copied()
    }
}

impl Default for Blackboard {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Blackboard {
    /// Two blackboards are equal when they hold equal values for the same
    /// set of types. Save registrations do not participate: they describe
    /// persistence intent, not state.
    fn eq(&self, other: &Self) -> bool {
        self.slots.len() == other.slots.len()
            && self.slots.iter().all(|(type_id, value)| {
                other
                    .slots
                    .get(type_id)
                    .is_some_and(|theirs| (**value).eq_value(&**theirs))
            })
    }
}

impl fmt::Debug for Blackboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blackboard")
            .field("slots", &self.slots.len())
            .field("registrations", &self.registrations.len())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Serialization integration

impl GetTypeMeta for Blackboard {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<Blackboard>(BLACKBOARD_ID, 1)
            .with_factory(|| Box::new(Blackboard::new()))
            .with_trait::<TypeTraitCustom>(FromType::<Blackboard>::from_type())
    }
}

impl CustomSerializable for Blackboard {
    /// Persists every save-registered type whose current value differs
    /// from its reference value, keyed by discriminator id. Types never
    /// materialized are compared through a discarded factory-fresh
    /// instance; use [`Blackboard::instantiate_missing`] to keep them.
    fn on_serialized(
        &self,
        driver: &SerializeDriver<'_>,
        node: &mut Map<String, Value>,
    ) -> Result<(), WriteError> {
        let mut values = Map::new();

        for (type_id, registration) in self.registrations.iter() {
            let fresh;
            let current: &dyn Persist = match self.slots.get(type_id) {
                Some(value) => &**value,
                None => {
                    fresh = (registration.factory)();
                    &*fresh
                }
            };

            if let Some(reference) = &registration.reference {
                if current.eq_value(&**reference) {
                    continue;
                }
            }

            let meta = driver
                .graph()
                .get(current.ty_id())
                .ok_or_else(|| WriteError::not_serializable(registration.type_name))?;
            values.insert(meta.id().to_owned(), driver.write(current)?);
        }

        node.insert(VALUES_FIELD.to_owned(), Value::Object(values));
        Ok(())
    }

    /// Loads every entry of the `values` map, resolving each (id, version)
    /// pair in the graph and overwriting the slot of its exact runtime
    /// type. A missing `values` field is a hard parse failure, not an
    /// empty result.
    fn on_deserialized(
        mut self,
        driver: &DeserializeDriver<'_>,
        node: &Map<String, Value>,
    ) -> Result<Box<dyn Persist>, ReadError> {
        let values = node
            .get(VALUES_FIELD)
            .and_then(Value::as_object)
            .ok_or_else(|| {
                ReadError::malformed(format!(
                    "blackboard node is missing the `{VALUES_FIELD}` field"
                ))
            })?;

        for (id, entry) in values {
            let version = entry
                .get(VERSION_FIELD)
                .and_then(Value::as_u64)
                .and_then(|version| u32::try_from(version).ok());
            let resolved = match version {
                Some(version) => driver.graph().resolve(id, version),
                None => driver.graph().resolve_any(id),
            };
            if resolved.is_none() {
                return Err(ReadError::UnknownType {
                    id: id.clone(),
                    version,
                });
            }

            let value = driver.read(entry).map_err(|err| err.at_field(id))?;
            self.overwrite_object(value);
        }

        Ok(Box::new(self))
    }
}

// -----------------------------------------------------------------------------
// BlackboardError

/// An enumeration of all error outcomes of blackboard slot operations.
#[derive(Debug)]
pub enum BlackboardError {
    /// A type was both set directly and registered for save, in either
    /// order, or set twice.
    DuplicateRegistration { type_name: Cow<'static, str> },
    /// A type was read that is neither set nor registered for save.
    MissingSlot { type_name: Cow<'static, str> },
}

impl BlackboardError {
    fn missing<T>() -> Self {
        Self::MissingSlot {
            type_name: core::any::type_name::<T>().into(),
        }
    }
}

impl fmt::Display for BlackboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateRegistration { type_name } => {
                write!(
                    f,
                    "type `{type_name}` is already on the blackboard; a type may be set or \
                     registered for save, not both"
                )
            }
            Self::MissingSlot { type_name } => {
                write!(f, "no blackboard data of type `{type_name}`")
            }
        }
    }
}

impl error::Error for BlackboardError {}
