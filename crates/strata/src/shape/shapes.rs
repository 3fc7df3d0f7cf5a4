use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::error::{ReadError, WriteError};
use crate::persist::{Persist, take_value};

// -----------------------------------------------------------------------------
// Function tables

/// Visitor callback for sequence and set elements.
pub type ElementVisitor<'a> = dyn FnMut(&dyn Persist) -> Result<(), WriteError> + 'a;

/// Visitor callback for map entries.
pub type EntryVisitor<'a> = dyn FnMut(&dyn Persist, &dyn Persist) -> Result<(), WriteError> + 'a;

/// The closed shape of an ordered sequence (`Vec<T>`).
#[derive(Clone, Copy)]
pub struct ListShape {
    /// Creates an empty sequence.
    pub new_empty: fn() -> Box<dyn Persist>,
    /// Visits each element in order.
    pub visit: fn(&dyn Persist, &mut ElementVisitor<'_>) -> Result<(), WriteError>,
    /// Appends a decoded element.
    pub push: fn(&mut dyn Persist, Box<dyn Persist>) -> Result<(), ReadError>,
}

/// The closed shape of a unique-element set (`HashSet<T>`).
#[derive(Clone, Copy)]
pub struct SetShape {
    /// Creates an empty set.
    pub new_empty: fn() -> Box<dyn Persist>,
    /// Visits each element in iteration order.
    pub visit: fn(&dyn Persist, &mut ElementVisitor<'_>) -> Result<(), WriteError>,
    /// Inserts a decoded element.
    pub insert: fn(&mut dyn Persist, Box<dyn Persist>) -> Result<(), ReadError>,
}

/// The closed shape of a key-value map (`HashMap<K, V>`).
#[derive(Clone, Copy)]
pub struct MapShape {
    /// Creates an empty map.
    pub new_empty: fn() -> Box<dyn Persist>,
    /// Visits each entry in iteration order.
    pub visit: fn(&dyn Persist, &mut EntryVisitor<'_>) -> Result<(), WriteError>,
    /// Inserts a decoded entry.
    pub insert: fn(&mut dyn Persist, Box<dyn Persist>, Box<dyn Persist>) -> Result<(), ReadError>,
}

/// The closed shape of a nullable slot (`Option<T>`).
#[derive(Clone, Copy)]
pub struct NullableShape {
    /// Creates the empty (`None`) value.
    pub none: fn() -> Box<dyn Persist>,
    /// Wraps a decoded inner value into the `Some` form.
    pub wrap: fn(Box<dyn Persist>) -> Result<Box<dyn Persist>, ReadError>,
    /// Projects the inner value out, or `None` when the slot is empty.
    pub project: fn(&dyn Persist) -> Result<Option<&dyn Persist>, WriteError>,
}

// -----------------------------------------------------------------------------
// Shape

/// A closed generic container shape: the function table the conversion
/// drivers use to create, traverse, and fill one concrete container type.
///
/// Shapes are monomorphized where the [`TypeNode`](crate::info::TypeNode) is
/// constructed — the only place the concrete type arguments are statically
/// known — and cached by the closed type's `TypeId`.
#[derive(Clone, Copy)]
pub enum Shape {
    /// An ordered sequence.
    List(ListShape),
    /// A unique-element set.
    Set(SetShape),
    /// A key-value map.
    Map(MapShape),
    /// A nullable slot.
    Nullable(NullableShape),
}

impl Shape {
    /// The shape of `Vec<T>`.
    pub fn list_of<T: Persist + PartialEq>() -> Self {
        Self::List(ListShape {
            new_empty: || Box::new(Vec::<T>::new()),
            visit: |list, visitor| {
                let list = expect_container::<Vec<T>>(list)?;
                for element in list {
                    visitor(element)?;
                }
                Ok(())
            },
            push: |list, element| {
                let list = expect_container_mut::<Vec<T>>(list)?;
                list.push(take_element::<T>(element)?);
                Ok(())
            },
        })
    }

    /// The shape of `HashSet<T>`.
    pub fn set_of<T: Persist + Eq + Hash>() -> Self {
        Self::Set(SetShape {
            new_empty: || Box::new(HashSet::<T>::new()),
            visit: |set, visitor| {
                let set = expect_container::<HashSet<T>>(set)?;
                for element in set {
                    visitor(element)?;
                }
                Ok(())
            },
            insert: |set, element| {
                let set = expect_container_mut::<HashSet<T>>(set)?;
                set.insert(take_element::<T>(element)?);
                Ok(())
            },
        })
    }

    /// The shape of `HashMap<K, V>`.
    pub fn map_of<K, V>() -> Self
    where
        K: Persist + Eq + Hash,
        V: Persist + PartialEq,
    {
        Self::Map(MapShape {
            new_empty: || Box::new(HashMap::<K, V>::new()),
            visit: |map, visitor| {
                let map = expect_container::<HashMap<K, V>>(map)?;
                for (key, value) in map {
                    visitor(key, value)?;
                }
                Ok(())
            },
            insert: |map, key, value| {
                let map = expect_container_mut::<HashMap<K, V>>(map)?;
                map.insert(take_element::<K>(key)?, take_element::<V>(value)?);
                Ok(())
            },
        })
    }

    /// The shape of `Option<T>`.
    pub fn nullable_of<T: Persist + PartialEq>() -> Self {
        Self::Nullable(NullableShape {
            none: || Box::new(None::<T>),
            wrap: |inner| Ok(Box::new(Some(take_element::<T>(inner)?))),
            project: |slot| {
                let slot = expect_container::<Option<T>>(slot)?;
                Ok(slot.as_ref().map(|inner| inner as &dyn Persist))
            },
        })
    }

    /// Returns the sequence table, if this is a sequence shape.
    #[inline]
    pub fn as_list(&self) -> Option<&ListShape> {
        match self {
            Self::List(shape) => Some(shape),
            _ => None,
        }
    }

    /// Returns the set table, if this is a set shape.
    #[inline]
    pub fn as_set(&self) -> Option<&SetShape> {
        match self {
            Self::Set(shape) => Some(shape),
            _ => None,
        }
    }

    /// Returns the map table, if this is a map shape.
    #[inline]
    pub fn as_map(&self) -> Option<&MapShape> {
        match self {
            Self::Map(shape) => Some(shape),
            _ => None,
        }
    }

    /// Returns the nullable table, if this is a nullable shape.
    #[inline]
    pub fn as_nullable(&self) -> Option<&NullableShape> {
        match self {
            Self::Nullable(shape) => Some(shape),
            _ => None,
        }
    }

    /// Creates an empty instance of the container.
    pub fn new_empty(&self) -> Box<dyn Persist> {
        match self {
            Self::List(shape) => (shape.new_empty)(),
            Self::Set(shape) => (shape.new_empty)(),
            Self::Map(shape) => (shape.new_empty)(),
            Self::Nullable(shape) => (shape.none)(),
        }
    }
}

// -----------------------------------------------------------------------------
// Downcast helpers

fn expect_container<C: Persist>(value: &dyn Persist) -> Result<&C, WriteError> {
    value
        .downcast_ref::<C>()
        .ok_or_else(|| WriteError::not_serializable(value.type_name()))
}

fn expect_container_mut<'a, C: Persist>(value: &'a mut (dyn Persist + 'static)) -> Result<&'a mut C, ReadError> {
    let type_name = Persist::type_name(&*value);
    value.downcast_mut::<C>().ok_or_else(|| {
        ReadError::malformed(format!(
            "value of type `{type_name}` does not fit container `{}`",
            core::any::type_name::<C>(),
        ))
    })
}

fn take_element<T: Persist>(value: Box<dyn Persist>) -> Result<T, ReadError> {
    take_value::<T>(value).map_err(|value| {
        ReadError::malformed(format!(
            "decoded value of type `{}` does not fit element type `{}`",
            (*value).type_name(),
            core::any::type_name::<T>(),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::Shape;
    use crate::persist::Persist;

    #[test]
    fn list_shape_round_trips_elements() {
        let Shape::List(shape) = Shape::list_of::<u32>() else {
            panic!("expected a list shape");
        };

        let mut list = (shape.new_empty)();
        (shape.push)(&mut *list, Box::new(1_u32)).unwrap();
        (shape.push)(&mut *list, Box::new(2_u32)).unwrap();

        let mut seen = Vec::new();
        (shape.visit)(&*list, &mut |element| {
            seen.push(*element.downcast_ref::<u32>().unwrap());
            Ok(())
        })
        .unwrap();

        assert_eq!(seen, [1, 2]);
        assert_eq!(list.downcast_ref::<Vec<u32>>(), Some(&vec![1, 2]));
    }

    #[test]
    fn push_rejects_mismatched_elements() {
        let Shape::List(shape) = Shape::list_of::<u32>() else {
            panic!("expected a list shape");
        };
        let mut list = (shape.new_empty)();
        assert!((shape.push)(&mut *list, Box::new(String::new())).is_err());
    }

    #[test]
    fn nullable_shape_wraps_and_projects() {
        let Shape::Nullable(shape) = Shape::nullable_of::<u32>() else {
            panic!("expected a nullable shape");
        };

        let none = (shape.none)();
        assert_eq!((shape.project)(&*none).unwrap().map(|_| ()), None);

        let some = (shape.wrap)(Box::new(3_u32)).unwrap();
        let inner = (shape.project)(&*some).unwrap().unwrap();
        assert_eq!(inner.downcast_ref::<u32>(), Some(&3));
    }

    #[test]
    fn dynamic_list_holds_erased_slots() {
        let Shape::List(shape) = Shape::list_of::<Box<dyn Persist>>() else {
            panic!("expected a list shape");
        };

        let mut list = (shape.new_empty)();
        (shape.push)(&mut *list, Box::new(1_u8)).unwrap();
        (shape.push)(&mut *list, Box::new(String::from("two"))).unwrap();

        let list = list.downcast_ref::<Vec<Box<dyn Persist>>>().unwrap();
        assert!(list[0].is::<u8>());
        assert!(list[1].is::<String>());
    }
}
