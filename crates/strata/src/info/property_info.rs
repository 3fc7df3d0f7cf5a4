use crate::error::ReadError;
use crate::info::TypeNode;
use crate::persist::Persist;

// -----------------------------------------------------------------------------
// Accessor signatures

/// Borrows a property value out of its owning value.
pub type Getter = fn(&dyn Persist) -> &dyn Persist;

/// Applies a decoded property value to its owning value.
pub type Setter = fn(&mut dyn Persist, Box<dyn Persist>) -> Result<(), ReadError>;

// -----------------------------------------------------------------------------
// PropertyInfo

/// Information for one property of an identifiable type.
///
/// Only properties with a persisted-field id participate in conversion; the
/// rest are carried for completeness but skipped by both drivers. A property
/// may be readable (getter), writable (setter), populated only at
/// construction time (`init`), or any mix the owning type allows.
///
/// # Examples
///
/// ```
/// use strata::info::{PropertyInfo, TypeNode};
///
/// let info = PropertyInfo::new("name", TypeNode::of::<String>())
///     .persisted("name")
///     .init();
///
/// assert_eq!(info.field_id(), Some("name"));
/// assert!(info.is_init());
/// assert!(!info.has_default());
/// ```
#[derive(Clone, Debug)]
pub struct PropertyInfo {
    name: &'static str,
    field_id: Option<&'static str>,
    getter: Option<Getter>,
    setter: Option<Setter>,
    is_init: bool,
    has_default: bool,
    node: TypeNode,
}

impl PropertyInfo {
    /// Creates a new property descriptor for the given property `name` and
    /// declared type node. The property is not persisted until
    /// [`persisted`](Self::persisted) assigns it a field id.
    pub fn new(name: &'static str, node: TypeNode) -> Self {
        Self {
            name,
            field_id: None,
            getter: None,
            setter: None,
            is_init: false,
            has_default: false,
            node,
        }
    }

    /// Marks the property as persisted under the given document field id.
    pub fn persisted(mut self, field_id: &'static str) -> Self {
        self.field_id = Some(field_id);
        self
    }

    /// Attaches the property's getter.
    pub fn with_getter(mut self, getter: Getter) -> Self {
        self.getter = Some(getter);
        self
    }

    /// Attaches the property's setter.
    pub fn with_setter(mut self, setter: Setter) -> Self {
        self.setter = Some(setter);
        self
    }

    /// Marks the property as populated only at construction time. Its
    /// decoded value is routed into the owning type's construct function
    /// instead of a setter.
    pub fn init(mut self) -> Self {
        self.is_init = true;
        self
    }

    /// Marks the property as having an application-supplied default, which
    /// suppresses the "missing collection ⇒ empty" synthesis.
    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    /// Returns the property name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the persisted-field id, or `None` if the property is not
    /// persisted.
    #[inline]
    pub fn field_id(&self) -> Option<&'static str> {
        self.field_id
    }

    /// Returns the getter, if the property is readable.
    #[inline]
    pub fn getter(&self) -> Option<Getter> {
        self.getter
    }

    /// Returns the setter, if the property is writable after construction.
    #[inline]
    pub fn setter(&self) -> Option<Setter> {
        self.setter
    }

    /// Whether the property is populated only at construction time.
    #[inline]
    pub fn is_init(&self) -> bool {
        self.is_init
    }

    /// Whether the property has an application-supplied default.
    #[inline]
    pub fn has_default(&self) -> bool {
        self.has_default
    }

    /// Returns the declared type node.
    #[inline]
    pub fn node(&self) -> &TypeNode {
        &self.node
    }
}
