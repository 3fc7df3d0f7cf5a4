use core::any::TypeId;

use strata_utils::TypeIdMap;

use crate::error::ReadError;
use crate::graph::{TypeGraph, TypeTrait};
use crate::info::{NamedValues, PropertyInfo};
use crate::persist::Persist;

// -----------------------------------------------------------------------------
// Constructor signatures

/// Creates a fresh instance of a type with no construction-time properties.
pub type FactoryFn = fn() -> Box<dyn Persist>;

/// Creates an instance of a type from its construction-time property values.
pub type ConstructFn = fn(&mut NamedValues) -> Result<Box<dyn Persist>, ReadError>;

// -----------------------------------------------------------------------------
// TypeMeta

/// The descriptor of one concrete identifiable type, registered into the
/// [`TypeGraph`].
///
/// A descriptor carries the type's stable string id and integer version —
/// together the discriminator pair embedded in every serialized node — its
/// ordered property list, exactly one construction path (a
/// [factory](Self::with_factory) when the type has no construction-time
/// properties, a [construct function](Self::with_construct) when it does),
/// and a table of optional capabilities.
///
/// # Examples
///
/// ```
/// use strata::graph::TypeMeta;
///
/// #[derive(Debug, PartialEq)]
/// struct Marker;
///
/// let meta = TypeMeta::of::<Marker>("marker", 1)
///     .with_factory(|| Box::new(Marker));
///
/// assert_eq!(meta.id(), "marker");
/// assert_eq!(meta.version(), 1);
/// ```
pub struct TypeMeta {
    ty_id: TypeId,
    type_name: &'static str,
    id: &'static str,
    version: u32,
    properties: Vec<PropertyInfo>,
    factory: Option<FactoryFn>,
    construct: Option<ConstructFn>,
    trait_table: TypeIdMap<Box<dyn TypeTrait>>,
}

impl TypeMeta {
    /// Creates a descriptor for type `T` under the given discriminator id
    /// and version.
    pub fn of<T: Persist>(id: &'static str, version: u32) -> Self {
        Self {
            ty_id: TypeId::of::<T>(),
            type_name: core::any::type_name::<T>(),
            id,
            version,
            properties: Vec::new(),
            factory: None,
            construct: None,
            trait_table: TypeIdMap::new(),
        }
    }

    /// Attaches the zero-argument factory. Use for types with no
    /// construction-time properties.
    pub fn with_factory(mut self, factory: FactoryFn) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Attaches the construct-from-named-values function. Use for types
    /// with construction-time (init) properties; setter-backed properties
    /// are applied after it runs.
    pub fn with_construct(mut self, construct: ConstructFn) -> Self {
        self.construct = Some(construct);
        self
    }

    /// Appends one property descriptor.
    pub fn with_property(mut self, property: PropertyInfo) -> Self {
        self.properties.push(property);
        self
    }

    /// Appends several property descriptors in order.
    pub fn with_properties(mut self, properties: impl IntoIterator<Item = PropertyInfo>) -> Self {
        self.properties.extend(properties);
        self
    }

    /// Inserts a capability entry, builder-style.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata::graph::{FromType, TypeMeta, TypeTraitCustom};
    /// # use strata::Blackboard;
    ///
    /// let meta = TypeMeta::of::<Blackboard>("blackboard", 1)
    ///     .with_trait::<TypeTraitCustom>(FromType::<Blackboard>::from_type());
    /// assert!(meta.has_trait::<TypeTraitCustom>());
    /// ```
    pub fn with_trait<T: TypeTrait>(mut self, data: T) -> Self {
        self.insert_trait(data);
        self
    }

    /// Inserts a capability entry.
    pub fn insert_trait<T: TypeTrait>(&mut self, data: T) {
        self.trait_table.insert(TypeId::of::<T>(), Box::new(data));
    }

    /// Gets a capability entry, or `None` if the type does not carry it.
    pub fn get_trait<T: TypeTrait>(&self) -> Option<&T> {
        self.trait_table
            .get(&TypeId::of::<T>())
            .and_then(|data| data.as_any().downcast_ref())
    }

    /// Returns `true` if the type carries the given capability.
    pub fn has_trait<T: TypeTrait>(&self) -> bool {
        self.trait_table.contains(&TypeId::of::<T>())
    }

    /// Returns the described type's [`TypeId`].
    #[inline]
    pub fn ty_id(&self) -> TypeId {
        self.ty_id
    }

    /// Returns the described type's name, for diagnostics.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the stable discriminator id.
    #[inline]
    pub fn id(&self) -> &'static str {
        self.id
    }

    /// Returns the shape version.
    #[inline]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Returns the property descriptors, in declaration order.
    #[inline]
    pub fn properties(&self) -> &[PropertyInfo] {
        &self.properties
    }

    /// Returns the factory, if the type constructs without init properties.
    #[inline]
    pub fn factory(&self) -> Option<FactoryFn> {
        self.factory
    }

    /// Returns the construct function, if the type has init properties.
    #[inline]
    pub fn construct(&self) -> Option<ConstructFn> {
        self.construct
    }
}

impl core::fmt::Debug for TypeMeta {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TypeMeta")
            .field("type_name", &self.type_name)
            .field("id", &self.id)
            .field("version", &self.version)
            .field("properties", &self.properties.len())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// GetTypeMeta

/// A trait which allows a type to produce its [`TypeMeta`] for registration
/// into the [`TypeGraph`].
///
/// Implementations are typically emitted by generated tooling; writing one
/// by hand follows the same shape.
///
/// # Examples
///
/// ```
/// use strata::graph::{GetTypeMeta, TypeGraph, TypeMeta};
///
/// #[derive(Debug, PartialEq)]
/// struct Marker;
///
/// impl GetTypeMeta for Marker {
///     fn get_type_meta() -> TypeMeta {
///         TypeMeta::of::<Marker>("marker", 1).with_factory(|| Box::new(Marker))
///     }
/// }
///
/// let mut graph = TypeGraph::empty();
/// graph.register::<Marker>();
/// assert!(graph.resolve("marker", 1).is_some());
/// ```
pub trait GetTypeMeta: Persist {
    /// Returns the descriptor for this type.
    fn get_type_meta() -> TypeMeta;

    /// Registers other types this type's properties refer to.
    /// **Allowed** not to register the type itself.
    fn register_dependencies(_graph: &mut TypeGraph) {}
}
