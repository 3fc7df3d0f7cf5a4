use core::any::TypeId;

use strata_utils::TypeIdMap;
use strata_utils::hash::HashMap;

use crate::blackboard::Blackboard;
use crate::graph::{GetTypeMeta, TypeMeta};

// -----------------------------------------------------------------------------
// TypeGraph

/// A registry of identifiable type descriptors.
///
/// This struct is the central store the conversion drivers resolve
/// discriminators against: by `TypeId` when writing (runtime-type lookup),
/// by (id, version) when reading, and by id alone when peeking at a nested
/// node's embedded discriminator.
///
/// [Registering] a type generates a new [`TypeMeta`] entry using the type's
/// [`GetTypeMeta`] implementation. Registration happens once, up front;
/// afterwards the graph is consumed read-only.
///
/// # Example
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
/// let mut graph = TypeGraph::new();
/// graph.register::<Marker>();
///
/// let meta = graph.resolve("marker", 1).unwrap();
/// assert_eq!(meta.id(), "marker");
/// ```
///
/// [Registering]: TypeGraph::register
pub struct TypeGraph {
    metas: TypeIdMap<TypeMeta>,
    // Registered versions per id. A handful of versions per id at most, so
    // a flat list beats a second map.
    id_index: HashMap<&'static str, Vec<(u32, TypeId)>>,
}

impl Default for TypeGraph {
    /// See [`TypeGraph::new`].
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl TypeGraph {
    /// Creates an empty [`TypeGraph`] with no built-in registrations.
    #[inline]
    pub const fn empty() -> Self {
        Self {
            metas: TypeIdMap::new(),
            id_index: HashMap::with_hasher(strata_utils::hash::FixedHashState),
        }
    }

    /// Creates a type graph with the built-in registrations: the
    /// serializable [`Blackboard`] (id `"blackboard"`, version 1).
    pub fn new() -> Self {
        let mut graph = Self::empty();
        graph.register::<Blackboard>();
        graph
    }

    // # Validity
    // The type must **not** already exist.
    fn add_new_type_indices(
        meta: &TypeMeta,
        id_index: &mut HashMap<&'static str, Vec<(u32, TypeId)>>,
    ) {
        let versions = id_index.entry(meta.id()).or_default();
        if versions
            .iter()
            .any(|(version, type_id)| *version == meta.version() && *type_id != meta.ty_id())
        {
            panic!(
                "type `{}` is already registered under id `{}` version {}",
                meta.type_name(),
                meta.id(),
                meta.version(),
            );
        }
        versions.push((meta.version(), meta.ty_id()));
    }

    // - If the key `TypeId` already exists, does nothing and returns `false`.
    // - If the key `TypeId` does not exist, inserts the meta and returns `true`.
    fn register_internal(
        &mut self,
        type_id: TypeId,
        get_type_meta: impl FnOnce() -> TypeMeta,
    ) -> bool {
        self.metas.try_insert(type_id, || {
            let meta = get_type_meta();
            Self::add_new_type_indices(&meta, &mut self.id_index);
            meta
        })
    }

    /// Attempts to register the type `T` if it has not been registered
    /// already.
    ///
    /// This also registers any type dependencies declared by
    /// [`GetTypeMeta::register_dependencies`] — typically the identifiable
    /// types reachable through `T`'s properties. If `T` is already present,
    /// neither it nor its dependencies are registered again.
    ///
    /// # Panics
    ///
    /// Panics if a *different* type is already registered under the same
    /// (id, version) pair; discriminators must be unique within a graph.
    pub fn register<T: GetTypeMeta>(&mut self) {
        if self.register_internal(TypeId::of::<T>(), T::get_type_meta) {
            T::register_dependencies(self);
        }
    }

    /// Try add a pre-built descriptor, or do nothing.
    ///
    /// - If the descriptor's `TypeId` already exists, does nothing and
    ///   returns `false`.
    /// - Otherwise inserts it and returns `true`.
    ///
    /// This method does _not_ register type dependencies. Use
    /// [`register`](Self::register) to register a type with its
    /// dependencies.
    pub fn insert_meta(&mut self, meta: TypeMeta) -> bool {
        self.metas.try_insert(meta.ty_id(), || {
            Self::add_new_type_indices(&meta, &mut self.id_index);
            meta
        })
    }

    /// Whether the type with the given [`TypeId`] has been registered.
    #[inline]
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.metas.contains(&type_id)
    }

    /// Returns the descriptor of the type with the given [`TypeId`], or
    /// `None` if it has not been registered.
    #[inline]
    pub fn get(&self, type_id: TypeId) -> Option<&TypeMeta> {
        self.metas.get(&type_id)
    }

    /// Returns the descriptor of the type `T`, or `None` if it has not been
    /// registered.
    #[inline]
    pub fn meta_of<T: 'static>(&self) -> Option<&TypeMeta> {
        self.get(TypeId::of::<T>())
    }

    /// Resolves a discriminator pair to its descriptor, or `None` if no
    /// concrete type is registered under it.
    pub fn resolve(&self, id: &str, version: u32) -> Option<&TypeMeta> {
        let versions = self.id_index.get(id)?;
        let (_, type_id) = versions.iter().find(|(v, _)| *v == version)?;
        self.get(*type_id)
    }

    /// Resolves a discriminator id alone, yielding the highest registered
    /// version's descriptor. Used to peek at nested nodes whose embedded
    /// discriminator is more specific than the declared property type.
    pub fn resolve_any(&self, id: &str) -> Option<&TypeMeta> {
        let versions = self.id_index.get(id)?;
        let (_, type_id) = versions.iter().max_by_key(|(version, _)| *version)?;
        self.get(*type_id)
    }

    /// Returns an iterator over the registered descriptors.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &TypeMeta> {
        self.metas.values()
    }
}

// -----------------------------------------------------------------------------
// Distributed registration

/// A descriptor provider collected by the `auto_register` feature.
///
/// Submit one per type with [`inventory::submit!`], then collect them all
/// into a graph with [`TypeGraph::auto_register`]:
///
/// ```ignore
/// inventory::submit! { AutoRegistration::new::<MyModel>() }
/// ```
#[cfg(feature = "auto_register")]
pub struct AutoRegistration {
    register: fn(&mut TypeGraph),
}

#[cfg(feature = "auto_register")]
impl AutoRegistration {
    /// A registration entry for type `T`.
    pub const fn new<T: GetTypeMeta>() -> Self {
        Self {
            register: |graph| graph.register::<T>(),
        }
    }
}

#[cfg(feature = "auto_register")]
inventory::collect!(AutoRegistration);

#[cfg(feature = "auto_register")]
impl TypeGraph {
    /// Registers every descriptor submitted through
    /// [`inventory::submit!`]. Repeated calls are cheap and will not insert
    /// duplicates.
    pub fn auto_register(&mut self) {
        for entry in inventory::iter::<AutoRegistration> {
            (entry.register)(self);
        }
    }
}
