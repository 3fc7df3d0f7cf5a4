use serde_json::{Map, Value};

use crate::blackboard::Blackboard;
use crate::error::ReadError;
use crate::graph::{TypeGraph, TypeTraitCustom, TypeTraitOutdated};
use crate::info::{NamedValues, NodeKind, PropertyInfo, Setter, TypeNode};
use crate::persist::Persist;
use crate::serde::converters::converter_for;
use crate::serde::{TYPE_FIELD, VERSION_FIELD};
use crate::shape::{Shape, identify_shapes, resolve_shape};

// -----------------------------------------------------------------------------
// DeserializeDriver

/// Reads self-describing document nodes back into typed values.
///
/// Every object node carries its own discriminator (`$type`) and version
/// (`$v`), which select the descriptor to construct from — the declared
/// property type only constrains *where* an object is expected, never
/// *which* concrete type comes back. After construction the driver walks
/// the value's upgrade chain until it stops reporting itself outdated, then
/// gives the custom-serialization hook the final word.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use strata::graph::{GetTypeMeta, TypeGraph, TypeMeta};
/// use strata::serde::DeserializeDriver;
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
/// let node = json!({ "$type": "marker", "$v": 1 });
/// let marker: Marker = DeserializeDriver::new(&graph).read_as(&node).unwrap();
/// assert_eq!(marker, Marker);
/// ```
pub struct DeserializeDriver<'a> {
    graph: &'a TypeGraph,
    deps: &'a Blackboard,
}

impl<'a> DeserializeDriver<'a> {
    /// Creates a driver with an empty dependency store.
    ///
    /// Outdated values upgraded through this driver see no dependencies;
    /// use [`with_dependencies`](Self::with_dependencies) when upgrade
    /// steps need externally supplied services.
    pub fn new(graph: &'a TypeGraph) -> Self {
        static EMPTY: Blackboard = Blackboard::new();
        Self {
            graph,
            deps: &EMPTY,
        }
    }

    /// Creates a driver whose upgrade steps read from `deps`.
    pub fn with_dependencies(graph: &'a TypeGraph, deps: &'a Blackboard) -> Self {
        Self { graph, deps }
    }

    /// Returns the type graph this driver resolves against.
    #[inline]
    pub fn graph(&self) -> &TypeGraph {
        self.graph
    }

    /// Returns the dependency store passed to upgrade steps.
    #[inline]
    pub fn dependencies(&self) -> &Blackboard {
        self.deps
    }

    /// Reads a root node, which must be an object carrying its own
    /// discriminator.
    pub fn read(&self, node: &Value) -> Result<Box<dyn Persist>, ReadError> {
        let node = node
            .as_object()
            .ok_or_else(|| ReadError::malformed("expected an object node"))?;
        self.read_object(node)
    }

    /// Reads a root node and downcasts the result to `T`.
    ///
    /// The upgrade chain runs before the downcast, so reading an old
    /// document as the current type works transparently.
    pub fn read_as<T: Persist>(&self, node: &Value) -> Result<T, ReadError> {
        self.read(node)?.take::<T>().map_err(|value| {
            ReadError::malformed(format!(
                "expected a `{}`, found `{}`",
                core::any::type_name::<T>(),
                (*value).type_name(),
            ))
        })
    }

    /// Reads any node against its declared type node.
    ///
    /// Dispatch order, mirroring the writer: declared identifiable type
    /// (requires an object) → embedded-discriminator peek (polymorphic
    /// slots) → registered converter for the declared type → declared
    /// container shape → nothing, which is [`ReadError::NotSerializable`].
    pub fn read_value(&self, node: &Value, ty: &TypeNode) -> Result<Box<dyn Persist>, ReadError> {
        if ty.kind() == NodeKind::Opaque {
            if self.graph.contains(ty.closed_id()) {
                // The declared type itself is identifiable; an object node
                // is required and its embedded discriminator drives the
                // read.
                let node = node.as_object().ok_or_else(|| {
                    ReadError::malformed(format!("expected an object node for `{}`", ty.name()))
                })?;
                return self.read_object(node);
            }

            // Peek at the node's own discriminator: a polymorphic slot
            // holds whichever registered implementer was written.
            if let Some(object) = node.as_object() {
                if let Some(id) = object.get(TYPE_FIELD).and_then(Value::as_str) {
                    if self.graph.resolve_any(id).is_some() {
                        return self.read_object(object);
                    }
                }
            }
        }

        // A codec for the declared type takes the whole node.
        if let Some(codec) = converter_for(&ty.closed_id()) {
            return codec.read(node);
        }

        match ty.kind() {
            NodeKind::Nullable => {
                let shape = self.shape_of(ty, Shape::as_nullable)?;
                if node.is_null() {
                    return Ok((shape.none)());
                }
                let inner = self.read_value(node, &ty.args()[0])?;
                (shape.wrap)(inner)
            }
            NodeKind::List => {
                let elements = self.expect_array(node, ty)?;
                let shape = self.shape_of(ty, Shape::as_list)?;
                let mut list = (shape.new_empty)();
                for element in elements {
                    let element = self.read_value(element, &ty.args()[0])?;
                    (shape.push)(&mut *list, element)?;
                }
                Ok(list)
            }
            NodeKind::Set => {
                let elements = self.expect_array(node, ty)?;
                let shape = self.shape_of(ty, Shape::as_set)?;
                let mut set = (shape.new_empty)();
                for element in elements {
                    let element = self.read_value(element, &ty.args()[0])?;
                    (shape.insert)(&mut *set, element)?;
                }
                Ok(set)
            }
            NodeKind::Map => {
                let entries = node.as_object().ok_or_else(|| {
                    ReadError::malformed(format!("expected an object for `{}`", ty.name()))
                })?;
                let shape = self.shape_of(ty, Shape::as_map)?;
                let mut map = (shape.new_empty)();
                for (key, entry_value) in entries {
                    let key = self.read_key(key, &ty.args()[0])?;
                    let entry_value = self.read_value(entry_value, &ty.args()[1])?;
                    (shape.insert)(&mut *map, key, entry_value)?;
                }
                Ok(map)
            }
            NodeKind::Opaque => Err(ReadError::NotSerializable {
                type_name: ty.name().into(),
            }),
        }
    }

    /// Reads one identifiable object node by its embedded discriminator:
    /// resolve, construct, populate, upgrade, then the custom hook.
    pub fn read_object(&self, node: &Map<String, Value>) -> Result<Box<dyn Persist>, ReadError> {
        let id = node
            .get(TYPE_FIELD)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ReadError::malformed(format!("missing the `{TYPE_FIELD}` type discriminator"))
            })?;
        let version = node
            .get(VERSION_FIELD)
            .and_then(Value::as_u64)
            .and_then(|version| u32::try_from(version).ok())
            .ok_or_else(|| {
                ReadError::malformed(format!("missing the `{VERSION_FIELD}` version discriminator"))
            })?;

        let meta = self.graph.resolve(id, version).ok_or_else(|| {
            ReadError::UnknownType {
                id: id.to_owned(),
                version: Some(version),
            }
        })?;

        let mut value = match meta.construct() {
            Some(construct) => {
                // Init-time properties cannot be set once the value exists,
                // so gather everything first, construct, then run the
                // remaining setters.
                let mut init_values = NamedValues::new();
                let mut deferred: Vec<(Setter, Box<dyn Persist>)> = Vec::new();

                for property in meta.properties() {
                    let Some(decoded) = self.decode_property(node, property)? else {
                        continue;
                    };
                    if property.is_init() {
                        init_values.insert(property.name(), decoded);
                    } else if let Some(setter) = property.setter() {
                        deferred.push((setter, decoded));
                    }
                }

                let mut value = construct(&mut init_values)?;
                for (setter, decoded) in deferred {
                    setter(&mut *value, decoded)?;
                }
                value
            }
            None => {
                let factory = meta.factory().ok_or_else(|| ReadError::UnknownType {
                    id: id.to_owned(),
                    version: Some(version),
                })?;
                let mut value = factory();

                for property in meta.properties() {
                    let Some(decoded) = self.decode_property(node, property)? else {
                        continue;
                    };
                    // Without a construct function there is nowhere to
                    // route init-time values; a property with no setter is
                    // left at its constructor-chosen state.
                    let Some(setter) = property.setter() else {
                        continue;
                    };
                    setter(&mut *value, decoded)?;
                }
                value
            }
        };

        // Upgrade the deserialized value as needed. Each outdated version
        // steps to the next; the chain must be acyclic.
        loop {
            let Some(current) = self.graph.get((*value).ty_id()) else {
                break;
            };
            let Some(outdated) = current.get_trait::<TypeTraitOutdated>() else {
                break;
            };
            value = outdated.upgrade(value, self.deps);
        }

        // The custom hook gets the final word and may replace the value
        // outright.
        if let Some(custom) = self
            .graph
            .get((*value).ty_id())
            .and_then(|meta| meta.get_trait::<TypeTraitCustom>())
        {
            value = custom.on_deserialized(value, self, node)?;
        }

        Ok(value)
    }

    // Decodes one property out of the node: its field value when present,
    // a synthesized empty container when absent without a default, and
    // `None` (leave the property alone) otherwise.
    fn decode_property(
        &self,
        node: &Map<String, Value>,
        property: &PropertyInfo,
    ) -> Result<Option<Box<dyn Persist>>, ReadError> {
        // Only persisted properties are read.
        let Some(field_id) = property.field_id() else {
            return Ok(None);
        };

        // Container shapes must be closed before the nested call.
        identify_shapes(property.node());

        if let Some(field) = node.get(field_id) {
            let decoded = self
                .read_value(field, property.node())
                .map_err(|err| err.at_field(field_id))?;
            return Ok(Some(decoded));
        }

        // The property is absent. For a declared container with no
        // application default we prefer an empty container over an unset
        // slot; "missing" and "explicitly null" must stay distinct.
        let Some(container) = property.node().container_node() else {
            return Ok(None);
        };
        if property.has_default() {
            return Ok(None);
        }

        let empty = self
            .shape_for(container)
            .map_err(|err| err.at_field(field_id))?
            .new_empty();
        if property.node().kind() == NodeKind::Nullable {
            let shape = self
                .shape_of(property.node(), Shape::as_nullable)
                .map_err(|err| err.at_field(field_id))?;
            return Ok(Some((shape.wrap)(empty)?));
        }
        Ok(Some(empty))
    }

    // Decodes a map key. Typed string keys decode directly; numeric and
    // bool keys arrive stringified and fall back to their literal form.
    fn read_key(&self, key: &str, node: &TypeNode) -> Result<Box<dyn Persist>, ReadError> {
        let as_string = Value::String(key.to_owned());
        match self.read_value(&as_string, node) {
            Ok(value) => Ok(value),
            Err(err) => {
                if let Ok(literal) = serde_json::from_str::<Value>(key) {
                    if !literal.is_string() {
                        if let Ok(value) = self.read_value(&literal, node) {
                            return Ok(value);
                        }
                    }
                }
                Err(err)
            }
        }
    }

    fn expect_array<'v>(
        &self,
        node: &'v Value,
        ty: &TypeNode,
    ) -> Result<&'v Vec<Value>, ReadError> {
        node.as_array().ok_or_else(|| {
            ReadError::malformed(format!("expected an array for `{}`", ty.name()))
        })
    }

    fn shape_for(&self, node: &TypeNode) -> Result<Shape, ReadError> {
        resolve_shape(node).ok_or_else(|| ReadError::NotSerializable {
            type_name: node.name().into(),
        })
    }

    fn shape_of<S: Copy>(
        &self,
        node: &TypeNode,
        project: impl Fn(&Shape) -> Option<&S>,
    ) -> Result<S, ReadError> {
        let shape = self.shape_for(node)?;
        project(&shape).copied().ok_or_else(|| ReadError::NotSerializable {
            type_name: node.name().into(),
        })
    }
}
