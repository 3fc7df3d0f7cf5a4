use serde_json::{Map, Value};

use crate::error::WriteError;
use crate::graph::{TypeGraph, TypeMeta, TypeTraitCustom};
use crate::info::{NodeKind, TypeNode};
use crate::persist::{Persist, erased_inner};
use crate::serde::converters::converter_for;
use crate::serde::{TYPE_FIELD, VERSION_FIELD};
use crate::shape::{identify_shapes, resolve_shape};

// -----------------------------------------------------------------------------
// SerializeDriver

/// Writes typed values into self-describing document nodes.
///
/// Every identifiable value serializes to an object carrying its
/// discriminator (`$type`) and version (`$v`) followed by its persisted
/// properties. The driver resolves each value's *runtime* type against the
/// graph before falling back to the declared property type, which is what
/// lets an interface-typed field serialize as its concrete registered
/// implementer without any special-case code at call sites.
///
/// # Examples
///
/// ```
/// use strata::graph::{GetTypeMeta, TypeGraph, TypeMeta};
/// use strata::serde::SerializeDriver;
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
/// let node = SerializeDriver::new(&graph).write(&Marker).unwrap();
/// assert_eq!(node["$type"], "marker");
/// assert_eq!(node["$v"], 1);
/// ```
pub struct SerializeDriver<'a> {
    graph: &'a TypeGraph,
}

impl<'a> SerializeDriver<'a> {
    /// Creates a driver over the given type graph.
    #[inline]
    pub fn new(graph: &'a TypeGraph) -> Self {
        Self { graph }
    }

    /// Returns the type graph this driver resolves against.
    #[inline]
    pub fn graph(&self) -> &TypeGraph {
        self.graph
    }

    /// Writes a root value, which must be of a registered identifiable
    /// type.
    ///
    /// Fails with [`WriteError::NotSerializable`] when the value's runtime
    /// type has no descriptor in the graph.
    pub fn write(&self, value: &dyn Persist) -> Result<Value, WriteError> {
        let value = erased_inner(value);
        let meta = self
            .graph
            .get(value.ty_id())
            .ok_or_else(|| WriteError::not_serializable(value.type_name()))?;
        self.write_object(value, meta)
    }

    /// Writes any value against its declared type node.
    ///
    /// Dispatch order: registered runtime type (discriminator path) →
    /// registered converter (runtime type first, declared type second) →
    /// declared container shape → nothing, which is
    /// [`WriteError::NotSerializable`].
    pub fn write_value(&self, value: &dyn Persist, node: &TypeNode) -> Result<Value, WriteError> {
        let value = erased_inner(value);

        // The actual instance type being a registered identifiable type
        // means it is at least as specific as the declared type. Use it.
        if let Some(meta) = self.graph.get(value.ty_id()) {
            return self.write_object(value, meta);
        }

        if let Some(codec) =
            converter_for(&value.ty_id()).or_else(|| converter_for(&node.closed_id()))
        {
            return codec.write(value);
        }

        match node.kind() {
            NodeKind::Nullable => {
                let shape = resolve_shape(node)
                    .and_then(|shape| shape.as_nullable().copied())
                    .ok_or_else(|| WriteError::not_serializable(node.name()))?;
                match (shape.project)(value)? {
                    Some(inner) => self.write_value(inner, &node.args()[0]),
                    None => Ok(Value::Null),
                }
            }
            NodeKind::List => {
                let shape = resolve_shape(node)
                    .and_then(|shape| shape.as_list().copied())
                    .ok_or_else(|| WriteError::not_serializable(node.name()))?;
                let mut elements = Vec::new();
                (shape.visit)(value, &mut |element| {
                    elements.push(self.write_value(element, &node.args()[0])?);
                    Ok(())
                })?;
                Ok(Value::Array(elements))
            }
            NodeKind::Set => {
                let shape = resolve_shape(node)
                    .and_then(|shape| shape.as_set().copied())
                    .ok_or_else(|| WriteError::not_serializable(node.name()))?;
                let mut elements = Vec::new();
                (shape.visit)(value, &mut |element| {
                    elements.push(self.write_value(element, &node.args()[0])?);
                    Ok(())
                })?;
                Ok(Value::Array(elements))
            }
            NodeKind::Map => {
                let shape = resolve_shape(node)
                    .and_then(|shape| shape.as_map().copied())
                    .ok_or_else(|| WriteError::not_serializable(node.name()))?;
                let mut entries = Map::new();
                (shape.visit)(value, &mut |key, entry_value| {
                    let key = self.write_key(key, &node.args()[0])?;
                    entries.insert(key, self.write_value(entry_value, &node.args()[1])?);
                    Ok(())
                })?;
                Ok(Value::Object(entries))
            }
            NodeKind::Opaque => Err(WriteError::not_serializable(value.type_name())),
        }
    }

    // Renders a map key. String keys pass through; numeric and bool keys
    // stringify so they fit the document model's object keys.
    fn write_key(&self, key: &dyn Persist, node: &TypeNode) -> Result<String, WriteError> {
        match self.write_value(key, node)? {
            Value::String(key) => Ok(key),
            Value::Number(key) => Ok(key.to_string()),
            Value::Bool(key) => Ok(key.to_string()),
            _ => Err(WriteError::UnsupportedKey {
                type_name: node.name().into(),
            }),
        }
    }

    // Writes one identifiable object node: discriminator, version, then
    // every persisted readable property, then the custom hook.
    fn write_object(&self, value: &dyn Persist, meta: &TypeMeta) -> Result<Value, WriteError> {
        let mut node = Map::new();
        node.insert(TYPE_FIELD.to_owned(), Value::from(meta.id()));
        node.insert(VERSION_FIELD.to_owned(), Value::from(meta.version()));

        for property in meta.properties() {
            // Only persisted properties are written.
            let Some(field_id) = property.field_id() else {
                continue;
            };
            // A property without a getter can only be set, never read.
            let Some(getter) = property.getter() else {
                continue;
            };

            // Container shapes must be closed before the nested call.
            identify_shapes(property.node());

            let property_value = getter(value);
            node.insert(
                field_id.to_owned(),
                self.write_value(property_value, property.node())?,
            );
        }

        // Let the type augment or rewrite its node before it is emitted.
        if let Some(custom) = meta.get_trait::<TypeTraitCustom>() {
            custom.on_serialized(value, self, &mut node)?;
        }

        Ok(Value::Object(node))
    }
}
