use core::any::TypeId;
use core::hash::Hash;

use crate::persist::Persist;
use crate::shape::{Shape, ShapeReceiver};

// -----------------------------------------------------------------------------
// NodeKind

/// A pure enumeration of the kinds of declared type a [`TypeNode`] can
/// describe.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NodeKind {
    /// A scalar, an identifiable object type, or a polymorphic slot.
    Opaque,
    /// An ordered sequence (`Vec<T>`).
    List,
    /// A unique-element set (`HashSet<T>`).
    Set,
    /// A key-value map (`HashMap<K, V>`).
    Map,
    /// A nullable slot (`Option<T>`).
    Nullable,
}

// -----------------------------------------------------------------------------
// TypeNode

/// A possibly-recursive description of a declared type.
///
/// A node pairs the closed type's [`TypeId`] with its kind and — for generic
/// kinds — the argument nodes and a monomorphized callback that deposits the
/// closed container [`Shape`] into a [`ShapeReceiver`]. The callback is the
/// reflection-free replacement for runtime type-argument discovery: it was
/// compiled where the arguments were statically known.
///
/// # Examples
///
/// ```
/// use strata::info::{NodeKind, TypeNode};
///
/// let node = TypeNode::list::<String>(TypeNode::of::<String>());
/// assert_eq!(node.kind(), NodeKind::List);
/// assert_eq!(node.args().len(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct TypeNode {
    closed_id: TypeId,
    name: &'static str,
    kind: NodeKind,
    args: Box<[TypeNode]>,
    shape_getter: Option<fn(&mut ShapeReceiver)>,
}

impl TypeNode {
    /// A leaf node: a scalar or an identifiable object type.
    pub fn of<T: Persist>() -> Self {
        Self {
            closed_id: TypeId::of::<T>(),
            name: core::any::type_name::<T>(),
            kind: NodeKind::Opaque,
            args: Box::new([]),
            shape_getter: None,
        }
    }

    /// A polymorphic slot (`Box<dyn Persist>`).
    ///
    /// The slot's runtime type is recovered from the document's embedded
    /// discriminator rather than from the declaration.
    pub fn dynamic() -> Self {
        Self {
            closed_id: TypeId::of::<Box<dyn Persist>>(),
            name: "dyn Persist",
            kind: NodeKind::Opaque,
            args: Box::new([]),
            shape_getter: None,
        }
    }

    /// An ordered sequence node (`Vec<T>`), with `element` describing `T`.
    pub fn list<T: Persist + PartialEq>(element: TypeNode) -> Self {
        fn getter<T: Persist + PartialEq>(receiver: &mut ShapeReceiver) {
            receiver.accept(Shape::list_of::<T>());
        }
        Self {
            closed_id: TypeId::of::<Vec<T>>(),
            name: core::any::type_name::<Vec<T>>(),
            kind: NodeKind::List,
            args: Box::new([element]),
            shape_getter: Some(getter::<T>),
        }
    }

    /// A unique-element set node (`HashSet<T>`), with `element` describing
    /// `T`.
    pub fn set<T: Persist + Eq + Hash>(element: TypeNode) -> Self {
        fn getter<T: Persist + Eq + Hash>(receiver: &mut ShapeReceiver) {
            receiver.accept(Shape::set_of::<T>());
        }
        Self {
            closed_id: TypeId::of::<std::collections::HashSet<T>>(),
            name: core::any::type_name::<std::collections::HashSet<T>>(),
            kind: NodeKind::Set,
            args: Box::new([element]),
            shape_getter: Some(getter::<T>),
        }
    }

    /// A key-value map node (`HashMap<K, V>`), with `key` and `value`
    /// describing the arguments.
    pub fn map<K, V>(key: TypeNode, value: TypeNode) -> Self
    where
        K: Persist + Eq + Hash,
        V: Persist + PartialEq,
    {
        fn getter<K, V>(receiver: &mut ShapeReceiver)
        where
            K: Persist + Eq + Hash,
            V: Persist + PartialEq,
        {
            receiver.accept(Shape::map_of::<K, V>());
        }
        Self {
            closed_id: TypeId::of::<std::collections::HashMap<K, V>>(),
            name: core::any::type_name::<std::collections::HashMap<K, V>>(),
            kind: NodeKind::Map,
            args: Box::new([key, value]),
            shape_getter: Some(getter::<K, V>),
        }
    }

    /// A nullable slot node (`Option<T>`), with `inner` describing `T`.
    pub fn nullable<T: Persist + PartialEq>(inner: TypeNode) -> Self {
        fn getter<T: Persist + PartialEq>(receiver: &mut ShapeReceiver) {
            receiver.accept(Shape::nullable_of::<T>());
        }
        Self {
            closed_id: TypeId::of::<Option<T>>(),
            name: core::any::type_name::<Option<T>>(),
            kind: NodeKind::Nullable,
            args: Box::new([inner]),
            shape_getter: Some(getter::<T>),
        }
    }

    /// Returns the [`TypeId`] of the closed declared type.
    #[inline]
    pub fn closed_id(&self) -> TypeId {
        self.closed_id
    }

    /// Returns the closed type's name, for diagnostics.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the node's kind.
    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Returns the type-argument nodes, in declaration order.
    #[inline]
    pub fn args(&self) -> &[TypeNode] {
        &self.args
    }

    /// Returns the shape callback, present only for generic kinds.
    #[inline]
    pub fn shape_getter(&self) -> Option<fn(&mut ShapeReceiver)> {
        self.shape_getter
    }

    /// Returns the container node this declaration ultimately describes:
    /// the node itself for container kinds, the inner node for a nullable
    /// declaration wrapping a container, and `None` otherwise.
    ///
    /// Used by the deserializer's "missing collection ⇒ empty" policy.
    pub fn container_node(&self) -> Option<&TypeNode> {
        match self.kind {
            NodeKind::List | NodeKind::Set | NodeKind::Map => Some(self),
            NodeKind::Nullable => {
                let inner = &self.args[0];
                matches!(inner.kind, NodeKind::List | NodeKind::Set | NodeKind::Map)
                    .then_some(inner)
            }
            NodeKind::Opaque => None,
        }
    }
}
