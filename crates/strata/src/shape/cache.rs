use std::sync::{LazyLock, PoisonError, RwLock};

use strata_utils::TypeIdMap;

use crate::info::TypeNode;
use crate::shape::Shape;
use crate::shape::receiver::receive_shape;

// -----------------------------------------------------------------------------
// Shape cache

// Stores closed container shapes as they are requested. Process-wide and
// append-only: entries are added on first use and never removed. First-insert
// races are idempotent since a closed type always yields an equivalent table.
static SHAPES: LazyLock<RwLock<TypeIdMap<Shape>>> =
    LazyLock::new(|| RwLock::new(TypeIdMap::new()));

fn cached(node: &TypeNode) -> Option<Shape> {
    SHAPES
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&node.closed_id())
        .copied()
}

/// Returns the closed shape for `node`, computing and caching it on first
/// request. Returns `None` for non-container nodes.
pub fn resolve_shape(node: &TypeNode) -> Option<Shape> {
    let getter = node.shape_getter()?;
    if let Some(shape) = cached(node) {
        return Some(shape);
    }
    let shape = receive_shape(getter);
    SHAPES
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .try_insert(node.closed_id(), || shape);
    Some(shape)
}

/// Recursively identifies and caches every container shape described by the
/// given type node.
///
/// Must be invoked before any read/write of a property whose declared type
/// is — or contains, at any depth — a generic container shape; both
/// conversion drivers call it per property. Re-identifying an
/// already-cached node is free.
pub fn identify_shapes(node: &TypeNode) {
    let Some(getter) = node.shape_getter() else {
        // Scalar or object node, nothing to close over.
        return;
    };

    if cached(node).is_some() {
        // We've already cached this container shape (and its arguments).
        return;
    }

    let shape = receive_shape(getter);
    SHAPES
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .try_insert(node.closed_id(), || shape);

    for argument in node.args() {
        identify_shapes(argument);
    }
}
