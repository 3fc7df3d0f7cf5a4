//! Reflection-free closing of generic container shapes.
//!
//! The conversion machinery operates on closed (fully concrete) container
//! shapes, but discovering type arguments at the conversion call site is off
//! the table: the engine targets ahead-of-time compiled, trimmed builds where
//! runtime type-argument discovery is unavailable. Instead, every generic
//! [`TypeNode`](crate::info::TypeNode) carries a monomorphized callback that
//! hands the resolver a [`Shape`] — a function table over the closed
//! container type — through a per-thread [`ShapeReceiver`].
//!
//! Shapes are computed at most once per closed type and cached process-wide;
//! repeated requests are free. [`identify_shapes`] must run before any
//! read/write of a property whose declared type is, or contains at any
//! depth, a generic container — both conversion drivers warm the cache per
//! property.

// -----------------------------------------------------------------------------
// Modules

mod cache;
mod receiver;
mod shapes;

// -----------------------------------------------------------------------------
// Exports

pub use cache::{identify_shapes, resolve_shape};
pub use receiver::ShapeReceiver;
pub use shapes::{ListShape, MapShape, NullableShape, SetShape, Shape};
