#![doc = include_str!("../README.md")]

// -----------------------------------------------------------------------------
// Modules

pub mod blackboard;
pub mod error;
pub mod graph;
pub mod info;
pub mod persist;
pub mod serde;
pub mod shape;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use blackboard::Blackboard;
pub use error::{ReadError, WriteError};
pub use persist::{Persist, erased_inner, take_value};

// -----------------------------------------------------------------------------
// Test fixtures

#[cfg(test)]
pub(crate) mod fixtures;
