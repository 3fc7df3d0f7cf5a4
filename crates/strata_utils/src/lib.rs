#![doc = include_str!("../README.md")]

// -----------------------------------------------------------------------------
// Modules

pub mod hash;

mod typeid_map;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use typeid_map::TypeIdMap;
