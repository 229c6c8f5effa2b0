//! Domain layer types and invariants.

pub mod error;
pub mod graph;
pub mod render;
pub mod types;
