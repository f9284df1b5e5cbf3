//! Spatial - broad-phase acceleration structures

pub mod grid;

pub use grid::{CellQuery, EntityHandle, SpatialIndex};
