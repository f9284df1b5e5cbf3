//! Body - a rigid rectangle that moves and rotates as a unit
//!
//! The shape is stored as half-extents around the center of mass and
//! transformed to world space through position and orientation.

mod body;
mod params;

pub use body::{Body, BodyId};
pub use params::BodyParams;
