//! Core - math primitives, errors and the deterministic RNG shared by every system.

pub mod aabb;
pub mod error;
pub mod random;
pub mod vec2;

pub use aabb::Aabb;
pub use error::{EngineError, Result};
pub use random::XorShift32;
pub use vec2::Vec2;
