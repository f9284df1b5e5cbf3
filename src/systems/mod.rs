//! Systems - the simulation subsystems driven by the world step

pub mod fluid;
pub mod rigid_body;
pub mod rigid_body_system;

pub use fluid::{DropletParams, EmitOutcome, FluidSystem, Particle};
pub use rigid_body::{Body, BodyId, BodyParams};
pub use rigid_body_system::{CollisionStats, RigidBodySystem};
