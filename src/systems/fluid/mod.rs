//! FluidSystem - particle fluid with density-based pair forces
//!
//! Each sub-step: densities, pair forces (gathered in parallel with the
//! `parallel` feature), gravity, semi-implicit Euler and a speed cap, then a
//! one-sided push out of rigid bodies.

mod body_contact;
mod forces;
mod particle;
mod system;

pub use forces::{pair_force, ForceParams, Sample};
pub use particle::Particle;
pub use system::{DropletParams, EmitOutcome, Emitter, FluidSystem};
