//! RigidBodySystem - rectangles under gravity, contacts and friction
//!
//! Per sub-step:
//! - integrate: semi-implicit Euler for every simulated body
//! - collide: SAT on face normals, contact manifold by face clipping
//! - solve: sequential impulses, then partial positional correction
//!
//! Static, zero-mass and grabbed bodies act as infinite mass.

mod collision;
mod solver;
mod system;

pub use collision::Manifold;
pub use system::{CollisionStats, RigidBodySystem};
