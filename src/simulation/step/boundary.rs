use crate::core::{Aabb, Vec2};
use crate::domain::materials::particle_radius;
use crate::systems::rigid_body::Body;
use crate::systems::Particle;

use super::WorldCore;

pub(super) fn clamp_to_arena(world: &mut WorldCore) {
    let arena = world.arena;
    clamp_bodies(world.bodies.bodies_mut(), &arena);
    clamp_particles(world.fluid.particles_mut(), &arena, world.config.particle_restitution);
}

/// Push simulated bodies back inside, reflecting outward velocity by their elasticity.
/// Static and grabbed bodies were placed inside when they were spawned or moved.
pub(super) fn clamp_bodies(bodies: &mut [Body], arena: &Aabb) {
    for body in bodies.iter_mut().filter(|b| b.is_simulated()) {
        let ext = body.extents();
        let e = body.elasticity;
        let (x, vx) = clamp_axis(body.pos.x, body.velocity.x, ext.x, arena.min.x, arena.max.x, e);
        let (y, vy) = clamp_axis(body.pos.y, body.velocity.y, ext.y, arena.min.y, arena.max.y, e);
        body.pos = Vec2::new(x, y);
        body.velocity = Vec2::new(vx, vy);
    }
}

pub(super) fn clamp_particles(particles: &mut [Particle], arena: &Aabb, restitution: f32) {
    let r = particle_radius();
    for p in particles.iter_mut() {
        let (x, vx) = clamp_axis(p.pos.x, p.velocity.x, r, arena.min.x, arena.max.x, restitution);
        let (y, vy) = clamp_axis(p.pos.y, p.velocity.y, r, arena.min.y, arena.max.y, restitution);
        p.pos = Vec2::new(x, y);
        p.velocity = Vec2::new(vx, vy);
    }
}

/// Keep `[v - half, v + half]` inside `[lo, hi]`. Velocity heading out of a
/// wall that was hit is reflected and scaled by `bounce`.
fn clamp_axis(v: f32, vel: f32, half: f32, lo: f32, hi: f32, bounce: f32) -> (f32, f32) {
    if !v.is_finite() {
        return ((lo + hi) * 0.5, 0.0);
    }
    if half * 2.0 >= hi - lo {
        return ((lo + hi) * 0.5, 0.0);
    }
    if v - half < lo {
        (lo + half, if vel < 0.0 { -vel * bounce } else { vel })
    } else if v + half > hi {
        (hi - half, if vel > 0.0 { -vel * bounce } else { vel })
    } else {
        (v, vel)
    }
}
