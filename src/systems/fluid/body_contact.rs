use crate::core::Vec2;
use crate::systems::rigid_body::Body;

use super::particle::Particle;

/// Push a particle (circle of `radius`) out of `body` and reflect its
/// approach velocity relative to the body surface. The body is not touched.
///
/// Returns `true` on contact.
pub(super) fn collide_particle(p: &mut Particle, body: &Body, radius: f32, restitution: f32) -> bool {
    let local = body.world_to_local(p.pos);
    let (hw, hh) = (body.half_width, body.half_height);

    let (normal_local, depth) = if local.x.abs() <= hw && local.y.abs() <= hh {
        // Center inside: leave through the nearest face.
        let dx = hw - local.x.abs();
        let dy = hh - local.y.abs();
        if dx < dy {
            (Vec2::new(sign(local.x), 0.0), dx + radius)
        } else {
            (Vec2::new(0.0, sign(local.y)), dy + radius)
        }
    } else {
        let closest = Vec2::new(local.x.clamp(-hw, hw), local.y.clamp(-hh, hh));
        let diff = local - closest;
        let dist = diff.length();
        if dist >= radius || dist <= 0.0 {
            return false;
        }
        (diff / dist, radius - dist)
    };

    let (sin, cos) = body.angle.sin_cos();
    let normal = normal_local.rotate_sc(sin, cos);
    if !normal.is_finite() || !depth.is_finite() {
        return false;
    }
    p.pos += normal * depth;

    let surface = body.velocity_at(p.pos - normal * radius);
    let rel = p.velocity - surface;
    let vn = rel.dot(normal);
    if vn < 0.0 {
        p.velocity -= normal * ((1.0 + restitution) * vn);
    }
    true
}

#[inline]
fn sign(v: f32) -> f32 {
    if v < 0.0 {
        -1.0
    } else {
        1.0
    }
}
