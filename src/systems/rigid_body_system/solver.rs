use std::collections::HashMap;

use crate::core::Vec2;
use crate::domain::SimConfig;
use crate::systems::rigid_body::{Body, BodyId};

use super::collision::Manifold;

const EPSILON: f32 = 1.0e-9;
/// Above this condition number the two-point block solve falls back to
/// solving the points one at a time.
const MAX_CONDITION: f32 = 1000.0;

/// Accumulated impulses of one manifold, carried to the next sub-step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(super) struct CachedImpulses {
    count: usize,
    normal: [f32; 2],
    tangent: [f32; 2],
}

pub(super) type ImpulseCache = HashMap<(BodyId, BodyId), CachedImpulses>;

#[derive(Clone, Copy, Default)]
struct ContactPoint {
    ra: Vec2,
    rb: Vec2,
    normal_mass: f32,
    tangent_mass: f32,
    /// Separation speed the contact should end with (restitution).
    bounce: f32,
    normal_impulse: f32,
    tangent_impulse: f32,
}

/// 2x2 normal-mass matrix of a two-point manifold.
#[derive(Clone, Copy)]
struct Block {
    k11: f32,
    k12: f32,
    k22: f32,
    det: f32,
}

struct Constraint {
    a: usize,
    b: usize,
    normal: Vec2,
    mu_s: f32,
    mu_d: f32,
    points: [ContactPoint; 2],
    count: usize,
    block: Option<Block>,
}

/// Mutable access to two distinct bodies.
fn pair_mut(bodies: &mut [Body], a: usize, b: usize) -> Option<(&mut Body, &mut Body)> {
    if a == b || a >= bodies.len() || b >= bodies.len() {
        return None;
    }
    if a < b {
        let (lo, hi) = bodies.split_at_mut(b);
        Some((&mut lo[a], &mut hi[0]))
    } else {
        let (lo, hi) = bodies.split_at_mut(a);
        Some((&mut hi[0], &mut lo[b]))
    }
}

fn inverse_k(a: &Body, b: &Body, ra: Vec2, rb: Vec2, dir: Vec2) -> f32 {
    let ra_d = ra.cross(dir);
    let rb_d = rb.cross(dir);
    a.inv_mass() + b.inv_mass() + ra_d * ra_d * a.inv_inertia() + rb_d * rb_d * b.inv_inertia()
}

fn effective_mass(a: &Body, b: &Body, ra: Vec2, rb: Vec2, dir: Vec2) -> f32 {
    let k = inverse_k(a, b, ra, rb, dir);
    if k > EPSILON && k.is_finite() {
        1.0 / k
    } else {
        0.0
    }
}

#[inline]
fn relative_velocity(a: &Body, b: &Body, cp: &ContactPoint) -> Vec2 {
    b.velocity + Vec2::cross_scalar(b.angular_vel, cp.rb)
        - a.velocity
        - Vec2::cross_scalar(a.angular_vel, cp.ra)
}

/// Sequential impulses with accumulated clamping and warm starting,
/// `solver_iterations` passes over every manifold.
///
/// Elasticity combines by minimum, friction by `config.friction_rule`.
/// Approach speeds below `2·|g|·dt` do not bounce so stacks can settle.
/// Returns the number of contact points skipped as degenerate.
pub(super) fn apply_impulses(
    bodies: &mut [Body],
    manifolds: &[Manifold],
    cache: &mut ImpulseCache,
    config: &SimConfig,
    dt: f32,
) -> u32 {
    let resting_speed = 2.0 * config.gravity.length() * dt;
    let mut skipped = 0;
    let mut constraints = Vec::with_capacity(manifolds.len());

    for m in manifolds {
        let Some((a, b)) = pair_mut(bodies, m.a, m.b) else {
            continue;
        };
        if a.inv_mass() + b.inv_mass() <= 0.0 {
            continue;
        }
        let elasticity = a.elasticity.min(b.elasticity);
        let tangent = m.normal.perp();
        let mut c = Constraint {
            a: m.a,
            b: m.b,
            normal: m.normal,
            mu_s: config.friction_rule.combine(a.static_friction, b.static_friction),
            mu_d: config.friction_rule.combine(a.dynamic_friction, b.dynamic_friction),
            points: [ContactPoint::default(); 2],
            count: 0,
            block: None,
        };
        for (point, _) in m.contacts() {
            let ra = point - a.pos;
            let rb = point - b.pos;
            let normal_mass = effective_mass(a, b, ra, rb, m.normal);
            let vn = (b.velocity_at(point) - a.velocity_at(point)).dot(m.normal);
            if normal_mass <= 0.0 || !vn.is_finite() {
                log::warn!("skipping degenerate contact between {:?} and {:?}", a.id, b.id);
                skipped += 1;
                continue;
            }
            c.points[c.count] = ContactPoint {
                ra,
                rb,
                normal_mass,
                tangent_mass: effective_mass(a, b, ra, rb, tangent),
                bounce: if -vn > resting_speed { -vn * elasticity } else { 0.0 },
                normal_impulse: 0.0,
                tangent_impulse: 0.0,
            };
            c.count += 1;
        }
        if c.count == 0 {
            continue;
        }

        if c.count == 2 {
            let (p1, p2) = (&c.points[0], &c.points[1]);
            let n = m.normal;
            let (r1a, r1b) = (p1.ra.cross(n), p1.rb.cross(n));
            let (r2a, r2b) = (p2.ra.cross(n), p2.rb.cross(n));
            let (ia, ib) = (a.inv_inertia(), b.inv_inertia());
            let inv = a.inv_mass() + b.inv_mass();
            let k11 = inv + ia * r1a * r1a + ib * r1b * r1b;
            let k22 = inv + ia * r2a * r2a + ib * r2b * r2b;
            let k12 = inv + ia * r1a * r2a + ib * r1b * r2b;
            let det = k11 * k22 - k12 * k12;
            if k11 * k11 < MAX_CONDITION * det {
                c.block = Some(Block { k11, k12, k22, det });
            }
        }

        // Warm start from the previous sub-step when the manifold shape held.
        if let Some(prev) = cache.get(&(a.id, b.id)) {
            if prev.count == c.count {
                for (k, cp) in c.points[..c.count].iter_mut().enumerate() {
                    cp.normal_impulse = prev.normal[k];
                    cp.tangent_impulse = prev.tangent[k];
                    let p = m.normal * cp.normal_impulse + tangent * cp.tangent_impulse;
                    a.apply_impulse(-p, cp.ra);
                    b.apply_impulse(p, cp.rb);
                }
            }
        }
        constraints.push(c);
    }

    for _ in 0..config.solver_iterations {
        for c in constraints.iter_mut() {
            let Some((a, b)) = pair_mut(bodies, c.a, c.b) else {
                continue;
            };
            solve_friction(a, b, c);
            match c.block {
                Some(block) => solve_normal_block(a, b, c, block),
                None => solve_normal_sequential(a, b, c),
            }
        }
    }

    cache.clear();
    for c in &constraints {
        let mut cached = CachedImpulses { count: c.count, ..CachedImpulses::default() };
        for (k, cp) in c.points[..c.count].iter().enumerate() {
            cached.normal[k] = cp.normal_impulse;
            cached.tangent[k] = cp.tangent_impulse;
        }
        cache.insert((bodies[c.a].id, bodies[c.b].id), cached);
    }
    skipped
}

/// Coulomb friction: stick within the static cone, slide at the dynamic one.
fn solve_friction(a: &mut Body, b: &mut Body, c: &mut Constraint) {
    let tangent = c.normal.perp();
    for cp in c.points[..c.count].iter_mut() {
        if cp.tangent_mass <= 0.0 {
            continue;
        }
        let vt = relative_velocity(a, b, cp).dot(tangent);
        let wanted = cp.tangent_impulse - cp.tangent_mass * vt;
        let total = if wanted.abs() <= c.mu_s * cp.normal_impulse {
            wanted
        } else {
            let limit = c.mu_d * cp.normal_impulse;
            wanted.clamp(-limit, limit)
        };
        let delta = total - cp.tangent_impulse;
        cp.tangent_impulse = total;
        let p = tangent * delta;
        a.apply_impulse(-p, cp.ra);
        b.apply_impulse(p, cp.rb);
    }
}

/// One point at a time; accumulated impulse never pulls bodies together.
fn solve_normal_sequential(a: &mut Body, b: &mut Body, c: &mut Constraint) {
    let n = c.normal;
    for cp in c.points[..c.count].iter_mut() {
        let vn = relative_velocity(a, b, cp).dot(n);
        let total = (cp.normal_impulse + cp.normal_mass * (cp.bounce - vn)).max(0.0);
        let delta = total - cp.normal_impulse;
        cp.normal_impulse = total;
        let p = n * delta;
        a.apply_impulse(-p, cp.ra);
        b.apply_impulse(p, cp.rb);
    }
}

/// Both points at once (2x2 mixed LCP, enumerating the four cases).
fn solve_normal_block(a: &mut Body, b: &mut Body, c: &mut Constraint, k: Block) {
    let n = c.normal;
    let [p1, p2] = &c.points;
    let (a1, a2) = (p1.normal_impulse, p2.normal_impulse);
    let vn1 = relative_velocity(a, b, p1).dot(n);
    let vn2 = relative_velocity(a, b, p2).dot(n);
    let b1 = vn1 - p1.bounce - (k.k11 * a1 + k.k12 * a2);
    let b2 = vn2 - p2.bounce - (k.k12 * a1 + k.k22 * a2);

    let candidates = [
        // Both points active.
        (-(k.k22 * b1 - k.k12 * b2) / k.det, -(k.k11 * b2 - k.k12 * b1) / k.det),
        // Only the first.
        (-b1 / k.k11, 0.0),
        // Only the second.
        (0.0, -b2 / k.k22),
        // Neither.
        (0.0, 0.0),
    ];
    let solution = candidates.into_iter().find(|&(x1, x2)| {
        let v1 = k.k11 * x1 + k.k12 * x2 + b1;
        let v2 = k.k12 * x1 + k.k22 * x2 + b2;
        x1 >= 0.0
            && x2 >= 0.0
            && (x1 > 0.0 || v1 >= -EPSILON.sqrt())
            && (x2 > 0.0 || v2 >= -EPSILON.sqrt())
    });
    let Some((x1, x2)) = solution else {
        // No consistent case (numerical trouble): keep the old impulses.
        return;
    };
    if !x1.is_finite() || !x2.is_finite() {
        return;
    }

    let (d1, d2) = (x1 - a1, x2 - a2);
    c.points[0].normal_impulse = x1;
    c.points[1].normal_impulse = x2;
    for (cp, d) in c.points.iter().zip([d1, d2]) {
        let p = n * d;
        a.apply_impulse(-p, cp.ra);
        b.apply_impulse(p, cp.rb);
    }
}

/// Baumgarte correction: push apart by a fraction of the depth beyond the slop,
/// split by inverse mass.
pub(super) fn correct_positions(bodies: &mut [Body], manifolds: &[Manifold], config: &SimConfig) {
    for m in manifolds {
        let Some((a, b)) = pair_mut(bodies, m.a, m.b) else {
            continue;
        };
        let (inv_a, inv_b) = (a.inv_mass(), b.inv_mass());
        let inv_sum = inv_a + inv_b;
        if inv_sum <= 0.0 {
            continue;
        }
        let excess = (m.max_depth() - config.penetration_slop).max(0.0);
        if excess <= 0.0 {
            continue;
        }
        let correction = m.normal * (config.correction_factor * excess / inv_sum);
        if !correction.is_finite() {
            continue;
        }
        a.pos -= correction * inv_a;
        b.pos += correction * inv_b;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::rigid_body::BodyParams;

    fn free_body(id: u32, x: f32, vx: f32) -> Body {
        let params = BodyParams::new(Vec2::new(x, 0.0), 10.0, 10.0)
            .with_elasticity(1.0)
            .with_friction(0.0, 0.0);
        let mut b = Body::from_params(BodyId(id), &params);
        b.velocity = Vec2::new(vx, 0.0);
        b
    }

    fn head_on() -> (Vec<Body>, Manifold) {
        let bodies = vec![free_body(1, 0.0, 100.0), free_body(2, 9.0, -100.0)];
        let manifold = Manifold {
            a: 0,
            b: 1,
            normal: Vec2::new(1.0, 0.0),
            points: [Vec2::new(4.5, -5.0), Vec2::new(4.5, 5.0)],
            depths: [1.0, 1.0],
            count: 2,
        };
        (bodies, manifold)
    }

    fn no_gravity() -> SimConfig {
        SimConfig { gravity: Vec2::ZERO, ..SimConfig::default() }
    }

    #[test]
    fn elastic_head_on_swaps_velocities() {
        let (mut bodies, m) = head_on();
        let config = no_gravity();
        let mut cache = ImpulseCache::default();
        apply_impulses(&mut bodies, &[m], &mut cache, &config, config.sub_step_dt());
        assert!((bodies[0].velocity.x + 100.0).abs() < 0.1, "{:?}", bodies[0].velocity);
        assert!((bodies[1].velocity.x - 100.0).abs() < 0.1, "{:?}", bodies[1].velocity);
        let p: f32 = bodies.iter().map(|b| b.velocity.x * b.mass).sum();
        assert!(p.abs() < 1e-3);
        assert!(cache.contains_key(&(BodyId(1), BodyId(2))));
    }

    #[test]
    fn sequential_path_matches_block_result() {
        let (mut bodies, mut m) = head_on();
        // Single point through the center: no block, no torque.
        m.points = [Vec2::new(4.5, 0.0), Vec2::ZERO];
        m.count = 1;
        let config = no_gravity();
        apply_impulses(&mut bodies, &[m], &mut ImpulseCache::default(), &config, 1.0 / 120.0);
        assert!((bodies[0].velocity.x + 100.0).abs() < 1e-3);
        assert!((bodies[1].velocity.x - 100.0).abs() < 1e-3);
    }

    #[test]
    fn friction_stops_sliding_within_static_cone() {
        let (mut bodies, m) = head_on();
        for b in bodies.iter_mut() {
            b.elasticity = 0.0;
            b.static_friction = 1.0;
            b.dynamic_friction = 1.0;
        }
        bodies[0].velocity.y = 5.0;
        let config = SimConfig { solver_iterations: 10, ..no_gravity() };
        apply_impulses(&mut bodies, &[m], &mut ImpulseCache::default(), &config, 1.0 / 120.0);
        for (point, _) in m.contacts() {
            let slip = bodies[1].velocity_at(point).y - bodies[0].velocity_at(point).y;
            assert!(slip.abs() < 0.1, "slip {slip}");
        }
    }

    #[test]
    fn correction_is_partial_and_split_by_mass() {
        let (mut bodies, m) = head_on();
        let config = SimConfig::default();
        correct_positions(&mut bodies, &[m], &config);
        let gap_opened = bodies[1].pos.x - bodies[0].pos.x - 9.0;
        let expected = config.correction_factor * (1.0 - config.penetration_slop);
        assert!((gap_opened - expected).abs() < 1e-4);
        assert!((bodies[0].pos.x + expected * 0.5).abs() < 1e-4);
    }

    #[test]
    fn immovable_pair_is_left_alone() {
        let (mut bodies, m) = head_on();
        bodies[0].is_static = true;
        bodies[1].grabbed = true;
        let before = bodies.clone();
        let mut cache = ImpulseCache::default();
        apply_impulses(&mut bodies, &[m], &mut cache, &SimConfig::default(), 1.0 / 120.0);
        correct_positions(&mut bodies, &[m], &SimConfig::default());
        assert_eq!(bodies, before);
        assert!(cache.is_empty());
    }
}
