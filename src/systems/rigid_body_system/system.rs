use crate::core::{Aabb, EngineError, Result, Vec2};
use crate::domain::SimConfig;
use crate::systems::rigid_body::{Body, BodyId, BodyParams};

use super::collision::{collide, Manifold};
use super::solver::{apply_impulses, correct_positions, ImpulseCache};

/// Outcome of one collision pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollisionStats {
    pub candidate_pairs: u32,
    pub contacts: u32,
    pub skipped: u32,
}

/// Owns every rigid body, in spawn (paint) order.
pub struct RigidBodySystem {
    bodies: Vec<Body>,
    next_id: u32,
    grabbed: Option<BodyId>,
    /// A drag arrived for the grabbed body during the current step.
    dragged: bool,
    manifolds: Vec<Manifold>,
    /// Contact impulses of the previous sub-step, for warm starting.
    impulses: ImpulseCache,
}

impl RigidBodySystem {
    pub fn new() -> Self {
        Self {
            bodies: Vec::new(),
            next_id: 1,
            grabbed: None,
            dragged: false,
            manifolds: Vec::new(),
            impulses: ImpulseCache::default(),
        }
    }

    /// Rebuild from restored bodies, keeping their ids.
    /// Adopt restored bodies, pulling any that stray outside `arena` back in.
    pub fn from_bodies(mut bodies: Vec<Body>, arena: &Aabb) -> Self {
        for body in bodies.iter_mut() {
            if place_inside(body, arena) {
                log::warn!("restored body {:?} was outside the arena, moved to {:?}", body.id, body.pos);
            }
        }
        let next_id = bodies.iter().map(|b| b.id.0).max().unwrap_or(0).saturating_add(1);
        Self { bodies, next_id, ..Self::new() }
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn bodies_mut(&mut self) -> &mut [Body] {
        &mut self.bodies
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn grabbed(&self) -> Option<BodyId> {
        self.grabbed
    }

    /// Validate and place a new body. Its rotated bounds must fit the arena;
    /// the position is then clamped so the body starts inside.
    pub fn spawn(&mut self, params: &BodyParams, arena: &Aabb) -> Result<BodyId> {
        params.validate()?;

        let id = BodyId(self.next_id);
        let mut body = Body::from_params(id, params);
        let ext = body.extents();
        if ext.x * 2.0 > arena.width() || ext.y * 2.0 > arena.height() {
            return Err(EngineError::invalid(format!(
                "body {}x{} does not fit the {}x{} arena",
                params.width,
                params.height,
                arena.width(),
                arena.height()
            )));
        }
        place_inside(&mut body, arena);

        self.next_id = self.next_id.saturating_add(1);
        log::debug!(
            "spawned body {:?} at ({:.1}, {:.1}) {}x{} static={}",
            id,
            body.pos.x,
            body.pos.y,
            params.width,
            params.height,
            body.is_static
        );
        self.bodies.push(body);
        Ok(id)
    }

    /// Semi-implicit Euler: `v += (g + F/m)·dt; x += v·dt; θ += ω·dt`.
    pub fn integrate(&mut self, dt: f32, gravity: Vec2) {
        for body in self.bodies.iter_mut() {
            if !body.is_simulated() {
                body.force = Vec2::ZERO;
                continue;
            }
            let accel = gravity + body.force * body.inv_mass();
            body.velocity += accel * dt;
            body.pos += body.velocity * dt;
            body.angle += body.angular_vel * dt;
            body.force = Vec2::ZERO;
        }
    }

    /// Narrow phase over broad-phase `pairs`, then impulses and correction.
    pub fn resolve_collisions(
        &mut self,
        pairs: &[(usize, usize)],
        config: &SimConfig,
        dt: f32,
    ) -> CollisionStats {
        let mut stats = CollisionStats {
            candidate_pairs: pairs.len() as u32,
            ..CollisionStats::default()
        };

        self.manifolds.clear();
        for &(i, j) in pairs {
            let (Some(a), Some(b)) = (self.bodies.get(i), self.bodies.get(j)) else {
                continue;
            };
            if a.inv_mass() + b.inv_mass() <= 0.0 {
                continue;
            }
            if !a.is_finite() || !b.is_finite() {
                log::warn!("skipping pair {:?}/{:?}: non-finite state", a.id, b.id);
                stats.skipped += 1;
                continue;
            }
            if let Some(m) = collide(i, a, j, b) {
                if m.normal.is_finite() {
                    stats.contacts += m.count as u32;
                    self.manifolds.push(m);
                } else {
                    log::warn!("skipping pair {:?}/{:?}: degenerate normal", a.id, b.id);
                    stats.skipped += 1;
                }
            }
        }

        stats.skipped +=
            apply_impulses(&mut self.bodies, &self.manifolds, &mut self.impulses, config, dt);
        correct_positions(&mut self.bodies, &self.manifolds, config);
        stats
    }

    /// Put body `id` at `target` (clamped to the arena). A dynamic body takes
    /// the displacement over `dt` as its velocity so a release throws it.
    pub fn move_body(&mut self, id: BodyId, target: Vec2, dt: f32, arena: &Aabb) -> bool {
        if !target.is_finite() {
            return false;
        }
        let Some(body) = self.bodies.iter_mut().find(|b| b.id == id) else {
            return false;
        };
        let from = body.pos;
        body.pos = target;
        place_inside(body, arena);
        if !body.is_immovable() && dt > 0.0 {
            body.velocity = (body.pos - from) / dt;
            body.angular_vel = 0.0;
        }
        if self.grabbed == Some(id) {
            self.dragged = true;
        }
        true
    }

    /// Grab the topmost body under `point`.
    pub fn grab_at(&mut self, point: Vec2) -> Option<BodyId> {
        self.release();
        let idx = self.index_at(point)?;
        let body = &mut self.bodies[idx];
        body.grabbed = true;
        body.velocity = Vec2::ZERO;
        body.angular_vel = 0.0;
        self.grabbed = Some(body.id);
        self.dragged = false;
        Some(body.id)
    }

    /// Drag the grabbed body, if any.
    pub fn drag_grabbed(&mut self, target: Vec2, dt: f32, arena: &Aabb) -> bool {
        match self.grabbed {
            Some(id) => self.move_body(id, target, dt, arena),
            None => false,
        }
    }

    /// Hand the grabbed body back to the simulation with its drag velocity.
    pub fn release(&mut self) -> Option<BodyId> {
        let id = self.grabbed.take()?;
        if let Some(body) = self.bodies.iter_mut().find(|b| b.id == id) {
            body.grabbed = false;
        }
        self.dragged = false;
        Some(id)
    }

    /// Called once per step: a grabbed body that was not dragged stops.
    pub fn end_step(&mut self) {
        if let Some(id) = self.grabbed {
            if !self.dragged {
                if let Some(body) = self.bodies.iter_mut().find(|b| b.id == id) {
                    body.velocity = Vec2::ZERO;
                    body.angular_vel = 0.0;
                }
            }
        }
        self.dragged = false;
    }

    /// Remove the topmost body containing `point`.
    pub fn delete_at(&mut self, point: Vec2) -> Option<BodyId> {
        let idx = self.index_at(point)?;
        let body = self.bodies.remove(idx);
        if self.grabbed == Some(body.id) {
            self.grabbed = None;
            self.dragged = false;
        }
        log::debug!("deleted body {:?}", body.id);
        Some(body.id)
    }

    /// Topmost body containing `point`, without mutation.
    pub fn body_at(&self, point: Vec2) -> Option<&Body> {
        self.index_at(point).map(|i| &self.bodies[i])
    }

    pub fn clear(&mut self) {
        self.bodies.clear();
        self.manifolds.clear();
        self.impulses.clear();
        self.grabbed = None;
        self.dragged = false;
        self.next_id = 1;
    }

    fn index_at(&self, point: Vec2) -> Option<usize> {
        if !point.is_finite() {
            return None;
        }
        self.bodies.iter().rposition(|b| b.contains_point(point))
    }
}

impl Default for RigidBodySystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Clamp the center so the rotated bounds lie inside `arena`; centered on an
/// axis where the body is too large.
pub(crate) fn place_inside(body: &mut Body, arena: &Aabb) -> bool {
    let before = body.pos;
    body.pos = arena.confine(body.pos, body.extents());
    body.pos != before
}
