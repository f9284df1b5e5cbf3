use std::f32::consts::TAU;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::{Aabb, EngineError, Result, Vec2, XorShift32};
use crate::domain::materials::{
    particle_radius, DEFAULT_FLUID_COLOR, DEFAULT_FLUID_DENSITY, MAX_FLUID_DENSITY, MIN_FLUID_DENSITY,
};
use crate::domain::{Color, SimConfig};
use crate::spatial::SpatialIndex;
use crate::systems::rigid_body::Body;

use super::body_contact::collide_particle;
use super::forces::{kernel, pair_force, ForceParams, Sample};
use super::particle::Particle;

const DEFAULT_RNG_SEED: u32 = 0x2545_F491;
/// Droplet cluster radius grows with the square root of its particle count.
const CLUSTER_SPREAD: f32 = 1.2;

/// What a droplet is made of.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DropletParams {
    pub count: u32,
    /// g/cm³
    pub density: f32,
    pub color: Color,
}

impl Default for DropletParams {
    fn default() -> Self {
        Self { count: 10, density: DEFAULT_FLUID_DENSITY, color: DEFAULT_FLUID_COLOR }
    }
}

impl DropletParams {
    pub fn validate(&self) -> Result<()> {
        if self.count == 0 {
            return Err(EngineError::invalid("droplet particle count must be > 0"));
        }
        if !(MIN_FLUID_DENSITY..=MAX_FLUID_DENSITY).contains(&self.density) {
            return Err(EngineError::invalid(format!(
                "fluid density must be in [{MIN_FLUID_DENSITY}, {MAX_FLUID_DENSITY}], got {}",
                self.density
            )));
        }
        Ok(())
    }
}

/// Result of one emission. Particles beyond the cap are dropped, not an error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmitOutcome {
    pub emitted: u32,
    pub dropped: u32,
}

/// Continuous emission state: one droplet per step while active.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Emitter {
    pub position: Vec2,
    pub droplet: DropletParams,
}

/// Owns every fluid particle.
pub struct FluidSystem {
    particles: Vec<Particle>,
    next_group: u32,
    rng: XorShift32,
    emitter: Option<Emitter>,
    samples: Vec<Sample>,
    densities: Vec<(f32, f32)>,
    forces: Vec<Vec2>,
}

impl FluidSystem {
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_RNG_SEED)
    }

    pub fn with_seed(seed: u32) -> Self {
        Self {
            particles: Vec::new(),
            next_group: 0,
            rng: XorShift32::new(seed),
            emitter: None,
            samples: Vec::new(),
            densities: Vec::new(),
            forces: Vec::new(),
        }
    }

    /// Replace all particles (restore from a save).
    pub fn replace_particles(&mut self, particles: Vec<Particle>) {
        self.next_group = particles.iter().map(|p| p.group).max().map_or(0, |g| g.saturating_add(1));
        self.particles = particles;
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn emitter(&self) -> Option<&Emitter> {
        self.emitter.as_ref()
    }

    /// Emit a droplet of `droplet.count` particles jittered around `cursor`.
    ///
    /// Particles that would exceed `max_particles` are dropped and reported.
    pub fn emit_droplet(
        &mut self,
        cursor: Vec2,
        droplet: &DropletParams,
        arena: &Aabb,
        max_particles: usize,
    ) -> Result<EmitOutcome> {
        droplet.validate()?;
        if !cursor.is_finite() {
            return Err(EngineError::invalid("droplet position must be finite"));
        }

        let room = max_particles.saturating_sub(self.particles.len());
        let emitted = (droplet.count as usize).min(room) as u32;
        let outcome = EmitOutcome { emitted, dropped: droplet.count - emitted };
        if outcome.dropped > 0 {
            log::debug!(
                "particle cap {} reached, dropped {} of {}",
                max_particles,
                outcome.dropped,
                droplet.count
            );
        }
        if emitted == 0 {
            return Ok(outcome);
        }

        let r = particle_radius();
        let spread = r * (droplet.count as f32).sqrt() * CLUSTER_SPREAD;
        let group = self.next_group;
        self.next_group = self.next_group.wrapping_add(1);

        self.particles.reserve(emitted as usize);
        for _ in 0..emitted {
            let angle = self.rng.range(0.0, TAU);
            let dist = spread * self.rng.next_f32().sqrt();
            let pos = arena.confine(cursor + Vec2::from_angle(angle) * dist, Vec2::new(r, r));
            self.particles.push(Particle::new(pos, droplet.density, droplet.color, group));
        }
        log::debug!("emitted droplet {} of {} particles at {:?}", group, emitted, cursor);
        Ok(outcome)
    }

    pub fn start_emitting(&mut self, position: Vec2, droplet: DropletParams) -> Result<()> {
        droplet.validate()?;
        if !position.is_finite() {
            return Err(EngineError::invalid("emitter position must be finite"));
        }
        self.emitter = Some(Emitter { position, droplet });
        Ok(())
    }

    pub fn move_emitter(&mut self, position: Vec2) -> bool {
        match self.emitter.as_mut() {
            Some(e) if position.is_finite() => {
                e.position = position;
                true
            }
            _ => false,
        }
    }

    pub fn stop_emitting(&mut self) {
        self.emitter = None;
    }

    /// Emit the active emitter's droplet once.
    pub fn tick_emitter(&mut self, arena: &Aabb, max_particles: usize) -> EmitOutcome {
        let Some(emitter) = self.emitter else {
            return EmitOutcome::default();
        };
        self.emit_droplet(emitter.position, &emitter.droplet, arena, max_particles)
            .unwrap_or_default()
    }

    /// Density, pair forces, gravity, integration and speed cap.
    ///
    /// `index` must have been rebuilt from the current particle positions.
    pub fn step(&mut self, dt: f32, gravity: Vec2, index: &SpatialIndex, config: &SimConfig) {
        let n = self.particles.len();
        if n == 0 {
            return;
        }
        let params = ForceParams::from_config(config);
        let h = params.radius;

        let particles = &self.particles;
        let density_at = |i: usize| -> (f32, f32) {
            let p = particles[i].pos;
            let mut rho = 0.0;
            let mut near = 0.0;
            for j in index.query_particles(&Aabb::around(p, h)) {
                if j == i || j >= n {
                    continue;
                }
                if let Some(q) = kernel((particles[j].pos - p).length(), h) {
                    rho += q * q;
                    near += q * q * q;
                }
            }
            (rho, near)
        };
        #[cfg(feature = "parallel")]
        {
            (0..n).into_par_iter().map(density_at).collect_into_vec(&mut self.densities);
        }
        #[cfg(not(feature = "parallel"))]
        {
            self.densities.clear();
            self.densities.extend((0..n).map(density_at));
        }

        self.samples.clear();
        self.samples.extend(self.particles.iter().zip(&self.densities).enumerate().map(
            |(index, (p, &(density, near_density)))| Sample {
                index,
                pos: p.pos,
                velocity: p.velocity,
                mass: p.mass(),
                density,
                near_density,
            },
        ));

        let samples = &self.samples;
        let force_on = |i: usize| -> Vec2 {
            let si = &samples[i];
            index
                .query_particles(&Aabb::around(si.pos, h))
                .filter(|&j| j != i && j < n)
                .map(|j| pair_force(si, &samples[j], &params))
                .sum()
        };
        #[cfg(feature = "parallel")]
        {
            (0..n).into_par_iter().map(force_on).collect_into_vec(&mut self.forces);
        }
        #[cfg(not(feature = "parallel"))]
        {
            self.forces.clear();
            self.forces.extend((0..n).map(force_on));
        }

        let max_speed = config.max_particle_speed;
        for (p, &f) in self.particles.iter_mut().zip(&self.forces) {
            let accel = gravity + f / p.mass();
            let mut v = (p.velocity + accel * dt).clamp_length(max_speed);
            if !v.is_finite() {
                v = Vec2::ZERO;
            }
            p.velocity = v;
            p.pos += v * dt;
        }
    }

    /// One-sided particle vs body contact. Bodies are never perturbed.
    ///
    /// `index` must hold the current body positions.
    pub fn collide_with_bodies(&mut self, bodies: &[Body], index: &SpatialIndex, restitution: f32) {
        if bodies.is_empty() {
            return;
        }
        let r = particle_radius();
        let resolve = |p: &mut Particle| {
            for bi in index.query_bodies(&Aabb::around(p.pos, r)) {
                if let Some(body) = bodies.get(bi) {
                    collide_particle(p, body, r, restitution);
                }
            }
        };
        #[cfg(feature = "parallel")]
        {
            self.particles.par_iter_mut().for_each(resolve);
        }
        #[cfg(not(feature = "parallel"))]
        {
            self.particles.iter_mut().for_each(resolve);
        }
    }

    /// Remove every particle. The emitter keeps running.
    pub fn clear(&mut self) {
        self.particles.clear();
        self.samples.clear();
        self.densities.clear();
        self.forces.clear();
    }

    /// Closest particle to `point` within `radius`.
    pub fn particle_near(&self, point: Vec2, radius: f32) -> Option<usize> {
        self.particles
            .iter()
            .enumerate()
            .map(|(i, p)| (i, (p.pos - point).length_squared()))
            .filter(|&(_, d2)| d2 <= radius * radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }
}

impl Default for FluidSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> Aabb {
        Aabb::new(Vec2::ZERO, Vec2::new(300.0, 200.0))
    }

    fn droplet(count: u32) -> DropletParams {
        DropletParams { count, ..DropletParams::default() }
    }

    #[test]
    fn emit_adds_exactly_count_below_cap() {
        let mut fluid = FluidSystem::new();
        let out = fluid.emit_droplet(Vec2::new(150.0, 100.0), &droplet(25), &arena(), 100).unwrap();
        assert_eq!(out, EmitOutcome { emitted: 25, dropped: 0 });
        assert_eq!(fluid.len(), 25);
        assert!(fluid.particles().iter().all(|p| arena().contains(p.pos)));
    }

    #[test]
    fn emit_past_cap_drops_excess() {
        let mut fluid = FluidSystem::new();
        fluid.emit_droplet(Vec2::new(150.0, 100.0), &droplet(8), &arena(), 10).unwrap();
        let out = fluid.emit_droplet(Vec2::new(150.0, 100.0), &droplet(5), &arena(), 10).unwrap();
        assert_eq!(out, EmitOutcome { emitted: 2, dropped: 3 });
        assert_eq!(fluid.len(), 10);
    }

    #[test]
    fn emit_rejects_bad_droplets() {
        let mut fluid = FluidSystem::new();
        let at = Vec2::new(10.0, 10.0);
        assert!(fluid.emit_droplet(at, &droplet(0), &arena(), 10).is_err());
        let heavy_nothing = DropletParams { density: 0.0, ..droplet(3) };
        assert!(fluid.emit_droplet(at, &heavy_nothing, &arena(), 10).is_err());
        let denser_than_mercury = DropletParams { density: 20.0, ..droplet(3) };
        assert!(fluid.emit_droplet(at, &denser_than_mercury, &arena(), 10).is_err());
        let nowhere = Vec2::new(f32::NAN, 1.0);
        assert!(fluid.emit_droplet(nowhere, &droplet(3), &arena(), 10).is_err());
        assert!(fluid.is_empty());
    }

    #[test]
    fn emit_into_arena_narrower_than_a_particle() {
        let mut fluid = FluidSystem::new();
        let cramped = Aabb::new(Vec2::ZERO, Vec2::new(4.0, 40.0));
        let out = fluid.emit_droplet(Vec2::new(2.0, 20.0), &droplet(6), &cramped, 10).unwrap();
        assert_eq!(out.emitted, 6);
        for p in fluid.particles() {
            assert_eq!(p.pos.x, 2.0);
            assert!(p.pos.y >= particle_radius() && p.pos.y <= 40.0 - particle_radius());
        }
    }

    #[test]
    fn emitter_emits_one_droplet_per_tick() {
        let mut fluid = FluidSystem::new();
        fluid.start_emitting(Vec2::new(50.0, 50.0), droplet(4)).unwrap();
        fluid.tick_emitter(&arena(), 100);
        fluid.tick_emitter(&arena(), 100);
        assert_eq!(fluid.len(), 8);
        fluid.stop_emitting();
        fluid.tick_emitter(&arena(), 100);
        assert_eq!(fluid.len(), 8);
    }

    #[test]
    fn step_conserves_momentum_without_gravity() {
        let mut fluid = FluidSystem::new();
        fluid.emit_droplet(Vec2::new(150.0, 100.0), &droplet(40), &arena(), 100).unwrap();
        let config = SimConfig { max_particle_speed: 1.0e6, ..SimConfig::default() };
        let mut index = SpatialIndex::new(300.0, 200.0);
        index.rebuild(&[], fluid.particles(), config.interaction_radius, 0.0, Vec2::ZERO);

        fluid.step(config.sub_step_dt(), Vec2::ZERO, &index, &config);
        let momentum: Vec2 = fluid.particles().iter().map(|p| p.velocity * p.mass()).sum();
        let scale: f32 = fluid.particles().iter().map(|p| p.velocity.length() * p.mass()).sum();
        assert!(momentum.length() <= 1e-3 * scale.max(1.0), "{momentum:?} vs {scale}");
    }

    #[test]
    fn clear_empties_and_particle_near_finds_closest() {
        let mut fluid = FluidSystem::new();
        fluid.replace_particles(vec![
            Particle::new(Vec2::new(10.0, 10.0), 1.0, DEFAULT_FLUID_COLOR, 0),
            Particle::new(Vec2::new(14.0, 10.0), 1.0, DEFAULT_FLUID_COLOR, 0),
        ]);
        assert_eq!(fluid.particle_near(Vec2::new(13.0, 10.0), 5.0), Some(1));
        assert_eq!(fluid.particle_near(Vec2::new(100.0, 10.0), 5.0), None);
        fluid.clear();
        assert_eq!(fluid.len(), 0);
    }
}
