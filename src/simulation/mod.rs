//! World - owns the rigid bodies, the fluid and the spatial index, and drives
//! them through fixed steps.
//!
//! The heavy lifting lives in the systems; this module only orchestrates:
//! - init/      - construction and runtime settings
//! - step/      - the step pipeline, arena clamp and fixed-step clock
//! - commands/  - immediate entity API and the intent queue
//! - render/    - snapshots and flat render buffers
//! - persist/   - save/load through a slot store

use serde::Serialize;

use crate::core::{Aabb, Result, Vec2};
use crate::domain::SimConfig;
use crate::persistence::{SaveRecord, SlotStore};
use crate::spatial::SpatialIndex;
use crate::systems::rigid_body::{Body, BodyId, BodyParams};
use crate::systems::{DropletParams, EmitOutcome, FluidSystem, Particle, RigidBodySystem};

#[path = "perf/perf_timer.rs"]
mod perf_timer;
#[path = "perf/perf_stats.rs"]
mod perf_stats;
#[path = "init/init.rs"]
mod init;
#[path = "init/settings.rs"]
mod settings;
#[path = "step/step.rs"]
mod step;
#[path = "step/boundary.rs"]
mod boundary;
#[path = "step/clock.rs"]
mod clock;
#[path = "commands/commands.rs"]
mod commands;
#[path = "commands/intents.rs"]
mod intents;
#[path = "render/render_extract.rs"]
mod render_extract;
#[path = "persist/persist.rs"]
mod persist;
mod shared;
mod facade;

pub use clock::FixedStepClock;
pub use facade::{RenderLayout, World};
pub use intents::{Command, IntentSender};
pub use perf_stats::StepStats;
pub use render_extract::{BodyView, ParticleView, WorldSnapshot};
pub use shared::SharedWorld;

use intents::IntentQueue;
use perf_timer::PerfTimer;
use render_extract::RenderBuffers;

/// Lifecycle of a world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SimState {
    #[default]
    Idle,
    Running,
    Paused,
}

/// What sits under a point.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Inspection {
    Body(Body),
    Particle(Particle),
}

/// The simulation world
pub struct WorldCore {
    arena: Aabb,
    config: SimConfig,
    bodies: RigidBodySystem,
    fluid: FluidSystem,
    index: SpatialIndex,

    // State
    state: SimState,
    time: f64,
    step_count: u64,
    clock: FixedStepClock,
    intents: IntentQueue,
    /// Contents `reset()` returns to.
    last_loaded: Option<SaveRecord>,
    description: String,

    // Perf metrics
    perf_enabled: bool,
    stats: StepStats,

    render: RenderBuffers,
}

impl WorldCore {
    /// Empty `width × height` arena (cm) with default settings.
    pub fn new(width: f32, height: f32) -> Result<Self> {
        init::create_world_core(width, height, SimConfig::default())
    }

    pub fn with_config(width: f32, height: f32, config: SimConfig) -> Result<Self> {
        init::create_world_core(width, height, config)
    }

    pub fn width(&self) -> f32 { self.arena.width() }

    pub fn height(&self) -> f32 { self.arena.height() }

    pub fn arena(&self) -> &Aabb { &self.arena }

    pub fn config(&self) -> &SimConfig { &self.config }

    pub fn state(&self) -> SimState { self.state }

    /// Simulated seconds since the last reset.
    pub fn time(&self) -> f64 { self.time }

    pub fn step_count(&self) -> u64 { self.step_count }

    pub fn bodies(&self) -> &[Body] { self.bodies.bodies() }

    pub fn body(&self, id: BodyId) -> Option<&Body> { self.bodies.body(id) }

    pub fn particles(&self) -> &[Particle] { self.fluid.particles() }

    pub fn is_emitting(&self) -> bool { self.fluid.emitter().is_some() }

    pub fn grabbed_body(&self) -> Option<BodyId> { self.bodies.grabbed() }

    pub fn description(&self) -> &str { &self.description }

    pub fn set_description(&mut self, description: &str) {
        self.description = description.to_string();
    }

    // === LIFECYCLE ===

    /// Idle or Paused → Running.
    pub fn start(&mut self) {
        if self.state != SimState::Running {
            log::info!("simulation running");
            self.state = SimState::Running;
        }
    }

    pub fn pause(&mut self) {
        if self.state == SimState::Running {
            self.state = SimState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == SimState::Paused {
            self.state = SimState::Running;
        }
    }

    /// Running ⇄ Paused; no effect while Idle.
    pub fn toggle_pause(&mut self) {
        match self.state {
            SimState::Running => self.state = SimState::Paused,
            SimState::Paused => self.state = SimState::Running,
            SimState::Idle => {}
        }
    }

    /// Back to the last loaded contents (or empty), Idle.
    pub fn reset(&mut self) {
        persist::reset(self);
    }

    /// Tear down: no entities, no intents, nothing to reset to.
    pub fn quit(&mut self) {
        self.last_loaded = None;
        persist::reset(self);
        self.description.clear();
    }

    // === STEPPING ===

    /// One fixed step. `false` (and nothing changes) unless Running.
    pub fn step(&mut self) -> bool {
        step::step(self)
    }

    /// Run as many fixed steps as `elapsed` seconds of wall time cover,
    /// at most `max_steps_per_frame`. Returns the number taken.
    pub fn advance(&mut self, elapsed: f64) -> u32 {
        step::advance(self, elapsed)
    }

    // === ENTITIES ===

    pub fn spawn_body(&mut self, params: &BodyParams) -> Result<BodyId> {
        commands::spawn_body(self, params)
    }

    /// Remove the topmost body under `point`; `None` when there is none.
    pub fn delete_body_at(&mut self, point: Vec2) -> Option<BodyId> {
        commands::delete_body_at(self, point)
    }

    pub fn emit_droplet(&mut self, position: Vec2, droplet: &DropletParams) -> Result<EmitOutcome> {
        commands::emit_droplet(self, position, droplet)
    }

    pub fn start_emitting(&mut self, position: Vec2, droplet: &DropletParams) -> Result<()> {
        commands::start_emitting(self, position, droplet)
    }

    pub fn move_emitter(&mut self, position: Vec2) -> bool {
        commands::move_emitter(self, position)
    }

    pub fn stop_emitting(&mut self) {
        commands::stop_emitting(self)
    }

    pub fn clear_fluid(&mut self) {
        commands::clear_fluid(self)
    }

    /// Remove every body and particle and stop emitting.
    pub fn clear_all(&mut self) {
        commands::clear_all(self)
    }

    /// Place body `id` at `target`; dynamic bodies keep the implied velocity.
    pub fn move_body(&mut self, id: BodyId, target: Vec2) -> bool {
        commands::move_body(self, id, target)
    }

    pub fn grab_body(&mut self, point: Vec2) -> Option<BodyId> {
        commands::grab_body(self, point)
    }

    pub fn drag_grabbed(&mut self, target: Vec2) -> bool {
        commands::drag_grabbed(self, target)
    }

    pub fn release_body(&mut self) -> Option<BodyId> {
        commands::release_body(self)
    }

    /// Body under `point` (topmost), else the closest particle touching it.
    pub fn inspect_at(&self, point: Vec2) -> Option<Inspection> {
        commands::inspect_at(self, point)
    }

    // === INTENTS ===

    /// Handle for queueing commands from any thread; drained at the next step.
    pub fn intent_sender(&self) -> IntentSender {
        self.intents.sender()
    }

    pub fn pending_intents(&self) -> usize {
        self.intents.len()
    }

    /// Apply `command` now instead of queueing it.
    pub fn apply_command(&mut self, command: Command) -> Result<()> {
        commands::apply_command(self, command)
    }

    // === SETTINGS ===

    pub fn set_option(&mut self, name: &str, value: f64) -> Result<()> {
        settings::set_option(self, name, value)
    }

    pub fn get_option(&self, name: &str) -> Result<f64> {
        settings::get_option(self, name)
    }

    pub fn set_config(&mut self, config: SimConfig) -> Result<()> {
        settings::set_config(self, config)
    }

    /// Enable or disable per-step timings (counts are always kept)
    pub fn enable_perf_metrics(&mut self, enabled: bool) {
        settings::enable_perf_metrics(self, enabled);
    }

    pub fn step_stats(&self) -> StepStats {
        settings::step_stats(self)
    }

    // === READ-BACK ===

    pub fn snapshot(&self) -> WorldSnapshot {
        render_extract::snapshot(self)
    }

    /// Refill the flat render buffers from the current state.
    pub fn update_render_buffers(&mut self) {
        render_extract::extract_render_buffers(self);
    }

    pub fn body_vertices(&self) -> &[f32] { &self.render.body_vertices }

    pub fn body_colors(&self) -> &[u32] { &self.render.body_colors }

    pub fn particle_positions(&self) -> &[f32] { &self.render.particle_positions }

    pub fn particle_colors(&self) -> &[u32] { &self.render.particle_colors }

    // === PERSISTENCE ===

    /// Write the full entity set to slot `name`, overwriting it.
    pub fn save<S: SlotStore + ?Sized>(&self, name: &str, store: &mut S) -> Result<()> {
        persist::save(self, name, store)
    }

    /// Replace the entity set with slot `name`. On error nothing changes.
    pub fn load<S: SlotStore + ?Sized>(&mut self, name: &str, store: &S) -> Result<()> {
        persist::load(self, name, store)
    }

    pub fn list_slots<S: SlotStore + ?Sized>(&self, store: &S) -> Result<Vec<String>> {
        store.list()
    }
}

#[cfg(test)]
#[path = "tests/tests.rs"]
mod tests;
