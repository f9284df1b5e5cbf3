use crate::core::{Aabb, EngineError, Result, Vec2};
use crate::domain::SimConfig;
use crate::spatial::SpatialIndex;
use crate::systems::{FluidSystem, RigidBodySystem};

use super::intents::IntentQueue;
use super::perf_stats::StepStats;
use super::{FixedStepClock, RenderBuffers, SimState, WorldCore};

pub(super) fn create_world_core(width: f32, height: f32, config: SimConfig) -> Result<WorldCore> {
    if !(width.is_finite() && width > 0.0 && height.is_finite() && height > 0.0) {
        return Err(EngineError::invalid(format!(
            "arena must be positive and finite, got {width} x {height}"
        )));
    }
    config.validate()?;
    log::debug!("creating {width} x {height} world");

    Ok(WorldCore {
        arena: Aabb::new(Vec2::ZERO, Vec2::new(width, height)),
        config,
        bodies: RigidBodySystem::new(),
        fluid: FluidSystem::new(),
        index: SpatialIndex::new(width, height),
        state: SimState::Idle,
        time: 0.0,
        step_count: 0,
        clock: FixedStepClock::new(),
        intents: IntentQueue::new(),
        last_loaded: None,
        description: String::new(),
        perf_enabled: false,
        stats: StepStats::default(),
        render: RenderBuffers::default(),
    })
}
