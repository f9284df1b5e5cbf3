use crate::core::Result;
use crate::domain::SimConfig;

use super::perf_stats::StepStats;
use super::WorldCore;

pub(super) fn set_option(world: &mut WorldCore, name: &str, value: f64) -> Result<()> {
    world.config.set_option(name, value)?;
    log::debug!("option {name} = {value}");
    Ok(())
}

pub(super) fn get_option(world: &WorldCore, name: &str) -> Result<f64> {
    world.config.get_option(name)
}

pub(super) fn set_config(world: &mut WorldCore, config: SimConfig) -> Result<()> {
    config.validate()?;
    world.config = config;
    Ok(())
}

pub(super) fn enable_perf_metrics(world: &mut WorldCore, enabled: bool) {
    world.perf_enabled = enabled;
}

pub(super) fn step_stats(world: &WorldCore) -> StepStats {
    world.stats
}
