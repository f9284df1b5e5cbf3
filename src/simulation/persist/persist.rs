use crate::core::{Aabb, Result, Vec2};
use crate::persistence::{check_slot_name, SaveRecord, SlotStore};
use crate::spatial::SpatialIndex;
use crate::systems::RigidBodySystem;

use super::{SimState, WorldCore};

pub(super) fn save<S: SlotStore + ?Sized>(world: &WorldCore, name: &str, store: &mut S) -> Result<()> {
    check_slot_name(name)?;
    let record = SaveRecord::new(
        name,
        &world.description,
        world.arena.width(),
        world.arena.height(),
        world.bodies.bodies().to_vec(),
        world.fluid.particles().to_vec(),
    );
    store.write(name, &record.to_json()?)?;
    log::info!(
        "saved {} bodies and {} particles to slot {name:?}",
        record.body_count,
        record.particle_count
    );
    Ok(())
}

/// Everything that can fail happens before the world is touched.
pub(super) fn load<S: SlotStore + ?Sized>(world: &mut WorldCore, name: &str, store: &S) -> Result<()> {
    check_slot_name(name)?;
    let json = store.read(name)?;
    let record = SaveRecord::from_json(&json)?;
    restore(world, &record);
    log::info!(
        "loaded slot {name:?}: {} bodies, {} particles",
        record.body_count,
        record.particle_count
    );
    world.last_loaded = Some(record);
    Ok(())
}

/// Swap in the record's entities and arena. Running state and time are kept.
fn restore(world: &mut WorldCore, record: &SaveRecord) {
    let (w, h) = (record.width, record.height);
    if w != world.arena.width() || h != world.arena.height() {
        world.arena = Aabb::new(Vec2::ZERO, Vec2::new(w, h));
        world.index = SpatialIndex::new(w, h);
    }
    world.bodies = RigidBodySystem::from_bodies(record.bodies.clone(), &world.arena);
    world.fluid.replace_particles(record.particles.clone());
    world.description = record.description.clone();
}

pub(super) fn reset(world: &mut WorldCore) {
    match world.last_loaded.take() {
        Some(record) => {
            restore(world, &record);
            world.last_loaded = Some(record);
        }
        None => {
            world.bodies.clear();
            world.fluid.clear();
        }
    }
    world.fluid.stop_emitting();
    world.index.clear();
    world.intents.clear();
    world.clock.reset();
    world.stats.reset();
    world.time = 0.0;
    world.step_count = 0;
    world.state = SimState::Idle;
    log::info!("world reset");
}
