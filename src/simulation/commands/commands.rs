use crate::core::{Result, Vec2};
use crate::domain::materials::particle_radius;
use crate::systems::rigid_body::{BodyId, BodyParams};
use crate::systems::{DropletParams, EmitOutcome};

use super::intents::Command;
use super::{Inspection, WorldCore};

pub(super) fn spawn_body(world: &mut WorldCore, params: &BodyParams) -> Result<BodyId> {
    world.bodies.spawn(params, &world.arena)
}

pub(super) fn delete_body_at(world: &mut WorldCore, point: Vec2) -> Option<BodyId> {
    world.bodies.delete_at(point)
}

pub(super) fn emit_droplet(
    world: &mut WorldCore,
    position: Vec2,
    droplet: &DropletParams,
) -> Result<EmitOutcome> {
    let outcome =
        world.fluid.emit_droplet(position, droplet, &world.arena, world.config.max_particles)?;
    world.stats.dropped_particles = world.stats.dropped_particles.saturating_add(outcome.dropped);
    Ok(outcome)
}

pub(super) fn start_emitting(world: &mut WorldCore, position: Vec2, droplet: &DropletParams) -> Result<()> {
    world.fluid.start_emitting(position, *droplet)
}

pub(super) fn move_emitter(world: &mut WorldCore, position: Vec2) -> bool {
    world.fluid.move_emitter(position)
}

pub(super) fn stop_emitting(world: &mut WorldCore) {
    world.fluid.stop_emitting();
}

pub(super) fn clear_fluid(world: &mut WorldCore) {
    world.fluid.clear();
}

pub(super) fn clear_all(world: &mut WorldCore) {
    world.bodies.clear();
    world.fluid.clear();
    world.fluid.stop_emitting();
    world.index.clear();
    log::debug!("cleared all entities");
}

/// Drag velocity is taken over one full step.
pub(super) fn move_body(world: &mut WorldCore, id: BodyId, target: Vec2) -> bool {
    let dt = world.config.time_step;
    world.bodies.move_body(id, target, dt, &world.arena)
}

pub(super) fn grab_body(world: &mut WorldCore, point: Vec2) -> Option<BodyId> {
    world.bodies.grab_at(point)
}

pub(super) fn drag_grabbed(world: &mut WorldCore, target: Vec2) -> bool {
    let dt = world.config.time_step;
    world.bodies.drag_grabbed(target, dt, &world.arena)
}

pub(super) fn release_body(world: &mut WorldCore) -> Option<BodyId> {
    world.bodies.release()
}

pub(super) fn inspect_at(world: &WorldCore, point: Vec2) -> Option<Inspection> {
    if let Some(body) = world.bodies.body_at(point) {
        return Some(Inspection::Body(body.clone()));
    }
    world
        .fluid
        .particle_near(point, particle_radius())
        .and_then(|i| world.fluid.particles().get(i))
        .map(|p| Inspection::Particle(p.clone()))
}

/// Misses (nothing to delete or grab) are not errors.
pub(super) fn apply_command(world: &mut WorldCore, command: Command) -> Result<()> {
    match command {
        Command::SpawnBody(params) => spawn_body(world, &params).map(|_| ()),
        Command::DeleteBodyAt { position } => {
            delete_body_at(world, position);
            Ok(())
        }
        Command::EmitDroplet { position, droplet } => {
            emit_droplet(world, position, &droplet).map(|_| ())
        }
        Command::StartEmitting { position, droplet } => start_emitting(world, position, &droplet),
        Command::MoveEmitter { position } => {
            move_emitter(world, position);
            Ok(())
        }
        Command::StopEmitting => {
            stop_emitting(world);
            Ok(())
        }
        Command::ClearFluid => {
            clear_fluid(world);
            Ok(())
        }
        Command::ClearAll => {
            clear_all(world);
            Ok(())
        }
        Command::GrabBody { position } => {
            grab_body(world, position);
            Ok(())
        }
        Command::DragGrabbed { position } => {
            drag_grabbed(world, position);
            Ok(())
        }
        Command::ReleaseBody => {
            release_body(world);
            Ok(())
        }
    }
}
