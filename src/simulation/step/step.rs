use super::{boundary, commands, PerfTimer, SimState, WorldCore};

pub(super) fn step(world: &mut WorldCore) -> bool {
    if world.state != SimState::Running {
        return false;
    }
    let perf_on = world.perf_enabled;
    let step_start = if perf_on { Some(PerfTimer::start()) } else { None };
    world.stats.reset();

    // === INTENTS ===
    // Everything queued before this point applies to this step, in send order.
    for command in world.intents.drain() {
        if let Err(e) = commands::apply_command(world, command) {
            log::warn!("rejected intent: {e}");
            world.stats.rejected_intents = world.stats.rejected_intents.saturating_add(1);
        }
    }

    let emitted = world.fluid.tick_emitter(&world.arena, world.config.max_particles);
    world.stats.dropped_particles = world.stats.dropped_particles.saturating_add(emitted.dropped);

    let dt = world.config.sub_step_dt();
    let gravity = world.config.gravity;
    for _ in 0..world.config.sub_steps.max(1) {
        world.index.rebuild(
            world.bodies.bodies(),
            world.fluid.particles(),
            world.config.interaction_radius,
            dt,
            gravity,
        );

        // === RIGID BODIES ===
        let t0 = if perf_on { Some(PerfTimer::start()) } else { None };
        world.bodies.integrate(dt, gravity);
        let pairs = world.index.body_pairs();
        let collisions = world.bodies.resolve_collisions(&pairs, &world.config, dt);
        world.stats.add_collisions(collisions);
        if let Some(t0) = t0 {
            world.stats.rigid_ms += t0.elapsed_ms();
        }

        // === FLUID ===
        // Bodies have already moved this sub-step; particles see them where they are now.
        let t0 = if perf_on { Some(PerfTimer::start()) } else { None };
        world.fluid.step(dt, gravity, &world.index, &world.config);
        world.index.refresh_bodies(world.bodies.bodies());
        world.fluid.collide_with_bodies(
            world.bodies.bodies(),
            &world.index,
            world.config.particle_restitution,
        );
        if let Some(t0) = t0 {
            world.stats.fluid_ms += t0.elapsed_ms();
        }

        boundary::clamp_to_arena(world);
    }
    world.bodies.end_step();

    world.time += world.config.time_step as f64;
    world.step_count += 1;
    world.stats.body_count = world.bodies.len() as u32;
    world.stats.particle_count = world.fluid.len() as u32;
    if let Some(start) = step_start {
        world.stats.step_ms = start.elapsed_ms();
    }
    true
}

pub(super) fn advance(world: &mut WorldCore, elapsed: f64) -> u32 {
    if world.state != SimState::Running {
        return 0;
    }
    let due = world.clock.advance(
        elapsed,
        world.config.time_step as f64,
        world.config.max_steps_per_frame.max(1),
    );
    for _ in 0..due {
        step(world);
    }
    due
}
