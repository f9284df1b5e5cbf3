use super::*;
use crate::core::EngineError;
use crate::persistence::MemorySlotStore;

fn world() -> WorldCore {
    WorldCore::new(400.0, 200.0).unwrap()
}

fn crate_at(x: f32, y: f32) -> BodyParams {
    BodyParams::new(Vec2::new(x, y), 20.0, 20.0)
}

#[test]
fn new_rejects_degenerate_arena() {
    assert!(matches!(WorldCore::new(0.0, 10.0), Err(EngineError::InvalidParameter(_))));
    assert!(WorldCore::new(f32::NAN, 10.0).is_err());
    let bad = SimConfig { sub_steps: 0, ..SimConfig::default() };
    assert!(WorldCore::with_config(10.0, 10.0, bad).is_err());
}

#[test]
fn tiny_arena_still_takes_droplets() {
    let mut world = WorldCore::new(4.0, 4.0).unwrap();
    let droplet = DropletParams { count: 3, ..DropletParams::default() };
    assert_eq!(world.emit_droplet(Vec2::new(2.0, 2.0), &droplet).unwrap().emitted, 3);
    world.start();
    world.step();
    for p in world.particles() {
        assert_eq!(p.pos, Vec2::new(2.0, 2.0));
    }
}

#[test]
fn step_only_advances_while_running() {
    let mut world = world();
    let id = world.spawn_body(&crate_at(100.0, 50.0)).unwrap();

    assert!(!world.step());
    assert_eq!(world.step_count(), 0);
    assert_eq!(world.body(id).unwrap().pos, Vec2::new(100.0, 50.0));

    world.start();
    assert!(world.step());
    assert_eq!(world.step_count(), 1);
    assert!(world.body(id).unwrap().pos.y > 50.0);

    world.pause();
    let frozen = world.body(id).unwrap().pos;
    assert!(!world.step());
    assert_eq!(world.body(id).unwrap().pos, frozen);
}

#[test]
fn lifecycle_transitions() {
    let mut world = world();
    world.toggle_pause();
    assert_eq!(world.state(), SimState::Idle);
    world.resume();
    assert_eq!(world.state(), SimState::Idle);

    world.start();
    assert_eq!(world.state(), SimState::Running);
    world.toggle_pause();
    assert_eq!(world.state(), SimState::Paused);
    world.toggle_pause();
    assert_eq!(world.state(), SimState::Running);
    world.pause();
    world.resume();
    assert_eq!(world.state(), SimState::Running);

    world.quit();
    world.quit();
    assert_eq!(world.state(), SimState::Idle);
    assert!(world.bodies().is_empty());
}

#[test]
fn intents_wait_for_the_next_step() {
    let mut world = world();
    let tx = world.intent_sender();
    tx.send(Command::SpawnBody(crate_at(50.0, 50.0)));
    tx.send(Command::EmitDroplet { position: Vec2::new(200.0, 50.0), droplet: DropletParams::default() });

    assert_eq!(world.pending_intents(), 2);
    assert!(!world.step());
    assert!(world.bodies().is_empty());

    world.start();
    world.step();
    assert_eq!(world.bodies().len(), 1);
    assert_eq!(world.particles().len(), 10);
    assert_eq!(world.pending_intents(), 0);
}

#[test]
fn rejected_intent_is_counted_not_fatal() {
    let mut world = world();
    let tx = world.intent_sender();
    let droplet = DropletParams { count: 0, ..DropletParams::default() };
    tx.send(Command::EmitDroplet { position: Vec2::new(10.0, 10.0), droplet });
    tx.send(Command::SpawnBody(crate_at(50.0, 50.0)));

    world.start();
    assert!(world.step());
    assert_eq!(world.step_stats().rejected_intents(), 1);
    assert_eq!(world.bodies().len(), 1);
    assert!(world.particles().is_empty());
}

#[test]
fn emitter_adds_one_droplet_per_step() {
    let mut world = world();
    let droplet = DropletParams { count: 5, ..DropletParams::default() };
    world.start_emitting(Vec2::new(200.0, 40.0), &droplet).unwrap();
    world.start();
    for _ in 0..3 {
        world.step();
    }
    assert_eq!(world.particles().len(), 15);

    world.stop_emitting();
    world.step();
    assert_eq!(world.particles().len(), 15);
    assert!(!world.is_emitting());
}

#[test]
fn advance_runs_whole_steps_and_caps_backlog() {
    let mut world = world();
    assert_eq!(world.advance(1.0), 0);

    world.start();
    let dt = world.config().time_step as f64;
    assert_eq!(world.advance(dt * 2.5), 2);
    assert_eq!(world.advance(dt * 0.6), 1);
    let cap = world.config().max_steps_per_frame;
    assert_eq!(world.advance(100.0), cap);
    assert_eq!(world.step_count(), 3 + cap as u64);
}

#[test]
fn grabbed_body_ignores_gravity_until_released() {
    let mut world = world();
    let id = world.spawn_body(&crate_at(100.0, 50.0)).unwrap();
    assert_eq!(world.grab_body(Vec2::new(101.0, 49.0)), Some(id));

    world.start();
    for _ in 0..5 {
        world.step();
    }
    assert_eq!(world.body(id).unwrap().pos, Vec2::new(100.0, 50.0));

    assert!(world.drag_grabbed(Vec2::new(110.0, 50.0)));
    let expected = 10.0 / world.config().time_step;
    assert!((world.body(id).unwrap().velocity.x - expected).abs() < 1e-2);

    assert_eq!(world.release_body(), Some(id));
    world.step();
    assert!(world.body(id).unwrap().pos.x > 110.0);
}

#[test]
fn grabbed_body_without_drag_stops() {
    let mut world = world();
    let id = world.spawn_body(&crate_at(100.0, 50.0)).unwrap();
    world.grab_body(Vec2::new(100.0, 50.0));
    world.drag_grabbed(Vec2::new(105.0, 50.0));
    world.start();
    world.step();
    world.step();
    world.release_body();
    assert_eq!(world.body(id).unwrap().velocity, Vec2::ZERO);
}

#[test]
fn inspect_finds_bodies_before_particles() {
    let mut world = world();
    let id = world.spawn_body(&crate_at(100.0, 50.0)).unwrap();
    let droplet = DropletParams { count: 1, ..DropletParams::default() };
    world.emit_droplet(Vec2::new(300.0, 100.0), &droplet).unwrap();

    match world.inspect_at(Vec2::new(95.0, 55.0)) {
        Some(Inspection::Body(b)) => assert_eq!(b.id, id),
        other => panic!("expected body, got {other:?}"),
    }
    let p = world.particles()[0].pos;
    assert!(matches!(world.inspect_at(p), Some(Inspection::Particle(_))));
    assert_eq!(world.inspect_at(Vec2::new(10.0, 190.0)), None);
}

#[test]
fn delete_is_topmost_and_miss_is_noop() {
    let mut world = world();
    let below = world.spawn_body(&crate_at(100.0, 50.0)).unwrap();
    let above = world.spawn_body(&crate_at(105.0, 50.0)).unwrap();
    assert_eq!(world.delete_body_at(Vec2::new(102.0, 50.0)), Some(above));
    assert_eq!(world.delete_body_at(Vec2::new(300.0, 150.0)), None);
    assert_eq!(world.bodies().len(), 1);
    assert_eq!(world.bodies()[0].id, below);
}

#[test]
fn reset_returns_to_loaded_contents() {
    let mut store = MemorySlotStore::new();
    let mut world = world();
    world.spawn_body(&crate_at(100.0, 50.0)).unwrap();
    world.set_description("one crate");
    world.save("level", &mut store).unwrap();

    world.clear_all();
    world.load("level", &store).unwrap();
    world.spawn_body(&crate_at(300.0, 50.0)).unwrap();
    world.start();
    world.step();

    world.reset();
    assert_eq!(world.state(), SimState::Idle);
    assert_eq!(world.step_count(), 0);
    assert_eq!(world.bodies().len(), 1);
    assert_eq!(world.bodies()[0].pos, Vec2::new(100.0, 50.0));
    assert_eq!(world.description(), "one crate");
}

#[test]
fn reset_without_load_empties() {
    let mut world = world();
    world.spawn_body(&crate_at(100.0, 50.0)).unwrap();
    world.emit_droplet(Vec2::new(200.0, 50.0), &DropletParams::default()).unwrap();
    world.reset();
    assert!(world.bodies().is_empty());
    assert!(world.particles().is_empty());
}

#[test]
fn failed_load_leaves_world_untouched() {
    let mut store = MemorySlotStore::new();
    let mut world = world();
    world.spawn_body(&crate_at(100.0, 50.0)).unwrap();
    let before = world.snapshot();

    assert!(matches!(world.load("missing", &store), Err(EngineError::NotFound(_))));
    store.write("broken", "{\"format\":\"physbox-save\"}").unwrap();
    assert!(matches!(world.load("broken", &store), Err(EngineError::CorruptData(_))));
    assert!(matches!(world.save("", &mut store), Err(EngineError::InvalidName(_))));

    assert_eq!(world.snapshot(), before);
}

#[test]
fn options_are_validated() {
    let mut world = world();
    world.set_option("solver_iterations", 8.0).unwrap();
    assert_eq!(world.get_option("solver_iterations").unwrap(), 8.0);
    assert!(world.set_option("time_step", -1.0).is_err());
    assert!(world.set_option("warp_drive", 1.0).is_err());
    assert_eq!(world.config().time_step, SimConfig::default().time_step);
}

#[test]
fn render_buffers_follow_entities() {
    let mut world = world();
    world.spawn_body(&crate_at(100.0, 50.0)).unwrap();
    world.emit_droplet(Vec2::new(200.0, 50.0), &DropletParams::default()).unwrap();
    world.update_render_buffers();
    assert_eq!(world.body_vertices().len(), 8);
    assert_eq!(world.body_colors().len(), 1);
    assert_eq!(world.particle_positions().len(), 20);
    assert_eq!(world.particle_colors().len(), 10);
    assert_eq!(world.body_vertices()[0..2], [90.0, 40.0]);
}

#[test]
fn step_stats_count_entities_and_contacts() {
    let mut world = world();
    world.spawn_body(&BodyParams::new(Vec2::new(200.0, 190.0), 300.0, 20.0).fixed()).unwrap();
    world.spawn_body(&crate_at(200.0, 171.0)).unwrap();
    world.start();
    world.step();
    let stats = world.step_stats();
    assert_eq!(stats.body_count(), 2);
    assert!(stats.candidate_pairs() >= 1);
    assert!(stats.contacts() >= 1);
}
