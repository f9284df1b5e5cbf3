use physbox_engine::core::{Aabb, Vec2};
use physbox_engine::domain::materials::particle_radius;
use physbox_engine::{
    BodyParams, Command, DropletParams, EngineError, SharedWorld, SimConfig, WorldCore,
};

fn running(config: SimConfig) -> WorldCore {
    let mut world = WorldCore::with_config(400.0, 200.0, config).unwrap();
    world.start();
    world
}

fn floor() -> BodyParams {
    BodyParams::new(Vec2::new(200.0, 190.0), 100.0, 20.0).fixed()
}

#[test]
fn box_comes_to_rest_on_static_floor() {
    let config = SimConfig::default();
    let mut world = running(config.clone());
    world.spawn_body(&floor()).unwrap();
    let id = world.spawn_body(&BodyParams::new(Vec2::new(200.0, 100.0), 10.0, 10.0)).unwrap();

    for _ in 0..300 {
        world.step();
    }

    let body = world.body(id).unwrap();
    let floor_top = 180.0;
    let penetration = body.pos.y + body.extents().y - floor_top;
    let dt = config.sub_step_dt();
    let allowed = config.penetration_slop + config.gravity.length() * dt * dt / config.correction_factor;
    assert!(penetration <= allowed + 0.05, "penetration {penetration} > {allowed}");
    assert!(penetration > -0.5, "hovering {penetration}");
    assert!(body.velocity.length() < 1.0, "still moving {:?}", body.velocity);
    assert!(body.angle.abs() < 0.01);
}

#[test]
fn overlap_with_floor_only_shrinks() {
    let mut world = running(SimConfig::default());
    world.spawn_body(&floor()).unwrap();
    let id = world.spawn_body(&BodyParams::new(Vec2::new(200.0, 179.0), 10.0, 10.0)).unwrap();
    let floor_top = 180.0;
    let depth = |w: &WorldCore| {
        let body = w.body(id).unwrap();
        body.pos.y + body.extents().y - floor_top
    };

    let mut last = depth(&world);
    assert!((last - 4.0).abs() < 1e-4);
    for step in 0..120 {
        world.step();
        let now = depth(&world);
        assert!(now <= last + 1e-3, "step {step}: penetration grew {last} -> {now}");
        last = now;
    }
    assert!(last < 1.0, "still {last} deep");
}

#[test]
fn static_bodies_never_move() {
    let mut world = running(SimConfig::default());
    let floor = world.spawn_body(&floor()).unwrap();
    let tilted = world
        .spawn_body(&BodyParams::new(Vec2::new(300.0, 120.0), 60.0, 8.0).with_angle(0.4).fixed())
        .unwrap();
    for i in 0..6 {
        let x = 160.0 + i as f32 * 25.0;
        world.spawn_body(&BodyParams::new(Vec2::new(x, 40.0), 12.0, 12.0).with_mass(3.0)).unwrap();
    }
    world.start_emitting(Vec2::new(290.0, 60.0), &DropletParams::default()).unwrap();

    let before: Vec<_> = [floor, tilted].iter().map(|&id| world.body(id).unwrap().clone()).collect();
    for _ in 0..200 {
        world.step();
    }
    for b in before {
        let now = world.body(b.id).unwrap();
        assert_eq!(now.pos, b.pos);
        assert_eq!(now.angle, b.angle);
    }
}

#[test]
fn elastic_collision_conserves_momentum() {
    let config = SimConfig { gravity: Vec2::ZERO, ..SimConfig::default() };
    let dt = config.time_step;
    let mut world = running(config);
    let free = |x: f32, mass: f32| {
        BodyParams::new(Vec2::new(x, 100.0), 20.0, 20.0)
            .with_mass(mass)
            .with_elasticity(1.0)
            .with_friction(0.0, 0.0)
    };
    let a = world.spawn_body(&free(100.0, 1.0)).unwrap();
    let b = world.spawn_body(&free(200.0, 2.0)).unwrap();
    // A move hands the body the implied velocity.
    world.move_body(a, Vec2::new(100.0 + 100.0 * dt, 100.0));
    world.move_body(b, Vec2::new(200.0 - 100.0 * dt, 100.0));

    let momentum = |w: &WorldCore| -> Vec2 {
        w.bodies().iter().fold(Vec2::ZERO, |acc, body| acc + body.velocity * body.mass)
    };
    let p0 = momentum(&world);
    assert!((p0.x + 100.0).abs() < 0.1);

    for _ in 0..40 {
        world.step();
    }
    let va = world.body(a).unwrap().velocity.x;
    assert!(va < 0.0, "no collision happened: {va}");
    let p1 = momentum(&world);
    assert!((p1 - p0).length() < 1e-2 * p0.length(), "{p0:?} -> {p1:?}");
}

#[test]
fn everything_stays_inside_the_arena() {
    let mut world = running(SimConfig::default());
    let arena = Aabb::new(Vec2::ZERO, Vec2::new(400.0, 200.0));
    for i in 0..8 {
        let x = 30.0 + i as f32 * 45.0;
        let params = BodyParams::new(Vec2::new(x, 30.0 + (i % 3) as f32 * 30.0), 18.0, 10.0)
            .with_angle(i as f32 * 0.3)
            .with_elasticity(0.9);
        world.spawn_body(&params).unwrap();
    }
    for i in 0..5 {
        let droplet = DropletParams { count: 40, ..DropletParams::default() };
        world.emit_droplet(Vec2::new(10.0 + i as f32 * 90.0, 10.0), &droplet).unwrap();
    }

    let r = particle_radius();
    for _ in 0..240 {
        world.step();
        for body in world.bodies() {
            assert!(arena.encloses(&body.aabb(), 1e-3), "body {:?} at {:?}", body.id, body.pos);
        }
        for p in world.particles() {
            assert!(p.pos.is_finite());
            assert!(p.pos.x >= r - 1e-3 && p.pos.x <= 400.0 - r + 1e-3, "{:?}", p.pos);
            assert!(p.pos.y >= r - 1e-3 && p.pos.y <= 200.0 - r + 1e-3, "{:?}", p.pos);
        }
    }
}

#[test]
fn droplets_respect_count_and_cap() {
    let config = SimConfig { max_particles: 25, ..SimConfig::default() };
    let mut world = running(config);
    let droplet = DropletParams { count: 10, ..DropletParams::default() };
    let at = Vec2::new(200.0, 50.0);

    assert_eq!(world.emit_droplet(at, &droplet).unwrap().emitted, 10);
    assert_eq!(world.emit_droplet(at, &droplet).unwrap().emitted, 10);
    let capped = world.emit_droplet(at, &droplet).unwrap();
    assert_eq!((capped.emitted, capped.dropped), (5, 5));
    assert_eq!(world.particles().len(), 25);

    let none = DropletParams { count: 0, ..droplet };
    assert!(matches!(world.emit_droplet(at, &none), Err(EngineError::InvalidParameter(_))));
    let heavy = DropletParams { density: -1.0, ..droplet };
    assert!(world.emit_droplet(at, &heavy).is_err());
    assert_eq!(world.particles().len(), 25);

    world.clear_fluid();
    assert!(world.particles().is_empty());
}

#[test]
fn fluid_does_not_push_bodies() {
    let config = SimConfig { gravity: Vec2::ZERO, ..SimConfig::default() };
    let mut world = running(config);
    let id = world.spawn_body(&BodyParams::new(Vec2::new(200.0, 100.0), 40.0, 40.0)).unwrap();
    let droplet = DropletParams { count: 60, ..DropletParams::default() };
    world.emit_droplet(Vec2::new(200.0, 100.0), &droplet).unwrap();
    for _ in 0..30 {
        world.step();
    }
    let body = world.body(id).unwrap();
    assert_eq!(body.pos, Vec2::new(200.0, 100.0));
    assert_eq!(body.velocity, Vec2::ZERO);
}

#[test]
fn intents_from_other_threads_apply_on_next_step() {
    let shared = SharedWorld::new(WorldCore::new(400.0, 200.0).unwrap());
    let handles: Vec<_> = (0..3)
        .map(|i| {
            let tx = shared.intent_sender();
            std::thread::spawn(move || {
                let params = BodyParams::new(Vec2::new(60.0 + i as f32 * 100.0, 50.0), 10.0, 10.0);
                tx.send(Command::SpawnBody(params));
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert!(!shared.step());
    assert!(shared.snapshot().bodies.is_empty());

    shared.write().start();
    assert!(shared.step());
    assert_eq!(shared.snapshot().bodies.len(), 3);
}
