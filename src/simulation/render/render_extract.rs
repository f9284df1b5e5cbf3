use serde::Serialize;

use crate::core::Vec2;
use crate::domain::Color;
use crate::systems::rigid_body::{Body, BodyId};
use crate::systems::Particle;

use super::{SimState, WorldCore};

/// Read-only picture of the world between steps, for renderers.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldSnapshot {
    pub width: f32,
    pub height: f32,
    pub time: f64,
    pub step_count: u64,
    pub state: SimState,
    pub bodies: Vec<BodyView>,
    pub particles: Vec<ParticleView>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyView {
    pub id: BodyId,
    pub position: Vec2,
    pub angle: f32,
    /// World-space corners in winding order.
    pub corners: [Vec2; 4],
    pub color: Color,
    pub is_static: bool,
    pub grabbed: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticleView {
    pub position: Vec2,
    pub radius: f32,
    pub color: Color,
}

impl From<&Body> for BodyView {
    fn from(b: &Body) -> Self {
        Self {
            id: b.id,
            position: b.pos,
            angle: b.angle,
            corners: b.corners(),
            color: b.color,
            is_static: b.is_static,
            grabbed: b.grabbed,
        }
    }
}

impl From<&Particle> for ParticleView {
    fn from(p: &Particle) -> Self {
        Self { position: p.pos, radius: p.radius(), color: p.color }
    }
}

pub(super) fn snapshot(world: &WorldCore) -> WorldSnapshot {
    WorldSnapshot {
        width: world.arena.width(),
        height: world.arena.height(),
        time: world.time,
        step_count: world.step_count,
        state: world.state,
        bodies: world.bodies.bodies().iter().map(BodyView::from).collect(),
        particles: world.fluid.particles().iter().map(ParticleView::from).collect(),
    }
}

/// Flat typed-array views for the browser: the JS side reads them straight
/// out of wasm memory after each frame.
#[derive(Default)]
pub(crate) struct RenderBuffers {
    /// 4 corners × (x, y) per body, paint order.
    pub(crate) body_vertices: Vec<f32>,
    /// Packed ABGR per body.
    pub(crate) body_colors: Vec<u32>,
    /// (x, y) per particle.
    pub(crate) particle_positions: Vec<f32>,
    /// Packed ABGR per particle.
    pub(crate) particle_colors: Vec<u32>,
}

pub(super) fn extract_render_buffers(world: &mut WorldCore) {
    let render = &mut world.render;
    let bodies = world.bodies.bodies();
    let particles = world.fluid.particles();

    render.body_vertices.clear();
    render.body_colors.clear();
    for body in bodies {
        for c in body.corners() {
            render.body_vertices.extend_from_slice(&[c.x, c.y]);
        }
        render.body_colors.push(body.color.to_abgr());
    }

    render.particle_positions.clear();
    render.particle_colors.clear();
    for p in particles {
        render.particle_positions.extend_from_slice(&[p.pos.x, p.pos.y]);
        render.particle_colors.push(p.color.to_abgr());
    }
}
