use serde::{Deserialize, Serialize};

use crate::core::Vec2;
use crate::domain::materials::{particle_mass, particle_radius};
use crate::domain::Color;

/// One fluid particle. Density and color are shared by its droplet group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Particle {
    pub pos: Vec2,
    pub velocity: Vec2,
    /// g/cm³
    pub density: f32,
    pub color: Color,
    /// Droplet the particle was emitted with.
    pub group: u32,
}

impl Particle {
    pub fn new(pos: Vec2, density: f32, color: Color, group: u32) -> Self {
        Self { pos, velocity: Vec2::ZERO, density, color, group }
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        particle_mass(self.density)
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        particle_radius()
    }

    pub fn is_finite(&self) -> bool {
        self.pos.is_finite() && self.velocity.is_finite() && self.density.is_finite()
    }
}
