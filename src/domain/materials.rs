//! Material constants shared by bodies and fluids.
//!
//! Units: 1 world unit = 1 cm, mass in kg, fluid density in g/cm³.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

pub const DEFAULT_ELASTICITY: f32 = 0.4;
pub const DEFAULT_STATIC_FRICTION: f32 = 0.3;
pub const DEFAULT_DYNAMIC_FRICTION: f32 = 0.2;

/// Volume represented by a single fluid particle (cm³).
pub const PARTICLE_VOLUME: f32 = 20.0;

/// Collision radius of every fluid particle, from the disc of area `PARTICLE_VOLUME`.
#[inline]
pub fn particle_radius() -> f32 {
    (PARTICLE_VOLUME / PI).sqrt()
}

/// Mass (kg) of one particle of a fluid with `density` g/cm³.
#[inline]
pub fn particle_mass(density: f32) -> f32 {
    PARTICLE_VOLUME * density * 0.001
}

/// Water
pub const DEFAULT_FLUID_DENSITY: f32 = 1.0;
/// Lightest fluid the sandbox offers (between hydrogen and helium).
pub const MIN_FLUID_DENSITY: f32 = 0.1;
/// Heaviest fluid the sandbox offers (mercury at room temperature).
pub const MAX_FLUID_DENSITY: f32 = 13.5;

pub const DEFAULT_FLUID_COLOR: Color = Color::rgb(10, 24, 189);
pub const DEFAULT_BODY_COLOR: Color = Color::rgb(96, 96, 104);

/// RGBA color, 8 bits per channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Packed ABGR (little-endian bytes `[R, G, B, A]`), ready for a canvas `ImageData` copy.
    #[inline]
    pub fn to_abgr(self) -> u32 {
        ((self.a as u32) << 24) | ((self.b as u32) << 16) | ((self.g as u32) << 8) | self.r as u32
    }

    #[inline]
    pub fn from_abgr(packed: u32) -> Self {
        Self {
            r: (packed & 0xFF) as u8,
            g: ((packed >> 8) & 0xFF) as u8,
            b: ((packed >> 16) & 0xFF) as u8,
            a: (packed >> 24) as u8,
        }
    }
}
