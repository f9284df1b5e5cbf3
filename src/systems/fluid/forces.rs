//! Pairwise fluid forces (double-density relaxation expressed as forces).
//!
//! With `q = 1 - d/h` for neighbors closer than the smoothing radius `h`:
//! - density `ρ = Σ q²`, near-density `ρn = Σ q³`
//! - pair force along the pair axis
//!   `(k·(ρ̄ - ρ0)·q + kn·ρ̄n·q² + μ·q·u)·m̄`
//!   with pair means `ρ̄`, `ρ̄n`, approach speed `u` and mean mass `m̄`.
//!
//! Every term is symmetric in the pair, so `F_ij == -F_ji` exactly.

use crate::core::Vec2;
use crate::domain::SimConfig;

/// Coefficients of the pair force, copied out of [`SimConfig`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForceParams {
    pub radius: f32,
    pub stiffness: f32,
    pub near_stiffness: f32,
    pub rest_density: f32,
    pub viscosity: f32,
}

impl ForceParams {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            radius: config.interaction_radius,
            stiffness: config.stiffness,
            near_stiffness: config.near_stiffness,
            rest_density: config.rest_density,
            viscosity: config.viscosity,
        }
    }
}

/// Read-only view of one particle for the force kernels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub index: usize,
    pub pos: Vec2,
    pub velocity: Vec2,
    pub mass: f32,
    pub density: f32,
    pub near_density: f32,
}

/// `q = 1 - d/h`, `None` outside the smoothing radius.
#[inline]
pub fn kernel(d: f32, h: f32) -> Option<f32> {
    if d < h {
        Some(1.0 - d / h)
    } else {
        None
    }
}

/// Unit axis from `i` to `j`. Coincident particles get an axis ordered by index.
#[inline]
fn pair_axis(i: &Sample, j: &Sample, d: f32) -> Vec2 {
    if d > 0.0 {
        (j.pos - i.pos) / d
    } else if i.index < j.index {
        Vec2::new(1.0, 0.0)
    } else {
        Vec2::new(-1.0, 0.0)
    }
}

/// Force on `i` due to `j`. Zero when out of range or identical.
pub fn pair_force(i: &Sample, j: &Sample, params: &ForceParams) -> Vec2 {
    if i.index == j.index {
        return Vec2::ZERO;
    }
    let d = (j.pos - i.pos).length();
    let Some(q) = kernel(d, params.radius) else {
        return Vec2::ZERO;
    };
    let axis = pair_axis(i, j, d);

    let density = (i.density + j.density) * 0.5;
    let near = (i.near_density + j.near_density) * 0.5;
    let approach = (i.velocity - j.velocity).dot(axis);
    let mass = (i.mass + j.mass) * 0.5;

    let pressure = params.stiffness * (density - params.rest_density) * q
        + params.near_stiffness * near * q * q;
    let damping = params.viscosity * q * approach;

    let f = axis * (-(pressure + damping) * mass);
    if f.is_finite() {
        f
    } else {
        Vec2::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(index: usize, x: f32, y: f32, vx: f32) -> Sample {
        Sample {
            index,
            pos: Vec2::new(x, y),
            velocity: Vec2::new(vx, 0.0),
            mass: 0.02,
            density: 3.0 + index as f32 * 0.5,
            near_density: 1.0 + index as f32 * 0.1,
        }
    }

    fn params() -> ForceParams {
        ForceParams::from_config(&SimConfig::default())
    }

    #[test]
    fn pair_forces_are_equal_and_opposite() {
        let cases = [
            (sample(0, 10.0, 10.0, 5.0), sample(1, 13.3, 11.7, -2.0)),
            (sample(3, 0.0, 0.0, 0.0), sample(7, 0.0, 0.0, 1.0)),
            (sample(5, 1.0, 2.0, -3.0), sample(2, 9.0, 2.5, 4.0)),
        ];
        for (a, b) in cases {
            let fab = pair_force(&a, &b, &params());
            let fba = pair_force(&b, &a, &params());
            assert_eq!(fab, -fba);
        }
    }

    #[test]
    fn compressed_pair_repels() {
        let a = sample(0, 0.0, 0.0, 0.0);
        let b = sample(1, 2.0, 0.0, 0.0);
        let f = pair_force(&a, &b, &params());
        assert!(f.x < 0.0);
    }

    #[test]
    fn out_of_range_pair_has_no_force() {
        let a = sample(0, 0.0, 0.0, 0.0);
        let b = sample(1, 50.0, 0.0, 0.0);
        assert_eq!(pair_force(&a, &b, &params()), Vec2::ZERO);
    }
}
