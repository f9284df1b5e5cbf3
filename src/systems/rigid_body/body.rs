use serde::{Deserialize, Serialize};

use crate::core::{Aabb, Vec2};
use crate::domain::Color;

use super::params::BodyParams;

/// Stable identifier of a body for its whole life.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BodyId(pub u32);

// Outward face normals in local space, face i runs from corner i to corner i + 1.
const LOCAL_NORMALS: [Vec2; 4] = [
    Vec2::new(0.0, -1.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(-1.0, 0.0),
];

/// Rigid rectangle
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    pub id: BodyId,

    // === Physics State ===
    /// World position (center of mass)
    pub pos: Vec2,
    /// Orientation (radians)
    pub angle: f32,
    /// Linear velocity (cm/s)
    pub velocity: Vec2,
    /// Angular velocity (rad/s)
    pub angular_vel: f32,

    // === Shape ===
    pub half_width: f32,
    pub half_height: f32,

    // === Material ===
    /// Mass in kg, zero means immovable
    pub mass: f32,
    pub is_static: bool,
    pub elasticity: f32,
    pub static_friction: f32,
    pub dynamic_friction: f32,
    pub color: Color,

    /// Under user drag: kinematic until released.
    #[serde(skip)]
    pub grabbed: bool,
    /// External force accumulated for the next integration.
    #[serde(skip)]
    pub force: Vec2,
}

impl Body {
    pub fn from_params(id: BodyId, params: &BodyParams) -> Self {
        Self {
            id,
            pos: params.position,
            angle: params.angle,
            velocity: Vec2::ZERO,
            angular_vel: 0.0,
            half_width: params.width * 0.5,
            half_height: params.height * 0.5,
            mass: params.mass.max(0.0),
            is_static: params.is_static,
            elasticity: params.elasticity,
            static_friction: params.static_friction,
            dynamic_friction: params.dynamic_friction,
            color: params.color,
            grabbed: false,
            force: Vec2::ZERO,
        }
    }

    pub fn width(&self) -> f32 {
        self.half_width * 2.0
    }

    pub fn height(&self) -> f32 {
        self.half_height * 2.0
    }

    /// Static, or a non-static body of zero mass.
    #[inline]
    pub fn is_immovable(&self) -> bool {
        self.is_static || self.mass <= 0.0
    }

    /// Moved by gravity and integration this step.
    #[inline]
    pub fn is_simulated(&self) -> bool {
        !self.is_immovable() && !self.grabbed
    }

    #[inline]
    pub fn inv_mass(&self) -> f32 {
        if self.is_simulated() {
            1.0 / self.mass
        } else {
            0.0
        }
    }

    /// Moment of inertia of a solid rectangle: m(w² + h²) / 12
    #[inline]
    pub fn inertia(&self) -> f32 {
        let w = self.width();
        let h = self.height();
        self.mass * (w * w + h * h) / 12.0
    }

    #[inline]
    pub fn inv_inertia(&self) -> f32 {
        let i = self.inertia();
        if self.is_simulated() && i > 0.0 {
            1.0 / i
        } else {
            0.0
        }
    }

    /// Radius of the circle enclosing the body at any orientation.
    #[inline]
    pub fn half_diagonal(&self) -> f32 {
        (self.half_width * self.half_width + self.half_height * self.half_height).sqrt()
    }

    /// Half-size of the axis-aligned box around the rotated rectangle.
    pub fn extents(&self) -> Vec2 {
        let (sin, cos) = self.angle.sin_cos();
        Vec2::new(
            cos.abs() * self.half_width + sin.abs() * self.half_height,
            sin.abs() * self.half_width + cos.abs() * self.half_height,
        )
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.pos, self.extents())
    }

    #[inline]
    pub fn local_to_world(&self, local: Vec2) -> Vec2 {
        let (sin, cos) = self.angle.sin_cos();
        self.pos + local.rotate_sc(sin, cos)
    }

    #[inline]
    pub fn world_to_local(&self, world: Vec2) -> Vec2 {
        let (sin, cos) = self.angle.sin_cos();
        (world - self.pos).rotate_sc(-sin, cos)
    }

    /// World-space corners, face `i` runs from corner `i` to corner `i + 1`.
    pub fn corners(&self) -> [Vec2; 4] {
        let (sin, cos) = self.angle.sin_cos();
        let (hw, hh) = (self.half_width, self.half_height);
        [
            Vec2::new(-hw, -hh),
            Vec2::new(hw, -hh),
            Vec2::new(hw, hh),
            Vec2::new(-hw, hh),
        ]
        .map(|c| self.pos + c.rotate_sc(sin, cos))
    }

    /// World-space outward face normals, matching [`Body::corners`].
    pub fn normals(&self) -> [Vec2; 4] {
        let (sin, cos) = self.angle.sin_cos();
        LOCAL_NORMALS.map(|n| n.rotate_sc(sin, cos))
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        let local = self.world_to_local(point);
        local.x.abs() <= self.half_width && local.y.abs() <= self.half_height
    }

    /// Velocity of the body material at world point `point`.
    #[inline]
    pub fn velocity_at(&self, point: Vec2) -> Vec2 {
        self.velocity + Vec2::cross_scalar(self.angular_vel, point - self.pos)
    }

    /// Impulse applied at offset `r` from the center of mass.
    #[inline]
    pub fn apply_impulse(&mut self, impulse: Vec2, r: Vec2) {
        self.velocity += impulse * self.inv_mass();
        self.angular_vel += r.cross(impulse) * self.inv_inertia();
    }

    pub fn is_finite(&self) -> bool {
        self.pos.is_finite()
            && self.velocity.is_finite()
            && self.angle.is_finite()
            && self.angular_vel.is_finite()
    }
}
