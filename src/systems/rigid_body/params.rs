use serde::{Deserialize, Serialize};

use crate::core::{EngineError, Result, Vec2};
use crate::domain::materials::{
    DEFAULT_BODY_COLOR, DEFAULT_DYNAMIC_FRICTION, DEFAULT_ELASTICITY, DEFAULT_STATIC_FRICTION,
};
use crate::domain::Color;

/// Everything needed to place a new body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BodyParams {
    pub position: Vec2,
    pub width: f32,
    pub height: f32,
    /// Orientation in radians.
    pub angle: f32,
    /// Mass in kg. Zero makes the body immovable.
    pub mass: f32,
    pub is_static: bool,
    pub elasticity: f32,
    pub static_friction: f32,
    pub dynamic_friction: f32,
    pub color: Color,
}

impl Default for BodyParams {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            width: 10.0,
            height: 10.0,
            angle: 0.0,
            mass: 1.0,
            is_static: false,
            elasticity: DEFAULT_ELASTICITY,
            static_friction: DEFAULT_STATIC_FRICTION,
            dynamic_friction: DEFAULT_DYNAMIC_FRICTION,
            color: DEFAULT_BODY_COLOR,
        }
    }
}

impl BodyParams {
    pub fn new(position: Vec2, width: f32, height: f32) -> Self {
        Self { position, width, height, ..Self::default() }
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_elasticity(mut self, elasticity: f32) -> Self {
        self.elasticity = elasticity;
        self
    }

    pub fn with_friction(mut self, static_friction: f32, dynamic_friction: f32) -> Self {
        self.static_friction = static_friction;
        self.dynamic_friction = dynamic_friction;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Mark as static (never moved by the simulation).
    pub fn fixed(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Shape and material checks. Arena fit is checked by the system.
    pub fn validate(&self) -> Result<()> {
        if !self.position.is_finite() || !self.angle.is_finite() {
            return Err(EngineError::invalid("position and angle must be finite"));
        }
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(EngineError::invalid(format!("width must be > 0, got {}", self.width)));
        }
        if !(self.height.is_finite() && self.height > 0.0) {
            return Err(EngineError::invalid(format!("height must be > 0, got {}", self.height)));
        }
        if !self.mass.is_finite() || (!self.is_static && self.mass < 0.0) {
            return Err(EngineError::invalid(format!("mass must be >= 0, got {}", self.mass)));
        }
        if !(0.0..=1.0).contains(&self.elasticity) {
            return Err(EngineError::invalid("elasticity must be in [0, 1]"));
        }
        if !(self.static_friction.is_finite() && self.static_friction >= 0.0)
            || !(self.dynamic_friction.is_finite() && self.dynamic_friction >= 0.0)
        {
            return Err(EngineError::invalid("friction coefficients must be >= 0"));
        }
        Ok(())
    }
}
