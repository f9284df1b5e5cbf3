//! SimConfig - every runtime-tunable constant of the simulation.
//!
//! The UI "Config" tool edits these one option at a time through
//! [`SimConfig::set_option`]; a whole config can also be loaded from JSON.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::{EngineError, Result, Vec2};

/// How two per-body coefficients are merged into one for a contact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CombineRule {
    Min,
    #[default]
    GeometricMean,
    Average,
    Max,
    Multiply,
}

impl CombineRule {
    pub fn combine(self, a: f32, b: f32) -> f32 {
        match self {
            Self::Min => a.min(b),
            Self::GeometricMean => (a * b).max(0.0).sqrt(),
            Self::Average => (a + b) * 0.5,
            Self::Max => a.max(b),
            Self::Multiply => a * b,
        }
    }

    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Self::Min),
            1 => Some(Self::GeometricMean),
            2 => Some(Self::Average),
            3 => Some(Self::Max),
            4 => Some(Self::Multiply),
            _ => None,
        }
    }

    pub fn index(self) -> u32 {
        match self {
            Self::Min => 0,
            Self::GeometricMean => 1,
            Self::Average => 2,
            Self::Max => 3,
            Self::Multiply => 4,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimConfig {
    /// Gravity acceleration (cm/s²), +y points down.
    pub gravity: Vec2,
    /// Fixed simulation step (s).
    pub time_step: f32,
    /// Pipeline repetitions per step, each advancing `time_step / sub_steps`.
    pub sub_steps: u32,
    /// Impulse passes over the contact set per sub-step.
    pub solver_iterations: u32,
    /// Fraction of penetration removed per sub-step (Baumgarte).
    pub correction_factor: f32,
    /// Penetration tolerated without positional correction.
    pub penetration_slop: f32,
    /// Friction combination between two bodies. Elasticity always uses the minimum.
    pub friction_rule: CombineRule,

    /// Fluid smoothing radius (cm).
    pub interaction_radius: f32,
    /// Pressure stiffness against deviation from `rest_density`.
    pub stiffness: f32,
    /// Near-pressure stiffness, keeps particles from clumping.
    pub near_stiffness: f32,
    pub rest_density: f32,
    /// Pairwise damping of approach speed (1/s).
    pub viscosity: f32,
    /// Bounce of particles off bodies and arena walls.
    pub particle_restitution: f32,
    /// Emission beyond this count is dropped.
    pub max_particles: usize,
    pub max_particle_speed: f32,

    /// Upper bound on steps taken for one `advance` call.
    pub max_steps_per_frame: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, 981.0),
            time_step: 1.0 / 60.0,
            sub_steps: 2,
            solver_iterations: 5,
            correction_factor: 0.4,
            penetration_slop: 0.05,
            friction_rule: CombineRule::GeometricMean,

            interaction_radius: 12.0,
            stiffness: 4_000.0,
            near_stiffness: 8_000.0,
            rest_density: 2.5,
            viscosity: 8.0,
            particle_restitution: 0.3,
            max_particles: 5_000,
            max_particle_speed: 1_000.0,

            max_steps_per_frame: 8,
        }
    }
}

impl SimConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SimConfig =
            serde_json::from_str(json).map_err(|e| EngineError::invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Length of one sub-step.
    #[inline]
    pub fn sub_step_dt(&self) -> f32 {
        self.time_step / self.sub_steps.max(1) as f32
    }

    pub fn validate(&self) -> Result<()> {
        if !self.gravity.is_finite() {
            return Err(EngineError::invalid("gravity must be finite"));
        }
        if !(self.time_step.is_finite() && self.time_step > 0.0 && self.time_step <= 0.1) {
            return Err(EngineError::invalid("time_step must be in (0, 0.1] seconds"));
        }
        if !(1..=16).contains(&self.sub_steps) {
            return Err(EngineError::invalid("sub_steps must be in 1..=16"));
        }
        if !(1..=50).contains(&self.solver_iterations) {
            return Err(EngineError::invalid("solver_iterations must be in 1..=50"));
        }
        if !(self.correction_factor > 0.0 && self.correction_factor < 1.0) {
            return Err(EngineError::invalid("correction_factor must be in (0, 1)"));
        }
        check_non_negative("penetration_slop", self.penetration_slop)?;
        if !(self.interaction_radius.is_finite() && self.interaction_radius > 0.0) {
            return Err(EngineError::invalid("interaction_radius must be > 0"));
        }
        check_non_negative("stiffness", self.stiffness)?;
        check_non_negative("near_stiffness", self.near_stiffness)?;
        check_non_negative("rest_density", self.rest_density)?;
        check_non_negative("viscosity", self.viscosity)?;
        if !(0.0..=1.0).contains(&self.particle_restitution) {
            return Err(EngineError::invalid("particle_restitution must be in [0, 1]"));
        }
        if self.max_particles > MAX_PARTICLE_CAP {
            return Err(EngineError::invalid(format!(
                "max_particles must be <= {MAX_PARTICLE_CAP}"
            )));
        }
        if !(self.max_particle_speed.is_finite() && self.max_particle_speed > 0.0) {
            return Err(EngineError::invalid("max_particle_speed must be > 0"));
        }
        if !(1..=120).contains(&self.max_steps_per_frame) {
            return Err(EngineError::invalid("max_steps_per_frame must be in 1..=120"));
        }
        Ok(())
    }

    /// Set one option by name. On failure the config is left untouched.
    pub fn set_option(&mut self, name: &str, value: f64) -> Result<()> {
        let option: ConfigOption = name.parse()?;
        let mut next = self.clone();
        next.apply(option, value)?;
        next.validate()?;
        *self = next;
        Ok(())
    }

    pub fn get_option(&self, name: &str) -> Result<f64> {
        let option: ConfigOption = name.parse()?;
        Ok(self.read(option))
    }

    fn apply(&mut self, option: ConfigOption, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(EngineError::invalid(format!("{option} must be finite")));
        }
        let v = value as f32;
        match option {
            ConfigOption::Gravity => {
                if v < 0.0 {
                    return Err(EngineError::invalid("gravity magnitude must be >= 0"));
                }
                let dir = self.gravity.try_normalize().unwrap_or(Vec2::new(0.0, 1.0));
                self.gravity = dir * v;
            }
            ConfigOption::GravityX => self.gravity.x = v,
            ConfigOption::GravityY => self.gravity.y = v,
            ConfigOption::TimeStep => self.time_step = v,
            ConfigOption::SubSteps => self.sub_steps = as_count(option, value)? as u32,
            ConfigOption::SolverIterations => {
                self.solver_iterations = as_count(option, value)? as u32
            }
            ConfigOption::CorrectionFactor => self.correction_factor = v,
            ConfigOption::PenetrationSlop => self.penetration_slop = v,
            ConfigOption::FrictionRule => {
                let index = as_count(option, value)? as u32;
                self.friction_rule = CombineRule::from_index(index).ok_or_else(|| {
                    EngineError::invalid(format!("unknown friction rule {index}"))
                })?;
            }
            ConfigOption::InteractionRadius => self.interaction_radius = v,
            ConfigOption::Stiffness => self.stiffness = v,
            ConfigOption::NearStiffness => self.near_stiffness = v,
            ConfigOption::RestDensity => self.rest_density = v,
            ConfigOption::Viscosity => self.viscosity = v,
            ConfigOption::ParticleRestitution => self.particle_restitution = v,
            ConfigOption::MaxParticles => self.max_particles = as_count(option, value)?,
            ConfigOption::MaxParticleSpeed => self.max_particle_speed = v,
            ConfigOption::MaxStepsPerFrame => {
                self.max_steps_per_frame = as_count(option, value)? as u32
            }
        }
        Ok(())
    }

    fn read(&self, option: ConfigOption) -> f64 {
        match option {
            ConfigOption::Gravity => self.gravity.length() as f64,
            ConfigOption::GravityX => self.gravity.x as f64,
            ConfigOption::GravityY => self.gravity.y as f64,
            ConfigOption::TimeStep => self.time_step as f64,
            ConfigOption::SubSteps => self.sub_steps as f64,
            ConfigOption::SolverIterations => self.solver_iterations as f64,
            ConfigOption::CorrectionFactor => self.correction_factor as f64,
            ConfigOption::PenetrationSlop => self.penetration_slop as f64,
            ConfigOption::FrictionRule => self.friction_rule.index() as f64,
            ConfigOption::InteractionRadius => self.interaction_radius as f64,
            ConfigOption::Stiffness => self.stiffness as f64,
            ConfigOption::NearStiffness => self.near_stiffness as f64,
            ConfigOption::RestDensity => self.rest_density as f64,
            ConfigOption::Viscosity => self.viscosity as f64,
            ConfigOption::ParticleRestitution => self.particle_restitution as f64,
            ConfigOption::MaxParticles => self.max_particles as f64,
            ConfigOption::MaxParticleSpeed => self.max_particle_speed as f64,
            ConfigOption::MaxStepsPerFrame => self.max_steps_per_frame as f64,
        }
    }
}

const MAX_PARTICLE_CAP: usize = 1_000_000;

fn check_non_negative(name: &str, v: f32) -> Result<()> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(EngineError::invalid(format!("{name} must be >= 0")))
    }
}

fn as_count(option: ConfigOption, value: f64) -> Result<usize> {
    if value < 0.0 || value.fract() != 0.0 || value > MAX_PARTICLE_CAP as f64 {
        return Err(EngineError::invalid(format!(
            "{option} must be a non-negative integer"
        )));
    }
    Ok(value as usize)
}

/// Names of the independently settable options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigOption {
    Gravity,
    GravityX,
    GravityY,
    TimeStep,
    SubSteps,
    SolverIterations,
    CorrectionFactor,
    PenetrationSlop,
    FrictionRule,
    InteractionRadius,
    Stiffness,
    NearStiffness,
    RestDensity,
    Viscosity,
    ParticleRestitution,
    MaxParticles,
    MaxParticleSpeed,
    MaxStepsPerFrame,
}

impl ConfigOption {
    pub const ALL: [ConfigOption; 18] = [
        Self::Gravity,
        Self::GravityX,
        Self::GravityY,
        Self::TimeStep,
        Self::SubSteps,
        Self::SolverIterations,
        Self::CorrectionFactor,
        Self::PenetrationSlop,
        Self::FrictionRule,
        Self::InteractionRadius,
        Self::Stiffness,
        Self::NearStiffness,
        Self::RestDensity,
        Self::Viscosity,
        Self::ParticleRestitution,
        Self::MaxParticles,
        Self::MaxParticleSpeed,
        Self::MaxStepsPerFrame,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Gravity => "gravity",
            Self::GravityX => "gravity_x",
            Self::GravityY => "gravity_y",
            Self::TimeStep => "time_step",
            Self::SubSteps => "sub_steps",
            Self::SolverIterations => "solver_iterations",
            Self::CorrectionFactor => "correction_factor",
            Self::PenetrationSlop => "penetration_slop",
            Self::FrictionRule => "friction_rule",
            Self::InteractionRadius => "interaction_radius",
            Self::Stiffness => "stiffness",
            Self::NearStiffness => "near_stiffness",
            Self::RestDensity => "rest_density",
            Self::Viscosity => "viscosity",
            Self::ParticleRestitution => "particle_restitution",
            Self::MaxParticles => "max_particles",
            Self::MaxParticleSpeed => "max_particle_speed",
            Self::MaxStepsPerFrame => "max_steps_per_frame",
        }
    }
}

impl fmt::Display for ConfigOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConfigOption {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|o| o.name() == s)
            .ok_or_else(|| EngineError::invalid(format!("unknown config option {s:?}")))
    }
}
