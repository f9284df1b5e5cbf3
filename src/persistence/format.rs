//! On-disk save record: pretty JSON, tagged with a format name and version.

use serde::{Deserialize, Serialize};

use crate::core::{EngineError, Result};
use crate::systems::rigid_body::Body;
use crate::systems::Particle;

pub const SAVE_FORMAT: &str = "physbox-save";
pub const SAVE_VERSION: u32 = 1;

/// Everything needed to rebuild a world's entity set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRecord {
    pub format: String,
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub width: f32,
    pub height: f32,
    pub body_count: usize,
    pub particle_count: usize,
    pub bodies: Vec<Body>,
    pub particles: Vec<Particle>,
}

impl SaveRecord {
    pub fn new(
        name: &str,
        description: &str,
        width: f32,
        height: f32,
        bodies: Vec<Body>,
        particles: Vec<Particle>,
    ) -> Self {
        Self {
            format: SAVE_FORMAT.to_string(),
            version: SAVE_VERSION,
            name: name.to_string(),
            description: description.to_string(),
            width,
            height,
            body_count: bodies.len(),
            particle_count: particles.len(),
            bodies,
            particles,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| EngineError::Storage(e.to_string()))
    }

    /// Parse and validate. Any problem is `CorruptData`.
    pub fn from_json(json: &str) -> Result<Self> {
        let record: SaveRecord =
            serde_json::from_str(json).map_err(|e| EngineError::corrupt(e.to_string()))?;
        record.validate()?;
        Ok(record)
    }

    pub fn validate(&self) -> Result<()> {
        if self.format != SAVE_FORMAT {
            return Err(EngineError::corrupt(format!("unknown format tag {:?}", self.format)));
        }
        if self.version != SAVE_VERSION {
            return Err(EngineError::corrupt(format!("unsupported version {}", self.version)));
        }
        if !(self.width.is_finite() && self.width > 0.0 && self.height.is_finite() && self.height > 0.0)
        {
            return Err(EngineError::corrupt("arena size must be positive"));
        }
        if self.body_count != self.bodies.len() || self.particle_count != self.particles.len() {
            return Err(EngineError::corrupt(format!(
                "entity counts {}/{} do not match {}/{} stored",
                self.body_count,
                self.particle_count,
                self.bodies.len(),
                self.particles.len()
            )));
        }
        for (i, body) in self.bodies.iter().enumerate() {
            check_body(body).map_err(|why| EngineError::corrupt(format!("body {i}: {why}")))?;
            let ext = body.extents();
            if ext.x * 2.0 > self.width || ext.y * 2.0 > self.height {
                return Err(EngineError::corrupt(format!(
                    "body {i}: does not fit the {}x{} arena",
                    self.width, self.height
                )));
            }
        }
        let mut ids: Vec<u32> = self.bodies.iter().map(|b| b.id.0).collect();
        ids.sort_unstable();
        if ids.windows(2).any(|w| w[0] == w[1]) {
            return Err(EngineError::corrupt("duplicate body id"));
        }
        for (i, p) in self.particles.iter().enumerate() {
            if !p.is_finite() {
                return Err(EngineError::corrupt(format!("particle {i}: non-finite state")));
            }
            if p.density <= 0.0 {
                return Err(EngineError::corrupt(format!("particle {i}: density must be > 0")));
            }
        }
        Ok(())
    }
}

fn check_body(b: &Body) -> std::result::Result<(), &'static str> {
    if !b.is_finite() {
        return Err("non-finite state");
    }
    if b.half_width <= 0.0 || b.half_height <= 0.0 {
        return Err("dimensions must be > 0");
    }
    if b.mass < 0.0 {
        return Err("mass must be >= 0");
    }
    if !(0.0..=1.0).contains(&b.elasticity) {
        return Err("elasticity outside [0, 1]");
    }
    if b.static_friction < 0.0 || b.dynamic_friction < 0.0 {
        return Err("friction must be >= 0");
    }
    Ok(())
}
