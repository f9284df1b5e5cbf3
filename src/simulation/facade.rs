use wasm_bindgen::prelude::*;

use crate::core::{EngineError, Vec2};
use crate::domain::{Color, SimConfig};
use crate::persistence::{MemorySlotStore, SaveRecord, SlotStore};
use crate::systems::rigid_body::{BodyId, BodyParams};
use crate::systems::DropletParams;

use super::intents::Command;
use super::perf_stats::StepStats;
use super::{SimState, WorldCore};

fn js_err(e: EngineError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Where the render buffers live in wasm memory (pointer and length in elements).
#[wasm_bindgen]
pub struct RenderLayout {
    body_vertices_ptr: u32,
    body_vertices_len: u32,
    body_colors_ptr: u32,
    body_colors_len: u32,
    particle_positions_ptr: u32,
    particle_positions_len: u32,
    particle_colors_ptr: u32,
    particle_colors_len: u32,
}

#[wasm_bindgen]
impl RenderLayout {
    #[wasm_bindgen(getter)]
    pub fn body_vertices_ptr(&self) -> u32 { self.body_vertices_ptr }
    #[wasm_bindgen(getter)]
    pub fn body_vertices_len(&self) -> u32 { self.body_vertices_len }

    #[wasm_bindgen(getter)]
    pub fn body_colors_ptr(&self) -> u32 { self.body_colors_ptr }
    #[wasm_bindgen(getter)]
    pub fn body_colors_len(&self) -> u32 { self.body_colors_len }

    #[wasm_bindgen(getter)]
    pub fn particle_positions_ptr(&self) -> u32 { self.particle_positions_ptr }
    #[wasm_bindgen(getter)]
    pub fn particle_positions_len(&self) -> u32 { self.particle_positions_len }

    #[wasm_bindgen(getter)]
    pub fn particle_colors_ptr(&self) -> u32 { self.particle_colors_ptr }
    #[wasm_bindgen(getter)]
    pub fn particle_colors_len(&self) -> u32 { self.particle_colors_len }
}

/// Browser handle: a world plus an in-memory slot store the page mirrors
/// into `localStorage` through `export_slot` / `import_slot`.
#[wasm_bindgen]
pub struct World {
    core: WorldCore,
    slots: MemorySlotStore,
}

#[wasm_bindgen]
impl World {
    /// Create a new world of `width × height` cm
    #[wasm_bindgen(constructor)]
    pub fn new(width: f32, height: f32) -> Result<World, JsValue> {
        let core = WorldCore::new(width, height).map_err(js_err)?;
        Ok(Self { core, slots: MemorySlotStore::new() })
    }

    /// Same, with a JSON `SimConfig` (missing fields take defaults)
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(width: f32, height: f32, config_json: &str) -> Result<World, JsValue> {
        let config = SimConfig::from_json(config_json).map_err(js_err)?;
        let core = WorldCore::with_config(width, height, config).map_err(js_err)?;
        Ok(Self { core, slots: MemorySlotStore::new() })
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> f32 { self.core.width() }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> f32 { self.core.height() }

    #[wasm_bindgen(getter)]
    pub fn time(&self) -> f64 { self.core.time() }

    #[wasm_bindgen(getter)]
    pub fn step_count(&self) -> u64 { self.core.step_count() }

    #[wasm_bindgen(getter)]
    pub fn body_count(&self) -> u32 { self.core.bodies().len() as u32 }

    #[wasm_bindgen(getter)]
    pub fn particle_count(&self) -> u32 { self.core.particles().len() as u32 }

    /// "idle", "running" or "paused"
    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        match self.core.state() {
            SimState::Idle => "idle",
            SimState::Running => "running",
            SimState::Paused => "paused",
        }
        .to_string()
    }

    // === LIFECYCLE ===

    pub fn start(&mut self) { self.core.start(); }

    pub fn pause(&mut self) { self.core.pause(); }

    pub fn resume(&mut self) { self.core.resume(); }

    pub fn toggle_pause(&mut self) { self.core.toggle_pause(); }

    pub fn reset(&mut self) { self.core.reset(); }

    pub fn quit(&mut self) { self.core.quit(); }

    /// Step the simulation forward by one fixed step
    pub fn step(&mut self) -> bool {
        self.core.step()
    }

    /// Feed wall-clock seconds since the last frame; returns steps taken
    pub fn advance(&mut self, elapsed: f64) -> u32 {
        self.core.advance(elapsed)
    }

    // === BODIES ===

    /// Spawn a dynamic (or static) box with default materials. Returns its id
    pub fn spawn_body(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        mass: f32,
        is_static: bool,
    ) -> Result<u32, JsValue> {
        let mut params = BodyParams::new(Vec2::new(x, y), width, height).with_mass(mass);
        params.is_static = is_static;
        self.core.spawn_body(&params).map(|id| id.0).map_err(js_err)
    }

    /// Spawn from a JSON `BodyParams` (every material attribute available)
    pub fn spawn_body_json(&mut self, params_json: &str) -> Result<u32, JsValue> {
        let params: BodyParams = serde_json::from_str(params_json)
            .map_err(|e| js_err(EngineError::invalid(e.to_string())))?;
        self.core.spawn_body(&params).map(|id| id.0).map_err(js_err)
    }

    pub fn delete_body_at(&mut self, x: f32, y: f32) -> Option<u32> {
        self.core.delete_body_at(Vec2::new(x, y)).map(|id| id.0)
    }

    pub fn move_body(&mut self, id: u32, x: f32, y: f32) -> bool {
        self.core.move_body(BodyId(id), Vec2::new(x, y))
    }

    pub fn grab_body(&mut self, x: f32, y: f32) -> Option<u32> {
        self.core.grab_body(Vec2::new(x, y)).map(|id| id.0)
    }

    pub fn drag_grabbed(&mut self, x: f32, y: f32) -> bool {
        self.core.drag_grabbed(Vec2::new(x, y))
    }

    pub fn release_body(&mut self) -> Option<u32> {
        self.core.release_body().map(|id| id.0)
    }

    // === FLUID ===

    /// `color` is packed ABGR. Returns how many particles were created
    pub fn emit_droplet(
        &mut self,
        x: f32,
        y: f32,
        count: u32,
        density: f32,
        color: u32,
    ) -> Result<u32, JsValue> {
        let droplet = DropletParams { count, density, color: Color::from_abgr(color) };
        self.core
            .emit_droplet(Vec2::new(x, y), &droplet)
            .map(|outcome| outcome.emitted)
            .map_err(js_err)
    }

    pub fn start_emitting(
        &mut self,
        x: f32,
        y: f32,
        count: u32,
        density: f32,
        color: u32,
    ) -> Result<(), JsValue> {
        let droplet = DropletParams { count, density, color: Color::from_abgr(color) };
        self.core.start_emitting(Vec2::new(x, y), &droplet).map_err(js_err)
    }

    pub fn move_emitter(&mut self, x: f32, y: f32) -> bool {
        self.core.move_emitter(Vec2::new(x, y))
    }

    pub fn stop_emitting(&mut self) { self.core.stop_emitting(); }

    pub fn clear_fluid(&mut self) { self.core.clear_fluid(); }

    pub fn clear_all(&mut self) { self.core.clear_all(); }

    /// JSON description of what is under the point, if anything
    pub fn inspect_at(&self, x: f32, y: f32) -> Option<String> {
        self.core
            .inspect_at(Vec2::new(x, y))
            .and_then(|found| serde_json::to_string(&found).ok())
    }

    /// Queue a JSON `Command` for the next step
    pub fn queue_command(&mut self, command_json: &str) -> Result<(), JsValue> {
        let command: Command = serde_json::from_str(command_json)
            .map_err(|e| js_err(EngineError::invalid(e.to_string())))?;
        self.core.intent_sender().send(command);
        Ok(())
    }

    // === SETTINGS ===

    pub fn set_option(&mut self, name: &str, value: f64) -> Result<(), JsValue> {
        self.core.set_option(name, value).map_err(js_err)
    }

    pub fn get_option(&self, name: &str) -> Result<f64, JsValue> {
        self.core.get_option(name).map_err(js_err)
    }

    pub fn config_json(&self) -> String {
        self.core.config().to_json()
    }

    pub fn set_config_json(&mut self, config_json: &str) -> Result<(), JsValue> {
        let config = SimConfig::from_json(config_json).map_err(js_err)?;
        self.core.set_config(config).map_err(js_err)
    }

    /// Enable or disable per-step timings (adds timing overhead when enabled)
    pub fn enable_perf_metrics(&mut self, enabled: bool) {
        self.core.enable_perf_metrics(enabled);
    }

    pub fn get_step_stats(&self) -> StepStats {
        self.core.step_stats()
    }

    // === RENDERING ===

    pub fn snapshot_json(&self) -> String {
        serde_json::to_string(&self.core.snapshot()).unwrap_or_default()
    }

    /// Refill the render buffers and report where they are
    pub fn render_layout(&mut self) -> RenderLayout {
        self.core.update_render_buffers();
        RenderLayout {
            body_vertices_ptr: self.core.body_vertices().as_ptr() as u32,
            body_vertices_len: self.core.body_vertices().len() as u32,
            body_colors_ptr: self.core.body_colors().as_ptr() as u32,
            body_colors_len: self.core.body_colors().len() as u32,
            particle_positions_ptr: self.core.particle_positions().as_ptr() as u32,
            particle_positions_len: self.core.particle_positions().len() as u32,
            particle_colors_ptr: self.core.particle_colors().as_ptr() as u32,
            particle_colors_len: self.core.particle_colors().len() as u32,
        }
    }

    // === SAVE SLOTS ===

    pub fn set_description(&mut self, description: &str) {
        self.core.set_description(description);
    }

    pub fn save(&mut self, name: &str) -> Result<(), JsValue> {
        self.core.save(name, &mut self.slots).map_err(js_err)
    }

    pub fn load(&mut self, name: &str) -> Result<(), JsValue> {
        self.core.load(name, &self.slots).map_err(js_err)
    }

    pub fn list_slots(&self) -> Result<js_sys::Array, JsValue> {
        let names = self.core.list_slots(&self.slots).map_err(js_err)?;
        Ok(names.into_iter().map(JsValue::from).collect())
    }

    /// Raw slot JSON, for persisting outside wasm memory
    pub fn export_slot(&self, name: &str) -> Result<String, JsValue> {
        self.slots.read(name).map_err(js_err)
    }

    /// Store slot JSON produced by `export_slot`; rejected if it does not validate
    pub fn import_slot(&mut self, name: &str, json: &str) -> Result<(), JsValue> {
        SaveRecord::from_json(json).map_err(js_err)?;
        self.slots.write(name, json).map_err(js_err)
    }
}
