//! Physbox Engine - rigid boxes and particle fluid in a bounded 2D arena
//!
//! Architecture:
//! - core/         - math, errors, deterministic RNG
//! - domain/       - materials and the tunable configuration
//! - spatial/      - uniform-grid broad-phase
//! - systems/      - rigid bodies and fluid
//! - simulation/   - the world: lifecycle, stepping, intents, wasm facade
//! - persistence/  - save records and slot stores
//! - logging       - `log` output to the browser console
//!
//! Units: 1 world unit = 1 cm, y grows downward.

pub mod core;
pub mod domain;
pub mod logging;
pub mod persistence;
pub mod simulation;
pub mod spatial;
pub mod systems;

use wasm_bindgen::prelude::*;

// Thread pool for the rayon-backed fluid passes in the browser.
#[cfg(all(feature = "parallel", target_arch = "wasm32"))]
pub use wasm_bindgen_rayon::init_thread_pool;

// Better error messages in debug mode
#[cfg(feature = "console_error_panic_hook")]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Initialize the engine
#[wasm_bindgen]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    set_panic_hook();

    logging::init_console_logger(log::LevelFilter::Info);
    web_sys::console::log_1(&"Physbox WASM engine initialized".into());
}

/// Get engine version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

// Re-export main types
pub use crate::core::{EngineError, Result, Vec2};
pub use domain::{Color, CombineRule, SimConfig};
pub use simulation::{
    Command, Inspection, IntentSender, SharedWorld, SimState, StepStats, World, WorldCore,
    WorldSnapshot,
};
pub use systems::{BodyId, BodyParams, DropletParams, EmitOutcome};
