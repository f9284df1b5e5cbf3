use wasm_bindgen::prelude::*;

use crate::systems::CollisionStats;

/// Counters for the last completed step.
///
/// Counts are always kept; the `*_ms` timings are only filled while perf
/// metrics are enabled.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepStats {
    pub(super) step_ms: f64,
    pub(super) rigid_ms: f64,
    pub(super) fluid_ms: f64,
    pub(super) candidate_pairs: u32,
    pub(super) contacts: u32,
    pub(super) skipped_contacts: u32,
    pub(super) body_count: u32,
    pub(super) particle_count: u32,
    pub(super) dropped_particles: u32,
    pub(super) rejected_intents: u32,
}

impl StepStats {
    pub(crate) fn reset(&mut self) {
        *self = StepStats::default();
    }

    pub(super) fn add_collisions(&mut self, c: CollisionStats) {
        self.candidate_pairs = self.candidate_pairs.saturating_add(c.candidate_pairs);
        self.contacts = self.contacts.saturating_add(c.contacts);
        self.skipped_contacts = self.skipped_contacts.saturating_add(c.skipped);
    }
}

#[wasm_bindgen]
impl StepStats {
    #[wasm_bindgen(getter)]
    pub fn step_ms(&self) -> f64 { self.step_ms }
    #[wasm_bindgen(getter)]
    pub fn rigid_ms(&self) -> f64 { self.rigid_ms }
    #[wasm_bindgen(getter)]
    pub fn fluid_ms(&self) -> f64 { self.fluid_ms }
    /// Broad-phase body pairs, summed over sub-steps.
    #[wasm_bindgen(getter)]
    pub fn candidate_pairs(&self) -> u32 { self.candidate_pairs }
    #[wasm_bindgen(getter)]
    pub fn contacts(&self) -> u32 { self.contacts }
    #[wasm_bindgen(getter)]
    pub fn skipped_contacts(&self) -> u32 { self.skipped_contacts }
    #[wasm_bindgen(getter)]
    pub fn body_count(&self) -> u32 { self.body_count }
    #[wasm_bindgen(getter)]
    pub fn particle_count(&self) -> u32 { self.particle_count }
    #[wasm_bindgen(getter)]
    pub fn dropped_particles(&self) -> u32 { self.dropped_particles }
    #[wasm_bindgen(getter)]
    pub fn rejected_intents(&self) -> u32 { self.rejected_intents }
}
