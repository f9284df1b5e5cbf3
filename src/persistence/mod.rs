//! Persistence - save record codec and slot stores.

pub mod format;
pub mod store;

pub use format::{SaveRecord, SAVE_FORMAT, SAVE_VERSION};
#[cfg(not(target_arch = "wasm32"))]
pub use store::DirSlotStore;
pub use store::{check_slot_name, MemorySlotStore, SlotStore};
