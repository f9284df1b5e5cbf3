//! Domain - material constants and the tunable simulation configuration.

pub mod config;
pub mod materials;

pub use config::{CombineRule, ConfigOption, SimConfig};
pub use materials::Color;
