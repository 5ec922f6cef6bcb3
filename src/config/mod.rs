// Configuration module
// Engine thresholds, validation, JSON persistence, and named presets

pub mod presets;
pub mod settings;

pub use presets::{list_presets, Preset};
pub use settings::{BridgeGate, ConfigError, EdgeSelection, EngineConfig};
