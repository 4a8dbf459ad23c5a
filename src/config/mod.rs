//! Configuration: a single structured document covering the
//! run-wide `general` section and per-scenario presets.
//!
//! - `defaults` — default constant values
//! - `types` — `Config`/`GeneralConfig`/`ScenarioConfig`
//! - `loader` — disk loading, validation, and reload

pub mod defaults;
pub mod loader;
pub mod types;

pub use loader::{config_dir, default_config_path, load_config, reload_or_keep};
pub use types::{Config, GeneralConfig, ScenarioConfig};
