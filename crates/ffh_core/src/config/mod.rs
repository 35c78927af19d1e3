//! Application configuration.
//!
//! Settings live in a TOML file split into sections; every field has a
//! serde default so a partial or missing file still loads.

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{OutputSettings, PathSettings, Settings, ToolSettings};
