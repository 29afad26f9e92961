//! Configuration management for imgfit.
//!
//! This module provides:
//! - TOML-based configuration with `[tool]`, `[processing]` and `[logging]` sections
//! - Atomic file writes (write to temp, then rename)
//! - Serde defaults for every missing key
//!
//! # Example
//!
//! ```no_run
//! use imgfit_core::config::{default_config_path, ConfigManager};
//!
//! let mut config = ConfigManager::new(default_config_path());
//! config.load_or_create().unwrap();
//!
//! println!("Tool dir: {}", config.settings().tool.tool_dir.display());
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    default_config_path, LoggingSettings, ProcessingSettings, Settings, ToolSettings,
};
