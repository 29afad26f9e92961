//! Settings struct with TOML-based sections.
//!
//! Every field has a serde default so partial files load cleanly.

use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// External tool location and install settings.
    #[serde(default)]
    pub tool: ToolSettings,

    /// Resize behaviour.
    #[serde(default)]
    pub processing: ProcessingSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Where to find FFmpeg and how to install it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    /// Directory for the managed FFmpeg install.
    #[serde(default = "default_tool_dir")]
    pub tool_dir: PathBuf,

    /// Explicit ffmpeg executable, checked before anything else.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffmpeg_path: Option<PathBuf>,

    /// Explicit ffprobe executable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffprobe_path: Option<PathBuf>,

    /// Search the system PATH.
    #[serde(default = "default_true")]
    pub use_system_path: bool,

    /// Download FFmpeg when no working install is found.
    #[serde(default = "default_true")]
    pub auto_install: bool,

    /// Mirror archive replacing the built-in download table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,

    /// SHA-256 file for `download_url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum_url: Option<String>,

    /// Timeout for `-version` checks, in seconds.
    #[serde(default = "default_verify_timeout")]
    pub verify_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_verify_timeout() -> u64 {
    15
}

/// Per-user data directory, falling back to a local folder.
fn default_tool_dir() -> PathBuf {
    ProjectDirs::from("", "", "imgfit")
        .map(|dirs| dirs.data_dir().join("tools").join("ffmpeg"))
        .unwrap_or_else(|| PathBuf::from(".imgfit").join("tools").join("ffmpeg"))
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            tool_dir: default_tool_dir(),
            ffmpeg_path: None,
            ffprobe_path: None,
            use_system_path: true,
            auto_install: true,
            download_url: None,
            checksum_url: None,
            verify_timeout_secs: default_verify_timeout(),
        }
    }
}

/// Resize behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingSettings {
    /// Timeout for one ffmpeg/ffprobe invocation, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Encode passes per file, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Multiplier applied to each scale estimate to land under the target.
    #[serde(default = "default_safety_margin")]
    pub safety_margin: f64,

    /// Smallest width or height a pass may produce.
    #[serde(default = "default_min_dimension")]
    pub min_dimension: u32,

    /// Descend into subfolders.
    #[serde(default)]
    pub recursive: bool,
}

fn default_timeout() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    5
}

fn default_safety_margin() -> f64 {
    0.95
}

fn default_min_dimension() -> u32 {
    16
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            max_attempts: default_max_attempts(),
            safety_margin: default_safety_margin(),
            min_dimension: default_min_dimension(),
            recursive: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default log level when `RUST_LOG` is unset and `--verbose` is off.
    #[serde(default)]
    pub level: LogLevel,
}

/// Default location of the settings file.
pub fn default_config_path() -> PathBuf {
    ProjectDirs::from("", "", "imgfit")
        .map(|dirs| dirs.config_dir().join("settings.toml"))
        .unwrap_or_else(|| PathBuf::from(".imgfit").join("settings.toml"))
}
