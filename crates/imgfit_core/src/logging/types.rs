//! Logging types.

use serde::{Deserialize, Serialize};

/// Log level for filtering messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace-level debugging (very verbose).
    Trace,
    /// Debug information.
    Debug,
    /// General information.
    #[default]
    Info,
    /// Warnings.
    Warn,
    /// Errors.
    Error,
}

/// Receives each user-facing report line.
pub type LineCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Message prefix types for consistent report formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagePrefix {
    /// Read-only inspection: `[PROBE]`
    Probe,
    /// Target met: `[OK]`
    Success,
    /// Left as-is: `[SKIP]`
    Skip,
    /// Per-file failure: `[FAIL]`
    Failure,
}

impl MessagePrefix {
    /// Format a message with this prefix.
    pub fn format(&self, message: &str) -> String {
        match self {
            MessagePrefix::Probe => format!("[PROBE] {}", message),
            MessagePrefix::Success => format!("[OK] {}", message),
            MessagePrefix::Skip => format!("[SKIP] {}", message),
            MessagePrefix::Failure => format!("[FAIL] {}", message),
        }
    }
}
