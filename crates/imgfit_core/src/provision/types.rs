//! Types for tool provisioning.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while locating or installing FFmpeg.
#[derive(Error, Debug)]
pub enum ToolError {
    /// No working FFmpeg could be found or installed.
    #[error("FFmpeg is unavailable: {0}")]
    Unavailable(String),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Unsupported archive type: {0}")]
    UnsupportedArchive(String),

    #[error("Failed to download FFmpeg: {0}")]
    Download(String),

    #[error("Checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("Failed to extract FFmpeg archive: {0}")]
    Extract(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ToolError {
    pub fn unavailable(reason: impl std::fmt::Display) -> Self {
        Self::Unavailable(reason.to_string())
    }
}

/// Where a verified tool was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolSource {
    /// Paths set explicitly in the config file.
    Configured,
    /// The imgfit-managed install directory.
    Managed,
    /// The system PATH.
    SystemPath,
}

impl std::fmt::Display for ToolSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ToolSource::Configured => "configured path",
            ToolSource::Managed => "managed install",
            ToolSource::SystemPath => "system PATH",
        };
        f.write_str(label)
    }
}

/// Verified FFmpeg installation.
///
/// Only produced by a successful `-version` check, so holding one means both
/// executables ran. Read-only once created.
#[derive(Debug, Clone)]
pub struct ToolHandle {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    version: String,
    source: ToolSource,
}

impl ToolHandle {
    pub(crate) fn new(
        ffmpeg: PathBuf,
        ffprobe: PathBuf,
        version: String,
        source: ToolSource,
    ) -> Self {
        Self {
            ffmpeg,
            ffprobe,
            version,
            source,
        }
    }

    pub fn ffmpeg(&self) -> &Path {
        &self.ffmpeg
    }

    pub fn ffprobe(&self) -> &Path {
        &self.ffprobe
    }

    /// First line of `ffmpeg -version`.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn source(&self) -> ToolSource {
        self.source
    }
}

/// A pair of executables to verify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub source: ToolSource,
}

/// Outcome of the locate-then-verify capability check.
#[derive(Debug, Clone)]
pub enum ToolCheck {
    /// A candidate ran successfully.
    Ready(ToolHandle),
    /// No candidate exists.
    Missing,
    /// A candidate exists but did not run.
    Broken { path: PathBuf, reason: String },
}

impl ToolCheck {
    pub fn is_functional(&self) -> bool {
        matches!(self, ToolCheck::Ready(_))
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            ToolCheck::Ready(handle) => format!("ready ({})", handle.version()),
            ToolCheck::Missing => "ffmpeg/ffprobe not found".to_string(),
            ToolCheck::Broken { path, reason } => {
                format!("{} is not working: {}", path.display(), reason)
            }
        }
    }
}
