//! Error types for the sizer.
//!
//! Two levels:
//! - [`SizerError`] aborts the run before any file is touched
//! - [`FileProcessingError`] is recorded for one file and the batch continues

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::media::MediaError;
use crate::size::{format_bytes, SizeSpecError};

/// Pre-flight failure; nothing has been modified.
#[derive(Error, Debug)]
pub enum SizerError {
    #[error("Invalid target size: {0}")]
    InvalidTargetSize(#[from] SizeSpecError),

    #[error("Folder not found: {0}")]
    FolderNotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SizerError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failure of a single image.
#[derive(Error, Debug)]
pub enum FileProcessingError {
    /// Probe or encode failed, including timeouts.
    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A file already sits at the path used for intermediate encodes.
    #[error("temporary file {} already exists; remove or rename it", .0.display())]
    SidecarExists(PathBuf),

    /// Every pass stayed above the target; the original is untouched.
    #[error("could not get under {} (best {})", size_label(.target), best_label(.best))]
    TargetNotMet { best: Option<u64>, target: u64 },
}

impl FileProcessingError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, FileProcessingError::Media(e) if e.is_timeout())
    }
}

fn size_label(bytes: &u64) -> String {
    format_bytes(*bytes)
}

fn best_label(best: &Option<u64>) -> String {
    best.map(format_bytes).unwrap_or_else(|| "none".to_string())
}
