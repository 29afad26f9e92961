//! Core types for a sizing run.

use std::path::{Path, PathBuf};

use super::errors::FileProcessingError;
use crate::media::{Dimensions, ImageFormat, ImageProbe, Quality};
use crate::size::SizeSpec;

/// Mode flags for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Emit a report line for every file.
    pub verbose: bool,
    /// Inspect only; never modify files.
    pub probe_only: bool,
}

/// One discovered file, consumed once by the sizer.
#[derive(Debug, Clone)]
pub struct ImageJob {
    pub path: PathBuf,
    pub format: ImageFormat,
    pub target: SizeSpec,
    pub probe_only: bool,
}

impl ImageJob {
    /// File name for report lines.
    pub fn display_name(&self) -> String {
        display_name(&self.path)
    }
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// One encode pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attempt {
    /// Linear scale relative to the original dimensions.
    pub scale: f64,
    pub dimensions: Dimensions,
    pub quality: Quality,
    pub output_size: u64,
    /// False when the output was larger than an earlier pass and was discarded.
    pub kept: bool,
}

/// What happened to one file.
#[derive(Debug)]
pub enum JobStatus {
    /// Probe-only inspection.
    Probed(ImageProbe),
    /// Already at or under the target; left unchanged.
    AlreadyFits { size: u64 },
    /// Replaced in place by a re-encoded copy under the target.
    Resized {
        original_size: u64,
        final_size: u64,
        attempts: Vec<Attempt>,
    },
    /// Left unchanged after an error.
    Failed {
        error: FileProcessingError,
        attempts: Vec<Attempt>,
    },
}

impl JobStatus {
    pub fn is_success(&self) -> bool {
        !matches!(self, JobStatus::Failed { .. })
    }

    /// Encode passes run for this file.
    pub fn attempts(&self) -> &[Attempt] {
        match self {
            JobStatus::Resized { attempts, .. } | JobStatus::Failed { attempts, .. } => attempts,
            JobStatus::Probed(_) | JobStatus::AlreadyFits { .. } => &[],
        }
    }
}

/// Result for one file.
#[derive(Debug)]
pub struct JobOutcome {
    pub path: PathBuf,
    pub status: JobStatus,
}

/// Result of a whole run, in processing order.
#[derive(Debug)]
pub struct Report {
    pub target: SizeSpec,
    pub probe_only: bool,
    pub outcomes: Vec<JobOutcome>,
}

impl Report {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn summary_line(&self) -> String {
        let verb = if self.probe_only { "Probed" } else { "Processed" };
        let noun = if self.outcomes.len() == 1 { "file" } else { "files" };
        format!(
            "{} {} {} (target {}): {} succeeded, {} failed",
            verb,
            self.outcomes.len(),
            noun,
            self.target,
            self.succeeded(),
            self.failed()
        )
    }
}
