//! Runs probe or resize jobs over a folder.
//!
//! Output is written **in place**: each pass encodes to a sidecar next to
//! the original (see [`temp_path`]), and the first result at or under the
//! target is renamed over the original. When no pass gets there the
//! original is left byte-for-byte unchanged and the sidecar is removed.

use std::fs;
use std::io;
use std::path::Path;

use super::discovery::{discover_images, temp_path};
use super::errors::{FileProcessingError, SizerError};
use super::policy::{PassPlan, ResizePolicy};
use super::types::{display_name, Attempt, ImageJob, JobOutcome, JobStatus, Report, RunOptions};
use crate::config::ProcessingSettings;
use crate::logging::{LineCallback, MessagePrefix};
use crate::media::{EncodeRequest, ImageProbe, MediaBackend};
use crate::size::{format_bytes, SizeSpec};

/// Validate arguments before anything is read or written.
///
/// The target size is checked first, then the folder.
pub fn preflight(folder: &Path, target_size: Option<&str>) -> Result<SizeSpec, SizerError> {
    let target = SizeSpec::parse_opt(target_size)?;
    if !folder.is_dir() {
        return Err(SizerError::FolderNotFound(folder.to_path_buf()));
    }
    Ok(target)
}

/// Shrinks images in a folder under a target size.
pub struct ImageSizer<B: MediaBackend> {
    backend: B,
    policy: ResizePolicy,
    recursive: bool,
    line_callback: Option<LineCallback>,
}

impl<B: MediaBackend> ImageSizer<B> {
    pub fn new(backend: B, settings: &ProcessingSettings) -> Self {
        Self {
            backend,
            policy: ResizePolicy::from_settings(settings),
            recursive: settings.recursive,
            line_callback: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Receive report lines (per-file lines and the summary).
    pub fn with_line_callback(mut self, callback: LineCallback) -> Self {
        self.line_callback = Some(callback);
        self
    }

    /// Probe or resize every image in `folder`.
    ///
    /// Fails only on pre-flight errors; per-file failures are recorded in
    /// the report and the batch continues.
    pub async fn process(
        &self,
        folder: &Path,
        target_size: Option<&str>,
        options: RunOptions,
    ) -> Result<Report, SizerError> {
        let target = preflight(folder, target_size)?;
        let images = discover_images(folder, self.recursive)?;

        tracing::info!(
            "{} {} image(s) with {} against target {} ({} bytes)",
            if options.probe_only { "Probing" } else { "Resizing" },
            images.len(),
            self.backend.name(),
            target,
            target.bytes()
        );

        let mut outcomes = Vec::with_capacity(images.len());
        for (path, format) in images {
            let job = ImageJob {
                path,
                format,
                target,
                probe_only: options.probe_only,
            };
            let status = self.run_job(&job).await;
            if let JobStatus::Failed { error, .. } = &status {
                tracing::warn!("{}: {}", job.path.display(), error);
            }
            if let Some(line) = report_line(&job, &status, options.verbose) {
                self.emit(&line);
            }
            outcomes.push(JobOutcome {
                path: job.path,
                status,
            });
        }

        let report = Report {
            target,
            probe_only: options.probe_only,
            outcomes,
        };
        self.emit(&report.summary_line());
        Ok(report)
    }

    async fn run_job(&self, job: &ImageJob) -> JobStatus {
        if job.probe_only {
            return match self.backend.probe(&job.path).await {
                Ok(probe) => JobStatus::Probed(probe),
                Err(e) => failed(e.into(), Vec::new()),
            };
        }

        let size = match fs::metadata(&job.path) {
            Ok(meta) => meta.len(),
            Err(e) => return failed(FileProcessingError::io(&job.path, e), Vec::new()),
        };
        if size <= job.target.bytes() {
            return JobStatus::AlreadyFits { size };
        }

        let probe = match self.backend.probe(&job.path).await {
            Ok(probe) => probe,
            Err(e) => return failed(e.into(), Vec::new()),
        };
        self.shrink(job, &probe).await
    }

    /// Encode passes until one fits, then replace the original.
    async fn shrink(&self, job: &ImageJob, probe: &ImageProbe) -> JobStatus {
        let target = job.target.bytes();
        let temp = temp_path(&job.path);
        if temp.exists() {
            return failed(FileProcessingError::SidecarExists(temp), Vec::new());
        }
        let mut attempts: Vec<Attempt> = Vec::new();
        let mut best: Option<u64> = None;
        let mut next = self.policy.first_pass(probe, job.format, target);

        let result = loop {
            let Some(plan) = next.take() else {
                break Err(FileProcessingError::TargetNotMet { best, target });
            };

            let output_size = match self.encode_pass(job, &temp, &plan).await {
                Ok(size) => size,
                Err(e) => break Err(e),
            };

            let kept = best.map_or(true, |b| output_size <= b);
            if kept {
                best = Some(output_size);
            }
            attempts.push(Attempt {
                scale: plan.scale,
                dimensions: plan.dimensions,
                quality: plan.quality,
                output_size,
                kept,
            });

            tracing::debug!(
                "{} pass {}: {} {} -> {}{}",
                job.display_name(),
                attempts.len(),
                plan.dimensions,
                plan.quality.label(),
                format_bytes(output_size),
                if kept { "" } else { " (discarded)" }
            );

            if output_size <= target {
                break fs::rename(&temp, &job.path)
                    .map(|_| output_size)
                    .map_err(|e| FileProcessingError::io(&job.path, e));
            }

            if attempts.len() as u32 >= self.policy.max_attempts() {
                break Err(FileProcessingError::TargetNotMet { best, target });
            }

            next = self
                .policy
                .corrective_pass(probe.dimensions, &plan, output_size, target);
        };

        match result {
            Ok(final_size) => JobStatus::Resized {
                original_size: probe.size_bytes,
                final_size,
                attempts,
            },
            Err(error) => {
                remove_sidecar(&temp);
                failed(error, attempts)
            }
        }
    }

    async fn encode_pass(
        &self,
        job: &ImageJob,
        temp: &Path,
        plan: &PassPlan,
    ) -> Result<u64, FileProcessingError> {
        let request = EncodeRequest {
            input: job.path.clone(),
            output: temp.to_path_buf(),
            format: job.format,
            dimensions: plan.dimensions,
            quality: plan.quality,
        };
        Ok(self.backend.encode(&request).await?)
    }

    fn emit(&self, line: &str) {
        if let Some(ref callback) = self.line_callback {
            callback(line);
        }
    }
}

fn failed(error: FileProcessingError, attempts: Vec<Attempt>) -> JobStatus {
    JobStatus::Failed { error, attempts }
}

fn remove_sidecar(temp: &Path) {
    match fs::remove_file(temp) {
        Ok(()) => tracing::debug!("Removed {}", temp.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove {}: {}", temp.display(), e),
    }
}

/// Line for one file. Probe results always print; the rest only when verbose.
fn report_line(job: &ImageJob, status: &JobStatus, verbose: bool) -> Option<String> {
    let name = display_name(&job.path);
    let target = job.target;

    let line = match status {
        JobStatus::Probed(probe) => MessagePrefix::Probe.format(&format!(
            "{}: {}, {}, {}",
            name,
            format_bytes(probe.size_bytes),
            probe.codec,
            probe.dimensions
        )),
        _ if !verbose => return None,
        JobStatus::AlreadyFits { size } => MessagePrefix::Skip.format(&format!(
            "{}: {} already within {}, unchanged",
            name,
            format_bytes(*size),
            target
        )),
        JobStatus::Resized {
            original_size,
            final_size,
            attempts,
        } => {
            let params = attempts
                .last()
                .map(|a| format!("{} {}", a.dimensions, a.quality.label()))
                .unwrap_or_default();
            MessagePrefix::Success.format(&format!(
                "{}: {} -> {} ({}, {} pass{}) target {} met",
                name,
                format_bytes(*original_size),
                format_bytes(*final_size),
                params,
                attempts.len(),
                if attempts.len() == 1 { "" } else { "es" },
                target
            ))
        }
        JobStatus::Failed { error, attempts } => {
            let tried = match attempts.last() {
                Some(last) => format!(
                    " after {} pass(es), last {} {} -> {}",
                    attempts.len(),
                    last.dimensions,
                    last.quality.label(),
                    format_bytes(last.output_size)
                ),
                None => String::new(),
            };
            let message = match error {
                FileProcessingError::TargetNotMet { .. } => {
                    format!("{}: target {} not met{}: {}", name, target, tried, error)
                }
                _ => format!("{}: {}{}", name, error, tried),
            };
            MessagePrefix::Failure.format(&message)
        }
    };
    Some(line)
}
