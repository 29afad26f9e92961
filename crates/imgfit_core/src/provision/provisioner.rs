//! Locate-or-install orchestration.

use std::ffi::OsString;
use std::time::Duration;

use super::download::{Downloader, HttpDownloader};
use super::install::Installer;
use super::locate::{candidates, candidates_from_env};
use super::source::archives_for;
use super::types::{ToolCheck, ToolError, ToolHandle};
use super::verify::verify_candidate;
use crate::config::ToolSettings;
use crate::runner::CommandRunner;

/// Guarantees a working FFmpeg, installing one when needed.
pub struct Provisioner<D: Downloader = HttpDownloader> {
    settings: ToolSettings,
    downloader: D,
    runner: CommandRunner,
    /// PATH override; `None` reads the process environment.
    path_var: Option<OsString>,
}

impl Provisioner<HttpDownloader> {
    pub fn new(settings: ToolSettings) -> Self {
        Self::with_downloader(settings, HttpDownloader::new())
    }
}

impl<D: Downloader> Provisioner<D> {
    pub fn with_downloader(settings: ToolSettings, downloader: D) -> Self {
        let runner = CommandRunner::new(Duration::from_secs(settings.verify_timeout_secs));
        Self {
            settings,
            downloader,
            runner,
            path_var: None,
        }
    }

    /// Search this PATH value instead of the process environment.
    pub fn with_search_path(mut self, path_var: impl Into<OsString>) -> Self {
        self.path_var = Some(path_var.into());
        self
    }

    /// Locate and verify without installing.
    ///
    /// Returns the first working candidate; otherwise the first broken one,
    /// otherwise `Missing`.
    pub async fn check(&self) -> ToolCheck {
        let found = match &self.path_var {
            Some(path_var) => candidates(&self.settings, Some(path_var.as_os_str())),
            None => candidates_from_env(&self.settings),
        };

        let mut first_broken = None;
        for candidate in &found {
            tracing::debug!(
                "Checking {} ({})",
                candidate.ffmpeg.display(),
                candidate.source
            );
            match verify_candidate(&self.runner, candidate).await {
                ToolCheck::Ready(handle) => return ToolCheck::Ready(handle),
                broken @ ToolCheck::Broken { .. } => {
                    tracing::warn!("{}", broken.describe());
                    first_broken.get_or_insert(broken);
                }
                ToolCheck::Missing => {}
            }
        }

        first_broken.unwrap_or(ToolCheck::Missing)
    }

    /// Return a verified tool, installing into `tool_dir` if none works.
    ///
    /// A failed install leaves no files behind.
    pub async fn ensure_tool(&self) -> Result<ToolHandle, ToolError> {
        let check = self.check().await;
        if let ToolCheck::Ready(handle) = check {
            tracing::info!("FFmpeg is already installed ({})", handle.source());
            return Ok(handle);
        }

        if !self.settings.auto_install {
            return Err(ToolError::unavailable(format!(
                "{} and automatic install is disabled",
                check.describe()
            )));
        }

        tracing::info!("FFmpeg not usable ({}). Installing...", check.describe());
        self.install_fresh().await
    }

    async fn install_fresh(&self) -> Result<ToolHandle, ToolError> {
        let archives = archives_for(&self.settings)?;
        let installer = Installer::new(&self.settings.tool_dir);
        let created_root = installer.missing_root();

        let result = match installer.install(&self.downloader, &archives).await {
            Ok(candidate) => match verify_candidate(&self.runner, &candidate).await {
                ToolCheck::Ready(handle) => Ok(handle),
                failed => Err(ToolError::unavailable(format!(
                    "installed FFmpeg failed verification: {}",
                    failed.describe()
                ))),
            },
            Err(e) => Err(ToolError::unavailable(e)),
        };

        if let Err(e) = &result {
            tracing::error!("Error during FFmpeg installation: {}", e);
            installer.rollback(created_root.as_deref());
        }

        result
    }
}
