//! FFmpeg provisioning.
//!
//! Makes sure working `ffmpeg` and `ffprobe` executables exist:
//!
//! 1. **Locate** candidates: configured paths, the managed install
//!    directory, then the system PATH
//! 2. **Verify** each with a bounded `-version` run ([`ToolCheck`])
//! 3. **Install** when nothing works: download the platform archives,
//!    check SHA-256 where published, extract via a staging directory,
//!    re-verify
//!
//! A failed install is rolled back, so the tool directory ends up either
//! holding a verified install or nothing at all.
//!
//! # Usage
//!
//! ```no_run
//! use imgfit_core::config::ToolSettings;
//! use imgfit_core::provision::Provisioner;
//!
//! # async fn run() -> Result<(), imgfit_core::provision::ToolError> {
//! let provisioner = Provisioner::new(ToolSettings::default());
//! let tool = provisioner.ensure_tool().await?;
//! println!("{} at {}", tool.version(), tool.ffmpeg().display());
//! # Ok(())
//! # }
//! ```

mod download;
mod install;
mod locate;
mod provisioner;
mod source;
mod types;
mod verify;

pub use download::{sha256_file, Downloader, HttpDownloader};
pub use install::Installer;
pub use provisioner::Provisioner;
pub use source::{archives_for, ArchiveFormat, ArchiveSpec};
pub use types::{Candidate, ToolCheck, ToolError, ToolHandle, ToolSource};
