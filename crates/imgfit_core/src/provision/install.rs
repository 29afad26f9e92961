//! Managed FFmpeg install: download, extract, place, roll back.
//!
//! Everything is written under `<tool_dir>/.staging` first. Only when both
//! executables have been extracted is the staged `bin` moved into place.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use walkdir::WalkDir;

use super::download::{verify_checksum, Downloader};
use super::locate::{exe_name, managed_bin_dir};
use super::source::{ArchiveFormat, ArchiveSpec};
use super::types::{Candidate, ToolError, ToolSource};

const STAGING_DIR: &str = ".staging";
const TOOLS: [&str; 2] = ["ffmpeg", "ffprobe"];

/// Installs FFmpeg into a tool directory.
#[derive(Debug, Clone)]
pub struct Installer {
    tool_dir: PathBuf,
}

impl Installer {
    pub fn new(tool_dir: impl Into<PathBuf>) -> Self {
        Self {
            tool_dir: tool_dir.into(),
        }
    }

    fn staging_dir(&self) -> PathBuf {
        self.tool_dir.join(STAGING_DIR)
    }

    /// Download and unpack `archives`, then move the binaries into `<tool_dir>/bin`.
    ///
    /// Does not verify the result and does not clean up on error; the caller
    /// decides and calls [`Installer::rollback`].
    pub async fn install<D: Downloader + ?Sized>(
        &self,
        downloader: &D,
        archives: &[ArchiveSpec],
    ) -> Result<Candidate, ToolError> {
        let staging = self.staging_dir();
        if staging.exists() {
            tracing::debug!("Removing stale staging dir {}", staging.display());
            fs::remove_dir_all(&staging)?;
        }

        let downloads = staging.join("downloads");
        let extracted = staging.join("extracted");
        let staged_bin = staging.join("bin");
        for dir in [&downloads, &extracted, &staged_bin] {
            fs::create_dir_all(dir)?;
        }

        for spec in archives {
            let archive_path = downloads.join(spec.file_name());
            downloader.download(&spec.url, &archive_path).await?;

            if let Some(checksum_url) = &spec.checksum_url {
                verify_checksum(downloader, checksum_url, &archive_path).await?;
            }

            tracing::info!("Extracting {}", spec.file_name());
            match spec.format {
                ArchiveFormat::Zip => extract_zip(&archive_path, &extracted)?,
                ArchiveFormat::TarGz => extract_tarball(&archive_path, &extracted)?,
                ArchiveFormat::Gz => {
                    let tool = spec.binary.ok_or_else(|| {
                        ToolError::Extract(format!("{} does not name its binary", spec.url))
                    })?;
                    decompress_gz(&archive_path, &staged_bin.join(exe_name(tool)))?;
                }
            }

            fs::remove_file(&archive_path)?;
        }

        collect_binaries(&extracted, &staged_bin)?;

        for tool in TOOLS {
            let path = staged_bin.join(exe_name(tool));
            if !path.is_file() {
                return Err(ToolError::Extract(format!(
                    "downloaded archives did not contain {}",
                    exe_name(tool)
                )));
            }
            make_executable(&path)?;
        }

        let bin = managed_bin_dir(&self.tool_dir);
        if bin.exists() {
            tracing::warn!("Replacing non-working install at {}", bin.display());
            fs::remove_dir_all(&bin)?;
        }
        fs::rename(&staged_bin, &bin)?;
        fs::remove_dir_all(&staging)?;

        tracing::info!("FFmpeg installed to {}", bin.display());

        Ok(Candidate {
            ffmpeg: bin.join(exe_name("ffmpeg")),
            ffprobe: bin.join(exe_name("ffprobe")),
            source: ToolSource::Managed,
        })
    }

    /// The outermost directory an install would have to create.
    ///
    /// `None` when the tool directory already exists. Record this before
    /// [`Installer::install`] and hand it to [`Installer::rollback`].
    pub fn missing_root(&self) -> Option<PathBuf> {
        let mut missing = None;
        for ancestor in self.tool_dir.ancestors() {
            if ancestor.as_os_str().is_empty() || ancestor.exists() {
                break;
            }
            missing = Some(ancestor.to_path_buf());
        }
        missing
    }

    /// Remove everything an install attempt may have written.
    ///
    /// With a `created_root` the whole tree from that directory down is
    /// removed; otherwise only the staging area and `bin`.
    pub fn rollback(&self, created_root: Option<&Path>) {
        let targets = match created_root {
            Some(root) => vec![root.to_path_buf()],
            None => vec![self.staging_dir(), managed_bin_dir(&self.tool_dir)],
        };

        for target in targets {
            match fs::remove_dir_all(&target) {
                Ok(()) => tracing::debug!("Removed {}", target.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!("Failed to remove {}: {}", target.display(), e),
            }
        }
    }
}

fn extract_zip(archive_path: &Path, dest: &Path) -> Result<(), ToolError> {
    let file = fs::File::open(archive_path)?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| ToolError::Extract(e.to_string()))?;
    archive
        .extract(dest)
        .map_err(|e| ToolError::Extract(e.to_string()))
}

fn extract_tarball(archive_path: &Path, dest: &Path) -> Result<(), ToolError> {
    let file = fs::File::open(archive_path)?;
    let decoder = GzDecoder::new(file);
    let mut archive = Archive::new(decoder);

    archive
        .unpack(dest)
        .map_err(|e| ToolError::Extract(e.to_string()))
}

fn decompress_gz(archive_path: &Path, dest: &Path) -> Result<(), ToolError> {
    let file = fs::File::open(archive_path)?;
    let mut decoder = GzDecoder::new(file);
    let mut out = fs::File::create(dest)?;
    io::copy(&mut decoder, &mut out).map_err(|e| ToolError::Extract(e.to_string()))?;
    Ok(())
}

/// Move the first `ffmpeg`/`ffprobe` found under `extracted` into `bin`.
fn collect_binaries(extracted: &Path, bin: &Path) -> Result<(), ToolError> {
    let mut moves = Vec::new();

    for tool in TOOLS {
        let name = exe_name(tool);
        let target = bin.join(&name);
        if target.exists() {
            continue;
        }

        let found = WalkDir::new(extracted)
            .into_iter()
            .filter_map(Result::ok)
            .find(|e| e.file_type().is_file() && e.file_name().to_string_lossy() == name.as_str());

        if let Some(entry) = found {
            moves.push((entry.into_path(), target));
        }
    }

    for (from, to) in moves {
        tracing::debug!("Placing {} -> {}", from.display(), to.display());
        fs::rename(&from, &to)?;
    }
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}
