//! Image discovery in the input folder.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::errors::SizerError;
use crate::media::ImageFormat;

/// Marker in sidecar file names written during a resize.
pub const TEMP_MARKER: &str = "imgfit-tmp";

/// Sidecar path for the re-encoded copy: `<stem>.imgfit-tmp.<ext>`.
///
/// Lives next to the original so the final rename stays on one filesystem.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_stem().map(OsString::from).unwrap_or_default();
    name.push(".");
    name.push(TEMP_MARKER);
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    path.with_file_name(name)
}

fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.contains(&format!(".{TEMP_MARKER}.")))
        .unwrap_or(false)
}

/// List image files under `folder`, sorted by path.
///
/// Only the top level is read unless `recursive` is set. Unreadable entries
/// below the top level are skipped with a warning.
pub fn discover_images(
    folder: &Path,
    recursive: bool,
) -> Result<Vec<(PathBuf, ImageFormat)>, SizerError> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut images = Vec::new();

    for entry in WalkDir::new(folder).min_depth(1).max_depth(max_depth) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                let path = e.path().unwrap_or(folder).to_path_buf();
                return Err(SizerError::io(path, e.into()));
            }
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.into_path();
        if is_temp_file(&path) {
            tracing::debug!("Ignoring leftover {}", path.display());
            continue;
        }

        if let Some(format) = ImageFormat::from_path(&path) {
            images.push((path, format));
        }
    }

    images.sort_by(|a, b| a.0.cmp(&b.0));
    tracing::info!("Found {} image(s) in {}", images.len(), folder.display());

    Ok(images)
}
