//! Candidate discovery: configured paths, managed install, system PATH.

use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use super::types::{Candidate, ToolSource};
use crate::config::ToolSettings;

/// Platform executable file name (`ffmpeg` / `ffmpeg.exe`).
pub fn exe_name(tool: &str) -> String {
    if cfg!(windows) {
        format!("{tool}.exe")
    } else {
        tool.to_string()
    }
}

/// Directory holding the managed binaries.
pub fn managed_bin_dir(tool_dir: &Path) -> PathBuf {
    tool_dir.join("bin")
}

/// Collect candidates in lookup order.
///
/// Configured paths are always returned so a bad explicit path shows up as
/// broken; managed and PATH candidates only when both files exist.
pub fn candidates(settings: &ToolSettings, path_var: Option<&OsStr>) -> Vec<Candidate> {
    let mut found = Vec::new();

    if let Some(candidate) = configured_candidate(settings) {
        found.push(candidate);
    }

    let bin = managed_bin_dir(&settings.tool_dir);
    let managed = Candidate {
        ffmpeg: bin.join(exe_name("ffmpeg")),
        ffprobe: bin.join(exe_name("ffprobe")),
        source: ToolSource::Managed,
    };
    if managed.ffmpeg.is_file() && managed.ffprobe.is_file() {
        found.push(managed);
    }

    if settings.use_system_path {
        if let Some(path_var) = path_var {
            if let (Some(ffmpeg), Some(ffprobe)) = (
                find_in_path("ffmpeg", path_var),
                find_in_path("ffprobe", path_var),
            ) {
                found.push(Candidate {
                    ffmpeg,
                    ffprobe,
                    source: ToolSource::SystemPath,
                });
            }
        }
    }

    found
}

/// Candidates using the process PATH.
pub fn candidates_from_env(settings: &ToolSettings) -> Vec<Candidate> {
    let path_var = env::var_os("PATH");
    candidates(settings, path_var.as_deref())
}

/// When only one of the two paths is set, the other is assumed to sit next to it.
fn configured_candidate(settings: &ToolSettings) -> Option<Candidate> {
    let sibling = |path: &Path, tool: &str| {
        path.parent()
            .map(|dir| dir.join(exe_name(tool)))
            .unwrap_or_else(|| PathBuf::from(exe_name(tool)))
    };

    let (ffmpeg, ffprobe) = match (&settings.ffmpeg_path, &settings.ffprobe_path) {
        (Some(ffmpeg), Some(ffprobe)) => (ffmpeg.clone(), ffprobe.clone()),
        (Some(ffmpeg), None) => (ffmpeg.clone(), sibling(ffmpeg, "ffprobe")),
        (None, Some(ffprobe)) => (sibling(ffprobe, "ffmpeg"), ffprobe.clone()),
        (None, None) => return None,
    };

    Some(Candidate {
        ffmpeg,
        ffprobe,
        source: ToolSource::Configured,
    })
}

fn find_in_path(tool: &str, path_var: &OsStr) -> Option<PathBuf> {
    for dir in env::split_paths(path_var) {
        let full = dir.join(tool);
        if full.is_file() {
            return Some(full);
        }
        #[cfg(windows)]
        {
            let exe = dir.join(format!("{tool}.exe"));
            if exe.is_file() {
                return Some(exe);
            }
        }
    }
    None
}
