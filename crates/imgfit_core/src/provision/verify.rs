//! Controlled `-version` invocation of candidate executables.

use std::ffi::OsString;
use std::path::Path;

use super::types::{Candidate, ToolCheck, ToolHandle};
use crate::runner::CommandRunner;

/// Run `<exe> -version`; `Ok` carries the first stdout line.
async fn version_of(runner: &CommandRunner, exe: &Path) -> Result<String, String> {
    if !exe.is_file() {
        return Err("file does not exist".to_string());
    }

    let args = [OsString::from("-version")];
    let output = runner.run(exe, &args).await.map_err(|e| e.to_string())?;

    if !output.success() {
        return Err(format!(
            "exit code {}: {}",
            output.exit_code(),
            output.stderr_tail()
        ));
    }

    Ok(output
        .first_line()
        .map(str::to_string)
        .unwrap_or_else(|| "unknown version".to_string()))
}

/// Verify both executables of a candidate.
pub async fn verify_candidate(runner: &CommandRunner, candidate: &Candidate) -> ToolCheck {
    let version = match version_of(runner, &candidate.ffmpeg).await {
        Ok(version) => version,
        Err(reason) => {
            return ToolCheck::Broken {
                path: candidate.ffmpeg.clone(),
                reason,
            }
        }
    };

    if let Err(reason) = version_of(runner, &candidate.ffprobe).await {
        return ToolCheck::Broken {
            path: candidate.ffprobe.clone(),
            reason,
        };
    }

    tracing::info!("FFmpeg version: {} ({})", version, candidate.source);

    ToolCheck::Ready(ToolHandle::new(
        candidate.ffmpeg.clone(),
        candidate.ffprobe.clone(),
        version,
        candidate.source,
    ))
}
