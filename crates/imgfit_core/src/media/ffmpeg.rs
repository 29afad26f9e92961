//! FFmpeg/FFprobe subprocess backend.

use std::fs;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use super::probe::parse_probe_output;
use super::request::{EncodeRequest, ToolRequest};
use super::types::{ImageProbe, MediaError, MediaResult};
use super::MediaBackend;
use crate::provision::ToolHandle;
use crate::runner::{CommandOutput, CommandRunner};

/// Backend driving the provisioned `ffmpeg` and `ffprobe` executables.
pub struct FfmpegBackend {
    tool: ToolHandle,
    runner: CommandRunner,
}

impl FfmpegBackend {
    /// Create a backend; each invocation is bounded by `timeout`.
    pub fn new(tool: ToolHandle, timeout: Duration) -> Self {
        Self {
            tool,
            runner: CommandRunner::new(timeout),
        }
    }

    pub fn tool(&self) -> &ToolHandle {
        &self.tool
    }

    async fn execute(&self, request: &ToolRequest) -> MediaResult<CommandOutput> {
        let program = request.program(&self.tool);
        let output = self.runner.run(program, &request.to_args()).await?;

        if !output.success() {
            let tool = match request {
                ToolRequest::Probe { .. } => "ffprobe",
                ToolRequest::Encode(_) => "ffmpeg",
            };
            return Err(MediaError::CommandFailed {
                tool: tool.to_string(),
                exit_code: output.exit_code(),
                message: output.stderr_tail(),
            });
        }

        Ok(output)
    }
}

#[async_trait]
impl MediaBackend for FfmpegBackend {
    async fn probe(&self, path: &Path) -> MediaResult<ImageProbe> {
        let size_bytes = fs::metadata(path)
            .map_err(|e| MediaError::io(path, e))?
            .len();

        let request = ToolRequest::Probe {
            input: path.to_path_buf(),
        };
        let output = self.execute(&request).await?;

        parse_probe_output(&output.stdout, path, size_bytes)
    }

    async fn encode(&self, request: &EncodeRequest) -> MediaResult<u64> {
        let output_path = request.output.clone();
        self.execute(&ToolRequest::Encode(request.clone())).await?;

        let size = fs::metadata(&output_path)
            .map_err(|e| MediaError::io(&output_path, e))?
            .len();

        tracing::debug!(
            "Encoded {} at {} ({}) -> {} bytes",
            request.input.display(),
            request.dimensions,
            request.quality.label(),
            size
        );

        Ok(size)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::media::types::{Dimensions, ImageFormat, Quality};
    use crate::provision::ToolSource;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn write_script(path: &Path, body: &str) {
        fs::write(path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn backend(dir: &Path, ffmpeg_body: &str, ffprobe_body: &str) -> FfmpegBackend {
        let ffmpeg = dir.join("ffmpeg");
        let ffprobe = dir.join("ffprobe");
        write_script(&ffmpeg, ffmpeg_body);
        write_script(&ffprobe, ffprobe_body);
        let tool = ToolHandle::new(ffmpeg, ffprobe, "test".to_string(), ToolSource::Managed);
        FfmpegBackend::new(tool, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn probe_reads_json_and_file_size() {
        let dir = tempdir().unwrap();
        let image = dir.path().join("a.jpg");
        fs::write(&image, vec![0u8; 1234]).unwrap();

        let backend = backend(
            dir.path(),
            "exit 0",
            r#"echo '{"streams":[{"codec_name":"mjpeg","width":640,"height":480}]}'"#,
        );

        let probe = backend.probe(&image).await.unwrap();
        assert_eq!(probe.size_bytes, 1234);
        assert_eq!(probe.dimensions, Dimensions::new(640, 480));
    }

    #[tokio::test]
    async fn encode_failure_carries_stderr() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path(), "echo 'bad input' >&2; exit 1", "exit 0");

        let request = EncodeRequest {
            input: dir.path().join("a.jpg"),
            output: dir.path().join("a.imgfit-tmp.jpg"),
            format: ImageFormat::Jpeg,
            dimensions: Dimensions::new(10, 10),
            quality: Quality::JpegQscale(3),
        };
        let err = backend.encode(&request).await.unwrap_err();
        match err {
            MediaError::CommandFailed {
                tool,
                exit_code,
                message,
            } => {
                assert_eq!(tool, "ffmpeg");
                assert_eq!(exit_code, 1);
                assert_eq!(message, "bad input");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn encode_reports_output_size() {
        let dir = tempdir().unwrap();
        // The output path is the last argument.
        let backend = backend(
            dir.path(),
            r#"for last; do :; done; head -c 321 /dev/zero > "$last""#,
            "exit 0",
        );

        let request = EncodeRequest {
            input: PathBuf::from("in.png"),
            output: dir.path().join("out.imgfit-tmp.png"),
            format: ImageFormat::Png,
            dimensions: Dimensions::new(10, 10),
            quality: Quality::Lossless,
        };
        assert_eq!(backend.encode(&request).await.unwrap(), 321);
    }
}
