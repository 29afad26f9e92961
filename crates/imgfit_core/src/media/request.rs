//! Typed tool requests, turned into argument vectors at the process boundary.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::types::{Dimensions, ImageFormat, Quality};
use crate::provision::ToolHandle;

/// Re-encode one image to a sidecar output.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: ImageFormat,
    pub dimensions: Dimensions,
    pub quality: Quality,
}

/// An invocation of the external tool.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolRequest {
    /// Read codec and dimensions (ffprobe).
    Probe { input: PathBuf },
    /// Scale and re-encode (ffmpeg).
    Encode(EncodeRequest),
}

impl ToolRequest {
    /// Executable that serves this request.
    pub fn program<'a>(&self, tool: &'a ToolHandle) -> &'a Path {
        match self {
            ToolRequest::Probe { .. } => tool.ffprobe(),
            ToolRequest::Encode(_) => tool.ffmpeg(),
        }
    }

    /// Build the argument vector.
    pub fn to_args(&self) -> Vec<OsString> {
        match self {
            ToolRequest::Probe { input } => probe_args(input),
            ToolRequest::Encode(req) => encode_args(req),
        }
    }
}

fn probe_args(input: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-v",
        "error",
        "-select_streams",
        "v:0",
        "-show_entries",
        "stream=codec_name,width,height",
        "-of",
        "json",
    ]
    .iter()
    .map(OsString::from)
    .collect();
    args.push(input.as_os_str().to_owned());
    args
}

fn encode_args(req: &EncodeRequest) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-hide_banner", "-loglevel", "error", "-nostdin", "-y", "-i"]
        .iter()
        .map(OsString::from)
        .collect();
    args.push(req.input.as_os_str().to_owned());

    args.push("-vf".into());
    args.push(
        format!(
            "scale={}:{}:flags=lanczos",
            req.dimensions.width, req.dimensions.height
        )
        .into(),
    );
    args.push("-frames:v".into());
    args.push("1".into());

    for arg in quality_args(req.format, req.quality) {
        args.push(arg.into());
    }

    args.push(req.output.as_os_str().to_owned());
    args
}

fn quality_args(format: ImageFormat, quality: Quality) -> Vec<String> {
    match (format, quality) {
        (_, Quality::JpegQscale(q)) => vec!["-q:v".into(), q.to_string()],
        (_, Quality::Webp(q)) => vec![
            "-c:v".into(),
            "libwebp".into(),
            "-quality".into(),
            q.to_string(),
        ],
        (ImageFormat::Png, Quality::Lossless) => vec!["-compression_level".into(), "9".into()],
        (ImageFormat::Tiff, Quality::Lossless) => {
            vec!["-compression_algo".into(), "deflate".into()]
        }
        (_, Quality::Lossless) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provision::ToolSource;

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    fn handle() -> ToolHandle {
        ToolHandle::new(
            PathBuf::from("/opt/ff/ffmpeg"),
            PathBuf::from("/opt/ff/ffprobe"),
            "ffmpeg version 6.0".to_string(),
            ToolSource::Managed,
        )
    }

    #[test]
    fn probe_request_targets_ffprobe() {
        let req = ToolRequest::Probe {
            input: PathBuf::from("in dir/a.jpg"),
        };
        assert_eq!(req.program(&handle()), Path::new("/opt/ff/ffprobe"));

        let args = strings(&req.to_args());
        assert_eq!(args.last().unwrap(), "in dir/a.jpg");
        assert!(args.contains(&"stream=codec_name,width,height".to_string()));
        assert!(args.windows(2).any(|w| w == ["-of", "json"]));
    }

    #[test]
    fn jpeg_encode_args() {
        let req = ToolRequest::Encode(EncodeRequest {
            input: PathBuf::from("a.jpg"),
            output: PathBuf::from("a.imgfit-tmp.jpg"),
            format: ImageFormat::Jpeg,
            dimensions: Dimensions::new(1200, 800),
            quality: Quality::JpegQscale(5),
        });
        assert_eq!(req.program(&handle()), Path::new("/opt/ff/ffmpeg"));

        let args = strings(&req.to_args());
        assert!(args.windows(2).any(|w| w == ["-i", "a.jpg"]));
        assert!(args
            .windows(2)
            .any(|w| w == ["-vf", "scale=1200:800:flags=lanczos"]));
        assert!(args.windows(2).any(|w| w == ["-q:v", "5"]));
        assert_eq!(args.last().unwrap(), "a.imgfit-tmp.jpg");
        assert!(args.contains(&"-y".to_string()));
    }

    #[test]
    fn lossless_formats_get_compression_flags() {
        assert_eq!(
            quality_args(ImageFormat::Png, Quality::Lossless),
            vec!["-compression_level", "9"]
        );
        assert!(quality_args(ImageFormat::Bmp, Quality::Lossless).is_empty());
        assert_eq!(
            quality_args(ImageFormat::Webp, Quality::Webp(70)),
            vec!["-c:v", "libwebp", "-quality", "70"]
        );
    }
}
