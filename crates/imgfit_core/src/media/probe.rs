//! Parsing of `ffprobe -of json` output.

use std::path::Path;

use serde::Deserialize;

use super::types::{Dimensions, ImageProbe, MediaError, MediaResult};

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Build an [`ImageProbe`] from ffprobe's JSON and the on-disk size.
pub fn parse_probe_output(json: &str, path: &Path, size_bytes: u64) -> MediaResult<ImageProbe> {
    let output: ProbeOutput =
        serde_json::from_str(json).map_err(|e| MediaError::ProbeParse(e.to_string()))?;

    let stream = output
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| MediaError::NoImageStream(path.to_path_buf()))?;

    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => {
            return Err(MediaError::ProbeParse(format!(
                "missing dimensions for {}",
                path.display()
            )))
        }
    };

    Ok(ImageProbe {
        size_bytes,
        codec: stream.codec_name.unwrap_or_else(|| "unknown".to_string()),
        dimensions: Dimensions::new(width, height),
    })
}
