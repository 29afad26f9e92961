//! Types shared by the media backends.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::runner::RunError;

/// Error type for probe and encode operations.
#[derive(Error, Debug)]
pub enum MediaError {
    /// The tool ran but exited non-zero.
    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    /// The tool could not be started, or it timed out.
    #[error(transparent)]
    Run(#[from] RunError),

    #[error("Failed to parse ffprobe output: {0}")]
    ProbeParse(String),

    #[error("No image stream found in {0}")]
    NoImageStream(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl MediaError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the failure was a tool invocation exceeding its timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, MediaError::Run(RunError::Timeout { .. }))
    }
}

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Image container formats the sizer handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
    Bmp,
    Tiff,
}

impl ImageFormat {
    /// Detect the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "webp" => Some(ImageFormat::Webp),
            "bmp" => Some(ImageFormat::Bmp),
            "tif" | "tiff" => Some(ImageFormat::Tiff),
            _ => None,
        }
    }

    /// Starting quality for the first encode pass.
    pub fn default_quality(&self) -> Quality {
        match self {
            ImageFormat::Jpeg => Quality::JpegQscale(3),
            ImageFormat::Webp => Quality::Webp(85),
            ImageFormat::Png | ImageFormat::Bmp | ImageFormat::Tiff => Quality::Lossless,
        }
    }
}

/// Format-specific quality knob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    /// MJPEG `-q:v`, 2 (best) to 31 (worst).
    JpegQscale(u8),
    /// libwebp `-quality`, 0 to 100 (best).
    Webp(u8),
    /// No quality knob; only the scale changes size.
    Lossless,
}

const JPEG_QSCALE_WORST: u8 = 31;
const JPEG_QSCALE_STEP: u8 = 3;
const WEBP_QUALITY_FLOOR: u8 = 10;
const WEBP_QUALITY_STEP: u8 = 10;

impl Quality {
    /// One notch worse, saturating at the format's floor.
    pub fn degraded(self) -> Self {
        match self {
            Quality::JpegQscale(q) => {
                Quality::JpegQscale(q.saturating_add(JPEG_QSCALE_STEP).min(JPEG_QSCALE_WORST))
            }
            Quality::Webp(q) => {
                Quality::Webp(q.saturating_sub(WEBP_QUALITY_STEP).max(WEBP_QUALITY_FLOOR))
            }
            Quality::Lossless => Quality::Lossless,
        }
    }

    /// Short form for report lines.
    pub fn label(&self) -> String {
        match self {
            Quality::JpegQscale(q) => format!("q:v {}", q),
            Quality::Webp(q) => format!("quality {}", q),
            Quality::Lossless => "lossless".to_string(),
        }
    }
}

/// Pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Scale both sides, rounding down, never below 1 pixel.
    pub fn scaled(&self, factor: f64) -> Self {
        let scale = |v: u32| ((v as f64 * factor).floor() as u32).max(1);
        Self {
            width: scale(self.width),
            height: scale(self.height),
        }
    }

    pub fn min_side(&self) -> u32 {
        self.width.min(self.height)
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Result of a read-only inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageProbe {
    /// File size on disk.
    pub size_bytes: u64,
    /// Codec name as reported by ffprobe (e.g. `mjpeg`, `png`).
    pub codec: String,
    pub dimensions: Dimensions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_formats_case_insensitively() {
        assert_eq!(
            ImageFormat::from_path(Path::new("a/B.JPG")),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_path(Path::new("x.tiff")),
            Some(ImageFormat::Tiff)
        );
        assert_eq!(ImageFormat::from_path(Path::new("notes.txt")), None);
        assert_eq!(ImageFormat::from_path(Path::new("README")), None);
    }

    #[test]
    fn degraded_quality_saturates() {
        assert_eq!(Quality::JpegQscale(3).degraded(), Quality::JpegQscale(6));
        assert_eq!(Quality::JpegQscale(30).degraded(), Quality::JpegQscale(31));
        assert_eq!(Quality::Webp(15).degraded(), Quality::Webp(10));
        assert_eq!(Quality::Lossless.degraded(), Quality::Lossless);
    }

    #[test]
    fn scaled_dimensions_round_down() {
        let dims = Dimensions::new(4000, 3000);
        assert_eq!(dims.scaled(0.5), Dimensions::new(2000, 1500));
        assert_eq!(dims.scaled(0.0001), Dimensions::new(1, 1));
        assert_eq!(dims.to_string(), "4000x3000");
    }

    #[test]
    fn timeout_is_detected() {
        let err = MediaError::Run(RunError::Timeout {
            program: "ffmpeg".to_string(),
            timeout: std::time::Duration::from_secs(1),
        });
        assert!(err.is_timeout());
        assert!(!MediaError::ProbeParse("x".into()).is_timeout());
    }
}
