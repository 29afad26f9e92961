//! Media inspection and re-encoding.
//!
//! The sizer talks to a [`MediaBackend`]; the production implementation is
//! [`FfmpegBackend`], which turns typed [`ToolRequest`]s into `ffprobe` /
//! `ffmpeg` argument vectors at the process boundary.
//!
//! # Usage
//!
//! ```ignore
//! use imgfit_core::media::{FfmpegBackend, MediaBackend};
//!
//! let backend = FfmpegBackend::new(tool_handle, Duration::from_secs(60));
//! let probe = backend.probe(Path::new("photo.jpg")).await?;
//! println!("{} {}", probe.codec, probe.dimensions);
//! ```

mod ffmpeg;
mod probe;
mod request;
mod types;

use std::path::Path;

use async_trait::async_trait;

pub use ffmpeg::FfmpegBackend;
pub use probe::parse_probe_output;
pub use request::{EncodeRequest, ToolRequest};
pub use types::{Dimensions, ImageFormat, ImageProbe, MediaError, MediaResult, Quality};

/// Trait for media backends.
///
/// Implementations inspect images and produce re-encoded copies.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Read size, codec and dimensions without modifying the file.
    async fn probe(&self, path: &Path) -> MediaResult<ImageProbe>;

    /// Encode `request.input` into `request.output`.
    ///
    /// # Returns
    /// Size of the written output in bytes.
    async fn encode(&self, request: &EncodeRequest) -> MediaResult<u64>;

    /// Get the backend name.
    fn name(&self) -> &str;
}
