//! Simulated media backend for integration tests.
//!
//! File size is modelled as one byte per pixel at 4:3, so the probed
//! dimensions follow from the size on disk. An encode writes
//! `input_size * pixel_ratio * overhead` bytes, never less than `floor`.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use imgfit_core::media::{Dimensions, EncodeRequest, ImageProbe, MediaBackend, MediaError, MediaResult};

pub const KIB: u64 = 1024;
pub const MIB: u64 = 1024 * KIB;

pub struct PixelModel {
    /// Multiplier over the ideal pixel-proportional size.
    pub overhead: f64,
    /// Smallest output the encoder can produce.
    pub floor: u64,
    pub probes: AtomicUsize,
    pub encodes: AtomicUsize,
}

impl PixelModel {
    pub fn new(overhead: f64) -> Self {
        Self {
            overhead,
            floor: 0,
            probes: AtomicUsize::new(0),
            encodes: AtomicUsize::new(0),
        }
    }

    pub fn with_floor(mut self, floor: u64) -> Self {
        self.floor = floor;
        self
    }

    pub fn calls(&self) -> usize {
        self.probes.load(Ordering::SeqCst) + self.encodes.load(Ordering::SeqCst)
    }
}

fn dimensions_for(size: u64) -> Dimensions {
    let width = ((size as f64) * 4.0 / 3.0).sqrt().floor().max(1.0) as u32;
    let height = (width as f64 * 3.0 / 4.0).floor().max(1.0) as u32;
    Dimensions::new(width, height)
}

fn pixels(d: Dimensions) -> f64 {
    d.width as f64 * d.height as f64
}

#[async_trait]
impl MediaBackend for PixelModel {
    async fn probe(&self, path: &Path) -> MediaResult<ImageProbe> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        let size = fs::metadata(path).map_err(|e| MediaError::io(path, e))?.len();
        Ok(ImageProbe {
            size_bytes: size,
            codec: "mjpeg".to_string(),
            dimensions: dimensions_for(size),
        })
    }

    async fn encode(&self, request: &EncodeRequest) -> MediaResult<u64> {
        self.encodes.fetch_add(1, Ordering::SeqCst);
        let input_size = fs::metadata(&request.input)
            .map_err(|e| MediaError::io(&request.input, e))?
            .len();
        let ratio = pixels(request.dimensions) / pixels(dimensions_for(input_size));
        let size = ((input_size as f64 * ratio * self.overhead) as u64).max(self.floor);

        fs::write(&request.output, vec![7u8; size as usize])
            .map_err(|e| MediaError::io(&request.output, e))?;
        Ok(size)
    }

    fn name(&self) -> &str {
        "pixel-model"
    }
}

pub fn write_image(dir: &Path, name: &str, size: u64) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, vec![0u8; size as usize]).unwrap();
    path
}
