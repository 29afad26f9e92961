//! imgfit core - shrink images under a target byte size with FFmpeg
//!
//! This crate holds all logic with no CLI dependencies:
//! - [`provision`] finds or installs a working FFmpeg
//! - [`sizer`] probes or re-encodes the images in a folder
//!
//! It can be driven by the `imgfit` binary or embedded in another tool.

pub mod config;
pub mod logging;
pub mod media;
pub mod provision;
pub mod runner;
pub mod size;
pub mod sizer;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
