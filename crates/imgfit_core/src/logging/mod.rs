//! Logging infrastructure for imgfit.
//!
//! Two channels:
//! - Diagnostics go through `tracing` (stderr, filtered by `RUST_LOG`)
//! - Per-file report lines go through a [`LineCallback`] so the binary
//!   decides where they are printed
//!
//! # Example
//!
//! ```no_run
//! use imgfit_core::logging::{init_tracing, LogLevel, MessagePrefix};
//!
//! init_tracing(LogLevel::Debug);
//! println!("{}", MessagePrefix::Success.format("photo.jpg: 1.20 MiB"));
//! ```

mod types;

pub use types::{LineCallback, LogLevel, MessagePrefix};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize global tracing subscriber for application-wide logging.
///
/// `RUST_LOG` takes precedence; otherwise `default_level` applies to the
/// imgfit crates and everything else is held at `warn`.
///
/// Should be called once at application startup.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(default_level)));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

fn default_filter(level: LogLevel) -> String {
    let level = level_to_filter_str(level);
    format!("warn,imgfit_core={level},imgfit={level}")
}

/// Convert LogLevel to filter string.
fn level_to_filter_str(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace => "trace",
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    }
}
