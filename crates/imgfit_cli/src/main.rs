//! imgfit - shrink every image in a folder under a target file size
//!
//! Usage:
//!   imgfit <input_folder> <target_size> [-v|--verbose] [--probe-only] [--config <path>]
//!
//! Exit codes: 0 run completed, 1 other fatal error, 2 invalid arguments,
//! 3 FFmpeg unavailable.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use imgfit_core::config::{default_config_path, ConfigManager, Settings};
use imgfit_core::logging::{init_tracing, LogLevel};
use imgfit_core::media::FfmpegBackend;
use imgfit_core::provision::{Provisioner, ToolError};
use imgfit_core::sizer::{preflight, ImageSizer, RunOptions, SizerError};

const EXIT_FAILURE: u8 = 1;
const EXIT_INVALID_ARGS: u8 = 2;
const EXIT_TOOL_UNAVAILABLE: u8 = 3;

/// Shrink images in a folder so each fits under a target size
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Folder containing the images
    input_folder: PathBuf,

    /// Target size per file, e.g. 500K, 5M, 2G (binary units)
    target_size: Option<String>,

    /// Print a line for every file
    #[arg(short, long)]
    verbose: bool,

    /// Report size, codec and dimensions without modifying anything
    #[arg(long)]
    probe_only: bool,

    /// Settings file (default: per-user config, created if missing)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    let result = start(&args).await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}

async fn start(args: &Args) -> anyhow::Result<()> {
    // Bad arguments fail before the config file is read or created.
    preflight(&args.input_folder, args.target_size.as_deref())?;

    let loaded = load_settings(args.config.as_ref());
    let level = match (&loaded, args.verbose) {
        (_, true) => LogLevel::Debug,
        (Ok(settings), false) => settings.logging.level,
        (Err(_), false) => LogLevel::default(),
    };
    init_tracing(level);

    run(args, loaded?).await
}

fn load_settings(path: Option<&PathBuf>) -> anyhow::Result<Settings> {
    let mut manager = ConfigManager::new(path.cloned().unwrap_or_else(default_config_path));
    // An explicit file must exist; the default one is created on first run.
    let loaded = if path.is_some() {
        manager.load()
    } else {
        manager.load_or_create()
    };
    loaded.with_context(|| format!("loading config {}", manager.path().display()))?;
    Ok(manager.into_settings())
}

async fn run(args: &Args, settings: Settings) -> anyhow::Result<()> {
    let tool = Provisioner::new(settings.tool.clone()).ensure_tool().await?;
    let backend = FfmpegBackend::new(
        tool,
        Duration::from_secs(settings.processing.timeout_secs),
    );
    tracing::info!(
        "Using {} from {}",
        backend.tool().version(),
        backend.tool().ffmpeg().display()
    );

    let sizer = ImageSizer::new(backend, &settings.processing)
        .with_line_callback(Box::new(|line: &str| println!("{}", line)));

    let options = RunOptions {
        verbose: args.verbose,
        probe_only: args.probe_only,
    };
    sizer
        .process(&args.input_folder, args.target_size.as_deref(), options)
        .await
        .context("processing images")?;

    Ok(())
}

fn exit_code_for(err: &anyhow::Error) -> u8 {
    if let Some(e) = err.downcast_ref::<SizerError>() {
        return match e {
            SizerError::InvalidTargetSize(_) | SizerError::FolderNotFound(_) => EXIT_INVALID_ARGS,
            SizerError::Io { .. } => EXIT_FAILURE,
        };
    }
    if err.downcast_ref::<ToolError>().is_some() {
        return EXIT_TOOL_UNAVAILABLE;
    }
    EXIT_FAILURE
}
