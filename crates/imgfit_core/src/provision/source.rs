//! Fixed download sources for each supported platform.

use super::types::ToolError;
use crate::config::ToolSettings;

/// Windows builds from gyan.dev, with a published SHA-256.
const GYAN_ESSENTIALS_URL: &str = "https://www.gyan.dev/ffmpeg/builds/ffmpeg-release-essentials.zip";
const GYAN_ESSENTIALS_SHA256_URL: &str =
    "https://www.gyan.dev/ffmpeg/builds/ffmpeg-release-essentials.zip.sha256";

/// Static Linux/macOS builds, one gzip-compressed binary per tool.
const FFMPEG_STATIC_RELEASE: &str = "b6.0";
const FFMPEG_STATIC_BASE: &str = "https://github.com/eugeneware/ffmpeg-static/releases/download";

/// How a downloaded archive is unpacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
    /// A single gzip-compressed executable.
    Gz,
}

impl ArchiveFormat {
    /// Infer the format from a URL or file name.
    pub fn from_url(url: &str) -> Option<Self> {
        let name = url
            .split(['?', '#'])
            .next()
            .unwrap_or(url)
            .to_ascii_lowercase();
        if name.ends_with(".zip") {
            Some(ArchiveFormat::Zip)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ArchiveFormat::TarGz)
        } else if name.ends_with(".gz") {
            Some(ArchiveFormat::Gz)
        } else {
            None
        }
    }
}

/// One archive to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSpec {
    pub url: String,
    pub checksum_url: Option<String>,
    pub format: ArchiveFormat,
    /// For [`ArchiveFormat::Gz`]: which tool the decompressed file is.
    pub binary: Option<&'static str>,
}

impl ArchiveSpec {
    /// File name used for the download on disk.
    pub fn file_name(&self) -> String {
        self.url
            .split(['?', '#'])
            .next()
            .and_then(|u| u.rsplit('/').next())
            .filter(|n| !n.is_empty())
            .unwrap_or("download")
            .to_string()
    }
}

/// Archives for this machine, honouring a `download_url` override.
pub fn archives_for(settings: &ToolSettings) -> Result<Vec<ArchiveSpec>, ToolError> {
    if let Some(url) = &settings.download_url {
        let format = ArchiveFormat::from_url(url)
            .filter(|f| *f != ArchiveFormat::Gz)
            .ok_or_else(|| ToolError::UnsupportedArchive(url.clone()))?;
        return Ok(vec![ArchiveSpec {
            url: url.clone(),
            checksum_url: settings.checksum_url.clone(),
            format,
            binary: None,
        }]);
    }

    let (os, arch) = get_platform_info()?;
    Ok(platform_archives(os, arch))
}

fn get_platform_info() -> Result<(&'static str, &'static str), ToolError> {
    let os = if cfg!(target_os = "linux") {
        "linux"
    } else if cfg!(target_os = "macos") {
        "darwin"
    } else if cfg!(target_os = "windows") {
        "win32"
    } else {
        return Err(ToolError::UnsupportedPlatform(
            std::env::consts::OS.to_string(),
        ));
    };

    let arch = if cfg!(target_arch = "x86_64") {
        "x64"
    } else if cfg!(target_arch = "aarch64") {
        "arm64"
    } else {
        return Err(ToolError::UnsupportedPlatform(
            std::env::consts::ARCH.to_string(),
        ));
    };

    Ok((os, arch))
}

fn platform_archives(os: &str, arch: &str) -> Vec<ArchiveSpec> {
    if os == "win32" {
        return vec![ArchiveSpec {
            url: GYAN_ESSENTIALS_URL.to_string(),
            checksum_url: Some(GYAN_ESSENTIALS_SHA256_URL.to_string()),
            format: ArchiveFormat::Zip,
            binary: None,
        }];
    }

    ["ffmpeg", "ffprobe"]
        .into_iter()
        .map(|tool| ArchiveSpec {
            url: format!("{FFMPEG_STATIC_BASE}/{FFMPEG_STATIC_RELEASE}/{tool}-{os}-{arch}.gz"),
            checksum_url: None,
            format: ArchiveFormat::Gz,
            binary: Some(tool),
        })
        .collect()
}
