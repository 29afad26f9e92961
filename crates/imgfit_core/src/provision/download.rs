//! Archive download and checksum verification.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use async_trait::async_trait;
use futures_util::StreamExt;
use sha2::{Digest, Sha256};

use super::types::ToolError;

/// Progress is logged every this many percent.
const PROGRESS_STEP: u8 = 10;

/// Fetches remote resources for the installer.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Stream `url` into `dest`, creating or truncating it.
    async fn download(&self, url: &str, dest: &Path) -> Result<(), ToolError>;

    /// Fetch a small text resource (e.g. a `.sha256` file).
    async fn fetch_text(&self, url: &str) -> Result<String, ToolError>;
}

/// HTTP downloader backed by reqwest.
#[derive(Debug, Clone, Default)]
pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<(), ToolError> {
        tracing::info!("Downloading {}", url);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ToolError::Download(format!(
                "HTTP {}: {}",
                response.status(),
                url
            )));
        }

        let total_size = response.content_length().unwrap_or(0);
        let mut file = fs::File::create(dest)?;
        let mut downloaded: u64 = 0;
        let mut last_logged: u8 = 0;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                ToolError::Download(format!("interrupted download of {}: {}", url, e))
            })?;
            file.write_all(&chunk)?;
            downloaded += chunk.len() as u64;

            if let Some(step) = progress_step(downloaded, total_size, last_logged) {
                last_logged = step;
                tracing::info!("Download progress: {}% ({}/{} bytes)", step, downloaded, total_size);
            }
        }
        file.sync_all()?;

        if total_size > 0 && downloaded != total_size {
            return Err(ToolError::Download(format!(
                "incomplete download of {}: {} of {} bytes",
                url, downloaded, total_size
            )));
        }

        tracing::info!("Download completed: {} bytes", downloaded);
        Ok(())
    }

    async fn fetch_text(&self, url: &str) -> Result<String, ToolError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

/// The next progress mark to log, if `downloaded` has passed one since `last`.
///
/// Marks are multiples of [`PROGRESS_STEP`]; an unknown total never reports.
fn progress_step(downloaded: u64, total: u64, last: u8) -> Option<u8> {
    if total == 0 {
        return None;
    }
    let percent = (downloaded.saturating_mul(100) / total).min(100) as u8;
    let mark = percent - percent % PROGRESS_STEP;
    (mark > last).then_some(mark)
}

/// SHA-256 of a file, lowercase hex.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// The hash is the first whitespace-separated token of a `.sha256` file.
pub fn parse_checksum(text: &str) -> Option<String> {
    text.split_whitespace()
        .next()
        .filter(|t| t.len() == 64 && t.chars().all(|c| c.is_ascii_hexdigit()))
        .map(|t| t.to_ascii_lowercase())
}

/// Compare a downloaded file against a published checksum.
///
/// If the checksum itself cannot be fetched, verification is skipped with a
/// warning; a mismatch is always an error.
pub async fn verify_checksum<D: Downloader + ?Sized>(
    downloader: &D,
    checksum_url: &str,
    file: &Path,
) -> Result<(), ToolError> {
    let expected = match downloader.fetch_text(checksum_url).await {
        Ok(text) => match parse_checksum(&text) {
            Some(hash) => hash,
            None => {
                tracing::warn!("Checksum file at {} is not a SHA-256; skipping verification", checksum_url);
                return Ok(());
            }
        },
        Err(e) => {
            tracing::warn!("Failed to fetch checksum ({}); skipping verification", e);
            return Ok(());
        }
    };

    let actual = sha256_file(file)?;
    tracing::debug!("SHA-256 expected {} actual {}", expected, actual);

    if expected != actual {
        return Err(ToolError::ChecksumMismatch {
            file: file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            expected,
            actual,
        });
    }

    tracing::info!("Checksum verified");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one connection with a canned HTTP response and return its URL.
    async fn serve_once(response: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(&response).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{}/ffmpeg.tar.gz", addr)
    }

    fn local_downloader() -> HttpDownloader {
        HttpDownloader {
            client: reqwest::Client::builder().no_proxy().build().unwrap(),
        }
    }

    struct TextOnly(Result<String, String>);

    #[async_trait]
    impl Downloader for TextOnly {
        async fn download(&self, _url: &str, _dest: &Path) -> Result<(), ToolError> {
            unreachable!("not used")
        }

        async fn fetch_text(&self, _url: &str) -> Result<String, ToolError> {
            self.0.clone().map_err(ToolError::Download)
        }
    }

    #[test]
    fn progress_reports_each_ten_percent_once() {
        assert_eq!(progress_step(5, 100, 0), None);
        assert_eq!(progress_step(10, 100, 0), Some(10));
        assert_eq!(progress_step(19, 100, 10), None);
        assert_eq!(progress_step(47, 100, 10), Some(40));
        assert_eq!(progress_step(100, 100, 90), Some(100));
        assert_eq!(progress_step(100, 100, 100), None);
    }

    #[test]
    fn progress_without_total_is_silent() {
        assert_eq!(progress_step(1 << 20, 0, 0), None);
    }

    #[test]
    fn progress_is_capped_at_one_hundred() {
        assert_eq!(progress_step(250, 100, 90), Some(100));
    }

    #[tokio::test]
    async fn download_writes_full_body() {
        let url = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello".to_vec(),
        )
        .await;
        let dir = tempdir().unwrap();
        let dest = dir.path().join("ffmpeg.tar.gz");

        local_downloader().download(&url, &dest).await.unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn truncated_body_is_a_download_error() {
        let url = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\nConnection: close\r\n\r\nonly ten b".to_vec(),
        )
        .await;
        let dir = tempdir().unwrap();

        let result = local_downloader()
            .download(&url, &dir.path().join("ffmpeg.tar.gz"))
            .await;
        assert!(matches!(result, Err(ToolError::Download(_))), "{:?}", result);
    }

    #[tokio::test]
    async fn not_found_is_a_download_error() {
        let url = serve_once(
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_vec(),
        )
        .await;
        let dir = tempdir().unwrap();
        let dest = dir.path().join("ffmpeg.tar.gz");

        let result = local_downloader().download(&url, &dest).await;
        assert!(matches!(result, Err(ToolError::Download(ref m)) if m.contains("404")), "{:?}", result);
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn fetch_text_rejects_error_status() {
        let url = serve_once(
            b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 4\r\nConnection: close\r\n\r\noops".to_vec(),
        )
        .await;
        assert!(local_downloader().fetch_text(&url).await.is_err());
    }

    #[test]
    fn sha256_of_known_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("abc.txt");
        fs::write(&path, b"abc").unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn parse_checksum_takes_first_token() {
        let hash = "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD";
        assert_eq!(
            parse_checksum(&format!("{hash}  ffmpeg.zip\n")),
            Some(hash.to_ascii_lowercase())
        );
        assert_eq!(parse_checksum("<html>not found</html>"), None);
        assert_eq!(parse_checksum(""), None);
    }

    #[tokio::test]
    async fn mismatch_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ffmpeg.zip");
        fs::write(&path, b"abc").unwrap();

        let downloader = TextOnly(Ok("0".repeat(64)));
        let result = verify_checksum(&downloader, "https://x/ffmpeg.zip.sha256", &path).await;
        assert!(matches!(result, Err(ToolError::ChecksumMismatch { .. })));
    }

    #[tokio::test]
    async fn unreachable_checksum_is_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ffmpeg.zip");
        fs::write(&path, b"abc").unwrap();

        let downloader = TextOnly(Err("offline".into()));
        assert!(verify_checksum(&downloader, "https://x/sha", &path).await.is_ok());
    }
}
