use std::process::Stdio;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use regex::Regex;
use reqwest::Client;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use super::models::{ExtractorConfig, StreamInfo};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Failed to launch {binary}: {source}")]
    Launch {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    /// The extractor's own error line, unmodified.
    #[error("{0}")]
    Extractor(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("No audio stream found")]
    NoAudioStream,
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Turns a page URL into a directly downloadable audio stream.
#[async_trait]
pub trait StreamResolver: Send + Sync {
    async fn resolve(&self, url: &str) -> Result<StreamInfo>;
}

/// Resolver backed by the `yt-dlp` executable.
#[derive(Clone, Default)]
pub struct YtDlpResolver {
    config: ExtractorConfig,
}

impl YtDlpResolver {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl StreamResolver for YtDlpResolver {
    async fn resolve(&self, url: &str) -> Result<StreamInfo> {
        debug!(binary = %self.config.binary, url, "resolving audio stream");

        let output = Command::new(&self.config.binary)
            .args([
                "--no-playlist",
                "--no-warnings",
                "-f",
                self.config.format.as_str(),
                "-J",
                "--",
                url,
            ])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ApiError::Launch {
                binary: self.config.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = extract_error_message(&stderr).unwrap_or_else(|| {
                format!("{} exited with {}", self.config.binary, output.status)
            });
            return Err(ApiError::Extractor(message));
        }

        let info: StreamInfo = serde_json::from_slice(&output.stdout)
            .map_err(|e| ApiError::InvalidResponse(format!("JSON decode error: {}", e)))?;

        if info.media_url().is_none() {
            return Err(ApiError::NoAudioStream);
        }

        Ok(info)
    }
}

/// Pulls the message out of yt-dlp's stderr. The last `ERROR:` line wins,
/// otherwise the last non-empty line is used.
fn extract_error_message(stderr: &str) -> Option<String> {
    let re = Regex::new(r"(?m)^ERROR:\s*(.+?)\s*$").ok()?;
    if let Some(caps) = re.captures_iter(stderr).last() {
        return Some(caps[1].to_string());
    }

    stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .map(str::to_string)
}

/// HTTP side of a download: streams the media bytes of a resolved stream.
#[derive(Clone, Default)]
pub struct MediaClient {
    http: Client,
}

impl MediaClient {
    /// Returns (total_size, stream)
    pub async fn download_file_stream(
        &self,
        info: &StreamInfo,
    ) -> Result<(Option<u64>, BoxStream<'static, Result<bytes::Bytes>>)> {
        let url = info.media_url().ok_or(ApiError::NoAudioStream)?;

        let mut request = self.http.get(url);
        for (name, value) in info.headers() {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await?.error_for_status()?;

        let total_size = response.content_length().or(info.size_hint());
        let stream = response
            .bytes_stream()
            .map_err(ApiError::RequestError)
            .boxed();

        Ok((total_size, stream))
    }
}
