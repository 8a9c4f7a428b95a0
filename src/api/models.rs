use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Format selector handed to yt-dlp. m4a is preferred because the audio
/// engine can decode it even after the extension rename.
pub const DEFAULT_FORMAT: &str = "bestaudio[ext=m4a]/bestaudio";

/// One entry of `requested_formats`, present when yt-dlp picked several
/// formats for a single video.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FormatInfo {
    pub url: String,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub http_headers: HashMap<String, String>,
}

/// The subset of `yt-dlp -J` output needed to fetch the audio stream
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub http_headers: HashMap<String, String>,
    #[serde(default)]
    pub filesize: Option<u64>,
    #[serde(default)]
    pub filesize_approx: Option<u64>,
    #[serde(default)]
    pub requested_formats: Option<Vec<FormatInfo>>,
}

impl StreamInfo {
    /// Direct media URL, preferring the top-level selection.
    pub fn media_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .or_else(|| self.first_requested().map(|f| f.url.as_str()))
            .filter(|u| !u.is_empty())
    }

    /// Container extension of the media, defaulting to `bin` when unknown.
    pub fn extension(&self) -> &str {
        self.ext
            .as_deref()
            .or_else(|| self.first_requested().and_then(|f| f.ext.as_deref()))
            .filter(|e| !e.is_empty())
            .unwrap_or("bin")
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        match self.first_requested() {
            Some(format) if self.url.is_none() => &format.http_headers,
            _ => &self.http_headers,
        }
    }

    pub fn size_hint(&self) -> Option<u64> {
        self.filesize.or(self.filesize_approx)
    }

    fn first_requested(&self) -> Option<&FormatInfo> {
        self.requested_formats.as_ref().and_then(|f| f.first())
    }
}

/// Configuration for the extractor
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub binary: String,
    pub format: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            binary: "yt-dlp".to_string(),
            format: DEFAULT_FORMAT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_format_output() {
        let json = r#"{
            "title": "Song",
            "url": "https://media.example/audio",
            "ext": "m4a",
            "http_headers": {"User-Agent": "Mozilla/5.0"},
            "filesize": 1024
        }"#;
        let info: StreamInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.media_url(), Some("https://media.example/audio"));
        assert_eq!(info.extension(), "m4a");
        assert_eq!(info.headers()["User-Agent"], "Mozilla/5.0");
        assert_eq!(info.size_hint(), Some(1024));
    }

    #[test]
    fn test_requested_formats_fallback() {
        let json = r#"{
            "title": "Song",
            "requested_formats": [
                {"url": "https://media.example/a", "ext": "webm", "http_headers": {"Accept": "*/*"}}
            ],
            "filesize_approx": 77
        }"#;
        let info: StreamInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.media_url(), Some("https://media.example/a"));
        assert_eq!(info.extension(), "webm");
        assert_eq!(info.headers()["Accept"], "*/*");
        assert_eq!(info.size_hint(), Some(77));
    }

    #[test]
    fn test_missing_stream() {
        let info: StreamInfo = serde_json::from_str(r#"{"title": "Live", "url": ""}"#).unwrap();
        assert_eq!(info.media_url(), None);
        assert_eq!(info.extension(), "bin");
    }
}
