use std::fmt;
use std::path::PathBuf;

use super::AppError;

/// A URL as typed by the user. Only emptiness is checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
}

impl DownloadRequest {
    pub fn parse(input: &str) -> Result<Self, AppError> {
        let url = input.trim();
        if url.is_empty() {
            return Err(AppError::EmptyUrl);
        }

        Ok(Self {
            url: url.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub title: String,
    pub path: PathBuf,
}

/// One playable file in the storage directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryEntry {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackStatus {
    Playing(String),
    Paused,
    Stopped,
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackStatus::Playing(name) => write!(f, "Playing: {}", name),
            PlaybackStatus::Paused => write!(f, "Paused"),
            PlaybackStatus::Stopped => write!(f, "Stopped"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A blocking dialog the interface should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub body: String,
}

impl Notice {
    pub fn info(title: &str, body: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.to_string(),
            body: body.into(),
        }
    }

    pub fn warning(title: &str, body: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            title: title.to_string(),
            body: body.into(),
        }
    }

    pub fn error(title: &str, body: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.to_string(),
            body: body.into(),
        }
    }
}
