use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("Please enter a YouTube URL")]
    EmptyUrl,

    #[error("Please select a file to play")]
    NoSelection,

    /// Extraction or network failure, shown verbatim.
    #[error("{0}")]
    Fetch(String),

    #[error("{0}")]
    Io(String),

    #[error("{0}")]
    Playback(String),
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}

impl From<crate::api::ApiError> for AppError {
    fn from(e: crate::api::ApiError) -> Self {
        AppError::Fetch(e.to_string())
    }
}
