pub mod client;
pub mod models;

pub use client::{ApiError, MediaClient, Result, StreamResolver, YtDlpResolver};
pub use models::ExtractorConfig;
