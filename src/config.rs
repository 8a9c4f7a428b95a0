use std::path::PathBuf;

use crate::api::ExtractorConfig;

/// Application-wide settings. There is no config file; these are the
/// values the program runs with.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub library_dir: PathBuf,
    /// Target audio extension, without the leading dot.
    pub audio_extension: String,
    /// Initial slider position, 0..=100.
    pub default_volume: u8,
    pub extractor: ExtractorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            library_dir: PathBuf::from("downloads"),
            audio_extension: "mp3".to_string(),
            default_volume: 70,
            extractor: ExtractorConfig::default(),
        }
    }
}
