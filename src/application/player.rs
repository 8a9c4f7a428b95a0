use std::path::Path;

use tracing::{debug, info};

use crate::domain::{AppError, LibraryEntry, PlaybackStatus};

/// Transport primitives of an audio engine.
pub trait PlaybackEngine {
    /// Replaces whatever is loaded with the file at `path`, without starting it.
    fn load(&mut self, path: &Path) -> Result<(), AppError>;
    /// `level` is in 0.0..=1.0
    fn set_volume(&mut self, level: f32);
    fn play(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    /// True while audio is actively playing.
    fn is_busy(&self) -> bool;
}

/// Maps the 0..=100 slider scale onto the engine's 0.0..=1.0 range.
pub fn volume_level(volume: u8) -> f32 {
    f32::from(volume.min(100)) / 100.0
}

pub struct Player {
    engine: Box<dyn PlaybackEngine>,
    volume: u8,
    now_playing: Option<String>,
}

impl Player {
    pub fn new(engine: Box<dyn PlaybackEngine>, volume: u8) -> Self {
        Self {
            engine,
            volume: volume.min(100),
            now_playing: None,
        }
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    #[cfg(test)]
    pub fn now_playing(&self) -> Option<&str> {
        self.now_playing.as_deref()
    }

    pub fn play(&mut self, selection: Option<&LibraryEntry>) -> Result<PlaybackStatus, AppError> {
        let entry = selection.ok_or(AppError::NoSelection)?;

        self.engine.load(&entry.path)?;
        self.engine.set_volume(volume_level(self.volume));
        self.engine.play();

        info!(file = %entry.path.display(), volume = self.volume, "playback started");
        self.now_playing = Some(entry.name.clone());

        Ok(PlaybackStatus::Playing(entry.name.clone()))
    }

    /// No-op unless the engine is actually playing.
    pub fn pause(&mut self) -> Option<PlaybackStatus> {
        if !self.engine.is_busy() {
            return None;
        }

        self.engine.pause();
        Some(PlaybackStatus::Paused)
    }

    pub fn stop(&mut self) -> PlaybackStatus {
        self.engine.stop();
        self.now_playing = None;
        PlaybackStatus::Stopped
    }

    /// Applies to the loaded track right away as well as to the next `play`.
    pub fn set_volume(&mut self, volume: u8) {
        self.volume = volume.min(100);
        if self.now_playing.is_some() {
            debug!(volume = self.volume, "volume changed");
            self.engine.set_volume(volume_level(self.volume));
        }
    }
}
