use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tracing::{info, warn};

use crate::application::PlaybackEngine;
use crate::domain::AppError;

/// Playback engine on top of rodio. Owns the output device for the
/// lifetime of the application and at most one sink.
#[derive(Default)]
pub struct RodioEngine {
    // The stream must outlive every sink created from its handle.
    output: Option<(OutputStream, OutputStreamHandle)>,
    sink: Option<Sink>,
}

impl RodioEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&mut self) -> Result<&OutputStreamHandle, AppError> {
        if self.output.is_none() {
            let output = OutputStream::try_default().map_err(|e| {
                AppError::Playback(format!("Failed to open audio output: {}", e))
            })?;
            info!("audio output opened");
            self.output = Some(output);
        }

        match &self.output {
            Some((_, handle)) => Ok(handle),
            None => Err(AppError::Playback("Audio output unavailable".to_string())),
        }
    }
}

impl PlaybackEngine for RodioEngine {
    fn load(&mut self, path: &Path) -> Result<(), AppError> {
        let file = File::open(path).map_err(|e| AppError::Playback(e.to_string()))?;
        let source =
            Decoder::new(BufReader::new(file)).map_err(|e| AppError::Playback(e.to_string()))?;

        let sink = Sink::try_new(self.handle()?).map_err(|e| AppError::Playback(e.to_string()))?;
        sink.pause();
        sink.append(source);

        if let Some(previous) = self.sink.replace(sink) {
            previous.stop();
        }

        Ok(())
    }

    fn set_volume(&mut self, level: f32) {
        if let Some(sink) = &self.sink {
            sink.set_volume(level.clamp(0.0, 1.0));
        }
    }

    fn play(&mut self) {
        match &self.sink {
            Some(sink) => sink.play(),
            None => warn!("play requested with nothing loaded"),
        }
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn is_busy(&self) -> bool {
        self.sink
            .as_ref()
            .map(|s| !s.is_paused() && !s.empty())
            .unwrap_or(false)
    }
}
