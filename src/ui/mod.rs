use iced::{
    widget::{
        button, column, progress_bar, row, scrollable, slider, text, text_input, Column, Space,
    },
    Alignment, Element, Length,
};

use crate::domain::LibraryEntry;

/// Width of the sliding block shown while the download size is unknown.
const PULSE_SPAN: f32 = 0.25;

/// Main view state
pub struct DownloadView {
    pub youtube_url: String,
    pub status_message: String,
    pub is_downloading: bool,
    /// Known download fraction; `None` while indeterminate.
    pub download_progress: Option<f32>,
    /// Phase of the indeterminate animation, 0.0..1.0
    pub pulse: f32,
    pub entries: Vec<LibraryEntry>,
    pub selected: Option<String>,
    pub volume: u8,
}

impl Default for DownloadView {
    fn default() -> Self {
        Self {
            youtube_url: String::new(),
            status_message: "Ready".to_string(),
            is_downloading: false,
            download_progress: None,
            pulse: 0.0,
            entries: Vec::new(),
            selected: None,
            volume: 70,
        }
    }
}

#[derive(Debug, Clone)]
pub enum DownloadMessage {
    UrlChanged(String),
    DownloadPressed,
    EntrySelected(String),
    PlayPressed,
    PausePressed,
    StopPressed,
    VolumeChanged(u8),
}

impl DownloadView {
    pub fn update(&mut self, message: DownloadMessage) {
        match message {
            DownloadMessage::UrlChanged(url) => {
                self.youtube_url = url;
            }
            DownloadMessage::EntrySelected(name) => {
                self.selected = Some(name);
            }
            DownloadMessage::VolumeChanged(volume) => {
                self.volume = volume.min(100);
            }
            DownloadMessage::DownloadPressed
            | DownloadMessage::PlayPressed
            | DownloadMessage::PausePressed
            | DownloadMessage::StopPressed => {
                // Will be handled by the app
            }
        }
    }

    /// Replaces the listing, keeping the selection if it survived.
    pub fn set_entries(&mut self, entries: Vec<LibraryEntry>) {
        if let Some(selected) = &self.selected {
            if !entries.iter().any(|e| &e.name == selected) {
                self.selected = None;
            }
        }
        self.entries = entries;
    }

    pub fn selected_entry(&self) -> Option<&LibraryEntry> {
        let selected = self.selected.as_ref()?;
        self.entries.iter().find(|e| &e.name == selected)
    }

    pub fn start_download(&mut self) {
        self.is_downloading = true;
        self.download_progress = None;
        self.pulse = 0.0;
        self.status_message = "Downloading...".to_string();
    }

    pub fn finish_download(&mut self) {
        self.is_downloading = false;
        self.download_progress = None;
        self.pulse = 0.0;
    }

    pub fn advance_pulse(&mut self) {
        self.pulse = (self.pulse + 0.02) % 1.0;
    }

    fn progress_value(&self) -> f32 {
        if !self.is_downloading {
            return 0.0;
        }

        match self.download_progress {
            Some(progress) => progress,
            // triangle wave so the bar sweeps back and forth
            None => {
                let phase = self.pulse * 2.0;
                let sweep = if phase <= 1.0 { phase } else { 2.0 - phase };
                sweep * (1.0 - PULSE_SPAN) + PULSE_SPAN
            }
        }
    }

    pub fn view(&self) -> Element<'_, DownloadMessage> {
        let download_button = button("Download MP3")
            .on_press_maybe((!self.is_downloading).then_some(DownloadMessage::DownloadPressed))
            .padding([10, 20]);

        let url_row = row![
            text("YouTube URL:").size(16),
            text_input("Enter a YouTube URL...", &self.youtube_url)
                .on_input(DownloadMessage::UrlChanged)
                .on_submit(DownloadMessage::DownloadPressed)
                .padding(10),
            download_button,
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        let library = Column::with_children(self.entries.iter().map(|entry| {
            let is_selected = self.selected.as_deref() == Some(entry.name.as_str());
            button(text(entry.name.as_str()))
                .on_press(DownloadMessage::EntrySelected(entry.name.clone()))
                .width(Length::Fill)
                .style(if is_selected {
                    button::primary
                } else {
                    button::text
                })
                .into()
        }))
        .spacing(2);

        let controls = row![
            button("▶ Play").on_press(DownloadMessage::PlayPressed),
            button("⏸ Pause").on_press(DownloadMessage::PausePressed),
            button("⏹ Stop").on_press(DownloadMessage::StopPressed),
            Space::new().width(Length::Fixed(20.0)),
            text("Volume:"),
            slider(0..=100, self.volume, DownloadMessage::VolumeChanged).width(Length::Fixed(120.0)),
            text(self.volume.to_string()),
        ]
        .spacing(8)
        .align_y(Alignment::Center);

        column![
            url_row,
            progress_bar(0.0..=1.0, self.progress_value()),
            text(&self.status_message).size(14),
            Space::new().height(Length::Fixed(20.0)),
            text("Downloaded MP3s:").size(16),
            scrollable(library).height(Length::Fill),
            controls,
        ]
        .padding(20)
        .spacing(10)
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn entries(names: &[&str]) -> Vec<LibraryEntry> {
        names
            .iter()
            .map(|name| LibraryEntry {
                name: name.to_string(),
                path: PathBuf::from("downloads").join(name),
            })
            .collect()
    }

    #[test]
    fn test_selection_survives_refresh() {
        let mut view = DownloadView::default();
        view.set_entries(entries(&["a.mp3", "b.mp3"]));
        view.update(DownloadMessage::EntrySelected("b.mp3".to_string()));

        view.set_entries(entries(&["a.mp3", "b.mp3", "c.mp3"]));
        assert_eq!(view.selected_entry().map(|e| e.name.as_str()), Some("b.mp3"));

        view.set_entries(entries(&["a.mp3"]));
        assert_eq!(view.selected, None);
        assert!(view.selected_entry().is_none());
    }

    #[test]
    fn test_progress_value() {
        let mut view = DownloadView::default();
        assert_eq!(view.progress_value(), 0.0);

        view.start_download();
        assert_eq!(view.progress_value(), PULSE_SPAN);

        view.download_progress = Some(0.5);
        assert_eq!(view.progress_value(), 0.5);

        view.finish_download();
        assert_eq!(view.progress_value(), 0.0);
    }

    #[test]
    fn test_pulse_wraps() {
        let mut view = DownloadView::default();
        for _ in 0..75 {
            view.advance_pulse();
        }
        assert!(view.pulse >= 0.0 && view.pulse < 1.0);
    }
}
