use std::sync::Arc;
use std::time::Duration;

use iced::{Subscription, Task};
use tracing::{error, warn};

use crate::api::{MediaClient, YtDlpResolver};
use crate::application::{DownloadCoordinator, DownloadEvent, Library, Player};
use crate::audio::RodioEngine;
use crate::config::AppConfig;
use crate::domain::{AppError, DownloadRequest, Notice, NoticeLevel};
use crate::ui::{DownloadMessage, DownloadView};

pub struct DownloadApp {
    view: DownloadView,
    coordinator: DownloadCoordinator,
    player: Player,
}

impl Default for DownloadApp {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadApp {
    pub fn new() -> Self {
        let config = AppConfig::default();
        let library = Library::new(&config.library_dir, &config.audio_extension);
        let coordinator = DownloadCoordinator::new(
            Arc::new(YtDlpResolver::new(config.extractor.clone())),
            MediaClient::default(),
            library,
        );
        let player = Player::new(Box::new(RodioEngine::new()), config.default_volume);

        Self::with_parts(coordinator, player)
    }

    pub fn with_parts(coordinator: DownloadCoordinator, player: Player) -> Self {
        let mut view = DownloadView {
            volume: player.volume(),
            ..DownloadView::default()
        };

        match coordinator.library().refresh() {
            Ok(entries) => view.set_entries(entries),
            Err(e) => {
                error!(dir = %coordinator.library().dir().display(), error = %e, "cannot read library");
                view.status_message = format!("Error: {}", e);
            }
        }

        Self {
            view,
            coordinator,
            player,
        }
    }

    fn refresh_library(&mut self) -> Task<Message> {
        match self.coordinator.library().refresh() {
            Ok(entries) => {
                self.view.set_entries(entries);
                Task::none()
            }
            Err(e) => {
                error!(error = %e, "library refresh failed");
                show_notice(Notice::error("Error", format!("Cannot read library:\n{}", e)))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(DownloadMessage),
    Download(DownloadEvent),
    /// Drives the indeterminate progress animation
    Tick,
    NoticeClosed,
}

pub fn update(app: &mut DownloadApp, message: Message) -> Task<Message> {
    match message {
        Message::UiMessage(ui_msg) => {
            app.view.update(ui_msg.clone());

            match ui_msg {
                DownloadMessage::DownloadPressed => {
                    // one download at a time
                    if app.view.is_downloading {
                        return Task::none();
                    }

                    match DownloadRequest::parse(&app.view.youtube_url) {
                        Ok(request) => {
                            app.view.start_download();
                            // iced Task::run drives the stream on the background tokio
                            // executor and feeds each event back through update
                            return Task::run(
                                app.coordinator.download_stream(request),
                                Message::Download,
                            );
                        }
                        Err(e) => return show_notice(error_notice(&e)),
                    }
                }
                DownloadMessage::PlayPressed => {
                    match app.player.play(app.view.selected_entry()) {
                        Ok(status) => app.view.status_message = status.to_string(),
                        Err(e) => {
                            warn!(error = %e, "play failed");
                            return show_notice(error_notice(&e));
                        }
                    }
                }
                DownloadMessage::PausePressed => {
                    if let Some(status) = app.player.pause() {
                        app.view.status_message = status.to_string();
                    }
                }
                DownloadMessage::StopPressed => {
                    app.view.status_message = app.player.stop().to_string();
                }
                DownloadMessage::VolumeChanged(volume) => {
                    app.player.set_volume(volume);
                }
                DownloadMessage::UrlChanged(_) | DownloadMessage::EntrySelected(_) => {}
            }
        }
        Message::Download(event) => match event {
            DownloadEvent::Resolved { title } => {
                app.view.status_message = format!("Downloading: {}", title);
            }
            DownloadEvent::Progress(progress) => {
                app.view.download_progress = progress;
            }
            DownloadEvent::Completed(outcome) => {
                app.view.finish_download();
                app.view.status_message = format!("Downloaded: {}", outcome.title);
                let refresh = app.refresh_library();
                return Task::batch([
                    refresh,
                    show_notice(Notice::info("Success", "Download complete!")),
                ]);
            }
            DownloadEvent::Failed(e) => {
                app.view.finish_download();
                app.view.status_message = format!("Error: {}", e);
                return show_notice(error_notice(&e));
            }
        },
        Message::Tick => {
            if app.view.is_downloading && app.view.download_progress.is_none() {
                app.view.advance_pulse();
            }
        }
        Message::NoticeClosed => {}
    }
    Task::none()
}

pub fn view(app: &DownloadApp) -> iced::Element<'_, Message> {
    app.view.view().map(Message::UiMessage)
}

pub fn subscription(app: &DownloadApp) -> Subscription<Message> {
    if app.view.is_downloading {
        iced::time::every(Duration::from_millis(30)).map(|_| Message::Tick)
    } else {
        Subscription::none()
    }
}

fn error_notice(error: &AppError) -> Notice {
    match error {
        AppError::NoSelection => Notice::warning("Warning", error.to_string()),
        AppError::EmptyUrl => Notice::error("Error", error.to_string()),
        AppError::Playback(_) => Notice::error("Error", format!("Cannot play file:\n{}", error)),
        AppError::Fetch(_) | AppError::Io(_) => {
            Notice::error("Error", format!("Download failed:\n{}", error))
        }
    }
}

/// Shows a blocking message box without stalling the update loop.
fn show_notice(notice: Notice) -> Task<Message> {
    Task::perform(
        async move {
            let level = match notice.level {
                NoticeLevel::Info => rfd::MessageLevel::Info,
                NoticeLevel::Warning => rfd::MessageLevel::Warning,
                NoticeLevel::Error => rfd::MessageLevel::Error,
            };

            rfd::AsyncMessageDialog::new()
                .set_level(level)
                .set_title(&notice.title)
                .set_description(&notice.body)
                .set_buttons(rfd::MessageButtons::Ok)
                .show()
                .await;
        },
        |_| Message::NoticeClosed,
    )
}
