mod api;
mod app;
mod application;
mod audio;
mod config;
mod domain;
mod ui;
mod utils;

use iced::window;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const ICON_SIZE: u32 = 64;

/// Draws the window icon: a white disc with a dark centre hole on red.
fn app_icon() -> Option<window::Icon> {
    let center = (ICON_SIZE as f32 - 1.0) / 2.0;
    let img = image::RgbaImage::from_fn(ICON_SIZE, ICON_SIZE, |x, y| {
        let dx = x as f32 - center;
        let dy = y as f32 - center;
        let distance = (dx * dx + dy * dy).sqrt();

        if distance < 6.0 {
            image::Rgba([40, 40, 40, 255])
        } else if distance < 22.0 {
            image::Rgba([245, 245, 245, 255])
        } else if distance < 31.0 {
            image::Rgba([214, 48, 49, 255])
        } else {
            image::Rgba([0, 0, 0, 0])
        }
    });

    let (width, height) = img.dimensions();
    window::icon::from_rgba(img.into_raw(), width, height).ok()
}

fn main() -> iced::Result {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "simple_mp3_player=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    iced::application(app::DownloadApp::default, app::update, app::view)
        .title("MP3 Downloader & Player")
        .subscription(app::subscription)
        .window(window::Settings {
            icon: app_icon(),
            size: iced::Size::new(700.0, 500.0),
            ..Default::default()
        })
        .run()
}
