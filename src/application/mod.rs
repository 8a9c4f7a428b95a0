pub mod download_coordinator;
pub mod library;
pub mod player;

pub use download_coordinator::{DownloadCoordinator, DownloadEvent};
pub use library::Library;
pub use player::{PlaybackEngine, Player};
