use std::path::PathBuf;
use std::sync::Arc;

use futures::{stream::BoxStream, StreamExt};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::{
    api::{MediaClient, StreamResolver},
    application::Library,
    domain::{AppError, DownloadOutcome, DownloadRequest},
    utils::file_stem_for,
};

#[derive(Debug, Clone, PartialEq)]
pub enum DownloadEvent {
    /// The extractor found a stream; bytes are about to flow.
    Resolved { title: String },
    /// Fraction done, `None` when the host sent no length.
    Progress(Option<f32>),
    Completed(DownloadOutcome),
    Failed(AppError),
}

#[derive(Clone)]
pub struct DownloadCoordinator {
    resolver: Arc<dyn StreamResolver>,
    client: MediaClient,
    library: Library,
}

impl DownloadCoordinator {
    pub fn new(resolver: Arc<dyn StreamResolver>, client: MediaClient, library: Library) -> Self {
        Self {
            resolver,
            client,
            library,
        }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    /// Runs one download. The stream always ends with exactly one
    /// `Completed` or `Failed` event.
    pub fn download_stream(&self, request: DownloadRequest) -> BoxStream<'static, DownloadEvent> {
        futures::stream::unfold(
            DownloadRuntimeState::Start {
                coordinator: self.clone(),
                request,
            },
            |state| async move {
                match state {
                    DownloadRuntimeState::Start {
                        coordinator,
                        request,
                    } => match coordinator.begin(request).await {
                        Ok(active) => Some((
                            DownloadEvent::Resolved {
                                title: active.title.clone(),
                            },
                            DownloadRuntimeState::Downloading(Box::new(active)),
                        )),
                        Err(e) => Some((DownloadEvent::Failed(e), DownloadRuntimeState::Finished)),
                    },
                    DownloadRuntimeState::Downloading(mut active) => {
                        let next = active.stream.next().await;
                        match next {
                            Some(Ok(chunk)) => {
                                if let Err(e) = active.file.write_all(&chunk).await {
                                    let error = active.abort(e.into()).await;
                                    return Some((
                                        DownloadEvent::Failed(error),
                                        DownloadRuntimeState::Finished,
                                    ));
                                }

                                active.downloaded += chunk.len() as u64;

                                Some((
                                    DownloadEvent::Progress(active.progress()),
                                    DownloadRuntimeState::Downloading(active),
                                ))
                            }
                            Some(Err(e)) => {
                                let error = active.abort(e.into()).await;
                                Some((DownloadEvent::Failed(error), DownloadRuntimeState::Finished))
                            }
                            None => match active.finish().await {
                                Ok(outcome) => Some((
                                    DownloadEvent::Completed(outcome),
                                    DownloadRuntimeState::Finished,
                                )),
                                Err(e) => Some((
                                    DownloadEvent::Failed(e),
                                    DownloadRuntimeState::Finished,
                                )),
                            },
                        }
                    }
                    DownloadRuntimeState::Finished => None,
                }
            },
        )
        .boxed()
    }

    async fn begin(&self, request: DownloadRequest) -> Result<ActiveDownload, AppError> {
        tokio::fs::create_dir_all(self.library.dir()).await?;

        info!(url = %request.url, "download started");
        let stream_info = self.resolver.resolve(&request.url).await.map_err(|e| {
            warn!(url = %request.url, error = %e, "stream resolution failed");
            AppError::from(e)
        })?;

        let fetched = self.library.dir().join(format!(
            "{}.{}",
            file_stem_for(&stream_info.title),
            stream_info.extension()
        ));
        let target = self
            .library
            .unique_path(&self.library.normalized_path(&fetched).unwrap_or(fetched));
        let partial = partial_path(&target);

        let file = tokio::fs::File::create(&partial).await?;

        match self.client.download_file_stream(&stream_info).await {
            Ok((total, stream)) => Ok(ActiveDownload {
                title: stream_info.title,
                file,
                stream,
                downloaded: 0,
                total,
                partial,
                target,
            }),
            Err(e) => {
                drop(file);
                discard_partial(&partial).await;
                warn!(url = %request.url, error = %e, "media request failed");
                Err(e.into())
            }
        }
    }
}

struct ActiveDownload {
    title: String,
    file: tokio::fs::File,
    stream: BoxStream<'static, crate::api::Result<bytes::Bytes>>,
    downloaded: u64,
    total: Option<u64>,
    /// Bytes land here first; the library never lists it.
    partial: PathBuf,
    target: PathBuf,
}

impl ActiveDownload {
    fn progress(&self) -> Option<f32> {
        self.total
            .filter(|total| *total > 0)
            .map(|total| (self.downloaded as f32 / total as f32).min(1.0))
    }

    async fn abort(self: Box<Self>, error: AppError) -> AppError {
        let ActiveDownload { file, partial, .. } = *self;
        drop(file);
        discard_partial(&partial).await;
        warn!(error = %error, "download failed");
        error
    }

    async fn finish(self: Box<Self>) -> Result<DownloadOutcome, AppError> {
        let ActiveDownload {
            title,
            file,
            partial,
            target,
            downloaded,
            ..
        } = *self;

        let synced = file.sync_all().await;
        drop(file);

        let renamed = match synced {
            Ok(()) => tokio::fs::rename(&partial, &target).await,
            Err(e) => Err(e),
        };
        if let Err(e) = renamed {
            discard_partial(&partial).await;
            return Err(e.into());
        }

        info!(title = %title, path = %target.display(), bytes = downloaded, "download completed");
        Ok(DownloadOutcome {
            title,
            path: target,
        })
    }
}

enum DownloadRuntimeState {
    Start {
        coordinator: DownloadCoordinator,
        request: DownloadRequest,
    },
    Downloading(Box<ActiveDownload>),
    Finished,
}

fn partial_path(target: &std::path::Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

async fn discard_partial(path: &std::path::Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "could not remove partial download");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::StreamInfo;
    use crate::api::ApiError;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct FakeResolver {
        outcome: Result<StreamInfo, String>,
    }

    #[async_trait]
    impl StreamResolver for FakeResolver {
        async fn resolve(&self, _url: &str) -> crate::api::Result<StreamInfo> {
            self.outcome.clone().map_err(ApiError::Extractor)
        }
    }

    fn stream_info(title: &str, url: String, ext: &str) -> StreamInfo {
        StreamInfo {
            title: title.to_string(),
            url: Some(url),
            ext: Some(ext.to_string()),
            http_headers: HashMap::new(),
            filesize: None,
            filesize_approx: None,
            requested_formats: None,
        }
    }

    fn coordinator(dir: &std::path::Path, outcome: Result<StreamInfo, String>) -> DownloadCoordinator {
        DownloadCoordinator::new(
            Arc::new(FakeResolver { outcome }),
            MediaClient::default(),
            Library::new(dir, "mp3"),
        )
    }

    fn dir_names(dir: &std::path::Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn request() -> DownloadRequest {
        DownloadRequest::parse("https://www.youtube.com/watch?v=abc").unwrap()
    }

    #[tokio::test]
    async fn test_download_renames_to_target_extension() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/audio")
            .with_status(200)
            .with_body("fake m4a bytes")
            .create_async()
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("downloads");
        let info = stream_info("Song", format!("{}/audio", server.url()), "m4a");

        let events: Vec<DownloadEvent> = coordinator(&dir, Ok(info))
            .download_stream(request())
            .collect()
            .await;

        assert_eq!(
            events.first(),
            Some(&DownloadEvent::Resolved {
                title: "Song".to_string()
            })
        );
        assert_eq!(
            events.last(),
            Some(&DownloadEvent::Completed(DownloadOutcome {
                title: "Song".to_string(),
                path: dir.join("Song.mp3"),
            }))
        );
        assert!(events
            .iter()
            .any(|e| matches!(e, DownloadEvent::Progress(_))));
        assert_eq!(dir_names(&dir), vec!["Song.mp3"]);
        assert_eq!(std::fs::read(dir.join("Song.mp3")).unwrap(), b"fake m4a bytes");
    }

    #[tokio::test]
    async fn test_download_keeps_matching_extension() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/a.mp3")
            .with_status(200)
            .with_body("mp3")
            .create_async()
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let info = stream_info("Track: One", format!("{}/a.mp3", server.url()), "mp3");

        let events: Vec<DownloadEvent> = coordinator(tmp.path(), Ok(info))
            .download_stream(request())
            .collect()
            .await;

        assert!(matches!(events.last(), Some(DownloadEvent::Completed(_))));
        assert_eq!(dir_names(tmp.path()), vec!["Track_ One.mp3"]);
    }

    #[tokio::test]
    async fn test_resolver_failure_is_verbatim_and_leaves_no_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("downloads");

        let events: Vec<DownloadEvent> = coordinator(&dir, Err("network unreachable".to_string()))
            .download_stream(request())
            .collect()
            .await;

        assert_eq!(
            events,
            vec![DownloadEvent::Failed(AppError::Fetch(
                "network unreachable".to_string()
            ))]
        );
        assert!(dir.is_dir());
        assert!(dir_names(&dir).is_empty());
    }

    #[tokio::test]
    async fn test_http_failure_removes_partial_file() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/audio")
            .with_status(500)
            .create_async()
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let info = stream_info("Song", format!("{}/audio", server.url()), "webm");

        let events: Vec<DownloadEvent> = coordinator(tmp.path(), Ok(info))
            .download_stream(request())
            .collect()
            .await;

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], DownloadEvent::Failed(AppError::Fetch(_))));
        assert!(dir_names(tmp.path()).is_empty());
    }

    #[tokio::test]
    async fn test_same_title_keeps_existing_file() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/audio")
            .with_status(200)
            .with_body("second intro")
            .create_async()
            .await;

        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("Intro.mp3"), b"first intro").unwrap();
        let info = stream_info("Intro", format!("{}/audio", server.url()), "m4a");

        let events: Vec<DownloadEvent> = coordinator(tmp.path(), Ok(info))
            .download_stream(request())
            .collect()
            .await;

        assert_eq!(
            events.last(),
            Some(&DownloadEvent::Completed(DownloadOutcome {
                title: "Intro".to_string(),
                path: tmp.path().join("Intro (1).mp3"),
            }))
        );
        assert_eq!(dir_names(tmp.path()), vec!["Intro (1).mp3", "Intro.mp3"]);
        assert_eq!(std::fs::read(tmp.path().join("Intro.mp3")).unwrap(), b"first intro");
        assert_eq!(
            std::fs::read(tmp.path().join("Intro (1).mp3")).unwrap(),
            b"second intro"
        );
    }

    #[tokio::test]
    async fn test_long_multibyte_title_downloads() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/audio")
            .with_status(200)
            .with_body("cjk")
            .create_async()
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let title = "歌".repeat(100);
        let info = stream_info(&title, format!("{}/audio", server.url()), "webm");

        let events: Vec<DownloadEvent> = coordinator(tmp.path(), Ok(info))
            .download_stream(request())
            .collect()
            .await;

        let expected = format!("{}.mp3", "歌".repeat(66));
        assert_eq!(
            events.last(),
            Some(&DownloadEvent::Completed(DownloadOutcome {
                title,
                path: tmp.path().join(&expected),
            }))
        );
        assert_eq!(dir_names(tmp.path()), vec![expected]);
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(std::path::Path::new("downloads/Song.mp3")),
            PathBuf::from("downloads/Song.mp3.part")
        );
    }
}
