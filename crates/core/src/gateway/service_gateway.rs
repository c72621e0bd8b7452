//! Gateway over an [`ExtractionService`].

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use super::error::{classify_service_error, DownloadError, ExecuteError, InfoError};
use super::traits::{ExtractionGateway, ExtractionService, ProgressCallback};
use super::types::{MediaMetadata, ProgressControl};
use crate::options::JobOptions;
use crate::progress::RawProgress;
use crate::registry::CancelFlag;

/// Standard gateway: validates input, enforces cancellation and classifies
/// service failures.
pub struct ServiceGateway<S: ExtractionService> {
    service: Arc<S>,
}

impl<S: ExtractionService> ServiceGateway<S> {
    pub fn new(service: S) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    pub fn from_arc(service: Arc<S>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }
}

impl<S: ExtractionService> Clone for ServiceGateway<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

fn is_http_url(url: &str) -> bool {
    let url = url.trim();
    (url.starts_with("http://") || url.starts_with("https://")) && url.len() > "https://".len()
}

#[async_trait]
impl<S: ExtractionService + 'static> ExtractionGateway for ServiceGateway<S> {
    async fn resolve_info(&self, url: &str) -> Result<MediaMetadata, InfoError> {
        if !is_http_url(url) {
            return Err(InfoError::InvalidUrl(url.to_string()));
        }

        debug!(backend = self.service.name(), url, "resolving media info");
        self.service
            .resolve_info(url.trim())
            .await
            .map_err(|e| InfoError::Service(e.message))
    }

    async fn execute(
        &self,
        options: &JobOptions,
        cancel: &CancelFlag,
        on_progress: ProgressCallback<'_>,
    ) -> Result<PathBuf, ExecuteError> {
        if cancel.is_cancelled() {
            return Err(ExecuteError::Cancelled);
        }

        let abort_observed = AtomicBool::new(false);
        let sink = |raw: &RawProgress| {
            on_progress(raw);
            if cancel.is_cancelled() {
                abort_observed.store(true, Ordering::SeqCst);
                ProgressControl::Abort
            } else {
                ProgressControl::Continue
            }
        };

        let result = self.service.execute(options, &sink).await;
        let observed = abort_observed.load(Ordering::SeqCst);

        match result {
            Ok(_) if observed => {
                warn!(
                    backend = self.service.name(),
                    url = %options.source_url,
                    "service finished after abort was requested"
                );
                Err(ExecuteError::Cancelled)
            }
            Ok(path) => Ok(path),
            Err(e) if observed || e.is_aborted() => Err(ExecuteError::Cancelled),
            Err(e) => {
                let kind = classify_service_error(&e);
                debug!(backend = self.service.name(), %kind, error = %e, "download failed");
                Err(ExecuteError::Download(DownloadError::new(kind, e.message)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{DownloadErrorKind, MediaKind, ServiceError, ServiceProgressSink};
    use crate::options::OptionsBuilder;
    use std::sync::Mutex;

    /// Service that emits a fixed number of events, then returns its outcome.
    struct ScriptedService {
        events: usize,
        outcome: Result<PathBuf, ServiceError>,
        honor_abort: bool,
    }

    #[async_trait]
    impl ExtractionService for ScriptedService {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn resolve_info(&self, url: &str) -> Result<MediaMetadata, ServiceError> {
            Ok(MediaMetadata {
                kind: MediaKind::Video,
                id: "abc".to_string(),
                webpage_url: Some(url.to_string()),
                ..Default::default()
            })
        }

        async fn execute(
            &self,
            _options: &JobOptions,
            sink: ServiceProgressSink<'_>,
        ) -> Result<PathBuf, ServiceError> {
            for i in 0..self.events {
                let control = sink(&RawProgress::bytes(i as u64, Some(self.events as u64)));
                if control == ProgressControl::Abort && self.honor_abort {
                    return Err(ServiceError::aborted());
                }
            }
            self.outcome.clone()
        }
    }

    fn gateway(events: usize, outcome: Result<PathBuf, ServiceError>) -> ServiceGateway<ScriptedService> {
        ServiceGateway::new(ScriptedService {
            events,
            outcome,
            honor_abort: true,
        })
    }

    fn options() -> JobOptions {
        OptionsBuilder::new("https://example.com/watch?v=abc")
            .output_dir("/tmp")
            .build()
    }

    #[tokio::test]
    async fn test_resolve_rejects_non_http_urls() {
        let gw = gateway(0, Ok(PathBuf::from("/tmp/a.mp3")));
        assert!(matches!(
            gw.resolve_info("not a url").await,
            Err(InfoError::InvalidUrl(_))
        ));
        assert!(gw.resolve_info("https://example.com/v").await.is_ok());
    }

    #[tokio::test]
    async fn test_execute_forwards_progress() {
        let gw = gateway(3, Ok(PathBuf::from("/tmp/a.mp3")));
        let seen = Mutex::new(0usize);
        let cb = |_: &RawProgress| *seen.lock().unwrap() += 1;

        let path = gw.execute(&options(), &CancelFlag::new(), &cb).await.unwrap();
        assert_eq!(path, PathBuf::from("/tmp/a.mp3"));
        assert_eq!(*seen.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_cancel_observed_in_progress_callback() {
        let gw = gateway(10, Ok(PathBuf::from("/tmp/a.mp3")));
        let cancel = CancelFlag::new();
        let seen = Mutex::new(0usize);
        let cb = |_: &RawProgress| {
            let mut n = seen.lock().unwrap();
            *n += 1;
            if *n == 2 {
                cancel.cancel();
            }
        };

        let result = gw.execute(&options(), &cancel, &cb).await;
        assert!(matches!(result, Err(ExecuteError::Cancelled)));
        assert_eq!(*seen.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_success_after_ignored_abort_is_cancelled() {
        let gw = ServiceGateway::new(ScriptedService {
            events: 3,
            outcome: Ok(PathBuf::from("/tmp/a.mp3")),
            honor_abort: false,
        });
        let cancel = CancelFlag::new();
        let cb = |_: &RawProgress| cancel.cancel();

        let result = gw.execute(&options(), &cancel, &cb).await;
        assert!(matches!(result, Err(ExecuteError::Cancelled)));
    }

    #[tokio::test]
    async fn test_pre_cancelled_never_calls_service() {
        let gw = gateway(3, Ok(PathBuf::from("/tmp/a.mp3")));
        let cancel = CancelFlag::new();
        cancel.cancel();
        let seen = Mutex::new(0usize);
        let cb = |_: &RawProgress| *seen.lock().unwrap() += 1;

        assert!(matches!(
            gw.execute(&options(), &cancel, &cb).await,
            Err(ExecuteError::Cancelled)
        ));
        assert_eq!(*seen.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_errors_are_classified() {
        let gw = gateway(
            0,
            Err(ServiceError::new("ERROR: Unable to obtain file audio codec with ffprobe")),
        );
        let cb = |_: &RawProgress| {};
        match gw.execute(&options(), &CancelFlag::new(), &cb).await {
            Err(ExecuteError::Download(e)) => assert_eq!(e.kind, DownloadErrorKind::ProbeFailure),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_aborted_code_maps_to_cancelled() {
        let gw = gateway(0, Err(ServiceError::aborted()));
        let cb = |_: &RawProgress| {};
        assert!(matches!(
            gw.execute(&options(), &CancelFlag::new(), &cb).await,
            Err(ExecuteError::Cancelled)
        ));
    }
}
