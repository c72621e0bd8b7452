//! Batch coordinator integration tests.
//!
//! These tests verify playlist fan-out against the mock extraction service:
//! resolve -> per-item orchestration -> ordered results

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tonegrab_core::{
    gateway::ServiceGateway,
    job::JobObserver,
    testing::{fixtures, MockExtractionService, RecordedEvent, RecordingEvents},
    BatchCoordinator, CancelFlag, DownloadResult, ExtractionGateway, OptionsBuilder,
    PlaylistEntry, ProgressAggregator, ProgressConfig, ProgressSnapshot, RetryConfig,
    ServiceError,
};

const LIST: &str = "https://www.youtube.com/playlist?list=PLroadtrip";

struct TestHarness {
    service: MockExtractionService,
    gateway: Arc<dyn ExtractionGateway>,
}

impl TestHarness {
    async fn with_playlist(count: usize) -> Self {
        let service = MockExtractionService::new();
        service
            .set_metadata(LIST, fixtures::playlist_metadata(LIST, "Road Trip", count))
            .await;
        let gateway: Arc<dyn ExtractionGateway> = Arc::new(ServiceGateway::new(service.clone()));
        Self { service, gateway }
    }

    fn coordinator(&self, cancel: CancelFlag) -> BatchCoordinator {
        BatchCoordinator::new(Arc::clone(&self.gateway), cancel)
            .with_retry(RetryConfig::default().with_delay_ms(1))
    }

    async fn run(&self, cancel: CancelFlag, observer: &dyn JobObserver) -> Vec<DownloadResult> {
        let base = OptionsBuilder::new(LIST).output_dir("/music").build();
        self.coordinator(cancel)
            .run_batch(
                LIST,
                &base,
                &mut ProgressAggregator::new(ProgressConfig::unthrottled()),
                observer,
            )
            .await
    }
}

#[tokio::test]
async fn test_failures_do_not_abort_the_batch() {
    let harness = TestHarness::with_playlist(3).await;
    harness.service.push_success("/music/Road Trip/001 - Song 1.mp3").await;
    harness.service.push_error(ServiceError::new("HTTP Error 403: Forbidden")).await;
    harness.service.push_success("/music/Road Trip/003 - Song 3.mp3").await;

    let results = harness.run(CancelFlag::new(), &RecordingEvents::new()).await;

    assert_eq!(results.len(), 3);
    assert!(results[0].is_success());
    assert!(!results[1].is_success());
    assert_eq!(results[1].error_message(), Some("Download failed: HTTP Error 403: Forbidden"));
    assert!(results[2].is_success());
    assert_eq!(
        harness.service.executed_urls().await,
        vec![fixtures::entry_url(1), fixtures::entry_url(2), fixtures::entry_url(3)]
    );
}

#[tokio::test]
async fn test_items_go_into_playlist_directory_with_their_index() {
    let harness = TestHarness::with_playlist(3).await;

    let events = RecordingEvents::new();
    let results = harness.run(CancelFlag::new(), &events).await;

    let paths: Vec<PathBuf> = results
        .iter()
        .filter_map(|r| r.file_path().map(|p| p.to_path_buf()))
        .collect();
    assert_eq!(
        paths,
        vec![
            PathBuf::from("/music/Road Trip/001 - Test Video.mp3"),
            PathBuf::from("/music/Road Trip/002 - Test Video.mp3"),
            PathBuf::from("/music/Road Trip/003 - Test Video.mp3"),
        ]
    );

    let executions = harness.service.recorded_executions().await;
    assert!(executions.iter().all(|o| o.playlist_title.as_deref() == Some("Road Trip")));
    assert_eq!(
        executions.iter().map(|o| o.playlist_index).collect::<Vec<_>>(),
        vec![Some(1), Some(2), Some(3)]
    );
    assert_eq!(
        events.item_starts(),
        vec![
            (1, 3, "Song 1".to_string()),
            (2, 3, "Song 2".to_string()),
            (3, 3, "Song 3".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_empty_playlist() {
    let harness = TestHarness::with_playlist(0).await;

    let results = harness.run(CancelFlag::new(), &RecordingEvents::new()).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].error_message(), Some("Playlist is empty"));
    assert_eq!(harness.service.execute_count().await, 0);
}

#[tokio::test]
async fn test_entry_without_url_is_reported_and_skipped() {
    let harness = TestHarness::with_playlist(0).await;
    let mut playlist = fixtures::playlist_metadata(LIST, "Road Trip", 3);
    playlist.entries[1] = Some(PlaylistEntry::default());
    harness.service.set_metadata(LIST, playlist).await;

    let events = RecordingEvents::new();
    let results = harness.run(CancelFlag::new(), &events).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[1].error_message(), Some("Item 2: No URL found"));
    assert!(results[0].is_success() && results[2].is_success());
    assert_eq!(harness.service.execute_count().await, 2);
    assert_eq!(events.item_starts().len(), 2);
}

#[tokio::test]
async fn test_unavailable_entry_is_reported_and_skipped() {
    let harness = TestHarness::with_playlist(0).await;
    let mut playlist = fixtures::playlist_metadata(LIST, "Road Trip", 3);
    playlist.entries[0] = None;
    harness.service.set_metadata(LIST, playlist).await;

    let events = RecordingEvents::new();
    let results = harness.run(CancelFlag::new(), &events).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].error_message(), Some("Item 1: Invalid entry"));
    assert!(results[1].is_success() && results[2].is_success());
    assert_eq!(harness.service.execute_count().await, 2);
    assert_eq!(
        events.item_starts().first().map(|(index, total, _)| (*index, *total)),
        Some((2, 3))
    );
}

#[tokio::test]
async fn test_probe_failure_in_item_is_retried_then_batch_continues() {
    let harness = TestHarness::with_playlist(2).await;
    for _ in 0..3 {
        harness
            .service
            .push_error(ServiceError::new("Unable to obtain file audio codec with ffprobe"))
            .await;
    }

    let results = harness.run(CancelFlag::new(), &RecordingEvents::new()).await;

    assert_eq!(results.len(), 2);
    assert!(results[0]
        .error_message()
        .unwrap()
        .starts_with("Failed to analyze audio file"));
    assert!(results[1].is_success());
    assert_eq!(harness.service.execute_count().await, 4);
}

#[tokio::test]
async fn test_percent_resets_for_each_item() {
    let harness = TestHarness::with_playlist(3).await;
    harness.service.set_default_progress(fixtures::progress_script(4)).await;

    let events = RecordingEvents::new();
    harness.run(CancelFlag::new(), &events).await;

    let mut per_item: Vec<Vec<u8>> = Vec::new();
    for event in events.events() {
        match event {
            RecordedEvent::ItemStart { .. } => per_item.push(Vec::new()),
            RecordedEvent::Progress(snapshot) => {
                per_item.last_mut().unwrap().push(snapshot.percent);
            }
            _ => {}
        }
    }

    assert_eq!(per_item.len(), 3);
    for percents in per_item {
        assert_eq!(percents.first(), Some(&0));
        assert_eq!(percents.last(), Some(&100));
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    }
}

/// Cancels the batch as soon as item `item` reports real progress.
struct CancelDuringItem {
    item: usize,
    current: AtomicUsize,
    cancel: CancelFlag,
}

impl JobObserver for CancelDuringItem {
    fn on_item_start(&self, index: usize, _total: usize, _title: &str) {
        self.current.store(index, Ordering::SeqCst);
    }

    fn on_progress(&self, snapshot: &ProgressSnapshot) {
        if self.current.load(Ordering::SeqCst) == self.item && snapshot.percent > 0 {
            self.cancel.cancel();
        }
    }
}

#[tokio::test]
async fn test_cancel_during_second_item_of_five() {
    let harness = TestHarness::with_playlist(5).await;
    harness.service.set_default_progress(fixtures::progress_script(4)).await;

    let cancel = CancelFlag::new();
    let observer = CancelDuringItem {
        item: 2,
        current: AtomicUsize::new(0),
        cancel: cancel.clone(),
    };
    let results = harness.run(cancel, &observer).await;

    assert_eq!(results.len(), 2);
    assert!(results[0].is_success());
    assert!(results[1].is_cancelled());
    assert_eq!(harness.service.execute_count().await, 2);
}

#[tokio::test]
async fn test_cancel_before_batch_starts_items() {
    let harness = TestHarness::with_playlist(3).await;
    let cancel = CancelFlag::new();
    cancel.cancel();

    let results = harness.run(cancel, &RecordingEvents::new()).await;

    assert_eq!(results.len(), 1);
    assert!(results[0].is_cancelled());
    assert_eq!(harness.service.execute_count().await, 0);
}
