//! Sequential per-item dispatch for collections.

use std::sync::Arc;

use tracing::{info, warn};

use super::config::BatchConfig;
use super::types::{BatchItem, BatchSummary, DEFAULT_COLLECTION_TITLE};
use crate::gateway::ExtractionGateway;
use crate::job::{DownloadResult, JobObserver, JobOrchestrator, RetryConfig};
use crate::metrics;
use crate::options::{sanitize_title, JobOptions, OptionsBuilder};
use crate::progress::{ProgressAggregator, ProgressSnapshot};
use crate::registry::CancelFlag;

pub struct BatchCoordinator {
    gateway: Arc<dyn ExtractionGateway>,
    cancel: CancelFlag,
    retry: RetryConfig,
    config: BatchConfig,
}

impl BatchCoordinator {
    pub fn new(gateway: Arc<dyn ExtractionGateway>, cancel: CancelFlag) -> Self {
        Self {
            gateway,
            cancel,
            retry: RetryConfig::default(),
            config: BatchConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_config(mut self, config: BatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Whether `url` resolves to a collection. Resolution errors count as no.
    pub async fn is_collection(&self, url: &str) -> bool {
        match self.gateway.resolve_info(url).await {
            Ok(info) => info.is_playlist(),
            Err(e) => {
                warn!(url, error = %e, "could not resolve URL while checking for a playlist");
                false
            }
        }
    }

    /// Downloads every entry of the collection at `url`.
    ///
    /// Results are in entry order, one per processed entry. Item failures
    /// never stop the batch; cancellation appends one cancelled result and
    /// stops.
    pub async fn run_batch(
        &self,
        url: &str,
        base_options: &JobOptions,
        aggregator: &mut ProgressAggregator,
        observer: &dyn JobObserver,
    ) -> Vec<DownloadResult> {
        let info = match self.gateway.resolve_info(url).await {
            Ok(info) => info,
            Err(e) => {
                return vec![DownloadResult::failure(format!(
                    "Failed to fetch playlist information: {}",
                    e
                ))];
            }
        };

        if !info.is_playlist() {
            return vec![DownloadResult::failure("URL is not a playlist")];
        }
        if info.entries.is_empty() {
            return vec![DownloadResult::failure("Playlist is empty")];
        }

        let collection_title = sanitize_title(
            info.title
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or(DEFAULT_COLLECTION_TITLE),
        );
        let total = info.entries.len();
        info!(url, title = %collection_title, total, "starting playlist");

        let mut results = Vec::with_capacity(total);
        for (offset, entry) in info.entries.iter().enumerate() {
            let index = offset + 1;
            let item = match BatchItem::from_slot(entry.as_ref(), index, total, &self.config.watch_url_base) {
                Ok(item) => item,
                Err(message) => {
                    warn!(url, index, error = %message, "skipping playlist entry");
                    metrics::BATCH_ITEMS.with_label_values(&["failed"]).inc();
                    results.push(DownloadResult::failure(message));
                    continue;
                }
            };

            observer.on_item_start(item.index, item.total_count, &item.title);
            aggregator.reset();
            observer.on_progress(&ProgressSnapshot::zero(format!(
                "Item {} of {}: {}",
                item.index, item.total_count, item.title
            )));

            if self.cancel.is_cancelled() {
                metrics::BATCH_ITEMS.with_label_values(&["cancelled"]).inc();
                results.push(DownloadResult::cancelled());
                break;
            }

            let result = self.run_item(&item, base_options, &collection_title, aggregator, observer).await;
            let cancelled = result.is_cancelled();
            let label = if result.is_success() {
                "success"
            } else if cancelled {
                "cancelled"
            } else {
                "failed"
            };
            metrics::BATCH_ITEMS.with_label_values(&[label]).inc();
            results.push(result);

            if cancelled {
                break;
            }
        }

        let summary = BatchSummary::from_results(&results);
        info!(
            url,
            succeeded = summary.succeeded,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "playlist finished"
        );
        results
    }

    async fn run_item(
        &self,
        item: &BatchItem,
        base_options: &JobOptions,
        collection_title: &str,
        aggregator: &mut ProgressAggregator,
        observer: &dyn JobObserver,
    ) -> DownloadResult {
        let index = u32::try_from(item.index).unwrap_or(u32::MAX);
        let options = OptionsBuilder::from_options(base_options)
            .source_url(&item.entry_url)
            .playlist_title(collection_title)
            .playlist_index(index)
            .build();

        let mut job = JobOrchestrator::new(Arc::clone(&self.gateway), options, self.cancel.clone())
            .with_retry(self.retry.clone());
        job.run(aggregator, observer).await
    }
}
