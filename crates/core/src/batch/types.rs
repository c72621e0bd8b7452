use serde::Serialize;

use crate::gateway::PlaylistEntry;
use crate::job::DownloadResult;

/// Title used when a collection reports none.
pub const DEFAULT_COLLECTION_TITLE: &str = "Playlist";

/// One entry of a resolved collection, ready to dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItem {
    /// 1-based position in the collection.
    pub index: usize,
    pub total_count: usize,
    pub title: String,
    pub entry_url: String,
}

impl BatchItem {
    /// Builds an item from a playlist position, which may hold no entry at all.
    pub fn from_slot(
        slot: Option<&PlaylistEntry>,
        index: usize,
        total_count: usize,
        watch_url_base: &str,
    ) -> Result<Self, String> {
        match slot {
            Some(entry) => Self::from_entry(entry, index, total_count, watch_url_base),
            None => Err(format!("Item {}: Invalid entry", index)),
        }
    }

    /// Builds an item from a playlist entry.
    ///
    /// Returns the per-item failure message when the entry carries neither
    /// an id nor a URL.
    pub fn from_entry(
        entry: &PlaylistEntry,
        index: usize,
        total_count: usize,
        watch_url_base: &str,
    ) -> Result<Self, String> {
        let entry_url = entry_url(entry, watch_url_base)
            .ok_or_else(|| format!("Item {}: No URL found", index))?;
        let title = entry
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Track {}", index));

        Ok(Self {
            index,
            total_count,
            title,
            entry_url,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn entry_url(entry: &PlaylistEntry, watch_url_base: &str) -> Option<String> {
    let raw = non_empty(&entry.webpage_url)
        .or_else(|| non_empty(&entry.url))
        .or_else(|| Some(entry.id.trim()).filter(|id| !id.is_empty()))?;

    if raw.starts_with("http://") || raw.starts_with("https://") {
        Some(raw.to_string())
    } else {
        Some(format!("{}{}", watch_url_base, raw))
    }
}

/// Counts over a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[DownloadResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Default::default()
        };
        for result in results {
            if result.is_success() {
                summary.succeeded += 1;
            } else if result.is_cancelled() {
                summary.cancelled += 1;
            } else {
                summary.failed += 1;
            }
        }
        summary
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled > 0
    }

    pub fn status_line(&self) -> String {
        let mut line = format!(
            "Playlist finished: {} of {} downloaded",
            self.succeeded, self.total
        );
        if self.failed > 0 {
            line.push_str(&format!(", {} failed", self.failed));
        }
        if self.cancelled > 0 {
            line.push_str(", cancelled");
        }
        line
    }
}
