//! Playlist fan-out.
//!
//! A [`BatchCoordinator`] resolves a collection URL, expands it into
//! [`BatchItem`]s and runs one [`JobOrchestrator`](crate::job::JobOrchestrator)
//! per item, strictly in order, into a subdirectory named after the
//! collection.

mod config;
mod coordinator;
mod types;

pub use config::BatchConfig;
pub use coordinator::BatchCoordinator;
pub use types::{BatchItem, BatchSummary, DEFAULT_COLLECTION_TITLE};
