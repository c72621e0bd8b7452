//! Extraction gateway.
//!
//! The orchestrator never talks to an extraction backend directly. It goes
//! through an [`ExtractionGateway`], which resolves metadata, runs downloads,
//! enforces cooperative cancellation from inside the progress callback, and
//! classifies backend failures into [`DownloadErrorKind`]s.
//!
//! Backends implement the lower-level [`ExtractionService`] trait;
//! [`ServiceGateway`] adapts any service into a gateway.

mod error;
mod service_gateway;
mod traits;
mod types;

pub use error::{
    classify_service_error, DownloadError, DownloadErrorKind, ExecuteError, InfoError,
    ServiceError, ServiceErrorCode,
};
pub use service_gateway::ServiceGateway;
pub use traits::{ExtractionGateway, ExtractionService, ProgressCallback, ServiceProgressSink};
pub use types::{MediaKind, MediaMetadata, PlaylistEntry, ProgressControl};
