pub mod batch;
pub mod config;
pub mod format;
pub mod gateway;
pub mod job;
pub mod locator;
pub mod manager;
pub mod metrics;
pub mod options;
pub mod progress;
pub mod registry;
pub mod testing;
pub mod ytdlp;

pub use batch::{BatchConfig, BatchCoordinator, BatchItem, BatchSummary};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use format::{AudioCodec, FormatSpec};
pub use gateway::{
    DownloadError, DownloadErrorKind, ExecuteError, ExtractionGateway, ExtractionService,
    InfoError, MediaKind, MediaMetadata, PlaylistEntry, ProgressControl, ServiceError,
    ServiceErrorCode, ServiceGateway,
};
pub use job::{DownloadResult, JobObserver, JobOrchestrator, JobState, RetryConfig, CANCELLED_MESSAGE};
pub use locator::{BinaryLocator, FixedLocator, SystemLocator};
pub use manager::{JobEvents, JobManager, ManagerConfig, NoopEvents};
pub use options::{sanitize_title, JobOptions, OptionsBuilder};
pub use progress::{ProgressAggregator, ProgressConfig, ProgressSnapshot, RawProgress, RawStatus};
pub use registry::{CancelFlag, JobHandle, JobId, JobKind, JobRegistry};
pub use ytdlp::{YtDlpConfig, YtDlpService};
