//! Job API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use tonegrab_core::{JobHandle, JobId};

use crate::board::JobRecord;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// How the server decides between a single download and a playlist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobMode {
    /// Probe the URL and pick single or batch.
    #[default]
    Auto,
    Single,
    Batch,
}

/// Request body for starting a job
#[derive(Debug, Deserialize)]
pub struct CreateJobBody {
    pub url: String,
    /// Format name (e.g., "mp3", "wav"); defaults to `downloads.format`
    pub format: Option<String>,
    /// Quality string; defaults to `downloads.quality`
    pub quality: Option<String>,
    pub mode: Option<JobMode>,
}

/// Query parameters for listing jobs
#[derive(Debug, Deserialize)]
pub struct ListJobsParams {
    /// Only return running jobs
    pub active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ListJobsResponse {
    pub jobs: Vec<JobRecord>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct CancelJobResponse {
    pub id: JobId,
    pub cancel_requested: bool,
}

#[derive(Debug, Serialize)]
pub struct CancelAllResponse {
    pub cancelled: usize,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct JobErrorResponse {
    pub error: String,
}

type JobApiError = (StatusCode, Json<JobErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> JobApiError {
    (
        status,
        Json(JobErrorResponse {
            error: message.into(),
        }),
    )
}

fn parse_job_id(raw: &str) -> Result<JobId, JobApiError> {
    raw.parse::<JobId>()
        .map_err(|_| api_error(StatusCode::BAD_REQUEST, format!("Invalid job id: {}", raw)))
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

// ============================================================================
// Handlers
// ============================================================================

/// Start a download job
pub async fn create_job(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateJobBody>,
) -> Result<(StatusCode, Json<JobRecord>), JobApiError> {
    let url = body.url.trim();
    if url.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "url must not be empty"));
    }
    if !is_http_url(url) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("Unsupported URL: {}", url),
        ));
    }

    let downloads = &state.config().downloads;
    let format = body.format.as_deref().unwrap_or(&downloads.format);
    let quality = body.quality.as_deref().unwrap_or(&downloads.quality);

    let manager = state.manager();
    let events = state.events();
    let handle: JobHandle = match body.mode.unwrap_or_default() {
        JobMode::Auto => manager.start_auto(url, format, quality, events).await,
        JobMode::Single => manager.start_single(url, format, quality, events).await,
        JobMode::Batch => manager.start_batch(url, format, quality, events).await,
    };

    info!(job_id = %handle.id, kind = %handle.kind, url, format, quality, "job accepted");

    Ok((StatusCode::ACCEPTED, Json(state.board().track(&handle))))
}

/// List known jobs, running and recently finished
pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListJobsParams>,
) -> Json<ListJobsResponse> {
    let mut jobs = state.board().list();
    if params.active.unwrap_or(false) {
        jobs.retain(|job| job.active);
    }

    Json(ListJobsResponse {
        total: jobs.len(),
        jobs,
    })
}

/// Get a job by ID
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobRecord>, JobApiError> {
    let job_id = parse_job_id(&id)?;

    if let Some(record) = state.board().get(job_id) {
        return Ok(Json(record));
    }
    match state.manager().get(job_id).await {
        Some(handle) => Ok(Json(state.board().track(&handle))),
        None => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Job not found: {}", job_id),
        )),
    }
}

/// Request cancellation of one job (DELETE endpoint)
pub async fn cancel_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<CancelJobResponse>), JobApiError> {
    let job_id = parse_job_id(&id)?;

    if !state.manager().cancel(job_id).await {
        return Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Job not running: {}", job_id),
        ));
    }
    state.board().mark_cancel_requested(job_id);
    info!(job_id = %job_id, "cancellation requested");

    Ok((
        StatusCode::ACCEPTED,
        Json(CancelJobResponse {
            id: job_id,
            cancel_requested: true,
        }),
    ))
}

/// Request cancellation of every running job
pub async fn cancel_all_jobs(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<CancelAllResponse>) {
    let running = state.manager().active_jobs().await;
    let cancelled = state.manager().cancel_all().await;
    for handle in &running {
        state.board().mark_cancel_requested(handle.id);
    }
    info!(cancelled, "cancellation requested for all jobs");

    (StatusCode::ACCEPTED, Json(CancelAllResponse { cancelled }))
}
