//! Torrent descriptor upload endpoint.

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use sortarr_core::{JobResponse, JobStatus, QueuedJob};
use sortarr_core::queue::{FAILED_MESSAGE, REJECTED_MESSAGE};

use super::ErrorResponse;
use crate::metrics::{UPLOADS_RECEIVED, UPLOADS_REJECTED};
use crate::state::AppState;

/// Multipart field carrying the descriptor files.
pub const UPLOAD_FIELD: &str = "torrents";

pub const QUEUED_MESSAGE: &str = "All torrents have been added to the processing queue!";
pub const NO_FILES_MESSAGE: &str = "No files were uploaded.";
pub const PROCESSED_MESSAGE: &str = "All torrents have been processed!";

#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    /// Hold the request open until every job of this upload settles.
    #[serde(default)]
    pub wait: bool,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub queued: usize,
    pub jobs: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<JobResponse>,
}

/// A descriptor written to the staging directory.
struct StagedFile {
    name: String,
    path: PathBuf,
}

/// Reduces a client supplied file name to a bare base name.
///
/// Both separator styles are stripped since browsers on Windows may send
/// the full local path.
pub fn sanitize_file_name(raw: &str) -> Option<String> {
    let base = raw.rsplit(['/', '\\']).next()?.trim();
    if base.is_empty() || base == "." || base == ".." {
        return None;
    }
    Some(base.to_string())
}

fn error_response(status: StatusCode, reason: &str, message: impl Into<String>) -> Response {
    UPLOADS_REJECTED.with_label_values(&[reason]).inc();
    (status, Json(ErrorResponse::new(message))).into_response()
}

async fn stage_file(dir: &Path, name: &str, data: &[u8]) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(name);
    tokio::fs::write(&path, data).await?;
    Ok(path)
}

/// Removes descriptors staged by a request that is being refused.
async fn discard_staged(staged: &[StagedFile]) {
    for file in staged {
        match tokio::fs::remove_file(&file.path).await {
            Ok(()) => debug!(path = %file.path.display(), "Removed staged upload"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %file.path.display(), error = %e, "Failed to remove staged upload"),
        }
    }
}

/// POST /upload
///
/// Stages each uploaded descriptor and enqueues one job per file.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Response {
    let upload_dir = state.config().uploads.dir.clone();
    let mut staged = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Malformed upload request");
                discard_staged(&staged).await;
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "malformed",
                    format!("Malformed upload: {}", e),
                );
            }
        };

        if field.name() != Some(UPLOAD_FIELD) {
            debug!(field = ?field.name(), "Ignoring unexpected form field");
            continue;
        }

        let Some(name) = field.file_name().and_then(sanitize_file_name) else {
            discard_staged(&staged).await;
            return error_response(
                StatusCode::BAD_REQUEST,
                "malformed",
                "Uploaded file has no usable name",
            );
        };

        let data = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                discard_staged(&staged).await;
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "malformed",
                    format!("Failed to read file: {}", e),
                )
            }
        };

        match stage_file(&upload_dir, &name, &data).await {
            Ok(path) => {
                debug!(name = %name, path = %path.display(), bytes = data.len(), "Staged upload");
                staged.push(StagedFile { name, path });
            }
            Err(e) => {
                warn!(name = %name, error = %e, "Failed to stage upload");
                discard_staged(&staged).await;
                return error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "staging",
                    format!("Failed to store {}: {}", name, e),
                );
            }
        }
    }

    let notifier = state.notifier();

    if staged.is_empty() {
        notifier.notify(NO_FILES_MESSAGE);
        return error_response(StatusCode::BAD_REQUEST, "no_files", NO_FILES_MESSAGE);
    }

    notifier.notify(format!("Received {} torrent files.", staged.len()));
    UPLOADS_RECEIVED.inc_by(staged.len() as u64);

    let mut jobs = Vec::with_capacity(staged.len());
    let mut receivers = Vec::with_capacity(staged.len());
    for file in staged {
        let (job, rx) = QueuedJob::new(&file.path);
        let job_id = job.id.clone();
        notifier.notify(format!(
            "Added file to queue: {} ({})",
            file.name,
            file.path.display()
        ));
        let position = state.queue().enqueue(job);
        debug!(job_id = %job_id, position, "Job enqueued");
        jobs.push(job_id);
        receivers.push(rx);
    }

    info!(queued = jobs.len(), wait = query.wait, "Upload accepted");

    if !query.wait {
        return (
            StatusCode::ACCEPTED,
            Json(UploadResponse {
                message: QUEUED_MESSAGE.to_string(),
                queued: jobs.len(),
                jobs,
                results: Vec::new(),
            }),
        )
            .into_response();
    }

    let results: Vec<JobResponse> = join_all(receivers)
        .await
        .into_iter()
        .zip(&jobs)
        .map(|(result, job_id)| result.unwrap_or_else(|_| JobResponse::failed(job_id.as_str())))
        .collect();

    let (status, message) = combined_outcome(&results);
    (
        status,
        Json(UploadResponse {
            message: message.to_string(),
            queued: jobs.len(),
            jobs,
            results,
        }),
    )
        .into_response()
}

/// Rejections outrank failures, which outrank success.
fn combined_outcome(results: &[JobResponse]) -> (StatusCode, &'static str) {
    if results.iter().any(|r| r.status == JobStatus::Rejected) {
        (StatusCode::BAD_REQUEST, REJECTED_MESSAGE)
    } else if results.iter().any(|r| r.status == JobStatus::Failed) {
        (StatusCode::INTERNAL_SERVER_ERROR, FAILED_MESSAGE)
    } else {
        (StatusCode::OK, PROCESSED_MESSAGE)
    }
}
