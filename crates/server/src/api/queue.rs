//! Queue status endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use sortarr_core::queue::{ActiveJob, JobRecord, PendingJob, QueueStatus};

use super::ErrorResponse;
use crate::state::AppState;

pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<QueueStatus> {
    Json(state.queue().status())
}

/// Where a job currently sits.
#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobLookup {
    Active(ActiveJob),
    Pending { position: usize, job: PendingJob },
    Finished(JobRecord),
}

pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobLookup>, (StatusCode, Json<ErrorResponse>)> {
    let status = state.queue().status();

    if let Some(active) = status.active.filter(|a| a.id == id) {
        return Ok(Json(JobLookup::Active(active)));
    }
    if let Some((position, job)) = status
        .pending
        .into_iter()
        .enumerate()
        .find(|(_, p)| p.id == id)
    {
        return Ok(Json(JobLookup::Pending { position, job }));
    }
    if let Some(record) = status.history.into_iter().find(|r| r.id == id) {
        return Ok(Json(JobLookup::Finished(record)));
    }

    Err((
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(format!("Job not found: {}", id))),
    ))
}
