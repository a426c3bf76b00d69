// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! Job admission and control routes: upload/create-job, start,
//! cancel/pause/resume/prioritize/reorder, and the status/sync endpoints.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use tj_adapters::{AlignAdapter, AsrAdapter, MediaAdapter, SeparationAdapter, VadAdapter};
use tj_core::{Clock, Job, JobId, JobStatus};
use tj_supervisor::PrioritizeMode;

#[derive(Serialize)]
pub struct UploadResponse {
    pub job_id: JobId,
    pub filename: String,
}

/// Save the uploaded file to `input/`, persist a new job in `created`
/// status. Admission happens in a separate `/api/start` call.
pub async fn upload<M, V, R, L, P, C>(
    State(state): State<AppState<M, V, R, L, P, C>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError>
where
    M: MediaAdapter + Clone,
    V: VadAdapter,
    R: AsrAdapter,
    L: AlignAdapter,
    P: SeparationAdapter,
    C: Clock,
{
    let mut filename = None;
    let mut bytes = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| ApiError::BadRequest(e.to_string()))? {
        if field.name() == Some("file") {
            filename = field.file_name().map(|s| s.to_string());
            bytes = Some(field.bytes().await.map_err(|e| ApiError::BadRequest(e.to_string()))?);
        }
    }
    let filename = filename.ok_or_else(|| ApiError::BadRequest("missing file field".into()))?;
    let bytes = bytes.ok_or_else(|| ApiError::BadRequest("missing file field".into()))?;

    let input_path = state.store.input_dir().join(&filename);
    if let Some(parent) = input_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::File::create(&input_path)?;
    file.write_all(&bytes)?;

    let now = state.now_epoch_ms();
    let job = Job::new(JobId::new(), filename.clone(), now);
    let id = job.id;
    state.registry.insert_new(job)?;
    state.store.register_input(id, input_path)?;

    Ok(Json(UploadResponse { job_id: id, filename }))
}

#[derive(Deserialize)]
pub struct CreateJobRequest {
    pub filename: String,
}

/// Create a job for a file already present in `input/` (no upload).
pub async fn create_job<M, V, R, L, P, C>(
    State(state): State<AppState<M, V, R, L, P, C>>,
    Json(req): Json<CreateJobRequest>,
) -> Result<Json<UploadResponse>, ApiError>
where
    M: MediaAdapter + Clone,
    V: VadAdapter,
    R: AsrAdapter,
    L: AlignAdapter,
    P: SeparationAdapter,
    C: Clock,
{
    let input_path = state.store.input_dir().join(&req.filename);
    if !input_path.exists() {
        return Err(ApiError::BadRequest(format!("no such input file: {}", req.filename)));
    }
    let now = state.now_epoch_ms();
    let job = Job::new(JobId::new(), req.filename.clone(), now);
    let id = job.id;
    state.registry.insert_new(job)?;
    state.store.register_input(id, input_path)?;
    Ok(Json(UploadResponse { job_id: id, filename: req.filename }))
}

#[derive(Deserialize)]
pub struct StartRequest {
    pub job_id: JobId,
    #[serde(default)]
    pub settings: serde_json::Value,
}

/// Freeze settings onto an already-persisted job and enqueue it.
pub async fn start<M, V, R, L, P, C>(
    State(state): State<AppState<M, V, R, L, P, C>>,
    Json(req): Json<StartRequest>,
) -> Result<Json<Job>, ApiError>
where
    M: MediaAdapter,
    V: VadAdapter,
    R: AsrAdapter,
    L: AlignAdapter,
    P: SeparationAdapter,
    C: Clock,
{
    let settings = tj_core::parse_settings(&req.settings)?;
    let job = state.supervisor.start(req.job_id, settings)?;
    Ok(Json(job))
}

#[derive(Deserialize)]
pub struct DeleteDataQuery {
    #[serde(default)]
    pub delete_data: bool,
}

pub async fn cancel<M, V, R, L, P, C>(
    State(state): State<AppState<M, V, R, L, P, C>>,
    Path(id): Path<String>,
    Query(q): Query<DeleteDataQuery>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    M: MediaAdapter,
    V: VadAdapter,
    R: AsrAdapter,
    L: AlignAdapter,
    P: SeparationAdapter,
    C: Clock,
{
    state.supervisor.cancel(JobId::from_string(id), q.delete_data)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

pub async fn pause<M, V, R, L, P, C>(
    State(state): State<AppState<M, V, R, L, P, C>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    M: MediaAdapter,
    V: VadAdapter,
    R: AsrAdapter,
    L: AlignAdapter,
    P: SeparationAdapter,
    C: Clock,
{
    state.supervisor.pause(JobId::from_string(id))?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

pub async fn resume<M, V, R, L, P, C>(
    State(state): State<AppState<M, V, R, L, P, C>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    M: MediaAdapter,
    V: VadAdapter,
    R: AsrAdapter,
    L: AlignAdapter,
    P: SeparationAdapter,
    C: Clock,
{
    state.supervisor.resume(JobId::from_string(id))?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

#[derive(Deserialize)]
pub struct PrioritizeQuery {
    #[serde(default = "default_mode")]
    pub mode: String,
}

fn default_mode() -> String {
    "gentle".to_string()
}

pub async fn prioritize<M, V, R, L, P, C>(
    State(state): State<AppState<M, V, R, L, P, C>>,
    Path(id): Path<String>,
    Query(q): Query<PrioritizeQuery>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    M: MediaAdapter,
    V: VadAdapter,
    R: AsrAdapter,
    L: AlignAdapter,
    P: SeparationAdapter,
    C: Clock,
{
    let mode = match q.mode.as_str() {
        "force" => PrioritizeMode::Force,
        _ => PrioritizeMode::Gentle,
    };
    state.supervisor.prioritize(JobId::from_string(id), mode)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

#[derive(Deserialize)]
pub struct ReorderRequest {
    pub job_ids: Vec<JobId>,
}

pub async fn reorder_queue<M, V, R, L, P, C>(
    State(state): State<AppState<M, V, R, L, P, C>>,
    Json(req): Json<ReorderRequest>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    M: MediaAdapter,
    V: VadAdapter,
    R: AsrAdapter,
    L: AlignAdapter,
    P: SeparationAdapter,
    C: Clock,
{
    state.supervisor.reorder(req.job_ids)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

pub async fn status<M, V, R, L, P, C>(
    State(state): State<AppState<M, V, R, L, P, C>>,
    Path(id): Path<String>,
) -> Result<Json<Job>, ApiError>
where
    M: MediaAdapter,
    V: VadAdapter,
    R: AsrAdapter,
    L: AlignAdapter,
    P: SeparationAdapter,
    C: Clock,
{
    let id = JobId::from_string(id);
    let job = state.registry.get(id).ok_or(tj_supervisor::SupervisorError::JobNotFound(id))?;
    Ok(Json(job))
}

#[derive(Serialize, Deserialize)]
pub struct QueueStatusResponse {
    pub queue: Vec<JobId>,
    pub running: Option<JobId>,
    pub interrupted: Vec<JobId>,
    pub jobs: HashMap<JobId, Job>,
}

pub async fn queue_status<M, V, R, L, P, C>(
    State(state): State<AppState<M, V, R, L, P, C>>,
) -> Json<QueueStatusResponse>
where
    M: MediaAdapter,
    V: VadAdapter,
    R: AsrAdapter,
    L: AlignAdapter,
    P: SeparationAdapter,
    C: Clock,
{
    let jobs = state.registry.list();
    let interrupted = jobs.iter().filter(|j| j.status == JobStatus::Interrupted).map(|j| j.id).collect();
    Json(QueueStatusResponse {
        queue: state.supervisor.queued_ids(),
        running: state.supervisor.running_id(),
        interrupted,
        jobs: jobs.into_iter().map(|j| (j.id, j)).collect(),
    })
}

/// Authoritative list of every known job, for clients to repair stale
/// local state.
pub async fn sync_tasks<M, V, R, L, P, C>(State(state): State<AppState<M, V, R, L, P, C>>) -> Json<Vec<Job>>
where
    M: MediaAdapter,
    V: VadAdapter,
    R: AsrAdapter,
    L: AlignAdapter,
    P: SeparationAdapter,
    C: Clock,
{
    Json(state.registry.list())
}

/// Copy the finished SRT next to the job's original source file.
pub async fn copy_result<M, V, R, L, P, C>(
    State(state): State<AppState<M, V, R, L, P, C>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    M: MediaAdapter,
    V: VadAdapter,
    R: AsrAdapter,
    L: AlignAdapter,
    P: SeparationAdapter,
    C: Clock,
{
    let id = JobId::from_string(id);
    let job = state.registry.get(id).ok_or(tj_supervisor::SupervisorError::JobNotFound(id))?;
    let paths = tj_core::JobPaths::new(state.store.root(), id, &job.filename);
    let dest = paths.input_path.with_extension("srt");
    std::fs::copy(paths.subtitles_srt(), &dest)?;
    Ok(Json(serde_json::json!({ "copied_to": dest })))
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
