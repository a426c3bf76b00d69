// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! Maps every internal error type this crate touches onto an HTTP status
//! and a small JSON body, the one place request handlers convert `Result`s
//! into responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Supervisor(#[from] tj_supervisor::SupervisorError),

    #[error(transparent)]
    Storage(#[from] tj_storage::ArtifactStoreError),

    #[error(transparent)]
    Settings(#[from] tj_core::SettingsError),

    #[error(transparent)]
    Srt(#[from] tj_core::SrtError),

    #[error(transparent)]
    Media(#[from] tj_adapters::MediaError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Supervisor(tj_supervisor::SupervisorError::JobNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Supervisor(
                tj_supervisor::SupervisorError::NotQueued(_) | tj_supervisor::SupervisorError::NotRunning(_),
            ) => StatusCode::CONFLICT,
            ApiError::Supervisor(tj_supervisor::SupervisorError::InvalidQueueOrder) => StatusCode::BAD_REQUEST,
            ApiError::Supervisor(tj_supervisor::SupervisorError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Storage(tj_storage::ArtifactStoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Settings(_) | ApiError::Srt(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Media(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
