// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! SSE event payloads. Serializes as `{"type": "...", ...fields}`;
//! the Hub wraps these as the `data:` line of an `event: message` frame.

use crate::checkpoint::{BgmLevel, Segment};
use crate::job::{JobId, JobStatus};
use crate::phase::Phase;
use serde::{Deserialize, Serialize};

/// Events delivered on a per-job SSE stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JobEvent {
    /// First frame sent to every new subscriber: a full snapshot so the
    /// client doesn't need a separate status fetch before it can render.
    #[serde(rename = "initial_state")]
    InitialState {
        id: JobId,
        status: JobStatus,
        phase: Phase,
        percent: u32,
        message: String,
    },

    #[serde(rename = "progress")]
    Progress {
        phase: Phase,
        percent: u32,
        phase_percent: u32,
        message: String,
        /// Segments transcribed so far; `0` outside the `transcribe` phase.
        processed: u32,
        /// Total segments for this job; `0` until `split` has run.
        total: u32,
        /// Set once the `transcribe` phase has detected a language.
        language: Option<String>,
    },

    /// One transcribed segment became available (used to stream subtitles
    /// live rather than waiting for the `srt` phase).
    #[serde(rename = "segment")]
    Segment { segment: Segment },

    /// A segment gained alignment (word-level timestamps).
    #[serde(rename = "aligned")]
    Aligned { index: u32, words_count: usize },

    #[serde(rename = "separation_strategy")]
    SeparationStrategy { bgm_level: BgmLevel, using_separated_vocals: bool },

    #[serde(rename = "model_escalated")]
    ModelEscalated { from_model: String, to_model: String, escalation_count: u32 },

    #[serde(rename = "circuit_breaker_handled")]
    CircuitBreakerHandled { reason: String, segment_index: u32 },

    /// Reserved for phases proxying progress from an external tool
    /// (e.g. ffmpeg) whose own percentage doesn't map 1:1 onto ours.
    #[serde(rename = "proxy_progress")]
    ProxyProgress { detail: String, percent: u32 },

    #[serde(rename = "proxy_complete")]
    ProxyComplete { detail: String },

    /// Terminal: job reached Finished/Failed/Canceled.
    #[serde(rename = "signal")]
    Signal { status: JobStatus, message: String },

    /// Heartbeat; keeps idle connections from being reaped by intermediaries.
    #[serde(rename = "ping")]
    Ping,
}

impl JobEvent {
    /// Signal and terminal-adjacent events are never dropped by the Hub's
    /// bounded buffer's drop policy — only this and `Signal` qualify.
    pub fn is_signal(&self) -> bool {
        matches!(self, JobEvent::Signal { .. })
    }
}

/// Events delivered on the global SSE stream (dashboard/queue view).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GlobalEvent {
    #[serde(rename = "initial_state")]
    InitialState { jobs: Vec<JobSummary> },

    #[serde(rename = "queue_update")]
    QueueUpdate { queued_ids: Vec<JobId>, running_id: Option<JobId> },

    #[serde(rename = "job_status")]
    JobStatus { id: JobId, status: JobStatus },

    #[serde(rename = "job_progress")]
    JobProgress { id: JobId, percent: u32 },

    #[serde(rename = "ping")]
    Ping,
}

impl GlobalEvent {
    pub fn is_signal(&self) -> bool {
        matches!(self, GlobalEvent::JobStatus { .. })
    }
}

/// Minimal per-job view used in the global stream's `initial_state` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: JobId,
    pub title: String,
    pub status: JobStatus,
    pub percent: u32,
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
