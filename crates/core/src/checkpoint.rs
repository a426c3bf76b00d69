// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! Persisted per-job progress: the structures written to `checkpoint.json`
//! that make the pipeline resumable across process restarts.

use crate::phase::Phase;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One VAD-delimited span of audio, transcribed as a unit. Segments never
/// overlap and are ordered by `index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub index: u32,
    pub start_sec: f64,
    pub end_sec: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub words: Vec<Word>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_logprob: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_speech_prob: Option<f32>,
    /// Set when the circuit breaker marked this segment with `on_break =
    /// continue`; the SRT serializer appends the `[?]` suffix for these.
    #[serde(default)]
    pub low_confidence_marker: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub start_sec: f64,
    pub end_sec: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BgmLevel {
    None,
    Light,
    Heavy,
}

/// Demucs-related progress, nested inside the checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemucsState {
    pub bgm_level: BgmLevel,
    /// The three sampled ratios from bgm_detect, in sample order.
    pub bgm_ratios: Vec<f32>,
    pub global_separation_done: bool,
    pub vocals_path: Option<String>,
    pub current_model: Option<String>,
    pub escalation_count: u32,
    pub retry_triggered: bool,
}

impl Default for DemucsState {
    fn default() -> Self {
        Self {
            bgm_level: BgmLevel::None,
            bgm_ratios: Vec::new(),
            global_separation_done: false,
            vocals_path: None,
            current_model: None,
            escalation_count: 0,
            retry_triggered: false,
        }
    }
}

/// Circuit-breaker counters, persisted so a resumed job keeps its history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerState {
    pub consecutive_retries: u32,
    pub total_retries: u32,
    pub processed_segments: u32,
    pub escalation_count: u32,
    pub using_separated_vocals: bool,
}

impl Default for CircuitBreakerState {
    fn default() -> Self {
        Self {
            consecutive_retries: 0,
            total_retries: 0,
            processed_segments: 0,
            escalation_count: 0,
            using_separated_vocals: false,
        }
    }
}

/// The full resumable state for one job, written atomically to
/// `checkpoint.json` at every phase boundary and after every processed
/// `transcribe` segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub phase: Phase,
    /// Total source duration, discovered during `extract`. `0.0` until then.
    #[serde(default)]
    pub duration_sec: f64,
    pub total_segments: u32,
    /// Strictly sorted, deduplicated by construction (`BTreeSet`).
    pub processed_indices: BTreeSet<u32>,
    pub segments: Vec<Segment>,
    pub demucs_state: DemucsState,
    pub circuit_breaker_state: CircuitBreakerState,
    pub updated_at_epoch_ms: u64,
}

impl Checkpoint {
    pub fn fresh(now_epoch_ms: u64) -> Self {
        Self {
            phase: Phase::Pending,
            duration_sec: 0.0,
            total_segments: 0,
            processed_indices: BTreeSet::new(),
            segments: Vec::new(),
            demucs_state: DemucsState::default(),
            circuit_breaker_state: CircuitBreakerState::default(),
            updated_at_epoch_ms: now_epoch_ms,
        }
    }

    /// Invariant check used by tests and by the Executor before trusting a
    /// loaded checkpoint: processed indices must be a subset of
    /// `[0, total_segments)` and segments must be ordered, non-overlapping.
    pub fn is_consistent(&self) -> bool {
        if self.processed_indices.iter().any(|i| *i >= self.total_segments) {
            return false;
        }
        self.segments.windows(2).all(|w| w[0].end_sec <= w[1].start_sec)
            && self.segments.iter().all(|s| s.start_sec >= 0.0 && s.start_sec < s.end_sec)
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
