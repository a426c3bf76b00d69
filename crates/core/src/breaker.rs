// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! Circuit-breaker decision logic, modeled as a pure function returning an
//! explicit decision enum rather than throwing an exception.

use crate::checkpoint::CircuitBreakerState;
use crate::settings::{CircuitBreakerConfig, OnBreak};
use serde::{Deserialize, Serialize};

/// Per-segment quality signal that feeds the breaker.
#[derive(Debug, Clone, Copy)]
pub struct SegmentQuality {
    pub avg_logprob: f32,
    pub no_speech_prob: f32,
}

impl SegmentQuality {
    pub fn is_low_quality(self, retry_threshold_logprob: f32, retry_threshold_no_speech: f32) -> bool {
        self.avg_logprob < retry_threshold_logprob || self.no_speech_prob > retry_threshold_no_speech
    }
}

/// Outcome of evaluating the breaker after a segment completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakerDecision {
    /// No breach; proceed normally.
    Proceed,
    /// Escalate to the configured fallback model and keep going.
    Escalate,
    /// Breach with no more escalation available; act per `on_break`.
    Break(BreakReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakReason {
    Continue,
    Fallback,
    Fail,
    Pause,
}

impl From<OnBreak> for BreakReason {
    fn from(v: OnBreak) -> Self {
        match v {
            OnBreak::Continue => BreakReason::Continue,
            OnBreak::Fallback => BreakReason::Fallback,
            OnBreak::Fail => BreakReason::Fail,
            OnBreak::Pause => BreakReason::Pause,
        }
    }
}

/// `record_success`: resets the consecutive-retry streak.
pub fn record_success(state: &mut CircuitBreakerState) {
    state.consecutive_retries = 0;
    state.processed_segments += 1;
}

/// `record_retry`: bumps both the consecutive and lifetime retry counters.
pub fn record_retry(state: &mut CircuitBreakerState) {
    state.consecutive_retries += 1;
    state.total_retries += 1;
    state.processed_segments += 1;
}

fn breach(state: &CircuitBreakerState, config: &CircuitBreakerConfig) -> bool {
    let consecutive_breach = state.consecutive_retries >= config.consecutive_threshold;
    let ratio_breach = state.processed_segments >= 5
        && (state.total_retries as f32 / state.processed_segments as f32) >= config.ratio_threshold;
    consecutive_breach || ratio_breach
}

/// Evaluate the breaker after a segment's retry/success has already been
/// recorded via [`record_success`]/[`record_retry`]. Decision priority:
/// escalate first if still available, otherwise act per `on_break`,
/// otherwise proceed.
pub fn evaluate(
    state: &CircuitBreakerState,
    config: &CircuitBreakerConfig,
    on_break: OnBreak,
    max_escalations: u32,
    auto_escalation: bool,
) -> BreakerDecision {
    if !breach(state, config) {
        return BreakerDecision::Proceed;
    }
    if auto_escalation && state.escalation_count < max_escalations {
        return BreakerDecision::Escalate;
    }
    BreakerDecision::Break(on_break.into())
}

#[cfg(test)]
#[path = "breaker_tests.rs"]
mod tests;
