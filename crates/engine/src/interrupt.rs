// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! Cooperative interruption flags. The Supervisor sets these from
//! the outside; the Executor polls them at phase boundaries and after every
//! segment. There is no hard-abort of in-flight native calls — polling
//! granularity is acceptable since per-segment latency is seconds, not
//! minutes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Flags {
    pause_requested: AtomicBool,
    cancel_requested: AtomicBool,
}

/// Shared handle between the Supervisor (writer) and the Executor (reader).
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    flags: Arc<Flags>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_pause(&self) {
        self.flags.pause_requested.store(true, Ordering::SeqCst);
    }

    pub fn request_cancel(&self) {
        self.flags.cancel_requested.store(true, Ordering::SeqCst);
    }

    pub fn is_pause_requested(&self) -> bool {
        self.flags.pause_requested.load(Ordering::SeqCst)
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.flags.cancel_requested.load(Ordering::SeqCst)
    }

    /// Reset both flags; called when a job is resumed after pausing so a
    /// stale `pause_requested` doesn't immediately re-pause it.
    pub fn reset(&self) {
        self.flags.pause_requested.store(false, Ordering::SeqCst);
        self.flags.cancel_requested.store(false, Ordering::SeqCst);
    }

    /// The poll point used at every phase boundary and after every segment.
    pub fn check(&self) -> Option<InterruptKind> {
        if self.is_cancel_requested() {
            Some(InterruptKind::Cancel)
        } else if self.is_pause_requested() {
            Some(InterruptKind::Pause)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptKind {
    Pause,
    Cancel,
}

#[cfg(test)]
#[path = "interrupt_tests.rs"]
mod tests;
