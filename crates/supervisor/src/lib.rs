// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tj-supervisor: the Job Registry and the Queue & Supervisor — the
//! in-memory job cache, the single-runner FIFO that drives jobs through
//! `tj-engine`'s `Executor`, and the admission/reorder/prioritize/
//! pause/resume/cancel surface `tj-server` calls into.

pub mod error;
pub mod queue;
pub mod registry;

pub use error::SupervisorError;
pub use queue::{PrioritizeMode, Supervisor};
pub use registry::JobRegistry;
