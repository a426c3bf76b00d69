// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tj-engine: the Phase Executor — drives one job through the nine
//! pipeline phases, persisting a resumable checkpoint and publishing
//! progress over its `JobHub`.

pub mod bgm;
pub mod executor;
pub mod interrupt;

pub use bgm::decide_bgm_level;
pub use executor::{Executor, RunOutcome};
pub use interrupt::{Interrupt, InterruptKind};
