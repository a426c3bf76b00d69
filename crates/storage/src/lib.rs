// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tj-storage: the Artifact Store — on-disk layout, atomic writes,
//! the job index, and the startup integrity sweep.

pub mod atomic;
pub mod store;

pub use atomic::{rotate_bak_path, write_atomic, write_atomic_with_backup};
pub use store::{ArtifactStore, ArtifactStoreError, IntegritySweepReport};
