// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tj-adapters: trait-based boundaries between the Phase Executor and the
//! external tools/models each phase calls out to, each with a production
//! `tokio::process::Command`-based implementation and a `Fake*` test double
//! gated behind `test-support`.

pub mod align;
pub mod asr;
pub mod media;
pub mod separation;
pub mod vad;

pub use align::{AlignAdapter, AlignError, ProcessAlignAdapter};
pub use asr::{AsrAdapter, AsrError, AsrResult, ProcessAsrAdapter};
pub use media::{ExtractOutput, FfmpegMediaAdapter, MediaAdapter, MediaError};
pub use separation::{ProcessSeparationAdapter, RmsLevels, SeparationAdapter, SeparationError};
pub use vad::{ProcessVadAdapter, VadAdapter, VadError, VadSpan};

#[cfg(any(test, feature = "test-support"))]
pub use align::FakeAlignAdapter;
#[cfg(any(test, feature = "test-support"))]
pub use asr::{FakeAsrAdapter, FakeTranscribeCall};
#[cfg(any(test, feature = "test-support"))]
pub use media::{FakeExtractCall, FakeMediaAdapter};
#[cfg(any(test, feature = "test-support"))]
pub use separation::{FakeSeparateCall, FakeSeparationAdapter};
#[cfg(any(test, feature = "test-support"))]
pub use vad::FakeVadAdapter;
