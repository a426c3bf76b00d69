// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tj-hub: the SSE event fan-out — a per-job hub and a global
//! dashboard hub, both built on the same bounded, drop-policy subscriber
//! channel.

pub mod channel;
pub mod global_hub;
pub mod job_hub;

pub use channel::{HubEvent, SubscriberChannel, DEFAULT_CAPACITY};
pub use global_hub::{GlobalHub, GlobalSubscriber};
pub use job_hub::{initial_state_event, signal_event, JobHub, JobSubscriber};
