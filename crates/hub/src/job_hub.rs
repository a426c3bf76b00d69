// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! Per-job SSE fan-out.

use crate::channel::{HubEvent, SubscriberChannel, DEFAULT_CAPACITY};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tj_core::{Job, JobEvent, JobStatus};

impl HubEvent for JobEvent {
    fn is_signal(&self) -> bool {
        JobEvent::is_signal(self)
    }

    fn ping() -> Self {
        JobEvent::Ping
    }
}

/// A live per-job subscription handle, returned to the SSE route handler.
pub type JobSubscriber = Arc<SubscriberChannel<JobEvent>>;

/// Fans out [`JobEvent`]s to every subscriber of a given job. Subscribers
/// for a job are created lazily on first `subscribe` and dropped once every
/// handle to them is gone (the `Weak` upgrade in [`Self::prune`]).
pub struct JobHub {
    channels: RwLock<HashMap<tj_core::JobId, Vec<std::sync::Weak<SubscriberChannel<JobEvent>>>>>,
    capacity: usize,
}

impl Default for JobHub {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl JobHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a hub whose per-subscriber buffer holds `capacity` events
    /// before the drop policy kicks in (`sse_subscriber_buffer`).
    pub fn with_capacity(capacity: usize) -> Self {
        Self { channels: RwLock::new(HashMap::new()), capacity }
    }

    /// Subscribe to `job_id`'s stream. The caller should immediately send
    /// an `initial_state` frame built from the current `Job` snapshot —
    /// that snapshot is supplied by the Registry, not the Hub, since the
    /// Hub has no knowledge of Job state (the Registry owns that).
    pub fn subscribe(&self, job_id: tj_core::JobId) -> JobSubscriber {
        let channel = SubscriberChannel::new(self.capacity);
        self.channels.write().entry(job_id).or_default().push(Arc::downgrade(&channel));
        channel
    }

    /// Publish `event` to every live subscriber of `job_id`. Non-blocking:
    /// each subscriber's own bounded buffer absorbs backpressure.
    pub fn publish(&self, job_id: tj_core::JobId, event: JobEvent) {
        let subscribers = self.channels.read().get(&job_id).cloned().unwrap_or_default();
        for weak in subscribers {
            if let Some(channel) = weak.upgrade() {
                channel.publish(event.clone());
            }
        }
    }

    /// Send a heartbeat `ping` to every job's subscribers. Called on a
    /// fixed interval by `tj-server`'s startup wiring, every 15s.
    pub fn heartbeat_tick(&self) {
        let channels = self.channels.read();
        for weaks in channels.values() {
            for weak in weaks {
                if let Some(channel) = weak.upgrade() {
                    channel.publish(JobEvent::Ping);
                }
            }
        }
    }

    /// Drop dead `Weak` entries; call periodically to bound memory growth.
    pub fn prune(&self) {
        let mut channels = self.channels.write();
        channels.retain(|_, weaks| {
            weaks.retain(|w| w.strong_count() > 0);
            !weaks.is_empty()
        });
    }

    pub fn subscriber_count(&self, job_id: tj_core::JobId) -> usize {
        self.channels.read().get(&job_id).map(|v| v.iter().filter(|w| w.strong_count() > 0).count()).unwrap_or(0)
    }
}

/// Build the `initial_state` frame for a freshly connected per-job
/// subscriber.
pub fn initial_state_event(job: &Job) -> JobEvent {
    JobEvent::InitialState { id: job.id, status: job.status, phase: job.phase, percent: job.percent, message: job.message.clone() }
}

/// Build the terminal `signal` frame for a job's lifecycle transition.
pub fn signal_event(status: JobStatus, message: impl Into<String>) -> JobEvent {
    JobEvent::Signal { status, message: message.into() }
}

#[cfg(test)]
#[path = "job_hub_tests.rs"]
mod tests;
