// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! Global dashboard SSE fan-out: a single shared stream, as opposed to
//! [`crate::job_hub::JobHub`]'s one-channel-per-job.

use crate::channel::{HubEvent, SubscriberChannel, DEFAULT_CAPACITY};
use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use tj_core::GlobalEvent;

impl HubEvent for GlobalEvent {
    fn is_signal(&self) -> bool {
        GlobalEvent::is_signal(self)
    }

    fn ping() -> Self {
        GlobalEvent::Ping
    }
}

pub type GlobalSubscriber = Arc<SubscriberChannel<GlobalEvent>>;

pub struct GlobalHub {
    subscribers: RwLock<Vec<Weak<SubscriberChannel<GlobalEvent>>>>,
    capacity: usize,
}

impl Default for GlobalHub {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl GlobalHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a hub whose per-subscriber buffer holds `capacity` events
    /// before the drop policy kicks in (`sse_subscriber_buffer`).
    pub fn with_capacity(capacity: usize) -> Self {
        Self { subscribers: RwLock::new(Vec::new()), capacity }
    }

    pub fn subscribe(&self) -> GlobalSubscriber {
        let channel = SubscriberChannel::new(self.capacity);
        self.subscribers.write().push(Arc::downgrade(&channel));
        channel
    }

    pub fn publish(&self, event: GlobalEvent) {
        let subscribers = self.subscribers.read().clone();
        for weak in subscribers {
            if let Some(channel) = weak.upgrade() {
                channel.publish(event.clone());
            }
        }
    }

    pub fn heartbeat_tick(&self) {
        self.publish(GlobalEvent::Ping);
    }

    pub fn prune(&self) {
        self.subscribers.write().retain(|w| w.strong_count() > 0);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().iter().filter(|w| w.strong_count() > 0).count()
    }
}

#[cfg(test)]
#[path = "global_hub_tests.rs"]
mod tests;
