// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! The bounded per-subscriber event buffer.
//!
//! `tokio::sync::mpsc` doesn't support removing an item from the middle of
//! its queue, which the drop policy requires ("drop the oldest *non-signal*
//! event first"), so subscribers here hold a `VecDeque` behind a
//! `parking_lot::Mutex` plus a `Notify` instead.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Default bound on a subscriber's buffer.
pub const DEFAULT_CAPACITY: usize = 256;

/// Events routed through a Hub must be able to identify themselves as
/// `signal`-class (never dropped) and manufacture their own heartbeat.
pub trait HubEvent: Clone + Send + Sync + 'static {
    fn is_signal(&self) -> bool;
    fn ping() -> Self;
}

struct Buffer<E> {
    events: VecDeque<E>,
    closed: bool,
}

/// One subscriber's bounded, droppable event queue.
pub struct SubscriberChannel<E> {
    buffer: Mutex<Buffer<E>>,
    notify: Notify,
    capacity: usize,
    consecutive_write_failures: AtomicBool,
}

impl<E: HubEvent> SubscriberChannel<E> {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            buffer: Mutex::new(Buffer { events: VecDeque::with_capacity(capacity.min(64)), closed: false }),
            notify: Notify::new(),
            capacity,
            consecutive_write_failures: AtomicBool::new(false),
        })
    }

    /// Enqueue `event`. Applies the drop policy when at capacity: the
    /// oldest non-signal event is evicted first; if every buffered event is
    /// a signal (so there's nothing evictable), the subscriber is
    /// disconnected instead of growing unboundedly.
    pub fn publish(&self, event: E) {
        let mut buffer = self.buffer.lock();
        if buffer.closed {
            return;
        }
        if buffer.events.len() >= self.capacity {
            match buffer.events.iter().position(|e| !e.is_signal()) {
                Some(idx) => {
                    buffer.events.remove(idx);
                }
                None => {
                    buffer.closed = true;
                    drop(buffer);
                    self.notify.notify_waiters();
                    return;
                }
            }
        }
        buffer.events.push_back(event);
        drop(buffer);
        self.notify.notify_waiters();
    }

    /// Await the next event, or `None` once the subscriber has been closed
    /// (either by the drop policy or by [`Self::close`]).
    pub async fn recv(&self) -> Option<E> {
        loop {
            {
                let mut buffer = self.buffer.lock();
                if let Some(event) = buffer.events.pop_front() {
                    return Some(event);
                }
                if buffer.closed {
                    return None;
                }
            }
            self.notify.notified().await;
        }
    }

    pub fn close(&self) {
        let mut buffer = self.buffer.lock();
        buffer.closed = true;
        drop(buffer);
        self.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.buffer.lock().closed
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record the outcome of a transport-level write attempt. A
    /// connection that fails two consecutive writes is closed; the actual
    /// write happens in `tj-server`'s SSE response body, which reports
    /// outcomes back here.
    pub fn record_write_outcome(&self, ok: bool) {
        if ok {
            self.consecutive_write_failures.store(false, Ordering::Relaxed);
            return;
        }
        let already_failed = self.consecutive_write_failures.swap(true, Ordering::Relaxed);
        if already_failed {
            self.close();
        }
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
