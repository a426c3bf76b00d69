// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

use super::*;

#[derive(Debug, Clone, PartialEq)]
enum TestEvent {
    Data(u32),
    Signal(u32),
    Ping,
}

impl HubEvent for TestEvent {
    fn is_signal(&self) -> bool {
        matches!(self, TestEvent::Signal(_))
    }

    fn ping() -> Self {
        TestEvent::Ping
    }
}

#[tokio::test]
async fn events_are_delivered_in_publication_order() {
    let channel = SubscriberChannel::<TestEvent>::new(10);
    channel.publish(TestEvent::Data(1));
    channel.publish(TestEvent::Data(2));
    channel.publish(TestEvent::Data(3));

    assert_eq!(channel.recv().await, Some(TestEvent::Data(1)));
    assert_eq!(channel.recv().await, Some(TestEvent::Data(2)));
    assert_eq!(channel.recv().await, Some(TestEvent::Data(3)));
}

#[tokio::test]
async fn overflow_drops_oldest_non_signal_event_first() {
    let channel = SubscriberChannel::<TestEvent>::new(3);
    channel.publish(TestEvent::Data(1));
    channel.publish(TestEvent::Signal(99));
    channel.publish(TestEvent::Data(2));
    // at capacity; publishing again should evict Data(1), the oldest non-signal
    channel.publish(TestEvent::Data(3));

    let mut seen = Vec::new();
    while let Some(e) = channel.recv().await {
        seen.push(e);
        if seen.len() == 3 {
            break;
        }
    }
    assert_eq!(seen, vec![TestEvent::Signal(99), TestEvent::Data(2), TestEvent::Data(3)]);
}

#[tokio::test]
async fn signal_events_are_never_dropped() {
    let channel = SubscriberChannel::<TestEvent>::new(2);
    channel.publish(TestEvent::Signal(1));
    channel.publish(TestEvent::Signal(2));
    // buffer is full of signals only; next publish can't evict anything and
    // must disconnect the subscriber instead of dropping a signal.
    channel.publish(TestEvent::Signal(3));

    assert!(channel.is_closed());
    assert_eq!(channel.recv().await, Some(TestEvent::Signal(1)));
    assert_eq!(channel.recv().await, Some(TestEvent::Signal(2)));
    assert_eq!(channel.recv().await, None);
}

#[tokio::test]
async fn publish_after_close_is_a_no_op() {
    let channel = SubscriberChannel::<TestEvent>::new(4);
    channel.close();
    channel.publish(TestEvent::Data(1));
    assert_eq!(channel.recv().await, None);
}

#[test]
fn single_write_failure_does_not_close_channel() {
    let channel = SubscriberChannel::<TestEvent>::new(4);
    channel.record_write_outcome(false);
    assert!(!channel.is_closed());
}

#[test]
fn two_consecutive_write_failures_close_channel() {
    let channel = SubscriberChannel::<TestEvent>::new(4);
    channel.record_write_outcome(false);
    channel.record_write_outcome(false);
    assert!(channel.is_closed());
}

#[test]
fn a_success_between_failures_resets_the_streak() {
    let channel = SubscriberChannel::<TestEvent>::new(4);
    channel.record_write_outcome(false);
    channel.record_write_outcome(true);
    channel.record_write_outcome(false);
    assert!(!channel.is_closed());
}
