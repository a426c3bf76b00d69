// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! Per-job and global SSE streams. Each subscriber's bounded
//! channel is converted into an axum SSE body; a transport write failure
//! is reported back to the channel so two consecutive failures close it.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::{self, Stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use tj_adapters::{AlignAdapter, AsrAdapter, MediaAdapter, SeparationAdapter, VadAdapter};
use tj_core::{Clock, JobId};
use tj_hub::{initial_state_event, HubEvent, JobSubscriber, SubscriberChannel};

fn to_sse_event<E: serde::Serialize>(event: &E) -> Event {
    // `serde_json::to_string` only fails on non-string map keys or NaN/inf
    // floats, neither of which our event payloads contain.
    Event::default().data(serde_json::to_string(event).unwrap_or_default())
}

/// `initial_state` first, then every subsequent event the subscriber's
/// bounded channel yields, in publication order.
fn event_stream<E: HubEvent + serde::Serialize>(initial: E, subscriber: Arc<SubscriberChannel<E>>) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::once(async move { initial })
        .chain(stream::unfold(subscriber, |sub| async move { sub.recv().await.map(|event| (event, sub)) }))
        .map(|event| Ok(to_sse_event(&event)))
}

/// Per-job event stream. Sends `initial_state` first, built from the
/// current Registry snapshot, then forwards every subsequent event in
/// publication order.
pub async fn stream_job<M, V, R, L, P, C>(
    State(state): State<AppState<M, V, R, L, P, C>>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError>
where
    M: MediaAdapter,
    V: VadAdapter,
    R: AsrAdapter,
    L: AlignAdapter,
    P: SeparationAdapter,
    C: Clock,
{
    let id = JobId::from_string(id);
    let job = state.registry.get(id).ok_or(tj_supervisor::SupervisorError::JobNotFound(id))?;
    let subscriber: JobSubscriber = state.job_hub.subscribe(id);
    let initial = initial_state_event(&job);

    Ok(Sse::new(event_stream(initial, subscriber)).keep_alive(KeepAlive::new().interval(state.config.sse_heartbeat)))
}

/// Global dashboard stream: `initial_state` built from every known job,
/// then queue/status/progress events as they're published.
pub async fn stream_global<M, V, R, L, P, C>(
    State(state): State<AppState<M, V, R, L, P, C>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    M: MediaAdapter,
    V: VadAdapter,
    R: AsrAdapter,
    L: AlignAdapter,
    P: SeparationAdapter,
    C: Clock,
{
    let jobs = state.registry.list();
    let summaries: Vec<tj_core::JobSummary> = jobs
        .into_iter()
        .map(|j| tj_core::JobSummary { id: j.id, title: j.title, status: j.status, percent: j.percent })
        .collect();
    let initial = tj_core::GlobalEvent::InitialState { jobs: summaries };
    let subscriber = state.global_hub.subscribe();

    Sse::new(event_stream(initial, subscriber)).keep_alive(KeepAlive::new().interval(state.config.sse_heartbeat))
}

#[cfg(test)]
#[path = "sse_tests.rs"]
mod tests;
