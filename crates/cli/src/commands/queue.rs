// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! `tj queue`: thin HTTP client for `/api/queue-status`, the fleet-wide
//! counterpart to `tj status`.

use crate::exit_error::ExitError;
use crate::output::{format_or_json, OutputFormat};
use tj_server::routes::jobs::QueueStatusResponse;

pub async fn run(base_url: &str, format: OutputFormat) -> Result<(), ExitError> {
    let url = format!("{}/api/queue-status", base_url.trim_end_matches('/'));
    let response = reqwest::get(&url).await.map_err(|err| ExitError::internal(err.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(ExitError::internal(format!("server returned {status}: {body}")));
    }

    let queue: QueueStatusResponse = response.json().await.map_err(|err| ExitError::internal(err.to_string()))?;
    format_or_json(format, &queue, || {
        match queue.running {
            Some(id) => println!("running: {id}"),
            None => println!("running: -"),
        }
        println!("queued:  {}", queue.queue.len());
        for id in &queue.queue {
            println!("  {id}");
        }
        if !queue.interrupted.is_empty() {
            println!("interrupted:");
            for id in &queue.interrupted {
                println!("  {id}");
            }
        }
    })
    .map_err(ExitError::from)
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
