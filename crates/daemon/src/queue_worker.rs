// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background retry loop for builds the dispatcher queued because no agent
//! was available at trigger time. Polls on a fixed interval rather than
//! being woken by agent heartbeats — simple, and the interval is short
//! enough that a newly-registered agent picks up queued work within one
//! tick.

use std::time::Duration;

use chengis_core::{BuildStatus, DispatchMode};

use crate::state::AppState;

/// Default interval between queue drain attempts.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Run forever, draining one queued build per tick. Intended to be
/// `tokio::spawn`ed once at daemon startup.
pub async fn run(state: AppState) {
    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    loop {
        ticker.tick().await;
        poll_once(&state).await;
    }
}

/// One drain attempt, split out so tests can call it without waiting on
/// the interval.
pub async fn poll_once(state: &AppState) {
    let now = state.now_ms();
    if let Some((build_id, mode)) = state.dispatcher.poll_queue_once(now).await {
        match mode {
            DispatchMode::Remote { agent_id } => {
                tracing::info!(build_id = %build_id, agent_id, "queued build dispatched to agent");
            }
            DispatchMode::Failed { reason } => {
                tracing::error!(build_id = %build_id, reason, "queued build exhausted retries");
                let _ = state.builds.transition(&build_id, BuildStatus::Failure, now);
            }
            DispatchMode::Local | DispatchMode::Queued => {
                // poll_queue_once never returns these for a queue drain;
                // kept exhaustive so a future dispatcher change is caught
                // here at compile time.
            }
        }
    }
}

#[cfg(test)]
#[path = "queue_worker_tests.rs"]
mod tests;
