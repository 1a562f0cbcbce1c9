// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `build trigger`/`build cancel`/`build show` HTTP surface.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chengis_agent::FindRequest;
use chengis_core::{
    Build, BuildConfig, BuildId, BuildResult, BuildStatus, CancelToken, DispatchMode, Trigger,
};
use chengis_dispatcher::DispatchAttempt;
use serde::{Deserialize, Serialize};

use crate::state::{build_executor, AppState};

#[derive(Debug, Deserialize)]
pub struct TriggerBuildRequest {
    pub job_name: String,
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub params: HashMap<String, String>,
    #[serde(default)]
    pub triggered_by: Option<String>,
    #[serde(default)]
    pub required_labels: std::collections::HashSet<String>,
    #[serde(default)]
    pub cpu_count: u32,
    #[serde(default)]
    pub priority: i32,
}

#[derive(Debug, Serialize)]
pub struct TriggerBuildResponse {
    pub build_id: BuildId,
    pub build_number: u64,
    pub mode: DispatchMode,
}

/// `POST /builds/trigger`. Resolves parameters against the job's declared
/// defaults, creates the `Build` row at `queued`, asks the dispatcher to
/// place it, and for a `Local` decision immediately spawns the executor —
/// everything else (`Remote`, `Queued`, `Failed`) leaves the build's status
/// for the remote agent or the background queue worker to settle.
pub async fn trigger(
    State(state): State<AppState>,
    Json(req): Json<TriggerBuildRequest>,
) -> Result<Json<TriggerBuildResponse>, StatusCode> {
    let job = state
        .jobs
        .get(req.org_id.as_deref(), &req.job_name)
        .map_err(|_| StatusCode::NOT_FOUND)?;

    let mut params: HashMap<String, String> = job
        .pipeline
        .parameters
        .iter()
        .map(|p| (p.name.clone(), p.default.clone()))
        .collect();
    params.extend(req.params.clone());

    let build_number = state
        .jobs
        .next_build_number(req.org_id.as_deref(), &req.job_name)
        .map_err(|_| StatusCode::NOT_FOUND)?;

    let build_id = BuildId::new(uuid::Uuid::new_v4().to_string());
    let job_id = chengis_core::JobId::new(job.pipeline.name.clone());
    let now = state.now_ms();

    let build = Build::new(
        build_id.clone(),
        job_id.clone(),
        build_number,
        Trigger::Manual {
            triggered_by: req.triggered_by.unwrap_or_else(|| "unknown".to_string()),
        },
        BuildConfig {
            params: params.clone(),
            branch_override: None,
        },
        now,
    );
    state.builds.insert(build);

    let attempt = DispatchAttempt {
        build_id: build_id.clone(),
        job_id: job_id.clone(),
        org_id: req.org_id.clone(),
        pipeline: job.pipeline.clone(),
        parameters: params,
        find_request: FindRequest {
            org_id: req.org_id.clone(),
            required_labels: req.required_labels,
            cpu_count: req.cpu_count,
        },
        priority: req.priority,
    };

    let mode = state.dispatcher.dispatch(&attempt, now).await;

    match &mode {
        DispatchMode::Local => {
            spawn_local_execution(state.clone(), build_id.clone(), job.pipeline.clone());
        }
        DispatchMode::Failed { reason } => {
            tracing::error!(build_id = %build_id, reason, "build has no route to run");
            let _ = state.builds.transition(&build_id, BuildStatus::Failure, now);
        }
        DispatchMode::Remote { .. } | DispatchMode::Queued => {}
    }

    Ok(Json(TriggerBuildResponse {
        build_id,
        build_number,
        mode,
    }))
}

fn spawn_local_execution(
    state: AppState,
    build_id: BuildId,
    pipeline: chengis_core::Pipeline,
) {
    tokio::spawn(async move {
        let mut build = match state.builds.get(&build_id) {
            Ok(build) => build,
            Err(err) => {
                tracing::error!(build_id = %build_id, error = %err, "build vanished before local execution");
                return;
            }
        };

        let cancel = CancelToken::new();
        state.running.lock().insert(build_id.clone(), cancel.clone());

        let executor = build_executor(&state);
        let result: BuildResult = executor.execute(&mut build, &pipeline, cancel).await;

        state.running.lock().remove(&build_id);
        state.builds.update(build);
        state.builds.record_result(result);
    });
}

/// `GET /builds/:id`. Returns the finished `BuildResult` once the build has
/// reached a terminal status; otherwise just the in-flight `Build` row.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BuildView {
    Finished(BuildResult),
    InFlight(Build),
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BuildView>, StatusCode> {
    let build_id = BuildId::new(id);
    if let Some(result) = state.builds.get_result(&build_id) {
        return Ok(Json(BuildView::Finished(result)));
    }
    state
        .builds
        .get(&build_id)
        .map(|build| Json(BuildView::InFlight(build)))
        .map_err(|_| StatusCode::NOT_FOUND)
}

/// `POST /builds/:id/cancel`. A build already running locally gets its
/// cancel token tripped, which the executor honors cooperatively before
/// its next step. A build that hasn't started locally (still `queued`, or
/// dispatched remotely) is transitioned straight to `aborted` here — there
/// is nothing else in this process racing that status.
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let build_id = BuildId::new(id);

    if let Some(cancel) = state.running.lock().get(&build_id).cloned() {
        cancel.cancel();
        return Ok(StatusCode::ACCEPTED);
    }

    state
        .builds
        .transition(&build_id, BuildStatus::Aborted, state.now_ms())
        .map(|_| StatusCode::ACCEPTED)
        .map_err(|_| StatusCode::CONFLICT)
}

#[cfg(test)]
#[path = "builds_tests.rs"]
mod tests;
