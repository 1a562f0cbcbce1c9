// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `job create`/`job list` HTTP surface.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chengis_core::Pipeline;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterJobRequest {
    pub org_id: Option<String>,
    pub pipeline: Pipeline,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RegisterOutcome {
    Created,
    Unchanged,
    Replaced,
}

impl From<chengis_store::RegisterOutcome> for RegisterOutcome {
    fn from(value: chengis_store::RegisterOutcome) -> Self {
        match value {
            chengis_store::RegisterOutcome::Created => RegisterOutcome::Created,
            chengis_store::RegisterOutcome::Unchanged => RegisterOutcome::Unchanged,
            chengis_store::RegisterOutcome::Replaced => RegisterOutcome::Replaced,
        }
    }
}

/// `POST /jobs` — parse-and-validate happens before this route ever runs
/// (the body is already a validated `Pipeline`, produced by `chengis-dsl`
/// on the CLI side); this route only registers it.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterJobRequest>,
) -> Json<RegisterOutcome> {
    let outcome = state.jobs.register(req.org_id, req.pipeline);
    tracing::info!(outcome = ?outcome, "job registered");
    Json(outcome.into())
}

#[derive(Debug, Serialize)]
pub struct JobSummary {
    pub name: String,
    pub org_id: Option<String>,
    pub description: Option<String>,
    pub next_build_number: u64,
}

/// `GET /jobs`
pub async fn list(State(state): State<AppState>) -> Json<Vec<JobSummary>> {
    let jobs = state
        .jobs
        .list()
        .into_iter()
        .map(|job| JobSummary {
            name: job.pipeline.name.clone(),
            org_id: job.org_id,
            description: job.pipeline.description,
            next_build_number: job.next_build_number,
        })
        .collect();
    Json(jobs)
}

/// `GET /jobs/:name`
pub async fn get(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Pipeline>, StatusCode> {
    state
        .jobs
        .get(None, &name)
        .map(|job| Json(job.pipeline))
        .map_err(|_| StatusCode::NOT_FOUND)
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
