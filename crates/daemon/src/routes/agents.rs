// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `agent register`/`agent list`/`agent heartbeat` HTTP surface.

use std::collections::HashSet;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chengis_agent::{Agent, NewAgent};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterAgentRequest {
    pub agent_id: String,
    pub endpoint: String,
    #[serde(default)]
    pub labels: HashSet<String>,
    #[serde(default)]
    pub org_id: Option<String>,
    pub max_builds: u32,
    pub cpu_count: u32,
    #[serde(default)]
    pub heartbeat_timeout_ms: Option<u64>,
}

/// `POST /agents`. Re-registering an `agent_id` that's already known
/// replaces it wholesale (`chengis_agent::AgentRegistry::register`'s own
/// idempotence contract) — this route does not add anything on top.
pub async fn register(State(state): State<AppState>, Json(req): Json<RegisterAgentRequest>) -> StatusCode {
    let now = state.now_ms();
    state.agents.register(
        NewAgent {
            agent_id: req.agent_id.clone(),
            endpoint: req.endpoint,
            labels: req.labels,
            org_id: req.org_id,
            max_builds: req.max_builds,
            cpu_count: req.cpu_count,
            heartbeat_timeout_ms: req.heartbeat_timeout_ms.unwrap_or(state.config.circuit_cooldown_ms * 2),
            circuit_threshold: state.config.circuit_threshold,
            circuit_cooldown_ms: state.config.circuit_cooldown_ms,
        },
        now,
    );
    tracing::info!(agent_id = req.agent_id, "agent registered");
    StatusCode::CREATED
}

/// `DELETE /agents/:id`
pub async fn deregister(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    state.agents.deregister(&id);
    StatusCode::NO_CONTENT
}

/// `POST /agents/:id/heartbeat`
pub async fn heartbeat(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    let now = state.now_ms();
    match state.agents.heartbeat(&id, now) {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(_) => StatusCode::NOT_FOUND,
    }
}

/// `GET /agents`
pub async fn list(State(state): State<AppState>) -> Json<Vec<Agent>> {
    Json(state.agents.list(state.now_ms()))
}

/// `GET /agents/:id`
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Agent>, StatusCode> {
    state
        .agents
        .get(&id, state.now_ms())
        .map(Json)
        .map_err(|_| StatusCode::NOT_FOUND)
}

#[cfg(test)]
#[path = "agents_tests.rs"]
mod tests;
