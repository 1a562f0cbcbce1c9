// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP route handlers, one module per resource.

pub mod agents;
pub mod builds;
pub mod dispatch;
pub mod jobs;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full daemon router: job/build/agent management plus the
/// inbound `/dispatch` endpoint that lets this process double as an agent.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/jobs", post(jobs::register).get(jobs::list))
        .route("/jobs/:name", get(jobs::get))
        .route("/builds/trigger", post(builds::trigger))
        .route("/builds/:id", get(builds::show))
        .route("/builds/:id/cancel", post(builds::cancel))
        .route("/agents", post(agents::register).get(agents::list))
        .route("/agents/:id", get(agents::get).delete(agents::deregister))
        .route("/agents/:id/heartbeat", post(agents::heartbeat))
        .merge(dispatch::router(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
