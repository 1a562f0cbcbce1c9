// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The inbound half of the `/dispatch` wire protocol: an `axum` router an
//! agent process mounts to accept dispatched builds. Real agent processes
//! are external collaborators this module only fixes the route and body
//! shape both ends share, and doubles as the fixture server
//! [`crate::client::DispatchClient`]'s tests POST against.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};

use crate::protocol::{DispatchRequest, DispatchResponse};

/// Decides how an inbound `/dispatch` POST is answered. A real agent
/// accepts the build and starts executing it; test fixtures return a
/// canned outcome to exercise the client's fallback chain.
#[async_trait::async_trait]
pub trait DispatchAcceptor: Send + Sync {
    async fn accept(&self, request: DispatchRequest) -> Result<DispatchResponse, StatusCode>;
}

/// Mount `/dispatch` against `acceptor`.
pub fn router(acceptor: Arc<dyn DispatchAcceptor>) -> Router {
    Router::new()
        .route("/dispatch", post(handle_dispatch))
        .with_state(acceptor)
}

async fn handle_dispatch(
    State(acceptor): State<Arc<dyn DispatchAcceptor>>,
    Json(request): Json<DispatchRequest>,
) -> Result<Json<DispatchResponse>, StatusCode> {
    acceptor.accept(request).await.map(Json)
}
