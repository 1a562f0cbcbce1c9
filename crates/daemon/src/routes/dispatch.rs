// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound `/dispatch`: lets this process act as an agent target for
//! another chengisd's dispatcher, not just a dispatcher itself. A build
//! arriving here is inserted at `queued` and handed straight to the local
//! executor, exactly like `routes::builds::trigger`'s `DispatchMode::Local`
//! path.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chengis_core::{Build, BuildConfig, CancelToken};
use chengis_dispatcher::server::DispatchAcceptor;
use chengis_dispatcher::{DispatchRequest, DispatchResponse};

use crate::state::{build_executor, AppState};

#[async_trait::async_trait]
impl DispatchAcceptor for AppState {
    async fn accept(&self, request: DispatchRequest) -> Result<DispatchResponse, StatusCode> {
        let now = self.now_ms();
        let build = Build::new(
            request.build_id.clone(),
            request.job_id.clone(),
            0,
            chengis_core::Trigger::Webhook {
                source: "dispatch".to_string(),
            },
            BuildConfig {
                params: request.parameters.clone(),
                branch_override: None,
            },
            now,
        );
        self.builds.insert(build);

        let cancel = CancelToken::new();
        self.running.lock().insert(request.build_id.clone(), cancel.clone());

        let state = self.clone();
        let build_id = request.build_id.clone();
        let pipeline = request.pipeline.clone();
        tokio::spawn(async move {
            let mut build = match state.builds.get(&build_id) {
                Ok(build) => build,
                Err(_) => return,
            };
            let executor = build_executor(&state);
            let result = executor.execute(&mut build, &pipeline, cancel).await;
            state.running.lock().remove(&build_id);
            state.builds.update(build);
            state.builds.record_result(result);
        });

        Ok(DispatchResponse {
            agent_build_id: request.build_id.to_string(),
        })
    }
}

/// `POST /dispatch` — mounted by `routes::router` via
/// `chengis_dispatcher::server::router`, reusing the same wire contract a
/// standalone agent process would implement.
pub fn router(state: AppState) -> axum::Router {
    chengis_dispatcher::server::router(std::sync::Arc::new(state))
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
