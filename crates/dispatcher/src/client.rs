// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The outbound half of the `/dispatch` wire protocol: a thin `reqwest`
//! client that POSTs a build envelope to an agent's endpoint and classifies
//! the response (`status < 300` is accepted; everything else, including a
//! transport failure, is a rejection).

use std::time::Duration;

use reqwest::Client;

use crate::error::DispatchError;
use crate::protocol::{DispatchRequest, DispatchResponse};

/// Outbound client used by [`crate::dispatcher::Dispatcher`] to hand a build
/// envelope to a remote agent.
#[derive(Clone)]
pub struct DispatchClient {
    http: Client,
}

impl DispatchClient {
    pub fn new(timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { http }
    }

    /// `POST {agent_base}/dispatch`. A response status `< 300` is success;
    /// exactly `300` and above is failure (299 accepted, 300 rejected).
    pub async fn dispatch(
        &self,
        agent_base: &str,
        request: &DispatchRequest,
    ) -> Result<DispatchResponse, DispatchError> {
        let url = format!("{}/dispatch", agent_base.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|err| DispatchError::AgentRejected(err.to_string()))?;

        let status = response.status();
        if status.as_u16() >= 300 {
            return Err(DispatchError::AgentRejected(format!(
                "agent responded with status {status}"
            )));
        }

        response
            .json::<DispatchResponse>()
            .await
            .map_err(|err| DispatchError::AgentRejected(err.to_string()))
    }
}

impl Default for DispatchClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}
