// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for talking to a running `chengisd`.

use std::collections::HashMap;
use std::time::Duration;

use chengis_core::{Build, BuildId, BuildResult, DispatchMode, Pipeline};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to chengisd at {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("chengisd returned {status} for {url}")]
    Status { url: String, status: reqwest::StatusCode },
}

/// Thin wrapper over `reqwest` pointed at one daemon base URL.
pub struct DaemonClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterJobRequest {
    pub org_id: Option<String>,
    pub pipeline: Pipeline,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterOutcome {
    Created,
    Unchanged,
    Replaced,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobSummary {
    pub name: String,
    pub org_id: Option<String>,
    pub description: Option<String>,
    pub next_build_number: u64,
}

#[derive(Debug, Serialize, Default)]
pub struct TriggerBuildRequest {
    pub job_name: String,
    pub org_id: Option<String>,
    pub params: HashMap<String, String>,
    pub triggered_by: Option<String>,
    pub required_labels: std::collections::HashSet<String>,
    pub cpu_count: u32,
    pub priority: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TriggerBuildResponse {
    pub build_id: BuildId,
    pub build_number: u64,
    pub mode: DispatchMode,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum BuildView {
    Finished(BuildResult),
    InFlight(Build),
}

/// Mirrors `chengis_agent::Agent`'s wire shape without pulling in the
/// whole registry crate just for this one read-only view.
#[derive(Debug, Serialize, Deserialize)]
pub struct AgentView {
    pub agent_id: String,
    pub endpoint: String,
    pub labels: std::collections::HashSet<String>,
    pub org_id: Option<String>,
    pub max_builds: u32,
    pub cpu_count: u32,
    pub current_builds: u32,
    pub last_heartbeat_at_ms: u64,
    pub heartbeat_timeout_ms: u64,
    pub circuit_state: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterAgentRequest {
    pub agent_id: String,
    pub endpoint: String,
    pub labels: std::collections::HashSet<String>,
    pub org_id: Option<String>,
    pub max_builds: u32,
    pub cpu_count: u32,
    pub heartbeat_timeout_ms: Option<u64>,
}

impl DaemonClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn send<Req: Serialize, Res: for<'de> Deserialize<'de>>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&Req>,
    ) -> Result<Res, ClientError> {
        let url = self.url(path);
        let mut req = self.http.request(method, &url);
        if let Some(body) = body {
            req = req.json(body);
        }
        let response = req
            .send()
            .await
            .map_err(|source| ClientError::Request { url: url.clone(), source })?;
        if !response.status().is_success() {
            return Err(ClientError::Status {
                url,
                status: response.status(),
            });
        }
        response
            .json()
            .await
            .map_err(|source| ClientError::Request { url, source })
    }

    pub async fn register_job(&self, req: RegisterJobRequest) -> Result<RegisterOutcome, ClientError> {
        self.send(reqwest::Method::POST, "/jobs", Some(&req)).await
    }

    pub async fn list_jobs(&self) -> Result<Vec<JobSummary>, ClientError> {
        self.send::<(), _>(reqwest::Method::GET, "/jobs", None).await
    }

    pub async fn trigger_build(
        &self,
        req: TriggerBuildRequest,
    ) -> Result<TriggerBuildResponse, ClientError> {
        self.send(reqwest::Method::POST, "/builds/trigger", Some(&req)).await
    }

    pub async fn show_build(&self, build_id: &str) -> Result<BuildView, ClientError> {
        self.send::<(), _>(reqwest::Method::GET, &format!("/builds/{build_id}"), None)
            .await
    }

    pub async fn cancel_build(&self, build_id: &str) -> Result<(), ClientError> {
        let url = self.url(&format!("/builds/{build_id}/cancel"));
        let response = self
            .http
            .post(&url)
            .send()
            .await
            .map_err(|source| ClientError::Request { url: url.clone(), source })?;
        if !response.status().is_success() {
            return Err(ClientError::Status {
                url,
                status: response.status(),
            });
        }
        Ok(())
    }

    pub async fn list_agents(&self) -> Result<Vec<AgentView>, ClientError> {
        self.send::<(), _>(reqwest::Method::GET, "/agents", None).await
    }

    pub async fn register_agent(&self, req: RegisterAgentRequest) -> Result<(), ClientError> {
        let url = self.url("/agents");
        let response = self
            .http
            .post(&url)
            .json(&req)
            .send()
            .await
            .map_err(|source| ClientError::Request { url: url.clone(), source })?;
        if !response.status().is_success() {
            return Err(ClientError::Status {
                url,
                status: response.status(),
            });
        }
        Ok(())
    }
}
