// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `/dispatch` wire shape, shared verbatim between the outbound
//! [`crate::client::DispatchClient`] and the inbound agent-side
//! [`crate::server`] router so the two ends cannot drift.

use std::collections::HashMap;

use chengis_core::{BuildId, JobId, Pipeline};
use serde::{Deserialize, Serialize};

/// Body of `POST {agent_base}/dispatch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub build_id: BuildId,
    pub job_id: JobId,
    pub org_id: Option<String>,
    pub pipeline: Pipeline,
    pub parameters: HashMap<String, String>,
    /// A hint for where the agent should stage the build; the agent is free
    /// to ignore it and pick its own workspace root.
    pub workspace_hint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_span: Option<String>,
}

/// Body returned by an agent that accepted the dispatch (`status < 300`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResponse {
    pub agent_build_id: String,
}
