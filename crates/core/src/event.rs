// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Facts emitted while a build runs. Events are the append-only record of
//! what happened; nothing downstream mutates history, it only reacts to it.

use crate::build::{BuildId, BuildStatus, JobId};
use crate::result::{StageStatus, StepStatus};

/// Where a build ended up running.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    Remote { agent_id: String },
    Local,
    Queued,
}

/// A state-changing fact about a build's execution, recorded in order.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    DispatchDecided {
        build_id: BuildId,
        outcome: DispatchOutcome,
    },
    BuildStarted {
        build_id: BuildId,
        job_id: JobId,
        at_ms: u64,
    },
    BuildAborted {
        build_id: BuildId,
        at_ms: u64,
    },
    StageStarted {
        build_id: BuildId,
        stage_name: String,
        at_ms: u64,
    },
    StageSkipped {
        build_id: BuildId,
        stage_name: String,
        reason: String,
    },
    StageCompleted {
        build_id: BuildId,
        stage_name: String,
        status: StageStatus,
        at_ms: u64,
    },
    StepStarted {
        build_id: BuildId,
        stage_name: String,
        step_name: String,
        at_ms: u64,
    },
    StepCompleted {
        build_id: BuildId,
        stage_name: String,
        step_name: String,
        status: StepStatus,
        at_ms: u64,
    },
    LogOverflow {
        build_id: BuildId,
        step_name: String,
        dropped_bytes: u64,
    },
    NotifierFailed {
        build_id: BuildId,
        notifier_tag: String,
        reason: String,
    },
    BuildCompleted {
        build_id: BuildId,
        job_id: JobId,
        status: BuildStatus,
        at_ms: u64,
    },
}

impl Event {
    pub fn build_id(&self) -> &BuildId {
        match self {
            Event::DispatchDecided { build_id, .. }
            | Event::BuildStarted { build_id, .. }
            | Event::BuildAborted { build_id, .. }
            | Event::StageStarted { build_id, .. }
            | Event::StageSkipped { build_id, .. }
            | Event::StageCompleted { build_id, .. }
            | Event::StepStarted { build_id, .. }
            | Event::StepCompleted { build_id, .. }
            | Event::LogOverflow { build_id, .. }
            | Event::NotifierFailed { build_id, .. }
            | Event::BuildCompleted { build_id, .. } => build_id,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;