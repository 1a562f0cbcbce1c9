// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build lifecycle: the record of one run of a `Pipeline`, and the status
//! state machine that governs how it may change over time.

use std::collections::HashMap;
use thiserror::Error;

use crate::define_id;

define_id! {
    /// Identifies a pipeline/job definition.
    pub struct JobId;
}

define_id! {
    /// Identifies a single run (build) of a job.
    pub struct BuildId;
}

/// What caused a build to be created.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    Manual { triggered_by: String },
    Webhook { source: String },
    Scheduled,
}

/// Resolved parameter values and other per-run configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BuildConfig {
    pub params: HashMap<String, String>,
    #[serde(default)]
    pub branch_override: Option<String>,
}

/// The build's current status. Terminal variants (`Success`, `Failure`,
/// `Aborted`) never transition further.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    Queued,
    Running,
    Success,
    Failure,
    Aborted,
}

impl BuildStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BuildStatus::Success | BuildStatus::Failure | BuildStatus::Aborted
        )
    }

    /// Whether `self -> next` is a legal transition.
    ///
    /// `queued -> running | aborted | failure`
    /// `running -> success | failure | aborted`
    /// everything else (including any transition out of a terminal state,
    /// or a same-state transition) is rejected.
    ///
    /// `queued -> failure` covers a build that never got to run at all —
    /// the dispatcher exhausted every fallback (no agent, queueing
    /// disabled, local execution disabled) and gave up before a workspace
    /// was ever prepared.
    fn can_transition_to(self, next: BuildStatus) -> bool {
        use BuildStatus::*;
        matches!(
            (self, next),
            (Queued, Running)
                | (Queued, Aborted)
                | (Queued, Failure)
                | (Running, Success)
                | (Running, Failure)
                | (Running, Aborted)
        )
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("illegal build status transition: {from:?} -> {to:?}")]
pub struct IllegalTransition {
    pub from: BuildStatus,
    pub to: BuildStatus,
}

/// A single run of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Build {
    pub id: BuildId,
    pub job_id: JobId,
    pub build_number: u64,
    pub status: BuildStatus,
    pub trigger: Trigger,
    pub config: BuildConfig,
    pub queued_at_ms: u64,
    pub started_at_ms: Option<u64>,
    pub finished_at_ms: Option<u64>,
}

impl Build {
    pub fn new(
        id: BuildId,
        job_id: JobId,
        build_number: u64,
        trigger: Trigger,
        config: BuildConfig,
        queued_at_ms: u64,
    ) -> Self {
        Self {
            id,
            job_id,
            build_number,
            status: BuildStatus::Queued,
            trigger,
            config,
            queued_at_ms,
            started_at_ms: None,
            finished_at_ms: None,
        }
    }

    /// Attempt to move to `next`, stamping the relevant timestamp. Rejects
    /// any transition not in the legal graph, leaving `self` unchanged.
    pub fn transition(&mut self, next: BuildStatus, at_ms: u64) -> Result<(), IllegalTransition> {
        if !self.status.can_transition_to(next) {
            return Err(IllegalTransition {
                from: self.status,
                to: next,
            });
        }
        if next == BuildStatus::Running {
            self.started_at_ms = Some(at_ms);
        }
        if next.is_terminal() {
            self.finished_at_ms = Some(at_ms);
        }
        self.status = next;
        Ok(())
    }
}

#[cfg(test)]
#[path = "build_tests.rs"]
mod tests;