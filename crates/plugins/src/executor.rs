// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `StepExecutor` capability: execute one `Step` within a `StepContext`.

use async_trait::async_trait;
use chengis_core::{Step, StepResult};
use thiserror::Error;

use crate::context::StepContext;

#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("step '{0}' has no step_type registered")]
    UnknownStepType(String),
    #[error("failed to spawn step process: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("step payload is not valid for its step_type: {0}")]
    InvalidPayload(String),
}

/// Runs one `Step` to completion and reports what happened.
///
/// Implementations own their own timeout and cancellation handling where a
/// literal OS process is involved (shell, docker, docker-compose); engine
/// only supplies the `CancelToken` and reacts to the returned `StepResult`.
#[async_trait]
pub trait StepExecutor: Send + Sync {
    async fn execute(&self, step: &Step, ctx: &StepContext) -> Result<StepResult, ExecuteError>;
}
