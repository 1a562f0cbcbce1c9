// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `shell` step executor — runs `payload.command` through `sh -c`.

use async_trait::async_trait;
use tokio::process::Command;

use chengis_core::{Step, StepPayload, StepResult};

use crate::builtin::proc::run_capped;
use crate::context::StepContext;
use crate::executor::{ExecuteError, StepExecutor};

/// Default built-in step type. Shells out to `sh -c <command>` in the
/// step's (or workspace) directory, with the context's merged environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellExecutor;

#[async_trait]
impl StepExecutor for ShellExecutor {
    async fn execute(&self, step: &Step, ctx: &StepContext) -> Result<StepResult, ExecuteError> {
        let payload = match &step.payload {
            StepPayload::Shell(p) => p,
            StepPayload::Opaque(_) => {
                return Err(ExecuteError::InvalidPayload(format!(
                    "step '{}' is type 'shell' but carries a non-shell payload",
                    step.name
                )))
            }
        };

        let dir = ctx.resolve_dir(payload.dir.as_deref());

        // Inherits the daemon's own environment; ctx.env layers the
        // pipeline/stage/step/GIT_* values on top, last write wins.
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(&payload.command).current_dir(&dir);
        cmd.envs(ctx.env.iter());

        run_capped(cmd, &step.name, payload.timeout_ms, ctx).await
    }
}

#[cfg(test)]
#[path = "shell_tests.rs"]
mod tests;
