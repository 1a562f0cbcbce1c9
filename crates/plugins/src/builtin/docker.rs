// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `docker` and `docker-compose` step executors. Both shell out to the
//! corresponding binary with a composed argv — no Docker Engine API client
//! is implemented beyond the shared executor interface.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use chengis_core::{Step, StepPayload, StepResult};

use crate::builtin::proc::run_capped;
use crate::context::StepContext;
use crate::executor::{ExecuteError, StepExecutor};

/// Opaque payload recognized by `docker` steps.
#[derive(Debug, Deserialize)]
struct DockerPayload {
    image: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    timeout_ms: Option<u64>,
}

/// `docker run <image> <args...>` inside the step's working directory,
/// bind-mounted at `/workspace`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DockerExecutor;

#[async_trait]
impl StepExecutor for DockerExecutor {
    async fn execute(&self, step: &Step, ctx: &StepContext) -> Result<StepResult, ExecuteError> {
        let payload = opaque_payload::<DockerPayload>(step)?;
        let dir = ctx.workspace.clone();

        let mut cmd = Command::new("docker");
        cmd.arg("run")
            .arg("--rm")
            .arg("-v")
            .arg(format!("{}:/workspace", dir.display()))
            .arg("-w")
            .arg("/workspace");
        for (k, v) in &ctx.env {
            cmd.arg("-e").arg(format!("{k}={v}"));
        }
        cmd.arg(&payload.image).args(&payload.args);

        run_capped(cmd, &step.name, payload.timeout_ms, ctx).await
    }
}

/// Opaque payload recognized by `docker-compose` steps.
#[derive(Debug, Deserialize)]
struct DockerComposePayload {
    #[serde(default)]
    file: Option<String>,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    timeout_ms: Option<u64>,
}

/// `docker compose [-f <file>] <args...>` in the workspace directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct DockerComposeExecutor;

#[async_trait]
impl StepExecutor for DockerComposeExecutor {
    async fn execute(&self, step: &Step, ctx: &StepContext) -> Result<StepResult, ExecuteError> {
        let payload = opaque_payload::<DockerComposePayload>(step)?;

        let mut cmd = Command::new("docker");
        cmd.arg("compose").current_dir(&ctx.workspace);
        if let Some(file) = &payload.file {
            cmd.arg("-f").arg(file);
        }
        cmd.envs(ctx.env.iter());
        cmd.args(&payload.args);

        run_capped(cmd, &step.name, payload.timeout_ms, ctx).await
    }
}

fn opaque_payload<T: for<'de> Deserialize<'de>>(step: &Step) -> Result<T, ExecuteError> {
    let StepPayload::Opaque(value) = &step.payload else {
        return Err(ExecuteError::InvalidPayload(format!(
            "step '{}' is type '{}' but carries a shell payload",
            step.name, step.step_type
        )));
    };
    serde_json::from_value(value.clone())
        .map_err(|e| ExecuteError::InvalidPayload(format!("step '{}': {e}", step.name)))
}

#[cfg(test)]
#[path = "docker_tests.rs"]
mod tests;
