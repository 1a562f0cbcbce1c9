// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-execution plumbing shared by the `shell`, `docker`, and
//! `docker-compose` executors: spawn, capped output capture, and the
//! SIGTERM-then-SIGKILL cancellation grace period.
//!
//! Signals are sent by shelling out to the `kill` binary rather than
//! depending on a signals crate directly — the same approach the CLI crate
//! uses to stop a runaway daemon process.

use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};

use chengis_core::{StepResult, StepStatus};

use crate::context::StepContext;
use crate::executor::ExecuteError;

/// Why a running process stopped.
enum StopReason {
    Exited(std::process::ExitStatus),
    TimedOut,
    Cancelled,
}

/// Run `cmd` to completion honoring `timeout_ms` and `ctx.cancel`, capturing
/// output up to `ctx.output_cap_bytes` on each stream.
pub async fn run_capped(
    mut cmd: Command,
    step_name: &str,
    timeout_ms: Option<u64>,
    ctx: &StepContext,
) -> Result<StepResult, ExecuteError> {
    let started_at_ms = ctx.epoch_ms();

    cmd.stdin(std::process::Stdio::null());
    cmd.stdout(std::process::Stdio::piped());
    cmd.stderr(std::process::Stdio::piped());

    let mut child = cmd.spawn().map_err(ExecuteError::Spawn)?;
    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return Err(ExecuteError::Spawn(std::io::Error::other(
            "child process did not inherit piped stdout/stderr",
        )));
    };
    let cap = ctx.output_cap_bytes;

    let stdout_task = tokio::spawn(read_capped(stdout, cap));
    let stderr_task = tokio::spawn(read_capped(stderr, cap));

    let reason = wait_for_stop(&mut child, timeout_ms, ctx).await;

    if !matches!(reason, StopReason::Exited(_)) {
        kill_gracefully(&mut child, ctx.cancel_grace_ms).await;
    }

    let (stdout_bytes, stdout_truncated) = stdout_task.await.unwrap_or_default();
    let (stderr_bytes, stderr_truncated) = stderr_task.await.unwrap_or_default();
    let finished_at_ms = ctx.epoch_ms();

    let (status, exit_code) = match reason {
        StopReason::Exited(exit_status) => {
            if exit_status.success() {
                (StepStatus::Success, exit_status.code())
            } else {
                (StepStatus::Failure, exit_status.code())
            }
        }
        StopReason::TimedOut => (StepStatus::Timeout, Some(-1)),
        StopReason::Cancelled => (StepStatus::Aborted, None),
    };

    Ok(StepResult {
        step_name: step_name.to_string(),
        status,
        exit_code,
        stdout: stdout_bytes,
        stderr: stderr_bytes,
        started_at_ms,
        finished_at_ms,
        output_truncated: stdout_truncated || stderr_truncated,
    })
}

async fn wait_for_stop(child: &mut Child, timeout_ms: Option<u64>, ctx: &StepContext) -> StopReason {
    match timeout_ms {
        Some(ms) => {
            tokio::select! {
                result = child.wait() => StopReason::Exited(result.unwrap_or_else(|_| default_exit_status())),
                _ = tokio::time::sleep(Duration::from_millis(ms)) => StopReason::TimedOut,
                _ = ctx.cancel.cancelled() => StopReason::Cancelled,
            }
        }
        None => {
            tokio::select! {
                result = child.wait() => StopReason::Exited(result.unwrap_or_else(|_| default_exit_status())),
                _ = ctx.cancel.cancelled() => StopReason::Cancelled,
            }
        }
    }
}

#[cfg(unix)]
fn default_exit_status() -> std::process::ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    std::process::ExitStatus::from_raw(-1)
}

#[cfg(not(unix))]
fn default_exit_status() -> std::process::ExitStatus {
    std::process::ExitStatus::default()
}

/// Read up to `cap` bytes from `reader`, returning the captured text and
/// whether it was truncated. Always drains the reader to completion so a
/// chatty child process isn't left blocked on a full pipe buffer.
async fn read_capped<R: tokio::io::AsyncRead + Unpin>(mut reader: R, cap: usize) -> (String, bool) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    let mut truncated = false;
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                if buf.len() < cap {
                    let take = (cap - buf.len()).min(n);
                    buf.extend_from_slice(&chunk[..take]);
                    if take < n {
                        truncated = true;
                    }
                } else {
                    truncated = true;
                }
            }
            Err(_) => break,
        }
    }
    (String::from_utf8_lossy(&buf).into_owned(), truncated)
}

/// SIGTERM, wait a grace period, SIGKILL if still alive.
async fn kill_gracefully(child: &mut Child, grace_ms: u64) {
    let Some(pid) = child.id() else {
        return;
    };

    send_signal(pid, "-TERM").await;

    let deadline = Duration::from_millis(grace_ms);
    let exited = tokio::time::timeout(deadline, child.wait()).await.is_ok();

    if !exited {
        send_signal(pid, "-KILL").await;
        let _ = child.wait().await;
    }
}

async fn send_signal(pid: u32, signal: &str) {
    let _ = Command::new("kill")
        .args([signal, &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .await;
}
