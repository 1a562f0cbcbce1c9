// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `console` notifier — writes a structured `tracing` log line. Always
//! registered; the only notifier guaranteed to work with zero configuration.

use async_trait::async_trait;
use chengis_core::BuildResult;

use crate::notifier::{Notifier, NotifierOutcome};

#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, result: &BuildResult, _config: &serde_json::Value) -> NotifierOutcome {
        tracing::info!(
            build_id = %result.build_id,
            job_id = %result.job_id,
            build_number = result.build_number,
            status = ?result.status,
            "build completed"
        );
        NotifierOutcome::Ok
    }
}

#[cfg(test)]
#[path = "console_tests.rs"]
mod tests;
