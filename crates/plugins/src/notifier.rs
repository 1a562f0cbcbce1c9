// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Notifier` capability: send a finished build's result somewhere.
//! Side-effect-heavy notifiers (SCM status, chat, email) all implement this
//! one trait so the executor treats them identically and never lets a
//! notifier failure affect the recorded build status.

use async_trait::async_trait;
use chengis_core::BuildResult;

/// Outcome of one notifier invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierOutcome {
    Ok,
    Failed { details: String },
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, result: &BuildResult, config: &serde_json::Value) -> NotifierOutcome;
}
