// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Everything a `StepExecutor` needs to run one step, assembled by
//! `chengis-engine` before each invocation.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chengis_core::CancelToken;

/// Object-safe sliver of `chengis_core::Clock`: just enough to stamp a
/// `StepResult`, without the `Clone` bound that would make `Clock` itself
/// non-object-safe.
pub trait EpochClock: Send + Sync {
    fn epoch_ms(&self) -> u64;
}

impl<C: chengis_core::Clock> EpochClock for C {
    fn epoch_ms(&self) -> u64 {
        chengis_core::Clock::epoch_ms(self)
    }
}

/// Per-invocation context: workspace, merged environment, cancellation, and
/// output-capture bound. Built fresh for every step.
#[derive(Clone)]
pub struct StepContext {
    pub workspace: PathBuf,
    pub env: HashMap<String, String>,
    pub cancel: CancelToken,
    pub output_cap_bytes: usize,
    pub cancel_grace_ms: u64,
    pub clock: Arc<dyn EpochClock>,
}

impl StepContext {
    pub fn epoch_ms(&self) -> u64 {
        self.clock.epoch_ms()
    }

    /// Resolve a step's `dir` option against the workspace root.
    pub fn resolve_dir(&self, dir: Option<&str>) -> PathBuf {
        match dir {
            Some(d) => self.workspace.join(d),
            None => self.workspace.clone(),
        }
    }
}
