// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build record table: one row per `Build`, plus the completed `BuildResult`
//! once a build reaches a terminal status.

use std::collections::HashMap;

use chengis_core::{Build, BuildId, BuildResult, BuildStatus, IllegalTransition, JobId};
use parking_lot::RwLock;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildStoreError {
    #[error("no build '{0}' found")]
    NotFound(BuildId),
    #[error(transparent)]
    IllegalTransition(#[from] IllegalTransition),
}

#[derive(Default)]
struct Inner {
    builds: HashMap<BuildId, Build>,
    results: HashMap<BuildId, BuildResult>,
    by_job: HashMap<JobId, Vec<BuildId>>,
}

/// Concurrency-safe table of in-flight and completed builds.
#[derive(Default)]
pub struct BuildStore {
    inner: RwLock<Inner>,
}

impl BuildStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, build: Build) {
        let mut inner = self.inner.write();
        inner.by_job.entry(build.job_id.clone()).or_default().push(build.id.clone());
        inner.builds.insert(build.id.clone(), build);
    }

    pub fn get(&self, id: &BuildId) -> Result<Build, BuildStoreError> {
        self.inner
            .read()
            .builds
            .get(id)
            .cloned()
            .ok_or_else(|| BuildStoreError::NotFound(id.clone()))
    }

    /// Apply a guarded status transition in place.
    pub fn transition(&self, id: &BuildId, next: BuildStatus, at_ms: u64) -> Result<(), BuildStoreError> {
        let mut inner = self.inner.write();
        let build = inner
            .builds
            .get_mut(id)
            .ok_or_else(|| BuildStoreError::NotFound(id.clone()))?;
        build.transition(next, at_ms)?;
        Ok(())
    }

    /// Overwrite a build's row wholesale with `build`. Used by the daemon
    /// after it hands a `Build` off to `chengis_engine::BuildExecutor`,
    /// which mutates its own owned copy rather than one borrowed from the
    /// store, and needs to publish the result back when execution finishes.
    pub fn update(&self, build: Build) {
        self.inner.write().builds.insert(build.id.clone(), build);
    }

    pub fn record_result(&self, result: BuildResult) {
        self.inner.write().results.insert(result.build_id.clone(), result);
    }

    pub fn get_result(&self, id: &BuildId) -> Option<BuildResult> {
        self.inner.read().results.get(id).cloned()
    }

    pub fn list_for_job(&self, job_id: &JobId) -> Vec<Build> {
        let inner = self.inner.read();
        inner
            .by_job
            .get(job_id)
            .into_iter()
            .flatten()
            .filter_map(|id| inner.builds.get(id).cloned())
            .collect()
    }
}

#[cfg(test)]
#[path = "build_store_tests.rs"]
mod tests;
