// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job (registered pipeline) table.
//!
//! A Pipeline's `name` uniquely identifies a registered job within an org.
//! Re-registering a job with an identical Pipeline is a no-op;
//! re-registering with a *different* Pipeline replaces the definition in
//! place.

use std::collections::HashMap;

use chengis_core::Pipeline;
use parking_lot::RwLock;
use thiserror::Error;

/// A registered pipeline, scoped to an (optional) org.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub org_id: Option<String>,
    pub pipeline: Pipeline,
    pub next_build_number: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobStoreError {
    #[error("no job named '{0}' registered")]
    NotFound(String),
}

/// Result of `JobStore::register`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// A new job was created.
    Created,
    /// An identical pipeline was already registered; nothing changed.
    Unchanged,
    /// A job with this name existed with a different pipeline; replaced.
    Replaced,
}

fn key(org_id: Option<&str>, name: &str) -> String {
    match org_id {
        Some(org) => format!("{org}/{name}"),
        None => name.to_string(),
    }
}

/// Read-mostly table of registered jobs, writes serialized per job name —
/// a single `RwLock` over the whole map gives us that for a table this
/// size; per-key locking would be premature.
#[derive(Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<String, Job>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `pipeline` for `org_id`. Idempotent: registering the exact
    /// same pipeline twice is a no-op and preserves the existing build
    /// number counter.
    pub fn register(&self, org_id: Option<String>, pipeline: Pipeline) -> RegisterOutcome {
        let k = key(org_id.as_deref(), &pipeline.name);
        let mut jobs = self.jobs.write();
        match jobs.get_mut(&k) {
            Some(existing) if existing.pipeline == pipeline && existing.org_id == org_id => {
                RegisterOutcome::Unchanged
            }
            Some(existing) => {
                existing.pipeline = pipeline;
                RegisterOutcome::Replaced
            }
            None => {
                jobs.insert(
                    k,
                    Job {
                        org_id,
                        pipeline,
                        next_build_number: 1,
                    },
                );
                RegisterOutcome::Created
            }
        }
    }

    pub fn get(&self, org_id: Option<&str>, name: &str) -> Result<Job, JobStoreError> {
        self.jobs
            .read()
            .get(&key(org_id, name))
            .cloned()
            .ok_or_else(|| JobStoreError::NotFound(name.to_string()))
    }

    pub fn list(&self) -> Vec<Job> {
        self.jobs.read().values().cloned().collect()
    }

    pub fn deregister(&self, org_id: Option<&str>, name: &str) {
        self.jobs.write().remove(&key(org_id, name));
    }

    /// Atomically reserve the next build number for `name`, bumping the
    /// counter. Returns `1 + max(existing build_numbers)`.
    pub fn next_build_number(
        &self,
        org_id: Option<&str>,
        name: &str,
    ) -> Result<u64, JobStoreError> {
        let mut jobs = self.jobs.write();
        let job = jobs
            .get_mut(&key(org_id, name))
            .ok_or_else(|| JobStoreError::NotFound(name.to_string()))?;
        let n = job.next_build_number;
        job.next_build_number += 1;
        Ok(n)
    }
}

#[cfg(test)]
#[path = "job_store_tests.rs"]
mod tests;
