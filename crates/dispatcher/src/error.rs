// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chengis_store::{BuildStoreError, JobStoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Job(#[from] JobStoreError),
    #[error(transparent)]
    Build(#[from] BuildStoreError),
    #[error("agent endpoint rejected the dispatch: {0}")]
    AgentRejected(String),
    #[error("no agent available, local execution disabled, and the queue is disabled")]
    NoRoute,
}
