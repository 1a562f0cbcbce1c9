// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Build execution: turns a resolved `chengis_core::Pipeline` plus a
//! `chengis_core::Build` into a running workspace, a walked stage/step tree,
//! and a terminal `BuildResult`.
//!
//! `chengis-engine` owns none of the things it orchestrates — step
//! execution comes from `chengis-plugins`, DSL parsing and Chengisfile
//! overrides come from `chengis-dsl`, and the types it reads and writes
//! come from `chengis-core`. This crate is the glue that walks a pipeline
//! in the right order, at the right concurrency, emitting events as it goes.

pub mod condition;
pub mod executor;
pub mod workspace;

pub use condition::{evaluate, ConditionContext};
pub use executor::BuildExecutor;
pub use workspace::{Workspace, WorkspaceError, WorkspaceManager};
