// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The Chengis CI daemon (`chengisd`): owns the job/build tables, the
//! agent registry, the dispatcher, and the build executor, and exposes
//! them over HTTP.

pub mod queue_worker;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::AppState;
