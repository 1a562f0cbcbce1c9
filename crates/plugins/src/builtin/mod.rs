// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Built-in step executors and notifiers, always registered regardless of
//! what a deployment loads from an external plugin directory: `shell`,
//! `docker`, `docker-compose`, and the console notifier ship in-process.

mod docker;
mod proc;
mod shell;

mod console;

pub use console::ConsoleNotifier;
pub use docker::{DockerComposeExecutor, DockerExecutor};
pub use shell::ShellExecutor;
