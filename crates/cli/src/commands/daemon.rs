// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `daemon run` — a thin wrapper that just points the user at `chengisd`;
//! the CLI process itself never forks or supervises the daemon. `chengisd`
//! is started directly, the way any other HTTP service binary is.

use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Print how to start the daemon
    Run,
}

pub fn run(_args: DaemonArgs) -> Result<()> {
    println!("chengisd is a standalone binary; start it directly:");
    println!("    chengisd");
    println!("configured via CHENGIS_* environment variables (CHENGIS_BIND_ADDR, CHENGIS_WORKSPACE_ROOT, ...)");
    Ok(())
}
