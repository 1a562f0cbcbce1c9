// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! chengis - CI pipeline CLI

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use client::DaemonClient;
use commands::{agent, build, daemon, job};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "chengis", version, about = "Chengis - a CI pipeline runner")]
struct Cli {
    /// Base URL of the chengisd to talk to
    #[arg(long, global = true, env = "CHENGIS_DAEMON_URL", default_value = "http://127.0.0.1:7420")]
    daemon_url: String,

    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Job (registered pipeline) management
    Job(job::JobArgs),
    /// Build management
    Build(build::BuildArgs),
    /// Agent management
    Agent(agent::AgentArgs),
    /// Daemon management
    Daemon(daemon::DaemonArgs),
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Daemon(args) => daemon::run(args),
        Commands::Job(args) => job::run(&DaemonClient::new(cli.daemon_url), args, cli.output).await,
        Commands::Build(args) => build::run(&DaemonClient::new(cli.daemon_url), args, cli.output).await,
        Commands::Agent(args) => agent::run(&DaemonClient::new(cli.daemon_url), args, cli.output).await,
    }
}
