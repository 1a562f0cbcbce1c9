// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `agent list` / `agent register` subcommands.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::client::{DaemonClient, RegisterAgentRequest};
use crate::output::OutputFormat;

#[derive(Args)]
pub struct AgentArgs {
    #[command(subcommand)]
    pub command: AgentCommand,
}

#[derive(Subcommand)]
pub enum AgentCommand {
    /// List registered agents and their current load
    List,
    /// Register a remote build agent
    Register {
        /// Unique agent identifier
        agent_id: String,
        /// Base URL the dispatcher POSTs `/dispatch` to
        endpoint: String,
        /// Labels this agent satisfies, repeatable
        #[arg(long = "label")]
        label: Vec<String>,
        /// Org this agent is scoped to
        #[arg(long)]
        org: Option<String>,
        /// Maximum concurrent builds this agent accepts
        #[arg(long, default_value_t = 1)]
        max_builds: u32,
        /// CPU count available on this agent
        #[arg(long, default_value_t = 1)]
        cpu: u32,
    },
}

pub async fn run(client: &DaemonClient, args: AgentArgs, format: OutputFormat) -> Result<()> {
    match args.command {
        AgentCommand::List => list(client, format).await,
        AgentCommand::Register {
            agent_id,
            endpoint,
            label,
            org,
            max_builds,
            cpu,
        } => register(client, agent_id, endpoint, label, org, max_builds, cpu).await,
    }
}

async fn list(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let agents = client.list_agents().await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&agents)?),
        OutputFormat::Text => {
            if agents.is_empty() {
                println!("no agents registered");
            }
            for agent in &agents {
                println!(
                    "{}  {}/{} builds  {}  {}",
                    agent.agent_id, agent.current_builds, agent.max_builds, agent.circuit_state, agent.endpoint
                );
            }
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn register(
    client: &DaemonClient,
    agent_id: String,
    endpoint: String,
    label: Vec<String>,
    org: Option<String>,
    max_builds: u32,
    cpu: u32,
) -> Result<()> {
    client
        .register_agent(RegisterAgentRequest {
            agent_id: agent_id.clone(),
            endpoint,
            labels: label.into_iter().collect(),
            org_id: org,
            max_builds,
            cpu_count: cpu,
            heartbeat_timeout_ms: None,
        })
        .await?;
    println!("agent {agent_id} registered");
    Ok(())
}
