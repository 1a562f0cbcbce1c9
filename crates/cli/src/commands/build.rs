// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `build trigger` / `build cancel` / `build show` subcommands.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::client::DaemonClient;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct BuildArgs {
    #[command(subcommand)]
    pub command: BuildCommand,
}

#[derive(Subcommand)]
pub enum BuildCommand {
    /// Trigger a build of a registered job
    Trigger {
        /// Name of the registered job
        job_name: String,
        /// Org the job is registered under
        #[arg(long)]
        org: Option<String>,
        /// Parameter override, repeatable: --param key=value
        #[arg(long = "param", value_parser = parse_key_value)]
        param: Vec<(String, String)>,
        /// Labels the agent must carry, repeatable
        #[arg(long = "label")]
        label: Vec<String>,
        /// CPU count the agent must have free
        #[arg(long, default_value_t = 0)]
        cpu: u32,
        /// Scheduling priority; higher runs first when queued
        #[arg(long, default_value_t = 0)]
        priority: i32,
    },
    /// Request cancellation of a running or queued build
    Cancel {
        /// Build ID
        build_id: String,
    },
    /// Show a build's current state or final result
    Show {
        /// Build ID
        build_id: String,
    },
}

pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) => Ok((k.to_string(), v.to_string())),
        None => Err(format!("expected key=value, got '{s}'")),
    }
}

pub async fn run(client: &DaemonClient, args: BuildArgs, format: OutputFormat) -> Result<()> {
    match args.command {
        BuildCommand::Trigger {
            job_name,
            org,
            param,
            label,
            cpu,
            priority,
        } => trigger(client, job_name, org, param, label, cpu, priority, format).await,
        BuildCommand::Cancel { build_id } => cancel(client, &build_id).await,
        BuildCommand::Show { build_id } => show(client, &build_id, format).await,
    }
}

#[allow(clippy::too_many_arguments)]
async fn trigger(
    client: &DaemonClient,
    job_name: String,
    org: Option<String>,
    param: Vec<(String, String)>,
    label: Vec<String>,
    cpu: u32,
    priority: i32,
    format: OutputFormat,
) -> Result<()> {
    let response = client
        .trigger_build(crate::client::TriggerBuildRequest {
            job_name,
            org_id: org,
            params: param.into_iter().collect(),
            triggered_by: std::env::var("USER").ok(),
            required_labels: label.into_iter().collect(),
            cpu_count: cpu,
            priority,
        })
        .await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&response)?),
        OutputFormat::Text => println!(
            "build {} (#{}) -> {:?}",
            response.build_id, response.build_number, response.mode
        ),
    }
    Ok(())
}

async fn cancel(client: &DaemonClient, build_id: &str) -> Result<()> {
    client.cancel_build(build_id).await?;
    println!("cancellation requested for {build_id}");
    Ok(())
}

async fn show(client: &DaemonClient, build_id: &str, format: OutputFormat) -> Result<()> {
    let view = client.show_build(build_id).await?;
    match format {
        OutputFormat::Json => match &view {
            crate::client::BuildView::InFlight(build) => println!("{}", serde_json::to_string(build)?),
            crate::client::BuildView::Finished(result) => println!("{}", serde_json::to_string(result)?),
        },
        OutputFormat::Text => match &view {
            crate::client::BuildView::InFlight(build) => {
                println!("{} is {:?} (in flight)", build.id, build.status);
            }
            crate::client::BuildView::Finished(result) => {
                println!("{} finished: {:?}", result.build_id, result.status);
                for stage in &result.stage_results {
                    println!("  stage {}: {:?}", stage.stage_name, stage.status);
                }
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_key_value_splits_on_first_equals() {
        assert_eq!(
            parse_key_value("branch=main=staging").unwrap(),
            ("branch".to_string(), "main=staging".to_string())
        );
    }

    #[test]
    fn parse_key_value_rejects_missing_equals() {
        assert!(parse_key_value("branch").is_err());
    }
}
