// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `job create` / `job list` subcommands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use crate::client::{DaemonClient, RegisterJobRequest, RegisterOutcome};
use crate::output::OutputFormat;

#[derive(Args)]
pub struct JobArgs {
    #[command(subcommand)]
    pub command: JobCommand,
}

#[derive(Subcommand)]
pub enum JobCommand {
    /// Register a pipeline from a Chengisfile or a code-form file
    Create {
        /// Path to a `Chengisfile` (HCL) or `.pipeline` (code-form) file
        file: std::path::PathBuf,
        /// Org to register the job under
        #[arg(long)]
        org: Option<String>,
    },
    /// List registered jobs
    List,
}

pub async fn run(client: &DaemonClient, args: JobArgs, format: OutputFormat) -> Result<()> {
    match args.command {
        JobCommand::Create { file, org } => create(client, &file, org, format).await,
        JobCommand::List => list(client, format).await,
    }
}

async fn create(
    client: &DaemonClient,
    file: &std::path::Path,
    org: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let name = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("pipeline")
        .to_string();

    let pipeline = match file.extension().and_then(|e| e.to_str()) {
        Some("pipeline") => chengis_dsl::load_code_form(&content)?,
        _ => chengis_dsl::load_chengisfile(&content, name)?,
    };

    let outcome = client
        .register_job(RegisterJobRequest { org_id: org, pipeline })
        .await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(&OutcomeJson::from(outcome))?);
        }
        OutputFormat::Text => match outcome {
            RegisterOutcome::Created => println!("job created"),
            RegisterOutcome::Unchanged => println!("job unchanged (identical pipeline already registered)"),
            RegisterOutcome::Replaced => println!("job replaced (pipeline definition updated)"),
        },
    }
    Ok(())
}

#[derive(serde::Serialize)]
#[serde(rename_all = "snake_case")]
enum OutcomeJson {
    Created,
    Unchanged,
    Replaced,
}

impl From<RegisterOutcome> for OutcomeJson {
    fn from(value: RegisterOutcome) -> Self {
        match value {
            RegisterOutcome::Created => OutcomeJson::Created,
            RegisterOutcome::Unchanged => OutcomeJson::Unchanged,
            RegisterOutcome::Replaced => OutcomeJson::Replaced,
        }
    }
}

async fn list(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let jobs = client.list_jobs().await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&jobs)?),
        OutputFormat::Text => {
            if jobs.is_empty() {
                println!("no jobs registered");
            }
            for job in jobs {
                println!(
                    "{}{}  next_build={}  {}",
                    job.name,
                    job.org_id.map(|o| format!(" [{o}]")).unwrap_or_default(),
                    job.next_build_number,
                    job.description.unwrap_or_default(),
                );
            }
        }
    }
    Ok(())
}
