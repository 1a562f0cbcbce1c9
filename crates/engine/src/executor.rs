// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Walks a `Pipeline`'s stage/step tree for one `Build`: evaluates
//! conditions, fans parallel stages out over a `JoinSet`, enforces per-step
//! timeouts and cancellation, runs post-hooks, collects artifacts, and
//! invokes notifiers. Emits a `chengis_core::Event` at every state change so
//! the daemon and CLI can follow a build without polling.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use chengis_core::{
    ArtifactRecord, Build, BuildId, BuildResult, BuildStatus, CancelToken, Event, GitInfo, Pipeline,
    Stage, StageResult, StageStatus, Step, StepPayload, StepResult, StepStatus,
};
use chengis_plugins::context::EpochClock;
use chengis_plugins::{ExecuteError, NotifierOutcome, PluginRegistry, StepContext};

use crate::condition::{evaluate, ConditionContext};
use crate::workspace::WorkspaceManager;

/// Everything a single step run needs, cheap to clone so a `JoinSet` task
/// can own it independently of the stage loop that spawned it.
#[derive(Clone)]
struct StepRunParams {
    plugins: Arc<PluginRegistry>,
    clock: Arc<dyn EpochClock>,
    output_cap_bytes: usize,
    cancel_grace_ms: u64,
    workspace_path: PathBuf,
    base_env: HashMap<String, String>,
    events: mpsc::UnboundedSender<Event>,
    build_id: BuildId,
    stage_name: String,
    stage_parallelism_cap: Option<usize>,
}

/// Runs a single `Build` to completion against a resolved `Pipeline`.
pub struct BuildExecutor {
    plugins: Arc<PluginRegistry>,
    workspace_manager: WorkspaceManager,
    clock: Arc<dyn EpochClock>,
    output_cap_bytes: usize,
    cancel_grace_ms: u64,
    stage_parallelism_cap: Option<usize>,
    events: mpsc::UnboundedSender<Event>,
}

impl BuildExecutor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        plugins: Arc<PluginRegistry>,
        workspace_manager: WorkspaceManager,
        clock: Arc<dyn EpochClock>,
        output_cap_bytes: usize,
        cancel_grace_ms: u64,
        stage_parallelism_cap: Option<usize>,
        events: mpsc::UnboundedSender<Event>,
    ) -> Self {
        Self {
            plugins,
            workspace_manager,
            clock,
            output_cap_bytes,
            cancel_grace_ms,
            stage_parallelism_cap,
            events,
        }
    }

    /// Run `pipeline` for `build`, mutating `build`'s status as it goes and
    /// returning the terminal `BuildResult`.
    pub async fn execute(
        &self,
        build: &mut Build,
        pipeline: &Pipeline,
        cancel: CancelToken,
    ) -> BuildResult {
        let started_at_ms = self.clock.epoch_ms();
        let _ = build.transition(BuildStatus::Running, started_at_ms);
        self.emit(Event::BuildStarted {
            build_id: build.id.clone(),
            job_id: build.job_id.clone(),
            at_ms: started_at_ms,
        });

        let workspace = match self.workspace_manager.prepare(
            build.id.as_str(),
            &pipeline.name,
            pipeline.source.as_ref(),
        ) {
            Ok(workspace) => workspace,
            Err(err) => return self.fail_before_any_stage(build, &err.to_string()),
        };

        let pipeline = workspace.pipeline_override.as_ref().unwrap_or(pipeline);
        let base_env = self.base_env(build, workspace.git_info.as_ref());
        let params = build.config.params.clone();

        let mut stage_results = Vec::with_capacity(pipeline.stages.len());
        let mut any_stage_failed = false;
        let mut aborted = cancel.is_cancelled();

        for stage in &pipeline.stages {
            let cond_ctx = ConditionContext {
                branch: workspace.git_info.as_ref().map(|g| g.branch.as_str()),
                params: &params,
            };

            if aborted {
                stage_results.push(self.skipped_stage(stage, "build cancelled"));
                continue;
            }

            let gate = stage
                .condition
                .as_ref()
                .map(|c| evaluate(c, &cond_ctx))
                .unwrap_or(true);
            if !gate {
                self.emit(Event::StageSkipped {
                    build_id: build.id.clone(),
                    stage_name: stage.name.clone(),
                    reason: "condition evaluated to false".to_string(),
                });
                stage_results.push(self.skipped_stage(stage, "condition evaluated to false"));
                continue;
            }

            let stage_started_at_ms = self.clock.epoch_ms();
            self.emit(Event::StageStarted {
                build_id: build.id.clone(),
                stage_name: stage.name.clone(),
                at_ms: stage_started_at_ms,
            });

            let run_params = self.step_run_params(build, stage.name.clone(), &base_env, &workspace.path);
            let steps = if stage.parallel {
                run_parallel(&run_params, stage, &cond_ctx, &cancel).await
            } else {
                run_sequential(&run_params, stage, &cond_ctx, &cancel).await
            };

            let stage_finished_at_ms = self.clock.epoch_ms();
            let status = aggregate_stage_status(&steps);
            if matches!(status, StageStatus::Failure) {
                any_stage_failed = true;
            }
            if matches!(status, StageStatus::Aborted) {
                aborted = true;
            }

            self.emit(Event::StageCompleted {
                build_id: build.id.clone(),
                stage_name: stage.name.clone(),
                status,
                at_ms: stage_finished_at_ms,
            });
            stage_results.push(StageResult {
                stage_name: stage.name.clone(),
                status,
                steps,
                started_at_ms: stage_started_at_ms,
                finished_at_ms: stage_finished_at_ms,
            });
        }

        let main_status = if aborted {
            BuildStatus::Aborted
        } else if any_stage_failed {
            BuildStatus::Failure
        } else {
            BuildStatus::Success
        };

        let cond_ctx = ConditionContext {
            branch: workspace.git_info.as_ref().map(|g| g.branch.as_str()),
            params: &params,
        };
        self.run_post_hooks(
            build,
            pipeline,
            main_status,
            &cond_ctx,
            &base_env,
            &workspace.path,
            &cancel,
            &mut stage_results,
        )
        .await;

        let artifacts = collect_artifacts(&workspace.path, &pipeline.artifacts);

        let finished_at_ms = self.clock.epoch_ms();
        let _ = build.transition(main_status, finished_at_ms);

        let result = BuildResult {
            build_id: build.id.clone(),
            job_id: build.job_id.clone(),
            build_number: build.build_number,
            status: main_status,
            parameters: build.config.params.clone(),
            git_info: workspace.git_info.clone(),
            stage_results,
            artifacts,
            started_at_ms: build.started_at_ms,
            completed_at_ms: build.finished_at_ms,
        };

        self.run_notifiers(pipeline, &result).await;

        self.emit(Event::BuildCompleted {
            build_id: build.id.clone(),
            job_id: build.job_id.clone(),
            status: main_status,
            at_ms: finished_at_ms,
        });

        self.workspace_manager.remove(&workspace);

        result
    }

    fn fail_before_any_stage(&self, build: &mut Build, reason: &str) -> BuildResult {
        tracing::error!(build_id = %build.id, reason, "workspace checkout failed, failing build");
        let at_ms = self.clock.epoch_ms();
        let _ = build.transition(BuildStatus::Failure, at_ms);
        self.emit(Event::BuildCompleted {
            build_id: build.id.clone(),
            job_id: build.job_id.clone(),
            status: BuildStatus::Failure,
            at_ms,
        });
        BuildResult {
            build_id: build.id.clone(),
            job_id: build.job_id.clone(),
            build_number: build.build_number,
            status: BuildStatus::Failure,
            parameters: build.config.params.clone(),
            git_info: None,
            stage_results: Vec::new(),
            artifacts: Vec::new(),
            started_at_ms: build.started_at_ms,
            completed_at_ms: build.finished_at_ms,
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_post_hooks(
        &self,
        build: &Build,
        pipeline: &Pipeline,
        main_status: BuildStatus,
        cond_ctx: &ConditionContext<'_>,
        base_env: &HashMap<String, String>,
        workspace_path: &Path,
        cancel: &CancelToken,
        stage_results: &mut Vec<StageResult>,
    ) {
        if let Some(result) = self
            .run_post_section(
                build,
                "post.always",
                &pipeline.post.always,
                cond_ctx,
                base_env,
                workspace_path,
                cancel,
            )
            .await
        {
            stage_results.push(result);
        }

        let section = match main_status {
            BuildStatus::Success => Some(("post.on-success", &pipeline.post.on_success)),
            BuildStatus::Failure => Some(("post.on-failure", &pipeline.post.on_failure)),
            _ => None,
        };
        if let Some((label, steps)) = section {
            if let Some(result) = self
                .run_post_section(build, label, steps, cond_ctx, base_env, workspace_path, cancel)
                .await
            {
                stage_results.push(result);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_post_section(
        &self,
        build: &Build,
        label: &str,
        steps: &[Step],
        cond_ctx: &ConditionContext<'_>,
        base_env: &HashMap<String, String>,
        workspace_path: &Path,
        cancel: &CancelToken,
    ) -> Option<StageResult> {
        if steps.is_empty() {
            return None;
        }
        let started_at_ms = self.clock.epoch_ms();
        let params = self.step_run_params(build, label.to_string(), base_env, workspace_path);

        let mut results = Vec::with_capacity(steps.len());
        for step in steps {
            results.push(run_one_step(&params, step.clone(), cond_ctx, cancel.clone()).await);
        }

        let finished_at_ms = self.clock.epoch_ms();
        Some(StageResult {
            stage_name: label.to_string(),
            status: aggregate_stage_status(&results),
            steps: results,
            started_at_ms,
            finished_at_ms,
        })
    }

    async fn run_notifiers(&self, pipeline: &Pipeline, result: &BuildResult) {
        for notifier_cfg in &pipeline.notifiers {
            let outcome = match self.plugins.notifier(&notifier_cfg.tag) {
                Some(notifier) => notifier.send(result, &notifier_cfg.config).await,
                None => NotifierOutcome::Failed {
                    details: format!("no notifier registered for tag '{}'", notifier_cfg.tag),
                },
            };
            if let NotifierOutcome::Failed { details } = outcome {
                tracing::warn!(notifier = %notifier_cfg.tag, details, "notifier failed");
                self.emit(Event::NotifierFailed {
                    build_id: result.build_id.clone(),
                    notifier_tag: notifier_cfg.tag.clone(),
                    reason: details,
                });
            }
        }
    }

    fn skipped_stage(&self, stage: &Stage, reason: &str) -> StageResult {
        let at_ms = self.clock.epoch_ms();
        let steps = stage
            .steps
            .iter()
            .map(|step| skipped_step(step, reason, at_ms))
            .collect();
        StageResult {
            stage_name: stage.name.clone(),
            status: StageStatus::Skipped,
            steps,
            started_at_ms: at_ms,
            finished_at_ms: at_ms,
        }
    }

    fn step_run_params(
        &self,
        build: &Build,
        stage_name: String,
        base_env: &HashMap<String, String>,
        workspace_path: &Path,
    ) -> StepRunParams {
        StepRunParams {
            plugins: self.plugins.clone(),
            clock: self.clock.clone(),
            output_cap_bytes: self.output_cap_bytes,
            cancel_grace_ms: self.cancel_grace_ms,
            workspace_path: workspace_path.to_path_buf(),
            base_env: base_env.clone(),
            events: self.events.clone(),
            build_id: build.id.clone(),
            stage_name,
            stage_parallelism_cap: self.stage_parallelism_cap,
        }
    }

    fn base_env(&self, build: &Build, git_info: Option<&GitInfo>) -> HashMap<String, String> {
        let mut env: HashMap<String, String> = std::env::vars().collect();
        env.insert("CHENGIS_BUILD_ID".to_string(), build.id.as_str().to_string());
        env.insert("CHENGIS_JOB_ID".to_string(), build.job_id.as_str().to_string());
        env.insert("CHENGIS_BUILD_NUMBER".to_string(), build.build_number.to_string());
        for (key, value) in &build.config.params {
            env.insert(key.clone(), value.clone());
        }
        if let Some(git_info) = git_info {
            for (key, value) in git_info.as_env_vars() {
                env.insert(key, value);
            }
        }
        env
    }

    fn emit(&self, event: Event) {
        let _ = self.events.send(event);
    }
}

/// Sequential steps short-circuit: once a step fails (or is itself aborted),
/// every remaining step in the stage is marked skipped without evaluating
/// its condition.
async fn run_sequential(
    params: &StepRunParams,
    stage: &Stage,
    cond_ctx: &ConditionContext<'_>,
    cancel: &CancelToken,
) -> Vec<StepResult> {
    let mut results = Vec::with_capacity(stage.steps.len());
    let mut short_circuit = false;

    for step in &stage.steps {
        if short_circuit {
            results.push(skipped_step(step, "a previous step in this stage failed", params.clock.epoch_ms()));
            continue;
        }

        let result = run_one_step(params, step.clone(), cond_ctx, cancel.clone()).await;
        if !result.status.is_success() {
            short_circuit = true;
        }
        results.push(result);
    }

    results
}

/// Parallel steps run concurrently, bounded by the stage's own
/// `parallelism` (falling back to the process-wide default), with no
/// short-circuit on the first failure within the group.
async fn run_parallel(
    params: &StepRunParams,
    stage: &Stage,
    cond_ctx: &ConditionContext<'_>,
    cancel: &CancelToken,
) -> Vec<StepResult> {
    let cap = stage
        .parallelism
        .or(params.stage_parallelism_cap)
        .unwrap_or(stage.steps.len().max(1));
    let semaphore = Arc::new(Semaphore::new(cap.max(1)));
    let mut join_set = JoinSet::new();

    for (index, step) in stage.steps.iter().enumerate() {
        let params = params.clone();
        let step = step.clone();
        let branch = cond_ctx.branch.map(str::to_string);
        let cond_params = cond_ctx.params.clone();
        let cancel = cancel.clone();
        let semaphore = semaphore.clone();

        join_set.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            let local_ctx = ConditionContext {
                branch: branch.as_deref(),
                params: &cond_params,
            };
            let result = run_one_step(&params, step, &local_ctx, cancel).await;
            (index, result)
        });
    }

    let mut indexed = Vec::with_capacity(stage.steps.len());
    while let Some(outcome) = join_set.join_next().await {
        if let Ok(pair) = outcome {
            indexed.push(pair);
        }
    }
    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, result)| result).collect()
}

async fn run_one_step(
    params: &StepRunParams,
    step: Step,
    cond_ctx: &ConditionContext<'_>,
    cancel: CancelToken,
) -> StepResult {
    if cancel.is_cancelled() {
        return skipped_step(&step, "build cancelled", params.clock.epoch_ms());
    }
    if let Some(condition) = &step.condition {
        if !evaluate(condition, cond_ctx) {
            return skipped_step(&step, "condition evaluated to false", params.clock.epoch_ms());
        }
    }

    let started_at_ms = params.clock.epoch_ms();
    let _ = params.events.send(Event::StepStarted {
        build_id: params.build_id.clone(),
        stage_name: params.stage_name.clone(),
        step_name: step.name.clone(),
        at_ms: started_at_ms,
    });

    let result = match params.plugins.step_executor(&step.step_type) {
        Some(executor) => {
            let ctx = StepContext {
                workspace: params.workspace_path.clone(),
                env: merged_env(&params.base_env, &step),
                cancel,
                output_cap_bytes: params.output_cap_bytes,
                cancel_grace_ms: params.cancel_grace_ms,
                clock: params.clock.clone(),
            };
            match executor.execute(&step, &ctx).await {
                Ok(result) => result,
                Err(err) => execute_error_result(&step, &err, params.clock.epoch_ms()),
            }
        }
        None => execute_error_result(
            &step,
            &ExecuteError::UnknownStepType(step.step_type.clone()),
            params.clock.epoch_ms(),
        ),
    };

    let _ = params.events.send(Event::StepCompleted {
        build_id: params.build_id.clone(),
        stage_name: params.stage_name.clone(),
        step_name: step.name.clone(),
        status: result.status,
        at_ms: result.finished_at_ms,
    });

    result
}

fn merged_env(base_env: &HashMap<String, String>, step: &Step) -> HashMap<String, String> {
    let mut env = base_env.clone();
    if let StepPayload::Shell(payload) = &step.payload {
        for (key, value) in &payload.env {
            env.insert(key.clone(), value.clone());
        }
    }
    env
}

fn skipped_step(step: &Step, reason: &str, at_ms: u64) -> StepResult {
    tracing::debug!(step = %step.name, reason, "step skipped");
    StepResult {
        step_name: step.name.clone(),
        status: StepStatus::Skipped,
        exit_code: None,
        stdout: String::new(),
        stderr: String::new(),
        started_at_ms: at_ms,
        finished_at_ms: at_ms,
        output_truncated: false,
    }
}

fn execute_error_result(step: &Step, err: &ExecuteError, at_ms: u64) -> StepResult {
    tracing::error!(step = %step.name, error = %err, "step executor error");
    StepResult {
        step_name: step.name.clone(),
        status: StepStatus::Failure,
        exit_code: None,
        stdout: String::new(),
        stderr: err.to_string(),
        started_at_ms: at_ms,
        finished_at_ms: at_ms,
        output_truncated: false,
    }
}

/// Like `chengis_core::result::StageResult::aggregate_status`, but
/// distinguishes "every step was skipped" (stage status `Skipped`) from
/// "every step ran and succeeded" (stage status `Success`). The core
/// helper folds both into `Success`, which is right for its own call sites
/// but not for this one.
fn aggregate_stage_status(steps: &[StepResult]) -> StageStatus {
    if steps.iter().any(|s| matches!(s.status, StepStatus::Aborted)) {
        StageStatus::Aborted
    } else if steps
        .iter()
        .any(|s| matches!(s.status, StepStatus::Failure | StepStatus::Timeout))
    {
        StageStatus::Failure
    } else if steps.iter().all(|s| matches!(s.status, StepStatus::Skipped)) {
        StageStatus::Skipped
    } else {
        StageStatus::Success
    }
}

fn collect_artifacts(workspace_root: &Path, patterns: &[String]) -> Vec<ArtifactRecord> {
    let mut artifacts = Vec::new();
    for pattern in patterns {
        let full_pattern = workspace_root.join(pattern);
        let Some(full_pattern) = full_pattern.to_str() else {
            continue;
        };
        let Ok(entries) = glob::glob(full_pattern) else {
            continue;
        };
        for entry in entries.flatten() {
            let Ok(metadata) = std::fs::metadata(&entry) else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            let relative = entry.strip_prefix(workspace_root).unwrap_or(&entry);
            artifacts.push(ArtifactRecord {
                path: relative.to_string_lossy().into_owned(),
                size_bytes: metadata.len(),
            });
        }
    }
    artifacts
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
