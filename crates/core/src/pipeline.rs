// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline data model: immutable, validated-at-construction definitions.
//!
//! Every type in this module is pure data. Nothing here executes a step or
//! touches the filesystem — that's `chengis-engine`'s job. This module's only
//! behavior is validation: turning a `PipelineBuilder` into a `Pipeline` is
//! the one place an invalid definition gets rejected, and rejection always
//! enumerates every violation found rather than stopping at the first one.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

/// A single condition-evaluation failure reason, reported with enough
/// location context to point a user at the offending stage/step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Violation {
    DuplicateStageName { name: String },
    DuplicateStepName { stage: String, name: String },
    EmptyStage { name: String },
    NonPositiveTimeout { stage: String, step: String },
    ChoiceDefaultNotInSet { parameter: String, default: String },
    BlankShellCommand { stage: String, step: String },
    UnknownConditionKey { location: String, key: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::DuplicateStageName { name } => {
                write!(f, "duplicate stage name '{name}'")
            }
            Violation::DuplicateStepName { stage, name } => {
                write!(f, "duplicate step name '{name}' in stage '{stage}'")
            }
            Violation::EmptyStage { name } => write!(f, "stage '{name}' has no steps"),
            Violation::NonPositiveTimeout { stage, step } => write!(
                f,
                "step '{step}' in stage '{stage}' has a non-positive timeout"
            ),
            Violation::ChoiceDefaultNotInSet { parameter, default } => write!(
                f,
                "parameter '{parameter}' default '{default}' is not one of its choices"
            ),
            Violation::BlankShellCommand { stage, step } => write!(
                f,
                "step '{step}' in stage '{stage}' has a blank shell command"
            ),
            Violation::UnknownConditionKey { location, key } => write!(
                f,
                "{location}: unknown condition key '{key}' (use condition-type/condition-value)"
            ),
        }
    }
}

/// Raised by `PipelineBuilder::build` when one or more violations are found.
/// Always enumerates every violation in one pass, never just the first.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid pipeline: {}", violations.iter().map(|v| v.to_string()).collect::<Vec<_>>().join("; "))]
pub struct InvalidPipeline {
    pub violations: Vec<Violation>,
}

/// `{branch: X}`, `{param: K, V}`, or `always` — evaluated against a running
/// build's context (see `chengis-engine::condition`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "condition-type", rename_all = "kebab-case")]
pub enum Condition {
    Branch { value: String },
    Param { key: String, value: String },
    Always,
}

impl Default for Condition {
    fn default() -> Self {
        Condition::Always
    }
}

/// Credentials for a Git source. Opaque payload — validated/used by whatever
/// secrets-manager integration a deployment wires in, never interpreted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Credentials {
    SshKey { key: String },
    Token { token: String },
}

/// A Git source for a pipeline's workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub url: String,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub depth: Option<u32>,
    #[serde(default)]
    pub credentials: Option<Credentials>,
}

/// Parameter type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    String,
    Choice,
}

/// A named, typed, defaulted pipeline input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    pub default: String,
    #[serde(default)]
    pub choices: Vec<String>,
}

/// The payload of a `shell` step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellPayload {
    pub command: String,
    #[serde(default)]
    pub dir: Option<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// Type-specific step payload. `Shell` is the only built-in payload shape;
/// every other step type (`docker`, `docker-compose`, plugin-defined types)
/// carries an opaque JSON payload interpreted by its `StepExecutor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepPayload {
    Shell(ShellPayload),
    Opaque(serde_json::Value),
}

impl Default for StepPayload {
    fn default() -> Self {
        StepPayload::Shell(ShellPayload::default())
    }
}

/// A single named action within a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    #[serde(default = "default_step_type")]
    pub step_type: String,
    #[serde(default)]
    pub payload: StepPayload,
    #[serde(default)]
    pub condition: Option<Condition>,
}

fn default_step_type() -> String {
    "shell".to_string()
}

impl Step {
    pub fn shell(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            step_type: "shell".to_string(),
            payload: StepPayload::Shell(ShellPayload {
                command: command.into(),
                ..Default::default()
            }),
            condition: None,
        }
    }

    pub fn is_shell(&self) -> bool {
        self.step_type == "shell"
    }

    pub fn shell_command(&self) -> Option<&str> {
        match &self.payload {
            StepPayload::Shell(p) => Some(p.command.as_str()),
            StepPayload::Opaque(_) => None,
        }
    }
}

/// Ordered container of steps with optional parallelism and a gating
/// condition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    #[serde(default)]
    pub parallel: bool,
    /// Cap on concurrently-running steps within this stage when `parallel`.
    /// `None` means unbounded (falls back to the process-wide default cap).
    #[serde(default)]
    pub parallelism: Option<usize>,
    pub steps: Vec<Step>,
    #[serde(default)]
    pub condition: Option<Condition>,
}

/// `always` / `on-success` / `on-failure` post-build hooks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostHooks {
    #[serde(default)]
    pub always: Vec<Step>,
    #[serde(default, rename = "on-success")]
    pub on_success: Vec<Step>,
    #[serde(default, rename = "on-failure")]
    pub on_failure: Vec<Step>,
}

impl PostHooks {
    pub fn is_empty(&self) -> bool {
        self.always.is_empty() && self.on_success.is_empty() && self.on_failure.is_empty()
    }
}

/// A notifier attached to a pipeline: tag (resolved against the plugin
/// registry) plus opaque, notifier-specific configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotifierConfig {
    pub tag: String,
    #[serde(default)]
    pub config: serde_json::Value,
}

/// Immutable, validated pipeline definition. The only way to obtain one is
/// through `PipelineBuilder::build`, which enumerates every violation found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source: Option<Source>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    pub stages: Vec<Stage>,
    #[serde(default)]
    pub post: PostHooks,
    #[serde(default)]
    pub artifacts: Vec<String>,
    #[serde(default)]
    pub notifiers: Vec<NotifierConfig>,
}

impl Pipeline {
    pub fn stage(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.name == name)
    }
}

/// Builder that accumulates a `Pipeline` definition and validates it all at
/// once. This is the only entry point for constructing a `Pipeline` —
/// both DSL surface syntaxes (code-form and data-form) funnel through it.
#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    name: String,
    description: Option<String>,
    source: Option<Source>,
    parameters: Vec<Parameter>,
    stages: Vec<Stage>,
    post: PostHooks,
    artifacts: Vec<String>,
    notifiers: Vec<NotifierConfig>,
}

impl PipelineBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn post(mut self, post: PostHooks) -> Self {
        self.post = post;
        self
    }

    pub fn artifacts(mut self, patterns: Vec<String>) -> Self {
        self.artifacts = patterns;
        self
    }

    pub fn notifier(mut self, notifier: NotifierConfig) -> Self {
        self.notifiers.push(notifier);
        self
    }

    /// Validate and produce a `Pipeline`, or every violation found.
    pub fn build(self) -> Result<Pipeline, InvalidPipeline> {
        let mut violations = Vec::new();

        let mut seen_stage_names = HashSet::new();
        for stage in &self.stages {
            if !seen_stage_names.insert(stage.name.clone()) {
                violations.push(Violation::DuplicateStageName {
                    name: stage.name.clone(),
                });
            }
            if stage.steps.is_empty() {
                violations.push(Violation::EmptyStage {
                    name: stage.name.clone(),
                });
            }

            let mut seen_step_names = HashSet::new();
            for step in &stage.steps {
                if !seen_step_names.insert(step.name.clone()) {
                    violations.push(Violation::DuplicateStepName {
                        stage: stage.name.clone(),
                        name: step.name.clone(),
                    });
                }

                if let StepPayload::Shell(shell) = &step.payload {
                    if shell.command.trim().is_empty() {
                        violations.push(Violation::BlankShellCommand {
                            stage: stage.name.clone(),
                            step: step.name.clone(),
                        });
                    }
                    if let Some(timeout) = shell.timeout_ms {
                        if timeout == 0 {
                            violations.push(Violation::NonPositiveTimeout {
                                stage: stage.name.clone(),
                                step: step.name.clone(),
                            });
                        }
                    }
                }
            }
        }

        for parameter in &self.parameters {
            if parameter.kind == ParameterKind::Choice
                && !parameter.choices.iter().any(|c| c == &parameter.default)
            {
                violations.push(Violation::ChoiceDefaultNotInSet {
                    parameter: parameter.name.clone(),
                    default: parameter.default.clone(),
                });
            }
        }

        if !violations.is_empty() {
            return Err(InvalidPipeline { violations });
        }

        Ok(Pipeline {
            name: self.name,
            description: self.description,
            source: self.source,
            parameters: self.parameters,
            stages: self.stages,
            post: self.post,
            artifacts: self.artifacts,
            notifiers: self.notifiers,
        })
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;