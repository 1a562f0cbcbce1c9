// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The data form: a nested keyed record (HCL or JSON) mapping directly onto
//! `chengis_core::Pipeline`. This is what a `Chengisfile` is written in.
//!
//! HCL's `stage "name" { ... }` and `step "name" { ... }` labeled blocks
//! deserialize as maps keyed by label; the JSON form instead gives plain
//! arrays with an explicit `name` field on each entry. Both are accepted
//! through the same field via a visitor that branches on `visit_seq` vs
//! `visit_map`, the way a config loader accepting both HCL's labeled
//! blocks and TOML's arrays-of-tables for the same field would.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;

use chengis_core::{
    Condition, Credentials, NotifierConfig, Parameter, ParameterKind, Pipeline, PipelineBuilder,
    PostHooks, ShellPayload, Source, Stage, Step, StepPayload, Violation,
};

use crate::error::LoadError;

/// Which concrete syntax a data-form document is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Hcl,
    Json,
}

/// Parse a data-form document into a `Pipeline`.
///
/// The name isn't part of the document: a Chengisfile override substitutes
/// for an already-registered pipeline, so the caller (the server-side job
/// table, or the workspace override loader) supplies the name it already
/// knows rather than the document redeclaring it.
pub fn load_data_form(
    content: &str,
    name: impl Into<String>,
    format: DataFormat,
) -> Result<Pipeline, LoadError> {
    let name = name.into();
    tracing::debug!(pipeline = %name, ?format, "loading data-form pipeline");
    let doc: PipelineDoc = match format {
        DataFormat::Hcl => hcl::from_str(content)?,
        DataFormat::Json => serde_json::from_str(content)?,
    };
    build_pipeline(name, doc)
}

/// Convenience entry point for the dedicated `.chengis.hcl` / `Chengisfile`
/// form (always HCL).
pub fn load_chengisfile(content: &str, name: impl Into<String>) -> Result<Pipeline, LoadError> {
    load_data_form(content, name, DataFormat::Hcl)
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PipelineDoc {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    source: Option<SourceDoc>,
    #[serde(default, alias = "parameter", deserialize_with = "labeled_or_seq")]
    parameters: Vec<ParameterDoc>,
    #[serde(default, alias = "stage", deserialize_with = "labeled_or_seq")]
    stages: Vec<StageDoc>,
    #[serde(default)]
    post: PostDoc,
    #[serde(default)]
    artifacts: Vec<String>,
    #[serde(default, alias = "notifier", deserialize_with = "labeled_or_seq")]
    notify: Vec<NotifyDoc>,
}

#[derive(Debug, Clone, Deserialize)]
struct SourceDoc {
    url: String,
    #[serde(default)]
    branch: Option<String>,
    #[serde(default)]
    depth: Option<u32>,
    #[serde(default)]
    credentials: Option<CredentialsDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum CredentialsDoc {
    SshKey { key: String },
    Token { token: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ParameterDoc {
    #[serde(default)]
    name: String,
    #[serde(default = "default_param_type", rename = "type")]
    kind: String,
    #[serde(default)]
    default: String,
    #[serde(default)]
    choices: Vec<String>,
}

fn default_param_type() -> String {
    "string".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
struct StageDoc {
    #[serde(default)]
    name: String,
    #[serde(default)]
    parallel: bool,
    #[serde(default)]
    parallelism: Option<usize>,
    #[serde(default, alias = "step", deserialize_with = "labeled_or_seq")]
    steps: Vec<StepDoc>,
    #[serde(default)]
    condition: Option<RawCondition>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct StepDoc {
    #[serde(default)]
    name: String,
    #[serde(default = "default_step_type", rename = "type")]
    step_type: String,
    #[serde(default)]
    run: Option<String>,
    #[serde(default)]
    dir: Option<String>,
    #[serde(default)]
    timeout: Option<u64>,
    #[serde(default)]
    env: HashMap<String, String>,
    #[serde(default)]
    payload: Option<serde_json::Value>,
    #[serde(default)]
    condition: Option<RawCondition>,
}

fn default_step_type() -> String {
    "shell".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PostDoc {
    #[serde(default, deserialize_with = "labeled_or_seq")]
    always: Vec<StepDoc>,
    #[serde(default, rename = "on-success", deserialize_with = "labeled_or_seq")]
    on_success: Vec<StepDoc>,
    #[serde(default, rename = "on-failure", deserialize_with = "labeled_or_seq")]
    on_failure: Vec<StepDoc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct NotifyDoc {
    #[serde(default)]
    tag: String,
    #[serde(default)]
    config: serde_json::Value,
}

/// Condition keys as actually written in a document. Only
/// `condition-type`/`condition-value` are canonical; `type`/`value` is the
/// source model's acknowledged-bug spelling and is rejected rather than
/// silently accepted.
#[derive(Debug, Clone, Default, Deserialize)]
struct RawCondition {
    #[serde(default, rename = "condition-type")]
    condition_type: Option<String>,
    #[serde(default, rename = "condition-value")]
    condition_value: Option<String>,
    #[serde(default)]
    key: Option<String>,
    #[serde(default, rename = "type")]
    legacy_type: Option<serde_json::Value>,
    #[serde(default, rename = "value")]
    legacy_value: Option<serde_json::Value>,
}

/// A field that may be written as a sequence of explicitly-named records
/// (JSON: `[{name: "a", ...}, ...]`) or as a map of labeled blocks (HCL:
/// `step "a" { ... }`).
fn labeled_or_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Named,
{
    struct LabeledOrSeqVisitor<T>(std::marker::PhantomData<T>);

    impl<'de, T> Visitor<'de> for LabeledOrSeqVisitor<T>
    where
        T: Deserialize<'de> + Named,
    {
        type Value = Vec<T>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a sequence of records or a map of labeled blocks")
        }

        fn visit_seq<S>(self, seq: S) -> Result<Vec<T>, S::Error>
        where
            S: SeqAccess<'de>,
        {
            Vec::deserialize(de::value::SeqAccessDeserializer::new(seq))
        }

        fn visit_map<M>(self, map: M) -> Result<Vec<T>, M::Error>
        where
            M: MapAccess<'de>,
        {
            let index_map: IndexMap<String, T> =
                IndexMap::deserialize(de::value::MapAccessDeserializer::new(map))?;
            Ok(index_map
                .into_iter()
                .map(|(label, mut item)| {
                    if item.name().is_empty() {
                        item.set_name(label);
                    }
                    item
                })
                .collect())
        }
    }

    deserializer.deserialize_any(LabeledOrSeqVisitor(std::marker::PhantomData))
}

trait Named {
    fn name(&self) -> &str;
    fn set_name(&mut self, name: String);
}

impl Named for StageDoc {
    fn name(&self) -> &str {
        &self.name
    }
    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

impl Named for StepDoc {
    fn name(&self) -> &str {
        &self.name
    }
    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

impl Named for ParameterDoc {
    fn name(&self) -> &str {
        &self.name
    }
    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

impl Named for NotifyDoc {
    fn name(&self) -> &str {
        &self.tag
    }
    fn set_name(&mut self, name: String) {
        self.tag = name;
    }
}

fn build_pipeline(name: String, doc: PipelineDoc) -> Result<Pipeline, LoadError> {
    let mut violations = Vec::new();

    let source = doc.source.map(|s| Source {
        url: s.url,
        branch: s.branch,
        depth: s.depth,
        credentials: s.credentials.map(|c| match c {
            CredentialsDoc::SshKey { key } => Credentials::SshKey { key },
            CredentialsDoc::Token { token } => Credentials::Token { token },
        }),
    });

    let parameters = doc
        .parameters
        .into_iter()
        .map(|p| Parameter {
            name: p.name,
            kind: if p.kind == "choice" {
                ParameterKind::Choice
            } else {
                ParameterKind::String
            },
            default: p.default,
            choices: p.choices,
        })
        .collect();

    let mut stages = Vec::with_capacity(doc.stages.len());
    for stage in doc.stages {
        stages.push(build_stage(stage, &mut violations)?);
    }

    let post = PostHooks {
        always: build_steps(doc.post.always, &mut violations)?,
        on_success: build_steps(doc.post.on_success, &mut violations)?,
        on_failure: build_steps(doc.post.on_failure, &mut violations)?,
    };

    let notifiers = doc
        .notify
        .into_iter()
        .map(|n| NotifierConfig {
            tag: n.tag,
            config: n.config,
        })
        .collect();

    let mut builder = PipelineBuilder::new(name).post(post).artifacts(doc.artifacts);
    if let Some(source) = source {
        builder = builder.source(source);
    }
    if let Some(description) = doc.description {
        builder = builder.description(description);
    }
    for parameter in parameters {
        builder = builder.parameter(parameter);
    }
    for notifier in notifiers {
        builder = builder.notifier(notifier);
    }
    for stage in stages.drain(..) {
        builder = builder.stage(stage);
    }

    match builder.build() {
        Ok(pipeline) if violations.is_empty() => Ok(pipeline),
        Ok(_) => Err(LoadError::Invalid(chengis_core::InvalidPipeline { violations })),
        Err(chengis_core::InvalidPipeline { violations: mut rest }) => {
            violations.append(&mut rest);
            Err(LoadError::Invalid(chengis_core::InvalidPipeline { violations }))
        }
    }
}

fn build_stage(doc: StageDoc, violations: &mut Vec<Violation>) -> Result<Stage, LoadError> {
    let location = format!("stage.{}", doc.name);
    let condition = resolve_condition(doc.condition, &location, violations)?;
    let steps = build_steps(doc.steps, violations)?;
    Ok(Stage {
        name: doc.name,
        parallel: doc.parallel,
        parallelism: doc.parallelism,
        steps,
        condition,
    })
}

fn build_steps(docs: Vec<StepDoc>, violations: &mut Vec<Violation>) -> Result<Vec<Step>, LoadError> {
    docs.into_iter().map(|s| build_step(s, violations)).collect()
}

fn build_step(doc: StepDoc, violations: &mut Vec<Violation>) -> Result<Step, LoadError> {
    let location = format!("step.{}", doc.name);
    let condition = resolve_condition(doc.condition, &location, violations)?;

    let payload = if doc.step_type == "shell" {
        StepPayload::Shell(ShellPayload {
            command: doc.run.unwrap_or_default(),
            dir: doc.dir,
            env: doc.env,
            timeout_ms: doc.timeout,
        })
    } else {
        StepPayload::Opaque(doc.payload.unwrap_or(serde_json::Value::Null))
    };

    Ok(Step {
        name: doc.name,
        step_type: doc.step_type,
        payload,
        condition,
    })
}

fn resolve_condition(
    raw: Option<RawCondition>,
    location: &str,
    violations: &mut Vec<Violation>,
) -> Result<Option<Condition>, LoadError> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    if let Some(bad) = raw.legacy_type.as_ref().map(|_| "type") {
        violations.push(Violation::UnknownConditionKey {
            location: location.to_string(),
            key: bad.to_string(),
        });
    }
    if let Some(bad) = raw.legacy_value.as_ref().map(|_| "value") {
        violations.push(Violation::UnknownConditionKey {
            location: location.to_string(),
            key: bad.to_string(),
        });
    }

    match raw.condition_type.as_deref() {
        Some("branch") => {
            let value = raw.condition_value.ok_or_else(|| {
                LoadError::invalid_format(location, "branch condition requires condition-value")
            })?;
            Ok(Some(Condition::Branch { value }))
        }
        Some("param") => {
            let key = raw
                .key
                .ok_or_else(|| LoadError::invalid_format(location, "param condition requires key"))?;
            let value = raw.condition_value.ok_or_else(|| {
                LoadError::invalid_format(location, "param condition requires condition-value")
            })?;
            Ok(Some(Condition::Param { key, value }))
        }
        Some("always") | None => Ok(Some(Condition::Always)),
        Some(other) => Err(LoadError::invalid_format(
            location,
            format!("unknown condition-type '{other}'"),
        )),
    }
}

#[cfg(test)]
#[path = "data_form_tests.rs"]
mod tests;
