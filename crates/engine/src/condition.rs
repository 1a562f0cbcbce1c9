// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Condition evaluation: resolves a `Stage`/`Step`'s gating `Condition`
//! against a build's resolved parameters and checkout branch. See
//! `chengis_core::pipeline::Condition` for the variants.

use std::collections::HashMap;

use chengis_core::Condition;

/// The facts a condition is evaluated against. Built once per build and
/// shared by every stage/step condition check within it.
pub struct ConditionContext<'a> {
    pub branch: Option<&'a str>,
    pub params: &'a HashMap<String, String>,
}

/// `{branch: X}` is true iff the build's branch equals X, exact match,
/// case-sensitive. `{param: K, V}` is true iff the resolved parameter K
/// equals V. `always` is always true. A missing branch (no Git source)
/// never satisfies a branch condition.
pub fn evaluate(condition: &Condition, ctx: &ConditionContext<'_>) -> bool {
    match condition {
        Condition::Always => true,
        Condition::Branch { value } => ctx.branch == Some(value.as_str()),
        Condition::Param { key, value } => ctx.params.get(key) == Some(value),
    }
}

#[cfg(test)]
#[path = "condition_tests.rs"]
mod tests;
