// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide registry mapping step-type/notifier tags to capabilities,
//! gated by a `PluginPolicy` at load time. Built-ins are always present;
//! written once at startup (or on an explicit reload), read lock-free
//! after that — the "global" feel is just initialization-once publication
//! threaded through a server context.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::builtin::{ConsoleNotifier, DockerComposeExecutor, DockerExecutor, ShellExecutor};
use crate::executor::StepExecutor;
use crate::notifier::Notifier;
use crate::policy::PluginPolicy;

/// Version/source metadata for one registered plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginMeta {
    pub name: String,
    pub version: String,
    pub source: String,
}

struct Inner {
    step_executors: HashMap<String, Arc<dyn StepExecutor>>,
    notifiers: HashMap<String, Arc<dyn Notifier>>,
    plugins: HashMap<String, PluginMeta>,
}

pub struct PluginRegistry {
    inner: RwLock<Inner>,
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginRegistry {
    /// A registry with only the always-on built-ins registered.
    pub fn new() -> Self {
        let mut step_executors: HashMap<String, Arc<dyn StepExecutor>> = HashMap::new();
        step_executors.insert("shell".to_string(), Arc::new(ShellExecutor));
        step_executors.insert("docker".to_string(), Arc::new(DockerExecutor));
        step_executors.insert("docker-compose".to_string(), Arc::new(DockerComposeExecutor));

        let mut notifiers: HashMap<String, Arc<dyn Notifier>> = HashMap::new();
        notifiers.insert("console".to_string(), Arc::new(ConsoleNotifier));

        Self {
            inner: RwLock::new(Inner {
                step_executors,
                notifiers,
                plugins: HashMap::new(),
            }),
        }
    }

    pub fn step_executor(&self, step_type: &str) -> Option<Arc<dyn StepExecutor>> {
        self.inner.read().step_executors.get(step_type).cloned()
    }

    pub fn notifier(&self, tag: &str) -> Option<Arc<dyn Notifier>> {
        self.inner.read().notifiers.get(tag).cloned()
    }

    pub fn plugin_meta(&self, name: &str) -> Option<PluginMeta> {
        self.inner.read().plugins.get(name).cloned()
    }

    /// Register a plugin-provided step executor under `meta.name`, subject
    /// to `policy`. Returns `false` (and logs at startup level) if the
    /// policy blocks it — the step type simply never becomes registered;
    /// nothing else fails.
    pub fn register_step_executor(
        &self,
        org_id: Option<&str>,
        step_type: impl Into<String>,
        meta: PluginMeta,
        executor: Arc<dyn StepExecutor>,
        policy: &dyn PluginPolicy,
    ) -> bool {
        if !policy.is_allowed(org_id, &meta.name) {
            tracing::warn!(plugin = %meta.name, org_id = ?org_id, "plugin blocked by trust policy");
            return false;
        }
        let step_type = step_type.into();
        let mut inner = self.inner.write();
        inner.step_executors.insert(step_type, executor);
        inner.plugins.insert(meta.name.clone(), meta);
        true
    }

    /// Register a plugin-provided notifier under `meta.name`, subject to
    /// `policy`.
    pub fn register_notifier(
        &self,
        org_id: Option<&str>,
        tag: impl Into<String>,
        meta: PluginMeta,
        notifier: Arc<dyn Notifier>,
        policy: &dyn PluginPolicy,
    ) -> bool {
        if !policy.is_allowed(org_id, &meta.name) {
            tracing::warn!(plugin = %meta.name, org_id = ?org_id, "plugin blocked by trust policy");
            return false;
        }
        let tag = tag.into();
        let mut inner = self.inner.write();
        inner.notifiers.insert(tag, notifier);
        inner.plugins.insert(meta.name.clone(), meta);
        true
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
