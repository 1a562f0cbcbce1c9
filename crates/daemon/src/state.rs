// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared, `Clone`-able handle to everything a route handler needs: the
//! job/build tables, the agent registry, the plugin registry, the
//! dispatcher, and the executor's dependencies.

use std::collections::HashMap;
use std::sync::Arc;

use chengis_agent::AgentRegistry;
use chengis_config::Config;
use chengis_core::{Clock, SystemClock};
use chengis_dispatcher::Dispatcher;
use chengis_engine::WorkspaceManager;
use chengis_plugins::PluginRegistry;
use chengis_store::{BuildStore, JobStore};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use chengis_core::{BuildId, CancelToken, Event};

/// Process-wide server context. Cheap to clone: everything behind it is
/// already an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub jobs: Arc<JobStore>,
    pub builds: Arc<BuildStore>,
    pub agents: Arc<AgentRegistry>,
    pub plugins: Arc<PluginRegistry>,
    pub dispatcher: Arc<Dispatcher>,
    pub workspace_manager: WorkspaceManager,
    pub clock: Arc<SystemClock>,
    pub events: mpsc::UnboundedSender<Event>,
    /// Cancel tokens for builds currently executing locally in-process.
    /// A build dispatched remotely or only queued has no entry here; its
    /// cancellation is someone else's concern (the remote agent, or simply
    /// never having started).
    pub running: Arc<Mutex<HashMap<BuildId, CancelToken>>>,
}

impl AppState {
    pub fn new(config: Config, events: mpsc::UnboundedSender<Event>) -> Self {
        let agents = Arc::new(AgentRegistry::new());
        let client = chengis_dispatcher::DispatchClient::default();
        let dispatcher = Arc::new(Dispatcher::new(
            agents.clone(),
            client,
            config.fallback_local,
            config.queue_enabled,
        ));
        Self {
            workspace_manager: WorkspaceManager::new(config.workspace_root.clone()),
            config: Arc::new(config),
            jobs: Arc::new(JobStore::new()),
            builds: Arc::new(BuildStore::new()),
            agents,
            plugins: Arc::new(PluginRegistry::new()),
            dispatcher,
            clock: Arc::new(SystemClock),
            events,
            running: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.epoch_ms()
    }
}

/// Everything `chengis_engine::BuildExecutor::new` needs, assembled once
/// from `AppState`.
pub fn build_executor(state: &AppState) -> chengis_engine::BuildExecutor {
    chengis_engine::BuildExecutor::new(
        state.plugins.clone(),
        state.workspace_manager.clone(),
        state.clock.clone() as Arc<dyn chengis_plugins::context::EpochClock>,
        state.config.step_output_cap_bytes,
        state.config.cancel_grace_ms,
        state.config.stage_parallelism_cap,
        state.events.clone(),
    )
}
