// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The agent table itself: register/deregister, heartbeat, atomic
//! build-count tracking, and scored selection.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use thiserror::Error;

use crate::circuit::{Circuit, CircuitState};

/// A snapshot of one agent's state, as returned by read operations.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Agent {
    pub agent_id: String,
    pub endpoint: String,
    pub labels: HashSet<String>,
    pub org_id: Option<String>,
    pub max_builds: u32,
    pub cpu_count: u32,
    pub current_builds: u32,
    pub last_heartbeat_at_ms: u64,
    pub heartbeat_timeout_ms: u64,
    pub circuit_state: CircuitState,
}

/// What `find_available` needs to know about the build looking for a home.
#[derive(Debug, Clone, Default)]
pub struct FindRequest {
    pub org_id: Option<String>,
    pub required_labels: HashSet<String>,
    pub cpu_count: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("no agent '{0}' registered")]
    NotFound(String),
}

struct Entry {
    endpoint: String,
    labels: HashSet<String>,
    org_id: Option<String>,
    max_builds: u32,
    cpu_count: u32,
    current_builds: AtomicU32,
    last_heartbeat_at_ms: AtomicU64,
    heartbeat_timeout_ms: u64,
    circuit: Mutex<Circuit>,
}

impl Entry {
    fn snapshot(&self, agent_id: &str, now_ms: u64) -> Agent {
        let mut circuit = self.circuit.lock();
        circuit.tick(now_ms);
        Agent {
            agent_id: agent_id.to_string(),
            endpoint: self.endpoint.clone(),
            labels: self.labels.clone(),
            org_id: self.org_id.clone(),
            max_builds: self.max_builds,
            cpu_count: self.cpu_count,
            current_builds: self.current_builds.load(Ordering::SeqCst),
            last_heartbeat_at_ms: self.last_heartbeat_at_ms.load(Ordering::SeqCst),
            heartbeat_timeout_ms: self.heartbeat_timeout_ms,
            circuit_state: circuit.state(),
        }
    }

}

/// Registration parameters for a new agent.
#[derive(Debug, Clone)]
pub struct NewAgent {
    pub agent_id: String,
    pub endpoint: String,
    pub labels: HashSet<String>,
    pub org_id: Option<String>,
    pub max_builds: u32,
    pub cpu_count: u32,
    pub heartbeat_timeout_ms: u64,
    pub circuit_threshold: u32,
    pub circuit_cooldown_ms: u64,
}

/// Concurrent registry of remote build agents. Reads take a
/// shared lock on the outer map; build-count mutation is a lock-free atomic
/// on the per-agent entry once that read lock is dropped.
#[derive(Default)]
pub struct AgentRegistry {
    agents: RwLock<std::collections::HashMap<String, Arc<Entry>>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registering an `agent_id` that is already present replaces it
    /// wholesale: capacity, labels, build count, and circuit state all
    /// reset, as if the agent had deregistered and come back fresh. A
    /// plain `register -> deregister -> register` round trip is therefore
    /// idempotent.
    pub fn register(&self, new_agent: NewAgent, now_ms: u64) {
        let entry = Entry {
            endpoint: new_agent.endpoint,
            labels: new_agent.labels,
            org_id: new_agent.org_id,
            max_builds: new_agent.max_builds,
            cpu_count: new_agent.cpu_count,
            current_builds: AtomicU32::new(0),
            last_heartbeat_at_ms: AtomicU64::new(now_ms),
            heartbeat_timeout_ms: new_agent.heartbeat_timeout_ms,
            circuit: Mutex::new(Circuit::new(
                new_agent.circuit_threshold,
                new_agent.circuit_cooldown_ms,
            )),
        };
        self.agents
            .write()
            .insert(new_agent.agent_id, Arc::new(entry));
    }

    /// Idempotent: deregistering an unknown agent is a no-op.
    pub fn deregister(&self, agent_id: &str) {
        self.agents.write().remove(agent_id);
    }

    pub fn heartbeat(&self, agent_id: &str, now_ms: u64) -> Result<(), RegistryError> {
        let agents = self.agents.read();
        let entry = agents
            .get(agent_id)
            .ok_or_else(|| RegistryError::NotFound(agent_id.to_string()))?;
        entry.last_heartbeat_at_ms.store(now_ms, Ordering::SeqCst);
        Ok(())
    }

    pub fn get(&self, agent_id: &str, now_ms: u64) -> Result<Agent, RegistryError> {
        let agents = self.agents.read();
        let entry = agents
            .get(agent_id)
            .ok_or_else(|| RegistryError::NotFound(agent_id.to_string()))?;
        Ok(entry.snapshot(agent_id, now_ms))
    }

    pub fn list(&self, now_ms: u64) -> Vec<Agent> {
        self.agents
            .read()
            .iter()
            .map(|(id, e)| e.snapshot(id, now_ms))
            .collect()
    }

    pub fn increment_builds(&self, agent_id: &str) -> Result<(), RegistryError> {
        let agents = self.agents.read();
        let entry = agents
            .get(agent_id)
            .ok_or_else(|| RegistryError::NotFound(agent_id.to_string()))?;
        entry.current_builds.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    pub fn decrement_builds(&self, agent_id: &str) -> Result<(), RegistryError> {
        let agents = self.agents.read();
        let entry = agents
            .get(agent_id)
            .ok_or_else(|| RegistryError::NotFound(agent_id.to_string()))?;
        entry
            .current_builds
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                Some(n.saturating_sub(1))
            })
            .ok();
        Ok(())
    }

    pub fn record_dispatch_success(&self, agent_id: &str) -> Result<(), RegistryError> {
        let agents = self.agents.read();
        let entry = agents
            .get(agent_id)
            .ok_or_else(|| RegistryError::NotFound(agent_id.to_string()))?;
        entry.circuit.lock().record_success();
        Ok(())
    }

    pub fn record_dispatch_failure(&self, agent_id: &str, now_ms: u64) -> Result<(), RegistryError> {
        let agents = self.agents.read();
        let entry = agents
            .get(agent_id)
            .ok_or_else(|| RegistryError::NotFound(agent_id.to_string()))?;
        entry.circuit.lock().record_failure(now_ms);
        Ok(())
    }

    /// Apply the six exclusion rules in order, then score
    /// the survivors: lowest `current_builds/max_builds` ratio, tiebreak
    /// highest free `cpu_count`, final tiebreak lexicographic `agent_id`.
    pub fn find_available(&self, request: &FindRequest, now_ms: u64) -> Option<Agent> {
        let agents = self.agents.read();

        agents
            .iter()
            .map(|(id, e)| e.snapshot(id, now_ms))
            .filter(|a| !a_is_offline(a, now_ms))
            .filter(|a| a.circuit_state != CircuitState::Open)
            .filter(|a| a.current_builds < a.max_builds)
            .filter(|a| match (&a.org_id, &request.org_id) {
                (Some(agent_org), Some(req_org)) => agent_org == req_org,
                (Some(_), None) => false,
                (None, _) => true,
            })
            .filter(|a| request.required_labels.iter().all(|l| a.labels.contains(l)))
            .filter(|a| a.cpu_count >= request.cpu_count)
            .min_by(|a, b| {
                let ratio_a = a.current_builds as f64 / a.max_builds as f64;
                let ratio_b = b.current_builds as f64 / b.max_builds as f64;
                ratio_a
                    .partial_cmp(&ratio_b)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| b.cpu_count.cmp(&a.cpu_count))
                    .then_with(|| a.agent_id.cmp(&b.agent_id))
            })
    }
}

fn a_is_offline(a: &Agent, now_ms: u64) -> bool {
    now_ms.saturating_sub(a.last_heartbeat_at_ms) >= a.heartbeat_timeout_ms
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
