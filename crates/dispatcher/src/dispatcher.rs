// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The dispatcher proper: for each build, picks an agent via
//! [`chengis_agent::AgentRegistry`], dispatches over HTTP, and falls back to
//! queueing or local execution when that fails or no agent is available.
//!
//! Local execution itself is the caller's job — this crate has no
//! dependency on `chengis-engine` or the plugin registry, so `dispatch`
//! only ever returns a [`DispatchMode`] decision. The daemon binary, which
//! owns both this dispatcher and the executor, acts on `DispatchMode::Local`
//! by handing the build to `chengis_engine::BuildExecutor` itself.

use std::collections::HashMap;
use std::sync::Arc;

use chengis_agent::{AgentRegistry, CircuitState, FindRequest};
use chengis_core::{BuildId, DispatchMode, JobId, Pipeline};

use crate::client::DispatchClient;
use crate::protocol::DispatchRequest;
use crate::queue::{BuildQueue, QueuedBuild};

/// Bounded retry count for queued builds drained by the background worker.
pub const MAX_QUEUE_ATTEMPTS: u32 = 5;

/// Everything the dispatcher needs to place one build.
#[derive(Debug, Clone)]
pub struct DispatchAttempt {
    pub build_id: BuildId,
    pub job_id: JobId,
    pub org_id: Option<String>,
    pub pipeline: Pipeline,
    pub parameters: HashMap<String, String>,
    pub find_request: FindRequest,
    pub priority: i32,
}

/// Chooses where each build runs and records the outcome against the agent
/// registry's circuit breakers.
pub struct Dispatcher {
    agents: Arc<AgentRegistry>,
    client: DispatchClient,
    queue: BuildQueue,
    fallback_local: bool,
    queue_enabled: bool,
}

impl Dispatcher {
    pub fn new(
        agents: Arc<AgentRegistry>,
        client: DispatchClient,
        fallback_local: bool,
        queue_enabled: bool,
    ) -> Self {
        Self {
            agents,
            client,
            queue: BuildQueue::new(),
            fallback_local,
            queue_enabled,
        }
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Score and attempt placement once for `attempt`: try a remote agent,
    /// then fall back to queueing or local execution. Creating the `Build`
    /// row at `queued` is the caller's responsibility, as is anything that
    /// happens after a `Local`/`Queued` decision comes back.
    pub async fn dispatch(&self, attempt: &DispatchAttempt, now_ms: u64) -> DispatchMode {
        match self.agents.find_available(&attempt.find_request, now_ms) {
            Some(agent) if agent.circuit_state != CircuitState::Open => {
                match self.try_remote(&agent.agent_id, &agent.endpoint, attempt, now_ms).await {
                    Ok(()) => DispatchMode::Remote {
                        agent_id: agent.agent_id,
                    },
                    Err(()) => self.fallback(attempt, now_ms, "dispatch to agent failed"),
                }
            }
            _ => {
                if self.queue_enabled {
                    self.enqueue(attempt, now_ms);
                    DispatchMode::Queued
                } else if self.fallback_local {
                    DispatchMode::Local
                } else {
                    DispatchMode::Failed {
                        reason: "no agent available, local execution disabled, and the queue is disabled"
                            .to_string(),
                    }
                }
            }
        }
    }

    async fn try_remote(
        &self,
        agent_id: &str,
        endpoint: &str,
        attempt: &DispatchAttempt,
        now_ms: u64,
    ) -> Result<(), ()> {
        let request = DispatchRequest {
            build_id: attempt.build_id.clone(),
            job_id: attempt.job_id.clone(),
            org_id: attempt.org_id.clone(),
            pipeline: attempt.pipeline.clone(),
            parameters: attempt.parameters.clone(),
            workspace_hint: format!("build-{}", attempt.build_id),
            parent_span: None,
        };

        match self.client.dispatch(endpoint, &request).await {
            Ok(_) => {
                let _ = self.agents.increment_builds(agent_id);
                let _ = self.agents.record_dispatch_success(agent_id);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(agent_id, error = %err, "dispatch to agent failed");
                let _ = self.agents.record_dispatch_failure(agent_id, now_ms);
                Err(())
            }
        }
    }

    /// Fallback chain once a remote attempt has already failed: local,
    /// then queue, then fail.
    fn fallback(&self, attempt: &DispatchAttempt, now_ms: u64, reason: &str) -> DispatchMode {
        if self.fallback_local {
            DispatchMode::Local
        } else if self.queue_enabled {
            self.enqueue(attempt, now_ms);
            DispatchMode::Queued
        } else {
            DispatchMode::Failed {
                reason: reason.to_string(),
            }
        }
    }

    fn enqueue(&self, attempt: &DispatchAttempt, now_ms: u64) {
        self.queue.push(QueuedBuild {
            build_id: attempt.build_id.clone(),
            job_id: attempt.job_id.clone(),
            org_id: attempt.org_id.clone(),
            pipeline: attempt.pipeline.clone(),
            parameters: attempt.parameters.clone(),
            find_request: attempt.find_request.clone(),
            priority: attempt.priority,
            enqueued_at_ms: now_ms,
            attempts: 0,
        })
    }

    /// Pull the next-best queued build across every org, for the background
    /// poll worker to retry against the agent registry.
    pub fn try_dequeue(&self) -> Option<QueuedBuild> {
        self.queue.pop_any()
    }

    /// Re-enqueue a build whose retry attempt failed. Returns `false` once
    /// `MAX_QUEUE_ATTEMPTS` is exhausted, signalling the caller should fail
    /// the build instead of retrying forever.
    pub fn requeue(&self, mut item: QueuedBuild, now_ms: u64) -> bool {
        item.attempts += 1;
        if item.attempts >= MAX_QUEUE_ATTEMPTS {
            return false;
        }
        item.enqueued_at_ms = now_ms;
        self.queue.push(item);
        true
    }

    /// One poll cycle: try to place the best-scoring queued build, if any.
    /// Returns `Some((build_id, outcome))` when a build was attempted.
    pub async fn poll_queue_once(&self, now_ms: u64) -> Option<(BuildId, DispatchMode)> {
        let item = self.try_dequeue()?;
        let attempt = DispatchAttempt {
            build_id: item.build_id.clone(),
            job_id: item.job_id.clone(),
            org_id: item.org_id.clone(),
            pipeline: item.pipeline.clone(),
            parameters: item.parameters.clone(),
            find_request: item.find_request.clone(),
            priority: item.priority,
        };

        match self.agents.find_available(&attempt.find_request, now_ms) {
            Some(agent) if agent.circuit_state != CircuitState::Open => {
                match self.try_remote(&agent.agent_id, &agent.endpoint, &attempt, now_ms).await {
                    Ok(()) => Some((
                        item.build_id,
                        DispatchMode::Remote {
                            agent_id: agent.agent_id,
                        },
                    )),
                    Err(()) => {
                        if !self.requeue(item.clone(), now_ms) {
                            return Some((
                                item.build_id,
                                DispatchMode::Failed {
                                    reason: "queue retries exhausted".to_string(),
                                },
                            ));
                        }
                        None
                    }
                }
            }
            _ => {
                if !self.requeue(item.clone(), now_ms) {
                    return Some((
                        item.build_id,
                        DispatchMode::Failed {
                            reason: "queue retries exhausted".to_string(),
                        },
                    ));
                }
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
