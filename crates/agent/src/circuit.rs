// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-agent circuit breaker: consecutive dispatch failures trip it open;
//! after a cool-down it admits one probe dispatch (half-open); success
//! closes it again, failure re-opens it.

/// The breaker's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Failure-counting state machine for one agent's circuit breaker.
#[derive(Debug, Clone)]
pub struct Circuit {
    state: CircuitState,
    consecutive_failures: u32,
    threshold: u32,
    opened_at_ms: Option<u64>,
    cooldown_ms: u64,
}

impl Circuit {
    pub fn new(threshold: u32, cooldown_ms: u64) -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            threshold,
            opened_at_ms: None,
            cooldown_ms,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    /// Re-evaluate `Open -> HalfOpen` against the clock before a selection
    /// decision is made; callers should call this before reading `state()`.
    pub fn tick(&mut self, now_ms: u64) {
        if self.state == CircuitState::Open {
            if let Some(opened_at) = self.opened_at_ms {
                if now_ms.saturating_sub(opened_at) >= self.cooldown_ms {
                    self.state = CircuitState::HalfOpen;
                }
            }
        }
    }

    pub fn record_success(&mut self) {
        self.state = CircuitState::Closed;
        self.consecutive_failures = 0;
        self.opened_at_ms = None;
    }

    pub fn record_failure(&mut self, now_ms: u64) {
        self.consecutive_failures += 1;
        match self.state {
            CircuitState::HalfOpen => {
                self.state = CircuitState::Open;
                self.opened_at_ms = Some(now_ms);
            }
            CircuitState::Closed if self.consecutive_failures >= self.threshold => {
                self.state = CircuitState::Open;
                self.opened_at_ms = Some(now_ms);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
#[path = "circuit_tests.rs"]
mod tests;
