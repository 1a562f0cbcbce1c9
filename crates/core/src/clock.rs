// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time abstraction so build/step timing is deterministic in tests.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of wall-clock time for everything that stamps a Build/Stage/Step.
pub trait Clock: Clone + Send + Sync + 'static {
    /// Milliseconds since the Unix epoch.
    fn epoch_ms(&self) -> u64;
}

/// Real wall-clock time.
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn epoch_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Deterministic clock for tests. Starts at a fixed instant and only moves
/// forward when `advance` is called.
#[derive(Clone)]
pub struct FakeClock {
    now_ms: Arc<AtomicU64>,
    // kept for potential future history tracking in tests
    _history: Arc<Mutex<Vec<u64>>>,
}

impl FakeClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: Arc::new(AtomicU64::new(start_ms)),
            _history: Arc::new(Mutex::new(vec![start_ms])),
        }
    }

    pub fn advance(&self, delta_ms: u64) {
        let new_now = self.now_ms.fetch_add(delta_ms, Ordering::SeqCst) + delta_ms;
        self._history.lock().push(new_now);
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clock for FakeClock {
    fn epoch_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;