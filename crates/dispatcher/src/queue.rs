// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The FIFO-per-org dispatch queue: builds that found no available agent
//! and fell here wait to be retried by the background poll worker, scored
//! by `(priority desc, enqueue_time asc)`.

use std::cmp::Ordering;
use std::collections::HashMap;

use chengis_agent::FindRequest;
use chengis_core::{BuildId, JobId, Pipeline};
use parking_lot::Mutex;
use std::collections::BinaryHeap;

/// One build waiting for a home.
#[derive(Debug, Clone)]
pub struct QueuedBuild {
    pub build_id: BuildId,
    pub job_id: JobId,
    pub org_id: Option<String>,
    pub pipeline: Pipeline,
    pub parameters: HashMap<String, String>,
    pub find_request: FindRequest,
    pub priority: i32,
    pub enqueued_at_ms: u64,
    pub attempts: u32,
}

#[derive(Debug, Clone)]
struct HeapEntry(QueuedBuild);

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.0.priority == other.0.priority && self.0.enqueued_at_ms == other.0.enqueued_at_ms
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    /// `BinaryHeap` is a max-heap, so "greater" must mean "pop first":
    /// higher priority wins; ties broken by earlier enqueue time.
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .priority
            .cmp(&other.0.priority)
            .then_with(|| other.0.enqueued_at_ms.cmp(&self.0.enqueued_at_ms))
    }
}

/// Per-org priority queues of builds waiting for dispatch capacity.
#[derive(Default)]
pub struct BuildQueue {
    inner: Mutex<HashMap<Option<String>, BinaryHeap<HeapEntry>>>,
}

impl BuildQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, item: QueuedBuild) {
        self.inner
            .lock()
            .entry(item.org_id.clone())
            .or_default()
            .push(HeapEntry(item));
    }

    /// Pop the highest-scoring build for `org_id`'s queue specifically.
    pub fn pop(&self, org_id: Option<&str>) -> Option<QueuedBuild> {
        let key = org_id.map(str::to_string);
        self.inner.lock().get_mut(&key)?.pop().map(|e| e.0)
    }

    /// Pop the highest-scoring build across every org's queue, for the
    /// background worker that doesn't care which org it's serving next.
    pub fn pop_any(&self) -> Option<QueuedBuild> {
        let mut inner = self.inner.lock();
        let mut best_key: Option<Option<String>> = None;
        let mut best_priority = i32::MIN;
        let mut best_time = u64::MAX;

        for (org, heap) in inner.iter() {
            if let Some(top) = heap.peek() {
                let better = best_key.is_none()
                    || top.0.priority > best_priority
                    || (top.0.priority == best_priority && top.0.enqueued_at_ms < best_time);
                if better {
                    best_key = Some(org.clone());
                    best_priority = top.0.priority;
                    best_time = top.0.enqueued_at_ms;
                }
            }
        }

        let key = best_key?;
        inner.get_mut(&key)?.pop().map(|e| e.0)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().values().map(|h| h.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
