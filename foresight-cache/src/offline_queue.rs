//! Write-behind queue for writes made while offline.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::StoredEntry;

/// Maximum queued writes before the oldest is dropped.
pub const MAX_QUEUED_WRITES: usize = 10_000;

/// A write waiting to be replayed into the sync target.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedWrite {
    pub key: String,
    pub entry: StoredEntry,
    pub queued_at: DateTime<Utc>,
}

/// Result of one replay pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    pub committed: usize,
    pub remaining: usize,
}

/// FIFO of offline writes. Replay order is enqueue order; a failed item
/// goes back to the front so nothing behind it overtakes it. At most one
/// write per key is held: a newer write replaces the older one.
#[derive(Debug)]
pub struct OfflineQueue {
    queue: Mutex<VecDeque<QueuedWrite>>,
    max_len: usize,
}

impl OfflineQueue {
    pub fn new(max_len: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            max_len: max_len.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<QueuedWrite>> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn enqueue(&self, write: QueuedWrite) {
        let mut queue = self.lock();
        queue.retain(|w| w.key != write.key);
        if queue.len() >= self.max_len {
            if let Some(dropped) = queue.pop_front() {
                tracing::warn!(key = %dropped.key, "offline queue full, dropping oldest write");
            }
        }
        queue.push_back(write);
    }

    /// Drop any queued write for `key`. Returns whether one was held.
    pub fn discard(&self, key: &str) -> bool {
        let mut queue = self.lock();
        let before = queue.len();
        queue.retain(|w| w.key != key);
        queue.len() != before
    }

    pub fn pop_front(&self) -> Option<QueuedWrite> {
        self.lock().pop_front()
    }

    /// Put a write back at the head of the queue.
    pub fn requeue_front(&self, write: QueuedWrite) {
        self.lock().push_front(write);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Queued keys, head first.
    pub fn keys(&self) -> Vec<String> {
        self.lock().iter().map(|w| w.key.clone()).collect()
    }
}

impl Default for OfflineQueue {
    fn default() -> Self {
        Self::new(MAX_QUEUED_WRITES)
    }
}
