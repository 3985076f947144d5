//! Pending hints ordered by (priority, arrival).

use foresight_core::config::HintPriorities;
use foresight_core::models::{HintType, ResourceHint};

#[derive(Debug, Clone)]
struct Pending {
    hint: ResourceHint,
    priority: u8,
    seq: u64,
}

/// Hints waiting for capacity. Lower priority numbers leave first; ties
/// leave in arrival order.
#[derive(Debug, Default)]
pub struct PendingQueue {
    items: Vec<Pending>,
    next_seq: u64,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, hint: ResourceHint, priorities: &HintPriorities) {
        let priority = priorities.of(hint.hint_type);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.items.push(Pending { hint, priority, seq });
    }

    /// Remove and return the next hint to apply.
    pub fn pop(&mut self) -> Option<ResourceHint> {
        let index = self
            .items
            .iter()
            .enumerate()
            .min_by_key(|(_, p)| (p.priority, p.seq))
            .map(|(i, _)| i)?;
        Some(self.items.remove(index).hint)
    }

    pub fn contains(&self, hint_type: HintType, url: &str) -> bool {
        self.items
            .iter()
            .any(|p| p.hint.hint_type == hint_type && p.hint.url == url)
    }

    pub fn remove(&mut self, hint_type: HintType, url: &str) -> Option<ResourceHint> {
        let index = self
            .items
            .iter()
            .position(|p| p.hint.hint_type == hint_type && p.hint.url == url)?;
        Some(self.items.remove(index).hint)
    }

    pub fn drain(&mut self) -> Vec<ResourceHint> {
        self.items.drain(..).map(|p| p.hint).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
