//! Sliding-window limit on prefetch starts.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

/// Admits at most `max` events in any trailing `window`.
#[derive(Debug)]
pub struct RateLimiter {
    max: usize,
    window: Duration,
    starts: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max: usize, window: Duration) -> Self {
        Self {
            max,
            window,
            starts: Mutex::new(VecDeque::with_capacity(max)),
        }
    }

    /// Record an event if the window has room.
    pub fn try_acquire(&self) -> bool {
        let now = Instant::now();
        let mut starts = self.starts.lock().unwrap_or_else(|e| e.into_inner());
        while starts
            .front()
            .is_some_and(|t| now.duration_since(*t) >= self.window)
        {
            starts.pop_front();
        }
        if starts.len() >= self.max {
            return false;
        }
        starts.push_back(now);
        true
    }

    /// Events still inside the window.
    pub fn in_window(&self) -> usize {
        let now = Instant::now();
        let starts = self.starts.lock().unwrap_or_else(|e| e.into_inner());
        starts
            .iter()
            .filter(|t| now.duration_since(**t) < self.window)
            .count()
    }
}
