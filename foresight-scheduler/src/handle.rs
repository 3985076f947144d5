use foresight_core::models::PrefetchOutcome;
use tokio::task::JoinHandle;

/// The eventual outcome of a `prefetch` call.
///
/// Dropping the handle does not cancel the prefetch.
#[derive(Debug)]
pub struct PrefetchHandle {
    inner: HandleInner,
}

#[derive(Debug)]
enum HandleInner {
    Ready(PrefetchOutcome),
    Running(JoinHandle<PrefetchOutcome>),
}

impl PrefetchHandle {
    pub(crate) fn ready(outcome: PrefetchOutcome) -> Self {
        Self {
            inner: HandleInner::Ready(outcome),
        }
    }

    pub(crate) fn running(task: JoinHandle<PrefetchOutcome>) -> Self {
        Self {
            inner: HandleInner::Running(task),
        }
    }

    /// Outcome known without waiting (skips are decided synchronously).
    pub fn immediate(&self) -> Option<&PrefetchOutcome> {
        match &self.inner {
            HandleInner::Ready(outcome) => Some(outcome),
            HandleInner::Running(_) => None,
        }
    }

    pub async fn outcome(self) -> PrefetchOutcome {
        match self.inner {
            HandleInner::Ready(outcome) => outcome,
            HandleInner::Running(task) => task
                .await
                .unwrap_or_else(|e| PrefetchOutcome::Failed(format!("prefetch task ended: {e}"))),
        }
    }
}
