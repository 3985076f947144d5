/// Failures raised by fetch strategies while prefetching a path.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("fetch of {path} returned status {status}")]
    Status { path: String, status: u16 },

    #[error("network failure fetching {path}: {reason}")]
    Network { path: String, reason: String },

    #[error("fetch of {path} timed out after {after_ms}ms")]
    TimedOut { path: String, after_ms: u64 },
}
