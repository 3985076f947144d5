//! Error taxonomy for the Foresight engine.
//!
//! One top-level `ForesightError` with per-subsystem enums converted via `From`.

mod config_error;
mod fetch_error;
mod hint_error;
mod storage_error;

pub use config_error::ConfigError;
pub use fetch_error::FetchError;
pub use hint_error::HintError;
pub use storage_error::StorageError;

/// Top-level error type shared by every crate in the workspace.
#[derive(Debug, thiserror::Error)]
pub enum ForesightError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("resource hint error: {0}")]
    Hint(#[from] HintError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl ForesightError {
    /// Whether this error is a storage quota failure (eligible for evict-and-retry).
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::Storage(StorageError::QuotaExceeded { .. }))
    }
}

/// Convenience alias used across the workspace.
pub type ForesightResult<T> = Result<T, ForesightError>;
