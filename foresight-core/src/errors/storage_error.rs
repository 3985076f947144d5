/// Storage-layer errors for cache backends and persistent string stores.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("quota exceeded writing {key}: {needed} bytes needed, {available} available")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },

    #[error("{backend} backend failure: {message}")]
    Backend { backend: String, message: String },

    #[error("I/O failure on {path}: {message}")]
    Io { path: String, message: String },

    #[error("corrupt entry for {key}: {reason}")]
    Corrupt { key: String, reason: String },
}
