/// Resource hint resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HintError {
    #[error("resource failed to load: {url}")]
    LoadFailed { url: String },

    #[error("resource hint timed out: {url}")]
    TimedOut { url: String },

    #[error("resource hint cancelled: {url}")]
    Cancelled { url: String },
}
