/// Construction-time configuration errors. These are programmer errors and
/// are surfaced immediately rather than logged.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("failed to parse configuration: {reason}")]
    Parse { reason: String },

    #[error("no fetch strategy configured and no origin to build the default one")]
    MissingFetchStrategy,
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
