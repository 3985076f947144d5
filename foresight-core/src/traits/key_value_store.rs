use crate::errors::ForesightResult;

/// A persistent string store (localStorage-like).
///
/// Implementations with a fixed quota return `StorageError::QuotaExceeded`
/// from `set_item` when the write does not fit.
pub trait IKeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> ForesightResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> ForesightResult<()>;
    fn remove_item(&self, key: &str) -> ForesightResult<()>;
    fn keys(&self) -> ForesightResult<Vec<String>>;
}
