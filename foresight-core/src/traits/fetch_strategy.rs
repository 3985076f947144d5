use async_trait::async_trait;

use crate::errors::ForesightResult;

/// Retrieves a path ahead of navigation.
///
/// Resolves on successful retrieval; any failure (including non-success
/// status codes) is an error.
#[async_trait]
pub trait IFetchStrategy: Send + Sync {
    async fn fetch(&self, path: &str) -> ForesightResult<()>;

    fn name(&self) -> &str {
        "custom"
    }
}
