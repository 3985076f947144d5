use std::future::Future;

use async_trait::async_trait;
use foresight_core::errors::ForesightResult;
use foresight_core::traits::IFetchStrategy;

/// Adapts an async closure into a fetch strategy.
pub struct FnFetchStrategy<F> {
    fetch: F,
    name: &'static str,
}

impl<F, Fut> FnFetchStrategy<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = ForesightResult<()>> + Send + 'static,
{
    pub fn new(fetch: F) -> Self {
        Self {
            fetch,
            name: "fn",
        }
    }

    pub fn named(name: &'static str, fetch: F) -> Self {
        Self { fetch, name }
    }
}

#[async_trait]
impl<F, Fut> IFetchStrategy for FnFetchStrategy<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = ForesightResult<()>> + Send + 'static,
{
    async fn fetch(&self, path: &str) -> ForesightResult<()> {
        (self.fetch)(path.to_string()).await
    }

    fn name(&self) -> &str {
        self.name
    }
}
