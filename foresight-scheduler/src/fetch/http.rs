use std::sync::Arc;

use async_trait::async_trait;
use foresight_cache::TieredCache;
use foresight_core::errors::{ConfigError, FetchError, ForesightResult};
use foresight_core::models::EntryMetadata;
use foresight_core::traits::IFetchStrategy;
use reqwest::header::{HeaderValue, CONTENT_TYPE};

/// Same-origin GET against `origin`. Non-2xx responses are failures.
///
/// With a document cache attached, response bodies are stored under the
/// request path so navigation can be served from it.
pub struct HttpFetchStrategy {
    client: reqwest::Client,
    origin: String,
    documents: Option<Arc<TieredCache<String>>>,
}

impl HttpFetchStrategy {
    pub fn new(origin: impl Into<String>) -> Result<Self, ConfigError> {
        Self::with_client(reqwest::Client::new(), origin)
    }

    pub fn with_client(client: reqwest::Client, origin: impl Into<String>) -> Result<Self, ConfigError> {
        let origin = origin.into();
        if !(origin.starts_with("http://") || origin.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "scheduler.origin".to_string(),
                reason: format!("{origin} is not an http(s) origin"),
            });
        }
        Ok(Self {
            client,
            origin: origin.trim_end_matches('/').to_string(),
            documents: None,
        })
    }

    pub fn with_document_cache(mut self, cache: Arc<TieredCache<String>>) -> Self {
        self.documents = Some(cache);
        self
    }

    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.origin, path)
        } else {
            format!("{}/{}", self.origin, path)
        }
    }
}

#[async_trait]
impl IFetchStrategy for HttpFetchStrategy {
    async fn fetch(&self, path: &str) -> ForesightResult<()> {
        let network = |e: reqwest::Error| FetchError::Network {
            path: path.to_string(),
            reason: e.to_string(),
        };
        let response = self
            .client
            .get(self.url_for(path))
            .header("Purpose", HeaderValue::from_static("prefetch"))
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        let Some(documents) = &self.documents else {
            return Ok(());
        };
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(network)?;

        let mut metadata = EntryMetadata::new();
        metadata.insert("status".into(), serde_json::json!(status.as_u16()));
        if let Some(content_type) = content_type {
            metadata.insert("contentType".into(), serde_json::json!(content_type));
        }
        if let Err(e) = documents.set(path, &body, Some(metadata)).await {
            tracing::warn!(path, error = %e, "failed to cache prefetched document");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_paths_against_origin() {
        let strategy = HttpFetchStrategy::new("https://shop.example/").unwrap();
        assert_eq!(strategy.url_for("/cart"), "https://shop.example/cart");
        assert_eq!(strategy.url_for("cart"), "https://shop.example/cart");
    }

    #[test]
    fn rejects_non_http_origin() {
        assert!(HttpFetchStrategy::new("ftp://files.example").is_err());
    }

    #[tokio::test]
    async fn unreachable_origin_is_a_network_error() {
        let strategy = HttpFetchStrategy::new("http://127.0.0.1:9").unwrap();
        let err = strategy.fetch("/").await.unwrap_err();
        assert!(err.to_string().contains("network failure fetching /"));
    }
}
