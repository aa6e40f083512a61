//! Query dispatch: one GET per URL, body parsed as JSON.

use serde_json::Value;
use std::sync::Arc;

use crate::client::{Anonymous, CacheResult, CredentialProvider, DatastoreError, ResponseCache};
use crate::config::Config;
use crate::models::{ApiResponse, QuerySpec};
use crate::utils::HttpClient;

/// Length of the body excerpt included in parse errors
const SNIPPET_CHARS: usize = 200;

/// Issues DataStore requests and parses their bodies.
///
/// Requests are never retried. Each request is bounded by the client timeout
/// from [`ApiConfig`](crate::config::ApiConfig).
#[derive(Debug)]
pub struct Dispatcher {
    client: HttpClient,
    base_url: String,
    cache: ResponseCache,
    credentials: Arc<dyn CredentialProvider>,
}

impl Dispatcher {
    /// Create a dispatcher from configuration
    pub fn new(config: &Config) -> Result<Self, DatastoreError> {
        config
            .api
            .validate()
            .map_err(|e| DatastoreError::InvalidRequest(e.to_string()))?;

        let cache = if config.cache.enabled {
            ResponseCache::new()
        } else {
            ResponseCache::disabled()
        };

        Ok(Self {
            client: HttpClient::new(&config.api)?,
            base_url: config.api.base_url.clone(),
            cache,
            credentials: Arc::new(Anonymous),
        })
    }

    /// Use a credential provider for file downloads
    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Replace the response cache
    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Build the URL for a query and fetch it
    pub async fn query(&self, query: &QuerySpec) -> Result<ApiResponse, DatastoreError> {
        let url = query.url(&self.base_url)?;
        tracing::info!(mode = %query.mode(), "querying {}", url);
        self.fetch_json(&url, query.mode().requires_success_status())
            .await
    }

    /// GET a URL and parse the body as JSON.
    ///
    /// With `require_success` a non-2xx status fails with
    /// [`DatastoreError::HttpStatus`] before the body is read; otherwise the
    /// status is only logged.
    pub async fn fetch_json(
        &self,
        url: &str,
        require_success: bool,
    ) -> Result<ApiResponse, DatastoreError> {
        if let CacheResult::Hit(body) = self.cache.get(url) {
            return Ok(ApiResponse::new(url, body));
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DatastoreError::network(url, e))?;

        let status = response.status();
        tracing::debug!("response status {} for {}", status, url);

        if !status.is_success() {
            if require_success {
                return Err(DatastoreError::HttpStatus {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }
            tracing::warn!("{} returned status {}; parsing body anyway", url, status);
        }

        let text = response
            .text()
            .await
            .map_err(|e| DatastoreError::network(url, e))?;

        let body: Value = serde_json::from_str(&text).map_err(|e| DatastoreError::ResponseParse {
            url: url.to_string(),
            message: format!("JSON: {}; body starts with {:?}", e, snippet(&text)),
        })?;

        if status.is_success() {
            self.cache.insert(url, body.clone());
        }

        Ok(ApiResponse::new(url, body))
    }

    /// GET a file and return its raw bytes.
    ///
    /// The request passes through the credential provider first. Content is
    /// not validated: an error page served with a failure status is returned
    /// like any other body.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, DatastoreError> {
        let request = self.credentials.authorize(self.client.get(url)).await?;
        tracing::debug!(credentials = self.credentials.name(), "downloading {}", url);

        let response = request
            .send()
            .await
            .map_err(|e| DatastoreError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                "{} returned status {}; saving the body as received",
                url,
                status
            );
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DatastoreError::network(url, e))?;

        Ok(bytes.to_vec())
    }
}

fn snippet(text: &str) -> String {
    text.chars().take(SNIPPET_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_truncates_on_char_boundary() {
        let text = "é".repeat(SNIPPET_CHARS + 10);
        assert_eq!(snippet(&text).chars().count(), SNIPPET_CHARS);
        assert_eq!(snippet("short"), "short");
    }

    #[test]
    fn test_new_rejects_bad_base_url() {
        let mut config = Config::default();
        config.api.base_url = "no-scheme".to_string();
        assert!(matches!(
            Dispatcher::new(&config),
            Err(DatastoreError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_with_cache_replaces_cache() {
        let dispatcher = Dispatcher::new(&Config::default())
            .unwrap()
            .with_cache(ResponseCache::disabled());
        assert!(!dispatcher.cache().is_enabled());
        assert_eq!(dispatcher.base_url(), crate::config::DEFAULT_BASE_URL);
    }

    #[test]
    fn test_cache_follows_config() {
        let mut config = Config::default();
        config.cache.enabled = false;
        let dispatcher = Dispatcher::new(&config).unwrap();
        assert!(!dispatcher.cache().is_enabled());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let mut config = Config::default();
        config.api.base_url = "http://127.0.0.1:9/rest/".to_string();
        config.api.connect_timeout_secs = 1;
        config.api.timeout_secs = 2;
        let dispatcher = Dispatcher::new(&config).unwrap();

        let result = dispatcher.query(&QuerySpec::search("bison")).await;
        assert!(matches!(result, Err(DatastoreError::Network { .. })));
    }
}
