//! Credential seam for file downloads.
//!
//! DataStore serves restricted packages only to authenticated callers, but
//! no authentication scheme is implemented here. A [`CredentialProvider`]
//! gets each download request before it is sent and may attach whatever the
//! deployment needs.

use async_trait::async_trait;
use reqwest::RequestBuilder;

use crate::client::DatastoreError;

/// Decorates download requests with credentials
#[async_trait]
pub trait CredentialProvider: Send + Sync + std::fmt::Debug {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Attach credentials to a request about to be sent
    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, DatastoreError>;
}

/// Sends requests unchanged
#[derive(Debug, Default, Clone, Copy)]
pub struct Anonymous;

#[async_trait]
impl CredentialProvider for Anonymous {
    fn name(&self) -> &str {
        "anonymous"
    }

    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, DatastoreError> {
        Ok(request)
    }
}
