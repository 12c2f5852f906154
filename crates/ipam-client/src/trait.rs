//! Transport trait for mocking
//!
//! This trait abstracts the HTTP layer so the repository and allocator can be
//! exercised against an in-memory IPAM in unit tests. The concrete
//! `HttpTransport` implements it with reqwest.

use crate::error::IpamError;
use reqwest::Method;

/// Trait for issuing authenticated requests to the IPAM API
///
/// Implementations must classify 200/201/202/204 as success and everything
/// else as `IpamError::Api`, and must not retry.
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait IpamTransport: Send + Sync {
    /// Get the base URL (API root without `/api`)
    fn base_url(&self) -> &str;

    /// Send one request and return the raw response body
    ///
    /// `path` starts with `/api/` and may carry a query string.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<String, IpamError>;
}

#[async_trait::async_trait]
impl<T: IpamTransport + ?Sized> IpamTransport for std::sync::Arc<T> {
    fn base_url(&self) -> &str {
        (**self).base_url()
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<String, IpamError> {
        (**self).send(method, path, body).await
    }
}
