//! Common utilities for the IPAM API client
//!
//! Provides the reqwest-backed transport and the status classification shared
//! with the in-memory simulator.

pub mod query;

use crate::config::IpamConfig;
use crate::error::IpamError;
use crate::ipam_trait::IpamTransport;
use reqwest::{Client, Method};
use tracing::{debug, trace};

/// Statuses the IPAM API uses for success
const SUCCESS_STATUSES: [u16; 4] = [200, 201, 202, 204];

/// Map a status code and body onto the transport result
///
/// # Errors
/// Returns `IpamError::Api` for any status outside 200/201/202/204.
pub fn classify_response(status: u16, body: String) -> Result<String, IpamError> {
    if SUCCESS_STATUSES.contains(&status) {
        Ok(body)
    } else {
        Err(IpamError::Api { status, body })
    }
}

/// HTTP transport with bearer authentication
pub struct HttpTransport {
    client: Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Create a new transport from validated configuration
    ///
    /// # Errors
    /// Returns `IpamError::InvalidConfig` for bad settings and
    /// `IpamError::Http` if the reqwest client cannot be built.
    pub fn new(config: &IpamConfig) -> Result<Self, IpamError> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.skip_cert_verification)
            .build()
            .map_err(IpamError::Http)?;

        Ok(Self::with_client(client, config.api_url.clone(), config.token.clone()))
    }

    /// Wrap an already configured reqwest client
    pub fn with_client(client: Client, base_url: String, token: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Build a full URL from a path
    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Get authorization header value
    fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

#[async_trait::async_trait]
impl IpamTransport for HttpTransport {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<String, IpamError> {
        let url = self.build_url(path);
        debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json");

        if let Some(body) = &body {
            trace!("{} {} body: {}", method, url, body);
            request = request
                .header("Content-Type", "application/json")
                .json(body);
        }

        let response = request.send().await.map_err(IpamError::Http)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(IpamError::Http)?;
        trace!("{} {} -> {}: {}", method, url, status, text);

        classify_response(status, text)
    }
}
