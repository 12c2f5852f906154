//! Client configuration
//!
//! Loaded from environment variables the same way the provider reads them:
//! `AZUREIPAM_API_URL`, `AZUREIPAM_TOKEN`, and the optional
//! `AZUREIPAM_SKIP_CERT_VERIFICATION` / `AZUREIPAM_TIMEOUT_SECS`.

use crate::error::IpamError;
use std::env;
use std::time::Duration;

/// Environment variable holding the API root URL (without `/api`)
pub const ENV_API_URL: &str = "AZUREIPAM_API_URL";
/// Environment variable holding the bearer token
pub const ENV_TOKEN: &str = "AZUREIPAM_TOKEN";
/// Environment variable disabling TLS certificate verification
pub const ENV_SKIP_CERT_VERIFICATION: &str = "AZUREIPAM_SKIP_CERT_VERIFICATION";
/// Environment variable overriding the per-request timeout
pub const ENV_TIMEOUT_SECS: &str = "AZUREIPAM_TIMEOUT_SECS";

/// Per-request deadline when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for one IPAM instance
#[derive(Clone)]
pub struct IpamConfig {
    /// API root, e.g. `https://ipam.example.com`
    pub api_url: String,
    /// Bearer token
    pub token: String,
    /// Skip TLS certificate chain validation
    pub skip_cert_verification: bool,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for IpamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpamConfig")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .field("skip_cert_verification", &self.skip_cert_verification)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl IpamConfig {
    /// Create a configuration with default TLS and timeout settings
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_url: normalize_api_url(&api_url.into()),
            token: token.into(),
            skip_cert_verification: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns `IpamError::InvalidConfig` when a required variable is missing
    /// or an optional one cannot be parsed.
    pub fn from_env() -> Result<Self, IpamError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    ///
    /// # Errors
    /// See [`IpamConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, IpamError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup(ENV_API_URL).ok_or_else(|| {
            IpamError::InvalidConfig(format!("{ENV_API_URL} environment variable is required"))
        })?;
        let token = lookup(ENV_TOKEN).ok_or_else(|| {
            IpamError::InvalidConfig(format!("{ENV_TOKEN} environment variable is required"))
        })?;

        let mut config = Self::new(api_url, token);

        if let Some(raw) = lookup(ENV_SKIP_CERT_VERIFICATION) {
            config.skip_cert_verification = parse_bool(&raw).ok_or_else(|| {
                IpamError::InvalidConfig(format!(
                    "{ENV_SKIP_CERT_VERIFICATION} must be true or false, got {raw:?}"
                ))
            })?;
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|e| {
                IpamError::InvalidConfig(format!(
                    "{ENV_TIMEOUT_SECS} is not a number ({raw:?}): {e}"
                ))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration can be used to build a transport
    ///
    /// # Errors
    /// Returns `IpamError::InvalidConfig` describing the first problem found.
    pub fn validate(&self) -> Result<(), IpamError> {
        if self.api_url.is_empty() {
            return Err(IpamError::InvalidConfig("API URL must not be empty".to_string()));
        }
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(IpamError::InvalidConfig(format!(
                "API URL must start with http:// or https://, got {}",
                self.api_url
            )));
        }
        if self.token.trim().is_empty() {
            return Err(IpamError::InvalidConfig("API token must not be empty".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(IpamError::InvalidConfig("timeout must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Strip trailing `/` and a trailing `/api` segment
fn normalize_api_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    trimmed.strip_suffix("/api").unwrap_or(trimmed).to_string()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" | "" => Some(false),
        _ => None,
    }
}
