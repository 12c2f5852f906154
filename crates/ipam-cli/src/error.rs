//! CLI-specific error types.
//!
//! Everything the library reports passes through unchanged as `Ipam`;
//! the remaining variants cover what the command line itself can get wrong.

use ipam_client::IpamError;
use thiserror::Error;

/// Errors returned from `azureipam`.
#[derive(Debug, Error)]
pub enum CliError {
    /// IPAM client or allocator error
    #[error("IPAM error: {0}")]
    Ipam(#[from] IpamError),

    /// Connection settings are missing or malformed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Logging could not be initialized
    #[error("Failed to initialize logging: {0}")]
    Logging(String),

    /// Result could not be rendered as JSON
    #[error("Failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}
