//! IPAM client errors

use thiserror::Error;

/// Errors that can occur when interacting with the IPAM API
#[derive(Debug, Error)]
pub enum IpamError {
    /// HTTP request/response error (connection, TLS, timeout)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IPAM API answered with a non-success status
    #[error("IPAM API error: status {status}, body: {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body text
        body: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Client configuration is missing or malformed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Allocation parameters violate the request rules; never sent
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Reservation creation failed remotely or in transport
    #[error("Allocation failed: {0}")]
    AllocationFailed(#[source] Box<IpamError>),

    /// Reservation id not present where it was looked up
    #[error("Reservation not found: {0}")]
    NotFound(String),

    /// Reservation delete was rejected or could not be sent
    #[error("Failed to delete reservation {id}: {reason}")]
    DeletionFailed {
        /// Reservation id
        id: String,
        /// Remote response body or transport error text
        reason: String,
    },

    /// Same reservation id found at more than one location
    #[error("Reservation {id} found at multiple locations: {}", locations.join(", "))]
    IntegrityViolation {
        /// Reservation id
        id: String,
        /// Every `space/block` where the id was seen
        locations: Vec<String>,
    },
}

impl IpamError {
    /// True when the error means the reservation definitely does not exist
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// HTTP status of the underlying remote failure, if any
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::AllocationFailed(inner) => inner.status(),
            _ => None,
        }
    }
}
