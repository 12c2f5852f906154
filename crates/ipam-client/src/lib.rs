//! Azure IPAM REST API Client
//!
//! A Rust client library for the Azure IPAM REST API.
//! Provides typed models for spaces, blocks and reservations, and a
//! reservation allocator that picks the request shape for a creation,
//! locates reservations by id alone, and releases them.
//!
//! # Example
//!
//! ```no_run
//! use ipam_client::{AllocationRequest, IpamClient, IpamConfig, ReservationAllocator};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Create a client from AZUREIPAM_API_URL / AZUREIPAM_TOKEN
//! let config = IpamConfig::from_env()?;
//! let allocator = ReservationAllocator::new(IpamClient::from_config(&config)?);
//!
//! // Reserve a /23 from the top of one block
//! let request = AllocationRequest::by_size("au", ["AustraliaEast"], 23)
//!     .description("acceptance-test")
//!     .reverse_search(true);
//! let reservation = allocator.create(&request).await?;
//!
//! // Later, knowing only the id
//! let refreshed = allocator.find_by_id(&reservation.id).await?;
//!
//! // Release it
//! allocator.delete(&refreshed.space, &refreshed.block, &refreshed.id).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Reservations**: size-based, explicit-CIDR and multi-block pool creation
//! - **Lookup**: by known space/block, or by id through a full space scan
//! - **Spaces & Blocks**: typed listing with optional utilization
//! - **Testing**: `test-util` feature exposes an in-memory IPAM transport

pub mod allocator;
pub mod client;
pub mod common;
pub mod config;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod ipam_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

#[cfg(test)]
mod client_test;

pub use allocator::{
    locate_reservation, AllocationPlan, AllocationRequest, ReservationAllocator,
    ReservationLocation,
};
pub use client::IpamClient;
pub use common::HttpTransport;
pub use config::IpamConfig;
pub use error::IpamError;
pub use ipam_trait::IpamTransport;
pub use models::*;
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockTransport;

/// Re-exported so transports can be implemented without a direct reqwest dependency
pub use reqwest::Method;
