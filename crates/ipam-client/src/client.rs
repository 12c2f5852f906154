//! IPAM API client
//!
//! Typed read/list/create/delete operations over spaces, blocks and
//! reservations. Every method is a single request: no caching, no pagination
//! (the API returns complete collections), no retained state.

use crate::common::{query, HttpTransport};
use crate::config::IpamConfig;
use crate::error::IpamError;
use crate::ipam_trait::IpamTransport;
use crate::models::*;
use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// IPAM API client
#[derive(Debug, Clone)]
pub struct IpamClient<T> {
    transport: T,
}

impl IpamClient<HttpTransport> {
    /// Create a client talking HTTP to the configured IPAM instance
    ///
    /// # Errors
    /// Returns `IpamError::InvalidConfig` or `IpamError::Http` if the
    /// transport cannot be built.
    pub fn from_config(config: &IpamConfig) -> Result<Self, IpamError> {
        Ok(Self::new(HttpTransport::new(config)?))
    }
}

impl<T: IpamTransport> IpamClient<T> {
    /// Create a client over an explicit transport
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    /// Get the underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, IpamError> {
        let body = self.transport.send(Method::GET, path, None).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn post_json<R: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<R, IpamError> {
        let body = self.transport.send(Method::POST, path, Some(body)).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// List all spaces
    ///
    /// # Arguments
    /// * `expand` - Expand embedded virtual networks
    /// * `utilization` - Include `size`/`used` figures
    pub async fn list_spaces(
        &self,
        expand: bool,
        utilization: bool,
    ) -> Result<Vec<Space>, IpamError> {
        debug!("Listing spaces (expand={}, utilization={})", expand, utilization);
        self.get_json(&query::spaces(expand, utilization)).await
    }

    /// Get a space by name
    pub async fn get_space(
        &self,
        name: &str,
        expand: bool,
        utilization: bool,
    ) -> Result<Space, IpamError> {
        debug!("Fetching space {}", name);
        self.get_json(&query::space_detail(name, expand, utilization)).await
    }

    /// List the blocks of a space
    pub async fn list_blocks(
        &self,
        space: &str,
        expand: bool,
        utilization: bool,
    ) -> Result<Vec<Block>, IpamError> {
        debug!("Listing blocks in space {}", space);
        self.get_json(&query::blocks(space, expand, utilization)).await
    }

    /// Get a block by space and name
    pub async fn get_block(
        &self,
        space: &str,
        block: &str,
        expand: bool,
        utilization: bool,
    ) -> Result<Block, IpamError> {
        debug!("Fetching block {}/{}", space, block);
        self.get_json(&query::block_detail(space, block, expand, utilization)).await
    }

    /// List the reservations of a block
    ///
    /// # Arguments
    /// * `include_settled` - Also return settled and cancelled reservations
    ///
    /// Returned reservations always carry `space`/`block`.
    pub async fn list_reservations(
        &self,
        space: &str,
        block: &str,
        include_settled: bool,
    ) -> Result<Vec<Reservation>, IpamError> {
        debug!("Listing reservations in {}/{} (settled={})", space, block, include_settled);
        let mut reservations: Vec<Reservation> = self
            .get_json(&query::block_reservations_listing(space, block, include_settled))
            .await?;
        for reservation in &mut reservations {
            fill_location(reservation, space, block);
        }
        Ok(reservations)
    }

    /// Get a reservation by id from a known space and block
    ///
    /// The API has no single-reservation endpoint, so this lists the block
    /// (settled included) and scans for the id.
    ///
    /// # Returns
    /// * `Err(IpamError::NotFound)` - The id is not in that block's list
    pub async fn get_reservation(
        &self,
        space: &str,
        block: &str,
        id: &str,
    ) -> Result<Reservation, IpamError> {
        self.list_reservations(space, block, true)
            .await?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| IpamError::NotFound(id.to_string()))
    }

    /// `POST /api/spaces/{space}/blocks/{block}/reservations`
    pub async fn create_block_reservation(
        &self,
        space: &str,
        block: &str,
        body: serde_json::Value,
    ) -> Result<Reservation, IpamError> {
        let mut reservation: Reservation = self
            .post_json(&query::block_reservations(space, block), body)
            .await?;
        fill_location(&mut reservation, space, block);
        Ok(reservation)
    }

    /// `POST /api/spaces/{space}/reservations`
    ///
    /// The remote picks the block, so `block` is whatever the response says.
    pub async fn create_pool_reservation(
        &self,
        space: &str,
        body: serde_json::Value,
    ) -> Result<Reservation, IpamError> {
        let mut reservation: Reservation =
            self.post_json(&query::space_reservations(space), body).await?;
        if reservation.space.is_empty() {
            reservation.space = space.to_string();
        }
        if reservation.block.is_empty() {
            warn!("Pool reservation {} returned without its block", reservation.id);
        }
        Ok(reservation)
    }

    /// `DELETE /api/spaces/{space}/blocks/{block}/reservations` with `[ids]`
    ///
    /// # Returns
    /// * `Ok(String)` - The response body; empty means success
    pub async fn delete_reservations(
        &self,
        space: &str,
        block: &str,
        ids: &[&str],
    ) -> Result<String, IpamError> {
        debug!("Deleting reservations {:?} from {}/{}", ids, space, block);
        let body = serde_json::to_value(ids)?;
        self.transport
            .send(Method::DELETE, &query::block_reservations(space, block), Some(body))
            .await
    }
}

fn fill_location(reservation: &mut Reservation, space: &str, block: &str) {
    if reservation.space.is_empty() {
        reservation.space = space.to_string();
    }
    if reservation.block.is_empty() {
        reservation.block = block.to_string();
    }
    if !reservation.has_consistent_settlement() {
        warn!(
            "Reservation {} in {}/{} has only one of settledOn/settledBy",
            reservation.id, space, block
        );
    }
}
