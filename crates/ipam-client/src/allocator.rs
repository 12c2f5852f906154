//! Reservation allocation
//!
//! Turns an [`AllocationRequest`] into exactly one of three wire shapes,
//! locates reservations by id alone, and releases them.
//!
//! The request shapes:
//! 1. One block and a prefix length: the block endpoint sizes the range.
//! 2. One block and an explicit CIDR: the block endpoint reserves that range.
//! 3. Several blocks and a prefix length: the space endpoint tries the blocks
//!    in the given order and reserves in the first one with room.
//!
//! Nothing here retries. A retried create can produce a second reservation,
//! so the decision stays with the caller.

use crate::client::IpamClient;
use crate::common::query;
use crate::error::IpamError;
use crate::ipam_trait::IpamTransport;
use crate::models::*;
use tracing::{debug, error, info};

/// Input for [`ReservationAllocator::create`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationRequest {
    /// Space to allocate in
    pub space: String,
    /// Candidate blocks, in priority order
    pub blocks: Vec<String>,
    /// Free text stored with the reservation
    pub description: Option<String>,
    /// Prefix length to allocate; excludes `specific_cidr`
    pub size: Option<u8>,
    /// Exact range to reserve; excludes `size`, single block only
    pub specific_cidr: Option<String>,
    /// Search the block from the top of its range (size requests only)
    pub reverse_search: bool,
    /// Prefer the smallest free range that fits (size requests only)
    pub smallest_cidr: bool,
}

impl AllocationRequest {
    /// Request a range of `size` bits from the first eligible block
    pub fn by_size<I, S>(space: impl Into<String>, blocks: I, size: u8) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            space: space.into(),
            blocks: blocks.into_iter().map(Into::into).collect(),
            size: Some(size),
            ..Self::default()
        }
    }

    /// Request an exact range from one block
    pub fn by_cidr(
        space: impl Into<String>,
        block: impl Into<String>,
        cidr: impl Into<String>,
    ) -> Self {
        Self {
            space: space.into(),
            blocks: vec![block.into()],
            specific_cidr: Some(cidr.into()),
            ..Self::default()
        }
    }

    /// Set the description
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the reverse search hint
    #[must_use]
    pub fn reverse_search(mut self, reverse_search: bool) -> Self {
        self.reverse_search = reverse_search;
        self
    }

    /// Set the smallest CIDR hint
    #[must_use]
    pub fn smallest_cidr(mut self, smallest_cidr: bool) -> Self {
        self.smallest_cidr = smallest_cidr;
        self
    }

    /// Validate the request and pick its wire shape
    ///
    /// # Errors
    /// Returns `IpamError::InvalidRequest` when:
    /// - the space or any block name is blank
    /// - `blocks` is empty
    /// - neither or both of `size` and `specific_cidr` are set
    /// - `specific_cidr` is combined with more than one block
    pub fn plan(&self) -> Result<AllocationPlan, IpamError> {
        if self.space.trim().is_empty() {
            return Err(invalid("space must not be empty"));
        }
        if self.blocks.is_empty() {
            return Err(invalid("at least one block is required"));
        }
        if self.blocks.iter().any(|b| b.trim().is_empty()) {
            return Err(invalid("block names must not be empty"));
        }

        match (self.size, &self.specific_cidr) {
            (None, None) => Err(invalid("one of size or specific_cidr is required")),
            (Some(_), Some(_)) => Err(invalid("size and specific_cidr are mutually exclusive")),
            (None, Some(_)) if self.blocks.len() > 1 => Err(invalid(&format!(
                "specific_cidr requires exactly one block, got {}",
                self.blocks.len()
            ))),
            (None, Some(cidr)) => Ok(AllocationPlan::SingleBlockByCidr {
                space: self.space.clone(),
                block: self.blocks[0].clone(),
                body: CidrReservationBody {
                    desc: self.description.clone(),
                    cidr: cidr.clone(),
                },
            }),
            (Some(size), None) if self.blocks.len() == 1 => Ok(AllocationPlan::SingleBlockBySize {
                space: self.space.clone(),
                block: self.blocks[0].clone(),
                body: SizeReservationBody {
                    desc: self.description.clone(),
                    size,
                    reverse_search: self.reverse_search,
                    smallest_cidr: self.smallest_cidr,
                },
            }),
            (Some(size), None) => Ok(AllocationPlan::MultiBlockPool {
                space: self.space.clone(),
                body: PoolReservationBody {
                    blocks: self.blocks.clone(),
                    size,
                    desc: self.description.clone(),
                    reverse_search: self.reverse_search,
                    smallest_cidr: self.smallest_cidr,
                },
            }),
        }
    }
}

fn invalid(msg: &str) -> IpamError {
    IpamError::InvalidRequest(msg.to_string())
}

/// A validated allocation, one variant per wire shape
#[derive(Debug, Clone, PartialEq)]
pub enum AllocationPlan {
    /// `POST .../blocks/{block}/reservations` with `size`
    SingleBlockBySize {
        /// Target space
        space: String,
        /// Block the range is carved from
        block: String,
        /// Request body
        body: SizeReservationBody,
    },
    /// `POST .../blocks/{block}/reservations` with `cidr`
    SingleBlockByCidr {
        /// Target space
        space: String,
        /// Block the range is taken from
        block: String,
        /// Request body
        body: CidrReservationBody,
    },
    /// `POST /api/spaces/{space}/reservations` with `blocks`
    MultiBlockPool {
        /// Target space
        space: String,
        /// Request body, carrying the candidate blocks
        body: PoolReservationBody,
    },
}

impl AllocationPlan {
    /// Target space
    pub fn space(&self) -> &str {
        match self {
            Self::SingleBlockBySize { space, .. }
            | Self::SingleBlockByCidr { space, .. }
            | Self::MultiBlockPool { space, .. } => space,
        }
    }

    /// Path the request is posted to
    pub fn endpoint(&self) -> String {
        match self {
            Self::SingleBlockBySize { space, block, .. }
            | Self::SingleBlockByCidr { space, block, .. } => {
                query::block_reservations(space, block)
            }
            Self::MultiBlockPool { space, .. } => query::space_reservations(space),
        }
    }

    /// JSON body of the request
    ///
    /// # Errors
    /// Returns `IpamError::Serialization` if the body cannot be encoded.
    pub fn body(&self) -> Result<serde_json::Value, IpamError> {
        let value = match self {
            Self::SingleBlockBySize { body, .. } => serde_json::to_value(body)?,
            Self::SingleBlockByCidr { body, .. } => serde_json::to_value(body)?,
            Self::MultiBlockPool { body, .. } => serde_json::to_value(body)?,
        };
        Ok(value)
    }
}

/// Where a reservation lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationLocation {
    /// Space name
    pub space: String,
    /// Block name
    pub block: String,
}

impl std::fmt::Display for ReservationLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.space, self.block)
    }
}

/// Find the block holding `id` in a space listing
///
/// Ids are unique across the whole IPAM instance, so more than one hit means
/// the remote data is corrupt; that is reported, not resolved.
///
/// # Returns
/// * `Ok(None)` - No block lists the id
///
/// # Errors
/// Returns `IpamError::IntegrityViolation` when the id appears more than once.
pub fn locate_reservation(
    spaces: &[Space],
    id: &str,
) -> Result<Option<ReservationLocation>, IpamError> {
    let mut matches: Vec<ReservationLocation> = spaces
        .iter()
        .flat_map(|space| {
            space.blocks.iter().filter_map(move |block| {
                block
                    .reservations
                    .iter()
                    .any(|r| r.id == id)
                    .then(|| ReservationLocation {
                        space: space.name.clone(),
                        block: block.name.clone(),
                    })
            })
        })
        .collect();

    // A block listing the same id twice is one location but still corrupt.
    let duplicates_in_block = spaces
        .iter()
        .flat_map(|s| &s.blocks)
        .any(|b| b.reservations.iter().filter(|r| r.id == id).count() > 1);

    if matches.len() > 1 || duplicates_in_block {
        let locations: Vec<String> = matches.iter().map(ToString::to_string).collect();
        error!("Reservation {} is listed more than once: {:?}", id, locations);
        return Err(IpamError::IntegrityViolation {
            id: id.to_string(),
            locations,
        });
    }

    Ok(matches.pop())
}

/// Reservation allocator
///
/// Stateless between calls: every read re-fetches from the remote API.
#[derive(Debug, Clone)]
pub struct ReservationAllocator<T> {
    client: IpamClient<T>,
}

impl<T: IpamTransport> ReservationAllocator<T> {
    /// Create an allocator over an explicitly constructed client
    pub fn new(client: IpamClient<T>) -> Self {
        Self { client }
    }

    /// Get the underlying client
    pub fn client(&self) -> &IpamClient<T> {
        &self.client
    }

    /// Create a reservation
    ///
    /// The request is validated before anything is sent. The returned
    /// reservation is exactly what the remote answered (`cidr`, `id`, `tags`
    /// are authoritative).
    ///
    /// # Errors
    /// * `IpamError::InvalidRequest` - Validation failed; nothing was sent
    /// * `IpamError::AllocationFailed` - Transport or remote failure
    pub async fn create(&self, request: &AllocationRequest) -> Result<Reservation, IpamError> {
        let plan = request.plan()?;
        let body = plan.body()?;

        let result = match &plan {
            AllocationPlan::SingleBlockBySize { space, block, body: b } => {
                debug!("Reserving /{} in {}/{}", b.size, space, block);
                self.client.create_block_reservation(space, block, body).await
            }
            AllocationPlan::SingleBlockByCidr { space, block, body: b } => {
                debug!("Reserving {} in {}/{}", b.cidr, space, block);
                self.client.create_block_reservation(space, block, body).await
            }
            AllocationPlan::MultiBlockPool { space, body: b } => {
                debug!("Reserving /{} in {} from blocks {:?}", b.size, space, b.blocks);
                self.client.create_pool_reservation(space, body).await
            }
        };

        let reservation = result.map_err(|e| IpamError::AllocationFailed(Box::new(e)))?;
        info!(
            "Created reservation {} ({}) in {}",
            reservation.id,
            reservation.cidr,
            reservation.location()
        );
        Ok(reservation)
    }

    /// Find a reservation knowing only its id
    ///
    /// Lists every space once (no expansion, no utilization), scans the
    /// embedded reservation projections, then fetches the full reservation
    /// from the one matching block.
    ///
    /// # Errors
    /// * `IpamError::NotFound` - No block lists the id
    /// * `IpamError::IntegrityViolation` - More than one block lists it
    pub async fn find_by_id(&self, id: &str) -> Result<Reservation, IpamError> {
        debug!("Searching all spaces for reservation {}", id);
        let spaces = self.client.list_spaces(false, false).await?;

        let location =
            locate_reservation(&spaces, id)?.ok_or_else(|| IpamError::NotFound(id.to_string()))?;
        debug!("Reservation {} found in {}", id, location);

        self.client.get_reservation(&location.space, &location.block, id).await
    }

    /// Get a reservation from a known space and block
    ///
    /// # Errors
    /// * `IpamError::NotFound` - The id is not in that block
    pub async fn get_by_space_block(
        &self,
        space: &str,
        block: &str,
        id: &str,
    ) -> Result<Reservation, IpamError> {
        self.client.get_reservation(space, block, id).await
    }

    /// Delete a reservation
    ///
    /// Not idempotent: deleting an id that is already gone fails remotely and
    /// that failure is returned as is.
    ///
    /// # Errors
    /// * `IpamError::DeletionFailed` - Transport error or non-empty response body
    pub async fn delete(&self, space: &str, block: &str, id: &str) -> Result<(), IpamError> {
        let response = self
            .client
            .delete_reservations(space, block, &[id])
            .await
            .map_err(|e| IpamError::DeletionFailed {
                id: id.to_string(),
                reason: e.to_string(),
            })?;

        if !response.is_empty() {
            return Err(IpamError::DeletionFailed {
                id: id.to_string(),
                reason: response,
            });
        }

        info!("Deleted reservation {} from {}/{}", id, space, block);
        Ok(())
    }
}
