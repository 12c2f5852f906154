//! Mock transport for unit testing
//!
//! This module provides an in-memory IPAM that implements `IpamTransport`, so
//! the client and allocator can be tested without a running instance.
//!
//! The mock is organized into:
//! - `routes.rs` - Method/path routing onto the in-memory store
//! - `allocation.rs` - IPv4 range arithmetic used to carve reservations
//! - `fixtures.rs` - Helper functions for building test models

mod allocation;
pub mod fixtures;
mod routes;

use crate::common::classify_response;
use crate::error::IpamError;
use crate::ipam_trait::IpamTransport;
use crate::models::*;
use reqwest::Method;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Creator recorded on reservations made through the mock
pub const DEFAULT_CREATOR: &str = "mock@ipam.local";

/// One request seen by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// HTTP method
    pub method: Method,
    /// Path including the query string
    pub path: String,
    /// JSON body, if any
    pub body: Option<serde_json::Value>,
}

impl RecordedRequest {
    /// Path without the query string
    pub fn route(&self) -> &str {
        self.path.split('?').next().unwrap_or(&self.path)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct MockBlock {
    pub(crate) name: String,
    pub(crate) cidr: String,
    pub(crate) externals: Vec<External>,
    pub(crate) reservations: Vec<Reservation>,
}

#[derive(Debug, Clone)]
pub(crate) struct MockSpace {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) blocks: Vec<MockBlock>,
}

type CannedResponses = HashMap<(Method, String), (u16, String)>;

/// Mock transport for testing
///
/// Stores spaces, blocks and reservations in memory (in insertion order) and
/// records every request it receives.
#[derive(Debug, Clone)]
pub struct MockTransport {
    pub(crate) base_url: String,
    pub(crate) creator: String,
    pub(crate) spaces: Arc<Mutex<Vec<MockSpace>>>,
    pub(crate) requests: Arc<Mutex<Vec<RecordedRequest>>>,
    pub(crate) canned: Arc<Mutex<CannedResponses>>,
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockTransport {
    /// Create a new, empty mock
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            creator: DEFAULT_CREATOR.to_string(),
            spaces: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            canned: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Set the identity recorded as `createdBy`
    #[must_use]
    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = creator.into();
        self
    }

    /// Add a space (for test setup)
    pub fn add_space(&self, name: &str, description: Option<&str>) {
        let mut spaces = lock(&self.spaces);
        if spaces.iter().any(|s| s.name == name) {
            return;
        }
        spaces.push(MockSpace {
            name: name.to_string(),
            description: description.map(str::to_string),
            blocks: Vec::new(),
        });
    }

    /// Add a block, creating its space if needed (for test setup)
    pub fn add_block(&self, space: &str, name: &str, cidr: &str) {
        self.add_space(space, None);
        let mut spaces = lock(&self.spaces);
        if let Some(s) = spaces.iter_mut().find(|s| s.name == space) {
            if s.blocks.iter().any(|b| b.name == name) {
                return;
            }
            s.blocks.push(MockBlock {
                name: name.to_string(),
                cidr: cidr.to_string(),
                externals: Vec::new(),
                reservations: Vec::new(),
            });
        }
    }

    /// Add an external network to a block (for test setup)
    pub fn add_external(&self, space: &str, block: &str, external: External) {
        if let Some(b) = lock(&self.spaces)
            .iter_mut()
            .find(|s| s.name == space)
            .and_then(|s| s.blocks.iter_mut().find(|b| b.name == block))
        {
            b.externals.push(external);
        }
    }

    /// Add a reservation to the block named by its `space`/`block` (for test setup)
    ///
    /// Returns `false` if that block has not been added.
    pub fn add_reservation(&self, reservation: Reservation) -> bool {
        let mut spaces = lock(&self.spaces);
        let block = spaces
            .iter_mut()
            .find(|s| s.name == reservation.space)
            .and_then(|s| s.blocks.iter_mut().find(|b| b.name == reservation.block));
        match block {
            Some(b) => {
                b.reservations.push(reservation);
                true
            }
            None => false,
        }
    }

    /// Mark a reservation as consumed by `by`
    ///
    /// Returns `false` if no reservation has that id.
    pub fn settle(&self, id: &str, by: &str) -> bool {
        let mut spaces = lock(&self.spaces);
        let found = spaces
            .iter_mut()
            .flat_map(|s| s.blocks.iter_mut())
            .flat_map(|b| b.reservations.iter_mut())
            .find(|r| r.id == id);
        match found {
            Some(r) => {
                r.status = ReservationStatus::Fulfilled;
                r.settled_on = Some(routes::now());
                r.settled_by = Some(by.to_string());
                true
            }
            None => false,
        }
    }

    /// Ids currently stored in a block
    pub fn reservation_ids(&self, space: &str, block: &str) -> Vec<String> {
        lock(&self.spaces)
            .iter()
            .find(|s| s.name == space)
            .and_then(|s| s.blocks.iter().find(|b| b.name == block))
            .map(|b| b.reservations.iter().map(|r| r.id.clone()).collect())
            .unwrap_or_default()
    }

    /// Answer `method path` (query string included) with a fixed response
    pub fn respond_with(&self, method: Method, path: &str, status: u16, body: impl Into<String>) {
        lock(&self.canned).insert((method, path.to_string()), (status, body.into()));
    }

    /// All requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Forget recorded requests
    pub fn clear_requests(&self) {
        lock(&self.requests).clear();
    }
}

#[async_trait::async_trait]
impl IpamTransport for MockTransport {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<String, IpamError> {
        lock(&self.requests).push(RecordedRequest {
            method: method.clone(),
            path: path.to_string(),
            body: body.clone(),
        });

        let canned = lock(&self.canned).get(&(method.clone(), path.to_string())).cloned();
        let (status, text) = match canned {
            Some(response) => response,
            None => routes::dispatch(self, &method, path, body.as_ref()),
        };
        classify_response(status, text)
    }
}
