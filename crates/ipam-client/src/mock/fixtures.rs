//! Helper functions for building IPAM models in tests

use crate::models::*;
use std::collections::BTreeMap;

/// Epoch seconds used for fixture creation times
pub const FIXTURE_CREATED_ON: f64 = 1_700_000_000.0;

/// A pending reservation carrying its own `X-IPAM-RES-ID` tag
pub fn reservation(id: &str, space: &str, block: &str, cidr: &str) -> Reservation {
    let mut tags = BTreeMap::new();
    tags.insert(RESERVATION_TAG.to_string(), id.to_string());
    Reservation {
        id: id.to_string(),
        space: space.to_string(),
        block: block.to_string(),
        cidr: cidr.to_string(),
        description: None,
        created_on: FIXTURE_CREATED_ON,
        created_by: super::DEFAULT_CREATOR.to_string(),
        settled_on: None,
        settled_by: None,
        status: ReservationStatus::Wait,
        tags,
    }
}

/// The listing projection of a reservation
pub fn lite(reservation: &Reservation) -> ReservationLite {
    ReservationLite {
        id: reservation.id.clone(),
        cidr: reservation.cidr.clone(),
        description: reservation.description.clone(),
        created_on: reservation.created_on,
        created_by: reservation.created_by.clone(),
        settled_on: reservation.settled_on,
        settled_by: reservation.settled_by.clone(),
        status: reservation.status.clone(),
    }
}

/// A block listing with the given reservation ids
pub fn block_with(name: &str, cidr: &str, ids: &[&str]) -> Block {
    Block {
        name: name.to_string(),
        cidr: cidr.to_string(),
        vnets: Vec::new(),
        externals: Vec::new(),
        reservations: ids
            .iter()
            .enumerate()
            .map(|(i, id)| lite(&reservation(id, "", name, &format!("10.{i}.0.0/24"))))
            .collect(),
        size: None,
        used: None,
    }
}

/// A space listing with the given blocks
pub fn space_with(name: &str, blocks: Vec<Block>) -> Space {
    Space {
        name: name.to_string(),
        description: None,
        blocks,
        size: None,
        used: None,
    }
}
