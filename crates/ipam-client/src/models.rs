//! IPAM API models
//!
//! These models match the JSON shapes served under `{base}/api/spaces`.
//! Field names on the wire are a mix of camelCase (`createdOn`), short
//! aliases (`desc`, `resv`, `tag`) and snake_case (`resource_group`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Tag the remote system generates on every reservation. Downstream
/// virtual network creation must echo it for the reservation to settle.
pub const RESERVATION_TAG: &str = "X-IPAM-RES-ID";

/// Lifecycle state of a reservation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReservationStatus {
    /// Pending consumption by a virtual network
    Wait,
    /// Consumed; the reservation is settled
    Fulfilled,
    /// Released explicitly before consumption
    CancelledByUser,
    /// Any status string this client does not know about
    Other(String),
}

impl ReservationStatus {
    /// Wire representation
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Wait => "wait",
            Self::Fulfilled => "fulfilled",
            Self::CancelledByUser => "cancelledByUser",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for ReservationStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "wait" => Self::Wait,
            "fulfilled" => Self::Fulfilled,
            "cancelledByUser" => Self::CancelledByUser,
            _ => Self::Other(value),
        }
    }
}

impl From<ReservationStatus> for String {
    fn from(value: ReservationStatus) -> Self {
        match value {
            ReservationStatus::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who settled a reservation, and when (epoch seconds)
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    /// Epoch seconds of the settlement
    pub on: f64,
    /// Identity that settled the reservation
    pub by: String,
}

/// Reservation model as returned by the reservations endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    /// Reservation id
    pub id: String,
    /// Owning space; filled from the request location when the API omits it
    #[serde(default)]
    pub space: String,
    /// Owning block; filled from the request location when the API omits it
    #[serde(default)]
    pub block: String,
    /// Assigned range
    pub cidr: String,
    /// Free-text description
    #[serde(rename = "desc", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Creation time, epoch seconds
    pub created_on: f64,
    /// Identity that created the reservation
    pub created_by: String,
    /// Settlement time, epoch seconds
    #[serde(default)]
    pub settled_on: Option<f64>,
    /// Identity that settled the reservation
    #[serde(default)]
    pub settled_by: Option<String>,
    /// Lifecycle status
    pub status: ReservationStatus,
    /// Tags to apply to the consuming network
    #[serde(rename = "tag", default, deserialize_with = "null_as_default")]
    pub tags: BTreeMap<String, String>,
}

impl Reservation {
    /// Settlement details, present only when both fields are set
    #[must_use]
    pub fn settlement(&self) -> Option<Settlement> {
        match (self.settled_on, &self.settled_by) {
            (Some(on), Some(by)) => Some(Settlement { on, by: by.clone() }),
            _ => None,
        }
    }

    /// `settledOn` and `settledBy` are either both present or both absent
    #[must_use]
    pub fn has_consistent_settlement(&self) -> bool {
        self.settled_on.is_some() == self.settled_by.is_some()
    }

    /// Creation time
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        epoch_to_utc(self.created_on)
    }

    /// Settlement time, if settled
    #[must_use]
    pub fn settled_at(&self) -> Option<DateTime<Utc>> {
        self.settled_on.and_then(epoch_to_utc)
    }

    /// Prefix length of the assigned range (`23` for `10.82.6.0/23`)
    #[must_use]
    pub fn prefix_len(&self) -> Option<u8> {
        cidr_prefix_len(&self.cidr)
    }

    /// Value of the `X-IPAM-RES-ID` tag
    #[must_use]
    pub fn reservation_tag(&self) -> Option<&str> {
        self.tags.get(RESERVATION_TAG).map(String::as_str)
    }

    /// `space/block` this reservation lives in
    #[must_use]
    pub fn location(&self) -> String {
        format!("{}/{}", self.space, self.block)
    }
}

/// Reduced reservation projection embedded in space/block listings (no tags)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationLite {
    /// Reservation id
    pub id: String,
    /// Assigned range
    pub cidr: String,
    /// Free-text description
    #[serde(rename = "desc", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Creation time, epoch seconds
    pub created_on: f64,
    /// Creator identity
    pub created_by: String,
    /// Settlement time, epoch seconds
    #[serde(default)]
    pub settled_on: Option<f64>,
    /// Settler identity
    #[serde(default)]
    pub settled_by: Option<String>,
    /// Lifecycle status
    pub status: ReservationStatus,
}

/// Space model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Space {
    /// Space name
    pub name: String,
    /// Free-text description
    #[serde(rename = "desc", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Blocks in the space
    #[serde(default, deserialize_with = "null_as_default")]
    pub blocks: Vec<Block>,
    /// Utilization, only present when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    /// Addresses in use, only present when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used: Option<f64>,
}

/// Block model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Block name
    pub name: String,
    /// Block range
    pub cidr: String,
    /// Associated virtual networks
    #[serde(default, deserialize_with = "null_as_default")]
    pub vnets: Vec<Vnet>,
    /// External networks
    #[serde(default, deserialize_with = "null_as_default")]
    pub externals: Vec<External>,
    /// Reservation projections
    #[serde(rename = "resv", default, deserialize_with = "null_as_default")]
    pub reservations: Vec<ReservationLite>,
    /// Total addresses, only present when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    /// Addresses in use, only present when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used: Option<f64>,
}

/// Virtual network associated to a block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vnet {
    /// Azure resource id
    pub id: String,
    /// Network name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Address prefixes
    #[serde(default, deserialize_with = "null_as_default")]
    pub prefixes: Vec<String>,
    /// Subnets
    #[serde(default, deserialize_with = "null_as_default")]
    pub subnets: Vec<Subnet>,
    /// Resource group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<String>,
    /// Subscription id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    /// Tenant id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// Total addresses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    /// Addresses in use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used: Option<f64>,
}

/// Subnet of a virtual network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subnet {
    /// Subnet name
    pub name: String,
    /// Subnet range
    pub prefix: String,
    /// Total addresses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    /// Addresses in use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used: Option<f64>,
}

/// Address range reserved for networks outside the managed cloud
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct External {
    /// External network name
    pub name: String,
    /// Free-text description
    #[serde(rename = "desc", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Reserved range
    pub cidr: String,
}

/// Body for `POST .../blocks/{block}/reservations` when sizing by prefix length
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeReservationBody {
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    /// Prefix length to reserve
    pub size: u8,
    /// Search from the end of the block
    #[serde(default)]
    pub reverse_search: bool,
    /// Prefer the smallest free range
    #[serde(default)]
    pub smallest_cidr: bool,
}

/// Body for `POST .../blocks/{block}/reservations` with an explicit range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CidrReservationBody {
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    /// Exact range to reserve
    pub cidr: String,
}

/// Body for `POST /api/spaces/{space}/reservations` (multi-block pool)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolReservationBody {
    /// Candidate blocks, in order
    pub blocks: Vec<String>,
    /// Prefix length to reserve
    pub size: u8,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    /// Search from the end of each block
    #[serde(default)]
    pub reverse_search: bool,
    /// Prefer the smallest free range
    #[serde(default)]
    pub smallest_cidr: bool,
}

/// Prefix length of a `a.b.c.d/n` string
#[must_use]
pub fn cidr_prefix_len(cidr: &str) -> Option<u8> {
    cidr.split_once('/').and_then(|(_, len)| len.parse().ok())
}

#[allow(clippy::cast_possible_truncation, reason = "epoch seconds fit in i64")]
fn epoch_to_utc(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    DateTime::from_timestamp(secs.trunc() as i64, 0)
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reservation_deserializes_wire_names() {
        let json = r#"{
            "id": "Pj8Lk2mQ",
            "space": "au",
            "block": "AustraliaEast",
            "cidr": "10.82.6.0/23",
            "desc": "acceptance-test",
            "createdOn": 1700000000.25,
            "createdBy": "ops@example.com",
            "settledOn": null,
            "settledBy": null,
            "status": "wait",
            "tag": { "X-IPAM-RES-ID": "Pj8Lk2mQ" }
        }"#;

        let r: Reservation = serde_json::from_str(json).unwrap();
        assert_eq!(r.description.as_deref(), Some("acceptance-test"));
        assert_eq!(r.status, ReservationStatus::Wait);
        assert_eq!(r.reservation_tag(), Some("Pj8Lk2mQ"));
        assert_eq!(r.prefix_len(), Some(23));
        assert!(r.settlement().is_none());
        assert!(r.has_consistent_settlement());
        assert_eq!(r.created_at().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_unknown_status_is_preserved() {
        let status: ReservationStatus = serde_json::from_str(r#""errOverlap""#).unwrap();
        assert_eq!(status, ReservationStatus::Other("errOverlap".to_string()));
        assert_eq!(serde_json::to_string(&status).unwrap(), r#""errOverlap""#);
    }

    #[test]
    fn test_half_settled_is_inconsistent() {
        let json = r#"{"id":"a","cidr":"10.0.0.0/24","createdOn":1,"createdBy":"x",
            "settledOn":5,"status":"fulfilled","tag":null}"#;
        let r: Reservation = serde_json::from_str(json).unwrap();
        assert!(!r.has_consistent_settlement());
        assert!(r.settlement().is_none());
        assert!(r.tags.is_empty());
    }

    #[test]
    fn test_block_listing_with_null_collections() {
        let json = r#"{"name":"b1","cidr":"10.0.0.0/16","vnets":null,"externals":null,
            "resv":[{"id":"r1","cidr":"10.0.0.0/24","createdOn":1,"createdBy":"x","status":"wait"}]}"#;
        let b: Block = serde_json::from_str(json).unwrap();
        assert!(b.vnets.is_empty());
        assert_eq!(b.reservations.len(), 1);
        assert_eq!(b.reservations[0].id, "r1");
        assert!(b.size.is_none());
    }

    #[test]
    fn test_size_body_omits_missing_description() {
        let body = SizeReservationBody {
            desc: None,
            size: 24,
            reverse_search: false,
            smallest_cidr: true,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("desc").is_none());
        assert!(value.get("cidr").is_none());
        assert_eq!(value["smallest_cidr"], true);
    }
}
