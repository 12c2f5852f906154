//! Path builders for the IPAM API
//!
//! Every endpoint the client talks to is assembled here so space and block
//! names are always percent-encoded.

use urlencoding::encode;

/// `/api/spaces?expand=..&utilization=..`
pub fn spaces(expand: bool, utilization: bool) -> String {
    format!("/api/spaces?expand={expand}&utilization={utilization}")
}

/// `/api/spaces/{space}`
pub fn space(space: &str) -> String {
    format!("/api/spaces/{}", encode(space))
}

/// `/api/spaces/{space}?expand=..&utilization=..`
pub fn space_detail(name: &str, expand: bool, utilization: bool) -> String {
    format!("{}?expand={expand}&utilization={utilization}", space(name))
}

/// `/api/spaces/{space}/blocks?expand=..&utilization=..`
pub fn blocks(space_name: &str, expand: bool, utilization: bool) -> String {
    format!("{}/blocks?expand={expand}&utilization={utilization}", space(space_name))
}

/// `/api/spaces/{space}/blocks/{block}`
pub fn block(space_name: &str, block: &str) -> String {
    format!("{}/blocks/{}", space(space_name), encode(block))
}

/// `/api/spaces/{space}/blocks/{block}?expand=..&utilization=..`
pub fn block_detail(space_name: &str, block_name: &str, expand: bool, utilization: bool) -> String {
    format!("{}?expand={expand}&utilization={utilization}", block(space_name, block_name))
}

/// `/api/spaces/{space}/blocks/{block}/reservations`
pub fn block_reservations(space_name: &str, block_name: &str) -> String {
    format!("{}/reservations", block(space_name, block_name))
}

/// `/api/spaces/{space}/blocks/{block}/reservations?settled=..`
pub fn block_reservations_listing(space_name: &str, block_name: &str, settled: bool) -> String {
    format!("{}?settled={settled}", block_reservations(space_name, block_name))
}

/// `/api/spaces/{space}/reservations`
pub fn space_reservations(space_name: &str) -> String {
    format!("{}/reservations", space(space_name))
}
