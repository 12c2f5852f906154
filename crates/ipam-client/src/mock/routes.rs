//! Request routing for MockTransport
//!
//! Handles spaces, blocks and reservations endpoints. Every handler returns a
//! status code and a response body, exactly as the HTTP transport would see
//! them.

use super::allocation::{carve, Ipv4Net};
use super::{lock, MockBlock, MockSpace, MockTransport};
use crate::models::*;
use reqwest::Method;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};

type Response = (u16, String);

fn ok<T: serde::Serialize>(value: &T) -> Response {
    match serde_json::to_string(value) {
        Ok(body) => (200, body),
        Err(e) => (500, json!({ "error": e.to_string() }).to_string()),
    }
}

fn error(status: u16, msg: &str) -> Response {
    (status, json!({ "error": msg }).to_string())
}

#[allow(clippy::cast_precision_loss, reason = "epoch seconds are far below 2^52")]
pub(crate) fn now() -> f64 {
    chrono::Utc::now().timestamp() as f64
}

pub(crate) fn dispatch(
    mock: &MockTransport,
    method: &Method,
    path: &str,
    body: Option<&Value>,
) -> Response {
    let (route, query) = path.split_once('?').unwrap_or((path, ""));
    let params: HashMap<&str, &str> = query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .collect();
    let flag = |name: &str| params.get(name).is_some_and(|v| *v == "true");

    let Some(rest) = route.strip_prefix("/api/") else {
        return error(404, "Not Found");
    };
    let segments: Vec<String> = rest
        .split('/')
        .map(|s| urlencoding::decode(s).map_or_else(|_| s.to_string(), |d| d.into_owned()))
        .collect();
    let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

    match (method.as_str(), segments.as_slice()) {
        ("GET", ["spaces"]) => list_spaces(mock, flag("utilization")),
        ("GET", ["spaces", space]) => get_space(mock, space, flag("utilization")),
        ("GET", ["spaces", space, "blocks"]) => list_blocks(mock, space, flag("utilization")),
        ("GET", ["spaces", space, "blocks", block]) => {
            get_block(mock, space, block, flag("utilization"))
        }
        ("GET", ["spaces", space, "blocks", block, "reservations"]) => {
            list_reservations(mock, space, block, flag("settled"))
        }
        ("POST", ["spaces", space, "blocks", block, "reservations"]) => {
            create_block_reservation(mock, space, block, body)
        }
        ("POST", ["spaces", space, "reservations"]) => create_pool_reservation(mock, space, body),
        ("DELETE", ["spaces", space, "blocks", block, "reservations"]) => {
            delete_reservations(mock, space, block, body)
        }
        _ => error(404, "Not Found"),
    }
}

fn live(reservation: &Reservation) -> bool {
    reservation.status != ReservationStatus::CancelledByUser
}

fn used(block: &MockBlock) -> f64 {
    block
        .reservations
        .iter()
        .filter(|r| live(r))
        .filter_map(|r| Ipv4Net::parse(&r.cidr))
        .map(|n| n.len() as f64)
        .sum()
}

fn block_view(block: &MockBlock, utilization: bool) -> Block {
    let size = Ipv4Net::parse(&block.cidr).map(|n| n.len() as f64);
    Block {
        name: block.name.clone(),
        cidr: block.cidr.clone(),
        vnets: Vec::new(),
        externals: block.externals.clone(),
        reservations: block
            .reservations
            .iter()
            .map(|r| ReservationLite {
                id: r.id.clone(),
                cidr: r.cidr.clone(),
                description: r.description.clone(),
                created_on: r.created_on,
                created_by: r.created_by.clone(),
                settled_on: r.settled_on,
                settled_by: r.settled_by.clone(),
                status: r.status.clone(),
            })
            .collect(),
        size: if utilization { size } else { None },
        used: if utilization { Some(used(block)) } else { None },
    }
}

fn space_view(space: &MockSpace, utilization: bool) -> Space {
    let blocks: Vec<Block> = space.blocks.iter().map(|b| block_view(b, utilization)).collect();
    let (size, used) = if utilization {
        (
            Some(blocks.iter().filter_map(|b| b.size).sum::<f64>()),
            Some(blocks.iter().filter_map(|b| b.used).sum::<f64>()),
        )
    } else {
        (None, None)
    };
    Space {
        name: space.name.clone(),
        description: space.description.clone(),
        blocks,
        size,
        used,
    }
}

fn list_spaces(mock: &MockTransport, utilization: bool) -> Response {
    let spaces = lock(&mock.spaces);
    let views: Vec<Space> = spaces.iter().map(|s| space_view(s, utilization)).collect();
    ok(&views)
}

fn get_space(mock: &MockTransport, name: &str, utilization: bool) -> Response {
    let spaces = lock(&mock.spaces);
    match spaces.iter().find(|s| s.name == name) {
        Some(space) => ok(&space_view(space, utilization)),
        None => error(404, "Invalid space name."),
    }
}

fn list_blocks(mock: &MockTransport, space: &str, utilization: bool) -> Response {
    let spaces = lock(&mock.spaces);
    match spaces.iter().find(|s| s.name == space) {
        Some(s) => ok(&s.blocks.iter().map(|b| block_view(b, utilization)).collect::<Vec<_>>()),
        None => error(404, "Invalid space name."),
    }
}

fn get_block(mock: &MockTransport, space: &str, block: &str, utilization: bool) -> Response {
    let spaces = lock(&mock.spaces);
    match find_block(&spaces, space, block) {
        Some(b) => ok(&block_view(b, utilization)),
        None => error(404, "Invalid space or block name."),
    }
}

fn find_block<'a>(spaces: &'a [MockSpace], space: &str, block: &str) -> Option<&'a MockBlock> {
    spaces
        .iter()
        .find(|s| s.name == space)
        .and_then(|s| s.blocks.iter().find(|b| b.name == block))
}

fn find_block_mut<'a>(
    spaces: &'a mut [MockSpace],
    space: &str,
    block: &str,
) -> Option<&'a mut MockBlock> {
    spaces
        .iter_mut()
        .find(|s| s.name == space)
        .and_then(|s| s.blocks.iter_mut().find(|b| b.name == block))
}

fn list_reservations(mock: &MockTransport, space: &str, block: &str, settled: bool) -> Response {
    let spaces = lock(&mock.spaces);
    match find_block(&spaces, space, block) {
        Some(b) => {
            let listed: Vec<&Reservation> = b
                .reservations
                .iter()
                .filter(|r| settled || r.status == ReservationStatus::Wait)
                .collect();
            ok(&listed)
        }
        None => error(404, "Invalid space or block name."),
    }
}

fn taken(block: &MockBlock) -> Vec<Ipv4Net> {
    block
        .reservations
        .iter()
        .filter(|r| live(r))
        .filter_map(|r| Ipv4Net::parse(&r.cidr))
        .collect()
}

fn new_reservation(
    mock: &MockTransport,
    space: &str,
    block: &str,
    cidr: Ipv4Net,
    desc: Option<String>,
) -> Reservation {
    let id = uuid::Uuid::new_v4().simple().to_string();
    let mut tags = BTreeMap::new();
    tags.insert(RESERVATION_TAG.to_string(), id.clone());
    Reservation {
        id,
        space: space.to_string(),
        block: block.to_string(),
        cidr: cidr.to_string(),
        description: desc,
        created_on: now(),
        created_by: mock.creator.clone(),
        settled_on: None,
        settled_by: None,
        status: ReservationStatus::Wait,
        tags,
    }
}

/// Range the request asks for inside `block`, or the error response
fn resolve_range(block: &MockBlock, body: &Value) -> Result<(Ipv4Net, Option<String>), Response> {
    let block_net =
        Ipv4Net::parse(&block.cidr).ok_or_else(|| error(500, "Block has an invalid CIDR."))?;
    let taken = taken(block);

    if body.get("cidr").is_some() {
        let req: CidrReservationBody =
            serde_json::from_value(body.clone()).map_err(|e| error(422, &e.to_string()))?;
        let net = Ipv4Net::parse(&req.cidr).ok_or_else(|| error(400, "Invalid CIDR value."))?;
        if !block_net.contains(net) {
            return Err(error(400, "Requested CIDR not within Block CIDR."));
        }
        if taken.iter().any(|t| t.overlaps(net)) {
            return Err(error(409, "Requested CIDR overlaps existing network(s)."));
        }
        return Ok((net, req.desc));
    }

    let req: SizeReservationBody =
        serde_json::from_value(body.clone()).map_err(|e| error(422, &e.to_string()))?;
    carve(block_net, &taken, req.size, req.reverse_search)
        .map(|net| (net, req.desc))
        .ok_or_else(|| error(409, "Unable to find a free range of the requested size in block."))
}

fn create_block_reservation(
    mock: &MockTransport,
    space: &str,
    block: &str,
    body: Option<&Value>,
) -> Response {
    let Some(body) = body else {
        return error(422, "Missing request body.");
    };
    let mut spaces = lock(&mock.spaces);
    let Some(b) = find_block_mut(&mut spaces, space, block) else {
        return error(404, "Invalid space or block name.");
    };

    match resolve_range(b, body) {
        Ok((net, desc)) => {
            let reservation = new_reservation(mock, space, block, net, desc);
            b.reservations.push(reservation.clone());
            (201, serde_json::to_string(&reservation).unwrap_or_default())
        }
        Err(response) => response,
    }
}

fn create_pool_reservation(mock: &MockTransport, space: &str, body: Option<&Value>) -> Response {
    let Some(body) = body else {
        return error(422, "Missing request body.");
    };
    let req: PoolReservationBody = match serde_json::from_value(body.clone()) {
        Ok(req) => req,
        Err(e) => return error(422, &e.to_string()),
    };

    let mut spaces = lock(&mock.spaces);
    let Some(s) = spaces.iter_mut().find(|s| s.name == space) else {
        return error(404, "Invalid space name.");
    };
    let known = |name: &&String| s.blocks.iter().any(|b| &b.name == *name);
    if let Some(missing) = req.blocks.iter().find(|name| !known(name)) {
        return error(400, &format!("Invalid block name: {missing}"));
    }

    for name in &req.blocks {
        let Some(b) = s.blocks.iter_mut().find(|b| &b.name == name) else {
            continue;
        };
        let Some(block_net) = Ipv4Net::parse(&b.cidr) else {
            continue;
        };
        if let Some(net) = carve(block_net, &taken(b), req.size, req.reverse_search) {
            let reservation = new_reservation(mock, space, name, net, req.desc.clone());
            b.reservations.push(reservation.clone());
            return (201, serde_json::to_string(&reservation).unwrap_or_default());
        }
    }

    error(409, "Unable to find a free range of the requested size in any of the blocks.")
}

fn delete_reservations(
    mock: &MockTransport,
    space: &str,
    block: &str,
    body: Option<&Value>,
) -> Response {
    let ids: Vec<String> = match body.map(|b| serde_json::from_value::<Vec<String>>(b.clone())) {
        Some(Ok(ids)) => ids,
        Some(Err(e)) => return error(422, &e.to_string()),
        None => return error(422, "Missing request body."),
    };

    let mut spaces = lock(&mock.spaces);
    let Some(b) = find_block_mut(&mut spaces, space, block) else {
        return error(404, "Invalid space or block name.");
    };

    let unknown: Vec<&String> = ids
        .iter()
        .filter(|id| !b.reservations.iter().any(|r| &r.id == *id))
        .collect();
    if !unknown.is_empty() {
        return error(400, &format!("Invalid Reservation ID(s): {unknown:?}"));
    }

    b.reservations.retain(|r| !ids.contains(&r.id));
    (200, String::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock() -> MockTransport {
        let mock = MockTransport::new("http://mock");
        mock.add_block("au", "AustraliaEast", "10.82.0.0/21");
        mock
    }

    #[test]
    fn test_unknown_route_is_404() {
        let (status, _) = dispatch(&mock(), &Method::GET, "/api/nothing/here", None);
        assert_eq!(status, 404);
        let (status, _) = dispatch(&mock(), &Method::GET, "/spaces", None);
        assert_eq!(status, 404);
    }

    #[test]
    fn test_overlapping_cidr_is_rejected() {
        let mock = mock();
        let body = json!({ "cidr": "10.82.0.0/24" });
        let path = "/api/spaces/au/blocks/AustraliaEast/reservations";
        assert_eq!(dispatch(&mock, &Method::POST, path, Some(&body)).0, 201);
        assert_eq!(dispatch(&mock, &Method::POST, path, Some(&body)).0, 409);

        let outside = json!({ "cidr": "10.83.0.0/24" });
        assert_eq!(dispatch(&mock, &Method::POST, path, Some(&outside)).0, 400);
    }

    #[test]
    fn test_unsettled_listing_hides_fulfilled() {
        let mock = mock();
        let path = "/api/spaces/au/blocks/AustraliaEast/reservations";
        let (_, created) = dispatch(&mock, &Method::POST, path, Some(&json!({ "size": 24 })));
        let created: Reservation = serde_json::from_str(&created).unwrap();
        assert!(mock.settle(&created.id, "vnet-owner"));

        let (_, pending) = dispatch(&mock, &Method::GET, &format!("{path}?settled=false"), None);
        let (_, all) = dispatch(&mock, &Method::GET, &format!("{path}?settled=true"), None);
        assert_eq!(serde_json::from_str::<Vec<Reservation>>(&pending).unwrap().len(), 0);
        assert_eq!(serde_json::from_str::<Vec<Reservation>>(&all).unwrap().len(), 1);
    }

    #[test]
    fn test_utilization_counts_live_reservations() {
        let mock = mock();
        let path = "/api/spaces/au/blocks/AustraliaEast/reservations";
        dispatch(&mock, &Method::POST, path, Some(&json!({ "size": 24 })));

        let detail = "/api/spaces/au?expand=false&utilization=true";
        let (_, body) = dispatch(&mock, &Method::GET, detail, None);
        let space: Space = serde_json::from_str(&body).unwrap();
        assert_eq!(space.size, Some(2048.0));
        assert_eq!(space.used, Some(256.0));
    }
}
