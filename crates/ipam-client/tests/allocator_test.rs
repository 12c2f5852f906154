//! End-to-end reservation lifecycle against the in-memory IPAM

use ipam_client::{
    AllocationRequest, IpamClient, IpamError, MockTransport, ReservationAllocator,
    ReservationStatus,
};
use std::sync::Arc;

fn setup() -> (MockTransport, ReservationAllocator<MockTransport>) {
    let mock = MockTransport::new("http://ipam.test").with_creator("ci@contoso.com");
    mock.add_block("prod", "EastUS", "10.10.0.0/20");
    mock.add_block("prod", "WestUS", "10.20.0.0/20");
    (mock.clone(), ReservationAllocator::new(IpamClient::new(mock)))
}

#[tokio::test]
async fn test_reserve_refresh_settle_release() {
    let (mock, allocator) = setup();

    let created = allocator
        .create(
            &AllocationRequest::by_size("prod", ["EastUS", "WestUS"], 24).description("app-vnet"),
        )
        .await
        .unwrap();
    assert_eq!(created.created_by, "ci@contoso.com");
    assert_eq!(created.block, "EastUS");
    assert_eq!(created.cidr, "10.10.0.0/24");

    // State only stores the id; refresh through the scan.
    let refreshed = allocator.find_by_id(&created.id).await.unwrap();
    assert_eq!(refreshed, created);

    assert!(mock.settle(&created.id, "vnet-deployer"));
    let settled = allocator.get_by_space_block("prod", "EastUS", &created.id).await.unwrap();
    assert_eq!(settled.status, ReservationStatus::Fulfilled);
    assert!(settled.has_consistent_settlement());
    assert!(settled.settled_at().is_some());

    allocator.delete("prod", "EastUS", &created.id).await.unwrap();
    assert!(allocator.find_by_id(&created.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_explicit_cidr_conflict_is_allocation_failure() {
    let (_, allocator) = setup();
    let request = AllocationRequest::by_cidr("prod", "WestUS", "10.20.4.0/22");

    allocator.create(&request).await.unwrap();
    let err = allocator.create(&request).await.unwrap_err();

    assert!(matches!(err, IpamError::AllocationFailed(_)));
    assert_eq!(err.status(), Some(409));
}

#[tokio::test]
async fn test_concurrent_creates_share_one_client() {
    let (mock, allocator) = setup();
    let allocator = Arc::new(allocator);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let allocator = Arc::clone(&allocator);
        handles.push(tokio::spawn(async move {
            allocator
                .create(&AllocationRequest::by_size("prod", ["EastUS"], 26))
                .await
        }));
    }

    let mut cidrs = Vec::new();
    for handle in handles {
        cidrs.push(handle.await.unwrap().unwrap().cidr);
    }
    cidrs.sort();
    cidrs.dedup();
    assert_eq!(cidrs.len(), 8);
    assert_eq!(mock.request_count(), 8);
}
