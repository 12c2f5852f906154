//! Integration tests for the IPAM client
//!
//! These tests require a running Azure IPAM instance.
//! Set AZUREIPAM_API_URL, AZUREIPAM_TOKEN, IPAM_TEST_SPACE and
//! IPAM_TEST_BLOCK environment variables to run.

use ipam_client::{
    AllocationRequest, IpamClient, IpamConfig, ReservationAllocator, ReservationStatus,
};

fn allocator() -> ReservationAllocator<ipam_client::HttpTransport> {
    let config = IpamConfig::from_env().expect("AZUREIPAM_API_URL and AZUREIPAM_TOKEN must be set");
    let client = IpamClient::from_config(&config).expect("Failed to create client");
    ReservationAllocator::new(client)
}

fn target() -> (String, String) {
    let space = std::env::var("IPAM_TEST_SPACE").expect("IPAM_TEST_SPACE must be set");
    let block = std::env::var("IPAM_TEST_BLOCK").expect("IPAM_TEST_BLOCK must be set");
    (space, block)
}

#[tokio::test]
#[ignore] // Requires running IPAM instance
async fn test_list_spaces() {
    let allocator = allocator();

    let spaces = allocator.client().list_spaces(false, true).await
        .expect("Failed to list spaces");

    println!("Found {} spaces", spaces.len());
}

#[tokio::test]
#[ignore]
async fn test_create_find_and_delete_reservation() {
    let allocator = allocator();
    let (space, block) = target();

    let request = AllocationRequest::by_size(space.clone(), [block.clone()], 28)
        .description("ipam-client integration test");
    let created = allocator.create(&request).await
        .expect("Failed to create reservation");
    assert_eq!(created.status, ReservationStatus::Wait);
    assert_eq!(created.reservation_tag(), Some(created.id.as_str()));

    let found = allocator.find_by_id(&created.id).await
        .expect("Failed to find reservation");
    assert_eq!(found.cidr, created.cidr);
    assert_eq!(found.space, space);
    assert_eq!(found.block, block);

    allocator.delete(&space, &block, &created.id).await
        .expect("Failed to delete reservation");
}

#[tokio::test]
#[ignore]
async fn test_list_reservations() {
    let allocator = allocator();
    let (space, block) = target();

    let reservations = allocator.client().list_reservations(&space, &block, true).await
        .expect("Failed to list reservations");

    println!("Found {} reservations in {}/{}", reservations.len(), space, block);
}
