//! Unit tests for the IPAM client

#[cfg(test)]
mod tests {
    use crate::client::IpamClient;
    use crate::error::IpamError;
    use crate::mock::fixtures::reservation;
    use crate::mock::MockTransport;
    use crate::models::*;
    use reqwest::Method;

    fn client() -> (MockTransport, IpamClient<MockTransport>) {
        let mock = MockTransport::new("http://test-ipam");
        mock.add_space("au", Some("Australia"));
        mock.add_block("au", "AustraliaEast", "10.82.0.0/21");
        mock.add_block("au", "AustraliaSoutheast", "10.83.0.0/21");
        mock.add_block("eu", "WestEurope", "10.90.0.0/16");
        (mock.clone(), IpamClient::new(mock))
    }

    #[tokio::test]
    async fn test_list_spaces_keeps_order_and_projection() {
        let (mock, client) = client();
        mock.add_reservation(reservation("r1", "au", "AustraliaSoutheast", "10.83.0.0/24"));

        let spaces = client.list_spaces(false, false).await.unwrap();

        let names: Vec<&str> = spaces.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["au", "eu"]);
        assert_eq!(spaces[0].description.as_deref(), Some("Australia"));
        assert_eq!(spaces[0].blocks[1].reservations[0].id, "r1");
        assert!(spaces[0].size.is_none());
    }

    #[tokio::test]
    async fn test_get_space_with_utilization() {
        let (_, client) = client();

        let space = client.get_space("eu", false, true).await.unwrap();

        assert_eq!(space.blocks.len(), 1);
        assert_eq!(space.size, Some(65536.0));
        assert_eq!(space.used, Some(0.0));
    }

    #[tokio::test]
    async fn test_get_space_missing_surfaces_status() {
        let (mock, client) = client();

        let err = client.get_space("nowhere", false, false).await.unwrap_err();

        assert_eq!(err.status(), Some(404));
        assert_eq!(mock.requests()[0].path, "/api/spaces/nowhere?expand=false&utilization=false");
    }

    #[tokio::test]
    async fn test_list_and_get_blocks() {
        let (_, client) = client();

        let blocks = client.list_blocks("au", true, false).await.unwrap();
        assert_eq!(blocks.len(), 2);

        let block = client.get_block("au", "AustraliaEast", false, true).await.unwrap();
        assert_eq!(block.cidr, "10.82.0.0/21");
        assert_eq!(block.size, Some(2048.0));
    }

    #[tokio::test]
    async fn test_list_reservations_fills_location() {
        let (mock, client) = client();
        mock.respond_with(
            Method::GET,
            "/api/spaces/au/blocks/AustraliaEast/reservations?settled=false",
            200,
            r#"[{"id":"r9","cidr":"10.82.0.0/24","createdOn":1,"createdBy":"x","status":"wait","tag":{}}]"#,
        );

        let listed = client.list_reservations("au", "AustraliaEast", false).await.unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].space, "au");
        assert_eq!(listed[0].block, "AustraliaEast");
    }

    #[tokio::test]
    async fn test_malformed_body_is_serialization_error() {
        let (mock, client) = client();
        mock.respond_with(Method::GET, "/api/spaces?expand=false&utilization=false", 200, "<html>");

        let err = client.list_spaces(false, false).await.unwrap_err();

        assert!(matches!(err, IpamError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_names_are_percent_encoded() {
        let (mock, client) = client();
        mock.add_block("lab space", "East/1", "10.200.0.0/24");

        let listed = client.list_reservations("lab space", "East/1", true).await.unwrap();

        assert!(listed.is_empty());
        assert_eq!(
            mock.requests()[0].path,
            "/api/spaces/lab%20space/blocks/East%2F1/reservations?settled=true"
        );
    }

    #[tokio::test]
    async fn test_delete_reservations_sends_id_list() {
        let (mock, client) = client();
        mock.add_reservation(reservation("a", "au", "AustraliaEast", "10.82.0.0/24"));
        mock.add_reservation(reservation("b", "au", "AustraliaEast", "10.82.1.0/24"));

        let body = client.delete_reservations("au", "AustraliaEast", &["a", "b"]).await.unwrap();

        assert!(body.is_empty());
        assert!(mock.reservation_ids("au", "AustraliaEast").is_empty());
    }

    #[test]
    fn test_base_url() {
        let (_, client) = client();
        assert_eq!(client.base_url(), "http://test-ipam");
    }
}
