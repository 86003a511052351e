//! Navlist Contract Tests
//!
//! These tests verify the contract between `AssetsClient` and the Assets API:
//! - Request path, headers and JSON body match what the endpoint expects
//! - Response bodies in either `objectEntries` or `values` form are understood
//! - Non-success statuses and malformed bodies surface as typed errors
//! - Pagination stops on the configured bounds

use assetsync_jira::{AssetsClient, Error, JiraConfig, RemoteAssetRecord};
use assetsync_tests::{fixtures, MockAssetsApi};
use serde_json::json;

fn client_for(api: &MockAssetsApi) -> AssetsClient {
    let config = JiraConfig::from_lookup(fixtures::config::lookup(&api.uri()))
        .expect("fixture config should be valid");
    AssetsClient::new(config).expect("client should build")
}

mod request_contract {
    use super::*;

    #[tokio::test]
    async fn sends_expected_body() {
        let api = MockAssetsApi::start().await;
        api.mount_navlist(fixtures::navlist::object_entries(&[])).await;

        client_for(&api).fetch().await.unwrap();

        let bodies = api.navlist_bodies().await;
        assert_eq!(bodies.len(), 1);
        assert_eq!(
            bodies[0],
            json!({
                "objectTypeId": "101",
                "objectSchemaId": "8",
                "includeAttributes": true,
                "page": 1,
                "resultsPerPage": 2000
            })
        );
    }

    #[tokio::test]
    async fn wrong_credentials_are_rejected_by_server() {
        let api = MockAssetsApi::start().await;
        api.mount_navlist(fixtures::navlist::object_entries(&[])).await;

        let mut vars = fixtures::config::env(&api.uri());
        vars.insert("JIRA_API_TOKEN".to_string(), "wrong".to_string());
        let config = JiraConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();
        let client = AssetsClient::new(config).unwrap();

        let err = client.fetch().await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }
}

mod response_contract {
    use super::*;

    #[tokio::test]
    async fn extracts_object_entries() {
        let api = MockAssetsApi::start().await;
        api.mount_navlist(fixtures::navlist::object_entries(&[
            fixtures::navlist::entry(1, "Acme"),
            fixtures::navlist::entry(2, "Globex"),
        ]))
        .await;

        let outcome = client_for(&api).fetch().await.unwrap();

        assert_eq!(
            outcome.records,
            vec![
                RemoteAssetRecord::new("1", "Acme"),
                RemoteAssetRecord::new("2", "Globex"),
            ]
        );
        assert_eq!(outcome.dropped, 0);
        assert_eq!(outcome.pages, 1);
    }

    #[tokio::test]
    async fn falls_back_to_values() {
        let api = MockAssetsApi::start().await;
        api.mount_navlist(fixtures::navlist::values(&[fixtures::navlist::entry(
            7, "Initech",
        )]))
        .await;

        let outcome = client_for(&api).fetch().await.unwrap();
        assert_eq!(outcome.records, vec![RemoteAssetRecord::new("7", "Initech")]);
    }

    #[tokio::test]
    async fn drops_entries_without_label() {
        let api = MockAssetsApi::start().await;
        api.mount_navlist(fixtures::navlist::object_entries(&[
            fixtures::navlist::entry(1, "A"),
            fixtures::navlist::unlabeled(2),
        ]))
        .await;

        let outcome = client_for(&api).fetch().await.unwrap();
        assert_eq!(outcome.records, vec![RemoteAssetRecord::new("1", "A")]);
        assert_eq!(outcome.dropped, 1);
    }

    #[tokio::test]
    async fn repeated_id_within_one_page_is_kept() {
        let api = MockAssetsApi::start().await;
        api.mount_navlist(fixtures::navlist::object_entries(&[
            fixtures::navlist::entry(1, "Old"),
            fixtures::navlist::entry(2, "B"),
            fixtures::navlist::entry(1, "New"),
        ]))
        .await;

        let outcome = client_for(&api).fetch().await.unwrap();

        assert_eq!(
            outcome.records,
            vec![
                RemoteAssetRecord::new("1", "Old"),
                RemoteAssetRecord::new("2", "B"),
                RemoteAssetRecord::new("1", "New"),
            ]
        );
        assert_eq!(outcome.dropped, 0);
    }

    #[tokio::test]
    async fn non_success_status_is_remote_request_error() {
        let api = MockAssetsApi::start().await;
        api.mount_navlist_failure(503, "maintenance").await;

        let err = client_for(&api).fetch().await.unwrap_err();
        match err {
            Error::RemoteRequest { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("expected RemoteRequest, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_parse_error() {
        let api = MockAssetsApi::start().await;
        api.mount_navlist_garbage().await;

        let err = client_for(&api).fetch().await.unwrap_err();
        assert!(matches!(err, Error::ResponseParse(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_http_error() {
        let config = JiraConfig::from_lookup(fixtures::config::lookup("http://127.0.0.1:9/")).unwrap();
        let client = AssetsClient::new(config).unwrap();

        let err = client.fetch().await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }
}

mod pagination {
    use super::*;

    #[tokio::test]
    async fn single_page_by_default_even_when_full() {
        let api = MockAssetsApi::start().await;
        api.mount_navlist_page(
            1,
            fixtures::navlist::object_entries(&fixtures::navlist::batch(1, 3)),
            1,
        )
        .await;
        api.mount_navlist_page(
            2,
            fixtures::navlist::object_entries(&fixtures::navlist::batch(4, 3)),
            0,
        )
        .await;

        let config = JiraConfig::from_lookup(fixtures::config::lookup(&api.uri()))
            .unwrap()
            .with_results_per_page(3);
        let outcome = AssetsClient::new(config).unwrap().fetch().await.unwrap();

        assert_eq!(outcome.records.len(), 3);
        assert_eq!(outcome.pages, 1);
    }

    #[tokio::test]
    async fn follows_full_pages_until_short_page() {
        let api = MockAssetsApi::start().await;
        api.mount_navlist_page(
            1,
            fixtures::navlist::object_entries(&fixtures::navlist::batch(1, 2)),
            1,
        )
        .await;
        api.mount_navlist_page(
            2,
            fixtures::navlist::object_entries(&fixtures::navlist::batch(3, 1)),
            1,
        )
        .await;
        api.mount_navlist_page(
            3,
            fixtures::navlist::object_entries(&fixtures::navlist::batch(4, 2)),
            0,
        )
        .await;

        let config = JiraConfig::from_lookup(fixtures::config::lookup(&api.uri()))
            .unwrap()
            .with_results_per_page(2)
            .with_max_pages(10);
        let outcome = AssetsClient::new(config).unwrap().fetch().await.unwrap();

        let ids: Vec<_> = outcome.records.iter().map(|r| r.object_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(outcome.pages, 2);
    }

    #[tokio::test]
    async fn repeated_ids_across_pages_are_skipped() {
        let api = MockAssetsApi::start().await;
        api.mount_navlist_page(
            1,
            fixtures::navlist::object_entries(&fixtures::navlist::batch(1, 2)),
            1,
        )
        .await;
        api.mount_navlist_page(
            2,
            fixtures::navlist::object_entries(&fixtures::navlist::batch(2, 1)),
            1,
        )
        .await;

        let config = JiraConfig::from_lookup(fixtures::config::lookup(&api.uri()))
            .unwrap()
            .with_results_per_page(2)
            .with_max_pages(5);
        let outcome = AssetsClient::new(config).unwrap().fetch().await.unwrap();

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.dropped, 1);
    }
}

mod object_lookup {
    use super::*;

    #[tokio::test]
    async fn returns_record_for_existing_object() {
        let api = MockAssetsApi::start().await;
        api.mount_object("42", fixtures::navlist::entry(42, "Umbrella"))
            .await;

        let record = client_for(&api).fetch_object("42").await.unwrap();
        assert_eq!(record, Some(RemoteAssetRecord::new("42", "Umbrella")));
    }

    #[tokio::test]
    async fn object_without_label_is_parse_error() {
        let api = MockAssetsApi::start().await;
        api.mount_object("42", fixtures::navlist::unlabeled(42)).await;

        let err = client_for(&api).fetch_object("42").await.unwrap_err();
        assert!(matches!(err, Error::ResponseParse(_)));
    }

    #[tokio::test]
    async fn missing_object_is_none() {
        let api = MockAssetsApi::start().await;

        let record = client_for(&api).fetch_object("404").await.unwrap();
        assert_eq!(record, None);
    }
}
