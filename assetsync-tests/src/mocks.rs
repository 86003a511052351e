//! Mock implementations for external services
//!
//! Provides a mock Assets API so clients can be exercised without a Jira site.

use crate::fixtures::config::{expected_authorization, WORKSPACE_ID};
use serde_json::{json, Value};
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Mock Assets API server
///
/// Every mounted navlist mock requires the Basic credentials from
/// [`crate::fixtures::config::env`], so a request with a wrong header falls
/// through to wiremock's default 404.
///
/// # Example
///
/// ```ignore
/// let api = MockAssetsApi::start().await;
/// api.mount_navlist_failure(401, "Unauthorized").await;
/// ```
pub struct MockAssetsApi {
    server: MockServer,
}

impl MockAssetsApi {
    /// Start a new mock server with nothing mounted
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL of the mock server, with a trailing slash
    pub fn uri(&self) -> String {
        format!("{}/", self.server.uri())
    }

    /// Path of the navlist endpoint
    pub fn navlist_path() -> String {
        format!(
            "/gateway/api/jsm/assets/workspace/{}/v1/object/navlist/aql",
            WORKSPACE_ID
        )
    }

    /// Path of the single-object endpoint
    pub fn object_path(object_id: &str) -> String {
        format!(
            "/gateway/api/jsm/assets/workspace/{}/v1/object/{}",
            WORKSPACE_ID, object_id
        )
    }

    /// Answer every navlist request with `body`
    pub async fn mount_navlist(&self, body: Value) {
        Mock::given(method("POST"))
            .and(path(Self::navlist_path()))
            .and(header("Authorization", expected_authorization()))
            .and(header("Content-Type", "application/json"))
            .and(header("Accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Answer the navlist request for `page` with `body`, expecting exactly `calls` hits
    pub async fn mount_navlist_page(&self, page: u32, body: Value, calls: u64) {
        Mock::given(method("POST"))
            .and(path(Self::navlist_path()))
            .and(header("Authorization", expected_authorization()))
            .and(body_partial_json(json!({"page": page})))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(calls)
            .mount(&self.server)
            .await;
    }

    /// Answer navlist requests with a non-success status
    pub async fn mount_navlist_failure(&self, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path(Self::navlist_path()))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// Answer navlist requests with a 200 that is not JSON
    pub async fn mount_navlist_garbage(&self) {
        Mock::given(method("POST"))
            .and(path(Self::navlist_path()))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&self.server)
            .await;
    }

    /// Answer a single-object lookup
    pub async fn mount_object(&self, object_id: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(Self::object_path(object_id)))
            .and(header("Authorization", expected_authorization()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Bodies of every navlist request received so far
    pub async fn navlist_bodies(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path() == Self::navlist_path())
            .filter_map(|r| serde_json::from_slice(&r.body).ok())
            .collect()
    }
}
