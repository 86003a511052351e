//! Assets API HTTP client

use crate::config::JiraConfig;
use crate::types::{extract_records, record_from_entry, ExtractedPage, NavlistRequest};
use crate::{Error, RemoteAssetRecord, Result};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Response, StatusCode};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

/// Records gathered by a complete fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOutcome {
    pub records: Vec<RemoteAssetRecord>,
    /// Entries dropped for missing `id`/`label` or ids repeated from an earlier page
    pub dropped: usize,
    /// Pages requested
    pub pages: u32,
}

/// Client for the Jira Service Management Assets API
pub struct AssetsClient {
    config: JiraConfig,
    http_client: reqwest::Client,
}

impl AssetsClient {
    /// Create a new Assets client
    ///
    /// The configuration is validated before the HTTP client is built.
    pub fn new(config: JiraConfig) -> Result<Self> {
        config.validate()?;

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &JiraConfig {
        &self.config
    }

    /// `{base}gateway/api/jsm/assets/workspace/{workspaceId}/v1`
    fn workspace_url(&self) -> String {
        format!(
            "{}gateway/api/jsm/assets/workspace/{}/v1",
            self.config.normalized_base_url(),
            self.config.workspace_id
        )
    }

    /// AQL navlist endpoint
    pub fn navlist_url(&self) -> String {
        format!("{}/object/navlist/aql", self.workspace_url())
    }

    /// Single object endpoint
    pub fn object_url(&self, object_id: &str) -> String {
        format!("{}/object/{}", self.workspace_url(), object_id)
    }

    /// Fetch every configured page of customer objects.
    ///
    /// Stops after `max_pages`, on an empty or short page, or when the server
    /// flags the page as the last one. Ids already seen on an earlier page are
    /// skipped.
    #[instrument(
        skip(self),
        fields(
            http.method = "POST",
            object_schema_id = %self.config.object_schema_id,
            object_type_id = %self.config.object_type_id
        )
    )]
    pub async fn fetch(&self) -> Result<FetchOutcome> {
        let mut outcome = FetchOutcome::default();
        let mut seen = HashSet::new();

        for page_number in 1..=self.config.max_pages {
            let page = self.fetch_page(page_number).await?;
            outcome.pages = page_number;
            outcome.dropped += page.dropped;

            // Only ids from earlier pages count as repeats
            let mut page_ids = Vec::with_capacity(page.records.len());
            for record in page.records {
                if seen.contains(&record.object_id) {
                    outcome.dropped += 1;
                } else {
                    page_ids.push(record.object_id.clone());
                    outcome.records.push(record);
                }
            }
            seen.extend(page_ids);

            let short_page = page.entry_count < self.config.results_per_page as usize;
            if page.entry_count == 0 || short_page || page.is_last == Some(true) {
                break;
            }
            if page_number == self.config.max_pages {
                warn!(
                    max_pages = self.config.max_pages,
                    "Page limit reached with a full last page; later results were not fetched"
                );
            }
        }

        info!(
            records = outcome.records.len(),
            dropped = outcome.dropped,
            pages = outcome.pages,
            "Fetched customer objects"
        );

        Ok(outcome)
    }

    /// Fetch one navlist page
    pub async fn fetch_page(&self, page: u32) -> Result<ExtractedPage> {
        let body = NavlistRequest {
            object_type_id: &self.config.object_type_id,
            object_schema_id: &self.config.object_schema_id,
            include_attributes: true,
            page,
            results_per_page: self.config.results_per_page,
        };

        debug!(url = %self.navlist_url(), page, "Requesting navlist page");

        let response = self
            .http_client
            .post(self.navlist_url())
            .header(AUTHORIZATION, self.config.credentials.authorization_value())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?;

        let value = read_json(response).await?;
        let extracted = extract_records(&value)?;

        debug!(
            page,
            entries = extracted.entry_count,
            dropped = extracted.dropped,
            "Navlist page received"
        );

        Ok(extracted)
    }

    /// Look up a single object by id
    ///
    /// Returns `None` when the object does not exist. An object without a
    /// usable `id` or `label` is a `ResponseParse` error.
    #[instrument(skip(self), fields(http.method = "GET"))]
    pub async fn fetch_object(&self, object_id: &str) -> Result<Option<RemoteAssetRecord>> {
        let response = self
            .http_client
            .get(self.object_url(object_id))
            .header(AUTHORIZATION, self.config.credentials.authorization_value())
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let value = read_json(response).await?;
        record_from_entry(&value).map(Some).ok_or_else(|| {
            Error::ResponseParse(format!("object {} has no id or label", object_id))
        })
    }
}

/// Turn a response into JSON, failing on any non-2xx status
async fn read_json(response: Response) -> Result<Value> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(Error::RemoteRequest {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|e| Error::ResponseParse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use std::time::Duration;

    fn config(base_url: &str) -> JiraConfig {
        JiraConfig {
            base_url: base_url.to_string(),
            workspace_id: "ws-1".to_string(),
            object_schema_id: "8".to_string(),
            object_type_id: "101".to_string(),
            credentials: Credentials::Header("abc".to_string()),
            results_per_page: 2000,
            max_pages: 1,
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_navlist_url() {
        let client = AssetsClient::new(config("https://example.atlassian.net/")).unwrap();
        assert_eq!(
            client.navlist_url(),
            "https://example.atlassian.net/gateway/api/jsm/assets/workspace/ws-1/v1/object/navlist/aql"
        );
    }

    #[test]
    fn test_navlist_url_without_trailing_slash() {
        let client = AssetsClient::new(config("https://example.atlassian.net")).unwrap();
        assert!(client
            .navlist_url()
            .starts_with("https://example.atlassian.net/gateway/"));
    }

    #[test]
    fn test_object_url() {
        let client = AssetsClient::new(config("https://example.atlassian.net/")).unwrap();
        assert_eq!(
            client.object_url("42"),
            "https://example.atlassian.net/gateway/api/jsm/assets/workspace/ws-1/v1/object/42"
        );
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut cfg = config("https://example.atlassian.net/");
        cfg.workspace_id = String::new();
        assert!(AssetsClient::new(cfg).is_err());
    }

    #[test]
    fn test_remote_request_error_exposes_status() {
        let err = Error::RemoteRequest {
            status: 401,
            body: "Unauthorized".to_string(),
        };
        assert_eq!(err.status(), Some(401));
        assert!(err.to_string().contains("401"));
    }
}
