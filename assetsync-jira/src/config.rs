//! Assets API configuration loading and validation.
//!
//! Environment variables:
//! - `JIRA_BASE_URL`: Site URL, e.g. `https://example.atlassian.net/`
//! - `JIRA_WORKSPACE_ID`: Assets workspace identifier
//! - `JIRA_OBJECT_SCHEMA_ID`: Object schema to query
//! - `JIRA_OBJECT_TYPE_ID`: Object type to query
//! - `JIRA_EMAIL` + `JIRA_API_TOKEN`: Basic credentials
//! - `JIRA_AUTH_HEADER`: Precomputed Basic token, used when email/token are absent

use crate::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;
use std::time::Duration;

/// Largest page the navlist endpoint is asked for
pub const DEFAULT_RESULTS_PER_PAGE: u32 = 2000;

/// Pages fetched per run unless configured otherwise
pub const DEFAULT_MAX_PAGES: u32 = 1;

/// HTTP timeout for a single Assets API call
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Credentials used to build the `Authorization` header
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Account email and API token, encoded as `email:token`
    Basic { email: String, api_token: String },
    /// Already-encoded Basic token
    Header(String),
}

impl Credentials {
    /// Base64 token placed after `Basic ` in the header
    pub fn basic_token(&self) -> String {
        match self {
            Credentials::Basic { email, api_token } => {
                STANDARD.encode(format!("{}:{}", email, api_token))
            }
            Credentials::Header(value) => {
                let value = value.trim();
                match value.split_once(char::is_whitespace) {
                    Some((scheme, token)) if scheme.eq_ignore_ascii_case("basic") => {
                        token.trim().to_string()
                    }
                    None if value.eq_ignore_ascii_case("basic") => String::new(),
                    _ => value.to_string(),
                }
            }
        }
    }

    /// Full `Authorization` header value
    pub fn authorization_value(&self) -> String {
        format!("Basic {}", self.basic_token())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Basic { email, .. } => f
                .debug_struct("Basic")
                .field("email", email)
                .field("api_token", &"****")
                .finish(),
            Credentials::Header(_) => f.debug_tuple("Header").field(&"****").finish(),
        }
    }
}

/// Configuration for querying the Assets API
#[derive(Debug, Clone)]
pub struct JiraConfig {
    pub base_url: String,
    pub workspace_id: String,
    pub object_schema_id: String,
    pub object_type_id: String,
    pub credentials: Credentials,
    pub results_per_page: u32,
    pub max_pages: u32,
    pub timeout: Duration,
}

impl JiraConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    ///
    /// Every missing key is collected so that a single error names all of them.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut missing = Vec::new();
        let mut require = |key: &'static str| {
            get(key).unwrap_or_else(|| {
                missing.push(key);
                String::new()
            })
        };

        let base_url = require("JIRA_BASE_URL");
        let workspace_id = require("JIRA_WORKSPACE_ID");
        let object_schema_id = require("JIRA_OBJECT_SCHEMA_ID");
        let object_type_id = require("JIRA_OBJECT_TYPE_ID");

        let credentials = match (get("JIRA_EMAIL"), get("JIRA_API_TOKEN")) {
            (Some(email), Some(api_token)) => Some(Credentials::Basic { email, api_token }),
            _ => get("JIRA_AUTH_HEADER").map(Credentials::Header),
        };
        let credentials = match credentials {
            Some(c) => c,
            None => {
                missing.push("JIRA_EMAIL + JIRA_API_TOKEN (or JIRA_AUTH_HEADER)");
                Credentials::Header(String::new())
            }
        };

        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "missing required configuration: {}",
                missing.join(", ")
            )));
        }

        let config = Self {
            base_url,
            workspace_id,
            object_schema_id,
            object_type_id,
            credentials,
            results_per_page: DEFAULT_RESULTS_PER_PAGE,
            max_pages: DEFAULT_MAX_PAGES,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_results_per_page(mut self, results_per_page: u32) -> Self {
        self.results_per_page = results_per_page;
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.base_url.starts_with("https://") && !self.base_url.starts_with("http://") {
            return Err(Error::Config(
                "JIRA_BASE_URL must be a valid HTTP(S) URL".into(),
            ));
        }
        for (value, key) in [
            (&self.workspace_id, "JIRA_WORKSPACE_ID"),
            (&self.object_schema_id, "JIRA_OBJECT_SCHEMA_ID"),
            (&self.object_type_id, "JIRA_OBJECT_TYPE_ID"),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{} cannot be empty", key)));
            }
        }
        if self.credentials.basic_token().is_empty() {
            return Err(Error::Config("credentials cannot be empty".into()));
        }
        if self.results_per_page == 0 || self.results_per_page > DEFAULT_RESULTS_PER_PAGE {
            return Err(Error::Config(format!(
                "results_per_page must be between 1 and {}",
                DEFAULT_RESULTS_PER_PAGE
            )));
        }
        if self.max_pages == 0 {
            return Err(Error::Config("max_pages must be > 0".into()));
        }
        Ok(())
    }

    /// Site URL with exactly one trailing slash
    pub fn normalized_base_url(&self) -> String {
        format!("{}/", self.base_url.trim_end_matches('/'))
    }
}
