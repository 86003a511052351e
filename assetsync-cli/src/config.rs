//! CLI configuration management

use anyhow::{Context, Result};
use assetsync_jira::config::{DEFAULT_MAX_PAGES, DEFAULT_RESULTS_PER_PAGE, DEFAULT_TIMEOUT_SECS};
use assetsync_jira::JiraConfig;
use clap::Args;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Options that shape requests to the Assets API
#[derive(Debug, Clone, Args)]
pub struct FetchSettings {
    /// Maximum number of result pages to request
    #[arg(long, env = "ASSETSYNC_MAX_PAGES", default_value_t = DEFAULT_MAX_PAGES)]
    pub max_pages: u32,

    /// Results requested per page (1-2000)
    #[arg(long, env = "ASSETSYNC_RESULTS_PER_PAGE", default_value_t = DEFAULT_RESULTS_PER_PAGE)]
    pub results_per_page: u32,

    /// HTTP request timeout in seconds
    #[arg(long, env = "ASSETSYNC_HTTP_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub http_timeout_secs: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            results_per_page: DEFAULT_RESULTS_PER_PAGE,
            http_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl FetchSettings {
    /// Load the Jira configuration from the environment with these overrides
    pub fn jira_config(&self) -> assetsync_jira::Result<JiraConfig> {
        self.jira_config_from(|key| std::env::var(key).ok())
    }

    pub fn jira_config_from<F>(&self, lookup: F) -> assetsync_jira::Result<JiraConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = JiraConfig::from_lookup(lookup)?
            .with_max_pages(self.max_pages)
            .with_results_per_page(self.results_per_page)
            .with_timeout(Duration::from_secs(self.http_timeout_secs));
        config.validate()?;
        Ok(config)
    }
}

/// Load a settings file into the process environment
///
/// With no explicit path, `.env` is looked up from the working directory and
/// its absence is not an error. Variables already set are never overridden.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>> {
    match path {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("Failed to load settings file {}", path.display()))?;
            Ok(Some(path.to_path_buf()))
        }
        None => match dotenvy::dotenv() {
            Ok(path) => Ok(Some(path)),
            Err(e) if e.not_found() => Ok(None),
            Err(e) => Err(e).context("Failed to load .env"),
        },
    }
}

/// Require `DATABASE_URL` to be present and non-blank
pub fn require_database_url(database_url: Option<&str>) -> Result<&str> {
    database_url
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL not set"))
}
