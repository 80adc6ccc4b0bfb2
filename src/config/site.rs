//! Site configuration (_config.yml + environment)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors raised while validating configuration at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("content store project id is required (set SANITY_PROJECT_ID or content.project_id)")]
    MissingProjectId,
    #[error("content store dataset is required (set SANITY_DATASET or content.dataset)")]
    MissingDataset,
    #[error("invalid project id `{0}`: only lowercase letters, digits and dashes are allowed")]
    InvalidProjectId(String),
    #[error("invalid api version `{0}`: expected YYYY-MM-DD or 1")]
    InvalidApiVersion(String),
    #[error("unknown timezone `{0}`")]
    InvalidTimezone(String),
}

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub banner: String,
    pub favicon: String,

    // Dates
    pub date_format: String,
    pub timezone: String,

    // Directory
    pub public_dir: String,

    // Regeneration interval for post pages
    pub revalidate_secs: u64,

    // Content store
    #[serde(default)]
    pub content: ContentConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Web Developer Blog".to_string(),
            description: String::new(),
            banner: "/banner.jpg".to_string(),
            favicon: "/favicon.ico".to_string(),

            date_format: "MM/DD/YYYY".to_string(),
            timezone: "UTC".to_string(),

            public_dir: "public".to_string(),

            revalidate_secs: 60,

            content: ContentConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Check every field the server depends on, failing on the first problem
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.content.validate()?;
        self.timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|_| ConfigError::InvalidTimezone(self.timezone.clone()))?;
        Ok(())
    }

    /// Configured display timezone; `validate` guarantees it parses
    pub fn tz(&self) -> chrono_tz::Tz {
        self.timezone.parse().unwrap_or(chrono_tz::UTC)
    }
}

/// Connection settings for the hosted content store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub project_id: String,
    pub dataset: String,
    pub api_version: String,
    pub use_cdn: bool,
    /// Write token; comment creation fails without it
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// Override for the API origin (proxies and tests)
    pub api_host: Option<String>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            dataset: String::new(),
            api_version: "2021-10-21".to_string(),
            use_cdn: false,
            token: None,
            api_host: None,
        }
    }
}

impl ContentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project_id.trim().is_empty() {
            return Err(ConfigError::MissingProjectId);
        }
        if self.dataset.trim().is_empty() {
            return Err(ConfigError::MissingDataset);
        }
        let valid_id = self
            .project_id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !valid_id {
            return Err(ConfigError::InvalidProjectId(self.project_id.clone()));
        }
        let version = self.api_version.trim_start_matches('v');
        let valid_version =
            version == "1" || chrono::NaiveDate::parse_from_str(version, "%Y-%m-%d").is_ok();
        if !valid_version {
            return Err(ConfigError::InvalidApiVersion(self.api_version.clone()));
        }
        Ok(())
    }

    /// Origin used for read queries
    pub fn query_host(&self) -> String {
        match &self.api_host {
            Some(host) => host.trim_end_matches('/').to_string(),
            None if self.use_cdn => format!("https://{}.apicdn.sanity.io", self.project_id),
            None => format!("https://{}.api.sanity.io", self.project_id),
        }
    }

    /// Origin used for mutations, never the CDN
    pub fn mutate_host(&self) -> String {
        match &self.api_host {
            Some(host) => host.trim_end_matches('/').to_string(),
            None => format!("https://{}.api.sanity.io", self.project_id),
        }
    }

    /// Version path segment, e.g. `v2021-10-21`
    pub fn version_segment(&self) -> String {
        format!("v{}", self.api_version.trim_start_matches('v'))
    }
}
