use std::fmt;
use std::time::Duration;

use clap::ValueEnum;
use url::Url;

use crate::types::OutputFormat;
use crate::{Error, Result};

pub const DEFAULT_DOMAIN: &str = "https://www.fleetmon.com";
pub const DEFAULT_LISTING_PATH: &str = "/maritime-news/";
pub const DEFAULT_CATEGORY: &str = "incidents";
pub const DEFAULT_MARKER_CLASS: &str = "continue-reading";
pub const DEFAULT_MAX_PAGE: u32 = 3;
pub const DEFAULT_CONTAINER: &str = "webscraping";
pub const DEFAULT_BASE_NAME: &str = "fleetmon_scraping_results";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UploadPolicy {
    /// Return the upload error to the caller
    Fail,
    /// Log the upload error and carry on
    Log,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BodyStrategy {
    /// Longest paragraph on the page
    Longest,
    /// Every paragraph joined by blank lines
    Joined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_backoff: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (0-based), doubling each time.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff * 2u32.saturating_pow(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_backoff: Duration::from_millis(500),
        }
    }
}

/// Where pages come from and how the scraped table is published.
#[derive(Clone)]
pub struct RunConfig {
    pub domain: String,
    pub listing_path: String,
    pub category: String,
    pub max_page: u32,
    pub marker_class: String,
    pub body_strategy: BodyStrategy,
    pub output_format: OutputFormat,
    pub container: String,
    pub base_name: String,
    pub connection_string: Option<String>,
    pub accept_invalid_certs: bool,
    pub timeout: Option<Duration>,
    pub concurrency: usize,
    pub retry: RetryPolicy,
    pub upload_policy: UploadPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            domain: DEFAULT_DOMAIN.to_string(),
            listing_path: DEFAULT_LISTING_PATH.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            max_page: DEFAULT_MAX_PAGE,
            marker_class: DEFAULT_MARKER_CLASS.to_string(),
            body_strategy: BodyStrategy::Longest,
            output_format: OutputFormat::Xlsx,
            container: DEFAULT_CONTAINER.to_string(),
            base_name: DEFAULT_BASE_NAME.to_string(),
            connection_string: None,
            accept_invalid_certs: false,
            timeout: Some(Duration::from_secs(30)),
            concurrency: 1,
            retry: RetryPolicy::default(),
            upload_policy: UploadPolicy::Fail,
        }
    }
}

impl RunConfig {
    /// Listing pages `1..=max_page` for the configured category.
    pub fn listing_page_urls(&self) -> Vec<String> {
        (1..=self.max_page)
            .map(|page| {
                format!(
                    "{}{}?page={}&category={}",
                    self.domain, self.listing_path, page, self.category
                )
            })
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.domain).map_err(|e| Error::InvalidUrl(format!("{}: {}", self.domain, e)))?;
        if self.max_page == 0 {
            return Err(Error::Config("max page must be at least 1".to_string()));
        }
        if self.concurrency == 0 {
            return Err(Error::Config("concurrency must be at least 1".to_string()));
        }
        if self.marker_class.trim().is_empty() {
            return Err(Error::Config("marker class must not be empty".to_string()));
        }
        if self.container.trim().is_empty() {
            return Err(Error::Config("container name must not be empty".to_string()));
        }
        if self.base_name.trim().is_empty() {
            return Err(Error::Config("base file name must not be empty".to_string()));
        }
        if self.accept_invalid_certs {
            tracing::warn!("⚠️ TLS certificate validation is disabled");
        }
        Ok(())
    }

    /// The storage connection string, or a configuration error naming the
    /// environment variable it is read from.
    pub fn require_connection_string(&self) -> Result<&str> {
        self.connection_string
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(
                    "storage connection string missing (set AZURE_STORAGE_CONNECTION_STRING)"
                        .to_string(),
                )
            })
    }
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("domain", &self.domain)
            .field("listing_path", &self.listing_path)
            .field("category", &self.category)
            .field("max_page", &self.max_page)
            .field("marker_class", &self.marker_class)
            .field("body_strategy", &self.body_strategy)
            .field("output_format", &self.output_format)
            .field("container", &self.container)
            .field("base_name", &self.base_name)
            .field(
                "connection_string",
                &self.connection_string.as_ref().map(|_| "<redacted>"),
            )
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("timeout", &self.timeout)
            .field("concurrency", &self.concurrency)
            .field("retry", &self.retry)
            .field("upload_policy", &self.upload_policy)
            .finish()
    }
}
