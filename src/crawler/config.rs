//! # Crawler Configuration Module
//!
//! Configuration for fetching devopsdays pages: which hosts to talk to, how
//! long to wait for a response and how far apart consecutive requests are
//! spaced. It uses a builder pattern for flexible configuration.
//!
//! ## Key Components
//!
//! - `CrawlerConfig`: site hosts, timeout, request spacing and user agent
//! - `CrawlerConfigBuilder`: Builder pattern implementation for easier configuration

use std::time::Duration;

/// Configuration for the crawler
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Base URL of the current site, without trailing slash
    pub base_url: String,

    /// Base URL of the legacy site, without trailing slash
    pub legacy_base_url: String,

    /// Path of the events index page, relative to the base URL
    pub events_path: String,

    /// Timeout for a single request in seconds
    pub timeout_secs: u64,

    /// Delay in milliseconds between consecutive requests
    pub rate_limit_ms: u64,

    /// User agent to use for requests
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://devopsdays.org".to_string(),
            legacy_base_url: "https://legacy.devopsdays.org".to_string(),
            events_path: "/events/".to_string(),
            timeout_secs: 10,
            rate_limit_ms: 500,
            user_agent: format!("devopsdays-harvest/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Builder for CrawlerConfig
#[derive(Debug, Default)]
pub struct CrawlerConfigBuilder {
    config: CrawlerConfig,
}

impl CrawlerConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CrawlerConfig::default(),
        }
    }

    /// Set the base URL of the current site
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the base URL of the legacy site
    pub fn legacy_base_url(mut self, legacy_base_url: impl Into<String>) -> Self {
        self.config.legacy_base_url = legacy_base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the path of the events index page
    pub fn events_path(mut self, events_path: impl Into<String>) -> Self {
        self.config.events_path = events_path.into();
        self
    }

    /// Set the request timeout in seconds
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.config.timeout_secs = timeout_secs;
        self
    }

    /// Set the delay in milliseconds between requests
    pub fn rate_limit_ms(mut self, rate_limit_ms: u64) -> Self {
        self.config.rate_limit_ms = rate_limit_ms;
        self
    }

    /// Set the user agent to use for requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> CrawlerConfig {
        self.config
    }
}

impl CrawlerConfig {
    /// Create a new builder
    pub fn builder() -> CrawlerConfigBuilder {
        CrawlerConfigBuilder::new()
    }

    /// Get the rate limit as a Duration
    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    /// Get the request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Absolute URL of the events index page
    pub fn events_url(&self) -> String {
        format!("{}{}", self.base_url, self.events_path)
    }

    /// Program page of an event on the current site
    pub fn program_url(&self, event_url: &str) -> String {
        format!("{}/program", event_url.trim_end_matches('/'))
    }

    /// Program page of an event on the legacy site
    pub fn legacy_program_url(&self, event_url: &str) -> String {
        let legacy = match event_url.strip_prefix(&self.base_url) {
            Some(path) => format!("{}{}", self.legacy_base_url, path),
            None => event_url.to_string(),
        };
        self.program_url(&legacy)
    }
}
