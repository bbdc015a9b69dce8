//! Geocoding configuration

use std::time::Duration;

/// Configuration for the geocoding client
#[derive(Debug, Clone)]
pub struct GeoConfig {
    /// Search endpoint of the geocoding API
    pub endpoint: String,

    /// Language of returned names
    pub language: String,

    /// Timeout for a single query in seconds
    pub timeout_secs: u64,

    /// Delay in milliseconds between consecutive queries
    pub rate_limit_ms: u64,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://geocoding-api.open-meteo.com/v1/search".to_string(),
            language: "en".to_string(),
            timeout_secs: 10,
            rate_limit_ms: 1000,
        }
    }
}

/// Builder for GeoConfig
#[derive(Debug, Default)]
pub struct GeoConfigBuilder {
    config: GeoConfig,
}

impl GeoConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: GeoConfig::default(),
        }
    }

    /// Set the search endpoint
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    /// Set the query timeout in seconds
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.config.timeout_secs = timeout_secs;
        self
    }

    /// Set the delay in milliseconds between queries
    pub fn rate_limit_ms(mut self, rate_limit_ms: u64) -> Self {
        self.config.rate_limit_ms = rate_limit_ms;
        self
    }

    /// Build the configuration
    pub fn build(self) -> GeoConfig {
        self.config
    }
}

impl GeoConfig {
    /// Create a new builder
    pub fn builder() -> GeoConfigBuilder {
        GeoConfigBuilder::new()
    }

    /// Get the rate limit as a Duration
    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    /// Get the query timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
