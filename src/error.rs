//! Error types for the harvest crate

use thiserror::Error;

/// Result type for harvest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for harvest operations
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Web crawling error
    #[error("Crawl error: {0}")]
    Crawl(String),

    /// Geocoding error
    #[error("Geocoding error: {0}")]
    Geo(String),

    /// Program extraction error
    #[error("Extraction error: {0}")]
    Extract(String),

    /// Output table error
    #[error("Output error: {0}")]
    Output(String),

    /// PDF reading error
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}
