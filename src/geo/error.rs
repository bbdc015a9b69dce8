//! Error types for the geocoding module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for geocoding lookups
#[derive(Debug, Error)]
pub enum GeoError {
    /// HTTP client error, including timeouts and undecodable bodies
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service answered with a non-200 status
    #[error("Geocoding service returned status {0}")]
    Status(u16),
}

impl From<GeoError> for CrateError {
    fn from(err: GeoError) -> Self {
        match err {
            GeoError::Http(e) => CrateError::Http(e),
            _ => CrateError::Geo(err.to_string()),
        }
    }
}
