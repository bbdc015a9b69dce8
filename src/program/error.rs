//! Error types for the program extractor

use crate::crawler::CrawlError;
use crate::error::Error as CrateError;
use rig::completion::CompletionError;
use thiserror::Error;

/// Error type for a single extraction stage
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The program page could not be retrieved
    #[error("Fetch error: {0}")]
    Fetch(#[from] CrawlError),

    /// The completion model failed
    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    /// The completion model answered with something other than a JSON array of talks
    #[error("Malformed assisted response: {source}")]
    MalformedResponse {
        /// Text returned by the model
        raw: String,
        /// Decode failure
        source: serde_json::Error,
    },
}

impl From<ExtractError> for CrateError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::Fetch(e) => e.into(),
            _ => CrateError::Extract(err.to_string()),
        }
    }
}
