//! # LLM Client Module
//!
//! Completion model used by the assisted program-extraction stage, wrapped in
//! a rate limiter so a long run cannot exhaust the API quota.
//!
//! ## Key Components
//!
//! - `Client`: owns the rate-limited completion model
//! - `RateLimitedCompletionModel`: a wrapper that adds rate limiting to any completion model
//! - `MockCompletionModel` (tests only): canned responses with a call counter

use std::num::NonZeroU32;

use governor::{Quota, RateLimiter};
use ratelimited_completion::RateLimitedCompletionModel;
use rig::{completion::CompletionModel, providers::gemini};

use crate::error::{Error, Result};

#[cfg(test)]
pub mod mock_model;
pub mod ratelimited_completion;

/// Environment variable holding the Gemini API key
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Default completion model for assisted extraction
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Clone)]
pub struct Client<C>
where
    C: CompletionModel,
{
    completion_model: C,
}

pub struct RateLimitResponse<T> {
    #[allow(dead_code)]
    response: T,
}

impl Client<RateLimitedCompletionModel<gemini::completion::CompletionModel>> {
    /// Build a Gemini client from `GEMINI_API_KEY`
    pub fn new_gemini_from_env(model: &str) -> Result<Self> {
        let gemini_api_key = std::env::var(API_KEY_VAR)
            .map_err(|_| Error::Config(format!("{} environment variable must be set", API_KEY_VAR)))?;
        let gemini_client = gemini::Client::new(&gemini_api_key);
        Self::new_gemini(gemini_client, model, 30)
    }

    /// Build a Gemini client allowing `requests_per_minute` completions
    pub fn new_gemini(
        gemini_client: gemini::Client,
        model: &str,
        requests_per_minute: u32,
    ) -> Result<Self> {
        let quota = NonZeroU32::new(requests_per_minute)
            .ok_or_else(|| Error::Config("requests per minute must be positive".to_string()))?;
        let completion_model = RateLimitedCompletionModel::new(
            gemini_client.completion_model(model),
            RateLimiter::direct(Quota::per_minute(quota)),
        );
        Ok(Self { completion_model })
    }
}

impl<C> Client<C>
where
    C: CompletionModel,
{
    pub fn completion(&self) -> &C {
        &self.completion_model
    }
}
