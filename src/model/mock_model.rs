//! # Mock Completion Model for Testing
//!
//! Provides a `MockCompletionModel` that implements the `CompletionModel` trait
//! for use in tests. It returns a predefined text response and counts how many
//! completions were requested, so tests can assert whether the assisted
//! extraction stage ran at all.

use rig::{
    completion::{
        AssistantContent, CompletionError, CompletionModel, CompletionRequest, CompletionResponse,
    },
    one_or_many::OneOrMany,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// A mock completion model for testing purposes.
#[derive(Debug, Clone, Default)]
pub struct MockCompletionModel {
    /// Text returned by every completion; empty when unset
    response: Arc<Mutex<Option<String>>>,

    /// Number of completions requested so far
    calls: Arc<AtomicUsize>,
}

impl MockCompletionModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock that answers every prompt with `text`
    pub async fn with_text_response(text: &str) -> Self {
        let model = Self::new();
        model.set_text_response(text).await;
        model
    }

    /// Sets the text the mock model should return.
    pub async fn set_text_response(&self, text: &str) {
        let mut guard = self.response.lock().await;
        *guard = Some(text.to_string());
    }

    /// Number of completions requested so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CompletionModel for MockCompletionModel {
    type Response = String;

    async fn completion(
        &self,
        _completion_request: CompletionRequest,
    ) -> Result<CompletionResponse<Self::Response>, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = self.response.lock().await.clone().unwrap_or_default();
        Ok(CompletionResponse {
            choice: OneOrMany::one(AssistantContent::text(&text)),
            raw_response: text,
        })
    }
}
