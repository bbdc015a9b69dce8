use std::sync::Arc;

use governor::DefaultDirectRateLimiter;
use rig::completion::{CompletionError, CompletionModel, CompletionRequest, CompletionResponse};
use tracing::{debug_span, info_span, Instrument};

use super::RateLimitResponse;

/// Completion model that waits for the limiter before every request
#[derive(Clone)]
pub struct RateLimitedCompletionModel<M: CompletionModel> {
    model: M,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl<M> RateLimitedCompletionModel<M>
where
    M: CompletionModel,
{
    pub fn new(model: M, limiter: DefaultDirectRateLimiter) -> Self {
        Self {
            model,
            limiter: Arc::new(limiter),
        }
    }
}

impl<M: CompletionModel> CompletionModel for RateLimitedCompletionModel<M> {
    type Response = RateLimitResponse<M::Response>;

    async fn completion(
        &self,
        completion_request: CompletionRequest,
    ) -> Result<CompletionResponse<Self::Response>, CompletionError> {
        self.limiter.until_ready().instrument(debug_span!("limiter")).await;
        let CompletionResponse { choice, raw_response } = self
            .model
            .completion(completion_request)
            .instrument(info_span!("completion"))
            .await?;
        Ok(CompletionResponse {
            choice,
            raw_response: RateLimitResponse { response: raw_response },
        })
    }
}
