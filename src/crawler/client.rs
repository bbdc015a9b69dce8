//! HTTP page fetching with a fixed delay between requests

use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client as ReqwestClient;
use tracing::{debug, debug_span, instrument, warn, Instrument};

use crate::crawler::config::CrawlerConfig;
use crate::crawler::error::CrawlError;

/// Build a limiter that lets one request through per `delay`.
///
/// Returns `None` for a zero delay so that callers skip throttling entirely.
pub(crate) fn request_limiter(delay: Duration) -> Option<DefaultDirectRateLimiter> {
    Quota::with_period(delay).map(RateLimiter::direct)
}

/// Fetches pages one at a time, spacing requests by the configured delay
pub struct PageFetcher {
    /// The underlying reqwest client
    client: ReqwestClient,

    /// Spacing between consecutive requests
    limiter: Option<DefaultDirectRateLimiter>,
}

impl PageFetcher {
    /// Create a fetcher from the crawler configuration
    pub fn new(config: &CrawlerConfig) -> Result<Self, CrawlError> {
        let client = ReqwestClient::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            limiter: request_limiter(config.rate_limit()),
        })
    }

    async fn throttle(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().instrument(debug_span!("limiter")).await;
        }
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, CrawlError> {
        self.throttle().await;
        debug!("Sending GET request to {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    /// Fetch a page body as text, failing on transport errors and non-2xx statuses
    #[instrument(skip(self), level = "debug")]
    pub async fn get_text(&self, url: &str) -> Result<String, CrawlError> {
        let response = self.get(url).await?;
        Ok(response.text().await?)
    }

    /// Fetch a binary resource such as a PDF
    #[instrument(skip(self), level = "debug")]
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, CrawlError> {
        let response = self.get(url).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Fetch a page body, logging failures and mapping them to `None`
    pub async fn fetch(&self, url: &str) -> Option<String> {
        match self.get_text(url).await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!("Failed to fetch {}: {}", url, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use std::time::Instant;

    fn test_config(server: &Server) -> CrawlerConfig {
        CrawlerConfig::builder()
            .base_url(server.url())
            .rate_limit_ms(0)
            .build()
    }

    #[tokio::test]
    async fn test_get_text_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/events/")
            .with_status(200)
            .with_body("<html>ok</html>")
            .expect(1)
            .create_async()
            .await;

        let fetcher = PageFetcher::new(&test_config(&server)).unwrap();
        let body = fetcher
            .get_text(&format!("{}/events/", server.url()))
            .await
            .unwrap();
        assert_eq!(body, "<html>ok</html>");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = PageFetcher::new(&test_config(&server)).unwrap();
        let url = format!("{}/missing", server.url());
        let result = fetcher.get_text(&url).await;
        assert!(matches!(result, Err(CrawlError::Status { status: 404, .. })));
        assert!(fetcher.fetch(&url).await.is_none());
    }

    #[tokio::test]
    async fn test_requests_are_spaced_by_the_delay() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/events/")
            .with_status(200)
            .with_body("<html>ok</html>")
            .expect(2)
            .create_async()
            .await;

        let config = CrawlerConfig::builder()
            .base_url(server.url())
            .rate_limit_ms(200)
            .build();
        let fetcher = PageFetcher::new(&config).unwrap();
        let url = format!("{}/events/", server.url());

        let start = Instant::now();
        fetcher.get_text(&url).await.unwrap();
        fetcher.get_text(&url).await.unwrap();

        // Allow for the limiter clock running slightly apart from Instant
        assert!(start.elapsed() >= Duration::from_millis(180), "{:?}", start.elapsed());
        mock.assert_async().await;
    }

    #[test]
    fn test_zero_delay_disables_limiter() {
        assert!(request_limiter(Duration::ZERO).is_none());
        assert!(request_limiter(Duration::from_millis(250)).is_some());
    }
}
