//! # Program Extractor Module
//!
//! Turns an event's program page into talks. Three stages are tried in a
//! fixed order and the first one producing talks wins:
//!
//! 1. `Stage::Modern`: the program page on the current site
//! 2. `Stage::Legacy`: the same page on the legacy site, complex layout first
//! 3. `Stage::Assisted`: the legacy page handed to a completion model
//!
//! A stage that fails (unreachable page, unparseable answer) is logged and
//! counts as producing nothing; `extract_talks` itself never fails.

use rig::agent::{Agent, AgentBuilder};
use rig::completion::CompletionModel;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::crawler::content_extraction::{primary_content, truncate_chars};
use crate::crawler::{CrawlError, CrawlerConfig, PageFetcher};
use crate::output::Record;

pub mod assisted;
mod config;
mod error;
pub mod legacy;
pub mod modern;

pub use config::{ExtractorConfig, ExtractorConfigBuilder};
pub use error::ExtractError;

/// Separators between author and title, in order of precedence
pub const AUTHOR_TITLE_SEPARATORS: &[&str] = &[" - ", ", ", " – "];

/// A talk found on a program page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Talk {
    pub year: String,
    pub event: String,
    pub author: String,
    pub title: String,
    pub link: Option<String>,
}

impl Talk {
    /// Build a talk from `"<author><sep><title>"` anchor text
    pub fn from_anchor_text(year: &str, event: &str, text: &str, link: Option<String>) -> Self {
        let (author, title) = split_author_title(text);
        Self {
            year: year.to_string(),
            event: event.to_string(),
            author: author.to_string(),
            title: title.to_string(),
            link,
        }
    }
}

impl Record for Talk {
    const HEADER: &'static [&'static str] = &["year", "event", "author", "title", "link"];
}

/// Split on the first separator present, by precedence
///
/// Without any separator the author is empty and the whole text is the title.
pub fn split_author_title(text: &str) -> (&str, &str) {
    AUTHOR_TITLE_SEPARATORS
        .iter()
        .find_map(|sep| text.split_once(*sep))
        .map(|(author, title)| (author.trim(), title.trim()))
        .unwrap_or(("", text.trim()))
}

/// Extraction stages in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Modern,
    Legacy,
    Assisted,
}

impl Stage {
    /// The order stages are tried in
    pub const ORDER: [Stage; 3] = [Stage::Modern, Stage::Legacy, Stage::Assisted];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Modern => "modern",
            Stage::Legacy => "legacy",
            Stage::Assisted => "assisted",
        }
    }
}

/// Extracts talks from program pages, falling back stage by stage
pub struct ProgramExtractor<'a, M: CompletionModel> {
    fetcher: &'a PageFetcher,
    crawler: &'a CrawlerConfig,
    config: ExtractorConfig,
    assistant: Option<Agent<M>>,
}

impl<'a, M: CompletionModel> ProgramExtractor<'a, M> {
    /// Create an extractor without a completion model; the assisted stage yields nothing
    pub fn new(fetcher: &'a PageFetcher, crawler: &'a CrawlerConfig, config: ExtractorConfig) -> Self {
        Self {
            fetcher,
            crawler,
            config,
            assistant: None,
        }
    }

    /// Enable the assisted stage with `model`
    pub fn with_assistant(mut self, model: M) -> Self {
        let agent = AgentBuilder::new(model)
            .preamble(assisted::INSTRUCTION)
            .build();
        self.assistant = Some(agent);
        self
    }

    /// Talks of one event from the first stage that finds any
    #[instrument(skip(self), fields(talks = tracing::field::Empty))]
    pub async fn extract_talks(&self, event_url: &str, year: &str, event: &str) -> Vec<Talk> {
        for stage in Stage::ORDER {
            match self.run_stage(stage, event_url, year, event).await {
                Ok(talks) if !talks.is_empty() => {
                    info!("{} stage found {} talks", stage.name(), talks.len());
                    tracing::Span::current().record("talks", talks.len());
                    return talks;
                }
                Ok(_) => debug!("{} stage found no talks", stage.name()),
                Err(ExtractError::MalformedResponse { raw, source }) => {
                    warn!("Discarding assisted response ({}): {}", source, raw);
                }
                Err(e) => warn!("{} stage failed: {}", stage.name(), e),
            }
        }

        info!("No talks found for {}", event_url);
        Vec::new()
    }

    async fn run_stage(
        &self,
        stage: Stage,
        event_url: &str,
        year: &str,
        event: &str,
    ) -> Result<Vec<Talk>, ExtractError> {
        let base_url = Url::parse(&self.crawler.base_url).map_err(CrawlError::from)?;

        match stage {
            Stage::Modern => {
                let url = self.crawler.program_url(event_url);
                let html = self.fetcher.get_text(&url).await?;
                Ok(modern::parse_program(&html, &base_url, year, event)?)
            }
            Stage::Legacy => {
                let url = self.crawler.legacy_program_url(event_url);
                let html = self.fetcher.get_text(&url).await?;
                Ok(legacy::parse_program(&html, &url, year, event)?)
            }
            Stage::Assisted => {
                let Some(agent) = &self.assistant else {
                    debug!("No completion model configured, skipping assisted stage");
                    return Ok(Vec::new());
                };

                let url = self.crawler.legacy_program_url(event_url);
                let html = self.fetcher.get_text(&url).await?;
                let content = primary_content(&html);
                let prompt =
                    assisted::build_prompt(truncate_chars(&content, self.config.max_content_chars));

                let answer = assisted::request_completion(agent, &prompt).await?;
                assisted::parse_response(&answer, &base_url, year, event)
            }
        }
    }
}
