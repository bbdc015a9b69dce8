//! Event enumeration from the devopsdays events index page
//!
//! The index lists events under year headings (`h4.events-page-months`),
//! each event being an anchor with class `events-page-event`. Both kinds of
//! element are visited in document order so every anchor picks up the most
//! recent heading above it.

use serde::{Deserialize, Serialize};
use scraper::Html;
use tracing::{info, warn};
use url::Url;

use crate::crawler::client::PageFetcher;
use crate::crawler::config::CrawlerConfig;
use crate::crawler::content_extraction::{element_text, resolve_link, selector};
use crate::crawler::error::CrawlError;
use crate::geo::normalize_city;

/// An event listed on the events index page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Year heading the event was listed under
    pub year: String,

    /// Anchor text as displayed on the index
    pub raw_label: String,

    /// City derived from the label
    pub normalized_city: String,

    /// Country, when the event has been geocoded
    pub country: Option<String>,

    /// Absolute URL of the event page
    pub url: String,
}

impl Event {
    /// Create an event, deriving the normalized city from its label
    pub fn new(year: impl Into<String>, raw_label: impl Into<String>, url: impl Into<String>) -> Self {
        let raw_label = raw_label.into();
        Self {
            year: year.into(),
            normalized_city: normalize_city(&raw_label),
            raw_label,
            country: None,
            url: url.into(),
        }
    }

    /// The same event with its country resolved
    pub fn with_country(self, country: impl Into<String>) -> Self {
        Self {
            country: Some(country.into()),
            ..self
        }
    }

    /// Label written to output tables
    ///
    /// `"<city> - <country>"` once geocoded, the raw label otherwise.
    pub fn label(&self) -> String {
        match &self.country {
            Some(country) => format!("{} - {}", self.normalized_city, country),
            None => self.raw_label.clone(),
        }
    }
}

/// Parse the events index into events, in document order
pub fn parse_events_index(html: &str, base_url: &Url) -> Result<Vec<Event>, CrawlError> {
    let document = Html::parse_document(html);
    let entries = selector("h4.events-page-months, a.events-page-event")?;

    let mut events = Vec::new();
    let mut current_year: Option<String> = None;

    for element in document.select(&entries) {
        if element.value().name() == "h4" {
            current_year = Some(element_text(element));
            continue;
        }

        let Some(year) = &current_year else {
            continue;
        };
        let Some(url) = element
            .value()
            .attr("href")
            .and_then(|href| resolve_link(base_url, href))
        else {
            continue;
        };

        events.push(Event::new(year.clone(), element_text(element), url));
    }

    Ok(events)
}

/// Fetch the events index and return its events as a one-shot sequence
///
/// Yields nothing when the index cannot be retrieved or parsed.
pub async fn enumerate_events(
    fetcher: &PageFetcher,
    config: &CrawlerConfig,
) -> std::vec::IntoIter<Event> {
    let events_url = config.events_url();
    let Some(html) = fetcher.fetch(&events_url).await else {
        warn!("Events index {} is unavailable", events_url);
        return Vec::new().into_iter();
    };

    let events = Url::parse(&config.base_url)
        .map_err(CrawlError::from)
        .and_then(|base| parse_events_index(&html, &base));

    match events {
        Ok(events) => {
            info!("Found {} events", events.len());
            events.into_iter()
        }
        Err(e) => {
            warn!("Failed to parse events index: {}", e);
            Vec::new().into_iter()
        }
    }
}
