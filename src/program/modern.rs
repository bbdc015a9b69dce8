//! Program pages on the current site
//!
//! Every talk sits in a `div.program-talk` whose first anchor reads
//! `"<author> - <title>"` and points at the talk page.

use scraper::Html;
use url::Url;

use super::Talk;
use crate::crawler::CrawlError;
use crate::crawler::content_extraction::{element_text, resolve_link, selector};

/// Talks listed on a modern program page, in document order
pub fn parse_program(
    html: &str,
    base_url: &Url,
    year: &str,
    event: &str,
) -> Result<Vec<Talk>, CrawlError> {
    let document = Html::parse_document(html);
    let containers = selector("div.program-talk")?;
    let anchor = selector("a")?;

    let talks = document
        .select(&containers)
        .filter_map(|container| container.select(&anchor).next())
        .filter_map(|a| {
            let text = element_text(a);
            // Icon-only anchors name no talk
            if text.is_empty() {
                return None;
            }
            let link = a
                .value()
                .attr("href")
                .and_then(|href| resolve_link(base_url, href));
            Some(Talk::from_anchor_text(year, event, &text, link))
        })
        .collect();

    Ok(talks)
}
