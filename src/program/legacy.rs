//! Program pages on the legacy site
//!
//! Two layouts exist. The complex one groups bolded talk titles with the
//! profile link of their speaker inside a container. The simple one is a flat
//! list of `"<author>, <title>"` anchors. Every talk links back to the page
//! it was found on.

use scraper::Html;

use super::Talk;
use crate::crawler::CrawlError;
use crate::crawler::content_extraction::{element_text, selector};

const CONTAINERS: &str = "div.talk, div.program-talk, div.session";
const TITLES: &str = "b, strong";
const SPEAKER_LINK: &str = r#"a[href*="speaker"]"#;

/// Talks on a legacy program page, complex layout first
pub fn parse_program(
    html: &str,
    page_url: &str,
    year: &str,
    event: &str,
) -> Result<Vec<Talk>, CrawlError> {
    let document = Html::parse_document(html);

    let talks = parse_containers(&document, page_url, year, event)?;
    if !talks.is_empty() {
        return Ok(talks);
    }
    parse_anchor_list(&document, page_url, year, event)
}

fn parse_containers(
    document: &Html,
    page_url: &str,
    year: &str,
    event: &str,
) -> Result<Vec<Talk>, CrawlError> {
    let containers = selector(CONTAINERS)?;
    let titles = selector(TITLES)?;
    let speaker = selector(SPEAKER_LINK)?;

    let mut talks = Vec::new();
    for container in document.select(&containers) {
        let Some(author) = container.select(&speaker).next().map(element_text) else {
            continue;
        };

        talks.extend(
            container
                .select(&titles)
                .map(element_text)
                .filter(|title| !title.is_empty())
                .map(|title| Talk {
                    year: year.to_string(),
                    event: event.to_string(),
                    author: author.clone(),
                    title,
                    link: Some(page_url.to_string()),
                }),
        );
    }

    Ok(talks)
}

fn parse_anchor_list(
    document: &Html,
    page_url: &str,
    year: &str,
    event: &str,
) -> Result<Vec<Talk>, CrawlError> {
    let anchors = selector("a")?;

    let talks = document
        .select(&anchors)
        .map(element_text)
        .filter(|text| looks_like_talk(text))
        .map(|text| Talk::from_anchor_text(year, event, &text, Some(page_url.to_string())))
        .collect();

    Ok(talks)
}

/// Anchor text naming a speaker and a talk, as opposed to a bare URL
fn looks_like_talk(text: &str) -> bool {
    !text.is_empty() && !text.contains("://") && (text.contains(',') || text.contains(" - "))
}
