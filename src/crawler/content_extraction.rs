//! Content extraction functionality for the crawler module

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::crawler::error::CrawlError;

/// Elements whose text never reaches the reader
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript"];

/// Candidate selectors for the primary content container, tried in order
pub const PRIMARY_CONTENT_SELECTORS: &[&str] = &["main", "#content", ".content", "article", "#main"];

/// Parse a CSS selector, mapping failures to a crawl error
pub fn selector(css: &str) -> Result<Selector, CrawlError> {
    Selector::parse(css)
        .map_err(|e| CrawlError::HtmlParse(format!("Failed to parse selector '{}': {}", css, e)))
}

/// Collapse runs of whitespace into single spaces and trim the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text content of an element with whitespace collapsed
pub fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// Resolve a link against a base URL
///
/// Absolute links are returned unchanged; `None` when the link cannot be joined.
pub fn resolve_link(base: &Url, href: &str) -> Option<String> {
    base.join(href.trim()).ok().map(String::from)
}

/// Extract the text a reader would see, skipping scripts and styles
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut text = String::new();

    for node in document.tree.root().descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|e| HIDDEN_ELEMENTS.contains(&e.name()))
        });
        if !hidden {
            text.push_str(&fragment.text);
            text.push(' ');
        }
    }

    text
}

/// HTML of the primary content container, or the whole page when none matches
pub fn primary_content(html: &str) -> String {
    let document = Html::parse_document(html);

    PRIMARY_CONTENT_SELECTORS
        .iter()
        .filter_map(|css| Selector::parse(css).ok())
        .find_map(|selector| document.select(&selector).next().map(|e| e.html()))
        .unwrap_or_else(|| html.to_string())
}

/// Truncate to at most `max_chars` characters on a char boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Absolute targets of every anchor on a page, in document order
pub fn extract_links(page_url: &Url, html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(anchors) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&anchors)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| resolve_link(page_url, href))
        .collect()
}
