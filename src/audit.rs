//! Per-event availability audit
//!
//! For every event the audit records whether its site and program page answer
//! and whether either page links to recorded talks or slides.

use serde::{Serialize, Serializer};
use tracing::{debug, instrument};

use crate::crawler::{CrawlerConfig, Event, PageFetcher};
use crate::output::Record;

/// Markers of an embedded or linked talk recording
pub const VIDEO_MARKERS: &[&str] = &["youtube.com", "youtu.be", "vimeo.com"];

/// Markers of published slides
pub const SLIDE_MARKERS: &[&str] = &[
    ".pdf",
    "slideshare.net",
    "speakerdeck.com",
    "docs.google.com/presentation",
];

/// One row of the audit table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRow {
    pub year: String,
    pub event: String,
    /// Program page that was checked
    pub link: String,
    #[serde(serialize_with = "title_case_bool")]
    pub have_site: bool,
    #[serde(serialize_with = "title_case_bool")]
    pub have_program: bool,
    #[serde(serialize_with = "title_case_bool")]
    pub have_video: bool,
    #[serde(serialize_with = "title_case_bool")]
    pub have_slide: bool,
    #[serde(serialize_with = "title_case_bool")]
    pub considered: bool,
}

impl Record for AuditRow {
    const HEADER: &'static [&'static str] = &[
        "Ano",
        "Evento",
        "Link",
        "haveSite",
        "haveProgram",
        "haveVideo",
        "haveSlide",
        "considered",
    ];
}

fn title_case_bool<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *value { "True" } else { "False" })
}

fn mentions_any(html: Option<&str>, markers: &[&str]) -> bool {
    html.map(str::to_lowercase)
        .is_some_and(|html| markers.iter().any(|marker| html.contains(marker)))
}

/// Audit one event, fetching its site and program page
#[instrument(skip_all, fields(event = %event.url))]
pub async fn audit_event(fetcher: &PageFetcher, crawler: &CrawlerConfig, event: &Event) -> AuditRow {
    let site = fetcher.fetch(&event.url).await;

    // Legacy events have no separate program page.
    let (link, have_program, program) = if event.url.contains("legacy") {
        (event.url.clone(), true, site.clone())
    } else {
        let url = crawler.program_url(&event.url);
        let program = fetcher.fetch(&url).await;
        (url, program.is_some(), program)
    };

    let pages = [site.as_deref(), program.as_deref()];
    let row = AuditRow {
        year: event.year.clone(),
        event: event.label(),
        link,
        have_site: site.is_some(),
        have_program,
        have_video: pages.iter().any(|page| mentions_any(*page, VIDEO_MARKERS)),
        have_slide: pages.iter().any(|page| mentions_any(*page, SLIDE_MARKERS)),
        considered: true,
    };
    debug!(?row, "Audited event");
    row
}
