//! # Website Crawler Module
//!
//! This module provides everything that talks to devopsdays.org: a polite
//! page fetcher, HTML helpers, the events index enumerator and the PDF mirror.
//!
//! ## Key Components
//!
//! - `CrawlerConfig`: site hosts, timeouts and request spacing
//! - `PageFetcher`: single HTTP client issuing one request at a time
//! - `Event` / `enumerate_events`: events listed on the index page
//! - `mirror_pdfs`: depth-first crawl downloading presentation PDFs
//! - Content extraction utilities (visible text, primary content, links)
//!
//! ## Features
//!
//! - Fixed delay between consecutive requests
//! - Every failure to retrieve a page degrades to "no content"
//! - Relative links are resolved against the page or site they come from

mod client;
mod config;
pub mod content_extraction;
mod error;
pub mod events;
pub mod mirror;
pub mod storage;

pub(crate) use client::request_limiter;
pub use client::PageFetcher;
pub use config::{CrawlerConfig, CrawlerConfigBuilder};
pub use error::CrawlError;
pub use events::{Event, enumerate_events, parse_events_index};
pub use mirror::{MirrorStats, mirror_pdfs};
