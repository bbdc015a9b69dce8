//! # devopsdays-harvest - Conference Program Harvester
//!
//! This crate crawls devopsdays.org and turns its event pages, program pages
//! and presentation PDFs into CSV datasets: talks per event, word occurrences
//! per event, a site availability audit and geocoded event locations.
//!
//! ## Features
//!
//! - Event enumeration from the events index, in page order
//! - Three-stage program extraction: modern layout, legacy layout, then a
//!   completion model for pages no parser understands
//! - Tokenization with English, Portuguese and site-specific stopwords
//! - Country and coordinate lookup with a per-run location cache
//! - Append-mode CSV tables flushed per event and sorted by year
//! - Polite crawling: one request at a time with a fixed delay
//!
//! ## Example
//!
//! ```rust,no_run
//! use devopsdays_harvest::crawler::{CrawlerConfig, PageFetcher};
//! use devopsdays_harvest::model::Client;
//! use devopsdays_harvest::pipeline::Pipeline;
//! use devopsdays_harvest::program::{ExtractorConfig, ProgramExtractor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let crawler = CrawlerConfig::default();
//!     let fetcher = PageFetcher::new(&crawler)?;
//!
//!     let config = ExtractorConfig::default();
//!     let client = Client::new_gemini_from_env(&config.model)?;
//!     let extractor = ProgramExtractor::new(&fetcher, &crawler, config)
//!         .with_assistant(client.completion().clone());
//!
//!     let stats = Pipeline::new(&fetcher, &crawler)
//!         .harvest_talks(&extractor, "talks_program.csv")
//!         .await?;
//!     println!("{} talks written", stats.rows_written);
//!     Ok(())
//! }
//! ```

mod error;

pub mod audit;
pub mod crawler;
pub mod geo;
pub mod model;
pub mod output;
pub mod pdf;
pub mod pipeline;
pub mod program;
pub mod text;

pub use error::{Error, Result};

/// Re-export of the types most jobs need
pub mod prelude {
    pub use crate::crawler::{CrawlerConfig, Event, PageFetcher};
    pub use crate::error::Error;
    pub use crate::error::Result;
    pub use crate::geo::{GeoConfig, GeoResolver, LocationCache};
    pub use crate::pipeline::{Pipeline, RunStats};
    pub use crate::program::{ExtractorConfig, ProgramExtractor, Talk};
}
