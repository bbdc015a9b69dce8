//! # devopsdays-harvest CLI
//!
//! Command-line entry point for the harvesting jobs. Each subcommand runs one
//! batch job to completion:
//!
//! - `talks`: talks of every event via the program extractor
//! - `page-words`: words of every program page
//! - `pdf-words`: words of every locally mirrored presentation
//! - `audit`: site, program, video and slide availability per event
//! - `mirror`: download every presentation PDF linked under the events index
//! - `coords`: append coordinates to a table with an `Evento` column
//!
//! Site hosts, request spacing and timeouts are shared by every job that
//! touches the network. Logs go to stderr, and optionally to a file.

mod telemetry;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use devopsdays_harvest::crawler::storage::{Storage, StorageConfig};
use devopsdays_harvest::crawler::{CrawlerConfig, PageFetcher, mirror_pdfs};
use devopsdays_harvest::geo::{GeoConfig, GeoResolver, LocationCache};
use devopsdays_harvest::model::{self, Client};
use devopsdays_harvest::pipeline::{self, Pipeline, RunStats};
use devopsdays_harvest::program::{ExtractorConfig, ProgramExtractor};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, instrument, warn};

#[derive(Parser)]
#[command(author, version, about = "Harvest talks, words and locations from devopsdays.org", long_about = None)]
struct Cli {
    /// Also write logs to harvest.log in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract the talks of every event's program
    Talks(TalksArgs),

    /// Tokenize every event's program page into words
    PageWords(PageWordsArgs),

    /// Tokenize locally stored presentation PDFs into words
    PdfWords(PdfWordsArgs),

    /// Check which events have a site, program, videos and slides
    Audit(AuditArgs),

    /// Download every presentation PDF linked under the events index
    Mirror(MirrorArgs),

    /// Add a coordinates column to a table with an Evento column
    Coords(CoordsArgs),
}

#[derive(Args, Debug)]
struct SiteArgs {
    /// Base URL of the current site
    #[arg(long, default_value = "https://devopsdays.org")]
    base_url: String,

    /// Base URL of the legacy site
    #[arg(long, default_value = "https://legacy.devopsdays.org")]
    legacy_url: String,

    /// Delay in milliseconds between page requests
    #[arg(long, default_value = "500")]
    delay_ms: u64,

    /// Request timeout in seconds
    #[arg(long, default_value = "10")]
    timeout_secs: u64,
}

impl SiteArgs {
    fn crawler_config(&self) -> CrawlerConfig {
        CrawlerConfig::builder()
            .base_url(&self.base_url)
            .legacy_base_url(&self.legacy_url)
            .rate_limit_ms(self.delay_ms)
            .timeout_secs(self.timeout_secs)
            .build()
    }
}

#[derive(Args, Debug)]
struct GeoArgs {
    /// Geocoding search endpoint
    #[arg(long, default_value = "https://geocoding-api.open-meteo.com/v1/search")]
    geocode_url: String,

    /// Delay in milliseconds between geocoding queries
    #[arg(long, default_value = "1000")]
    geocode_delay_ms: u64,
}

impl GeoArgs {
    fn resolver(&self) -> anyhow::Result<GeoResolver> {
        let config = GeoConfig::builder()
            .endpoint(&self.geocode_url)
            .rate_limit_ms(self.geocode_delay_ms)
            .build();
        Ok(GeoResolver::new(config)?)
    }
}

#[derive(Args, Debug)]
struct TalksArgs {
    #[command(flatten)]
    site: SiteArgs,

    #[command(flatten)]
    geo: GeoArgs,

    /// Output table
    #[arg(short, long, default_value = "talks_program.csv")]
    output: PathBuf,

    /// Label events "<city> - <country>" instead of the index text
    #[arg(long)]
    geocode: bool,

    /// Completion model for pages no parser understands
    #[arg(short, long, default_value = model::DEFAULT_MODEL)]
    model: String,

    /// Maximum characters of page content sent to the model
    #[arg(long, default_value = "12000")]
    max_content_chars: usize,
}

#[derive(Args, Debug)]
struct PageWordsArgs {
    #[command(flatten)]
    site: SiteArgs,

    #[command(flatten)]
    geo: GeoArgs,

    /// Output table
    #[arg(short, long, default_value = "words_from_webpage.csv")]
    output: PathBuf,

    /// Label events "<city> - <country>" instead of the index text
    #[arg(long)]
    geocode: bool,
}

#[derive(Args, Debug)]
struct PdfWordsArgs {
    #[command(flatten)]
    geo: GeoArgs,

    /// Directory laid out as <year>/<city>/<file>.pdf
    #[arg(short, long, default_value = "Past_Events")]
    base: PathBuf,

    /// Output table
    #[arg(short, long, default_value = "words_from_pdfs.csv")]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct AuditArgs {
    #[command(flatten)]
    site: SiteArgs,

    #[command(flatten)]
    geo: GeoArgs,

    /// Output table
    #[arg(short, long, default_value = "events_check.csv")]
    output: PathBuf,

    /// Label events "<city> - <country>" instead of the index text
    #[arg(long)]
    geocode: bool,
}

#[derive(Args, Debug)]
struct MirrorArgs {
    #[command(flatten)]
    site: SiteArgs,

    /// Directory the PDFs are written to
    #[arg(short, long, default_value = "devopsdays_presentations")]
    output: PathBuf,

    /// Maximum number of pages to crawl
    #[arg(short = 'p', long, default_value = "5000")]
    max_pages: usize,
}

#[derive(Args, Debug)]
struct CoordsArgs {
    #[command(flatten)]
    geo: GeoArgs,

    /// Input table with an Evento column
    #[arg(short, long, default_value = "words_from_webpage.csv")]
    input: PathBuf,

    /// Output table, recreated on every run
    #[arg(short, long, default_value = "words_from_webpage_updated.csv")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _otel = telemetry::init_tracing_subscriber(cli.log_dir.as_deref())?;

    match cli.command {
        Commands::Talks(args) => talks_command(args).await?,
        Commands::PageWords(args) => page_words_command(args).await?,
        Commands::PdfWords(args) => pdf_words_command(args).await?,
        Commands::Audit(args) => audit_command(args).await?,
        Commands::Mirror(args) => mirror_command(args).await?,
        Commands::Coords(args) => coords_command(args).await?,
    }

    Ok(())
}

fn progress_bar(message: &str) -> ProgressBar {
    let progress_bar = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({eta}) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    progress_bar.set_style(style);
    progress_bar.set_message(message.to_string());
    progress_bar
}

fn report(stats: &RunStats, output: &std::path::Path) {
    println!(
        "Processed {} of {} events ({} skipped), {} rows written to {}",
        stats.events_with_rows,
        stats.events_seen,
        stats.events_skipped,
        stats.rows_written,
        output.display()
    );
}

#[instrument]
async fn talks_command(args: TalksArgs) -> anyhow::Result<()> {
    let crawler = args.site.crawler_config();
    let fetcher = PageFetcher::new(&crawler)?;
    let resolver = if args.geocode { Some(args.geo.resolver()?) } else { None };

    let config = ExtractorConfig::builder()
        .model(&args.model)
        .max_content_chars(args.max_content_chars)
        .build();
    let client = match Client::new_gemini_from_env(&config.model) {
        Ok(client) => Some(client),
        Err(e) => {
            warn!("Assisted extraction disabled: {}", e);
            None
        }
    };
    let extractor = ProgramExtractor::new(&fetcher, &crawler, config);
    let extractor = match &client {
        Some(client) => extractor.with_assistant(client.completion().clone()),
        None => extractor,
    };

    let progress = progress_bar("Extracting talks...");
    let mut pipeline = Pipeline::new(&fetcher, &crawler).with_progress(progress.clone());
    if let Some(resolver) = &resolver {
        pipeline = pipeline.with_geocoding(resolver);
    }

    let stats = pipeline.harvest_talks(&extractor, &args.output).await?;
    progress.finish_with_message("Talks extracted");
    report(&stats, &args.output);
    Ok(())
}

#[instrument]
async fn page_words_command(args: PageWordsArgs) -> anyhow::Result<()> {
    let crawler = args.site.crawler_config();
    let fetcher = PageFetcher::new(&crawler)?;
    let resolver = if args.geocode { Some(args.geo.resolver()?) } else { None };

    let progress = progress_bar("Collecting words...");
    let mut pipeline = Pipeline::new(&fetcher, &crawler).with_progress(progress.clone());
    if let Some(resolver) = &resolver {
        pipeline = pipeline.with_geocoding(resolver);
    }

    let stats = pipeline.harvest_page_words(&args.output).await?;
    progress.finish_with_message("Words collected");
    report(&stats, &args.output);
    Ok(())
}

#[instrument]
async fn pdf_words_command(args: PdfWordsArgs) -> anyhow::Result<()> {
    if !args.base.is_dir() {
        anyhow::bail!("{} is not a directory", args.base.display());
    }

    let resolver = args.geo.resolver()?;
    let mut cache = LocationCache::new();
    let progress = progress_bar("Reading PDFs...");

    let stats =
        pipeline::harvest_pdf_words(&args.base, &args.output, &resolver, &mut cache, &progress)
            .await?;
    progress.finish_with_message("PDFs read");
    report(&stats, &args.output);
    Ok(())
}

#[instrument]
async fn audit_command(args: AuditArgs) -> anyhow::Result<()> {
    let crawler = args.site.crawler_config();
    let fetcher = PageFetcher::new(&crawler)?;
    let resolver = if args.geocode { Some(args.geo.resolver()?) } else { None };

    let progress = progress_bar("Auditing events...");
    let mut pipeline = Pipeline::new(&fetcher, &crawler).with_progress(progress.clone());
    if let Some(resolver) = &resolver {
        pipeline = pipeline.with_geocoding(resolver);
    }

    let stats = pipeline.harvest_audit(&args.output).await?;
    progress.finish_with_message("Audit complete");
    report(&stats, &args.output);
    Ok(())
}

#[instrument]
async fn mirror_command(args: MirrorArgs) -> anyhow::Result<()> {
    let crawler = args.site.crawler_config();
    let fetcher = PageFetcher::new(&crawler)?;
    let storage = Storage::with_config(StorageConfig {
        base_path: args.output.clone(),
    });

    let start_url = crawler.events_url();
    info!("Mirroring PDFs under {} into {}", start_url, args.output.display());
    let stats = mirror_pdfs(&fetcher, &storage, &start_url, args.max_pages).await?;

    println!(
        "Visited {} pages, downloaded {} PDFs ({} failed) into {}",
        stats.pages_visited,
        stats.pdfs_downloaded,
        stats.failures,
        storage.base_path().display()
    );
    Ok(())
}

#[instrument]
async fn coords_command(args: CoordsArgs) -> anyhow::Result<()> {
    let resolver = args.geo.resolver()?;
    let progress = progress_bar("Geocoding rows...");
    progress.set_length(count_rows(&args.input)?);

    let rows = pipeline::annotate_coordinates(&args.input, &args.output, &resolver, &progress).await?;
    progress.finish_with_message("Coordinates added");
    println!("Wrote {} rows to {}", rows, args.output.display());
    Ok(())
}

/// Data rows of a CSV file, for sizing the progress bar
fn count_rows(path: &std::path::Path) -> anyhow::Result<u64> {
    let mut reader = csv::Reader::from_path(path)?;
    Ok(reader.records().count() as u64)
}
