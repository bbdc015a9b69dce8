//! # Pipeline Driver
//!
//! Runs one harvesting job from start to finish: enumerate the events, skip
//! those whose year is unusable, produce rows for each remaining event,
//! append them to the output table and flush, then sort the table by year.
//!
//! Everything happens one request at a time. The location cache lives in the
//! `Pipeline` and is threaded by `&mut` into every geocoding lookup.

use std::path::Path;

use chrono::Datelike;
use indicatif::ProgressBar;
use rig::completion::CompletionModel;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::audit::{AuditRow, audit_event};
use crate::crawler::content_extraction::visible_text;
use crate::crawler::{CrawlerConfig, Event, PageFetcher, enumerate_events};
use crate::error::{Error, Result};
use crate::geo::{GeoResolver, LocationCache};
use crate::output::{CsvTable, OutputError, Record, sort_by_year};
use crate::pdf;
use crate::program::{ProgramExtractor, Talk};
use crate::text::tokenize;

/// Year column of word tables
pub const WORD_YEAR_COLUMN: &str = "Ano";

/// Event column read by the coordinates job
pub const EVENT_COLUMN: &str = "Evento";

/// Column added by the coordinates job
pub const COORDINATES_COLUMN: &str = "Coordenadas";

/// One word occurrence; frequencies are implied by repeated rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordRow {
    pub year: String,
    pub event: String,
    pub word: String,
}

impl Record for WordRow {
    const HEADER: &'static [&'static str] = &["Ano", "Evento", "Palavra"];
}

impl WordRow {
    fn for_words(year: &str, event: &str, words: Vec<String>) -> Vec<Self> {
        words
            .into_iter()
            .map(|word| Self {
                year: year.to_string(),
                event: event.to_string(),
                word,
            })
            .collect()
    }
}

/// Counters reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Events listed on the index
    pub events_seen: usize,

    /// Events skipped for an invalid or future year
    pub events_skipped: usize,

    /// Events that produced at least one row
    pub events_with_rows: usize,

    /// Rows appended to the output table
    pub rows_written: usize,
}

impl RunStats {
    fn record_rows(&mut self, rows: usize) {
        if rows > 0 {
            self.events_with_rows += 1;
        }
        self.rows_written += rows;
    }
}

/// The current calendar year in local time
pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

/// Whether `year` is an integer no later than `current_year`
pub fn is_eligible_year(year: &str, current_year: i32) -> bool {
    year.trim()
        .parse::<i32>()
        .is_ok_and(|year| year <= current_year)
}

/// Drives the event-based jobs over the events index
pub struct Pipeline<'a> {
    fetcher: &'a PageFetcher,
    crawler: &'a CrawlerConfig,
    geo: Option<&'a GeoResolver>,
    cache: LocationCache,
    current_year: i32,
    progress: ProgressBar,
}

impl<'a> Pipeline<'a> {
    pub fn new(fetcher: &'a PageFetcher, crawler: &'a CrawlerConfig) -> Self {
        Self {
            fetcher,
            crawler,
            geo: None,
            cache: LocationCache::new(),
            current_year: current_year(),
            progress: ProgressBar::hidden(),
        }
    }

    /// Resolve each event's country and label rows `"<city> - <country>"`
    pub fn with_geocoding(mut self, geo: &'a GeoResolver) -> Self {
        self.geo = Some(geo);
        self
    }

    /// Treat `year` as the current year when filtering events
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = year;
        self
    }

    /// Report progress on `progress`, whose length is set once events are known
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn cache(&self) -> &LocationCache {
        &self.cache
    }

    async fn events(&mut self, stats: &mut RunStats) -> Vec<Event> {
        let events: Vec<Event> = enumerate_events(self.fetcher, self.crawler).await.collect();
        stats.events_seen = events.len();
        self.progress.set_length(events.len() as u64);
        events
    }

    /// Year check and optional geocoding; `None` when the event is skipped
    async fn admit(&mut self, event: Event, stats: &mut RunStats) -> Option<Event> {
        if !is_eligible_year(&event.year, self.current_year) {
            warn!("Skipping {} ({}): invalid or future year", event.raw_label, event.year);
            stats.events_skipped += 1;
            self.progress.inc(1);
            return None;
        }

        self.progress.set_message(event.raw_label.clone());
        match self.geo {
            Some(geo) => {
                let country = geo.resolve_country(&mut self.cache, &event.raw_label).await;
                Some(event.with_country(country))
            }
            None => Some(event),
        }
    }

    /// Extract the talks of every event into `output`
    #[instrument(skip_all, fields(output = %output.as_ref().display()))]
    pub async fn harvest_talks<M>(
        &mut self,
        extractor: &ProgramExtractor<'_, M>,
        output: impl AsRef<Path>,
    ) -> Result<RunStats>
    where
        M: CompletionModel,
    {
        let mut stats = RunStats::default();
        let mut table = CsvTable::<Talk>::open(output.as_ref())?;

        for event in self.events(&mut stats).await {
            let Some(event) = self.admit(event, &mut stats).await else {
                continue;
            };

            let talks = extractor
                .extract_talks(&event.url, &event.year, &event.label())
                .await;
            table.append_all(&talks)?;
            table.flush()?;
            stats.record_rows(talks.len());
            self.progress.inc(1);
        }

        finish(table, &stats, "year")?;
        Ok(stats)
    }

    /// Tokenize the visible text of every program page into `output`
    #[instrument(skip_all, fields(output = %output.as_ref().display()))]
    pub async fn harvest_page_words(&mut self, output: impl AsRef<Path>) -> Result<RunStats> {
        let mut stats = RunStats::default();
        let mut table = CsvTable::<WordRow>::open(output.as_ref())?;

        for event in self.events(&mut stats).await {
            let Some(event) = self.admit(event, &mut stats).await else {
                continue;
            };

            let program_url = self.crawler.program_url(&event.url);
            let Some(html) = self.fetcher.fetch(&program_url).await else {
                info!("No program page for {}, skipping", event.raw_label);
                self.progress.inc(1);
                continue;
            };

            let words = tokenize(&visible_text(&html));
            let rows = WordRow::for_words(&event.year, &event.label(), words);
            table.append_all(&rows)?;
            table.flush()?;
            info!("Saved {} words for {} ({})", rows.len(), event.label(), event.year);
            stats.record_rows(rows.len());
            self.progress.inc(1);
        }

        finish(table, &stats, WORD_YEAR_COLUMN)?;
        Ok(stats)
    }

    /// Audit the site of every event into `output`
    #[instrument(skip_all, fields(output = %output.as_ref().display()))]
    pub async fn harvest_audit(&mut self, output: impl AsRef<Path>) -> Result<RunStats> {
        let mut stats = RunStats::default();
        let mut table = CsvTable::<AuditRow>::open(output.as_ref())?;

        for event in self.events(&mut stats).await {
            let Some(event) = self.admit(event, &mut stats).await else {
                continue;
            };

            let row = audit_event(self.fetcher, self.crawler, &event).await;
            table.append(&row)?;
            table.flush()?;
            stats.record_rows(1);
            self.progress.inc(1);
        }

        finish(table, &stats, WORD_YEAR_COLUMN)?;
        Ok(stats)
    }
}

fn finish<R: Record>(mut table: CsvTable<R>, stats: &RunStats, year_column: &str) -> Result<()> {
    table.flush()?;
    let path = table.path().to_path_buf();
    drop(table);

    sort_by_year(&path, year_column)?;
    info!(
        "Wrote {} rows from {} of {} events to {}",
        stats.rows_written,
        stats.events_with_rows,
        stats.events_seen,
        path.display()
    );
    Ok(())
}

/// Tokenize every PDF under `<base>/<year>/<city>` into `output`
///
/// Each city directory is geocoded and rows are labelled `"<city> - <country>"`.
/// Unreadable or empty PDFs are skipped.
#[instrument(skip(geo, cache, progress))]
pub async fn harvest_pdf_words(
    base: &Path,
    output: &Path,
    geo: &GeoResolver,
    cache: &mut LocationCache,
    progress: &ProgressBar,
) -> Result<RunStats> {
    let directories = pdf::scan_tree(base)?;
    let mut stats = RunStats {
        events_seen: directories.len(),
        ..RunStats::default()
    };
    let mut table = CsvTable::<WordRow>::open(output)?;
    progress.set_length(directories.iter().map(|d| d.files.len() as u64).sum());

    for directory in directories {
        let country = geo.resolve_country(cache, &directory.city).await;
        let label = format!("{} - {}", directory.city, country);
        info!("Processing {}/{} ({})", directory.year, directory.city, country);

        let mut event_rows = 0;
        for file in directory.files {
            progress.set_message(file.display().to_string());
            let text = read_pdf(file.clone()).await?;
            progress.inc(1);

            let Some(text) = text.filter(|text| !text.trim().is_empty()) else {
                info!("{} is empty or unreadable, skipping", file.display());
                continue;
            };

            let rows = WordRow::for_words(&directory.year, &label, tokenize(&text));
            table.append_all(&rows)?;
            table.flush()?;
            event_rows += rows.len();
        }
        stats.record_rows(event_rows);
    }

    finish(table, &stats, WORD_YEAR_COLUMN)?;
    Ok(stats)
}

/// PDF text off the async runtime; `None` when the file cannot be parsed
async fn read_pdf(path: std::path::PathBuf) -> Result<Option<String>> {
    let result = tokio::task::spawn_blocking(move || pdf::extract_text(&path))
        .await
        .map_err(|e| Error::Other(format!("PDF reader task failed: {}", e)))?;

    match result {
        Ok(text) => Ok(Some(text)),
        Err(e) => {
            warn!("{}", e);
            Ok(None)
        }
    }
}

/// Copy `input` to `output` with the coordinates of each row's event appended
///
/// The output file is recreated on every run. Returns the number of rows.
#[instrument(skip(geo, progress))]
pub async fn annotate_coordinates(
    input: &Path,
    output: &Path,
    geo: &GeoResolver,
    progress: &ProgressBar,
) -> Result<usize> {
    let mut reader = csv::Reader::from_path(input).map_err(OutputError::from)?;
    let mut header = reader.headers().map_err(OutputError::from)?.clone();
    let event_index = header
        .iter()
        .position(|name| name == EVENT_COLUMN)
        .ok_or_else(|| OutputError::MissingColumn {
            path: input.display().to_string(),
            column: EVENT_COLUMN.to_string(),
        })?;
    header.push_field(COORDINATES_COLUMN);

    let mut writer = csv::Writer::from_path(output).map_err(OutputError::from)?;
    writer.write_record(&header).map_err(OutputError::from)?;

    let mut cache = LocationCache::new();
    let mut rows = 0;
    for record in reader.records() {
        let mut record = record.map_err(OutputError::from)?;
        let event = record.get(event_index).unwrap_or_default().to_string();
        let coordinates = geo.resolve_coordinates(&mut cache, &event).await;

        record.push_field(&coordinates);
        writer.write_record(&record).map_err(OutputError::from)?;
        rows += 1;
        progress.inc(1);
    }
    writer.flush().map_err(OutputError::from)?;

    info!("Annotated {} rows ({} distinct places) into {}", rows, cache.len(), output.display());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoConfig;
    use crate::model::mock_model::MockCompletionModel;
    use crate::program::ExtractorConfig;
    use mockito::{Matcher, Server, ServerGuard};
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    const INDEX: &str = r#"
        <h4 class="events-page-months">9999</h4>
        <a class="events-page-event" href="/events/9999-mars">Mars</a>
        <h4 class="events-page-months">2019</h4>
        <a class="events-page-event" href="/events/2019-lisbon">Lisbon</a>
        <h4 class="events-page-months">abc</h4>
        <a class="events-page-event" href="/events/abc-nowhere">Nowhere</a>
        <h4 class="events-page-months">2018</h4>
        <a class="events-page-event" href="/events/2018-rome">Rome (2018)</a>
    "#;

    async fn site(server: &mut ServerGuard) {
        server
            .mock("GET", "/events/")
            .with_status(200)
            .with_body(INDEX)
            .create_async()
            .await;
        server
            .mock("GET", "/events/2019-lisbon/program")
            .with_status(200)
            .with_body(
                r#"<div class="program-talk"><a href="/t/1">Jane Doe - Scaling Pipelines</a></div>
                   <script>var kubernetes = 1;</script>"#,
            )
            .create_async()
            .await;
        server
            .mock("GET", "/events/2018-rome/program")
            .with_status(200)
            .with_body(r#"<div class="program-talk"><a href="/t/2">John Roe - Chaos Monkeys</a></div>"#)
            .create_async()
            .await;
    }

    fn crawler_config(server: &ServerGuard) -> CrawlerConfig {
        CrawlerConfig::builder()
            .base_url(server.url())
            .legacy_base_url(format!("{}/legacy", server.url()))
            .rate_limit_ms(0)
            .build()
    }

    fn geo_resolver(server: &ServerGuard) -> GeoResolver {
        let config = GeoConfig::builder()
            .endpoint(format!("{}/v1/search", server.url()))
            .rate_limit_ms(0)
            .build();
        GeoResolver::new(config).unwrap()
    }

    #[test]
    fn test_is_eligible_year() {
        assert!(is_eligible_year("2019", 2024));
        assert!(is_eligible_year(" 2024 ", 2024));
        assert!(!is_eligible_year("9999", 2024));
        assert!(!is_eligible_year("abc", 2024));
        assert!(!is_eligible_year("", 2024));
    }

    #[tokio::test]
    async fn test_harvest_talks_skips_invalid_years_and_sorts() {
        let mut server = Server::new_async().await;
        site(&mut server).await;
        // Any request for the skipped events would fail the run.
        let skipped = server
            .mock("GET", Matcher::Regex("(9999|abc)".to_string()))
            .expect(0)
            .create_async()
            .await;

        let config = crawler_config(&server);
        let fetcher = PageFetcher::new(&config).unwrap();
        let model = MockCompletionModel::new();
        let extractor = ProgramExtractor::new(&fetcher, &config, ExtractorConfig::default())
            .with_assistant(model.clone());

        let dir = tempdir().unwrap();
        let output = dir.path().join("talks_program.csv");
        let mut pipeline = Pipeline::new(&fetcher, &config).with_current_year(2024);
        let stats = pipeline.harvest_talks(&extractor, &output).await.unwrap();

        assert_eq!(
            stats,
            RunStats {
                events_seen: 4,
                events_skipped: 2,
                events_with_rows: 2,
                rows_written: 2,
            }
        );
        assert_eq!(model.call_count(), 0);
        skipped.assert_async().await;

        let content = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "year,event,author,title,link");
        assert_eq!(
            lines[1],
            format!("2018,Rome (2018),John Roe,Chaos Monkeys,{}/t/2", server.url())
        );
        assert!(lines[2].starts_with("2019,Lisbon,Jane Doe,Scaling Pipelines,"));
        assert_eq!(lines.len(), 3);
    }

    #[tokio::test]
    async fn test_harvest_page_words_with_geocoding() {
        let mut server = Server::new_async().await;
        site(&mut server).await;
        let lisbon = server
            .mock("GET", "/v1/search")
            .match_query(Matcher::UrlEncoded("name".into(), "Lisbon".into()))
            .with_status(200)
            .with_body(r#"{"results":[{"country":"Portugal"}]}"#)
            .expect(1)
            .create_async()
            .await;
        let _rome = server
            .mock("GET", "/v1/search")
            .match_query(Matcher::UrlEncoded("name".into(), "Rome".into()))
            .with_status(200)
            .with_body(r#"{"results":[{"country":"Italy"}]}"#)
            .create_async()
            .await;

        let config = crawler_config(&server);
        let fetcher = PageFetcher::new(&config).unwrap();
        let geo = geo_resolver(&server);

        let dir = tempdir().unwrap();
        let output = dir.path().join("words_from_webpage.csv");
        let mut pipeline = Pipeline::new(&fetcher, &config)
            .with_geocoding(&geo)
            .with_current_year(2024);
        pipeline.harvest_page_words(&output).await.unwrap();
        assert_eq!(pipeline.cache().len(), 2);
        lisbon.assert_async().await;

        let content = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "Ano,Evento,Palavra");
        assert!(lines.contains(&"2019,Lisbon - Portugal,scaling"));
        assert!(lines.contains(&"2018,Rome - Italy,chaos"));
        assert!(!content.contains("kubernetes"));
        assert!(lines[1].starts_with("2018,"));
    }

    #[tokio::test]
    async fn test_rows_are_on_disk_before_the_next_event() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/events/")
            .with_status(200)
            .with_body(INDEX)
            .create_async()
            .await;
        server
            .mock("GET", "/events/2019-lisbon/program")
            .with_status(200)
            .with_body("<p>Scaling pipelines</p>")
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let output = dir.path().join("words_from_webpage.csv");
        let on_disk = Arc::new(Mutex::new(String::new()));
        let rome = server
            .mock("GET", "/events/2018-rome/program")
            .with_status(200)
            .with_body_from_request({
                let output = output.clone();
                let on_disk = on_disk.clone();
                move |_| {
                    *on_disk.lock().unwrap() = std::fs::read_to_string(&output).unwrap_or_default();
                    b"<p>Chaos monkeys</p>".to_vec()
                }
            })
            .expect(1)
            .create_async()
            .await;

        let config = crawler_config(&server);
        let fetcher = PageFetcher::new(&config).unwrap();
        let mut pipeline = Pipeline::new(&fetcher, &config).with_current_year(2024);
        pipeline.harvest_page_words(&output).await.unwrap();
        rome.assert_async().await;

        let before_rome = on_disk.lock().unwrap().clone();
        assert_eq!(
            before_rome,
            "Ano,Evento,Palavra\n2019,Lisbon,scaling\n2019,Lisbon,pipelines\n"
        );
        assert!(std::fs::read_to_string(&output).unwrap().contains("2018,Rome (2018),chaos"));
    }

    #[tokio::test]
    async fn test_annotate_coordinates() {
        let mut server = Server::new_async().await;
        let lisbon = server
            .mock("GET", "/v1/search")
            .match_query(Matcher::UrlEncoded("name".into(), "Lisbon".into()))
            .with_status(200)
            .with_body(r#"{"results":[{"latitude":38.72,"longitude":-9.13}]}"#)
            .expect(1)
            .create_async()
            .await;
        let _atlantis = server
            .mock("GET", "/v1/search")
            .match_query(Matcher::UrlEncoded("name".into(), "Atlantis".into()))
            .with_status(200)
            .with_body(r#"{"results":[]}"#)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let input = dir.path().join("words.csv");
        let output = dir.path().join("words_updated.csv");
        std::fs::write(
            &input,
            "Ano,Evento,Palavra\n2019,Lisbon - Portugal,ops\n2019,Lisbon - Portugal,dev\n2020,Atlantis,sea\n",
        )
        .unwrap();

        let geo = geo_resolver(&server);
        let rows = annotate_coordinates(&input, &output, &geo, &ProgressBar::hidden())
            .await
            .unwrap();
        assert_eq!(rows, 3);
        lisbon.assert_async().await;

        let content = std::fs::read_to_string(&output).unwrap();
        assert_eq!(
            content,
            "Ano,Evento,Palavra,Coordenadas\n\
             2019,Lisbon - Portugal,ops,\"38.72, -9.13\"\n\
             2019,Lisbon - Portugal,dev,\"38.72, -9.13\"\n\
             2020,Atlantis,sea,Não encontrado\n"
        );
    }

    #[tokio::test]
    async fn test_harvest_pdf_words() {
        let mut server = Server::new_async().await;
        let _geo = server
            .mock("GET", "/v1/search")
            .match_query(Matcher::UrlEncoded("name".into(), "lisbon".into()))
            .with_status(200)
            .with_body(r#"{"results":[{"country":"Portugal"}]}"#)
            .expect(1)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let base = dir.path().join("Past_Events");
        std::fs::create_dir_all(base.join("2019/lisbon")).unwrap();
        pdf::tests::write_pdf(&base.join("2019/lisbon/talk.pdf"), "Observability pipelines");
        std::fs::write(base.join("2019/lisbon/broken.pdf"), b"not a pdf").unwrap();

        let output = dir.path().join("words_from_pdfs.csv");
        let geo = geo_resolver(&server);
        let mut cache = LocationCache::new();
        let stats = harvest_pdf_words(&base, &output, &geo, &mut cache, &ProgressBar::hidden())
            .await
            .unwrap();

        assert_eq!(stats.events_seen, 1);
        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.starts_with("Ano,Evento,Palavra\n"));
        assert!(content.contains("2019,lisbon - Portugal,observability"));
    }
}
