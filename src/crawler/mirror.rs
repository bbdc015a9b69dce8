//! Mirror every presentation PDF linked under the events index
//!
//! Pages are visited depth-first starting from the events index. Links ending
//! in `.pdf` are downloaded into the mirror; any other link that stays under
//! the start URL is queued for crawling.

use std::collections::HashSet;

use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::crawler::client::PageFetcher;
use crate::crawler::content_extraction::extract_links;
use crate::crawler::storage::Storage;
use crate::error::Result;

/// Counters reported after a mirror run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorStats {
    /// Pages fetched and scanned for links
    pub pages_visited: usize,

    /// PDFs written to disk
    pub pdfs_downloaded: usize,

    /// PDFs that could not be downloaded
    pub failures: usize,
}

fn is_pdf(url: &str) -> bool {
    Url::parse(url)
        .map(|u| u.path().to_lowercase().ends_with(".pdf"))
        .unwrap_or(false)
}

/// Crawl from `start_url` and download every linked PDF into `storage`
///
/// At most `max_pages` pages are fetched. Network failures are logged and
/// skipped; failing to write a file aborts the run.
#[instrument(skip(fetcher, storage))]
pub async fn mirror_pdfs(
    fetcher: &PageFetcher,
    storage: &Storage,
    start_url: &str,
    max_pages: usize,
) -> Result<MirrorStats> {
    let mut stats = MirrorStats::default();
    let mut visited: HashSet<String> = HashSet::new();
    let mut downloaded: HashSet<String> = HashSet::new();
    let mut stack = vec![start_url.to_string()];

    while let Some(page_url) = stack.pop() {
        if visited.contains(&page_url) {
            continue;
        }
        if visited.len() >= max_pages {
            info!("Reached page limit of {}", max_pages);
            break;
        }
        visited.insert(page_url.clone());

        let Some(html) = fetcher.fetch(&page_url).await else {
            continue;
        };
        stats.pages_visited += 1;

        let links = match Url::parse(&page_url) {
            Ok(parsed) => extract_links(&parsed, &html),
            Err(e) => {
                warn!("Skipping links of {}: {}", page_url, e);
                continue;
            }
        };

        let mut children = Vec::new();
        for link in links {
            if is_pdf(&link) {
                if !downloaded.insert(link.clone()) {
                    continue;
                }
                let path = storage.get_storage_path(&page_url, &link)?;
                match fetcher.get_bytes(&link).await {
                    Ok(bytes) => {
                        storage.store(&path, &bytes).await?;
                        info!("Downloaded {}", path.display());
                        stats.pdfs_downloaded += 1;
                    }
                    Err(e) => {
                        warn!("Failed to download {}: {}", link, e);
                        stats.failures += 1;
                    }
                }
            } else if link.contains(start_url) && !visited.contains(&link) {
                children.push(link);
            }
        }

        debug!("Queued {} pages from {}", children.len(), page_url);
        // Reverse so the first link on the page is visited first.
        stack.extend(children.into_iter().rev());
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::CrawlerConfig;
    use crate::crawler::storage::StorageConfig;
    use mockito::Server;

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf("https://x.org/slides/Talk.PDF"));
        assert!(is_pdf("https://x.org/a.pdf?download=1"));
        assert!(!is_pdf("https://x.org/program"));
    }

    #[tokio::test]
    async fn test_mirror_downloads_pdfs_under_start_url() {
        let mut server = Server::new_async().await;
        let base = server.url();

        let _index = server
            .mock("GET", "/events/")
            .with_status(200)
            .with_body(
                r#"<a href="/events/2012/italy/">Italy</a>
                   <a href="/about">About</a>"#,
            )
            .create_async()
            .await;
        let _event = server
            .mock("GET", "/events/2012/italy/")
            .with_status(200)
            .with_body(
                r#"<a href="/files/one.pdf">one</a>
                   <a href="/files/missing.pdf">missing</a>
                   <a href="/events/">back</a>"#,
            )
            .create_async()
            .await;
        let pdf = server
            .mock("GET", "/files/one.pdf")
            .with_status(200)
            .with_body("%PDF-1.4")
            .expect(1)
            .create_async()
            .await;
        let _missing = server
            .mock("GET", "/files/missing.pdf")
            .with_status(404)
            .create_async()
            .await;
        let about = server
            .mock("GET", "/about")
            .expect(0)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::with_config(StorageConfig {
            base_path: dir.path().to_path_buf(),
        });
        let config = CrawlerConfig::builder().base_url(&base).rate_limit_ms(0).build();
        let fetcher = PageFetcher::new(&config).unwrap();

        let stats = mirror_pdfs(&fetcher, &storage, &format!("{}/events/", base), 10)
            .await
            .unwrap();

        assert_eq!(
            stats,
            MirrorStats {
                pages_visited: 2,
                pdfs_downloaded: 1,
                failures: 1,
            }
        );
        let saved = dir.path().join("2012").join("italy").join("one.pdf");
        assert_eq!(std::fs::read(saved).unwrap(), b"%PDF-1.4");
        pdf.assert_async().await;
        about.assert_async().await;
    }
}
