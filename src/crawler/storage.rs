use std::{io, path::Path, path::PathBuf};
use tokio::fs;
use url::Url;

use crate::error::Error as CrateError;

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Base path for downloaded files
    pub base_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("devopsdays_presentations"),
        }
    }
}

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid URL for storage: {0}")]
    InvalidUrl(String),
}

impl From<StorageError> for CrateError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io(e) => CrateError::Io(e),
            _ => CrateError::Crawl(err.to_string()),
        }
    }
}

type Result<T> = std::result::Result<T, StorageError>;

/// Storage for mirrored presentation files, laid out as `<base>/<year>/<event>/<file>`
#[derive(Debug, Clone)]
pub struct Storage {
    config: StorageConfig,
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage {
    /// Create a new storage with default configuration
    pub fn new() -> Self {
        Self {
            config: StorageConfig::default(),
        }
    }

    /// Create a new storage with custom configuration
    pub fn with_config(config: StorageConfig) -> Self {
        Self { config }
    }

    /// Base directory of the mirror
    pub fn base_path(&self) -> &Path {
        &self.config.base_path
    }

    /// Directory for files linked from a page
    ///
    /// Pages shaped like `.../<year>/<event>` get their own folder; anything
    /// else lands in the base directory.
    pub fn event_folder(&self, page_url: &str) -> Result<PathBuf> {
        let parsed = Url::parse(page_url)?;
        let segments: Vec<&str> = parsed
            .path()
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        if let [.., year, event] = segments.as_slice() {
            if !year.is_empty() && year.chars().all(|c| c.is_ascii_digit()) {
                return Ok(self.config.base_path.join(year).join(event));
            }
        }
        Ok(self.config.base_path.clone())
    }

    /// Storage path for a file downloaded from `file_url`, linked from `page_url`
    pub fn get_storage_path(&self, page_url: &str, file_url: &str) -> Result<PathBuf> {
        let parsed = Url::parse(file_url)?;
        let filename = parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| StorageError::InvalidUrl(file_url.to_string()))?;

        Ok(self.event_folder(page_url)?.join(filename))
    }

    /// Creates necessary directories for storage
    async fn ensure_directories(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write a downloaded file, replacing any previous copy
    pub async fn store(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.ensure_directories(path).await?;
        fs::write(path, bytes).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_event_folder_for_year_paths() {
        let storage = Storage::new();
        assert_eq!(
            storage
                .event_folder("https://legacy.devopsdays.org/events/2012/italy/")
                .unwrap(),
            Path::new("devopsdays_presentations/2012/italy")
        );
        assert_eq!(
            storage
                .event_folder("https://devopsdays.org/events/2019-lisbon/program")
                .unwrap(),
            Path::new("devopsdays_presentations")
        );
    }

    #[test]
    fn test_get_storage_path() {
        let config = StorageConfig {
            base_path: PathBuf::from("/tmp/mirror"),
        };
        let storage = Storage::with_config(config);
        let path = storage
            .get_storage_path(
                "https://legacy.devopsdays.org/events/2012/italy",
                "https://legacy.devopsdays.org/slides/Talk.PDF",
            )
            .unwrap();
        assert_eq!(path, Path::new("/tmp/mirror/2012/italy/Talk.PDF"));
    }

    #[test]
    fn test_storage_path_errors() {
        let storage = Storage::new();
        assert!(matches!(
            storage.get_storage_path("not-a-url", "https://x/a.pdf"),
            Err(StorageError::UrlParse(_))
        ));
        assert!(matches!(
            storage.get_storage_path("https://x/", "https://x/"),
            Err(StorageError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_store_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::with_config(StorageConfig {
            base_path: dir.path().to_path_buf(),
        });
        let path = dir.path().join("2012").join("italy").join("a.pdf");
        storage.store(&path, b"%PDF-1.4").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4");
    }
}
