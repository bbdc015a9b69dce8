//! Local PDF tree ingestion
//!
//! Presentations are laid out as `<base>/<year>/<city>/<file>.pdf`. Year
//! directories whose name is not all digits are ignored, as is every file
//! without a `.pdf` extension.

use std::fs;
use std::path::{Path, PathBuf};

use lopdf::Document;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::Error as CrateError;

/// Error type for PDF ingestion
#[derive(Debug, Error)]
pub enum PdfError {
    /// The file is not a readable PDF
    #[error("Failed to load {path}: {source}")]
    Load {
        /// File path
        path: String,
        /// Parser error
        source: lopdf::Error,
    },

    /// Filesystem error while walking the tree
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PdfError> for CrateError {
    fn from(err: PdfError) -> Self {
        match err {
            PdfError::Io(e) => CrateError::Io(e),
            _ => CrateError::Pdf(err.to_string()),
        }
    }
}

/// PDFs of one event directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPdfs {
    pub year: String,
    pub city: String,
    pub files: Vec<PathBuf>,
}

/// Text of every page of a PDF, one page per line block
///
/// Pages whose text cannot be decoded are skipped.
pub fn extract_text(path: &Path) -> Result<String, PdfError> {
    let document = Document::load(path).map_err(|source| PdfError::Load {
        path: path.display().to_string(),
        source,
    })?;

    let mut text = String::new();
    for page in document.get_pages().into_keys() {
        match document.extract_text(&[page]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                text.push('\n');
            }
            Err(e) => debug!("Skipping page {} of {}: {}", page, path.display(), e),
        }
    }
    Ok(text)
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, PdfError> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort();
    Ok(entries)
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|name| name.to_string_lossy().into_owned())
}

fn is_pdf_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Walk `<base>/<year>/<city>` and list the PDFs of every event, sorted by path
pub fn scan_tree(base: &Path) -> Result<Vec<EventPdfs>, PdfError> {
    let mut events = Vec::new();

    for year_dir in sorted_entries(base)? {
        let Some(year) = file_name(&year_dir) else {
            continue;
        };
        if !year_dir.is_dir() {
            continue;
        }
        if year.is_empty() || !year.chars().all(|c| c.is_ascii_digit()) {
            warn!("Skipping {}: not a year directory", year_dir.display());
            continue;
        }

        for city_dir in sorted_entries(&year_dir)? {
            let Some(city) = file_name(&city_dir).filter(|_| city_dir.is_dir()) else {
                continue;
            };
            let files = sorted_entries(&city_dir)?
                .into_iter()
                .filter(|path| is_pdf_file(path))
                .collect();

            events.push(EventPdfs {
                year: year.clone(),
                city,
                files,
            });
        }
    }

    Ok(events)
}
