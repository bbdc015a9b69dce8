//! # Output Tables
//!
//! CSV tables that grow across runs. A table is opened in append mode and the
//! header is only written when the file did not exist before, so re-running a
//! job appends to what is already there. Once a job is done the whole file is
//! re-sorted by year.

use std::fs::{File, OpenOptions};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use csv::{StringRecord, WriterBuilder};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::error::Error as CrateError;

/// A row type with a fixed header
pub trait Record: Serialize {
    /// Column names, in field order
    const HEADER: &'static [&'static str];
}

/// Error type for output tables
#[derive(Debug, Error)]
pub enum OutputError {
    /// CSV encoding or decoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The table has no such column
    #[error("{path} has no column named {column}")]
    MissingColumn {
        /// Table path
        path: String,
        /// Requested column
        column: String,
    },
}

impl From<OutputError> for CrateError {
    fn from(err: OutputError) -> Self {
        match err {
            OutputError::Io(e) => CrateError::Io(e),
            _ => CrateError::Output(err.to_string()),
        }
    }
}

/// Append-only CSV table of `R` rows
pub struct CsvTable<R: Record> {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows: usize,
    _rows: PhantomData<R>,
}

impl<R: Record> CsvTable<R> {
    /// Open `path` for appending, writing the header if the file is new
    pub fn open(path: impl AsRef<Path>) -> Result<Self, OutputError> {
        let path = path.as_ref().to_path_buf();
        let existed = path.is_file();

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

        if !existed {
            debug!("Creating {}", path.display());
            writer.write_record(R::HEADER)?;
        }

        Ok(Self {
            path,
            writer,
            rows: 0,
            _rows: PhantomData,
        })
    }

    /// Append one row
    pub fn append(&mut self, row: &R) -> Result<(), OutputError> {
        self.writer.serialize(row)?;
        self.rows += 1;
        Ok(())
    }

    /// Append every row of `rows`
    pub fn append_all<'r>(&mut self, rows: impl IntoIterator<Item = &'r R>) -> Result<(), OutputError>
    where
        R: 'r,
    {
        for row in rows {
            self.append(row)?;
        }
        Ok(())
    }

    /// Flush buffered rows to disk
    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Rows appended through this handle
    pub fn rows_written(&self) -> usize {
        self.rows
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Stable-sort a table by its `column` year and rewrite it in place
///
/// Rows whose year is not an integer go after every numeric year, keeping
/// their relative order. Returns the number of data rows.
pub fn sort_by_year(path: impl AsRef<Path>, column: &str) -> Result<usize, OutputError> {
    let path = path.as_ref();

    let (header, mut records) = {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let header = reader.headers()?.clone();
        let records = reader.records().collect::<Result<Vec<StringRecord>, _>>()?;
        (header, records)
    };

    let index = header
        .iter()
        .position(|name| name == column)
        .ok_or_else(|| OutputError::MissingColumn {
            path: path.display().to_string(),
            column: column.to_string(),
        })?;

    records.sort_by_key(|record| year_key(record.get(index)));

    let mut writer = WriterBuilder::new().flexible(true).from_path(path)?;
    writer.write_record(&header)?;
    for record in &records {
        writer.write_record(record)?;
    }
    writer.flush()?;

    info!("Sorted {} rows of {} by {}", records.len(), path.display(), column);
    Ok(records.len())
}

fn year_key(value: Option<&str>) -> (bool, i64) {
    match value.and_then(|year| year.trim().parse::<i64>().ok()) {
        Some(year) => (false, year),
        None => (true, 0),
    }
}
