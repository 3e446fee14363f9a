//! Reading publication lists from disk.
//!
//! The file extension decides the reader:
//!
//! | Extension | Reader | Result |
//! |-----------|--------|--------|
//! | `.json` | array of string-valued objects | [`Publication::List`] |
//! | `.csv` | comma-separated table, header row first | [`Publication::Table`] |
//! | `.tsv` | tab-separated table, header row first | [`Publication::Table`] |
//! | `.bib` | [`CitationParser`] | [`Publication::Citation`] |
//!
//! Anything else is rejected before the file is opened.
//!
//! ## Table rows
//!
//! Each data row is zipped with the header. A short row simply lacks its
//! trailing keys; a long row loses its extra cells. Neither is an error.

use crate::citation::{CitationError, CitationParser};
use crate::types::{Publication, Record, normalize_table_record};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Citation(#[from] CitationError),
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(PathBuf),
}

/// Input formats, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Csv,
    Tsv,
    Bibtex,
}

impl InputFormat {
    /// Field separator for table formats.
    pub fn delimiter(self) -> Option<u8> {
        match self {
            InputFormat::Csv => Some(b','),
            InputFormat::Tsv => Some(b'\t'),
            InputFormat::Json | InputFormat::Bibtex => None,
        }
    }
}

/// Pick the input format from the extension (case-insensitive).
pub fn detect_format(path: &Path) -> Result<InputFormat, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("json") => Ok(InputFormat::Json),
        Some("csv") => Ok(InputFormat::Csv),
        Some("tsv") => Ok(InputFormat::Tsv),
        Some("bib") => Ok(InputFormat::Bibtex),
        _ => Err(LoadError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Load a JSON list or a CSV/TSV table as raw records.
///
/// Table rows come back exactly as zipped, without column renaming.
pub fn load_records(path: &Path) -> Result<Vec<Record>, LoadError> {
    match detect_format(path)? {
        InputFormat::Json => {
            let reader = BufReader::new(File::open(path)?);
            Ok(serde_json::from_reader(reader)?)
        }
        format @ (InputFormat::Csv | InputFormat::Tsv) => {
            let delimiter = format.delimiter().unwrap_or(b',');
            read_table(File::open(path)?, delimiter)
        }
        InputFormat::Bibtex => Err(LoadError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Read a delimited table: header row, then one record per row.
pub fn read_table(reader: impl Read, delimiter: u8) -> Result<Vec<Record>, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut rows = csv_reader.records();

    let header = match rows.next() {
        Some(row) => row?,
        None => return Ok(Vec::new()),
    };

    let mut records = Vec::new();
    for row in rows {
        let row = row?;
        let record: Record = header
            .iter()
            .zip(row.iter())
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        records.push(record);
    }
    Ok(records)
}

/// Load any supported file as tagged publications, in input order.
///
/// Table rows are normalized here (see [`normalize_table_record`]) so the
/// renderer only deals with canonical key names.
pub fn load_publications(
    path: &Path,
    parser: &dyn CitationParser,
) -> Result<Vec<Publication>, LoadError> {
    let publications: Vec<Publication> = match detect_format(path)? {
        InputFormat::Json => load_records(path)?
            .into_iter()
            .map(Publication::List)
            .collect(),
        InputFormat::Csv | InputFormat::Tsv => load_records(path)?
            .into_iter()
            .map(|row| Publication::Table(normalize_table_record(row)))
            .collect(),
        InputFormat::Bibtex => {
            let source = std::fs::read_to_string(path)?;
            parser
                .parse(&source)?
                .into_iter()
                .map(Publication::Citation)
                .collect()
        }
    };
    tracing::debug!(
        path = %path.display(),
        count = publications.len(),
        "loaded publications"
    );
    Ok(publications)
}
