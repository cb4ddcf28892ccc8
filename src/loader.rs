//! Dataset loading and cleaning.
//!
//! [`load_cleaned_table()`] reads the raw anime CSV once and produces the
//! immutable [`CleanedTable`] that every pipeline reads:
//!
//! - rows with any field exactly equal to `UNKNOWN` are dropped,
//! - missing fields (empty or a conventional NA token) become `"0"`,
//! - `Genres` keeps only its first comma-separated entry,
//! - a `Release` year column is derived from `Aired`.
//!
//! Missing columns, unparsable numbers and malformed `Aired` text abort the
//! load with a [`LoadError`].

use std::path::Path;

use anyhow::Context as _;
use encoding_rs::{Encoding, UTF_8};
use log::{debug, info};
use serde::Serialize;
use thiserror::Error;

use crate::{
    aired::{self, AiredError},
    io_utils,
    params::Metric,
};

pub const UNKNOWN_SENTINEL: &str = "UNKNOWN";
pub const MISSING_FILL: &str = "0";
pub const RELEASE_COLUMN: &str = "Release";

pub const GENRES_COLUMN: &str = "Genres";
pub const SOURCE_COLUMN: &str = "Source";
pub const AIRED_COLUMN: &str = "Aired";
pub const SCORE_COLUMN: &str = "Score";
pub const MEMBERS_COLUMN: &str = "Members";
pub const FAVORITES_COLUMN: &str = "Favorites";
pub const POPULARITY_COLUMN: &str = "Popularity";

const MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("required column '{0}' not found in input headers")]
    MissingColumn(&'static str),
    #[error("row {row}: column '{column}' value '{value}' is not a number")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("row {row}: {source}")]
    Aired { row: usize, source: AiredError },
    #[error("row {row}: found {found} field(s) but the header has {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error(transparent)]
    Read(#[from] anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
    pub limit: Option<usize>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: UTF_8,
            limit: None,
        }
    }
}

/// Typed projection of the columns the pipelines read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimeRecord {
    pub genre: String,
    pub source: String,
    pub aired: String,
    pub release: i32,
    pub score: f64,
    pub members: f64,
    pub favorites: f64,
    pub popularity: f64,
}

impl AnimeRecord {
    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Favorites => self.favorites,
            Metric::Popularity => self.popularity,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanedRow {
    /// All original fields after cleaning, with `Release` appended.
    pub cells: Vec<String>,
    pub anime: AnimeRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleaningSummary {
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub fields_filled: usize,
}

#[derive(Debug, Clone, Default)]
pub struct CleanedTable {
    headers: Vec<String>,
    rows: Vec<CleanedRow>,
    summary: CleaningSummary,
}

impl CleanedTable {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[CleanedRow] {
        &self.rows
    }

    pub fn records(&self) -> impl Iterator<Item = &AnimeRecord> {
        self.rows.iter().map(|row| &row.anime)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn summary(&self) -> &CleaningSummary {
        &self.summary
    }
}

#[derive(Debug, Clone, Copy)]
struct ColumnIndexes {
    genres: usize,
    source: usize,
    aired: usize,
    score: usize,
    members: usize,
    favorites: usize,
    popularity: usize,
}

impl ColumnIndexes {
    fn resolve(headers: &[String]) -> Result<Self, LoadError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|header| header == name)
                .ok_or(LoadError::MissingColumn(name))
        };
        Ok(Self {
            genres: find(GENRES_COLUMN)?,
            source: find(SOURCE_COLUMN)?,
            aired: find(AIRED_COLUMN)?,
            score: find(SCORE_COLUMN)?,
            members: find(MEMBERS_COLUMN)?,
            favorites: find(FAVORITES_COLUMN)?,
            popularity: find(POPULARITY_COLUMN)?,
        })
    }
}

pub fn load_cleaned_table(path: &Path, options: &LoadOptions) -> Result<CleanedTable, LoadError> {
    let read_err = |err: anyhow::Error| LoadError::Read(err.context(format!("Reading {path:?}")));
    let delimiter = io_utils::resolve_input_delimiter(path, options.delimiter);
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter).map_err(read_err)?;
    let headers = io_utils::reader_headers(&mut reader, options.encoding).map_err(read_err)?;
    let columns = ColumnIndexes::resolve(&headers)?;
    debug!("Resolved dataset columns: {columns:?}");

    let mut cleaner = Cleaner::new(headers, columns);
    for (row_idx, record) in reader.byte_records().enumerate() {
        if let Some(limit) = options.limit
            && row_idx >= limit
        {
            break;
        }
        let record = record.map_err(|err| read_err(err.into()))?;
        let decoded = io_utils::decode_record(&record, options.encoding).map_err(read_err)?;
        cleaner.ingest(decoded, row_idx + 2)?;
    }

    let table = cleaner.finish();
    info!(
        "Loaded {} row(s) from {:?}: dropped {} UNKNOWN row(s), kept {}",
        table.summary.rows_read,
        path,
        table.summary.rows_dropped,
        table.len()
    );
    Ok(table)
}

/// Cleans rows already split into fields; useful when the data does not come from a file.
pub fn clean_rows<I>(headers: Vec<String>, rows: I) -> Result<CleanedTable, LoadError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let columns = ColumnIndexes::resolve(&headers)?;
    let mut cleaner = Cleaner::new(headers, columns);
    for (row_idx, row) in rows.into_iter().enumerate() {
        cleaner.ingest(row, row_idx + 2)?;
    }
    Ok(cleaner.finish())
}

struct Cleaner {
    headers: Vec<String>,
    columns: ColumnIndexes,
    rows: Vec<CleanedRow>,
    summary: CleaningSummary,
}

impl Cleaner {
    fn new(headers: Vec<String>, columns: ColumnIndexes) -> Self {
        Self {
            headers,
            columns,
            rows: Vec::new(),
            summary: CleaningSummary::default(),
        }
    }

    fn ingest(&mut self, mut fields: Vec<String>, row_number: usize) -> Result<(), LoadError> {
        self.summary.rows_read += 1;
        if fields.len() > self.headers.len() {
            return Err(LoadError::RowLength {
                row: row_number,
                expected: self.headers.len(),
                found: fields.len(),
            });
        }
        fields.resize(self.headers.len(), String::new());

        // The sentinel check sees the collapsed genre.
        let genre = primary_genre(&fields[self.columns.genres]).to_string();
        fields[self.columns.genres] = genre;
        if fields.iter().any(|field| field == UNKNOWN_SENTINEL) {
            self.summary.rows_dropped += 1;
            return Ok(());
        }
        for field in fields.iter_mut() {
            if is_missing(field) {
                *field = MISSING_FILL.to_string();
                self.summary.fields_filled += 1;
            }
        }
        let genre = fields[self.columns.genres].clone();

        let aired = fields[self.columns.aired].clone();
        let release = aired::parse_release_year(&aired).map_err(|source| LoadError::Aired {
            row: row_number,
            source,
        })?;

        let number = |idx: usize, column: &'static str| -> Result<f64, LoadError> {
            let raw = fields[idx].trim();
            raw.parse::<f64>().map_err(|_| LoadError::InvalidNumber {
                row: row_number,
                column,
                value: raw.to_string(),
            })
        };
        let anime = AnimeRecord {
            genre,
            source: fields[self.columns.source].clone(),
            aired,
            release,
            score: number(self.columns.score, SCORE_COLUMN)?,
            members: number(self.columns.members, MEMBERS_COLUMN)?,
            favorites: number(self.columns.favorites, FAVORITES_COLUMN)?,
            popularity: number(self.columns.popularity, POPULARITY_COLUMN)?,
        };

        fields.push(release.to_string());
        self.rows.push(CleanedRow {
            cells: fields,
            anime,
        });
        Ok(())
    }

    fn finish(mut self) -> CleanedTable {
        self.headers.push(RELEASE_COLUMN.to_string());
        CleanedTable {
            headers: self.headers,
            rows: self.rows,
            summary: self.summary,
        }
    }
}

fn is_missing(field: &str) -> bool {
    MISSING_TOKENS.contains(&field)
}

pub fn primary_genre(genres: &str) -> &str {
    genres.split(',').next().unwrap_or(genres)
}

pub fn write_cleaned_table(
    table: &CleanedTable,
    output: Option<&Path>,
    delimiter: u8,
) -> anyhow::Result<usize> {
    let mut writer = io_utils::open_csv_writer(output, delimiter)?;
    writer
        .write_record(table.headers())
        .context("Writing output headers")?;
    for (idx, row) in table.rows().iter().enumerate() {
        writer
            .write_record(&row.cells)
            .with_context(|| format!("Writing output row {}", idx + 2))?;
    }
    writer.flush().context("Flushing output writer")?;
    Ok(table.len())
}
