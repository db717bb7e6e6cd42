//! Reader and writer for the hospital allocation CSV.
//!
//! Only the columns the site tables need are read; any others are ignored.
//! Quoting follows RFC 4180, so quoted fields may hold commas, quotes and
//! line breaks.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Writer};
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::sites::{SiteDataset, SiteRecord};

pub const STATE_COLUMN: &str = "state";
pub const DEMAND_COLUMN: &str = "staffed_icu_adult_patients_confirmed_covid_7_day_avg";
pub const ALLOCATED_COLUMN: &str = "icu_allocated";
pub const URBAN_STATUS_COLUMN: &str = "urban_status";
pub const SHORTAGE_COLUMN: &str = "shortage";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset is empty, expected a header row")]
    MissingHeader,

    #[error("required column '{0}' not found in header")]
    MissingColumn(&'static str),

    #[error("line {line}: expected at least {expected} fields, found {found}")]
    ShortRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: column '{column}' has invalid number '{value}'")]
    InvalidNumber {
        line: u64,
        column: &'static str,
        value: String,
    },
}

struct ColumnIndex {
    state: usize,
    demand: usize,
    allocated: usize,
    urban_status: Option<usize>,
}

impl ColumnIndex {
    fn from_header(header: &StringRecord) -> Result<Self, DatasetError> {
        let find = |name: &str| {
            header
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
        };
        Ok(Self {
            state: find(STATE_COLUMN).ok_or(DatasetError::MissingColumn(STATE_COLUMN))?,
            demand: find(DEMAND_COLUMN).ok_or(DatasetError::MissingColumn(DEMAND_COLUMN))?,
            allocated: find(ALLOCATED_COLUMN)
                .ok_or(DatasetError::MissingColumn(ALLOCATED_COLUMN))?,
            urban_status: find(URBAN_STATUS_COLUMN),
        })
    }

    fn required_len(&self) -> usize {
        [self.state, self.demand, self.allocated]
            .into_iter()
            .chain(self.urban_status)
            .max()
            .map_or(0, |i| i + 1)
    }
}

pub fn load_sites<P: AsRef<Path>>(path: P) -> Result<SiteDataset, DatasetError> {
    let file = File::open(path.as_ref())?;
    debug!(path = %path.as_ref().display(), "loading site dataset");
    read_sites(BufReader::new(file))
}

/// Parses the dataset. A blank demand or allocation cell becomes `None`;
/// the row is kept so its other figures still count.
pub fn read_sites<R: Read>(reader: R) -> Result<SiteDataset, DatasetError> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);

    let header = reader.headers()?.clone();
    if header.iter().all(|h| h.trim().is_empty()) {
        return Err(DatasetError::MissingHeader);
    }
    let columns = ColumnIndex::from_header(&header)?;
    let required_len = columns.required_len();

    let mut dataset = SiteDataset::new(Vec::new(), columns.urban_status.is_some());
    let mut incomplete = 0usize;

    for row in reader.records() {
        let row = row?;
        let line = row.position().map_or(0, |p| p.line());
        if row.len() < required_len {
            return Err(DatasetError::ShortRow {
                line,
                expected: required_len,
                found: row.len(),
            });
        }
        let field = |i: usize| row.get(i).unwrap_or_default();

        let record = SiteRecord {
            state: field(columns.state).trim().to_string(),
            observed_demand: parse_number(field(columns.demand), line, DEMAND_COLUMN)?,
            icu_allocated: parse_number(field(columns.allocated), line, ALLOCATED_COLUMN)?,
            urban_status: columns
                .urban_status
                .map(|i| field(i).trim().to_string())
                .filter(|s| !s.is_empty()),
        };
        if !record.is_complete() {
            incomplete += 1;
        }
        dataset.records.push(record);
    }

    if incomplete > 0 {
        warn!(
            rows = incomplete,
            "rows with blank demand or allocation are left out of those totals"
        );
    }
    debug!(rows = dataset.records.len(), "site dataset parsed");

    Ok(dataset)
}

pub fn export_sites<P: AsRef<Path>>(path: P, dataset: &SiteDataset) -> Result<(), DatasetError> {
    let file = File::create(path)?;
    write_sites(file, dataset)
}

/// Writes the records with the derived shortage column appended. Missing
/// figures are written as empty cells.
pub fn write_sites<W: Write>(writer: W, dataset: &SiteDataset) -> Result<(), DatasetError> {
    let mut writer = Writer::from_writer(writer);

    let mut header = vec![STATE_COLUMN, DEMAND_COLUMN, ALLOCATED_COLUMN];
    if dataset.has_urban_status {
        header.push(URBAN_STATUS_COLUMN);
    }
    header.push(SHORTAGE_COLUMN);
    writer.write_record(&header)?;

    for record in &dataset.records {
        let mut row = vec![
            record.state.clone(),
            format_number(record.observed_demand),
            format_number(record.icu_allocated),
        ];
        if dataset.has_urban_status {
            row.push(record.urban_status.clone().unwrap_or_default());
        }
        row.push(format_number(record.shortage()));
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

fn format_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_number(field: &str, line: u64, column: &'static str) -> Result<Option<f64>, DatasetError> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|_| DatasetError::InvalidNumber {
            line,
            column,
            value: trimmed.to_string(),
        })
}
