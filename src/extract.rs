//! Field and option extracts
//!
//! Flat CSV files produced by `export` (or by hand) and consumed by `replicate`:
//! - fields: `subdomain, field_id, field_title, field_type`
//! - options: `subdomain, field_name, field_id, option_id, option_value`
//!
//! Only `field_title`, `field_name` and `option_value` are required on read.
//! Readers are lazy and single-pass. A missing required column fails the whole
//! read; a row with an empty required value is skipped and recorded. An I/O
//! failure ends iteration and is returned by `finish`.

use crate::error::{ConfigError, ConfigResult, RecordError};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const FIELD_TITLE_COLUMN: &str = "field_title";
pub const FIELD_NAME_COLUMN: &str = "field_name";
pub const OPTION_VALUE_COLUMN: &str = "option_value";

/// Custom field definition of interest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRecord {
    title: String,
}

impl FieldRecord {
    pub fn new(title: impl Into<String>) -> Result<Self, RecordError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(RecordError { field: FIELD_TITLE_COLUMN });
        }
        Ok(Self { title })
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

/// Selectable option of a choice field, tied to its field by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionRecord {
    field_name: String,
    option_value: String,
}

impl OptionRecord {
    pub fn new(
        field_name: impl Into<String>,
        option_value: impl Into<String>,
    ) -> Result<Self, RecordError> {
        let field_name = field_name.into();
        let option_value = option_value.into();
        if field_name.trim().is_empty() {
            return Err(RecordError { field: FIELD_NAME_COLUMN });
        }
        if option_value.trim().is_empty() {
            return Err(RecordError { field: OPTION_VALUE_COLUMN });
        }
        Ok(Self {
            field_name,
            option_value,
        })
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn option_value(&self) -> &str {
        &self.option_value
    }
}

/// Data row that was skipped instead of aborting the read
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    /// 1-based line in the source file
    pub line: u64,
    pub reason: String,
}

/// Row iterator shared by both readers
struct Rows<R> {
    source: PathBuf,
    records: csv::StringRecordsIntoIter<R>,
    skipped: Vec<SkippedRow>,
    failure: Option<ConfigError>,
}

impl<R: Read> Rows<R> {
    /// Open `reader` and resolve the positions of `required` columns
    fn open<const N: usize>(
        source: PathBuf,
        reader: R,
        required: [&'static str; N],
    ) -> ConfigResult<(Self, [usize; N])> {
        let mut csv = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = csv.headers()?.clone();

        let mut positions = [0; N];
        for (slot, column) in positions.iter_mut().zip(required) {
            *slot = headers
                .iter()
                .position(|h| h.trim() == column)
                .ok_or_else(|| ConfigError::MalformedExtract {
                    path: source.clone(),
                    column,
                })?;
        }

        let rows = Self {
            source,
            records: csv.into_records(),
            skipped: Vec::new(),
            failure: None,
        };
        Ok((rows, positions))
    }

    /// Next parseable row, recording unparseable ones as skipped
    fn next_row(&mut self) -> Option<(u64, csv::StringRecord)> {
        if self.failure.is_some() {
            return None;
        }
        loop {
            match self.records.next()? {
                Ok(record) => {
                    let line = record.position().map(|p| p.line()).unwrap_or(0);
                    return Some((line, record));
                }
                Err(e) => {
                    let line = e.position().map(|p| p.line()).unwrap_or(0);
                    let reason = e.to_string();
                    match e.into_kind() {
                        csv::ErrorKind::Io(error) => {
                            tracing::error!(
                                extract = %self.source.display(),
                                line,
                                "Extract read failed: {}",
                                error
                            );
                            self.failure = Some(ConfigError::io(self.source.clone(), error));
                            return None;
                        }
                        _ => self.skip(line, reason),
                    }
                }
            }
        }
    }

    fn finish(self) -> ConfigResult<Vec<SkippedRow>> {
        match self.failure {
            Some(error) => Err(error),
            None => Ok(self.skipped),
        }
    }

    fn skip(&mut self, line: u64, reason: String) {
        tracing::warn!(
            extract = %self.source.display(),
            line,
            reason = %reason,
            "Skipping extract row"
        );
        self.skipped.push(SkippedRow { line, reason });
    }
}

/// Lazy reader over the field extract
pub struct FieldReader<R> {
    rows: Rows<R>,
    title: usize,
}

impl<R: Read> FieldReader<R> {
    /// `source` names the input in diagnostics
    pub fn new(source: impl Into<PathBuf>, reader: R) -> ConfigResult<Self> {
        let (rows, [title]) = Rows::open(source.into(), reader, [FIELD_TITLE_COLUMN])?;
        Ok(Self { rows, title })
    }

    /// Rows skipped so far
    pub fn skipped(&self) -> &[SkippedRow] {
        &self.rows.skipped
    }

    /// Skipped rows, or the I/O error that cut the read short
    pub fn finish(self) -> ConfigResult<Vec<SkippedRow>> {
        self.rows.finish()
    }
}

impl<R: Read> Iterator for FieldReader<R> {
    type Item = FieldRecord;

    fn next(&mut self) -> Option<FieldRecord> {
        loop {
            let (line, row) = self.rows.next_row()?;
            match FieldRecord::new(row.get(self.title).unwrap_or_default()) {
                Ok(record) => return Some(record),
                Err(e) => self.rows.skip(line, e.to_string()),
            }
        }
    }
}

/// Lazy reader over the option extract
pub struct OptionReader<R> {
    rows: Rows<R>,
    field_name: usize,
    option_value: usize,
}

impl<R: Read> OptionReader<R> {
    /// `source` names the input in diagnostics
    pub fn new(source: impl Into<PathBuf>, reader: R) -> ConfigResult<Self> {
        let (rows, [field_name, option_value]) = Rows::open(
            source.into(),
            reader,
            [FIELD_NAME_COLUMN, OPTION_VALUE_COLUMN],
        )?;
        Ok(Self {
            rows,
            field_name,
            option_value,
        })
    }

    /// Rows skipped so far
    pub fn skipped(&self) -> &[SkippedRow] {
        &self.rows.skipped
    }

    /// Skipped rows, or the I/O error that cut the read short
    pub fn finish(self) -> ConfigResult<Vec<SkippedRow>> {
        self.rows.finish()
    }
}

impl<R: Read> Iterator for OptionReader<R> {
    type Item = OptionRecord;

    fn next(&mut self) -> Option<OptionRecord> {
        loop {
            let (line, row) = self.rows.next_row()?;
            let field_name = row.get(self.field_name).unwrap_or_default();
            let option_value = row.get(self.option_value).unwrap_or_default();
            match OptionRecord::new(field_name, option_value) {
                Ok(record) => return Some(record),
                Err(e) => self.rows.skip(line, e.to_string()),
            }
        }
    }
}

/// Open the field extract at `path`
pub fn read_fields(path: &Path) -> ConfigResult<FieldReader<File>> {
    let file = File::open(path).map_err(|e| ConfigError::io(path, e))?;
    FieldReader::new(path, file)
}

/// Open the option extract at `path`
pub fn read_options(path: &Path) -> ConfigResult<OptionReader<File>> {
    let file = File::open(path).map_err(|e| ConfigError::io(path, e))?;
    OptionReader::new(path, file)
}

/// Row of the field extract as written by `export`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldExtractRow {
    pub subdomain: String,
    pub field_id: u64,
    pub field_title: String,
    pub field_type: String,
}

/// Row of the option extract as written by `export`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionExtractRow {
    pub subdomain: String,
    pub field_name: String,
    pub field_id: u64,
    pub option_id: u64,
    pub option_value: String,
}

/// Header of the field extract
pub const FIELD_EXTRACT_HEADER: [&str; 4] =
    ["subdomain", "field_id", FIELD_TITLE_COLUMN, "field_type"];

/// Header of the option extract
pub const OPTION_EXTRACT_HEADER: [&str; 5] = [
    "subdomain",
    FIELD_NAME_COLUMN,
    "field_id",
    "option_id",
    OPTION_VALUE_COLUMN,
];

/// CSV sink for extract rows
///
/// The header is written up front so an extract with no rows still reads back.
pub struct ExtractWriter<W: Write> {
    csv: csv::Writer<W>,
    rows: usize,
}

impl<W: Write> ExtractWriter<W> {
    pub fn new(writer: W, header: &[&str]) -> ConfigResult<Self> {
        let mut csv = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        csv.write_record(header)?;
        Ok(Self { csv, rows: 0 })
    }

    /// Append one row; its fields must follow the header order
    pub fn write<T: Serialize>(&mut self, row: &T) -> ConfigResult<()> {
        self.csv.serialize(row)?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written so far
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn finish(mut self) -> ConfigResult<W> {
        self.csv.flush().map_err(|e| ConfigError::Csv(e.into()))?;
        self.csv
            .into_inner()
            .map_err(|e| ConfigError::Csv(e.into_error().into()))
    }
}

impl ExtractWriter<File> {
    /// Create (or truncate) the extract at `path`
    pub fn create(path: &Path, header: &[&str]) -> ConfigResult<Self> {
        let file = File::create(path).map_err(|e| ConfigError::io(path, e))?;
        Self::new(file, header)
    }
}
