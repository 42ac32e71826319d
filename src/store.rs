/*!
 * Record store for doctor lists
 *
 * Holds the loaded rows for the length of a run: assigns surrogate keys,
 * hands records to the registry client, merges matches back, and exports.
 */

use std::path::Path;

use crate::constants::FIELD_NPI;
use crate::data_types::{MatchResult, Record};
use crate::export::{CsvExporter, RecordExporter};
use crate::reader::RecordReader;
use crate::schema::{InputSchema, OutputSchema};
use crate::Result;

/// Loaded input table
#[derive(Debug, Clone)]
pub struct RecordStore {
    headers: Vec<String>,
    records: Vec<Record>,
    delimiter: u8,
}

impl RecordStore {
    /// Load a delimited file.
    ///
    /// Fails when the path does not exist or the content sniffs as a
    /// spreadsheet. Every value is trimmed and each row gets a surrogate key
    /// equal to its load position.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with(&RecordReader::new(), path)
    }

    /// Load using a configured reader
    pub fn load_with<P: AsRef<Path>>(reader: &RecordReader, path: P) -> Result<Self> {
        let path = path.as_ref();
        let table = reader.read(path)?;
        let store = Self::from_parts(table.headers, table.rows).with_delimiter(table.delimiter);

        tracing::info!(
            path = %path.display(),
            records = store.len(),
            columns = store.headers.len(),
            "loaded input"
        );
        Ok(store)
    }

    /// Build a store from in-memory rows. Keys are assigned after all rows
    /// are collected.
    pub fn from_parts(headers: Vec<String>, rows: Vec<Vec<(String, String)>>) -> Self {
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(key, fields)| Record::new(key, fields))
            .collect();

        Self {
            headers,
            records,
            delimiter: b',',
        }
    }

    /// Set the delimiter used on export
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// All records in load order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Output header set
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Check the query columns exist before any lookup is attempted
    pub fn validate_required_columns(&self) -> Result<()> {
        InputSchema::validate_headers(&self.headers)
    }

    /// Attach NPIs from `results` to the records sharing their surrogate key.
    ///
    /// The `npi` column is added to the header set once; records without a
    /// result keep no value and export as empty. Merging the same results
    /// again leaves the store unchanged.
    pub fn merge_results(&mut self, results: &[MatchResult]) {
        self.headers = OutputSchema::column_names(&self.headers);

        let mut merged = 0usize;
        for record in &mut self.records {
            if let Some(result) = results.iter().find(|r| r.surrogate_key == record.surrogate_key) {
                record.set(FIELD_NPI, result.npi.as_str());
                merged += 1;
            }
        }

        tracing::debug!(merged, results = results.len(), "merged registry results");
    }

    /// Write all records as delimited text
    pub fn export<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        CsvExporter::new()
            .with_delimiter(self.delimiter)
            .export(self, path.as_ref())
    }
}
