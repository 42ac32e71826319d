/*!
 * Export functionality for matched doctor lists
 *
 * Writes the record store back out as delimited text in the original
 * column order, with the `npi` column appended once results are merged.
 */

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::store::RecordStore;
use crate::{NpiFinderError, Result};

/// Trait for implementing record store exporters
pub trait RecordExporter {
    /// Export the store to `path`
    fn export(&self, store: &RecordStore, path: &Path) -> Result<()>;
}

/// CSV exporter
pub struct CsvExporter {
    /// Whether to include the header row
    pub include_headers: bool,
    /// Field delimiter
    pub delimiter: u8,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self {
            include_headers: true,
            delimiter: b',',
        }
    }
}

impl CsvExporter {
    /// Create a new CSV exporter
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set whether the header row is written
    pub fn with_headers(mut self, include: bool) -> Self {
        self.include_headers = include;
        self
    }

    /// Write the store to any writer. Fields a record lacks come out empty.
    pub fn write_to<W: Write>(&self, store: &RecordStore, out: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .from_writer(out);

        let headers = store.headers();
        if self.include_headers {
            writer.write_record(headers)?;
        }

        for record in store.records() {
            writer.write_record(headers.iter().map(|h| record.get(h).unwrap_or("")))?;
        }

        writer.flush()?;
        Ok(())
    }
}

impl RecordExporter for CsvExporter {
    fn export(&self, store: &RecordStore, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|source| NpiFinderError::io_at(path, source))?;

        self.write_to(store, BufWriter::new(file)).map_err(|err| match err {
            NpiFinderError::Io { source, .. } => NpiFinderError::io_at(path, source),
            other => other,
        })?;

        tracing::info!(path = %path.display(), records = store.len(), "exported records");
        Ok(())
    }
}
