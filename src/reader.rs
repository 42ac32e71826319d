/*!
 * Input reader for doctor lists
 *
 * Sniffs the input format from the first kilobyte of the file, then parses
 * delimited text into trimmed rows. Spreadsheets are recognised so they can
 * be rejected with a clear error instead of being read as garbage.
 */

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};

use crate::constants::SNIFF_SAMPLE_BYTES;
use crate::{ErrorContext, NpiFinderError, Result};

const XLSX_MAGIC: &[u8] = b"PK\x03\x04";
const XLS_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const DELIMITER_CANDIDATES: &[u8] = &[b'\t', b';', b',', b'|'];

/// Format detected from file content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Delimited text with the sniffed field delimiter
    Delimited { delimiter: u8 },
    /// Binary workbook; `kind` names the container
    Spreadsheet { kind: &'static str },
    /// Text in some encoding other than UTF-8 (e.g. Latin-1)
    NotUtf8,
}

/// Header row plus trimmed data rows
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<(String, String)>>,
    pub delimiter: u8,
}

/// Detect the input format from a leading sample of the file.
///
/// Zip containers (xlsx/ods) and OLE compound files (xls) are spreadsheets,
/// as is anything carrying NUL bytes. Text that is not UTF-8 is reported as
/// such. Everything else is delimited text.
pub fn detect_format(sample: &[u8]) -> InputFormat {
    if sample.starts_with(XLSX_MAGIC) {
        return InputFormat::Spreadsheet { kind: "xlsx" };
    }
    if sample.starts_with(XLS_MAGIC) {
        return InputFormat::Spreadsheet { kind: "xls" };
    }
    if sample.contains(&0) {
        return InputFormat::Spreadsheet { kind: "binary" };
    }

    let text = match std::str::from_utf8(sample) {
        Ok(text) => text,
        // A multi-byte sequence cut off by the sample boundary is fine
        Err(e) if e.error_len().is_none() => {
            std::str::from_utf8(&sample[..e.valid_up_to()]).unwrap_or_default()
        }
        Err(_) => return InputFormat::NotUtf8,
    };

    let truncated = sample.len() >= SNIFF_SAMPLE_BYTES;
    InputFormat::Delimited {
        delimiter: sniff_delimiter(text, truncated),
    }
}

/// Pick the delimiter producing the most consistent field count (>1 field)
/// across the sampled lines. Falls back to a comma.
fn sniff_delimiter(content: &str, truncated: bool) -> u8 {
    let mut sample_lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
    if truncated && sample_lines.len() > 1 {
        sample_lines.pop();
    }

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in DELIMITER_CANDIDATES {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // More columns break ties
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Reader for doctor input files
pub struct RecordReader {
    /// Overrides sniffing when set
    delimiter: Option<u8>,
}

impl Default for RecordReader {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordReader {
    pub fn new() -> Self {
        Self { delimiter: None }
    }

    /// Force a delimiter instead of sniffing one
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Read the leading sample used for format detection
    pub fn sniff<P: AsRef<Path>>(path: P) -> Result<InputFormat> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| NpiFinderError::io_at(path, e))?;
        let mut sample = Vec::with_capacity(SNIFF_SAMPLE_BYTES);
        file.by_ref()
            .take(SNIFF_SAMPLE_BYTES as u64)
            .read_to_end(&mut sample)
            .map_err(|e| NpiFinderError::io_at(path, e))?;
        Ok(detect_format(&sample))
    }

    /// Load a file into a trimmed table
    pub fn read<P: AsRef<Path>>(&self, path: P) -> Result<RawTable> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(NpiFinderError::file_not_found_with_suggestion(path.to_path_buf()));
        }

        let delimiter = match (self.delimiter, Self::sniff(path)?) {
            (_, InputFormat::Spreadsheet { kind }) => {
                return Err(NpiFinderError::spreadsheet_unsupported(path.to_path_buf(), kind));
            }
            (_, InputFormat::NotUtf8) => return Err(NpiFinderError::not_utf8(path.to_path_buf())),
            (Some(forced), _) => forced,
            (None, InputFormat::Delimited { delimiter }) => delimiter,
        };

        tracing::debug!(path = %path.display(), delimiter = %(delimiter as char), "reading input");

        let file = File::open(path).map_err(|e| NpiFinderError::io_at(path, e))?;
        read_delimited(file, delimiter).map_err(|err| match err {
            NpiFinderError::CsvParse { message, line, .. } => NpiFinderError::CsvParse {
                message,
                line,
                context: ErrorContext::for_path(path).at_line(line),
            },
            other => other,
        })
    }
}

/// Parse delimited text with a header row. Short rows are padded with empty
/// values; cells beyond the header width are dropped.
pub fn read_delimited<R: Read>(input: R, delimiter: u8) -> Result<RawTable> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(input);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result?;
        if record.len() > headers.len() {
            tracing::warn!(
                row = index + 1,
                extra = record.len() - headers.len(),
                "dropping cells beyond the header row"
            );
        }
        let row = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), record.get(i).unwrap_or("").to_string()))
            .collect();
        rows.push(row);
    }

    Ok(RawTable {
        headers,
        rows,
        delimiter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_comma_csv() {
        let sample = b"first_name,last_name,state\nJane,Doe,CA\n";
        assert_eq!(detect_format(sample), InputFormat::Delimited { delimiter: b',' });
    }

    #[test]
    fn test_detect_semicolon_with_commas_in_values() {
        let sample = b"first_name;last_name;state\n\"Jane, MD\";Doe;CA\nJohn;Roe;NY\n";
        assert_eq!(detect_format(sample), InputFormat::Delimited { delimiter: b';' });
    }

    #[test]
    fn test_detect_tab() {
        let sample = b"first_name\tlast_name\tstate\nJane\tDoe\tCA\n";
        assert_eq!(detect_format(sample), InputFormat::Delimited { delimiter: b'\t' });
    }

    #[test]
    fn test_detect_xlsx_and_xls() {
        let mut xlsx = XLSX_MAGIC.to_vec();
        xlsx.extend_from_slice(&[0x14, 0x00, 0x06, 0x00]);
        assert_eq!(detect_format(&xlsx), InputFormat::Spreadsheet { kind: "xlsx" });
        assert_eq!(detect_format(XLS_MAGIC), InputFormat::Spreadsheet { kind: "xls" });
    }

    #[test]
    fn test_detect_binary_garbage() {
        assert_eq!(
            detect_format(&[0x41, 0x00, 0x42]),
            InputFormat::Spreadsheet { kind: "binary" }
        );
    }

    #[test]
    fn test_detect_latin1_text() {
        // "José" saved as Latin-1
        let sample = b"first_name,last_name,state\nJos\xE9,Diaz,TX\n";
        assert_eq!(detect_format(sample), InputFormat::NotUtf8);
    }

    #[test]
    fn test_read_rejects_latin1_with_encoding_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.csv");
        std::fs::write(&path, b"first_name,last_name,state\nJos\xE9,Diaz,TX\n").unwrap();

        match RecordReader::new().read(&path) {
            Err(NpiFinderError::Encoding { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected encoding error, got {other:?}"),
        }
    }

    #[test]
    fn test_late_invalid_utf8_reports_line_and_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.csv");
        let mut content = b"first_name,last_name,state\n".to_vec();
        for _ in 0..100 {
            content.extend_from_slice(b"Jane,Doe,CA\n");
        }
        content.extend_from_slice(b"Jos\xE9,Diaz,TX\n");
        std::fs::write(&path, &content).unwrap();

        match RecordReader::new().read(&path) {
            Err(NpiFinderError::CsvParse { line, context, .. }) => {
                assert!(line.is_some());
                assert_eq!(context.line_number, line);
                assert_eq!(context.file_path.as_deref(), Some(path.as_path()));
            }
            other => panic!("expected csv error, got {other:?}"),
        }
    }

    #[test]
    fn test_sniff_failure_names_the_path() {
        // Reading a directory fails even with full permissions
        let dir = tempfile::tempdir().unwrap();

        match RecordReader::sniff(dir.path()) {
            Err(err @ NpiFinderError::Io { .. }) => {
                assert!(err.to_string().contains(&dir.path().display().to_string()));
                if let NpiFinderError::Io { context, .. } = err {
                    assert_eq!(context.file_path.as_deref(), Some(dir.path()));
                }
            }
            other => panic!("expected I/O error, got {other:?}"),
        }
    }

    #[test]
    fn test_detect_tolerates_cut_multibyte_char() {
        // "é" is 0xC3 0xA9; the sample ends after its first byte
        let mut sample = b"first_name,last_name,state\nRen".to_vec();
        sample.push(0xC3);
        assert_eq!(detect_format(&sample), InputFormat::Delimited { delimiter: b',' });
    }

    #[test]
    fn test_read_delimited_trims_values() {
        let input = "first_name,last_name,state\n Jane ,Doe,CA\n";
        let table = read_delimited(input.as_bytes(), b',').unwrap();
        assert_eq!(table.headers, vec!["first_name", "last_name", "state"]);
        assert_eq!(
            table.rows[0],
            vec![
                ("first_name".to_string(), "Jane".to_string()),
                ("last_name".to_string(), "Doe".to_string()),
                ("state".to_string(), "CA".to_string()),
            ]
        );
    }

    #[test]
    fn test_read_delimited_pads_short_rows_and_strips_bom() {
        let input = "\u{feff}first_name,last_name,state\nJane,Doe\n";
        let table = read_delimited(input.as_bytes(), b',').unwrap();
        assert_eq!(table.headers[0], "first_name");
        assert_eq!(table.rows[0][2], ("state".to_string(), String::new()));
    }
}
