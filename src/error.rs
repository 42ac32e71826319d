/*!
 * Error handling for NPI registry matching
 *
 * Provides detailed error types with context and recovery suggestions.
 */

use std::path::{Path, PathBuf};
use thiserror::Error;

/// npi-finder result type
pub type Result<T> = std::result::Result<T, NpiFinderError>;

/// Error types with context and suggestions
#[derive(Error, Debug)]
pub enum NpiFinderError {
    /// File I/O errors with context
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
        context: ErrorContext,
    },

    /// CSV parsing errors with location information
    #[error("CSV parsing error at line {line:?}: {message}")]
    CsvParse {
        message: String,
        line: Option<u64>,
        context: ErrorContext,
    },

    /// Input file does not exist
    #[error("File not found: {path}")]
    FileNotFound {
        path: PathBuf,
        suggestion: String,
    },

    /// Input was recognised but cannot be read
    #[error("Unsupported input format '{format}' for {path}")]
    UnsupportedFormat {
        path: PathBuf,
        format: String,
        suggestion: String,
    },

    /// Input text is not UTF-8
    #[error("Input {path} is not valid UTF-8 text")]
    Encoding {
        path: PathBuf,
        suggestion: String,
    },

    /// Required columns absent from the input header row
    #[error("Missing required columns: {}", missing.join(", "))]
    MissingColumns {
        missing: Vec<String>,
        found: Vec<String>,
    },

    /// Invalid NPI with format guidance
    #[error("Invalid NPI '{npi}': {reason}")]
    InvalidNpi {
        npi: String,
        reason: String,
    },

    /// Transport-level registry failure (connection, timeout, HTTP status)
    #[error("Registry request failed: {message}")]
    Registry {
        message: String,
        url: Option<String>,
        suggestion: Option<String>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        suggestion: Option<String>,
    },
}

/// Error context providing additional information
#[derive(Debug, Default, Clone)]
pub struct ErrorContext {
    pub file_path: Option<PathBuf>,
    pub line_number: Option<u64>,
}

impl ErrorContext {
    /// Context pointing at a file
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: Some(path.into()),
            ..Default::default()
        }
    }

    /// Attach the input line an error was found on
    pub fn at_line(mut self, line: Option<u64>) -> Self {
        self.line_number = line;
        self
    }
}

impl NpiFinderError {
    /// Create a file not found error with helpful suggestion
    pub fn file_not_found_with_suggestion(path: PathBuf) -> Self {
        let suggestion = format!(
            "Check if the file exists at '{}'. Make sure the path is correct and you have read permissions.",
            path.display()
        );

        Self::FileNotFound { path, suggestion }
    }

    /// Create an unsupported spreadsheet error
    pub fn spreadsheet_unsupported(path: PathBuf, format: &str) -> Self {
        Self::UnsupportedFormat {
            path,
            format: format.to_string(),
            suggestion: "Save the sheet as CSV (comma separated values) and run again".to_string(),
        }
    }

    /// Create a non-UTF-8 input error
    pub fn not_utf8(path: PathBuf) -> Self {
        Self::Encoding {
            path,
            suggestion: "Re-save the file with UTF-8 encoding (e.g. \"CSV UTF-8\" in Excel)".to_string(),
        }
    }

    /// Create an I/O error that names the file involved
    pub fn io_at(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            message: format!("{}: {}", path.display(), source),
            source,
            context: ErrorContext::for_path(path),
        }
    }

    /// Create an invalid NPI error with validation details
    pub fn invalid_npi(npi: &str) -> Self {
        let reason = if npi.is_empty() {
            "NPI cannot be empty".to_string()
        } else if npi.len() != 10 {
            format!("NPI must be exactly 10 digits, found {}", npi.len())
        } else {
            "NPI must contain only digits".to_string()
        };

        Self::InvalidNpi {
            npi: npi.to_string(),
            reason,
        }
    }

    /// Create a registry error for a request URL
    pub fn registry(url: &str, message: impl Into<String>) -> Self {
        Self::Registry {
            message: message.into(),
            url: Some(url.to_string()),
            suggestion: Some("Check the --registry URL and your network connection".to_string()),
        }
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            Self::FileNotFound { suggestion, .. }
            | Self::UnsupportedFormat { suggestion, .. }
            | Self::Encoding { suggestion, .. } => {
                format!("{}\n\nSuggestion: {}", self, suggestion)
            }
            Self::MissingColumns { found, .. } => {
                format!("{}\n\nColumns present: {}", self, found.join(", "))
            }
            Self::Registry { url: Some(url), suggestion, .. } => {
                let mut msg = format!("{}\nURL: {}", self, url);
                if let Some(sug) = suggestion {
                    msg.push_str(&format!("\n\nSuggestion: {}", sug));
                }
                msg
            }
            Self::Configuration { suggestion: Some(sug), .. } => {
                format!("{}\n\nSuggestion: {}", self, sug)
            }
            _ => self.to_string(),
        }
    }
}

// Convenience conversions
impl From<std::io::Error> for NpiFinderError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: err,
            context: ErrorContext::default(),
        }
    }
}

impl From<csv::Error> for NpiFinderError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|pos| pos.line());
        let message = err.to_string();

        match err.into_kind() {
            csv::ErrorKind::Io(source) => source.into(),
            _ => Self::CsvParse {
                message,
                line,
                context: ErrorContext::default().at_line(line),
            },
        }
    }
}

impl From<reqwest::Error> for NpiFinderError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {}", err)
        } else if err.is_connect() {
            format!("could not connect: {}", err)
        } else {
            err.to_string()
        };

        Self::Registry {
            message,
            url: err.url().map(|u| u.to_string()),
            suggestion: Some("Check the --registry URL and your network connection".to_string()),
        }
    }
}
