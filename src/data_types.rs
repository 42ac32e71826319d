/*!
 * Data type definitions for registry matching
 *
 * Input rows carry no fixed schema, so a `Record` is an ordered list of
 * field name/value pairs plus the run-local surrogate key used to join
 * registry results back onto it.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{FIELD_FIRST_NAME, FIELD_LAST_NAME, FIELD_STATE};

/// NPI (National Provider Identifier) - 10 digit unique identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Npi(pub String);

impl Npi {
    /// Create a new NPI, validating format
    pub fn new(npi: String) -> Result<Self, crate::NpiFinderError> {
        if npi.len() != 10 || !npi.chars().all(|c| c.is_ascii_digit()) {
            return Err(crate::NpiFinderError::invalid_npi(&npi));
        }
        Ok(Npi(npi))
    }

    /// Get the NPI as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Npi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One input row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Load-order index, unique and dense within a run
    pub surrogate_key: usize,
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new(surrogate_key: usize, fields: Vec<(String, String)>) -> Self {
        Self { surrogate_key, fields }
    }

    /// Look up a field value by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set a field, appending it when the record does not have it yet
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    /// Field pairs in load order
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Display name used in diagnostics
    pub fn display_name(&self) -> String {
        format!(
            "{} {}",
            self.get(FIELD_FIRST_NAME).unwrap_or(""),
            self.get(FIELD_LAST_NAME).unwrap_or("")
        )
    }
}

/// An unambiguous registry match
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub surrogate_key: usize,
    pub npi: Npi,
}

/// Lookup terms derived from a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub surrogate_key: usize,
    pub first_name: String,
    pub last_name: String,
    pub state: String,
}

impl SearchQuery {
    /// Build a query, reporting the first required field the record lacks
    pub fn from_record(record: &Record) -> std::result::Result<Self, &'static str> {
        let field = |name: &'static str| record.get(name).map(str::to_string).ok_or(name);

        Ok(Self {
            surrogate_key: record.surrogate_key,
            first_name: field(FIELD_FIRST_NAME)?,
            last_name: field(FIELD_LAST_NAME)?,
            state: field(FIELD_STATE)?,
        })
    }
}

/// Why a record ended up without an NPI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Registry returned zero results
    NoMatch,
    /// Registry returned more than one result
    Ambiguous { count: u64 },
    /// Response body could not be interpreted
    Unparseable { reason: String },
    /// Record lacks a field needed to build the query
    MissingField { field: String },
}

/// Non-fatal per-record outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub surrogate_key: usize,
    pub name: String,
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::NoMatch => write!(f, "No results found for: {}", self.name),
            DiagnosticKind::Ambiguous { count } => {
                write!(f, "Found {} results for: {}", count, self.name)
            }
            DiagnosticKind::Unparseable { reason } => {
                write!(f, "Error parsing 'result_count' for {}: {}", self.name, reason)
            }
            DiagnosticKind::MissingField { field } => {
                write!(f, "Record {} is missing field '{}'", self.surrogate_key, field)
            }
        }
    }
}

/// Everything a search pass produced
#[derive(Debug, Clone, Default)]
pub struct SearchReport {
    /// Unambiguous matches, in record order
    pub matches: Vec<MatchResult>,
    pub diagnostics: Vec<Diagnostic>,
    /// Number of records a request was issued for
    pub queried: usize,
}

impl SearchReport {
    /// Count diagnostics matching a predicate
    pub fn count_where<F>(&self, predicate: F) -> usize
    where
        F: Fn(&DiagnosticKind) -> bool,
    {
        self.diagnostics.iter().filter(|d| predicate(&d.kind)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jane() -> Record {
        Record::new(
            4,
            vec![
                ("first_name".to_string(), "Jane".to_string()),
                ("last_name".to_string(), "Doe".to_string()),
                ("state".to_string(), "CA".to_string()),
            ],
        )
    }

    #[test]
    fn test_npi_validation() {
        assert!(Npi::new("1234567890".to_string()).is_ok());
        assert!(Npi::new("123".to_string()).is_err());
        assert!(Npi::new("12345678AB".to_string()).is_err());
    }

    #[test]
    fn test_record_set_appends_then_overwrites() {
        let mut record = jane();
        record.set("npi", "1234567890");
        assert_eq!(record.fields().last().map(|(k, _)| k.as_str()), Some("npi"));

        record.set("npi", "0987654321");
        assert_eq!(record.fields().len(), 4);
        assert_eq!(record.get("npi"), Some("0987654321"));
    }

    #[test]
    fn test_query_from_record() {
        let query = SearchQuery::from_record(&jane()).unwrap();
        assert_eq!(query.surrogate_key, 4);
        assert_eq!(query.first_name, "Jane");
        assert_eq!(query.state, "CA");
    }

    #[test]
    fn test_query_reports_missing_field() {
        let record = Record::new(0, vec![("first_name".to_string(), "Jane".to_string())]);
        assert_eq!(SearchQuery::from_record(&record), Err("last_name"));
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic {
            surrogate_key: 2,
            name: "Jane Doe".to_string(),
            kind: DiagnosticKind::Ambiguous { count: 3 },
        };
        assert_eq!(diag.to_string(), "Found 3 results for: Jane Doe");
    }
}
