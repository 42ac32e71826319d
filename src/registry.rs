/*!
 * NPI Registry client
 *
 * Builds one name/state query per record, fetches it through a
 * `RegistryTransport`, and classifies the result cardinality. Only an exact
 * single match yields an NPI; zero, many, or unreadable responses become
 * per-record diagnostics and the search moves on to the next record.
 */

use std::time::Duration;

use serde_json::Value;
use url::form_urlencoded;

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

use crate::constants::{DEFAULT_API_VERSION, REGISTRY_API_PATH};
use crate::data_types::{Diagnostic, DiagnosticKind, MatchResult, Npi, Record, SearchQuery, SearchReport};
use crate::{NpiFinderError, Result};

/// Something that can fetch a registry URL and hand back the response body
pub trait RegistryTransport {
    fn get(&self, url: &str) -> Result<String>;
}

impl<T: RegistryTransport + ?Sized> RegistryTransport for &T {
    fn get(&self, url: &str) -> Result<String> {
        (**self).get(url)
    }
}

impl<T: RegistryTransport + ?Sized> RegistryTransport for Box<T> {
    fn get(&self, url: &str) -> Result<String> {
        (**self).get(url)
    }
}

/// HTTP settings for the blocking transport
#[derive(Debug, Clone, Default)]
pub struct RegistryConfig {
    /// Request timeout in seconds; `None` waits indefinitely
    pub timeout_seconds: Option<u64>,
    /// Custom user agent string
    pub user_agent: Option<String>,
}

/// Blocking HTTP transport backed by reqwest
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        Self::with_config(&RegistryConfig::default())
    }

    pub fn with_config(config: &RegistryConfig) -> Result<Self> {
        // reqwest's blocking client defaults to a 30s timeout; keep "none" meaning none
        let mut builder = reqwest::blocking::Client::builder()
            .timeout(config.timeout_seconds.map(Duration::from_secs));

        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }

        let client = builder.build().map_err(|e| NpiFinderError::Configuration {
            message: format!("Failed to create HTTP client: {}", e),
            suggestion: Some("Check your network configuration".to_string()),
        })?;

        Ok(Self { client })
    }
}

impl RegistryTransport for HttpTransport {
    fn get(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(NpiFinderError::registry(url, format!("HTTP error {}", status)));
        }

        Ok(response.text()?)
    }
}

/// How a single registry response was interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Match(Npi),
    NoMatch,
    Ambiguous(u64),
    Unparseable(String),
}

/// Interpret a registry response body.
///
/// Reads `result_count`; a count of one takes `results[0].number` (string or
/// integer). Missing or non-integer counts and malformed JSON are reported as
/// unparseable rather than failing.
pub fn classify_response(body: &str) -> LookupOutcome {
    let json: Value = match serde_json::from_str(body) {
        Ok(json) => json,
        Err(e) => return LookupOutcome::Unparseable(format!("invalid JSON: {}", e)),
    };

    let count = match json.get("result_count") {
        Some(value) => match value.as_i64() {
            Some(count) => count,
            None => return LookupOutcome::Unparseable(format!("result_count is not an integer: {}", value)),
        },
        None => return LookupOutcome::Unparseable(missing_count_reason(&json)),
    };

    match count {
        c if c < 1 => LookupOutcome::NoMatch,
        1 => match first_result_number(&json) {
            Some(number) => LookupOutcome::Match(registry_npi(number)),
            None => LookupOutcome::Unparseable("results[0].number is missing".to_string()),
        },
        c => LookupOutcome::Ambiguous(c as u64),
    }
}

/// The registry is the authority on its own numbers, so a malformed one is
/// kept and only flagged
fn registry_npi(number: String) -> Npi {
    Npi::new(number.clone()).unwrap_or_else(|e| {
        tracing::warn!(npi = %number, error = %e, "registry returned a malformed NPI");
        Npi(number)
    })
}

fn first_result_number(json: &Value) -> Option<String> {
    let number = json.get("results")?.as_array()?.first()?.get("number")?;
    match number {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// The registry reports bad queries as `{"Errors": [{"description": ...}]}`
fn missing_count_reason(json: &Value) -> String {
    let descriptions: Vec<&str> = json
        .get("Errors")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e.get("description").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    if descriptions.is_empty() {
        "result_count is missing".to_string()
    } else {
        format!("registry error: {}", descriptions.join("; "))
    }
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Registry client bound to one service root
pub struct RegistryClient<T: RegistryTransport> {
    base_url: String,
    api_version: String,
    transport: T,
    #[cfg(feature = "progress")]
    show_progress_bar: bool,
}

impl<T: RegistryTransport> RegistryClient<T> {
    /// Create a client for `base_url`; trailing slashes are ignored
    pub fn new(base_url: &str, transport: T) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            transport,
            #[cfg(feature = "progress")]
            show_progress_bar: false,
        }
    }

    /// Override the `version` query parameter
    pub fn with_api_version(mut self, version: &str) -> Self {
        self.api_version = version.to_string();
        self
    }

    #[cfg(feature = "progress")]
    /// Enable or disable the progress bar
    pub fn with_progress_bar(mut self, show: bool) -> Self {
        self.show_progress_bar = show;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Lookup URL for a query. Names are form-encoded, so spaces become `+`.
    pub fn query_url(&self, query: &SearchQuery) -> String {
        format!(
            "{}/{}?version={}&first_name={}&last_name={}&state={}",
            self.base_url,
            REGISTRY_API_PATH,
            encode(&self.api_version),
            encode(&query.first_name),
            encode(&query.last_name),
            encode(&query.state),
        )
    }

    /// Look up every record in order.
    ///
    /// Ambiguous, empty and unreadable responses are recorded as diagnostics.
    /// A transport failure stops the search and is returned as an error.
    pub fn search(&self, records: &[Record]) -> Result<SearchReport> {
        let mut report = SearchReport::default();

        #[cfg(feature = "progress")]
        let progress_bar = if self.show_progress_bar {
            let pb = ProgressBar::new(records.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        for record in records {
            self.search_one(record, &mut report)?;

            #[cfg(feature = "progress")]
            {
                if let Some(ref pb) = progress_bar {
                    pb.set_message(format!("matched={}", report.matches.len()));
                    pb.inc(1);
                }
            }
        }

        #[cfg(feature = "progress")]
        {
            if let Some(pb) = progress_bar {
                pb.finish_with_message(format!(
                    "matched={} unresolved={}",
                    report.matches.len(),
                    report.diagnostics.len()
                ));
            }
        }

        Ok(report)
    }

    fn search_one(&self, record: &Record, report: &mut SearchReport) -> Result<()> {
        let name = record.display_name();
        let diagnose = |kind: DiagnosticKind| Diagnostic {
            surrogate_key: record.surrogate_key,
            name: name.clone(),
            kind,
        };

        let query = match SearchQuery::from_record(record) {
            Ok(query) => query,
            Err(field) => {
                let diag = diagnose(DiagnosticKind::MissingField {
                    field: field.to_string(),
                });
                tracing::warn!(surrogate_key = record.surrogate_key, "{}", diag);
                report.diagnostics.push(diag);
                return Ok(());
            }
        };

        let url = self.query_url(&query);
        tracing::debug!(surrogate_key = query.surrogate_key, %url, "querying registry");

        let body = self.transport.get(&url)?;
        report.queried += 1;

        let kind = match classify_response(&body) {
            LookupOutcome::Match(npi) => {
                tracing::debug!(surrogate_key = query.surrogate_key, %npi, "matched {}", name);
                report.matches.push(MatchResult {
                    surrogate_key: query.surrogate_key,
                    npi,
                });
                return Ok(());
            }
            LookupOutcome::NoMatch => DiagnosticKind::NoMatch,
            LookupOutcome::Ambiguous(count) => DiagnosticKind::Ambiguous { count },
            LookupOutcome::Unparseable(reason) => DiagnosticKind::Unparseable { reason },
        };

        let diag = diagnose(kind);
        tracing::warn!(surrogate_key = query.surrogate_key, "{}", diag);
        report.diagnostics.push(diag);
        Ok(())
    }
}
