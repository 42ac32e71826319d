/*!
 * End-to-end matching run
 *
 * load -> validate -> search -> merge -> export, driven by one
 * `FinderConfig`. Nothing is written unless every lookup completed.
 */

use std::path::PathBuf;

use crate::config::FinderConfig;
use crate::data_types::{DiagnosticKind, SearchReport};
use crate::registry::{HttpTransport, RegistryClient, RegistryTransport};
use crate::store::RecordStore;
use crate::Result;

/// Counts describing a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub records: usize,
    pub matched: usize,
    pub no_match: usize,
    pub ambiguous: usize,
    pub unparseable: usize,
    pub missing_field: usize,
    pub export_path: PathBuf,
}

impl RunSummary {
    fn from_report(records: usize, report: &SearchReport, export_path: PathBuf) -> Self {
        Self {
            records,
            matched: report.matches.len(),
            no_match: report.count_where(|k| matches!(k, DiagnosticKind::NoMatch)),
            ambiguous: report.count_where(|k| matches!(k, DiagnosticKind::Ambiguous { .. })),
            unparseable: report.count_where(|k| matches!(k, DiagnosticKind::Unparseable { .. })),
            missing_field: report.count_where(|k| matches!(k, DiagnosticKind::MissingField { .. })),
            export_path,
        }
    }

    /// Records left without an NPI
    pub fn unresolved(&self) -> usize {
        self.records - self.matched
    }

    pub fn print_summary(&self) {
        println!("=== NPI Lookup Summary ===");
        println!("Records:       {}", self.records);
        println!("Matched:       {}", self.matched);
        println!("No results:    {}", self.no_match);
        println!("Ambiguous:     {}", self.ambiguous);
        println!("Unparseable:   {}", self.unparseable);
        if self.missing_field > 0 {
            println!("Missing field: {}", self.missing_field);
        }
        println!("Exported to:   {}", self.export_path.display());
    }
}

/// Run against the live registry over HTTP
pub fn run(config: &FinderConfig) -> Result<RunSummary> {
    let transport = HttpTransport::with_config(&config.registry_config())?;
    run_with_transport(config, transport)
}

/// Run with any transport
pub fn run_with_transport<T: RegistryTransport>(config: &FinderConfig, transport: T) -> Result<RunSummary> {
    let mut store = RecordStore::load(&config.input_path)?;
    store.validate_required_columns()?;

    let client = RegistryClient::new(&config.registry_url, transport)
        .with_api_version(&config.api_version);
    #[cfg(feature = "progress")]
    let client = client.with_progress_bar(config.enable_progress_bar);

    tracing::info!(registry = client.base_url(), records = store.len(), "searching registry");
    let report = client.search(store.records())?;

    store.merge_results(&report.matches);
    store.export(&config.export_path)?;

    let summary = RunSummary::from_report(store.len(), &report, config.export_path.clone());
    tracing::info!(
        matched = summary.matched,
        unresolved = summary.unresolved(),
        "run complete"
    );
    Ok(summary)
}
