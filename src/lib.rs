/*!
 * # npi-finder
 *
 * Look up National Provider Identifiers for a list of doctors using the
 * public NPPES NPI Registry API, then write the list back out with an `npi`
 * column.
 *
 * ## Features
 *
 * - 📄 **Schema-free input**: any delimited file with `first_name`,
 *   `last_name` and `state` columns; other columns pass through untouched
 * - 🔍 **Format sniffing**: delimiter detected from the first kilobyte,
 *   spreadsheets rejected with a clear error
 * - 🎯 **No guessing**: only an exact single registry match fills in an NPI
 * - 🧪 **Testable**: the HTTP call sits behind `RegistryTransport`
 *
 * ## Quick Start
 *
 * ```no_run
 * use npi_finder::prelude::*;
 *
 * # fn main() -> Result<()> {
 * let mut store = RecordStore::load("doctors.csv")?;
 * store.validate_required_columns()?;
 *
 * let client = RegistryClient::new("https://npiregistry.cms.hhs.gov", HttpTransport::new()?);
 * let report = client.search(store.records())?;
 *
 * for diagnostic in &report.diagnostics {
 *     println!("{}", diagnostic);
 * }
 *
 * store.merge_results(&report.matches);
 * store.export("export.csv")?;
 * # Ok(())
 * # }
 * ```
 *
 * ## Running the whole pipeline
 *
 * ```no_run
 * # use npi_finder::prelude::*;
 * # fn main() -> Result<()> {
 * let config = ConfigBuilder::new()
 *     .input_path("doctors.csv")
 *     .export_path("export.csv")
 *     .progress_bar(false)
 *     .build();
 *
 * let summary = npi_finder::pipeline::run(&config)?;
 * summary.print_summary();
 * # Ok(())
 * # }
 * ```
 *
 * Registry API documentation: https://npiregistry.cms.hhs.gov/api-page
 */

// Re-export error types from root
pub use error::{ErrorContext, NpiFinderError, Result};

// Public modules
pub mod config;
pub mod data_types;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod reader;
pub mod registry;
pub mod schema;
pub mod store;

/// Prelude module for convenient imports
///
/// Import everything you need with:
/// ```
/// use npi_finder::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{ConfigBuilder, FinderConfig};
    pub use crate::data_types::*;
    pub use crate::error::{NpiFinderError, Result};
    pub use crate::export::{CsvExporter, RecordExporter};
    pub use crate::pipeline::RunSummary;
    pub use crate::reader::{InputFormat, RecordReader};
    pub use crate::registry::{HttpTransport, RegistryClient, RegistryConfig, RegistryTransport};
    pub use crate::schema::{InputSchema, OutputSchema};
    pub use crate::store::RecordStore;
}

/// Registry and file format constants
pub mod constants {
    /// Default registry service root
    pub const DEFAULT_REGISTRY_URL: &str = "https://npiregistry.cms.hhs.gov";

    /// Registry API path under the service root
    pub const REGISTRY_API_PATH: &str = "api/";

    /// Registry API version sent with every query
    pub const DEFAULT_API_VERSION: &str = "2.1";

    /// Default output path
    pub const DEFAULT_EXPORT_PATH: &str = "./export.csv";

    /// Bytes read from the input to detect its format
    pub const SNIFF_SAMPLE_BYTES: usize = 1024;

    /// Input columns used to build a query
    pub const FIELD_FIRST_NAME: &str = "first_name";
    pub const FIELD_LAST_NAME: &str = "last_name";
    pub const FIELD_STATE: &str = "state";

    /// Column added to the export
    pub const FIELD_NPI: &str = "npi";
}
