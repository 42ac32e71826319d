use clap::Parser;
use npi_finder::config::{ConfigBuilder, FinderConfig};
use npi_finder::pipeline;
use npi_finder::Result;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "npi-finder")]
#[command(version)]
#[command(about = "Query the NPPES NPI Registry to retrieve doctors' NPI numbers", long_about = None)]
struct Cli {
    /// Path to a CSV file with first_name, last_name and state columns
    file: PathBuf,
    /// Path to exported CSV file containing NPI data [default: ./export.csv]
    #[arg(long)]
    export: Option<PathBuf>,
    /// URL to NPI registry [default: https://npiregistry.cms.hhs.gov]
    #[arg(long)]
    registry: Option<String>,
    /// TOML config file (defaults to the per-user config if present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Request timeout in seconds (waits indefinitely when unset or 0)
    #[arg(long)]
    timeout: Option<u64>,
    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,
}

fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e.user_message());
            std::process::exit(1);
        }
    };

    match pipeline::run(&config) {
        Ok(summary) => summary.print_summary(),
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            std::process::exit(1);
        }
    }
}

/// Flags override the config file, which overrides the environment
fn build_config(cli: &Cli) -> Result<FinderConfig> {
    let base = match &cli.config {
        Some(path) => FinderConfig::from_file(path)?,
        None => FinderConfig::load(),
    };

    let mut builder = ConfigBuilder::from_config(base).input_path(&cli.file);
    if let Some(export) = &cli.export {
        builder = builder.export_path(export);
    }
    if let Some(registry) = &cli.registry {
        builder = builder.registry_url(registry);
    }
    if cli.timeout.is_some() {
        builder = builder.timeout_seconds(cli.timeout);
    }
    if cli.no_progress {
        builder = builder.progress_bar(false);
    }

    Ok(builder.build())
}
