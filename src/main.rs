//! labcanon CLI: read one extracted lab report, print the canonical report as JSON.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use labcanon::models::{PatientContext, Sex};
use labcanon::{DocumentProcessor, EngineConfig};

#[derive(Parser, Debug)]
#[command(name = "labcanon", version, about = "Normalize a lab report into canonical biomarker measurements")]
struct Cli {
    /// Plain-text report (pages separated by form feeds).
    file: PathBuf,

    /// Patient sex used for reference-range selection (male, female).
    #[arg(long)]
    sex: Option<Sex>,

    /// Patient age in years.
    #[arg(long)]
    age: Option<u8>,

    /// Engine configuration file (defaults to the per-user config).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Biomarker catalog JSON replacing the built-in catalog.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Single-line JSON output.
    #[arg(long)]
    compact: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    labcanon::init_tracing();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = EngineConfig::load(cli.config.as_deref())?;
    if cli.catalog.is_some() {
        config.catalog_path = cli.catalog;
    }

    let bytes = std::fs::read(&cli.file)?;
    let patient = PatientContext::new(cli.sex, cli.age);

    tracing::debug!(file = %cli.file.display(), "Starting labcanon v{}", labcanon::config::APP_VERSION);
    let processor = Arc::new(DocumentProcessor::from_config(config)?);
    let report = processor.spawn(bytes, Some(patient)).wait().await?;

    let json = if cli.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{json}");
    Ok(())
}
