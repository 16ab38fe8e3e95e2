// src/main.rs
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use irs990_extractor::run::{self, RunConfig};
use irs990_extractor::utils::{self, AppError};

/// Command Line Interface for the Form 990 dataset extractor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// URL of the filing index CSV
    #[arg(long, default_value = "https://s3.amazonaws.com/irs-form-990/index_2016.csv")]
    index_url: String,

    /// Base URL filings are downloaded from
    #[arg(long, default_value = "https://s3.amazonaws.com/irs-form-990")]
    base_url: String,

    /// Local path the fetched index is cached at
    #[arg(long, default_value = "input/index.csv")]
    index_cache: PathBuf,

    /// Output dataset path
    #[arg(short, long, default_value = "output/npo_dataset.csv")]
    output: PathBuf,

    /// Maximum number of filings to process (whole index if omitted)
    #[arg(short, long)]
    limit: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    /// Re-fetch the index even when a cached copy exists
    #[arg(long)]
    refresh_index: bool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::info!("Starting extraction run for args: {:?}", args);

    let config = RunConfig {
        index_url: args.index_url,
        base_url: args.base_url,
        index_cache: args.index_cache,
        output: args.output,
        limit: args.limit,
        timeout: Duration::from_secs(args.timeout_secs),
        refresh_index: args.refresh_index,
    };

    // 3. Drive the pipeline
    let summary = run::execute(&config).await?;

    if let Some(reason) = summary.fatal {
        return Err(AppError::Processing(format!(
            "Run aborted after writing {} records ({} skipped): {}",
            summary.written, summary.skipped, reason
        )));
    }

    Ok(())
}
