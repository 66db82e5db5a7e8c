//! Emissions Loader - Push well emissions CSV data into the identity graph
//!
//! Reads an emissions spreadsheet, transforms it into graph nodes and
//! relationships, and submits them in batches to the capture API with
//! bounded concurrency and retry on transient failures.
//!
//! # Exit Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Success (all batches accepted) |
//! | 1 | Configuration/argument error |
//! | 2 | Authentication error (run halted) |
//! | 3 | File I/O or CSV parse error |
//! | 4 | One or more batch failures |

mod batch;
mod cli;
mod client;
mod config;
mod csv_handler;
mod dispatcher;
mod error;
mod graph;
mod transform;

use std::process::ExitCode;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use clap::Parser;

use batch::Batcher;
use cli::Args;
use client::CaptureClient;
use config::Config;
use csv_handler::{CsvReader, EmissionRecord};
use dispatcher::Dispatcher;
use error::LoaderError;
use graph::{Node, Relationship};
use transform::build_graph;

/// Exit code for success.
const EXIT_SUCCESS: u8 = 0;
/// Exit code for configuration/argument errors.
const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for authentication errors.
const EXIT_AUTH_ERROR: u8 = 2;
/// Exit code for file I/O and parse errors.
const EXIT_IO_ERROR: u8 = 3;
/// Exit code for runs where one or more batches failed.
const EXIT_BATCH_FAILURES: u8 = 4;

/// Outcome of a run that did not abort.
enum RunStatus {
    /// All batches submitted and accepted.
    Success,
    /// The run completed but some batches failed.
    BatchFailures,
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env supplies the capture API host/token and defaults
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(RunStatus::Success) => {
            println!("\nImport completed successfully!");
            ExitCode::from(EXIT_SUCCESS)
        }
        Ok(RunStatus::BatchFailures) => {
            eprintln!("\nImport completed with failures; see the summary above.");
            ExitCode::from(EXIT_BATCH_FAILURES)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(error_to_exit_code(&e))
        }
    }
}

/// Maps an error to its process exit code.
fn error_to_exit_code(error: &LoaderError) -> u8 {
    match error {
        LoaderError::Config(_) => EXIT_CONFIG_ERROR,
        LoaderError::Auth(_) => EXIT_AUTH_ERROR,
        LoaderError::Io(_) | LoaderError::Csv(_) | LoaderError::Parse { .. } => EXIT_IO_ERROR,
        _ => EXIT_BATCH_FAILURES,
    }
}

/// Main application logic.
///
/// 1. Resolves configuration (CLI args over environment)
/// 2. Reads and transforms the CSV into nodes and relationships
/// 3. Dispatches node batches, then relationship batches
/// 4. Prints the aggregate summary
async fn run(args: Args) -> Result<RunStatus, LoaderError> {
    let config = Config::resolve(&args)?;
    // Validated before any file or network I/O
    let batcher = Batcher::new(config.batch_size)?;
    let dispatcher = Dispatcher::new(config.max_threads)?;

    println!(
        "Configuration: BATCH_SIZE={}, MAX_THREADS={}",
        config.batch_size, config.max_threads
    );
    println!("Using capture host: {}", config.host);
    println!("Using CSV file: {}", config.csv_file.display());
    if config.dry_run {
        println!("*** DRY RUN ENABLED - requests will be printed but not sent ***");
    }

    println!("\nReading CSV file...");
    let records: Vec<EmissionRecord> =
        CsvReader::new(&config.csv_file)?.collect::<Result<_, _>>()?;
    println!("Read {} rows from CSV", records.len());

    let source_name = config
        .csv_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| config.csv_file.display().to_string());
    let verified_time = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

    let payload = build_graph(&records, &source_name, &verified_time);
    println!(
        "Prepared {} nodes and {} relationships",
        payload.nodes.len(),
        payload.relationships.len()
    );

    let client = Arc::new(
        CaptureClient::new(&config.host, &config.token)?.with_dry_run(config.dry_run),
    );

    let mut any_failures = false;

    println!("\nCreating nodes in batches of {}...", batcher.size());
    let node_batches = batcher.split(payload.nodes);
    let node_report = dispatcher
        .run(
            Arc::clone(&client) as Arc<dyn client::Submitter<Node>>,
            node_batches,
            "nodes",
        )
        .await;
    node_report.print_summary();
    if let Some(fatal) = node_report.fatal {
        return Err(LoaderError::Auth(fatal));
    }
    any_failures |= node_report.failed > 0;

    println!(
        "\nCreating relationships in batches of {}...",
        batcher.size()
    );
    let rel_batches = batcher.split(payload.relationships);
    let rel_report = dispatcher
        .run(
            Arc::clone(&client) as Arc<dyn client::Submitter<Relationship>>,
            rel_batches,
            "relationships",
        )
        .await;
    rel_report.print_summary();
    if let Some(fatal) = rel_report.fatal {
        return Err(LoaderError::Auth(fatal));
    }
    any_failures |= rel_report.failed > 0;

    if any_failures {
        Ok(RunStatus::BatchFailures)
    } else {
        Ok(RunStatus::Success)
    }
}
