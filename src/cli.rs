//! CLI argument parsing module
//!
//! Handles command-line argument parsing using `clap` derive macros.
//! The CSV file path is positional and optional; when absent, the
//! `CSV_FILE_PATH` environment variable supplies a fallback (see
//! [`crate::config`]).

use clap::Parser;
use std::path::PathBuf;

use crate::error::LoaderError;

/// Command-line arguments for the emissions loader.
///
/// Use the `validate()` method after parsing to ensure numeric arguments
/// are in range before any file or network I/O begins.
///
/// # Example
///
/// ```rust,ignore
/// use clap::Parser;
/// use emissions_loader::cli::Args;
///
/// let args = Args::parse();
/// args.validate()?;
/// ```
#[derive(Parser, Debug, Default)]
#[command(name = "load_emissions")]
#[command(about = "Load emissions data from CSV into the identity graph capture API")]
#[command(version)]
pub struct Args {
    /// Path to the emissions CSV file (falls back to CSV_FILE_PATH)
    pub csv_file: Option<PathBuf>,

    /// Number of items per batch (falls back to BATCH_SIZE, default 250)
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Maximum number of concurrent requests (falls back to MAX_THREADS, default 6)
    #[arg(long)]
    pub max_threads: Option<usize>,

    /// Print requests without sending them
    #[arg(long, default_value = "false")]
    pub dry_run: bool,
}

impl Args {
    /// Validates argument values.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Config`] if `--batch-size` or `--max-threads`
    /// is zero.
    pub fn validate(&self) -> Result<(), LoaderError> {
        if self.batch_size == Some(0) {
            return Err(LoaderError::Config(
                "--batch-size must be a positive integer".to_string(),
            ));
        }
        if self.max_threads == Some(0) {
            return Err(LoaderError::Config(
                "--max-threads must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}
