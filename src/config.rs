//! Configuration module
//!
//! Resolves the effective run configuration from CLI arguments and
//! environment variables (loaded from `.env` via `dotenvy` in `main`).
//! CLI flags take precedence over the environment.
//!
//! # Recognized environment variables
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `CAPTURE_HOST` | Capture API base URL | `https://api.indykite.com` |
//! | `CAPTURE_TOKEN` | Bearer token (required) | — |
//! | `CSV_FILE_PATH` | Fallback CSV path | — |
//! | `BATCH_SIZE` | Items per batch | `250` |
//! | `MAX_THREADS` | Concurrent requests | `6` |
//! | `DRY_RUN` | Log requests without sending | `false` |

use std::env;
use std::path::PathBuf;

use crate::cli::Args;
use crate::error::LoaderError;

/// Default capture API host.
pub const DEFAULT_HOST: &str = "https://api.indykite.com";
/// Default number of items per batch.
pub const DEFAULT_BATCH_SIZE: usize = 250;
/// Default number of concurrent requests.
pub const DEFAULT_MAX_THREADS: usize = 6;

/// Effective configuration for one loader run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Capture API base URL.
    pub host: String,
    /// Bearer token for the capture API.
    pub token: String,
    /// Path to the input CSV file.
    pub csv_file: PathBuf,
    /// Number of items per batch.
    pub batch_size: usize,
    /// Maximum number of concurrent requests.
    pub max_threads: usize,
    /// Whether to log requests without sending them.
    pub dry_run: bool,
}

impl Config {
    /// Resolves configuration from CLI arguments and process environment.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Config`] if the token is missing, no CSV path
    /// is available from either source, or a numeric variable does not
    /// parse as a positive integer.
    pub fn resolve(args: &Args) -> Result<Self, LoaderError> {
        Self::resolve_with(args, |name| env::var(name).ok())
    }

    /// Resolves configuration with an explicit environment lookup.
    ///
    /// Separated from [`Config::resolve`] so tests can supply a controlled
    /// environment without mutating process state.
    pub fn resolve_with(
        args: &Args,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, LoaderError> {
        args.validate()?;

        let token = lookup("CAPTURE_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                LoaderError::Config(
                    "missing required environment variable: CAPTURE_TOKEN".to_string(),
                )
            })?;

        let host = lookup("CAPTURE_HOST")
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let csv_file = args
            .csv_file
            .clone()
            .or_else(|| lookup("CSV_FILE_PATH").map(PathBuf::from))
            .ok_or_else(|| {
                LoaderError::Config(
                    "CSV file path not provided; pass it as an argument or set CSV_FILE_PATH"
                        .to_string(),
                )
            })?;

        let batch_size = match args.batch_size {
            Some(size) => size,
            None => positive_env(&lookup, "BATCH_SIZE", DEFAULT_BATCH_SIZE)?,
        };
        let max_threads = match args.max_threads {
            Some(threads) => threads,
            None => positive_env(&lookup, "MAX_THREADS", DEFAULT_MAX_THREADS)?,
        };

        let dry_run = args.dry_run
            || lookup("DRY_RUN")
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(false);

        Ok(Self {
            host,
            token,
            csv_file,
            batch_size,
            max_threads,
            dry_run,
        })
    }
}

/// Reads a positive integer environment variable, falling back to `default`
/// when unset.
fn positive_env(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: usize,
) -> Result<usize, LoaderError> {
    match lookup(name) {
        None => Ok(default),
        Some(raw) => {
            let value: usize = raw.trim().parse().map_err(|_| {
                LoaderError::Config(format!("{} must be a positive integer, got {:?}", name, raw))
            })?;
            if value == 0 {
                return Err(LoaderError::Config(format!(
                    "{} must be a positive integer",
                    name
                )));
            }
            Ok(value)
        }
    }
}
