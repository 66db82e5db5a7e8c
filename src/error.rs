//! Error module
//!
//! Defines custom error types using `thiserror` for the emissions loader.
//! This module provides a unified error type that wraps all possible error
//! sources and implements the `From` trait for automatic conversion from
//! underlying error types.

use thiserror::Error;

/// The main error type for the emissions loader.
///
/// This enum represents all possible errors that can occur while loading
/// emissions data, from configuration and file parsing problems through
/// remote capture API failures.
///
/// # Error Categories
///
/// - **Configuration errors**: invalid CLI arguments or missing environment
///   variables; always fatal before any dispatch begins.
/// - **File errors**: CSV file I/O and parse failures; fatal before dispatch.
/// - **API errors**: per-batch transient/permanent failures and fatal
///   authentication rejections from the remote capture API.
///
/// # Example
///
/// ```rust,ignore
/// use emissions_loader::error::LoaderError;
///
/// fn example() -> Result<(), LoaderError> {
///     // Errors from underlying types are automatically converted
///     let file = std::fs::File::open("nonexistent.csv")?;
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum LoaderError {
    /// Invalid configuration.
    ///
    /// This error occurs when CLI arguments are invalid (e.g., a zero batch
    /// size) or a required environment variable such as the capture API
    /// token is missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// General I/O error.
    ///
    /// This error occurs for file system operations like opening or reading
    /// the input CSV file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV file handling error.
    ///
    /// This error occurs when the underlying CSV reader fails, including
    /// inconsistent column counts relative to the header row.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed CSV content.
    ///
    /// This error occurs when a row parses as CSV but does not satisfy the
    /// emissions layout, for example a header with fewer than the expected
    /// number of columns. Carries the 1-indexed line number for context.
    #[error("Line {line}: {message}")]
    Parse {
        /// 1-indexed line number in the input file (header row is line 1).
        line: u64,
        /// Description of what was wrong with the row.
        message: String,
    },

    /// JSON serialization error.
    ///
    /// This error occurs when building request payloads for the capture API
    /// fails to serialize.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Retryable capture API failure.
    ///
    /// Network/transport errors and server-side (5xx) responses. The
    /// dispatcher retries these up to the configured attempt limit before
    /// recording the batch as failed.
    #[error("Transient API error{}: {message}", status_suffix(.status))]
    Transient {
        /// HTTP status code, if a response was received at all.
        status: Option<u16>,
        /// Error detail for the failure report.
        message: String,
    },

    /// Non-retryable capture API failure.
    ///
    /// Client-side (4xx) responses such as a malformed record rejected by
    /// the remote API. Recorded as a batch failure without any retry.
    #[error("Permanent API error{}: {message}", status_suffix(.status))]
    Permanent {
        /// HTTP status code of the rejecting response.
        status: Option<u16>,
        /// Error detail for the failure report.
        message: String,
    },

    /// Authentication or authorization rejected by the capture API.
    ///
    /// This error is fatal: it halts submission of all remaining batches
    /// and is reported distinctly from per-batch failures.
    #[error("Authentication error: {0}")]
    Auth(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (status {})", code),
        None => String::new(),
    }
}

impl LoaderError {
    /// Returns true if this error should be retried with backoff.
    ///
    /// Only [`LoaderError::Transient`] failures are retryable; everything
    /// else either fails the batch immediately or aborts the run.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, LoaderError::Transient { .. })
    }

    /// Returns true if this error aborts the entire run mid-flight.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, LoaderError::Auth(_))
    }
}
