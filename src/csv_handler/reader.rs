use csv::{Reader, ReaderBuilder};
use std::fs::File;
use std::path::Path;

use super::record::EmissionRecord;
use super::MIN_COLUMNS;
use crate::error::LoaderError;

/// CSV reader for emissions data files.
///
/// The `CsvReader` produces [`EmissionRecord`]s lazily from a file. The
/// sequence is finite and non-restartable: once the underlying file is
/// exhausted the reader yields `None`.
///
/// # Features
///
/// - Verifies the header carries at least the expected number of columns
/// - Enforces consistent column counts per row (via the `csv` crate)
/// - Implements `Iterator` for convenient sequential reading
/// - Reports parse failures with the offending 1-indexed line number
///
/// # Example
///
/// ```rust,ignore
/// use emissions_loader::csv_handler::CsvReader;
/// use std::path::Path;
///
/// let reader = CsvReader::new(Path::new("emissions_data.csv"))?;
/// for record in reader {
///     let record = record?;
///     println!("{} on {}-{}-{}", record.well_key, record.year, record.month, record.day);
/// }
/// ```
#[derive(Debug)]
pub struct CsvReader {
    /// The underlying CSV reader wrapping a file handle.
    reader: Reader<File>,
    /// Current line number (1-indexed; the header row is line 1).
    current_line: u64,
}

impl CsvReader {
    /// Opens the emissions CSV at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Io`] if the file cannot be opened (e.g., it
    /// does not exist) and [`LoaderError::Parse`] if the header row has
    /// fewer than [`MIN_COLUMNS`] columns.
    pub fn new(path: &Path) -> Result<Self, LoaderError> {
        // csv's from_path wraps the open error; open explicitly so a missing
        // file surfaces as a plain IO error with the path in the message.
        let file = File::open(path).map_err(|e| {
            std::io::Error::new(e.kind(), format!("{}: {}", path.display(), e))
        })?;

        let reader = ReaderBuilder::new().has_headers(true).from_reader(file);

        let mut this = Self {
            reader,
            current_line: 1,
        };
        this.check_header()?;
        Ok(this)
    }

    /// Validates the header row against the expected emissions layout.
    fn check_header(&mut self) -> Result<(), LoaderError> {
        let headers = self.reader.headers()?;
        if headers.len() < MIN_COLUMNS {
            return Err(LoaderError::Parse {
                line: 1,
                message: format!(
                    "header has {} columns, expected at least {}",
                    headers.len(),
                    MIN_COLUMNS
                ),
            });
        }
        Ok(())
    }

    /// Reads the next emission record from the file.
    ///
    /// Returns `None` at end of file. Rows whose column count disagrees with
    /// the header are reported as [`LoaderError::Csv`] by the underlying
    /// reader, annotated with the line number.
    pub fn read_next(&mut self) -> Option<Result<EmissionRecord, LoaderError>> {
        let result = self.reader.records().next()?;
        self.current_line += 1;
        let line = self.current_line;

        Some(match result {
            Ok(record) => {
                let row: Vec<String> = record.iter().map(|s| s.to_string()).collect();
                Ok(EmissionRecord::from_row(row))
            }
            Err(e) => Err(LoaderError::Parse {
                line,
                message: format!("malformed CSV row: {}", e),
            }),
        })
    }
}

impl Iterator for CsvReader {
    type Item = Result<EmissionRecord, LoaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next()
    }
}
