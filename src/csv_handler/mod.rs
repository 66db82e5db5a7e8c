//! CSV handling module
//!
//! Provides reading of emissions CSV files into [`EmissionRecord`]s.
//! Split into submodules for the reader and the record type.

mod reader;
mod record;

pub use reader::CsvReader;
pub use record::EmissionRecord;

/// Minimum number of columns an emissions data row must carry: name, well
/// key, year, month, day, then four (volume, volume uom, mass, mass uom)
/// groups for the four emission types.
pub const MIN_COLUMNS: usize = 21;
