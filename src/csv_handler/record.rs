//! Emissions record type read from the input CSV.

/// A single row of the emissions spreadsheet.
///
/// The first five columns are parsed into named fields (whitespace-trimmed);
/// the full raw row is kept alongside so the transformer can address the
/// per-emission-type measurement columns positionally.
///
/// # Column Layout
///
/// | Index | Content |
/// |-------|---------|
/// | 0 | well name |
/// | 1 | well key |
/// | 2 | year |
/// | 3 | month |
/// | 4 | day |
/// | 5..=8 | Flaring: volume, volume uom, mass, mass uom |
/// | 9..=12 | Cold Ventilation: volume, volume uom, mass, mass uom |
/// | 13..=16 | Diesel Fuel: volume, volume uom, mass, mass uom |
/// | 17..=20 | Fuel Gas: volume, volume uom, mass, mass uom |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmissionRecord {
    /// Human-readable well name (column 0).
    pub name: String,
    /// Unique well key used as the Well node's external ID (column 1).
    pub well_key: String,
    /// Measurement year (column 2).
    pub year: String,
    /// Measurement month (column 3).
    pub month: String,
    /// Measurement day (column 4).
    pub day: String,
    /// The complete raw row, for positional access to measurement columns.
    pub row: Vec<String>,
}

impl EmissionRecord {
    /// Builds a record from a raw CSV row.
    ///
    /// The named fields are trimmed copies of the first five columns. The
    /// caller is responsible for having verified the row length.
    pub fn from_row(row: Vec<String>) -> Self {
        let field = |i: usize| row.get(i).map(|s| s.trim().to_string()).unwrap_or_default();
        Self {
            name: field(0),
            well_key: field(1),
            year: field(2),
            month: field(3),
            day: field(4),
            row,
        }
    }

    /// Returns the trimmed value of a positional column, or `None` if the
    /// column is absent or blank.
    pub fn column(&self, index: usize) -> Option<&str> {
        self.row
            .get(index)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }
}
