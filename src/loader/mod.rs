//! CSV ingestion of country temperature-variation records
//!
//! Expected layout, one country per row after a header row:
//!
//! ```text
//! ObjectId,Country,ISO3,F1961,F1962,...
//! 1,"Afghanistan, Islamic Rep. of",AFG,-0.113,-0.164,...
//! ```
//!
//! Quoted fields may contain the delimiter. A measurement that is empty,
//! unparseable or not finite is read as 0.0; the key of each record is the
//! mean of its measurements.

mod error;

pub use error::{LoadError, LoadResult};

use std::io;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info, warn};

use crate::avl::AvlTree;
use crate::record::Record;

/// Number of leading non-measurement columns (id, country, ISO3)
pub const FIXED_COLUMNS: usize = 3;

/// CSV reader settings
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    /// Field delimiter
    pub delimiter: u8,
    /// Skip the first row
    pub has_headers: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_headers: true,
        }
    }
}

/// Read every record from a CSV file
pub fn load_path(path: impl AsRef<Path>, options: &LoadOptions) -> LoadResult<Vec<Record>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let records = load_reader(file, options)?;
    info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Read every record from CSV text
pub fn load_reader<R: io::Read>(reader: R, options: &LoadOptions) -> LoadResult<Vec<Record>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(options.has_headers)
        .flexible(true) // Rows may report different numbers of years
        .trim(Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        records.push(parse_row(&row)?);
    }
    Ok(records)
}

/// Build a fresh tree from `records`, in order
///
/// Returns the tree and the number of records dropped because another
/// record already had the same key.
pub fn build_tree(records: Vec<Record>) -> (AvlTree, usize) {
    let total = records.len();
    let (tree, duplicates) = AvlTree::from_records(records);
    if duplicates > 0 {
        warn!("{duplicates} of {total} records share a key with an earlier record and were skipped");
    }
    debug!("Built tree: {} nodes, height {}", tree.len(), tree.height());
    (tree, duplicates)
}

fn parse_row(row: &StringRecord) -> LoadResult<Record> {
    let line = row.position().map_or(0, |p| p.line());

    if row.len() < FIXED_COLUMNS {
        return Err(LoadError::MissingColumns {
            line,
            found: row.len(),
        });
    }

    let id_field = &row[0];
    let id = id_field.parse().map_err(|_| LoadError::InvalidId {
        line,
        value: id_field.to_string(),
    })?;

    let measurements = row
        .iter()
        .skip(FIXED_COLUMNS)
        .map(|field| parse_measurement(field, line))
        .collect();

    Record::new(id, &row[1], &row[2], measurements)
        .map_err(|source| LoadError::InvalidRecord { line, source })
}

/// Parse one yearly value, falling back to 0.0
fn parse_measurement(field: &str, line: u64) -> f64 {
    if field.is_empty() {
        return 0.0;
    }
    match field.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            debug!("Line {line}: unreadable measurement {field:?}, using 0.0");
            0.0
        }
    }
}
