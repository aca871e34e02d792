use std::io;
use thiserror::Error;

use crate::record::RecordError;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Line {line}: expected at least 3 columns (id, country, ISO3), found {found}")]
    MissingColumns { line: u64, found: usize },

    #[error("Line {line}: invalid id {value:?}")]
    InvalidId { line: u64, value: String },

    #[error("Line {line}: {source}")]
    InvalidRecord { line: u64, source: RecordError },
}

pub type LoadResult<T> = Result<T, LoadError>;
