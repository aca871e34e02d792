use thiserror::Error;

use crate::avl::TreeError;
use crate::config::ConfigError;
use crate::loader::LoadError;
use crate::record::RecordError;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Parse error: {}", .0.join("; "))]
    Parse(Vec<String>),

    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Invalid record: {0}")]
    Record(#[from] RecordError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ShellResult<T> = Result<T, ShellError>;
