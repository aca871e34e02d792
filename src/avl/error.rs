use thiserror::Error;

use super::node::NodeId;
use crate::record::Key;

/// Errors that can occur during tree operations
///
/// Duplicate inserts and missing keys are ordinary outcomes and are
/// reported through return values, not through this type.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TreeError {
    #[error("Operation requires a non-empty tree")]
    EmptyTree,

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Invariant violated at key {key}: {reason}")]
    InvariantViolation { key: Key, reason: String },
}

pub type TreeResult<T> = Result<T, TreeError>;
