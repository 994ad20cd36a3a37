//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::node::NodeHandle;

/// Errors raised by node link management and tree mutations.
///
/// Every variant is detected before the graph is touched, so a failed
/// operation leaves the tree exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("cannot add to non existing node: {0}")]
    MissingParent(String),

    #[error("cannot move root node: {0}")]
    CannotMoveRoot(String),

    #[error("cannot remove root node: {0}")]
    CannotRemoveRoot(String),

    #[error("cycle detected: linking {node} under {parent}")]
    CycleDetected { node: String, parent: String },

    #[error("duplicate node id: {0}")]
    DuplicateId(String),

    #[error("invalid root: {0}")]
    InvalidRoot(String),

    #[error("stale node handle: {0:?}")]
    StaleHandle(NodeHandle),
}

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;
