//! Error types for quill

use thiserror::Error;

use crate::document::NodeId;

/// Errors reported by the document tree and the list renderer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuillError {
    /// `fill` was called without any fields
    #[error("row data is empty, pass data as a struct of arrays")]
    EmptyRowData,

    /// A field of the row data has no values
    #[error("field `{field}` has no rows")]
    EmptyField { field: String },

    /// Field sequences disagree on the row count
    #[error("field `{field}` has {found} rows, expected {expected}")]
    LengthMismatch {
        field: String,
        expected: usize,
        found: usize,
    },

    /// `fill` was called before a template was configured
    #[error("no template configured")]
    NoTemplate,

    /// The node does not exist (destroyed or never created)
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Configuration could not be parsed
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for quill operations
pub type Result<T> = std::result::Result<T, QuillError>;
