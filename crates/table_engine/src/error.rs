//! Error types for table operations

use doc_model::DocModelError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("{operation}: row {index} is out of range for a table with {rows} rows")]
    RowOutOfRange {
        operation: &'static str,
        index: usize,
        rows: usize,
    },

    #[error("{operation}: column {index} is out of range for a table with {columns} columns")]
    ColumnOutOfRange {
        operation: &'static str,
        index: usize,
        columns: usize,
    },

    #[error("{operation}: invalid count {count}")]
    InvalidCount { operation: &'static str, count: usize },

    #[error("Node {0} is not a table")]
    NotATable(Uuid),

    #[error("Node {0} is not a table cell")]
    NotATableCell(Uuid),

    #[error("{operation}: no cells given")]
    EmptySelection { operation: &'static str },

    #[error("{operation}: cells belong to different tables")]
    MixedTables { operation: &'static str },

    #[error("{operation}: cell {cell} is selected more than once")]
    DuplicateCell { operation: &'static str, cell: Uuid },

    #[error("Post-fixers did not settle after {iterations} iterations")]
    PostFixersDidNotSettle { iterations: usize },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document model error: {0}")]
    DocModel(#[from] DocModelError),
}

pub type Result<T> = std::result::Result<T, TableError>;
