//! Error types for document model operations

use crate::{AttributeKey, NodeType};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DocModelError {
    #[error("Node not found: {0}")]
    NodeNotFound(Uuid),

    #[error("Node {0} has no parent")]
    NotAttached(Uuid),

    #[error("A {child} node cannot be placed inside a {parent} node")]
    InvalidChild { parent: NodeType, child: NodeType },

    #[error("Index {index} is out of bounds for node {parent} with {len} children")]
    InvalidIndex { parent: Uuid, index: usize, len: usize },

    #[error("Cannot move node {0} into its own subtree")]
    CyclicMove(Uuid),

    #[error("Attribute {key} is not supported on {node_type} nodes")]
    UnsupportedAttribute { key: AttributeKey, node_type: NodeType },

    #[error("Invalid value {value} for attribute {key}")]
    InvalidAttributeValue { key: AttributeKey, value: String },

    #[error("Invalid column width: {0}")]
    InvalidColumnWidth(String),
}

pub type Result<T> = std::result::Result<T, DocModelError>;
