//! Core node trait, node identity, and node kinds

use crate::{AttributeKey, AttributeValue, DocModelError, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a node in the document tree.
/// Uses UUID v4 so ids stay stable across clones and serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Create a new random NodeId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for NodeId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Enumeration of all node types in the document tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    Document,
    Table,
    TableRow,
    TableCell,
    TableCaption,
    TableColumnGroup,
    TableColumn,
    Paragraph,
    Run,
}

impl NodeType {
    /// Name used in outlines and log output
    pub fn name(self) -> &'static str {
        match self {
            NodeType::Document => "document",
            NodeType::Table => "table",
            NodeType::TableRow => "row",
            NodeType::TableCell => "cell",
            NodeType::TableCaption => "caption",
            NodeType::TableColumnGroup => "colgroup",
            NodeType::TableColumn => "col",
            NodeType::Paragraph => "paragraph",
            NodeType::Run => "run",
        }
    }

    /// Block nodes may sit directly inside a table cell
    pub fn is_block(self) -> bool {
        matches!(self, NodeType::Paragraph | NodeType::Table)
    }

    /// Whether a node of type `child` may be placed inside a node of this type.
    ///
    /// Runs are accepted directly inside cells so that pasted or imported inline
    /// content can land there; the cell-content post-fixer wraps them afterwards.
    pub fn accepts(self, child: NodeType) -> bool {
        match self {
            NodeType::Document => matches!(child, NodeType::Table | NodeType::Paragraph),
            NodeType::Table => matches!(
                child,
                NodeType::TableRow | NodeType::TableCaption | NodeType::TableColumnGroup
            ),
            NodeType::TableRow => child == NodeType::TableCell,
            NodeType::TableCell => child.is_block() || child == NodeType::Run,
            NodeType::TableCaption | NodeType::Paragraph => child == NodeType::Run,
            NodeType::TableColumnGroup => child == NodeType::TableColumn,
            NodeType::TableColumn | NodeType::Run => false,
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Common interface for all document nodes
pub trait Node: std::fmt::Debug {
    /// Get the unique ID of this node
    fn id(&self) -> NodeId;

    /// Get the type of this node
    fn node_type(&self) -> NodeType;

    /// Get the IDs of child nodes
    fn children(&self) -> &[NodeId];

    /// Get the ID of the parent node (None for the root and detached nodes)
    fn parent(&self) -> Option<NodeId>;

    /// Set the parent node ID
    fn set_parent(&mut self, parent: Option<NodeId>);

    /// Check if this node can have children
    fn can_have_children(&self) -> bool {
        true
    }

    /// Read a structural attribute. Absent attributes return `None`.
    fn attribute(&self, _key: AttributeKey) -> Option<AttributeValue> {
        None
    }

    /// Write a structural attribute. `None` removes it.
    fn set_attribute(&mut self, key: AttributeKey, _value: Option<AttributeValue>) -> Result<()> {
        Err(DocModelError::UnsupportedAttribute {
            key,
            node_type: self.node_type(),
        })
    }

    /// Get the text content of this node (if any)
    fn text_content(&self) -> Option<&str> {
        None
    }
}
