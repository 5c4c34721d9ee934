//! Paragraph node - a block of content containing runs

use crate::{Node, NodeId, NodeType};
use serde::{Deserialize, Serialize};

/// A paragraph containing text runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paragraph {
    pub(crate) id: NodeId,
    pub(crate) parent: Option<NodeId>,
    /// IDs of child runs
    pub(crate) children: Vec<NodeId>,
}

impl Paragraph {
    /// Create a new empty paragraph
    pub fn new() -> Self {
        Self {
            id: NodeId::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// A paragraph without runs
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Default for Paragraph {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for Paragraph {
    fn id(&self) -> NodeId {
        self.id
    }

    fn node_type(&self) -> NodeType {
        NodeType::Paragraph
    }

    fn children(&self) -> &[NodeId] {
        &self.children
    }

    fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }
}
