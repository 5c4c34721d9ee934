//! Document root node

use crate::{Node, NodeId, NodeType};
use serde::{Deserialize, Serialize};

/// The root document node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    id: NodeId,
    /// IDs of top-level body children (paragraphs, tables)
    pub(crate) body_children: Vec<NodeId>,
    /// Version counter, bumped on every committed edit batch
    version: u64,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self {
            id: NodeId::new(),
            body_children: Vec::new(),
            version: 0,
        }
    }

    /// Get the document version
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Increment version after a change
    pub fn increment_version(&mut self) {
        self.version += 1;
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for Document {
    fn id(&self) -> NodeId {
        self.id
    }

    fn node_type(&self) -> NodeType {
        NodeType::Document
    }

    fn children(&self) -> &[NodeId] {
        &self.body_children
    }

    fn parent(&self) -> Option<NodeId> {
        None // Document is the root
    }

    fn set_parent(&mut self, _parent: Option<NodeId>) {
        // Document cannot have a parent
    }
}
