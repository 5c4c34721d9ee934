//! Text run node - a contiguous span of text

use crate::{Node, NodeId, NodeType};
use serde::{Deserialize, Serialize};

/// A text run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub(crate) id: NodeId,
    pub(crate) parent: Option<NodeId>,
    /// The text content of this run
    pub text: String,
}

impl Run {
    /// Create a new run with text content
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            parent: None,
            text: text.into(),
        }
    }

    /// Get the length of the text in this run (in UTF-8 bytes)
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Check if this run is empty
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl Node for Run {
    fn id(&self) -> NodeId {
        self.id
    }

    fn node_type(&self) -> NodeType {
        NodeType::Run
    }

    fn children(&self) -> &[NodeId] {
        // Runs have no children
        &[]
    }

    fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    fn can_have_children(&self) -> bool {
        false
    }

    fn text_content(&self) -> Option<&str> {
        Some(&self.text)
    }
}
