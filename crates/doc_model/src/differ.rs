//! Change-set recording for edit batches
//!
//! Every primitive edit made through a [`crate::Writer`] appends one [`Change`]
//! to the tree's [`Differ`]. Consumers (post-fixers, view refresh) read the
//! ordered list for the current batch instead of rescanning the document.

use crate::{AttributeKey, AttributeValue, NodeId, NodeType};
use serde::{Deserialize, Serialize};

/// One recorded primitive edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Change {
    /// `node` was inserted into `parent` at child index `index`
    Insert {
        node: NodeId,
        node_type: NodeType,
        parent: NodeId,
        index: usize,
    },
    /// `node` was removed from `parent`, where it sat at child index `index`
    Remove {
        node: NodeId,
        node_type: NodeType,
        parent: NodeId,
        index: usize,
    },
    /// An attribute of `node` changed from `old` to `new`
    Attribute {
        node: NodeId,
        node_type: NodeType,
        key: AttributeKey,
        old: Option<AttributeValue>,
        new: Option<AttributeValue>,
    },
}

impl Change {
    /// The node the change is about
    pub fn node(&self) -> NodeId {
        match self {
            Change::Insert { node, .. } | Change::Remove { node, .. } | Change::Attribute { node, .. } => *node,
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            Change::Insert { node_type, .. }
            | Change::Remove { node_type, .. }
            | Change::Attribute { node_type, .. } => *node_type,
        }
    }

    /// Parent at the time of an insert or remove
    pub fn parent(&self) -> Option<NodeId> {
        match self {
            Change::Insert { parent, .. } | Change::Remove { parent, .. } => Some(*parent),
            Change::Attribute { .. } => None,
        }
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Change::Insert { .. })
    }

    pub fn is_remove(&self) -> bool {
        matches!(self, Change::Remove { .. })
    }
}

/// Ordered change log of the current edit batch
#[derive(Debug, Clone, Default)]
pub struct Differ {
    changes: Vec<Change>,
}

impl Differ {
    pub fn new() -> Self {
        Self::default()
    }

    /// Changes recorded so far, oldest first
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Forget all recorded changes
    pub fn reset(&mut self) {
        self.changes.clear();
    }

    pub(crate) fn record(&mut self, change: Change) {
        self.changes.push(change);
    }

    pub(crate) fn take(&mut self) -> Vec<Change> {
        std::mem::take(&mut self.changes)
    }
}
