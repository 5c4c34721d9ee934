//! Document tree storage and read-only queries
//!
//! Nodes live in typed maps keyed by [`NodeId`]; parent/child links are stored on
//! the nodes themselves. All structural mutation goes through [`crate::Writer`],
//! which keeps the links consistent and records every edit in the tree's
//! [`Differ`].

use crate::{
    Change, Differ, Document, Element, Node, NodeFragment, NodeId, NodeType, Paragraph, Run,
    Table, TableCaption, TableCell, TableColumn, TableColumnGroup, TableRow,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Storage for different node types
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeStorage {
    pub tables: HashMap<NodeId, Table>,
    pub table_rows: HashMap<NodeId, TableRow>,
    pub table_cells: HashMap<NodeId, TableCell>,
    pub captions: HashMap<NodeId, TableCaption>,
    pub column_groups: HashMap<NodeId, TableColumnGroup>,
    pub columns: HashMap<NodeId, TableColumn>,
    pub paragraphs: HashMap<NodeId, Paragraph>,
    pub runs: HashMap<NodeId, Run>,
}

/// The complete document tree structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentTree {
    /// The root document
    pub document: Document,
    /// Storage for all nodes
    pub nodes: NodeStorage,
    /// Changes of the edit batch in progress
    #[serde(skip)]
    differ: Differ,
}

impl DocumentTree {
    /// Create a new empty document tree
    pub fn new() -> Self {
        Self {
            document: Document::new(),
            nodes: NodeStorage::default(),
            differ: Differ::new(),
        }
    }

    pub fn root_id(&self) -> NodeId {
        self.document.id()
    }

    // =========================================================================
    // Typed Access
    // =========================================================================

    pub fn get_table(&self, id: NodeId) -> Option<&Table> {
        self.nodes.tables.get(&id)
    }

    pub fn get_table_row(&self, id: NodeId) -> Option<&TableRow> {
        self.nodes.table_rows.get(&id)
    }

    pub fn get_table_cell(&self, id: NodeId) -> Option<&TableCell> {
        self.nodes.table_cells.get(&id)
    }

    pub fn get_caption(&self, id: NodeId) -> Option<&TableCaption> {
        self.nodes.captions.get(&id)
    }

    pub fn get_column_group(&self, id: NodeId) -> Option<&TableColumnGroup> {
        self.nodes.column_groups.get(&id)
    }

    pub fn get_column(&self, id: NodeId) -> Option<&TableColumn> {
        self.nodes.columns.get(&id)
    }

    pub fn get_paragraph(&self, id: NodeId) -> Option<&Paragraph> {
        self.nodes.paragraphs.get(&id)
    }

    pub fn get_run(&self, id: NodeId) -> Option<&Run> {
        self.nodes.runs.get(&id)
    }

    /// Get the type of a node
    pub fn node_type(&self, id: NodeId) -> Option<NodeType> {
        self.node(id).map(|node| node.node_type())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Look up any node by id
    pub fn node(&self, id: NodeId) -> Option<&dyn Node> {
        if id == self.document.id() {
            return Some(&self.document);
        }
        let nodes = &self.nodes;
        if let Some(n) = nodes.table_cells.get(&id) {
            return Some(n);
        }
        if let Some(n) = nodes.paragraphs.get(&id) {
            return Some(n);
        }
        if let Some(n) = nodes.runs.get(&id) {
            return Some(n);
        }
        if let Some(n) = nodes.table_rows.get(&id) {
            return Some(n);
        }
        if let Some(n) = nodes.tables.get(&id) {
            return Some(n);
        }
        if let Some(n) = nodes.columns.get(&id) {
            return Some(n);
        }
        if let Some(n) = nodes.column_groups.get(&id) {
            return Some(n);
        }
        nodes.captions.get(&id).map(|n| n as &dyn Node)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut dyn Node> {
        if id == self.document.id() {
            return Some(&mut self.document);
        }
        let nodes = &mut self.nodes;
        if let Some(n) = nodes.table_cells.get_mut(&id) {
            return Some(n);
        }
        if let Some(n) = nodes.paragraphs.get_mut(&id) {
            return Some(n);
        }
        if let Some(n) = nodes.runs.get_mut(&id) {
            return Some(n);
        }
        if let Some(n) = nodes.table_rows.get_mut(&id) {
            return Some(n);
        }
        if let Some(n) = nodes.tables.get_mut(&id) {
            return Some(n);
        }
        if let Some(n) = nodes.columns.get_mut(&id) {
            return Some(n);
        }
        if let Some(n) = nodes.column_groups.get_mut(&id) {
            return Some(n);
        }
        nodes.captions.get_mut(&id).map(|n| n as &mut dyn Node)
    }

    /// Child list of a container node; `None` for leaves and unknown ids
    pub(crate) fn children_mut(&mut self, id: NodeId) -> Option<&mut Vec<NodeId>> {
        if id == self.document.id() {
            return Some(&mut self.document.body_children);
        }
        let nodes = &mut self.nodes;
        if let Some(n) = nodes.table_cells.get_mut(&id) {
            return Some(&mut n.children);
        }
        if let Some(n) = nodes.paragraphs.get_mut(&id) {
            return Some(&mut n.children);
        }
        if let Some(n) = nodes.table_rows.get_mut(&id) {
            return Some(&mut n.children);
        }
        if let Some(n) = nodes.tables.get_mut(&id) {
            return Some(&mut n.children);
        }
        if let Some(n) = nodes.column_groups.get_mut(&id) {
            return Some(&mut n.children);
        }
        nodes.captions.get_mut(&id).map(|n| &mut n.children)
    }

    /// Owned copy of a node as stored, links included
    pub(crate) fn element(&self, id: NodeId) -> Option<Element> {
        let nodes = &self.nodes;
        if let Some(n) = nodes.table_cells.get(&id) {
            return Some(n.clone().into());
        }
        if let Some(n) = nodes.paragraphs.get(&id) {
            return Some(n.clone().into());
        }
        if let Some(n) = nodes.runs.get(&id) {
            return Some(n.clone().into());
        }
        if let Some(n) = nodes.table_rows.get(&id) {
            return Some(n.clone().into());
        }
        if let Some(n) = nodes.tables.get(&id) {
            return Some(n.clone().into());
        }
        if let Some(n) = nodes.columns.get(&id) {
            return Some(n.clone().into());
        }
        if let Some(n) = nodes.column_groups.get(&id) {
            return Some(n.clone().into());
        }
        nodes.captions.get(&id).map(|n| n.clone().into())
    }

    pub(crate) fn store(&mut self, element: Element) {
        let nodes = &mut self.nodes;
        match element {
            Element::Table(n) => {
                nodes.tables.insert(n.id, n);
            }
            Element::TableRow(n) => {
                nodes.table_rows.insert(n.id, n);
            }
            Element::TableCell(n) => {
                nodes.table_cells.insert(n.id, n);
            }
            Element::TableCaption(n) => {
                nodes.captions.insert(n.id, n);
            }
            Element::TableColumnGroup(n) => {
                nodes.column_groups.insert(n.id, n);
            }
            Element::TableColumn(n) => {
                nodes.columns.insert(n.id, n);
            }
            Element::Paragraph(n) => {
                nodes.paragraphs.insert(n.id, n);
            }
            Element::Run(n) => {
                nodes.runs.insert(n.id, n);
            }
        }
    }

    /// Drop a node and all of its descendants from storage
    pub(crate) fn purge(&mut self, id: NodeId) {
        for child in self.children_of(id).to_vec() {
            self.purge(child);
        }
        let nodes = &mut self.nodes;
        let removed = nodes.table_cells.remove(&id).is_some()
            || nodes.paragraphs.remove(&id).is_some()
            || nodes.runs.remove(&id).is_some()
            || nodes.table_rows.remove(&id).is_some()
            || nodes.tables.remove(&id).is_some()
            || nodes.columns.remove(&id).is_some()
            || nodes.column_groups.remove(&id).is_some();
        if !removed {
            nodes.captions.remove(&id);
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.parent())
    }

    /// Child ids of a node; empty for leaves and unknown ids
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|node| node.children()).unwrap_or(&[])
    }

    /// Position of a node among its parent's children
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent_of(id)?;
        self.children_of(parent).iter().position(|&child| child == id)
    }

    /// Nearest proper ancestor of the given type
    pub fn find_ancestor(&self, id: NodeId, node_type: NodeType) -> Option<NodeId> {
        let mut current = self.parent_of(id);
        while let Some(candidate) = current {
            if self.node_type(candidate) == Some(node_type) {
                return Some(candidate);
            }
            current = self.parent_of(candidate);
        }
        None
    }

    /// Whether `ancestor` is `id` itself or one of its ancestors
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(candidate) = current {
            if candidate == ancestor {
                return true;
            }
            current = self.parent_of(candidate);
        }
        false
    }

    /// All descendants of a node in document order, excluding the node itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.children_of(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            result.push(next);
            stack.extend(self.children_of(next).iter().rev().copied());
        }
        result
    }

    // =========================================================================
    // Table Queries
    // =========================================================================

    /// Every table in the document in document order, nested tables included
    pub fn tables(&self) -> Vec<NodeId> {
        self.descendants(self.root_id())
            .into_iter()
            .filter(|id| self.nodes.tables.contains_key(id))
            .collect()
    }

    /// Row children of a table, skipping caption and column group
    pub fn table_rows(&self, table: NodeId) -> Vec<NodeId> {
        self.children_of(table)
            .iter()
            .copied()
            .filter(|id| self.nodes.table_rows.contains_key(id))
            .collect()
    }

    /// Row index of a row within its table
    pub fn row_index(&self, row: NodeId) -> Option<usize> {
        let table = self.parent_of(row)?;
        self.table_rows(table).iter().position(|&id| id == row)
    }

    pub fn table_caption(&self, table: NodeId) -> Option<NodeId> {
        self.children_of(table)
            .iter()
            .copied()
            .find(|id| self.nodes.captions.contains_key(id))
    }

    pub fn table_column_group(&self, table: NodeId) -> Option<NodeId> {
        self.children_of(table)
            .iter()
            .copied()
            .find(|id| self.nodes.column_groups.contains_key(id))
    }

    /// Text of a cell: run text per paragraph, paragraphs joined by newlines
    pub fn cell_text(&self, cell: NodeId) -> String {
        self.snapshot(cell).map(|fragment| fragment.text()).unwrap_or_default()
    }

    /// A cell whose only content is one empty paragraph
    pub fn is_empty_cell(&self, cell: NodeId) -> bool {
        match self.children_of(cell) {
            [only] => self.get_paragraph(*only).map_or(false, |p| p.is_empty()),
            _ => false,
        }
    }

    // =========================================================================
    // Snapshots and Outlines
    // =========================================================================

    /// Deep copy of a subtree. Ids are kept; inserting the fragment re-assigns them.
    pub fn snapshot(&self, id: NodeId) -> Option<NodeFragment> {
        let element = self.element(id)?;
        let mut fragment = NodeFragment::new(element);
        for &child in self.children_of(id) {
            if let Some(child_fragment) = self.snapshot(child) {
                fragment.push(child_fragment);
            }
        }
        Some(fragment)
    }

    /// Compact textual rendering of a subtree (see [`NodeFragment::outline`])
    pub fn outline(&self, id: NodeId) -> String {
        if id == self.root_id() {
            let children: Vec<String> = self
                .children_of(id)
                .iter()
                .map(|&child| self.outline(child))
                .collect();
            return format!("document[{}]", children.join(", "));
        }
        self.snapshot(id).map(|fragment| fragment.outline()).unwrap_or_default()
    }

    // =========================================================================
    // Change Tracking
    // =========================================================================

    /// Changes recorded since the last reset
    pub fn differ(&self) -> &Differ {
        &self.differ
    }

    pub(crate) fn differ_mut(&mut self) -> &mut Differ {
        &mut self.differ
    }

    /// Hand out the recorded changes and start a fresh batch
    pub fn take_changes(&mut self) -> Vec<Change> {
        self.differ.take()
    }

    pub fn reset_differ(&mut self) {
        self.differ.reset();
    }
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CellSpec, TableBuilder, Writer};

    fn tree_with_table() -> (DocumentTree, NodeId) {
        let mut tree = DocumentTree::new();
        let root = tree.root_id();
        let fragment = TableBuilder::new(vec![
            vec![CellSpec::new("a"), CellSpec::new("b")],
            vec![CellSpec::new("c"), CellSpec::new("")],
        ])
        .caption("cap")
        .build();
        let table = Writer::new(&mut tree).insert_fragment(&fragment, root, None).unwrap();
        (tree, table)
    }

    #[test]
    fn test_table_queries() {
        let (tree, table) = tree_with_table();
        let rows = tree.table_rows(table);
        assert_eq!(rows.len(), 2);
        assert_eq!(tree.row_index(rows[1]), Some(1));
        assert!(tree.table_caption(table).is_some());
        assert!(tree.table_column_group(table).is_none());
        assert_eq!(tree.tables(), vec![table]);

        let cell = tree.children_of(rows[0])[1];
        assert_eq!(tree.find_ancestor(cell, NodeType::Table), Some(table));
        assert_eq!(tree.find_ancestor(cell, NodeType::TableCell), None);
        assert_eq!(tree.cell_text(cell), "b");
        assert!(!tree.is_empty_cell(cell));
        assert!(tree.is_empty_cell(tree.children_of(rows[1])[1]));
    }

    #[test]
    fn test_outline_of_document() {
        let (tree, _) = tree_with_table();
        assert_eq!(
            tree.outline(tree.root_id()),
            r#"document[table[row[cell["a"], cell["b"]], row[cell["c"], cell[""]], caption["cap"]]]"#
        );
    }

    #[test]
    fn test_snapshot_keeps_ids() {
        let (tree, table) = tree_with_table();
        let snapshot = tree.snapshot(table).unwrap();
        assert_eq!(snapshot.id(), table);
        assert_eq!(snapshot.children.len(), 3);
        assert_eq!(snapshot.outline(), tree.outline(table));
    }

    #[test]
    fn test_descendants_are_in_document_order() {
        let (tree, table) = tree_with_table();
        let rows = tree.table_rows(table);
        let descendants = tree.descendants(table);
        assert_eq!(descendants[0], rows[0]);
        assert_eq!(descendants[1], tree.children_of(rows[0])[0]);
    }

    #[test]
    fn test_tree_serializes_without_change_log() {
        let (tree, _) = tree_with_table();
        assert!(!tree.differ().is_empty());
        let json = serde_json::to_string(&tree).unwrap();
        let back: DocumentTree = serde_json::from_str(&json).unwrap();
        assert!(back.differ().is_empty());
        assert_eq!(back.outline(back.root_id()), tree.outline(tree.root_id()));
    }
}
