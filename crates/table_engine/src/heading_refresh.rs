//! Heading re-render tracking
//!
//! A cell renders as a heading cell when it starts inside the heading rows or
//! heading columns; a row renders in the table head when it sits above the
//! heading boundary. Moving a boundary or moving cells across one changes how
//! existing nodes render, which a view has to redo. [`HeadingRefresher`]
//! remembers the last kind of every row and cell and reports the ones that
//! changed after a batch. It never edits the tree.

use crate::post_fixers::touched_tables;
use crate::walker::TableWalker;
use doc_model::{Change, DocumentTree, NodeId, NodeType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// How a row or cell renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    HeadingCell,
    DataCell,
    HeadRow,
    BodyRow,
}

/// A node whose rendering kind changed in the last batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconversion {
    pub node: NodeId,
    pub node_type: NodeType,
    pub previous: ElementKind,
    pub current: ElementKind,
}

#[derive(Debug, Clone, Default)]
pub struct HeadingRefresher {
    kinds: HashMap<NodeId, ElementKind>,
}

impl HeadingRefresher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current kind of every row and cell in the document
    pub fn prime(&mut self, tree: &DocumentTree) {
        self.kinds.clear();
        for table in tree.tables() {
            self.kinds.extend(Self::kinds_of(tree, table));
        }
    }

    /// Kind remembered for `node`, if it was seen
    pub fn kind(&self, node: NodeId) -> Option<ElementKind> {
        self.kinds.get(&node).copied()
    }

    /// Re-derive kinds in the tables touched by `changes` and report the nodes
    /// that were known before and now render differently. Newly inserted nodes
    /// are remembered but not reported.
    pub fn refresh(&mut self, tree: &DocumentTree, changes: &[Change]) -> Vec<Reconversion> {
        self.kinds.retain(|&id, _| tree.contains(id));

        let mut reconversions = Vec::new();
        for table in touched_tables(tree, changes) {
            for (node, current) in Self::kinds_of(tree, table) {
                let previous = self.kinds.insert(node, current);
                let Some(previous) = previous.filter(|&previous| previous != current) else {
                    continue;
                };
                let Some(node_type) = tree.node_type(node) else {
                    continue;
                };
                reconversions.push(Reconversion {
                    node,
                    node_type,
                    previous,
                    current,
                });
            }
        }
        if !reconversions.is_empty() {
            debug!(count = reconversions.len(), "Heading layout changed");
        }
        reconversions
    }

    fn kinds_of(tree: &DocumentTree, table: NodeId) -> Vec<(NodeId, ElementKind)> {
        let (heading_rows, heading_columns) = tree
            .get_table(table)
            .map_or((0, 0), |t| (t.heading_rows() as usize, t.heading_columns() as usize));

        let mut kinds: Vec<(NodeId, ElementKind)> = tree
            .table_rows(table)
            .into_iter()
            .enumerate()
            .map(|(index, row)| {
                let kind = if index < heading_rows {
                    ElementKind::HeadRow
                } else {
                    ElementKind::BodyRow
                };
                (row, kind)
            })
            .collect();

        kinds.extend(TableWalker::anchors(tree, table).map(|slot| {
            let kind = if slot.row < heading_rows || slot.column < heading_columns {
                ElementKind::HeadingCell
            } else {
                ElementKind::DataCell
            };
            (slot.cell, kind)
        }));
        kinds
    }
}
