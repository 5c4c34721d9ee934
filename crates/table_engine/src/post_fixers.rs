//! Structural post-fixers
//!
//! After an edit batch the editor runs every registered [`PostFixer`] over the
//! tables the batch touched, and keeps rerunning the whole set until none of
//! them reports a repair. A fixer that keeps reporting repairs is a bug; the
//! loop is capped and fails with [`TableError::PostFixersDidNotSettle`].

use crate::column_widths::{column_entries, column_widths, normalize_column_widths, set_column_widths};
use crate::common::{create_empty_cell, update_numeric_attribute};
use crate::config::TableConfig;
use crate::geometry::{column_count, row_count};
use crate::walker::{TableSlot, TableWalker};
use crate::{Result, TableError};
use doc_model::{AttributeKey, Change, ColumnWidth, DocumentTree, NodeId, NodeType, Paragraph, Writer};
use std::fmt::Debug;
use tracing::{debug, error, trace};

/// A repair pass over the tables touched by the current batch
pub trait PostFixer: Debug {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Repair what is broken; `true` if anything was written
    fn fix(&self, writer: &mut Writer<'_>) -> Result<bool>;
}

/// The built-in fixers, in the order they run
pub fn default_post_fixers(config: &TableConfig) -> Vec<Box<dyn PostFixer>> {
    vec![
        Box::new(RowspanFixer),
        Box::new(RowLengthFixer),
        Box::new(CellContentFixer),
        Box::new(CaptionFixer),
        Box::new(ColumnWidthFixer {
            min_percent: config.min_column_width_percent,
        }),
    ]
}

/// Run `fixers` until a full pass changes nothing. Returns the number of
/// passes made, the last one being the clean pass.
pub fn run_post_fixers(writer: &mut Writer<'_>, fixers: &[Box<dyn PostFixer>], limit: usize) -> Result<usize> {
    for iteration in 1..=limit {
        let mut fixed = false;
        for fixer in fixers {
            if fixer.fix(writer)? {
                debug!(
                    target: "table_engine::post_fixer",
                    fixer = fixer.name(),
                    iteration,
                    "Post-fixer repaired the model"
                );
                fixed = true;
            }
        }
        trace!(target: "table_engine::post_fixer", iteration, fixed, "Post-fixer pass finished");
        if !fixed {
            return Ok(iteration);
        }
    }
    error!(
        target: "table_engine::post_fixer",
        limit,
        "Post-fixers kept repairing the model"
    );
    Err(TableError::PostFixersDidNotSettle { iterations: limit })
}

/// Tables affected by the changes recorded so far, in first-touched order
pub fn changed_tables(writer: &Writer<'_>) -> Vec<NodeId> {
    touched_tables(writer.tree(), writer.changes())
}

/// Live tables touched by `changes`; an edit inside a cell touches its table
pub fn touched_tables(tree: &DocumentTree, changes: &[Change]) -> Vec<NodeId> {
    let mut tables = Vec::new();
    for change in changes {
        let anchor = match change {
            Change::Insert {
                node,
                node_type: NodeType::Table,
                ..
            } => *node,
            Change::Insert { parent, .. } | Change::Remove { parent, .. } => *parent,
            Change::Attribute { node, .. } => *node,
        };
        if let Some(table) = table_of(tree, anchor) {
            if !tables.contains(&table) {
                tables.push(table);
            }
        }
    }
    tables
}

fn table_of(tree: &DocumentTree, id: NodeId) -> Option<NodeId> {
    match tree.node_type(id)? {
        NodeType::Table => Some(id),
        NodeType::Document => None,
        _ => tree.find_ancestor(id, NodeType::Table),
    }
}

fn cells_of(tree: &DocumentTree, table: NodeId) -> Vec<NodeId> {
    tree.table_rows(table)
        .into_iter()
        .flat_map(|row| tree.children_of(row).to_vec())
        .filter(|&id| tree.node_type(id) == Some(NodeType::TableCell))
        .collect()
}

// =============================================================================
// Rowspan
// =============================================================================

/// Clips rowspans that cross the heading boundary or run past the last row
#[derive(Debug, Clone, Copy, Default)]
pub struct RowspanFixer;

impl PostFixer for RowspanFixer {
    fn name(&self) -> &'static str {
        "rowspan"
    }

    fn fix(&self, writer: &mut Writer<'_>) -> Result<bool> {
        let mut fixed = false;
        for table in changed_tables(writer) {
            let tree = writer.tree();
            let heading_rows = tree.get_table(table).map_or(0, |t| t.heading_rows()) as usize;
            let rows = row_count(tree, table);
            let slots: Vec<TableSlot> = TableWalker::anchors(tree, table).collect();

            for slot in slots {
                let limit = if slot.row < heading_rows { heading_rows.min(rows) } else { rows };
                if slot.row + slot.cell_height > limit {
                    let rowspan = limit.saturating_sub(slot.row).max(1);
                    debug!(
                        target: "table_engine::post_fixer",
                        table = %table,
                        row = slot.row,
                        column = slot.column,
                        from = slot.cell_height,
                        to = rowspan,
                        "Clipping rowspan"
                    );
                    update_numeric_attribute(writer, slot.cell, AttributeKey::Rowspan, rowspan as u32)?;
                    fixed = true;
                }
            }
        }
        Ok(fixed)
    }
}

// =============================================================================
// Row length
// =============================================================================

/// Removes rows that occupy no slot and pads short rows with empty cells
#[derive(Debug, Clone, Copy, Default)]
pub struct RowLengthFixer;

impl RowLengthFixer {
    /// Occupied slots per row, counting cells reaching down from rows above
    fn row_lengths(tree: &DocumentTree, table: NodeId) -> Vec<usize> {
        let rows = row_count(tree, table);
        let mut lengths = vec![0; rows];
        for slot in TableWalker::anchors(tree, table) {
            let last = (slot.row + slot.cell_height).min(rows);
            for length in &mut lengths[slot.row..last] {
                *length += slot.cell_width;
            }
        }
        lengths
    }
}

impl PostFixer for RowLengthFixer {
    fn name(&self) -> &'static str {
        "row-length"
    }

    fn fix(&self, writer: &mut Writer<'_>) -> Result<bool> {
        let mut fixed = false;
        for table in changed_tables(writer) {
            let mut rows = writer.tree().table_rows(table);
            let mut lengths = Self::row_lengths(writer.tree(), table);

            for index in (0..rows.len()).rev() {
                if lengths.get(index) == Some(&0) {
                    debug!(target: "table_engine::post_fixer", table = %table, row = index, "Removing empty row");
                    writer.remove(rows[index])?;
                    rows.remove(index);
                    lengths.remove(index);
                    fixed = true;
                }
            }

            let widest = lengths.iter().copied().max().unwrap_or(0);
            for (&row, &length) in rows.iter().zip(&lengths) {
                if length < widest {
                    debug!(
                        target: "table_engine::post_fixer",
                        table = %table,
                        row = %row,
                        missing = widest - length,
                        "Padding short row"
                    );
                    for _ in length..widest {
                        create_empty_cell(writer, row, None, 1, 1)?;
                    }
                    fixed = true;
                }
            }
        }
        Ok(fixed)
    }
}

// =============================================================================
// Cell content
// =============================================================================

/// Gives empty cells a paragraph and wraps loose runs in paragraphs
#[derive(Debug, Clone, Copy, Default)]
pub struct CellContentFixer;

impl PostFixer for CellContentFixer {
    fn name(&self) -> &'static str {
        "cell-content"
    }

    fn fix(&self, writer: &mut Writer<'_>) -> Result<bool> {
        let mut fixed = false;
        for table in changed_tables(writer) {
            for cell in cells_of(writer.tree(), table) {
                let children = writer.tree().children_of(cell).to_vec();
                if children.is_empty() {
                    writer.insert(Paragraph::new(), cell, None)?;
                    fixed = true;
                    continue;
                }

                // Consecutive runs share one wrapping paragraph
                let mut wrapper: Option<NodeId> = None;
                for child in children {
                    if writer.tree().node_type(child) != Some(NodeType::Run) {
                        wrapper = None;
                        continue;
                    }
                    match wrapper {
                        Some(paragraph) => writer.move_node(child, paragraph, None)?,
                        None => wrapper = Some(writer.wrap(child, Paragraph::new())?),
                    }
                    fixed = true;
                }
            }
        }
        Ok(fixed)
    }
}

// =============================================================================
// Caption
// =============================================================================

/// Keeps at most one caption per table, placed after everything else
#[derive(Debug, Clone, Copy, Default)]
pub struct CaptionFixer;

impl PostFixer for CaptionFixer {
    fn name(&self) -> &'static str {
        "caption"
    }

    fn fix(&self, writer: &mut Writer<'_>) -> Result<bool> {
        let mut fixed = false;
        for table in changed_tables(writer) {
            let children = writer.tree().children_of(table).to_vec();
            let mut captions = children
                .iter()
                .copied()
                .filter(|&id| writer.tree().node_type(id) == Some(NodeType::TableCaption));
            let Some(first) = captions.next() else {
                continue;
            };
            let extra: Vec<NodeId> = captions.collect();

            for caption in extra {
                writer.move_children(caption, first)?;
                writer.remove(caption)?;
                fixed = true;
            }
            if writer.tree().children_of(table).last() != Some(&first) {
                writer.move_node(first, table, None)?;
                fixed = true;
            }
        }
        Ok(fixed)
    }
}

// =============================================================================
// Column widths
// =============================================================================

/// Keeps one normalized column group entry per grid column
#[derive(Debug, Clone, Copy)]
pub struct ColumnWidthFixer {
    pub min_percent: f64,
}

impl Default for ColumnWidthFixer {
    fn default() -> Self {
        Self {
            min_percent: TableConfig::default().min_column_width_percent,
        }
    }
}

impl ColumnWidthFixer {
    /// Bring `widths` to `columns` entries. Surplus trailing percentages are
    /// added to the last kept entry.
    fn fit_to_columns(mut widths: Vec<ColumnWidth>, columns: usize) -> Vec<ColumnWidth> {
        if widths.len() <= columns {
            widths.resize(columns, ColumnWidth::Auto);
            return widths;
        }
        let surplus: f64 = widths.drain(columns..).filter_map(|w| w.percent()).sum();
        if let Some(ColumnWidth::Percent(last)) = widths.last_mut() {
            *last += surplus;
        }
        widths
    }
}

impl PostFixer for ColumnWidthFixer {
    fn name(&self) -> &'static str {
        "column-width"
    }

    fn fix(&self, writer: &mut Writer<'_>) -> Result<bool> {
        let mut fixed = false;
        for table in changed_tables(writer) {
            let Some(current) = column_widths(writer.tree(), table) else {
                continue;
            };
            let columns = column_count(writer.tree(), table);
            if columns == 0 {
                continue;
            }

            let fitted = Self::fit_to_columns(current.clone(), columns);
            let normalized: Vec<ColumnWidth> = normalize_column_widths(&fitted, self.min_percent)
                .into_iter()
                .map(ColumnWidth::Percent)
                .collect();
            if normalized != current {
                debug!(
                    target: "table_engine::post_fixer",
                    table = %table,
                    entries = column_entries(writer.tree(), table).map_or(0, |e| e.len()),
                    columns,
                    "Normalizing column widths"
                );
                set_column_widths(writer, table, &normalized)?;
                fixed = true;
            }
        }
        Ok(fixed)
    }
}
