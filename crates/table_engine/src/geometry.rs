//! Grid geometry queries
//!
//! Everything here is a pure function of the tree: locations, sizes, overlap
//! queries, selection tests and cropping. Nothing is cached between calls.

use crate::common::{
    cell_context, create_empty_cell, ensure_table, spans, trim_cell_if_needed, update_numeric_attribute,
};
use crate::walker::{TableSlot, TableWalker, WalkerOptions};
use crate::{Result, TableError};
use doc_model::{AttributeKey, DocumentTree, NodeFragment, NodeId, Table, TableRow, Writer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Anchor position of a cell in the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellLocation {
    pub row: usize,
    pub column: usize,
}

/// Inclusive rectangle of grid slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropDimensions {
    pub start_row: usize,
    pub start_column: usize,
    pub end_row: usize,
    pub end_column: usize,
}

/// First and last index touched by a group of cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRange {
    pub first: usize,
    pub last: usize,
}

impl IndexRange {
    fn from_indexes(indexes: impl IntoIterator<Item = usize>) -> Option<Self> {
        let mut iter = indexes.into_iter();
        let first = iter.next()?;
        let (first, last) = iter.fold((first, first), |(lo, hi), i| (lo.min(i), hi.max(i)));
        Some(Self { first, last })
    }

    pub fn len(&self) -> usize {
        self.last - self.first + 1
    }
}

/// Anchor row and column of a cell, found by walking the cell's own row
pub fn cell_location(tree: &DocumentTree, cell: NodeId) -> Result<CellLocation> {
    let (table, row) = cell_context(tree, cell)?;
    let row_index = tree
        .row_index(row)
        .ok_or(TableError::NotATableCell(cell.as_uuid()))?;
    TableWalker::new(tree, table, WalkerOptions::new().row(row_index))
        .find(|slot| slot.cell == cell)
        .map(|slot| CellLocation {
            row: slot.row,
            column: slot.column,
        })
        .ok_or(TableError::NotATableCell(cell.as_uuid()))
}

/// Number of grid columns: the summed colspans of the first row
pub fn column_count(tree: &DocumentTree, table: NodeId) -> usize {
    tree.table_rows(table)
        .first()
        .map(|&row| {
            tree.children_of(row)
                .iter()
                .filter_map(|&cell| tree.get_table_cell(cell))
                .map(|cell| cell.colspan() as usize)
                .sum()
        })
        .unwrap_or(0)
}

/// Number of row elements. Rowspans are not taken into account, so a table
/// whose last row is fully covered from above still counts that row.
pub fn row_count(tree: &DocumentTree, table: NodeId) -> usize {
    tree.table_rows(table).len()
}

/// True when the cells exactly tile their bounding rectangle.
///
/// Compares the bounding box area, using the far edge of spanning cells, with
/// the summed cell areas. A cell listed more than once counts once. An empty
/// selection is not rectangular.
pub fn is_selection_rectangular(tree: &DocumentTree, cells: &[NodeId]) -> Result<bool> {
    if cells.is_empty() {
        return Ok(false);
    }

    let mut rows = BTreeSet::new();
    let mut columns = BTreeSet::new();
    let mut selected_area = 0;
    let mut seen = HashSet::with_capacity(cells.len());
    for &cell in cells.iter().filter(|&&cell| seen.insert(cell)) {
        let location = cell_location(tree, cell)?;
        let (colspan, rowspan) = spans(tree, cell)?;
        let (colspan, rowspan) = (colspan as usize, rowspan as usize);

        rows.insert(location.row);
        rows.insert(location.row + rowspan - 1);
        columns.insert(location.column);
        columns.insert(location.column + colspan - 1);
        selected_area += rowspan * colspan;
    }

    let area = |set: &BTreeSet<usize>| match (set.first(), set.last()) {
        (Some(first), Some(last)) => last - first + 1,
        _ => 0,
    };
    Ok(area(&rows) * area(&columns) == selected_area)
}

/// Anchors above `row` whose rowspan reaches into it, scanning from `start_row`
pub fn vertically_overlapping_cells(
    tree: &DocumentTree,
    table: NodeId,
    row: usize,
    start_row: usize,
) -> Vec<TableSlot> {
    if row == 0 {
        return Vec::new();
    }
    let options = WalkerOptions::new().start_row(start_row).end_row(row - 1);
    TableWalker::new(tree, table, options)
        .filter(|slot| slot.row < row && row <= slot.row + slot.cell_height - 1)
        .collect()
}

/// Anchors left of `column` whose colspan reaches into it
pub fn horizontally_overlapping_cells(
    tree: &DocumentTree,
    table: NodeId,
    column: usize,
) -> Vec<TableSlot> {
    TableWalker::anchors(tree, table)
        .filter(|slot| slot.column < column && column <= slot.column + slot.cell_width - 1)
        .collect()
}

/// Copy a rectangle of the table into a new detached table.
///
/// Anchors inside the rectangle are cloned and trimmed to its edges. Slots
/// covered by a cell anchored before the rectangle are backfilled with empty
/// cells. Heading counts shift by the rectangle's offset. The column group and
/// caption are not carried over.
pub fn crop_table(
    tree: &DocumentTree,
    table: NodeId,
    dimensions: CropDimensions,
) -> Result<NodeFragment> {
    ensure_table(tree, table)?;
    let CropDimensions {
        start_row,
        start_column,
        end_row,
        end_column,
    } = dimensions;
    if end_row < start_row {
        return Err(TableError::RowOutOfRange {
            operation: "crop_table",
            index: start_row,
            rows: end_row + 1,
        });
    }
    if end_column < start_column {
        return Err(TableError::ColumnOutOfRange {
            operation: "crop_table",
            index: start_column,
            columns: end_column + 1,
        });
    }

    let mut scratch = DocumentTree::new();
    let root = scratch.root_id();
    let mut writer = Writer::new(&mut scratch);
    let cropped = writer.insert(Table::new(), root, None)?;
    let mut rows = Vec::with_capacity(end_row - start_row + 1);
    for _ in start_row..=end_row {
        rows.push(writer.insert(TableRow::new(), cropped, None)?);
    }

    let options = WalkerOptions {
        start_row: Some(start_row),
        end_row: Some(end_row),
        start_column: Some(start_column),
        end_column: Some(end_column),
        include_all_slots: true,
        ..WalkerOptions::default()
    };
    for slot in TableWalker::new(tree, table, options) {
        let row = rows[slot.row - start_row];
        if slot.is_anchor() {
            let fragment = tree
                .snapshot(slot.cell)
                .ok_or(TableError::NotATableCell(slot.cell.as_uuid()))?;
            let copy = writer.insert_fragment(&fragment, row, None)?;
            trim_cell_if_needed(&mut writer, copy, slot.row, slot.column, end_row, end_column)?;
        } else if slot.cell_anchor_row < start_row || slot.cell_anchor_column < start_column {
            create_empty_cell(&mut writer, row, None, 1, 1)?;
        }
    }

    if let Some(source) = tree.get_table(table) {
        let heading_rows = (source.heading_rows() as usize).saturating_sub(start_row);
        let heading_columns = (source.heading_columns() as usize).saturating_sub(start_column);
        update_numeric_attribute(&mut writer, cropped, AttributeKey::HeadingRows, heading_rows as u32)?;
        update_numeric_attribute(&mut writer, cropped, AttributeKey::HeadingColumns, heading_columns as u32)?;
    }

    scratch
        .snapshot(cropped)
        .ok_or(TableError::NotATable(cropped.as_uuid()))
}

/// Rows the cells are anchored in
pub fn row_indexes(tree: &DocumentTree, cells: &[NodeId]) -> Result<IndexRange> {
    let mut indexes = Vec::with_capacity(cells.len());
    for &cell in cells {
        let (_, row) = cell_context(tree, cell)?;
        indexes.push(
            tree.row_index(row)
                .ok_or(TableError::NotATableCell(cell.as_uuid()))?,
        );
    }
    IndexRange::from_indexes(indexes).ok_or(TableError::EmptySelection {
        operation: "row_indexes",
    })
}

/// Columns the cells are anchored in
pub fn column_indexes(tree: &DocumentTree, cells: &[NodeId]) -> Result<IndexRange> {
    let first = cells.first().ok_or(TableError::EmptySelection {
        operation: "column_indexes",
    })?;
    let (table, _) = cell_context(tree, *first)?;
    let indexes = TableWalker::anchors(tree, table)
        .filter(|slot| cells.contains(&slot.cell))
        .map(|slot| slot.column);
    IndexRange::from_indexes(indexes).ok_or(TableError::NotATableCell(first.as_uuid()))
}

/// Whether the cell is anchored inside the heading columns
pub fn is_heading_column_cell(tree: &DocumentTree, cell: NodeId) -> Result<bool> {
    let (table, _) = cell_context(tree, cell)?;
    let heading_columns = tree.get_table(table).map_or(0, |t| t.heading_columns()) as usize;
    Ok(heading_columns > 0 && cell_location(tree, cell)?.column < heading_columns)
}

/// Extend the last row of a selection when every cell in it spans further down
pub fn adjust_last_row_index(
    tree: &DocumentTree,
    table: NodeId,
    rows: IndexRange,
    columns: IndexRange,
) -> usize {
    let options = WalkerOptions::new()
        .row(rows.last)
        .start_column(columns.first)
        .end_column(columns.last);
    let slots: Vec<TableSlot> = TableWalker::new(tree, table, options).collect();
    match slots.first() {
        Some(first) if !slots.iter().all(|slot| slot.cell_height == 1) => {
            rows.last + first.cell_height - 1
        }
        _ => rows.last,
    }
}

/// Extend the last column of a selection when every cell in it spans further right
pub fn adjust_last_column_index(
    tree: &DocumentTree,
    table: NodeId,
    rows: IndexRange,
    columns: IndexRange,
) -> usize {
    let options = WalkerOptions::new()
        .start_row(rows.first)
        .end_row(rows.last)
        .column(columns.last);
    let slots: Vec<TableSlot> = TableWalker::new(tree, table, options).collect();
    match slots.first() {
        Some(first) if !slots.iter().all(|slot| slot.cell_width == 1) => {
            columns.last + first.cell_width - 1
        }
        _ => columns.last,
    }
}
