//! Table creation and row/column insertion and removal
//!
//! Every operation snapshots the walker output it needs, then issues writer
//! calls. Anything left ragged is repaired by the post-fixers.

use crate::column_widths::{insert_auto_columns, remove_column_entry};
use crate::common::{
    create_cells, create_empty_cell, create_empty_rows, ensure_table, row_child_index,
    update_numeric_attribute,
};
use crate::geometry::{column_count, row_count};
use crate::walker::{TableSlot, TableWalker, WalkerOptions};
use crate::{Result, TableError};
use doc_model::{AttributeKey, NodeId, TableBuilder, TableRow, Writer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Shape of a new table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableOptions {
    pub rows: usize,
    pub columns: usize,
    #[serde(default)]
    pub heading_rows: usize,
    #[serde(default)]
    pub heading_columns: usize,
}

impl TableOptions {
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            heading_rows: 0,
            heading_columns: 0,
        }
    }

    pub fn with_headings(mut self, heading_rows: usize, heading_columns: usize) -> Self {
        self.heading_rows = heading_rows;
        self.heading_columns = heading_columns;
        self
    }
}

// =============================================================================
// Creation
// =============================================================================

/// Insert a table of empty cells under `parent`. Heading counts are clamped to
/// the table size.
pub fn create_table(
    writer: &mut Writer<'_>,
    parent: NodeId,
    index: Option<usize>,
    options: TableOptions,
) -> Result<NodeId> {
    if options.rows == 0 {
        return Err(TableError::InvalidCount {
            operation: "create_table",
            count: options.rows,
        });
    }
    if options.columns == 0 {
        return Err(TableError::InvalidCount {
            operation: "create_table",
            count: options.columns,
        });
    }

    let fragment = TableBuilder::empty(options.rows, options.columns)
        .heading_rows(options.heading_rows.min(options.rows) as u32)
        .heading_columns(options.heading_columns.min(options.columns) as u32)
        .build();
    let table = writer.insert_fragment(&fragment, parent, index)?;
    debug!(table = %table, rows = options.rows, columns = options.columns, "Created table");
    Ok(table)
}

// =============================================================================
// Rows
// =============================================================================

/// Insert `rows` rows before grid row `at`.
///
/// Cells spanning across the insertion point grow instead of receiving new
/// cells. With `copy_structure_from_above` set, new cells mirror the colspans
/// of the row above (`Some(true)`) or of the row at `at` (`Some(false)`).
pub fn insert_rows(
    writer: &mut Writer<'_>,
    table: NodeId,
    at: usize,
    rows: usize,
    copy_structure_from_above: Option<bool>,
) -> Result<()> {
    ensure_table(writer.tree(), table)?;
    let total_rows = row_count(writer.tree(), table);
    let columns = column_count(writer.tree(), table);
    if at > total_rows {
        return Err(TableError::RowOutOfRange {
            operation: "insert_rows",
            index: at,
            rows: total_rows,
        });
    }
    if rows == 0 {
        return Err(TableError::InvalidCount {
            operation: "insert_rows",
            count: rows,
        });
    }
    debug!(table = %table, at, rows, "Inserting rows");

    let heading_rows = heading_rows(writer, table);
    if heading_rows > at {
        update_numeric_attribute(writer, table, AttributeKey::HeadingRows, (heading_rows + rows) as u32)?;
    }

    let copy_structure = copy_structure_from_above.is_some();
    if !copy_structure && (at == 0 || at == total_rows) {
        return create_empty_rows(writer, table, at, rows, columns, 1);
    }

    // None: no row to copy from (copying from above at the top edge)
    let copy_from = match copy_structure_from_above {
        Some(true) => at.checked_sub(1),
        _ => Some(at),
    };
    let end_row = match copy_from {
        Some(copy_from) if copy_structure => at.max(copy_from),
        _ => at,
    };

    // Positive: a new cell with that colspan starts here. Negative: the
    // column is covered by a cell growing over the new rows.
    let mut col_spans: Vec<isize> = vec![1; columns];
    let slots: Vec<TableSlot> =
        TableWalker::new(writer.tree(), table, WalkerOptions::new().end_row(end_row)).collect();
    for slot in slots {
        let last_row = slot.row + slot.cell_height - 1;
        let overlaps_inserted = slot.row < at && at <= last_row;
        let is_reference = copy_from.map_or(false, |from| slot.row <= from && from <= last_row);

        if overlaps_inserted {
            writer.set_attribute(slot.cell, AttributeKey::Rowspan, (slot.cell_height + rows) as u32)?;
            if let Some(span) = col_spans.get_mut(slot.column) {
                *span = -(slot.cell_width as isize);
            }
        } else if copy_structure && is_reference {
            if let Some(span) = col_spans.get_mut(slot.column) {
                *span = slot.cell_width as isize;
            }
        }
    }

    let index = row_child_index(writer.tree(), table, at);
    for _ in 0..rows {
        let row = writer.insert(TableRow::new(), table, Some(index))?;
        let mut column = 0;
        while column < col_spans.len() {
            let span = col_spans[column];
            if span > 0 {
                create_empty_cell(writer, row, None, span as u32, 1)?;
            }
            column += span.unsigned_abs().max(1);
        }
    }
    Ok(())
}

/// Remove `rows` rows starting at grid row `at`.
///
/// Cells anchored in the removed band that reach below it move to the first
/// row after the band. Cells reaching into the band from above are shortened.
pub fn remove_rows(writer: &mut Writer<'_>, table: NodeId, at: usize, rows: usize) -> Result<()> {
    ensure_table(writer.tree(), table)?;
    if rows == 0 {
        return Err(TableError::InvalidCount {
            operation: "remove_rows",
            count: rows,
        });
    }
    let total_rows = row_count(writer.tree(), table);
    let first = at;
    let last = at + rows - 1;
    if last >= total_rows {
        return Err(TableError::RowOutOfRange {
            operation: "remove_rows",
            index: last,
            rows: total_rows,
        });
    }
    debug!(table = %table, at, rows, "Removing rows");

    let mut cells_to_move: HashMap<usize, (NodeId, usize)> = HashMap::new();
    let mut cells_to_trim: Vec<(NodeId, usize)> = Vec::new();
    for slot in TableWalker::new(writer.tree(), table, WalkerOptions::new().end_row(last)) {
        let last_row_of_cell = slot.row + slot.cell_height - 1;

        if slot.row >= first && slot.row <= last && last_row_of_cell > last {
            let inside_band = last - slot.row + 1;
            cells_to_move.insert(slot.column, (slot.cell, slot.cell_height - inside_band));
        }

        if slot.row < first && last_row_of_cell >= first {
            let overlap = if last_row_of_cell >= last {
                last - first + 1
            } else {
                last_row_of_cell - first + 1
            };
            cells_to_trim.push((slot.cell, slot.cell_height - overlap));
        }
    }

    if !cells_to_move.is_empty() {
        move_cells_to_row(writer, table, last + 1, &cells_to_move)?;
    }

    let row_ids = writer.tree().table_rows(table);
    for row in row_ids[first..=last].iter().rev() {
        writer.remove(*row)?;
    }

    for (cell, rowspan) in cells_to_trim {
        update_numeric_attribute(writer, cell, AttributeKey::Rowspan, rowspan as u32)?;
    }

    let heading_rows = heading_rows(writer, table);
    if first < heading_rows {
        let new_heading_rows = if last < heading_rows {
            heading_rows - (last - first + 1)
        } else {
            first
        };
        update_numeric_attribute(writer, table, AttributeKey::HeadingRows, new_heading_rows as u32)?;
    }

    if !remove_empty_columns(writer, table)? {
        remove_empty_rows(writer, table)?;
    }
    Ok(())
}

/// Move cells into grid row `target`, keyed by their anchor column, keeping
/// the row's cells in column order
fn move_cells_to_row(
    writer: &mut Writer<'_>,
    table: NodeId,
    target: usize,
    cells_to_move: &HashMap<usize, (NodeId, usize)>,
) -> Result<()> {
    let Some(&row) = writer.tree().table_rows(table).get(target) else {
        return Ok(());
    };
    let slots: Vec<TableSlot> = TableWalker::new(
        writer.tree(),
        table,
        WalkerOptions::new().row(target).include_all_slots(),
    )
    .collect();

    let mut previous: Option<NodeId> = None;
    for slot in slots {
        if let Some(&(cell, rowspan)) = cells_to_move.get(&slot.column) {
            let index = match previous {
                Some(previous) => writer.tree().index_in_parent(previous).map_or(0, |i| i + 1),
                None => 0,
            };
            writer.move_node(cell, row, Some(index))?;
            update_numeric_attribute(writer, cell, AttributeKey::Rowspan, rowspan as u32)?;
            previous = Some(cell);
        } else if slot.is_anchor() {
            previous = Some(slot.cell);
        }
    }
    Ok(())
}

// =============================================================================
// Columns
// =============================================================================

/// Insert `columns` columns before grid column `at`
pub fn insert_columns(writer: &mut Writer<'_>, table: NodeId, at: usize, columns: usize) -> Result<()> {
    ensure_table(writer.tree(), table)?;
    let total_columns = column_count(writer.tree(), table);
    if at > total_columns {
        return Err(TableError::ColumnOutOfRange {
            operation: "insert_columns",
            index: at,
            columns: total_columns,
        });
    }
    if columns == 0 {
        return Err(TableError::InvalidCount {
            operation: "insert_columns",
            count: columns,
        });
    }
    debug!(table = %table, at, columns, "Inserting columns");

    let heading_columns = heading_columns(writer, table);
    if at < heading_columns {
        update_numeric_attribute(
            writer,
            table,
            AttributeKey::HeadingColumns,
            (heading_columns + columns) as u32,
        )?;
    }
    insert_auto_columns(writer, table, at, columns)?;

    if at == 0 || at == total_columns {
        let rows = writer.tree().table_rows(table);
        for row in rows {
            let index = if at == 0 {
                0
            } else {
                writer.tree().children_of(row).len()
            };
            create_cells(writer, columns, row, index, 1, 1)?;
        }
        return Ok(());
    }

    enum Action {
        Widen(NodeId, usize),
        InsertBefore(NodeId, usize),
    }

    let mut actions = Vec::new();
    let mut walker = TableWalker::new(
        writer.tree(),
        table,
        WalkerOptions::new().column(at).include_all_slots(),
    );
    while let Some(slot) = walker.next() {
        if slot.cell_anchor_column < at {
            actions.push(Action::Widen(slot.cell, slot.cell_width + columns));
            let last_row = slot.cell_anchor_row + slot.cell_height - 1;
            for row in slot.row..=last_row {
                walker.skip_row(row);
            }
        } else {
            actions.push(Action::InsertBefore(slot.row_id, slot.cell_index));
        }
    }

    for action in actions {
        match action {
            Action::Widen(cell, colspan) => {
                writer.set_attribute(cell, AttributeKey::Colspan, colspan as u32)?;
            }
            Action::InsertBefore(row, index) => {
                create_cells(writer, columns, row, index, 1, 1)?;
            }
        }
    }
    Ok(())
}

/// Remove `columns` columns starting at grid column `at`
pub fn remove_columns(writer: &mut Writer<'_>, table: NodeId, at: usize, columns: usize) -> Result<()> {
    ensure_table(writer.tree(), table)?;
    if columns == 0 {
        return Err(TableError::InvalidCount {
            operation: "remove_columns",
            count: columns,
        });
    }
    let total_columns = column_count(writer.tree(), table);
    let first = at;
    let last = at + columns - 1;
    if last >= total_columns {
        return Err(TableError::ColumnOutOfRange {
            operation: "remove_columns",
            index: last,
            columns: total_columns,
        });
    }
    debug!(table = %table, at, columns, "Removing columns");

    let heading_columns = heading_columns(writer, table);
    if first < heading_columns {
        let removed = if last < heading_columns {
            last - first + 1
        } else {
            heading_columns - first
        };
        update_numeric_attribute(
            writer,
            table,
            AttributeKey::HeadingColumns,
            (heading_columns - removed) as u32,
        )?;
    }

    for removed in (first..=last).rev() {
        let slots: Vec<TableSlot> = TableWalker::anchors(writer.tree(), table).collect();
        for slot in slots {
            if slot.column <= removed && slot.cell_width > 1 && slot.column + slot.cell_width > removed {
                update_numeric_attribute(
                    writer,
                    slot.cell,
                    AttributeKey::Colspan,
                    (slot.cell_width - 1) as u32,
                )?;
            } else if slot.column == removed {
                writer.remove(slot.cell)?;
            }
        }
        remove_column_entry(writer, table, removed)?;
    }

    if !remove_empty_rows(writer, table)? {
        remove_empty_columns(writer, table)?;
    }
    Ok(())
}

// =============================================================================
// Cleanup
// =============================================================================

/// Remove the last grid column in which no cell starts. Returns whether one
/// was removed.
pub fn remove_empty_columns(writer: &mut Writer<'_>, table: NodeId) -> Result<bool> {
    let width = column_count(writer.tree(), table);
    let mut occupied = vec![0usize; width];
    for slot in TableWalker::anchors(writer.tree(), table) {
        if let Some(count) = occupied.get_mut(slot.column) {
            *count += 1;
        }
    }

    match occupied.iter().rposition(|&count| count == 0) {
        Some(column) => {
            remove_columns(writer, table, column, 1)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Remove the last row element without cells. Returns whether one was removed.
pub fn remove_empty_rows(writer: &mut Writer<'_>, table: NodeId) -> Result<bool> {
    let rows = writer.tree().table_rows(table);
    let empty = rows.iter().rposition(|&row| {
        writer
            .tree()
            .get_table_row(row)
            .map_or(false, |row| row.is_empty())
    });

    match empty {
        Some(row) => {
            remove_rows(writer, table, row, 1)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Remove one empty column, or failing that one empty row
pub fn remove_empty_rows_columns(writer: &mut Writer<'_>, table: NodeId) -> Result<()> {
    if !remove_empty_columns(writer, table)? {
        remove_empty_rows(writer, table)?;
    }
    Ok(())
}

fn heading_rows(writer: &Writer<'_>, table: NodeId) -> usize {
    writer.tree().get_table(table).map_or(0, |t| t.heading_rows() as usize)
}

fn heading_columns(writer: &Writer<'_>, table: NodeId) -> usize {
    writer.tree().get_table(table).map_or(0, |t| t.heading_columns() as usize)
}
