//! Moving the heading row and column boundaries
//!
//! A cell may not straddle a heading boundary, so cells crossing the new
//! boundary are cut in two before the count is written.

use crate::common::{ensure_table, update_numeric_attribute};
use crate::geometry::{column_count, horizontally_overlapping_cells, row_count, vertically_overlapping_cells};
use crate::split::{split_horizontally, split_vertically};
use crate::{Result, TableError};
use doc_model::{AttributeKey, NodeId, Writer};
use tracing::debug;

/// Make the first `count` rows heading rows
pub fn set_heading_rows(writer: &mut Writer<'_>, table: NodeId, count: usize) -> Result<()> {
    ensure_table(writer.tree(), table)?;
    let rows = row_count(writer.tree(), table);
    if count > rows {
        return Err(TableError::RowOutOfRange {
            operation: "set_heading_rows",
            index: count,
            rows,
        });
    }
    let current = writer.tree().get_table(table).map_or(0, |t| t.heading_rows()) as usize;
    debug!(table = %table, from = current, to = count, "Setting heading rows");

    if count > 0 {
        // Cells above the old boundary were already cut there
        let start_row = if count > current { current } else { 0 };
        let overlapping = vertically_overlapping_cells(writer.tree(), table, count, start_row);
        for slot in overlapping {
            split_horizontally(writer, slot.cell, count)?;
        }
    }
    update_numeric_attribute(writer, table, AttributeKey::HeadingRows, count as u32)
}

/// Make the first `count` columns heading columns
pub fn set_heading_columns(writer: &mut Writer<'_>, table: NodeId, count: usize) -> Result<()> {
    ensure_table(writer.tree(), table)?;
    let columns = column_count(writer.tree(), table);
    if count > columns {
        return Err(TableError::ColumnOutOfRange {
            operation: "set_heading_columns",
            index: count,
            columns,
        });
    }
    debug!(table = %table, to = count, "Setting heading columns");

    if count > 0 {
        let overlapping = horizontally_overlapping_cells(writer.tree(), table, count);
        for slot in overlapping {
            split_vertically(writer, slot.cell, slot.column, count)?;
        }
    }
    update_numeric_attribute(writer, table, AttributeKey::HeadingColumns, count as u32)
}
