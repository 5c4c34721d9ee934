//! Small editing helpers shared by the table operations

use crate::{Result, TableError};
use doc_model::{
    AttributeKey, DocumentTree, NodeId, NodeType, Paragraph, TableCell, TableRow, Writer,
};
use std::collections::HashSet;

/// Write a numeric attribute, dropping it when `value` is not above the key's
/// default.
pub(crate) fn update_numeric_attribute(
    writer: &mut Writer<'_>,
    node: NodeId,
    key: AttributeKey,
    value: u32,
) -> Result<()> {
    let default = key.numeric_default().unwrap_or(0);
    if value > default {
        writer.set_attribute(node, key, value)?;
    } else {
        writer.remove_attribute(node, key)?;
    }
    Ok(())
}

/// Insert a cell holding one empty paragraph. `None` appends to the row.
pub(crate) fn create_empty_cell(
    writer: &mut Writer<'_>,
    row: NodeId,
    index: Option<usize>,
    colspan: u32,
    rowspan: u32,
) -> Result<NodeId> {
    let cell = writer.insert(TableCell::spanning(colspan, rowspan), row, index)?;
    writer.insert(Paragraph::new(), cell, None)?;
    Ok(cell)
}

/// Insert `count` empty cells starting at child index `index` of `row`
pub(crate) fn create_cells(
    writer: &mut Writer<'_>,
    count: usize,
    row: NodeId,
    index: usize,
    colspan: u32,
    rowspan: u32,
) -> Result<()> {
    for offset in 0..count {
        create_empty_cell(writer, row, Some(index + offset), colspan, rowspan)?;
    }
    Ok(())
}

/// Insert `rows` rows of `cells` empty cells each before grid row `at`
pub(crate) fn create_empty_rows(
    writer: &mut Writer<'_>,
    table: NodeId,
    at: usize,
    rows: usize,
    cells: usize,
    colspan: u32,
) -> Result<()> {
    for offset in 0..rows {
        let index = row_child_index(writer.tree(), table, at + offset);
        let row = writer.insert(TableRow::new(), table, Some(index))?;
        for _ in 0..cells {
            create_empty_cell(writer, row, None, colspan, 1)?;
        }
    }
    Ok(())
}

/// Child index in `table` where grid row `row` sits, or where it would be
/// appended. Rows always precede the caption and column group.
pub(crate) fn row_child_index(tree: &DocumentTree, table: NodeId, row: usize) -> usize {
    let rows = tree.table_rows(table);
    if let Some(&id) = rows.get(row) {
        return tree.index_in_parent(id).unwrap_or(row);
    }
    rows.last()
        .and_then(|&last| tree.index_in_parent(last))
        .map_or(0, |index| index + 1)
}

/// Shrink a cell so it ends no further than `limit_row` and `limit_column`
pub(crate) fn trim_cell_if_needed(
    writer: &mut Writer<'_>,
    cell: NodeId,
    cell_row: usize,
    cell_column: usize,
    limit_row: usize,
    limit_column: usize,
) -> Result<()> {
    let (colspan, rowspan) = spans(writer.tree(), cell)?;

    let end_column = cell_column + colspan as usize - 1;
    if end_column > limit_column {
        let trimmed = (limit_column + 1).saturating_sub(cell_column) as u32;
        update_numeric_attribute(writer, cell, AttributeKey::Colspan, trimmed)?;
    }

    let end_row = cell_row + rowspan as usize - 1;
    if end_row > limit_row {
        let trimmed = (limit_row + 1).saturating_sub(cell_row) as u32;
        update_numeric_attribute(writer, cell, AttributeKey::Rowspan, trimmed)?;
    }
    Ok(())
}

/// `(colspan, rowspan)` of a cell
pub(crate) fn spans(tree: &DocumentTree, cell: NodeId) -> Result<(u32, u32)> {
    let cell = tree
        .get_table_cell(cell)
        .ok_or(TableError::NotATableCell(cell.as_uuid()))?;
    Ok((cell.colspan(), cell.rowspan()))
}

/// The row and table a cell belongs to
pub(crate) fn cell_context(tree: &DocumentTree, cell: NodeId) -> Result<(NodeId, NodeId)> {
    if tree.node_type(cell) != Some(NodeType::TableCell) {
        return Err(TableError::NotATableCell(cell.as_uuid()));
    }
    let row = tree
        .parent_of(cell)
        .filter(|&row| tree.node_type(row) == Some(NodeType::TableRow))
        .ok_or(TableError::NotATableCell(cell.as_uuid()))?;
    let table = tree
        .parent_of(row)
        .filter(|&table| tree.node_type(table) == Some(NodeType::Table))
        .ok_or(TableError::NotATable(row.as_uuid()))?;
    Ok((table, row))
}

/// The first cell that appears in `cells` a second time
pub(crate) fn first_duplicate(cells: &[NodeId]) -> Option<NodeId> {
    let mut seen = HashSet::with_capacity(cells.len());
    cells.iter().copied().find(|&cell| !seen.insert(cell))
}

/// Fail unless `table` is a table node
pub(crate) fn ensure_table(tree: &DocumentTree, table: NodeId) -> Result<()> {
    if tree.get_table(table).is_none() {
        return Err(TableError::NotATable(table.as_uuid()));
    }
    Ok(())
}
