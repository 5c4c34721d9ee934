//! Splitting cells
//!
//! A cell split into N pieces first divides its existing span. Whatever the
//! span cannot provide is made up by widening (or heightening) the cells that
//! share the split column (or row) and inserting new cells next to it.

use crate::column_widths::insert_auto_columns;
use crate::common::{cell_context, create_cells, create_empty_cell, create_empty_rows, spans, update_numeric_attribute};
use crate::walker::{TableSlot, TableWalker, WalkerOptions};
use crate::{Result, TableError};
use doc_model::{AttributeKey, NodeId, Writer};
use tracing::debug;

/// Divide `span` into `cells` pieces: `(new_cells_span, updated_span)`.
///
/// New cells get `span / cells`, the original keeps that plus the remainder.
/// A span smaller than the piece count yields `(1, 1)`.
pub fn break_span_evenly(span: usize, cells: usize) -> (usize, usize) {
    if span < cells || cells == 0 {
        return (1, 1);
    }
    let new_cells_span = span / cells;
    let updated_span = span - new_cells_span * cells + new_cells_span;
    (new_cells_span, updated_span)
}

/// Split a cell into `cells` cells side by side
pub fn split_cell_vertically(writer: &mut Writer<'_>, cell: NodeId, cells: usize) -> Result<()> {
    let (table, _) = cell_context(writer.tree(), cell)?;
    if cells == 0 {
        return Err(TableError::InvalidCount {
            operation: "split_cell_vertically",
            count: cells,
        });
    }
    let (colspan, rowspan) = spans(writer.tree(), cell)?;
    let colspan = colspan as usize;
    debug!(cell = %cell, cells, colspan, "Splitting cell vertically");

    if colspan > 1 {
        let (new_cells_span, updated_span) = break_span_evenly(colspan, cells);
        update_numeric_attribute(writer, cell, AttributeKey::Colspan, updated_span as u32)?;
        let to_insert = if colspan > cells { cells - 1 } else { colspan - 1 };
        insert_after(writer, cell, to_insert, new_cells_span as u32, rowspan)?;
    }

    if colspan < cells {
        let to_insert = cells - colspan;
        let slots: Vec<TableSlot> = TableWalker::anchors(writer.tree(), table).collect();
        let split_column = slots
            .iter()
            .find(|slot| slot.cell == cell)
            .map(|slot| slot.column)
            .ok_or(TableError::NotATableCell(cell.as_uuid()))?;

        for slot in &slots {
            let on_same_column = slot.cell != cell && slot.column == split_column;
            let spans_over = slot.column < split_column && slot.column + slot.cell_width > split_column;
            if on_same_column || spans_over {
                writer.set_attribute(slot.cell, AttributeKey::Colspan, (slot.cell_width + to_insert) as u32)?;
            }
        }

        insert_after(writer, cell, to_insert, 1, rowspan)?;
        insert_auto_columns(writer, table, split_column + 1, to_insert)?;

        let heading_columns = writer.tree().get_table(table).map_or(0, |t| t.heading_columns()) as usize;
        if heading_columns > split_column {
            update_numeric_attribute(
                writer,
                table,
                AttributeKey::HeadingColumns,
                (heading_columns + to_insert) as u32,
            )?;
        }
    }
    Ok(())
}

/// Split a cell into `cells` cells stacked on top of each other
pub fn split_cell_horizontally(writer: &mut Writer<'_>, cell: NodeId, cells: usize) -> Result<()> {
    let (table, row) = cell_context(writer.tree(), cell)?;
    if cells == 0 {
        return Err(TableError::InvalidCount {
            operation: "split_cell_horizontally",
            count: cells,
        });
    }
    let split_row = writer
        .tree()
        .row_index(row)
        .ok_or(TableError::NotATableCell(cell.as_uuid()))?;
    let (colspan, rowspan) = spans(writer.tree(), cell)?;
    let rowspan = rowspan as usize;
    debug!(cell = %cell, cells, rowspan, "Splitting cell horizontally");

    if rowspan > 1 {
        let options = WalkerOptions::new()
            .start_row(split_row)
            .end_row(split_row + rowspan - 1)
            .include_all_slots();
        let slots: Vec<TableSlot> = TableWalker::new(writer.tree(), table, options).collect();
        let (new_cells_span, updated_span) = break_span_evenly(rowspan, cells);
        update_numeric_attribute(writer, cell, AttributeKey::Rowspan, updated_span as u32)?;

        let cell_column = slots
            .iter()
            .find(|slot| slot.cell == cell)
            .map(|slot| slot.column)
            .ok_or(TableError::NotATableCell(cell.as_uuid()))?;
        let first_new_row = split_row + updated_span;
        for slot in &slots {
            let in_split_row = slot.row >= first_new_row && (slot.row - first_new_row) % new_cells_span == 0;
            if slot.column == cell_column && in_split_row {
                create_cells(writer, 1, slot.row_id, slot.cell_index, colspan, new_cells_span as u32)?;
            }
        }
    }

    if rowspan < cells {
        let to_insert = cells - rowspan;
        let slots: Vec<TableSlot> =
            TableWalker::new(writer.tree(), table, WalkerOptions::new().end_row(split_row)).collect();
        for slot in slots {
            if slot.cell != cell && slot.row + slot.cell_height > split_row {
                writer.set_attribute(slot.cell, AttributeKey::Rowspan, (slot.cell_height + to_insert) as u32)?;
            }
        }

        create_empty_rows(writer, table, split_row + 1, to_insert, 1, colspan)?;

        let heading_rows = writer.tree().get_table(table).map_or(0, |t| t.heading_rows()) as usize;
        if heading_rows > split_row {
            update_numeric_attribute(
                writer,
                table,
                AttributeKey::HeadingRows,
                (heading_rows + to_insert) as u32,
            )?;
        }
    }
    Ok(())
}

/// Cut a cell at grid row `split_row`: the cell keeps the rows above, a new
/// empty cell anchored at `split_row` takes the rest. Returns the new cell.
pub fn split_horizontally(writer: &mut Writer<'_>, cell: NodeId, split_row: usize) -> Result<Option<NodeId>> {
    let (table, row) = cell_context(writer.tree(), cell)?;
    let row_index = writer
        .tree()
        .row_index(row)
        .ok_or(TableError::NotATableCell(cell.as_uuid()))?;
    let (colspan, rowspan) = spans(writer.tree(), cell)?;
    let kept_rowspan = split_row.saturating_sub(row_index);
    let new_rowspan = (rowspan as usize).saturating_sub(kept_rowspan);

    let options = WalkerOptions::new()
        .start_row(row_index)
        .end_row(split_row)
        .include_all_slots();
    let slots: Vec<TableSlot> = TableWalker::new(writer.tree(), table, options).collect();

    let mut column = None;
    let mut new_cell = None;
    for slot in slots {
        if slot.cell == cell && column.is_none() {
            column = Some(slot.column);
        }
        if column == Some(slot.column) && slot.row == split_row {
            new_cell = Some(create_empty_cell(
                writer,
                slot.row_id,
                Some(slot.cell_index),
                colspan,
                new_rowspan as u32,
            )?);
        }
    }

    update_numeric_attribute(writer, cell, AttributeKey::Rowspan, kept_rowspan as u32)?;
    Ok(new_cell)
}

/// Cut a cell at grid column `split_column`, given the cell's own anchor
/// `column`. The new cell is inserted right after it. Returns the new cell.
pub fn split_vertically(
    writer: &mut Writer<'_>,
    cell: NodeId,
    column: usize,
    split_column: usize,
) -> Result<NodeId> {
    let (colspan, rowspan) = spans(writer.tree(), cell)?;
    let kept_colspan = split_column.saturating_sub(column);
    let new_colspan = (colspan as usize).saturating_sub(kept_colspan);

    let row = writer
        .tree()
        .parent_of(cell)
        .ok_or(TableError::NotATableCell(cell.as_uuid()))?;
    let index = writer.tree().index_in_parent(cell).map_or(0, |i| i + 1);
    let new_cell = create_empty_cell(writer, row, Some(index), new_colspan as u32, rowspan)?;
    update_numeric_attribute(writer, cell, AttributeKey::Colspan, kept_colspan as u32)?;
    Ok(new_cell)
}

fn insert_after(writer: &mut Writer<'_>, cell: NodeId, count: usize, colspan: u32, rowspan: u32) -> Result<()> {
    let row = writer
        .tree()
        .parent_of(cell)
        .ok_or(TableError::NotATableCell(cell.as_uuid()))?;
    let index = writer.tree().index_in_parent(cell).map_or(0, |i| i + 1);
    create_cells(writer, count, row, index, colspan, rowspan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{cell_at, grid, table_tree, table_tree_with};
    use doc_model::{CellSpec, ColumnWidth, TableBuilder};

    #[test]
    fn test_break_span_evenly() {
        assert_eq!(break_span_evenly(7, 3), (2, 3));
        assert_eq!(break_span_evenly(4, 2), (2, 2));
        assert_eq!(break_span_evenly(2, 3), (1, 1));
    }

    #[test]
    fn test_split_plain_cell_vertically() {
        let (mut tree, table) = table_tree(vec![vec!["a", "b"], vec!["c", "d"]]);
        let a = cell_at(&tree, table, 0, 0);
        split_cell_vertically(&mut Writer::new(&mut tree), a, 2).unwrap();
        assert_eq!(grid(&tree, table), vec!["a [] b", "c[c2] d"]);
    }

    #[test]
    fn test_split_vertically_divides_colspan() {
        let (mut tree, table) = table_tree(vec![
            vec![CellSpec::new("a").colspan(7)],
            (0..7).map(|i| CellSpec::new(i.to_string())).collect(),
        ]);
        let a = cell_at(&tree, table, 0, 0);
        split_cell_vertically(&mut Writer::new(&mut tree), a, 3).unwrap();
        assert_eq!(grid(&tree, table)[0], "a[c3] [][c2] [][c2]");
    }

    #[test]
    fn test_split_vertically_widens_heading_band_and_widths() {
        let fragment = TableBuilder::new(vec![vec!["a", "b"]])
            .heading_columns(1)
            .column_widths(vec![ColumnWidth::Percent(50.0), ColumnWidth::Percent(50.0)])
            .build();
        let (mut tree, table) = table_tree_with(&fragment);
        let a = cell_at(&tree, table, 0, 0);
        split_cell_vertically(&mut Writer::new(&mut tree), a, 3).unwrap();
        assert_eq!(grid(&tree, table), vec!["a [] [] b"]);
        assert_eq!(tree.get_table(table).unwrap().heading_columns(), 3);
        assert_eq!(
            crate::column_widths::column_widths(&tree, table).unwrap().len(),
            4
        );
    }

    #[test]
    fn test_split_plain_cell_horizontally() {
        let (mut tree, table) = table_tree(vec![vec!["a", "b"], vec!["c", "d"]]);
        let a = cell_at(&tree, table, 0, 0);
        split_cell_horizontally(&mut Writer::new(&mut tree), a, 3).unwrap();
        assert_eq!(grid(&tree, table), vec!["a b[r3]", "[]", "[]", "c d"]);
    }

    #[test]
    fn test_split_horizontally_divides_rowspan() {
        let (mut tree, table) = table_tree(vec![
            vec![CellSpec::new("a").rowspan(3), "b".into()],
            vec!["c".into()],
            vec!["d".into()],
        ]);
        let a = cell_at(&tree, table, 0, 0);
        split_cell_horizontally(&mut Writer::new(&mut tree), a, 3).unwrap();
        assert_eq!(grid(&tree, table), vec!["a b", "[] c", "[] d"]);
    }

    #[test]
    fn test_split_horizontally_places_taller_pieces() {
        let (mut tree, table) = table_tree(vec![
            vec![CellSpec::new("a").rowspan(4), "b".into()],
            vec!["c".into()],
            vec!["d".into()],
            vec!["e".into()],
        ]);
        let a = cell_at(&tree, table, 0, 0);
        split_cell_horizontally(&mut Writer::new(&mut tree), a, 2).unwrap();
        assert_eq!(grid(&tree, table), vec!["a[r2] b", "c", "[][r2] d", "e"]);
    }

    #[test]
    fn test_split_at_boundaries() {
        let (mut tree, table) = table_tree(vec![
            vec![CellSpec::new("a").rowspan(3).colspan(2), "b".into()],
            vec!["c".into()],
            vec!["d".into()],
        ]);
        let a = cell_at(&tree, table, 0, 0);
        let mut writer = Writer::new(&mut tree);
        let lower = split_horizontally(&mut writer, a, 1).unwrap();
        assert!(lower.is_some());
        assert_eq!(grid(&tree, table), vec!["a[c2] b", "[][c2r2] c", "d"]);

        let mut writer = Writer::new(&mut tree);
        split_vertically(&mut writer, a, 0, 1).unwrap();
        assert_eq!(grid(&tree, table), vec!["a [] b", "[][c2r2] c", "d"]);
    }
}
