//! Copying a cell selection out of a table and pasting a table over one

use crate::common::{cell_context, trim_cell_if_needed};
use crate::geometry::{
    adjust_last_column_index, adjust_last_row_index, column_count, column_indexes, crop_table,
    horizontally_overlapping_cells, is_selection_rectangular, row_count, row_indexes,
    vertically_overlapping_cells, CropDimensions, IndexRange,
};
use crate::split::{split_horizontally, split_vertically};
use crate::structure::{insert_columns, insert_rows};
use crate::walker::{TableSlot, TableWalker, WalkerOptions};
use crate::{Result, TableError};
use doc_model::{DocumentTree, NodeFragment, NodeId, NodeType, Writer};
use tracing::debug;

/// Grid rectangle a paste writes into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PasteArea {
    rows: IndexRange,
    columns: IndexRange,
}

/// The selected cells as a standalone table.
///
/// For a rectangular selection whose last row (or column) consists only of
/// cells spanning further, the copy extends to include their full span.
pub fn copy_cells(tree: &DocumentTree, cells: &[NodeId]) -> Result<NodeFragment> {
    let first = cells.first().ok_or(TableError::EmptySelection {
        operation: "copy_cells",
    })?;
    let (table, _) = cell_context(tree, *first)?;
    let rows = row_indexes(tree, cells)?;
    let columns = column_indexes(tree, cells)?;

    let (last_row, last_column) = if is_selection_rectangular(tree, cells)? {
        (
            adjust_last_row_index(tree, table, rows, columns),
            adjust_last_column_index(tree, table, rows, columns),
        )
    } else {
        (rows.last, columns.last)
    };

    crop_table(
        tree,
        table,
        CropDimensions {
            start_row: rows.first,
            start_column: columns.first,
            end_row: last_row,
            end_column: last_column,
        },
    )
}

/// Paste `fragment`, a table, over the selected cells. Returns the cells
/// inserted.
///
/// A single selected cell is the top-left corner of the paste; the table grows
/// if the pasted table does not fit. A larger selection is filled by repeating
/// the pasted table and cropping it at the selection's edges.
pub fn paste_table(writer: &mut Writer<'_>, fragment: &NodeFragment, cells: &[NodeId]) -> Result<Vec<NodeId>> {
    let first = cells.first().ok_or(TableError::EmptySelection {
        operation: "paste_table",
    })?;
    let (table, _) = cell_context(writer.tree(), *first)?;
    for &cell in cells {
        if cell_context(writer.tree(), cell)?.0 != table {
            return Err(TableError::MixedTables {
                operation: "paste_table",
            });
        }
    }
    if fragment.node_type() != NodeType::Table {
        return Err(TableError::NotATable(fragment.id().as_uuid()));
    }

    let mut pasted_tree = DocumentTree::new();
    let root = pasted_tree.root_id();
    let pasted = Writer::new(&mut pasted_tree).insert_fragment(fragment, root, None)?;
    let pasted_width = column_count(&pasted_tree, pasted);
    let pasted_height = row_count(&pasted_tree, pasted);
    if pasted_width == 0 || pasted_height == 0 {
        return Err(TableError::InvalidCount {
            operation: "paste_table",
            count: 0,
        });
    }
    debug!(table = %table, pasted_width, pasted_height, cells = cells.len(), "Pasting table");

    let area = prepare_table_for_pasting(writer, table, cells, pasted_width, pasted_height)?;

    let cropped = crop_table(
        &pasted_tree,
        pasted,
        CropDimensions {
            start_row: 0,
            start_column: 0,
            end_row: area.rows.len().min(pasted_height) - 1,
            end_column: area.columns.len().min(pasted_width) - 1,
        },
    )?;
    let mut cropped_tree = DocumentTree::new();
    let root = cropped_tree.root_id();
    let cropped = Writer::new(&mut cropped_tree).insert_fragment(&cropped, root, None)?;

    let mut location_map = vec![vec![None; pasted_width]; pasted_height];
    for slot in TableWalker::anchors(&cropped_tree, cropped) {
        if let Some(cell) = location_map.get_mut(slot.row).and_then(|row| row.get_mut(slot.column)) {
            *cell = Some(slot.cell);
        }
    }

    let options = WalkerOptions {
        start_row: Some(area.rows.first),
        end_row: Some(area.rows.last),
        start_column: Some(area.columns.first),
        end_column: Some(area.columns.last),
        include_all_slots: true,
        ..WalkerOptions::default()
    };
    let slots: Vec<TableSlot> = TableWalker::new(writer.tree(), table, options).collect();

    let mut inserted = Vec::new();
    let mut position: Option<(NodeId, usize)> = None;
    for slot in slots {
        if slot.column == area.columns.first {
            position = Some((slot.row_id, slot.cell_index));
        }
        if slot.is_anchor() {
            writer.remove(slot.cell)?;
        }

        let pasted_row = (slot.row - area.rows.first) % pasted_height;
        let pasted_column = (slot.column - area.columns.first) % pasted_width;
        let Some(source) = location_map[pasted_row][pasted_column] else {
            continue;
        };
        let Some((row, index)) = position else {
            continue;
        };
        let cell_fragment = cropped_tree
            .snapshot(source)
            .ok_or(TableError::NotATableCell(source.as_uuid()))?;
        let cell = writer.insert_fragment(&cell_fragment, row, Some(index))?;
        trim_cell_if_needed(writer, cell, slot.row, slot.column, area.rows.last, area.columns.last)?;
        inserted.push(cell);
        position = Some((row, index + 1));
    }

    let (heading_rows, heading_columns) = writer
        .tree()
        .get_table(table)
        .map_or((0, 0), |t| (t.heading_rows() as usize, t.heading_columns() as usize));
    if area.rows.first < heading_rows && heading_rows <= area.rows.last {
        inserted.extend(split_cells_at_row(writer, table, heading_rows, area.columns, area.rows.first)?);
    }
    if area.columns.first < heading_columns && heading_columns <= area.columns.last {
        inserted.extend(split_cells_at_column(writer, table, heading_columns, area.rows)?);
    }
    Ok(inserted)
}

/// Work out the target rectangle, growing the table for a single-cell target
/// and cutting cells so the rectangle's edges fall between cells
fn prepare_table_for_pasting(
    writer: &mut Writer<'_>,
    table: NodeId,
    cells: &[NodeId],
    pasted_width: usize,
    pasted_height: usize,
) -> Result<PasteArea> {
    let mut area = PasteArea {
        rows: row_indexes(writer.tree(), cells)?,
        columns: column_indexes(writer.tree(), cells)?,
    };

    let expand = cells.len() == 1;
    if expand {
        area.rows.last += pasted_height - 1;
        area.columns.last += pasted_width - 1;

        let width = column_count(writer.tree(), table);
        if area.columns.last + 1 > width {
            insert_columns(writer, table, width, area.columns.last + 1 - width)?;
        }
        let height = row_count(writer.tree(), table);
        if area.rows.last + 1 > height {
            insert_rows(writer, table, height, area.rows.last + 1 - height, None)?;
        }
    }

    if expand || !is_selection_rectangular(writer.tree(), cells)? {
        split_cells_at_column(writer, table, area.columns.first, area.rows)?;
        split_cells_at_column(writer, table, area.columns.last + 1, area.rows)?;
        split_cells_at_row(writer, table, area.rows.first, area.columns, 0)?;
        split_cells_at_row(writer, table, area.rows.last + 1, area.columns, area.rows.first)?;
    } else {
        let last_row = adjust_last_row_index(writer.tree(), table, area.rows, area.columns);
        let last_column = adjust_last_column_index(writer.tree(), table, area.rows, area.columns);
        area.rows.last = last_row;
        area.columns.last = last_column;
    }
    Ok(area)
}

/// Cut cells crossing the top edge of `split_row` whose columns touch `limit`
fn split_cells_at_row(
    writer: &mut Writer<'_>,
    table: NodeId,
    split_row: usize,
    limit: IndexRange,
    start_row: usize,
) -> Result<Vec<NodeId>> {
    let mut created = Vec::new();
    if split_row < 1 {
        return Ok(created);
    }
    let overlapping = vertically_overlapping_cells(writer.tree(), table, split_row, start_row);
    for slot in overlapping {
        if affected_by_split(slot.column, slot.cell_width, limit) {
            if let Some(cell) = split_horizontally(writer, slot.cell, split_row)? {
                created.push(cell);
            }
        }
    }
    Ok(created)
}

/// Cut cells crossing the left edge of `split_column` whose rows touch `limit`
fn split_cells_at_column(
    writer: &mut Writer<'_>,
    table: NodeId,
    split_column: usize,
    limit: IndexRange,
) -> Result<Vec<NodeId>> {
    let mut created = Vec::new();
    if split_column < 1 {
        return Ok(created);
    }
    let overlapping = horizontally_overlapping_cells(writer.tree(), table, split_column);
    for slot in overlapping {
        if affected_by_split(slot.row, slot.cell_height, limit) {
            created.push(split_vertically(writer, slot.cell, slot.column, split_column)?);
        }
    }
    Ok(created)
}

fn affected_by_split(index: usize, span: usize, limit: IndexRange) -> bool {
    let end = index + span - 1;
    let inside = index >= limit.first && index <= limit.last;
    let overlaps_from_before = index < limit.first && end >= limit.first;
    inside || overlaps_from_before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{cell_at, grid, table_tree};
    use doc_model::{CellSpec, TableBuilder};

    fn three_by_three() -> (DocumentTree, NodeId) {
        table_tree(vec![vec!["a", "b", "c"], vec!["d", "e", "f"], vec!["g", "h", "i"]])
    }

    #[test]
    fn test_copy_block() {
        let (tree, table) = three_by_three();
        let cells = [
            cell_at(&tree, table, 1, 1),
            cell_at(&tree, table, 1, 2),
            cell_at(&tree, table, 2, 1),
            cell_at(&tree, table, 2, 2),
        ];
        let copy = copy_cells(&tree, &cells).unwrap();
        assert_eq!(
            copy.outline(),
            r#"table[row[cell["e"], cell["f"]], row[cell["h"], cell["i"]]]"#
        );
    }

    #[test]
    fn test_copy_extends_to_full_span() {
        let (tree, table) = table_tree(vec![
            vec![CellSpec::new("a").rowspan(2), "b".into()],
            vec!["c".into()],
        ]);
        let a = cell_at(&tree, table, 0, 0);
        let copy = copy_cells(&tree, &[a]).unwrap();
        assert_eq!(copy.outline(), r#"table[row[cell(rowspan=2)["a"]], row[]]"#);
    }

    #[test]
    fn test_paste_into_single_cell_grows_table() {
        let (mut tree, table) = table_tree(vec![vec!["a", "b"], vec!["c", "d"]]);
        let d = cell_at(&tree, table, 1, 1);
        let pasted = TableBuilder::new(vec![vec!["x", "y"], vec!["z", "w"]]).build();
        let inserted = paste_table(&mut Writer::new(&mut tree), &pasted, &[d]).unwrap();
        assert_eq!(inserted.len(), 4);
        assert_eq!(grid(&tree, table), vec!["a b []", "c x y", "[] z w"]);
    }

    #[test]
    fn test_paste_repeats_over_larger_selection() {
        let (mut tree, table) = table_tree(vec![vec!["a", "b"], vec!["c", "d"]]);
        let cells: Vec<NodeId> = (0..2)
            .flat_map(|row| (0..2).map(move |index| (row, index)))
            .map(|(row, index)| cell_at(&tree, table, row, index))
            .collect();
        let pasted = TableBuilder::new(vec![vec!["x"]]).build();
        paste_table(&mut Writer::new(&mut tree), &pasted, &cells).unwrap();
        assert_eq!(grid(&tree, table), vec!["x x", "x x"]);
    }

    #[test]
    fn test_paste_crops_to_selection() {
        let (mut tree, table) = table_tree(vec![vec!["a", "b", "c"], vec!["d", "e", "f"]]);
        let cells = [cell_at(&tree, table, 0, 0), cell_at(&tree, table, 0, 1)];
        let pasted = TableBuilder::new(vec![vec!["1", "2", "3"], vec!["4", "5", "6"]]).build();
        paste_table(&mut Writer::new(&mut tree), &pasted, &cells).unwrap();
        assert_eq!(grid(&tree, table), vec!["1 2 c", "d e f"]);
    }

    #[test]
    fn test_paste_splits_non_rectangular_selection() {
        let (mut tree, table) = table_tree(vec![
            vec![CellSpec::new("a").colspan(2)],
            vec!["b".into(), "c".into()],
        ]);
        let cells = [cell_at(&tree, table, 0, 0), cell_at(&tree, table, 1, 0)];
        let pasted = TableBuilder::new(vec![vec!["x"], vec!["y"]]).build();
        paste_table(&mut Writer::new(&mut tree), &pasted, &cells).unwrap();
        assert_eq!(grid(&tree, table), vec!["x []", "y c"]);
    }

    #[test]
    fn test_paste_rejects_bad_input() {
        let (mut tree, table) = three_by_three();
        let a = cell_at(&tree, table, 0, 0);
        let mut writer = Writer::new(&mut tree);
        let pasted = TableBuilder::new(vec![vec!["x"]]).build();
        assert!(matches!(
            paste_table(&mut writer, &pasted, &[]),
            Err(TableError::EmptySelection { .. })
        ));
        assert!(matches!(
            paste_table(&mut writer, &NodeFragment::paragraph("x"), &[a]),
            Err(TableError::NotATable(_))
        ));
    }
}
