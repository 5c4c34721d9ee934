//! Merging cells
//!
//! A merge moves the content of the absorbed cell to the end of the surviving
//! one, removes the absorbed cell, and grows the survivor's span. Tables left
//! with an empty row or column are then cleaned up.

use crate::common::{cell_context, first_duplicate, spans, update_numeric_attribute};
use crate::geometry::{cell_location, column_indexes, is_heading_column_cell, is_selection_rectangular, row_count, row_indexes, IndexRange};
use crate::structure::remove_empty_rows_columns;
use crate::walker::{TableSlot, TableWalker, WalkerOptions};
use crate::{Result, TableError};
use doc_model::{AttributeKey, DocumentTree, NodeId, Writer};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Side of a cell to merge with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeDirection {
    Up,
    Down,
    Left,
    Right,
}

impl MergeDirection {
    pub fn is_horizontal(self) -> bool {
        matches!(self, MergeDirection::Left | MergeDirection::Right)
    }

    /// Right and down merges keep the starting cell
    fn keeps_source(self) -> bool {
        matches!(self, MergeDirection::Right | MergeDirection::Down)
    }
}

/// The neighbour `cell` can merge with in `direction`, if any.
///
/// The neighbour must touch the cell, have the same span on the other axis,
/// and lie on the same side of the heading boundaries.
pub fn mergeable_cell(tree: &DocumentTree, cell: NodeId, direction: MergeDirection) -> Result<Option<NodeId>> {
    let neighbour = if direction.is_horizontal() {
        horizontal_neighbour(tree, cell, direction)?
    } else {
        vertical_neighbour(tree, cell, direction)?
    };
    let Some(neighbour) = neighbour else {
        return Ok(None);
    };

    let (colspan, rowspan) = spans(tree, cell)?;
    let (other_colspan, other_rowspan) = spans(tree, neighbour)?;
    let matching = if direction.is_horizontal() {
        rowspan == other_rowspan
    } else {
        colspan == other_colspan
    };
    Ok(matching.then_some(neighbour))
}

fn horizontal_neighbour(tree: &DocumentTree, cell: NodeId, direction: MergeDirection) -> Result<Option<NodeId>> {
    let (table, row) = cell_context(tree, cell)?;
    let siblings = tree.children_of(row);
    let Some(index) = siblings.iter().position(|&id| id == cell) else {
        return Ok(None);
    };
    let neighbour = match direction {
        MergeDirection::Right => siblings.get(index + 1),
        _ => index.checked_sub(1).and_then(|i| siblings.get(i)),
    };
    let Some(&neighbour) = neighbour else {
        return Ok(None);
    };

    let (left, right) = if direction == MergeDirection::Right {
        (cell, neighbour)
    } else {
        (neighbour, cell)
    };

    let heading_columns = tree.get_table(table).map_or(0, |t| t.heading_columns());
    if heading_columns > 0 && is_heading_column_cell(tree, left)? != is_heading_column_cell(tree, right)? {
        return Ok(None);
    }

    let left_column = cell_location(tree, left)?.column;
    let right_column = cell_location(tree, right)?.column;
    let (left_colspan, _) = spans(tree, left)?;
    let touching = left_column + left_colspan as usize == right_column;
    Ok(touching.then_some(neighbour))
}

fn vertical_neighbour(tree: &DocumentTree, cell: NodeId, direction: MergeDirection) -> Result<Option<NodeId>> {
    let (table, row) = cell_context(tree, cell)?;
    let row_index = tree
        .row_index(row)
        .ok_or(TableError::NotATableCell(cell.as_uuid()))?;
    let rows = row_count(tree, table);
    let at_edge = match direction {
        MergeDirection::Down => row_index + 1 >= rows,
        _ => row_index == 0,
    };
    if at_edge {
        return Ok(None);
    }

    let (_, rowspan) = spans(tree, cell)?;
    let rowspan = rowspan as usize;
    let heading_rows = tree.get_table(table).map_or(0, |t| t.heading_rows()) as usize;
    let crosses_heading = match direction {
        MergeDirection::Down => row_index + rowspan == heading_rows,
        _ => row_index == heading_rows,
    };
    if heading_rows > 0 && crosses_heading {
        return Ok(None);
    }

    let merge_row = if direction == MergeDirection::Down {
        row_index + rowspan
    } else {
        row_index
    };
    let slots: Vec<TableSlot> =
        TableWalker::new(tree, table, WalkerOptions::new().end_row(merge_row)).collect();
    let Some(column) = slots.iter().find(|slot| slot.cell == cell).map(|slot| slot.column) else {
        return Ok(None);
    };

    Ok(slots
        .iter()
        .find(|slot| {
            slot.column == column
                && match direction {
                    MergeDirection::Down => slot.row == merge_row,
                    _ => merge_row == slot.row + slot.cell_height,
                }
        })
        .map(|slot| slot.cell))
}

/// Merge `cell` with its neighbour in `direction`. Returns the surviving
/// cell, or `None` when no neighbour qualifies.
pub fn merge_cell(writer: &mut Writer<'_>, cell: NodeId, direction: MergeDirection) -> Result<Option<NodeId>> {
    let Some(other) = mergeable_cell(writer.tree(), cell, direction)? else {
        return Ok(None);
    };
    let (table, _) = cell_context(writer.tree(), cell)?;
    debug!(cell = %cell, ?direction, "Merging cell");

    let (expand, remove) = if direction.keeps_source() {
        (cell, other)
    } else {
        (other, cell)
    };
    let key = if direction.is_horizontal() {
        AttributeKey::Colspan
    } else {
        AttributeKey::Rowspan
    };
    let span_of = |tree: &DocumentTree, id| -> Result<u32> {
        let (colspan, rowspan) = spans(tree, id)?;
        Ok(if direction.is_horizontal() { colspan } else { rowspan })
    };
    let span = span_of(writer.tree(), cell)? + span_of(writer.tree(), other)?;

    merge_table_cells(writer, remove, expand)?;
    writer.set_attribute(expand, key, span)?;
    remove_empty_rows_columns(writer, table)?;
    Ok(Some(expand))
}

/// Merge a rectangular group of cells into its top-left cell, which is
/// returned. Each cell may appear only once.
pub fn merge_cells(writer: &mut Writer<'_>, cells: &[NodeId]) -> Result<NodeId> {
    if let Some(cell) = first_duplicate(cells) {
        return Err(TableError::DuplicateCell {
            operation: "merge_cells",
            cell: cell.as_uuid(),
        });
    }
    let mut located = Vec::with_capacity(cells.len());
    for &cell in cells {
        located.push((cell_location(writer.tree(), cell)?, cell));
    }
    located.sort_by_key(|&(location, _)| location);
    let Some(&(first_location, first)) = located.first() else {
        return Err(TableError::EmptySelection {
            operation: "merge_cells",
        });
    };
    let (table, _) = cell_context(writer.tree(), first)?;
    for &(_, cell) in &located {
        if cell_context(writer.tree(), cell)?.0 != table {
            return Err(TableError::MixedTables {
                operation: "merge_cells",
            });
        }
    }
    debug!(table = %table, cells = cells.len(), "Merging cells");

    let mut max_column = 0;
    let mut max_row = 0;
    for &(location, cell) in &located {
        let (colspan, rowspan) = spans(writer.tree(), cell)?;
        max_column = max_column.max(location.column + colspan as usize);
        max_row = max_row.max(location.row + rowspan as usize);
    }
    update_numeric_attribute(
        writer,
        first,
        AttributeKey::Colspan,
        (max_column - first_location.column) as u32,
    )?;
    update_numeric_attribute(
        writer,
        first,
        AttributeKey::Rowspan,
        (max_row - first_location.row) as u32,
    )?;

    for &(_, cell) in located.iter().skip(1) {
        merge_table_cells(writer, cell, first)?;
    }
    remove_empty_rows_columns(writer, table)?;
    Ok(first)
}

/// Whether `cells` can be merged: at least two distinct cells of one table,
/// inside one heading section on both axes, tiling a rectangle
pub fn can_merge_cells(tree: &DocumentTree, cells: &[NodeId]) -> bool {
    if cells.len() < 2 || first_duplicate(cells).is_some() {
        return false;
    }
    let tables: Result<Vec<NodeId>> = cells
        .iter()
        .map(|&cell| cell_context(tree, cell).map(|(table, _)| table))
        .collect();
    let Ok(tables) = tables else {
        return false;
    };
    if tables.iter().any(|&table| table != tables[0]) {
        return false;
    }
    let Some(table) = tree.get_table(tables[0]) else {
        return false;
    };

    let same_section = |range: IndexRange, heading: u32| {
        let heading = heading as usize;
        (range.first < heading) == (range.last < heading)
    };
    let sections_match = match (row_indexes(tree, cells), column_indexes(tree, cells)) {
        (Ok(rows), Ok(columns)) => {
            same_section(rows, table.heading_rows()) && same_section(columns, table.heading_columns())
        }
        _ => false,
    };
    sections_match && is_selection_rectangular(tree, cells).unwrap_or(false)
}

/// Move the content of `remove` into `expand` and delete `remove`. An empty
/// `remove` contributes nothing; an empty `expand` loses its placeholder.
fn merge_table_cells(writer: &mut Writer<'_>, remove: NodeId, expand: NodeId) -> Result<()> {
    if !writer.tree().is_empty_cell(remove) {
        if writer.tree().is_empty_cell(expand) {
            writer.remove_children(expand)?;
        }
        writer.move_children(remove, expand)?;
    }
    writer.remove(remove)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{cell_at, grid, table_tree, table_tree_with};
    use doc_model::{CellSpec, TableBuilder};

    #[test]
    fn test_merge_right_concatenates_content() {
        let (mut tree, table) = table_tree(vec![vec!["A", "B"], vec!["C", "D"]]);
        let a = cell_at(&tree, table, 0, 0);
        let survivor = merge_cell(&mut Writer::new(&mut tree), a, MergeDirection::Right).unwrap();
        assert_eq!(survivor, Some(a));
        assert_eq!(grid(&tree, table), vec!["A|B[c2]", "C D"]);
        assert_eq!(tree.children_of(tree.table_rows(table)[0]).len(), 1);
    }

    #[test]
    fn test_merge_left_keeps_left_cell() {
        let (mut tree, table) = table_tree(vec![vec!["A", "B", "C"], vec!["x", "y", "z"]]);
        let a = cell_at(&tree, table, 0, 0);
        let b = cell_at(&tree, table, 0, 1);
        let survivor = merge_cell(&mut Writer::new(&mut tree), b, MergeDirection::Left).unwrap();
        assert_eq!(survivor, Some(a));
        assert_eq!(grid(&tree, table), vec!["A|B[c2] C", "x y z"]);
    }

    #[test]
    fn test_merge_down_and_up() {
        let (mut tree, table) = table_tree(vec![vec!["a", "b"], vec!["c", "d"], vec!["e", "f"]]);
        let a = cell_at(&tree, table, 0, 0);
        merge_cell(&mut Writer::new(&mut tree), a, MergeDirection::Down).unwrap();
        assert_eq!(grid(&tree, table), vec!["a|c[r2] b", "d", "e f"]);

        let e = cell_at(&tree, table, 2, 0);
        let survivor = merge_cell(&mut Writer::new(&mut tree), e, MergeDirection::Up).unwrap();
        assert_eq!(survivor, Some(a));
        assert_eq!(grid(&tree, table), vec!["a|c|e[r3] b", "d", "f"]);
    }

    #[test]
    fn test_empty_cells_merge_into_one_paragraph() {
        let (mut tree, table) = table_tree(vec![vec!["", "x"], vec!["", "y"]]);
        let top = cell_at(&tree, table, 0, 0);
        merge_cell(&mut Writer::new(&mut tree), top, MergeDirection::Down).unwrap();
        assert!(tree.is_empty_cell(top));

        let (mut tree, table) = table_tree(vec![vec!["", "B"], vec!["c", "d"]]);
        let a = cell_at(&tree, table, 0, 0);
        merge_cell(&mut Writer::new(&mut tree), a, MergeDirection::Right).unwrap();
        assert_eq!(grid(&tree, table), vec!["B[c2]", "c d"]);
    }

    #[test]
    fn test_merge_drops_column_no_cell_starts_in() {
        let (mut tree, table) = table_tree(vec![vec!["A", "B"]]);
        let a = cell_at(&tree, table, 0, 0);
        merge_cell(&mut Writer::new(&mut tree), a, MergeDirection::Right).unwrap();
        assert_eq!(tree.outline(table), r#"table[row[cell["A", "B"]]]"#);
    }

    #[test]
    fn test_merge_refused() {
        // Different cross-axis span
        let (tree, table) = table_tree(vec![
            vec![CellSpec::new("a").colspan(2)],
            vec!["b".into(), "c".into()],
        ]);
        let a = cell_at(&tree, table, 0, 0);
        assert_eq!(mergeable_cell(&tree, a, MergeDirection::Down).unwrap(), None);
        assert_eq!(mergeable_cell(&tree, a, MergeDirection::Up).unwrap(), None);
        assert_eq!(mergeable_cell(&tree, a, MergeDirection::Right).unwrap(), None);

        // Heading row boundary
        let fragment = TableBuilder::new(vec![vec!["a"], vec!["b"]]).heading_rows(1).build();
        let (tree, table) = table_tree_with(&fragment);
        let a = cell_at(&tree, table, 0, 0);
        assert_eq!(mergeable_cell(&tree, a, MergeDirection::Down).unwrap(), None);

        // Heading column boundary
        let fragment = TableBuilder::new(vec![vec!["a", "b", "c"]]).heading_columns(1).build();
        let (tree, table) = table_tree_with(&fragment);
        let a = cell_at(&tree, table, 0, 0);
        let b = cell_at(&tree, table, 0, 1);
        assert_eq!(mergeable_cell(&tree, a, MergeDirection::Right).unwrap(), None);
        assert!(mergeable_cell(&tree, b, MergeDirection::Right).unwrap().is_some());
    }

    #[test]
    fn test_merge_skips_non_touching_sibling() {
        // "d" follows "c" in its row but "b" covers the slot between them
        let (tree, table) = table_tree(vec![
            vec!["a".into(), CellSpec::new("b").rowspan(2), "x".into()],
            vec![CellSpec::new("c"), CellSpec::new("d")],
        ]);
        let c = cell_at(&tree, table, 1, 0);
        assert_eq!(mergeable_cell(&tree, c, MergeDirection::Right).unwrap(), None);
    }

    #[test]
    fn test_merge_rectangular_block() {
        let (mut tree, table) = table_tree(vec![vec!["a", "b", "c"], vec!["d", "e", "f"], vec!["g", "h", "i"]]);
        let block = [
            cell_at(&tree, table, 1, 1),
            cell_at(&tree, table, 0, 0),
            cell_at(&tree, table, 0, 1),
            cell_at(&tree, table, 1, 0),
        ];
        assert!(can_merge_cells(&tree, &block));
        let survivor = merge_cells(&mut Writer::new(&mut tree), &block).unwrap();
        assert_eq!(survivor, block[1]);
        assert_eq!(grid(&tree, table), vec!["a|b|d|e[c2r2] c", "f", "g h i"]);
    }

    #[test]
    fn test_can_merge_cells_rules() {
        let fragment = TableBuilder::new(vec![vec!["a", "b"], vec!["c", "d"]]).heading_rows(1).build();
        let (tree, table) = table_tree_with(&fragment);
        let a = cell_at(&tree, table, 0, 0);
        let b = cell_at(&tree, table, 0, 1);
        let c = cell_at(&tree, table, 1, 0);
        let d = cell_at(&tree, table, 1, 1);
        assert!(can_merge_cells(&tree, &[a, b]));
        assert!(!can_merge_cells(&tree, &[a]));
        assert!(!can_merge_cells(&tree, &[a, c]));
        assert!(!can_merge_cells(&tree, &[b, c, d]));
        assert!(can_merge_cells(&tree, &[c, d]));
    }

    #[test]
    fn test_repeated_cell_is_not_mergeable() {
        let (mut tree, table) = table_tree(vec![
            vec!["x".into(), CellSpec::new("y").rowspan(2)],
            vec![CellSpec::new("z")],
        ]);
        let x = cell_at(&tree, table, 0, 0);
        let y = cell_at(&tree, table, 0, 1);
        let before = tree.outline(table);

        assert!(!can_merge_cells(&tree, &[x, y, x]));
        assert!(!can_merge_cells(&tree, &[x, x]));
        assert!(matches!(
            merge_cells(&mut Writer::new(&mut tree), &[x, y, x]),
            Err(TableError::DuplicateCell { .. })
        ));
        assert_eq!(tree.outline(table), before);
    }

    #[test]
    fn test_merge_whole_column_removes_emptied_row() {
        let (mut tree, table) = table_tree(vec![vec!["a"], vec!["b"]]);
        let a = cell_at(&tree, table, 0, 0);
        merge_cell(&mut Writer::new(&mut tree), a, MergeDirection::Down).unwrap();
        assert_eq!(grid(&tree, table), vec!["a|b"]);
    }
}
