//! Grid traversal over a table's rows and cells
//!
//! A table is stored sparsely: each row lists only the cells anchored in it, and
//! a cell with `colspan`/`rowspan` covers further grid slots. [`TableWalker`]
//! simulates the layout row by row and yields one [`TableSlot`] per grid
//! position it visits, resolving which cell occupies it.
//!
//! The walker borrows the tree immutably. Operations that edit the table
//! collect the slots they need first and mutate afterwards.

use doc_model::{DocumentTree, NodeId};
use std::collections::{HashMap, HashSet};

/// Bounds and mode of a walk. All bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkerOptions {
    /// Walk a single row; overrides `start_row` and `end_row`
    pub row: Option<usize>,
    pub start_row: Option<usize>,
    pub end_row: Option<usize>,
    /// Walk a single column; overrides `start_column` and `end_column`
    pub column: Option<usize>,
    pub start_column: Option<usize>,
    pub end_column: Option<usize>,
    /// Also yield slots covered by a span, not only anchor slots
    pub include_all_slots: bool,
}

impl WalkerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    pub fn start_row(mut self, row: usize) -> Self {
        self.start_row = Some(row);
        self
    }

    pub fn end_row(mut self, row: usize) -> Self {
        self.end_row = Some(row);
        self
    }

    pub fn column(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }

    pub fn start_column(mut self, column: usize) -> Self {
        self.start_column = Some(column);
        self
    }

    pub fn end_column(mut self, column: usize) -> Self {
        self.end_column = Some(column);
        self
    }

    pub fn include_all_slots(mut self) -> Self {
        self.include_all_slots = true;
        self
    }
}

/// One grid position and the cell occupying it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSlot {
    /// The anchor cell covering this slot
    pub cell: NodeId,
    pub row: usize,
    pub column: usize,
    pub cell_anchor_row: usize,
    pub cell_anchor_column: usize,
    /// Colspan of the covering cell
    pub cell_width: usize,
    /// Rowspan of the covering cell
    pub cell_height: usize,
    /// Row node at `row`
    pub row_id: NodeId,
    /// Child index in `row_id` of the cell at this slot, or where a cell for
    /// this slot would be inserted
    pub cell_index: usize,
}

impl TableSlot {
    /// True for the top-left slot of the covering cell
    pub fn is_anchor(&self) -> bool {
        self.row == self.cell_anchor_row && self.column == self.cell_anchor_column
    }
}

#[derive(Debug, Clone, Copy)]
struct SpanData {
    cell: NodeId,
    row: usize,
    column: usize,
    width: usize,
    height: usize,
}

/// Lazy row-major iterator over the slots of one table
#[derive(Debug)]
pub struct TableWalker<'a> {
    tree: &'a DocumentTree,
    table: NodeId,
    children: &'a [NodeId],
    start_row: usize,
    end_row: Option<usize>,
    start_column: usize,
    end_column: Option<usize>,
    include_all_slots: bool,
    skip_rows: HashSet<usize>,
    /// Grid row under the cursor
    row: usize,
    /// Table child index of the current row
    child_index: usize,
    column: usize,
    cell_index: usize,
    spanned_cells: HashMap<usize, HashMap<usize, SpanData>>,
    next_cell_at_column: Option<usize>,
    jumped_to_start_row: bool,
}

impl<'a> TableWalker<'a> {
    pub fn new(tree: &'a DocumentTree, table: NodeId, options: WalkerOptions) -> Self {
        let (start_row, end_row) = match options.row {
            Some(row) => (row, Some(row)),
            None => (options.start_row.unwrap_or(0), options.end_row),
        };
        let (start_column, end_column) = match options.column {
            Some(column) => (column, Some(column)),
            None => (options.start_column.unwrap_or(0), options.end_column),
        };

        Self {
            tree,
            table,
            children: tree.children_of(table),
            start_row,
            end_row,
            start_column,
            end_column,
            include_all_slots: options.include_all_slots,
            skip_rows: HashSet::new(),
            row: 0,
            child_index: 0,
            column: 0,
            cell_index: 0,
            spanned_cells: HashMap::new(),
            next_cell_at_column: None,
            jumped_to_start_row: false,
        }
    }

    /// Walk every anchor slot of the table
    pub fn anchors(tree: &'a DocumentTree, table: NodeId) -> Self {
        Self::new(tree, table, WalkerOptions::new())
    }

    /// Stop emitting slots of `row`. Span bookkeeping for the row continues.
    pub fn skip_row(&mut self, row: usize) {
        self.skip_rows.insert(row);
    }

    fn is_over_end_row(&self) -> bool {
        self.end_row.map_or(false, |end| self.row > end)
    }

    fn is_over_end_column(&self) -> bool {
        self.end_column.map_or(false, |end| self.column > end)
    }

    fn should_skip_slot(&self) -> bool {
        self.skip_rows.contains(&self.row)
            || self.row < self.start_row
            || self.column < self.start_column
            || self.is_over_end_column()
    }

    fn advance_to_next_row(&mut self) {
        self.row += 1;
        self.child_index += 1;
        self.column = 0;
        self.cell_index = 0;
        self.next_cell_at_column = None;
    }

    fn spanned(&self) -> Option<SpanData> {
        self.spanned_cells
            .get(&self.row)
            .and_then(|columns| columns.get(&self.column))
            .copied()
    }

    fn record_spans(&mut self, data: SpanData) {
        for row in data.row..data.row + data.height {
            for column in data.column..data.column + data.width {
                if row != data.row || column != data.column {
                    self.spanned_cells.entry(row).or_default().insert(column, data);
                }
            }
        }
    }

    fn can_jump_to_start_row(&self) -> bool {
        self.start_row > 0 && !self.jumped_to_start_row
    }

    /// Resume from the closest row at or above `start_row` whose cells fill the
    /// same width as the first row. Such a row is assumed not to be covered by
    /// spans from above; this holds for tables built by the editor but is not
    /// checked.
    fn jump_to_start_row(&mut self) {
        let rows = self.tree.table_rows(self.table);
        let first_length = self.row_length(rows.first().copied());
        let mut row = self.start_row;
        while row > 0 && self.row_length(rows.get(row).copied()) != first_length {
            row -= 1;
        }
        self.row = row;
        self.child_index = rows
            .get(row)
            .and_then(|id| self.children.iter().position(|child| child == id))
            .unwrap_or(self.children.len());
        self.jumped_to_start_row = true;
    }

    fn row_length(&self, row: Option<NodeId>) -> Option<usize> {
        let row = self.tree.get_table_row(row?)?;
        Some(
            row.cells()
                .iter()
                .filter_map(|&cell| self.tree.get_table_cell(cell))
                .map(|cell| cell.colspan() as usize)
                .sum(),
        )
    }

    fn slot(&self, row_id: NodeId, data: SpanData) -> TableSlot {
        TableSlot {
            cell: data.cell,
            row: self.row,
            column: self.column,
            cell_anchor_row: data.row,
            cell_anchor_column: data.column,
            cell_width: data.width,
            cell_height: data.height,
            row_id,
            cell_index: self.cell_index,
        }
    }
}

impl Iterator for TableWalker<'_> {
    type Item = TableSlot;

    fn next(&mut self) -> Option<TableSlot> {
        loop {
            if self.can_jump_to_start_row() {
                self.jump_to_start_row();
            }

            let row_id = *self.children.get(self.child_index)?;
            if self.is_over_end_row() {
                return None;
            }

            // Caption and column group are not part of the grid
            let Some(row) = self.tree.get_table_row(row_id) else {
                self.child_index += 1;
                continue;
            };

            if self.is_over_end_column() {
                self.advance_to_next_row();
                continue;
            }

            let mut out = None;
            if let Some(span) = self.spanned() {
                if self.include_all_slots && !self.should_skip_slot() {
                    out = Some(self.slot(row_id, span));
                }
            } else {
                let cell = row
                    .cells()
                    .get(self.cell_index)
                    .and_then(|&id| self.tree.get_table_cell(id).map(|cell| (id, cell)));
                let Some((cell_id, cell)) = cell else {
                    // Short row: the rest of it is empty
                    self.advance_to_next_row();
                    continue;
                };

                let data = SpanData {
                    cell: cell_id,
                    row: self.row,
                    column: self.column,
                    width: cell.colspan() as usize,
                    height: cell.rowspan() as usize,
                };
                if data.width > 1 || data.height > 1 {
                    self.record_spans(data);
                }
                if !self.should_skip_slot() {
                    out = Some(self.slot(row_id, data));
                }
                self.next_cell_at_column = Some(self.column + data.width);
            }

            self.column += 1;
            if Some(self.column) == self.next_cell_at_column {
                self.cell_index += 1;
            }

            if out.is_some() {
                return out;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::table_tree;
    use doc_model::CellSpec;

    fn positions(walker: TableWalker<'_>) -> Vec<(usize, usize, bool)> {
        walker.map(|slot| (slot.row, slot.column, slot.is_anchor())).collect()
    }

    //   +----+----+----+
    //   | a       | b  |
    //   +----+----+----+
    //   | c  | d  | e  |
    //   +    +----+----+
    //   |    | f       |
    //   +----+----+----+
    fn spanned_tree() -> (DocumentTree, NodeId) {
        table_tree(vec![
            vec![CellSpec::new("a").colspan(2), CellSpec::new("b")],
            vec![CellSpec::new("c").rowspan(2), "d".into(), "e".into()],
            vec![CellSpec::new("f").colspan(2)],
        ])
    }

    #[test]
    fn test_anchor_slots() {
        let (tree, table) = spanned_tree();
        let walker = TableWalker::anchors(&tree, table);
        assert_eq!(
            positions(walker),
            vec![
                (0, 0, true),
                (0, 2, true),
                (1, 0, true),
                (1, 1, true),
                (1, 2, true),
                (2, 1, true),
            ]
        );
    }

    #[test]
    fn test_all_slots() {
        let (tree, table) = spanned_tree();
        let walker = TableWalker::new(&tree, table, WalkerOptions::new().include_all_slots());
        let slots: Vec<TableSlot> = walker.collect();
        assert_eq!(slots.len(), 9);

        let covered = slots[1];
        assert_eq!((covered.row, covered.column), (0, 1));
        assert_eq!((covered.cell_anchor_row, covered.cell_anchor_column), (0, 0));
        assert_eq!(covered.cell_width, 2);

        // Slot (2, 0) is covered by "c"; "f" sits at child index 0 of row 2
        let covered = slots[6];
        assert!(!covered.is_anchor());
        assert_eq!(tree.cell_text(covered.cell), "c");
        assert_eq!(covered.cell_index, 0);
        assert_eq!(tree.cell_text(slots[7].cell), "f");
        assert_eq!(slots[7].cell_index, 0);
    }

    #[test]
    fn test_row_and_column_bounds() {
        let (tree, table) = spanned_tree();
        let walker = TableWalker::new(&tree, table, WalkerOptions::new().row(2).include_all_slots());
        assert_eq!(positions(walker), vec![(2, 0, false), (2, 1, true), (2, 2, false)]);

        let walker = TableWalker::new(&tree, table, WalkerOptions::new().column(1).include_all_slots());
        assert_eq!(positions(walker), vec![(0, 1, false), (1, 1, true), (2, 1, true)]);

        let walker = TableWalker::new(&tree, table, WalkerOptions::new().start_column(1).end_row(1));
        assert_eq!(positions(walker), vec![(0, 2, true), (1, 1, true), (1, 2, true)]);
    }

    #[test]
    fn test_skip_row_while_walking() {
        let (tree, table) = spanned_tree();
        let mut walker = TableWalker::new(&tree, table, WalkerOptions::new().column(0).include_all_slots());
        let mut seen = Vec::new();
        while let Some(slot) = walker.next() {
            if slot.cell_height > 1 {
                walker.skip_row(slot.row + 1);
            }
            seen.push(slot.row);
        }
        assert_eq!(seen, vec![0, 1]);
    }

    #[test]
    fn test_short_row_ends_early() {
        let (tree, table) = table_tree(vec![vec!["a", "b", "c"], vec!["d"]]);
        let walker = TableWalker::new(&tree, table, WalkerOptions::new().include_all_slots());
        assert_eq!(positions(walker).len(), 4);
    }

    #[test]
    fn test_caption_is_skipped() {
        let mut tree = DocumentTree::new();
        let root = tree.root_id();
        let fragment = doc_model::TableBuilder::new(vec![vec!["a"], vec!["b"]])
            .caption("caption")
            .build();
        let table = doc_model::Writer::new(&mut tree)
            .insert_fragment(&fragment, root, None)
            .unwrap();
        assert_eq!(TableWalker::anchors(&tree, table).count(), 2);
    }

    #[test]
    fn test_start_row_jump_keeps_spans_of_plausible_rows() {
        let (tree, table) = table_tree(vec![
            vec!["a".into(), "b".into()],
            vec!["c".into(), "d".into()],
            vec![CellSpec::new("e").rowspan(2), "f".into()],
            vec!["g".into()],
        ]);
        let walker = TableWalker::new(&tree, table, WalkerOptions::new().start_row(3).include_all_slots());
        let slots: Vec<TableSlot> = walker.collect();
        assert_eq!(slots.len(), 2);
        assert_eq!(tree.cell_text(slots[0].cell), "e");
        assert_eq!(tree.cell_text(slots[1].cell), "g");
        assert_eq!(slots[1].column, 1);
    }
}
