//! Table editing commands
//!
//! Each command names the cells or table it works on explicitly and wraps one
//! structural operation with an applicability check:
//! - InsertTable: Create a table of empty cells
//! - InsertRow/InsertColumn: Add a row or column next to the selected cells
//! - RemoveRows/RemoveColumns: Delete the rows or columns the cells occupy
//! - SplitCell/MergeCell/MergeCells: Change cell spans
//! - SetHeadingRows/SetHeadingColumns: Move heading boundaries
//! - ResizeColumn: Change one column width
//! - PasteTable: Paste a copied table over a cell selection

use crate::clipboard::paste_table;
use crate::column_widths::resize_column;
use crate::common::cell_context;
use crate::config::TableConfig;
use crate::geometry::{column_count, column_indexes, row_count, row_indexes};
use crate::headings::{set_heading_columns, set_heading_rows};
use crate::merge::{can_merge_cells, merge_cell, merge_cells, mergeable_cell, MergeDirection};
use crate::split::{split_cell_horizontally, split_cell_vertically};
use crate::structure::{create_table, insert_columns, insert_rows, remove_columns, remove_rows, TableOptions};
use crate::{Result, TableError};
use doc_model::{DocumentTree, NodeFragment, NodeId, NodeType, Writer};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// What [`crate::TableEditor::execute`] did with a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandOutcome {
    Applied,
    /// The command was disabled for the current document; nothing changed
    NotApplicable,
}

/// Trait for all table commands
pub trait TableCommand: Debug {
    /// Whether the command can run against `tree`
    fn is_enabled(&self, tree: &DocumentTree) -> bool;

    /// Perform the edit
    fn execute(&self, writer: &mut Writer<'_>, config: &TableConfig) -> Result<()>;

    /// Get a display name for this command
    fn display_name(&self) -> &str;
}

/// The table shared by all `cells`, if they are all live cells of one table
fn selection_table(tree: &DocumentTree, cells: &[NodeId]) -> Option<NodeId> {
    let (&first, rest) = cells.split_first()?;
    let (table, _) = cell_context(tree, first).ok()?;
    rest.iter()
        .all(|&cell| matches!(cell_context(tree, cell), Ok((t, _)) if t == table))
        .then_some(table)
}

fn require_selection_table(tree: &DocumentTree, cells: &[NodeId], operation: &'static str) -> Result<NodeId> {
    if cells.is_empty() {
        return Err(TableError::EmptySelection { operation });
    }
    selection_table(tree, cells).ok_or(TableError::MixedTables { operation })
}

// =============================================================================
// InsertTable Command
// =============================================================================

/// Insert a new table of empty cells
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsertTable {
    /// Number of rows (None = configured default)
    pub rows: Option<usize>,
    /// Number of columns (None = configured default)
    pub columns: Option<usize>,
    pub heading_rows: usize,
    pub heading_columns: usize,
    /// Container of the new table (None = document root)
    pub parent: Option<NodeId>,
    /// Child index within the container (None = append)
    pub insert_index: Option<usize>,
}

impl InsertTable {
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows: Some(rows),
            columns: Some(columns),
            ..Self::default()
        }
    }

    pub fn with_headings(mut self, heading_rows: usize, heading_columns: usize) -> Self {
        self.heading_rows = heading_rows;
        self.heading_columns = heading_columns;
        self
    }

    /// Nest the table inside `parent`, e.g. a table cell
    pub fn in_parent(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn at_index(mut self, index: usize) -> Self {
        self.insert_index = Some(index);
        self
    }
}

impl TableCommand for InsertTable {
    fn is_enabled(&self, tree: &DocumentTree) -> bool {
        let parent = self.parent.unwrap_or_else(|| tree.root_id());
        tree.node_type(parent)
            .is_some_and(|parent_type| parent_type.accepts(NodeType::Table))
    }

    fn execute(&self, writer: &mut Writer<'_>, config: &TableConfig) -> Result<()> {
        let parent = self.parent.unwrap_or_else(|| writer.tree().root_id());
        let options = TableOptions::new(
            self.rows.unwrap_or(config.default_rows),
            self.columns.unwrap_or(config.default_columns),
        )
        .with_headings(self.heading_rows, self.heading_columns);
        create_table(writer, parent, self.insert_index, options)?;
        Ok(())
    }

    fn display_name(&self) -> &str {
        "Insert Table"
    }
}

// =============================================================================
// Row and Column Insertion
// =============================================================================

/// Insert one row above the topmost or below the bottommost selected row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertRow {
    pub cells: Vec<NodeId>,
    pub above: bool,
}

impl InsertRow {
    pub fn above(cells: Vec<NodeId>) -> Self {
        Self { cells, above: true }
    }

    pub fn below(cells: Vec<NodeId>) -> Self {
        Self { cells, above: false }
    }
}

impl TableCommand for InsertRow {
    fn is_enabled(&self, tree: &DocumentTree) -> bool {
        selection_table(tree, &self.cells).is_some()
    }

    fn execute(&self, writer: &mut Writer<'_>, _config: &TableConfig) -> Result<()> {
        let table = require_selection_table(writer.tree(), &self.cells, "insert_row")?;
        let rows = row_indexes(writer.tree(), &self.cells)?;
        let at = if self.above { rows.first } else { rows.last + 1 };
        insert_rows(writer, table, at, 1, Some(!self.above))
    }

    fn display_name(&self) -> &str {
        if self.above {
            "Insert Row Above"
        } else {
            "Insert Row Below"
        }
    }
}

/// Insert one column left of the leftmost or right of the rightmost selected
/// column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertColumn {
    pub cells: Vec<NodeId>,
    pub before: bool,
}

impl InsertColumn {
    pub fn left(cells: Vec<NodeId>) -> Self {
        Self { cells, before: true }
    }

    pub fn right(cells: Vec<NodeId>) -> Self {
        Self { cells, before: false }
    }
}

impl TableCommand for InsertColumn {
    fn is_enabled(&self, tree: &DocumentTree) -> bool {
        selection_table(tree, &self.cells).is_some()
    }

    fn execute(&self, writer: &mut Writer<'_>, _config: &TableConfig) -> Result<()> {
        let table = require_selection_table(writer.tree(), &self.cells, "insert_column")?;
        let columns = column_indexes(writer.tree(), &self.cells)?;
        let at = if self.before { columns.first } else { columns.last + 1 };
        insert_columns(writer, table, at, 1)
    }

    fn display_name(&self) -> &str {
        if self.before {
            "Insert Column Left"
        } else {
            "Insert Column Right"
        }
    }
}

// =============================================================================
// Row and Column Removal
// =============================================================================

/// Remove every row the selected cells occupy. Disabled when that would
/// remove all rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveRows {
    pub cells: Vec<NodeId>,
}

impl TableCommand for RemoveRows {
    fn is_enabled(&self, tree: &DocumentTree) -> bool {
        let Some(table) = selection_table(tree, &self.cells) else {
            return false;
        };
        let Ok(rows) = row_indexes(tree, &self.cells) else {
            return false;
        };
        !(rows.first == 0 && rows.last + 1 >= row_count(tree, table))
    }

    fn execute(&self, writer: &mut Writer<'_>, _config: &TableConfig) -> Result<()> {
        let table = require_selection_table(writer.tree(), &self.cells, "remove_rows")?;
        let rows = row_indexes(writer.tree(), &self.cells)?;
        remove_rows(writer, table, rows.first, rows.len())
    }

    fn display_name(&self) -> &str {
        "Delete Rows"
    }
}

/// Remove every column the selected cells occupy. Disabled when that would
/// remove all columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveColumns {
    pub cells: Vec<NodeId>,
}

impl TableCommand for RemoveColumns {
    fn is_enabled(&self, tree: &DocumentTree) -> bool {
        let Some(table) = selection_table(tree, &self.cells) else {
            return false;
        };
        let Ok(columns) = column_indexes(tree, &self.cells) else {
            return false;
        };
        !(columns.first == 0 && columns.last + 1 >= column_count(tree, table))
    }

    fn execute(&self, writer: &mut Writer<'_>, _config: &TableConfig) -> Result<()> {
        let table = require_selection_table(writer.tree(), &self.cells, "remove_columns")?;
        let columns = column_indexes(writer.tree(), &self.cells)?;
        remove_columns(writer, table, columns.first, columns.len())
    }

    fn display_name(&self) -> &str {
        "Delete Columns"
    }
}

// =============================================================================
// Split and Merge
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitDirection {
    /// Into cells stacked on top of each other
    Horizontally,
    /// Into cells side by side
    Vertically,
}

/// Split one cell into `count` cells
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitCell {
    pub cell: NodeId,
    pub direction: SplitDirection,
    pub count: usize,
}

impl TableCommand for SplitCell {
    fn is_enabled(&self, tree: &DocumentTree) -> bool {
        self.count > 0 && cell_context(tree, self.cell).is_ok()
    }

    fn execute(&self, writer: &mut Writer<'_>, _config: &TableConfig) -> Result<()> {
        match self.direction {
            SplitDirection::Horizontally => split_cell_horizontally(writer, self.cell, self.count),
            SplitDirection::Vertically => split_cell_vertically(writer, self.cell, self.count),
        }
    }

    fn display_name(&self) -> &str {
        "Split Cell"
    }
}

/// Merge a cell with its neighbour in one direction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeCell {
    pub cell: NodeId,
    pub direction: MergeDirection,
}

impl TableCommand for MergeCell {
    fn is_enabled(&self, tree: &DocumentTree) -> bool {
        matches!(mergeable_cell(tree, self.cell, self.direction), Ok(Some(_)))
    }

    fn execute(&self, writer: &mut Writer<'_>, _config: &TableConfig) -> Result<()> {
        merge_cell(writer, self.cell, self.direction)?;
        Ok(())
    }

    fn display_name(&self) -> &str {
        "Merge Cell"
    }
}

/// Merge a rectangular selection into one cell
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeCells {
    pub cells: Vec<NodeId>,
}

impl TableCommand for MergeCells {
    fn is_enabled(&self, tree: &DocumentTree) -> bool {
        can_merge_cells(tree, &self.cells)
    }

    fn execute(&self, writer: &mut Writer<'_>, _config: &TableConfig) -> Result<()> {
        merge_cells(writer, &self.cells)?;
        Ok(())
    }

    fn display_name(&self) -> &str {
        "Merge Cells"
    }
}

// =============================================================================
// Headings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetHeadingRows {
    pub table: NodeId,
    pub count: usize,
}

impl TableCommand for SetHeadingRows {
    fn is_enabled(&self, tree: &DocumentTree) -> bool {
        tree.get_table(self.table).is_some() && self.count <= row_count(tree, self.table)
    }

    fn execute(&self, writer: &mut Writer<'_>, _config: &TableConfig) -> Result<()> {
        set_heading_rows(writer, self.table, self.count)
    }

    fn display_name(&self) -> &str {
        "Set Heading Rows"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetHeadingColumns {
    pub table: NodeId,
    pub count: usize,
}

impl TableCommand for SetHeadingColumns {
    fn is_enabled(&self, tree: &DocumentTree) -> bool {
        tree.get_table(self.table).is_some() && self.count <= column_count(tree, self.table)
    }

    fn execute(&self, writer: &mut Writer<'_>, _config: &TableConfig) -> Result<()> {
        set_heading_columns(writer, self.table, self.count)
    }

    fn display_name(&self) -> &str {
        "Set Heading Columns"
    }
}

// =============================================================================
// Column Width
// =============================================================================

/// Set one column to `percent` of the table width
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResizeColumn {
    pub table: NodeId,
    pub column: usize,
    pub percent: f64,
}

impl TableCommand for ResizeColumn {
    fn is_enabled(&self, tree: &DocumentTree) -> bool {
        tree.get_table(self.table).is_some() && self.column < column_count(tree, self.table)
    }

    fn execute(&self, writer: &mut Writer<'_>, config: &TableConfig) -> Result<()> {
        resize_column(
            writer,
            self.table,
            self.column,
            self.percent,
            config.min_column_width_percent,
        )
    }

    fn display_name(&self) -> &str {
        "Resize Column"
    }
}

// =============================================================================
// Paste
// =============================================================================

/// Paste a copied table over the selected cells
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasteTable {
    pub fragment: NodeFragment,
    pub cells: Vec<NodeId>,
}

impl TableCommand for PasteTable {
    fn is_enabled(&self, tree: &DocumentTree) -> bool {
        self.fragment.node_type() == NodeType::Table && selection_table(tree, &self.cells).is_some()
    }

    fn execute(&self, writer: &mut Writer<'_>, _config: &TableConfig) -> Result<()> {
        paste_table(writer, &self.fragment, &self.cells)?;
        Ok(())
    }

    fn display_name(&self) -> &str {
        "Paste Table"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{cell_at, table_tree};
    use doc_model::{CellSpec, TableBuilder};

    #[test]
    fn test_insert_table_needs_block_container() {
        let (tree, table) = table_tree(vec![vec!["a"]]);
        assert!(InsertTable::new(2, 2).is_enabled(&tree));
        assert!(InsertTable::new(2, 2)
            .in_parent(cell_at(&tree, table, 0, 0))
            .is_enabled(&tree));
        let row = tree.table_rows(table)[0];
        assert!(!InsertTable::new(2, 2).in_parent(row).is_enabled(&tree));
    }

    #[test]
    fn test_remove_disabled_for_whole_table() {
        let (tree, table) = table_tree(vec![vec!["a", "b"], vec!["c", "d"]]);
        let a = cell_at(&tree, table, 0, 0);
        let c = cell_at(&tree, table, 1, 0);
        let b = cell_at(&tree, table, 0, 1);

        assert!(RemoveRows { cells: vec![a] }.is_enabled(&tree));
        assert!(!RemoveRows { cells: vec![a, c] }.is_enabled(&tree));
        assert!(RemoveColumns { cells: vec![a, c] }.is_enabled(&tree));
        assert!(!RemoveColumns { cells: vec![a, b] }.is_enabled(&tree));
        assert!(!RemoveRows { cells: vec![] }.is_enabled(&tree));
    }

    #[test]
    fn test_selection_must_share_a_table() {
        let (mut tree, table) = table_tree(vec![vec!["a"]]);
        let a = cell_at(&tree, table, 0, 0);
        let other = {
            let mut writer = Writer::new(&mut tree);
            let root = writer.tree().root_id();
            let fragment = TableBuilder::new(vec![vec!["x"]]).build();
            writer.insert_fragment(&fragment, root, None).unwrap()
        };
        let x = cell_at(&tree, other, 0, 0);

        assert!(!InsertRow::above(vec![a, x]).is_enabled(&tree));
        assert!(InsertRow::below(vec![a]).is_enabled(&tree));
        assert!(matches!(
            InsertColumn::left(vec![a, x]).execute(&mut Writer::new(&mut tree), &TableConfig::default()),
            Err(TableError::MixedTables { .. })
        ));
    }

    #[test]
    fn test_merge_commands_follow_geometry() {
        let (tree, table) = table_tree(vec![
            vec![CellSpec::new("a"), CellSpec::new("b")],
            vec![CellSpec::new("c").colspan(2)],
        ]);
        let a = cell_at(&tree, table, 0, 0);
        let b = cell_at(&tree, table, 0, 1);
        let c = cell_at(&tree, table, 1, 0);

        assert!(MergeCell { cell: a, direction: MergeDirection::Right }.is_enabled(&tree));
        assert!(!MergeCell { cell: a, direction: MergeDirection::Down }.is_enabled(&tree));
        assert!(MergeCells { cells: vec![a, b] }.is_enabled(&tree));
        assert!(!MergeCells { cells: vec![a, c] }.is_enabled(&tree));
    }

    #[test]
    fn test_heading_and_resize_bounds() {
        let (tree, table) = table_tree(vec![vec!["a", "b"]]);
        assert!(SetHeadingRows { table, count: 1 }.is_enabled(&tree));
        assert!(!SetHeadingRows { table, count: 2 }.is_enabled(&tree));
        assert!(SetHeadingColumns { table, count: 2 }.is_enabled(&tree));
        assert!(!ResizeColumn { table, column: 2, percent: 10.0 }.is_enabled(&tree));
    }

    #[test]
    fn test_paste_requires_table_fragment() {
        let (tree, table) = table_tree(vec![vec!["a"]]);
        let a = cell_at(&tree, table, 0, 0);
        let paste = PasteTable {
            fragment: NodeFragment::paragraph("x"),
            cells: vec![a],
        };
        assert!(!paste.is_enabled(&tree));
        let paste = PasteTable {
            fragment: TableBuilder::new(vec![vec!["x"]]).build(),
            cells: vec![a],
        };
        assert!(paste.is_enabled(&tree));
    }
}
