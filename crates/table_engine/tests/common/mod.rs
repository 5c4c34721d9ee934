#![allow(dead_code)]

use doc_model::{DocumentTree, NodeFragment, NodeId, TableBuilder, Writer};
use table_engine::{TableConfig, TableEditor, TableWalker};
use tracing_subscriber::EnvFilter;

/// Route engine logs to the test output; filtered by `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// An editor whose document holds the given tables, in order
pub fn editor_with(fragments: &[NodeFragment], config: TableConfig) -> (TableEditor, Vec<NodeId>) {
    let mut tree = DocumentTree::new();
    let root = tree.root_id();
    let mut writer = Writer::new(&mut tree);
    let tables = fragments
        .iter()
        .map(|fragment| writer.insert_fragment(fragment, root, None).unwrap())
        .collect();
    (TableEditor::with_config(tree, config), tables)
}

pub fn single_table<R, C>(rows: impl IntoIterator<Item = R>) -> (TableEditor, NodeId)
where
    R: IntoIterator<Item = C>,
    C: Into<doc_model::CellSpec>,
{
    let (editor, tables) = editor_with(&[TableBuilder::new(rows).build()], TableConfig::default());
    (editor, tables[0])
}

/// The `index`-th cell element of row `row`
pub fn cell(tree: &DocumentTree, table: NodeId, row: usize, index: usize) -> NodeId {
    let row = tree.table_rows(table)[row];
    tree.children_of(row)[index]
}

/// Rows as strings: cell texts joined by spaces, `[]` for empty cells, `|`
/// between paragraphs, `[c2]`/`[r2]`/`[c2r2]` for spans
pub fn grid(tree: &DocumentTree, table: NodeId) -> Vec<String> {
    tree.table_rows(table)
        .into_iter()
        .map(|row| {
            tree.children_of(row)
                .iter()
                .map(|&id| {
                    let text = tree.cell_text(id).replace('\n', "|");
                    let mut out = if text.is_empty() { "[]".to_string() } else { text };
                    let cell = tree.get_table_cell(id).unwrap();
                    match (cell.colspan(), cell.rowspan()) {
                        (1, 1) => {}
                        (c, 1) => out.push_str(&format!("[c{}]", c)),
                        (1, r) => out.push_str(&format!("[r{}]", r)),
                        (c, r) => out.push_str(&format!("[c{}r{}]", c, r)),
                    }
                    out
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

/// Occupied slots per row, counting cells reaching down from rows above
pub fn row_lengths(tree: &DocumentTree, table: NodeId) -> Vec<usize> {
    let rows = tree.table_rows(table).len();
    let mut lengths = vec![0; rows];
    for slot in TableWalker::anchors(tree, table) {
        for length in lengths.iter_mut().take(slot.row + slot.cell_height).skip(slot.row) {
            *length += slot.cell_width;
        }
    }
    lengths
}
