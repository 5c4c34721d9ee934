//! Grid invariants under random command sequences

mod common;

use common::{row_lengths, single_table};
use doc_model::{ColumnWidth, DocumentTree, NodeId};
use proptest::prelude::*;
use table_engine::{
    column_count, crop_table, normalize_column_widths, round2, CommandOutcome, CropDimensions, InsertColumn,
    InsertRow, MergeCell, MergeCells, MergeDirection, RemoveColumns, RemoveRows, SetHeadingColumns,
    SetHeadingRows, SplitCell, SplitDirection, TableCommand, TableEditor,
};

#[derive(Debug, Clone)]
enum Op {
    InsertRow(usize, bool),
    InsertColumn(usize, bool),
    RemoveRow(usize),
    RemoveColumn(usize),
    Split(usize, bool, usize),
    Merge(usize, u8),
    MergeBlock(usize, usize),
    MergeBlock3(usize, usize, usize),
    HeadingRows(usize),
    HeadingColumns(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<usize>(), any::<bool>()).prop_map(|(c, b)| Op::InsertRow(c, b)),
        (any::<usize>(), any::<bool>()).prop_map(|(c, b)| Op::InsertColumn(c, b)),
        any::<usize>().prop_map(Op::RemoveRow),
        any::<usize>().prop_map(Op::RemoveColumn),
        (any::<usize>(), any::<bool>(), 2usize..4).prop_map(|(c, b, n)| Op::Split(c, b, n)),
        (any::<usize>(), 0u8..4).prop_map(|(c, d)| Op::Merge(c, d)),
        (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::MergeBlock(a, b)),
        (any::<usize>(), any::<usize>(), any::<usize>()).prop_map(|(a, b, c)| Op::MergeBlock3(a, b, c)),
        (0usize..5).prop_map(Op::HeadingRows),
        (0usize..5).prop_map(Op::HeadingColumns),
    ]
}

fn width_strategy() -> impl Strategy<Value = ColumnWidth> {
    prop_oneof![
        (1.0f64..100.0).prop_map(ColumnWidth::Percent),
        Just(ColumnWidth::Auto),
    ]
}

/// Every cell element of the table, row by row
fn all_cells(tree: &DocumentTree, table: NodeId) -> Vec<NodeId> {
    tree.table_rows(table)
        .into_iter()
        .flat_map(|row| tree.children_of(row).to_vec())
        .collect()
}

fn command_for(tree: &DocumentTree, table: NodeId, op: &Op) -> Option<Box<dyn TableCommand>> {
    let cells = all_cells(tree, table);
    let pick = |i: usize| (!cells.is_empty()).then(|| cells[i % cells.len()]);
    let command: Box<dyn TableCommand> = match *op {
        Op::InsertRow(i, above) => Box::new(InsertRow {
            cells: vec![pick(i)?],
            above,
        }),
        Op::InsertColumn(i, before) => Box::new(InsertColumn {
            cells: vec![pick(i)?],
            before,
        }),
        Op::RemoveRow(i) => Box::new(RemoveRows { cells: vec![pick(i)?] }),
        Op::RemoveColumn(i) => Box::new(RemoveColumns { cells: vec![pick(i)?] }),
        Op::Split(i, vertical, count) => Box::new(SplitCell {
            cell: pick(i)?,
            direction: if vertical {
                SplitDirection::Vertically
            } else {
                SplitDirection::Horizontally
            },
            count,
        }),
        Op::Merge(i, direction) => Box::new(MergeCell {
            cell: pick(i)?,
            direction: match direction {
                0 => MergeDirection::Up,
                1 => MergeDirection::Right,
                2 => MergeDirection::Down,
                _ => MergeDirection::Left,
            },
        }),
        Op::MergeBlock(a, b) => Box::new(MergeCells {
            cells: vec![pick(a)?, pick(b)?],
        }),
        Op::MergeBlock3(a, b, c) => Box::new(MergeCells {
            cells: vec![pick(a)?, pick(b)?, pick(c)?],
        }),
        Op::HeadingRows(count) => Box::new(SetHeadingRows { table, count }),
        Op::HeadingColumns(count) => Box::new(SetHeadingColumns { table, count }),
    };
    Some(command)
}

fn texts(rows: usize, columns: usize) -> Vec<Vec<String>> {
    (0..rows)
        .map(|r| (0..columns).map(|c| format!("{}{}", r, c)).collect())
        .collect()
}

/// Apply the ops in order. Every command the editor reports enabled must
/// succeed; disabled ones must leave the document alone.
fn run_ops(rows: usize, columns: usize, ops: &[Op]) -> (TableEditor, NodeId) {
    let (mut editor, table) = single_table(texts(rows, columns));
    for op in ops {
        let Some(command) = command_for(editor.tree(), table, op) else {
            continue;
        };
        let enabled = editor.is_enabled(command.as_ref());
        let version = editor.tree().document.version();
        match editor.execute(command.as_ref()) {
            Ok(CommandOutcome::Applied) => assert!(enabled),
            Ok(CommandOutcome::NotApplicable) => {
                assert!(!enabled);
                assert_eq!(editor.tree().document.version(), version);
            }
            Err(e) => panic!("{} failed on an enabled selection: {}", command.display_name(), e),
        }
    }
    (editor, table)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn rows_stay_rectangular(
        rows in 1usize..5,
        columns in 1usize..5,
        ops in prop::collection::vec(op_strategy(), 0..12),
    ) {
        let (editor, table) = run_ops(rows, columns, &ops);
        let tree = editor.tree();
        let width = column_count(tree, table);
        prop_assert!(width > 0);
        for length in row_lengths(tree, table) {
            prop_assert_eq!(length, width);
        }
    }

    #[test]
    fn span_attributes_are_absent_or_real_spans(
        rows in 1usize..5,
        columns in 1usize..5,
        ops in prop::collection::vec(op_strategy(), 0..12),
    ) {
        let (editor, table) = run_ops(rows, columns, &ops);
        let tree = editor.tree();
        for cell in all_cells(tree, table) {
            let cell = tree.get_table_cell(cell).unwrap();
            prop_assert!(cell.colspan_attribute().map_or(true, |span| span > 1));
            prop_assert!(cell.rowspan_attribute().map_or(true, |span| span > 1));
        }
    }

    #[test]
    fn cropping_whole_table_reproduces_it(
        rows in 1usize..5,
        columns in 1usize..5,
        ops in prop::collection::vec(op_strategy(), 0..8),
    ) {
        let (editor, table) = run_ops(rows, columns, &ops);
        let tree = editor.tree();
        let dimensions = CropDimensions {
            start_row: 0,
            start_column: 0,
            end_row: tree.table_rows(table).len() - 1,
            end_column: column_count(tree, table) - 1,
        };
        let cropped = crop_table(tree, table, dimensions).unwrap();
        prop_assert_eq!(cropped.outline(), tree.outline(table));
    }

    #[test]
    fn normalized_widths_sum_to_hundred_and_are_stable(
        widths in prop::collection::vec(width_strategy(), 1..8),
    ) {
        let normalized = normalize_column_widths(&widths, 5.0);
        prop_assert_eq!(normalized.len(), widths.len());
        prop_assert_eq!(round2(normalized.iter().sum()), 100.0);

        let again: Vec<ColumnWidth> = normalized.iter().copied().map(ColumnWidth::Percent).collect();
        prop_assert_eq!(normalize_column_widths(&again, 5.0), normalized);
    }
}
