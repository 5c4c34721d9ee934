//! Column widths
//!
//! Widths live in an optional column group, one `TableColumn` entry per grid
//! column, each a percentage or `auto`. [`normalize_column_widths`] turns such
//! a list into concrete percentages summing to exactly 100.

use crate::common::ensure_table;
use crate::geometry::column_count;
use crate::{Result, TableError};
use doc_model::{AttributeKey, ColumnWidth, DocumentTree, NodeId, TableColumn, TableColumnGroup, Writer};
use tracing::debug;

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Resolve `auto` entries and scale the list to sum to 100.
///
/// Each `auto` receives an equal share of what the fixed entries leave, but
/// never less than `min_percent`. If the rounded total is then not 100, every
/// entry is rescaled and the last one absorbs the rounding residue. Feeding
/// the output back in returns it unchanged.
pub fn normalize_column_widths(widths: &[ColumnWidth], min_percent: f64) -> Vec<f64> {
    if widths.is_empty() {
        return Vec::new();
    }

    let auto_count = widths.iter().filter(|w| w.is_auto()).count();
    let fixed_total: f64 = widths.iter().filter_map(|w| w.percent()).sum();
    let auto_width = if auto_count > 0 {
        round2(((100.0 - fixed_total) / auto_count as f64).max(min_percent))
    } else {
        0.0
    };
    let filled: Vec<f64> = widths
        .iter()
        .map(|w| round2(w.percent().unwrap_or(auto_width)))
        .collect();

    let total: f64 = filled.iter().sum();
    if round2(total) == 100.0 {
        return filled;
    }

    let mut scaled: Vec<f64> = if total > 0.0 {
        filled.iter().map(|w| round2(w * 100.0 / total)).collect()
    } else {
        vec![round2(100.0 / filled.len() as f64); filled.len()]
    };
    let scaled_total: f64 = scaled.iter().sum();
    if let Some(last) = scaled.last_mut() {
        *last = round2(*last + 100.0 - scaled_total);
    }
    scaled
}

/// Entries of the table's column group, or `None` when it has none
pub fn column_widths(tree: &DocumentTree, table: NodeId) -> Option<Vec<ColumnWidth>> {
    let entries = column_entries(tree, table)?;
    Some(
        entries
            .iter()
            .filter_map(|&id| tree.get_column(id))
            .map(|column| column.width())
            .collect(),
    )
}

/// Replace the column group's entries with `widths`, creating the group
/// before the caption when the table has none
pub fn set_column_widths(writer: &mut Writer<'_>, table: NodeId, widths: &[ColumnWidth]) -> Result<()> {
    ensure_table(writer.tree(), table)?;
    let group = match writer.tree().table_column_group(table) {
        Some(group) => group,
        None => {
            let index = writer
                .tree()
                .table_caption(table)
                .and_then(|caption| writer.tree().index_in_parent(caption))
                .unwrap_or_else(|| writer.tree().children_of(table).len());
            writer.insert(TableColumnGroup::new(), table, Some(index))?
        }
    };

    let entries = writer.tree().children_of(group).to_vec();
    for (i, width) in widths.iter().enumerate() {
        match entries.get(i) {
            Some(&entry) => writer.set_attribute(entry, AttributeKey::ColumnWidth, *width)?,
            None => {
                writer.insert(TableColumn::new(*width), group, None)?;
            }
        }
    }
    for &surplus in entries.iter().skip(widths.len()).rev() {
        writer.remove(surplus)?;
    }
    Ok(())
}

/// Set one column to `percent`, taking the difference from its right
/// neighbour (the left one for the last column). Both stay at or above
/// `min_percent`.
pub fn resize_column(
    writer: &mut Writer<'_>,
    table: NodeId,
    column: usize,
    percent: f64,
    min_percent: f64,
) -> Result<()> {
    ensure_table(writer.tree(), table)?;
    let columns = column_count(writer.tree(), table);
    if column >= columns {
        return Err(TableError::ColumnOutOfRange {
            operation: "resize_column",
            index: column,
            columns,
        });
    }

    let current = column_widths(writer.tree(), table).unwrap_or_default();
    let mut entries: Vec<ColumnWidth> = current.into_iter().take(columns).collect();
    entries.resize(columns, ColumnWidth::Auto);
    let mut widths = normalize_column_widths(&entries, min_percent);

    if columns > 1 {
        let neighbour = if column + 1 < columns { column + 1 } else { column - 1 };
        let pair = widths[column] + widths[neighbour];
        let resized = if pair < 2.0 * min_percent {
            pair / 2.0
        } else {
            percent.clamp(min_percent, pair - min_percent)
        };
        widths[column] = round2(resized);
        widths[neighbour] = round2(pair - widths[column]);
    }
    debug!(table = %table, column, width = widths[column], "Resizing column");

    let widths: Vec<ColumnWidth> = normalize_column_widths(
        &widths.into_iter().map(ColumnWidth::Percent).collect::<Vec<_>>(),
        min_percent,
    )
    .into_iter()
    .map(ColumnWidth::Percent)
    .collect();
    set_column_widths(writer, table, &widths)
}

pub(crate) fn column_entries(tree: &DocumentTree, table: NodeId) -> Option<Vec<NodeId>> {
    let group = tree.table_column_group(table)?;
    Some(tree.get_column_group(group)?.columns().to_vec())
}

/// Add `count` `auto` entries at column `at`, if the table tracks widths
pub(crate) fn insert_auto_columns(
    writer: &mut Writer<'_>,
    table: NodeId,
    at: usize,
    count: usize,
) -> Result<()> {
    let Some(group) = writer.tree().table_column_group(table) else {
        return Ok(());
    };
    let index = at.min(writer.tree().children_of(group).len());
    for _ in 0..count {
        writer.insert(TableColumn::new(ColumnWidth::Auto), group, Some(index))?;
    }
    Ok(())
}

/// Drop the entry of column `index`, giving its width to the previous column
/// (the next one for column 0)
pub(crate) fn remove_column_entry(writer: &mut Writer<'_>, table: NodeId, index: usize) -> Result<()> {
    let Some(entries) = column_entries(writer.tree(), table) else {
        return Ok(());
    };
    let Some(&removed) = entries.get(index) else {
        return Ok(());
    };
    let adjacent = if index == 0 {
        entries.get(1)
    } else {
        entries.get(index - 1)
    };

    let width_of = |id: NodeId| writer.tree().get_column(id).map(|c| c.width());
    if let Some(&adjacent) = adjacent {
        if let (Some(ColumnWidth::Percent(removed_width)), Some(ColumnWidth::Percent(adjacent_width))) =
            (width_of(removed), width_of(adjacent))
        {
            writer.set_attribute(
                adjacent,
                AttributeKey::ColumnWidth,
                ColumnWidth::Percent(round2(removed_width + adjacent_width)),
            )?;
        }
    }
    writer.remove(removed)?;
    Ok(())
}
