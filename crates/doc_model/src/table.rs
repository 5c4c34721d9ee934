//! Table model - Tables, rows, cells, captions, and the column-width side table
//!
//! Tables are stored as a sparse tree: a table owns rows, a row owns cells, and a
//! cell covers `colspan x rowspan` slots of the implied grid starting at its anchor.
//! Span and heading attributes are optional; an absent attribute means the
//! implicit default (1 for spans, 0 for heading counts) and the default is never
//! stored explicitly.

use crate::attribute::{canonical, expect_number};
use crate::{AttributeKey, AttributeValue, ColumnWidth, DocModelError, Node, NodeId, NodeType, Result};
use serde::{Deserialize, Serialize};

// =============================================================================
// Table
// =============================================================================

/// A table containing rows, plus an optional caption and column group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub(crate) id: NodeId,
    pub(crate) parent: Option<NodeId>,
    /// Rows, caption, and column group, in document order
    pub(crate) children: Vec<NodeId>,
    /// Number of leading rows rendered as header rows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    heading_rows: Option<u32>,
    /// Number of leading columns rendered as header columns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    heading_columns: Option<u32>,
}

impl Table {
    /// Create a new empty table
    pub fn new() -> Self {
        Self {
            id: NodeId::new(),
            parent: None,
            children: Vec::new(),
            heading_rows: None,
            heading_columns: None,
        }
    }

    /// Create a table with heading bands
    pub fn with_headings(heading_rows: u32, heading_columns: u32) -> Self {
        let mut table = Self::new();
        table.set_heading_rows(heading_rows);
        table.set_heading_columns(heading_columns);
        table
    }

    pub fn heading_rows(&self) -> u32 {
        self.heading_rows.unwrap_or(0)
    }

    pub fn heading_columns(&self) -> u32 {
        self.heading_columns.unwrap_or(0)
    }

    pub fn set_heading_rows(&mut self, value: u32) {
        self.heading_rows = canonical(value, 0);
    }

    pub fn set_heading_columns(&mut self, value: u32) {
        self.heading_columns = canonical(value, 0);
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for Table {
    fn id(&self) -> NodeId {
        self.id
    }

    fn node_type(&self) -> NodeType {
        NodeType::Table
    }

    fn children(&self) -> &[NodeId] {
        &self.children
    }

    fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    fn attribute(&self, key: AttributeKey) -> Option<AttributeValue> {
        match key {
            AttributeKey::HeadingRows => self.heading_rows.map(AttributeValue::Number),
            AttributeKey::HeadingColumns => self.heading_columns.map(AttributeValue::Number),
            _ => None,
        }
    }

    fn set_attribute(&mut self, key: AttributeKey, value: Option<AttributeValue>) -> Result<()> {
        match key {
            AttributeKey::HeadingRows => {
                self.set_heading_rows(expect_number(key, value)?.unwrap_or(0));
                Ok(())
            }
            AttributeKey::HeadingColumns => {
                self.set_heading_columns(expect_number(key, value)?.unwrap_or(0));
                Ok(())
            }
            _ => Err(DocModelError::UnsupportedAttribute {
                key,
                node_type: NodeType::Table,
            }),
        }
    }
}

// =============================================================================
// Table Row
// =============================================================================

/// A row in a table. Rows carry no span of their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableRow {
    pub(crate) id: NodeId,
    pub(crate) parent: Option<NodeId>,
    /// IDs of child cells
    pub(crate) children: Vec<NodeId>,
}

impl TableRow {
    /// Create a new empty row
    pub fn new() -> Self {
        Self {
            id: NodeId::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Get the cell IDs of this row
    pub fn cells(&self) -> &[NodeId] {
        &self.children
    }

    /// Get the number of cells
    pub fn cell_count(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Default for TableRow {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for TableRow {
    fn id(&self) -> NodeId {
        self.id
    }

    fn node_type(&self) -> NodeType {
        NodeType::TableRow
    }

    fn children(&self) -> &[NodeId] {
        &self.children
    }

    fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }
}

// =============================================================================
// Table Cell
// =============================================================================

/// A cell in a table row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableCell {
    pub(crate) id: NodeId,
    pub(crate) parent: Option<NodeId>,
    /// IDs of child nodes (paragraphs, nested tables)
    pub(crate) children: Vec<NodeId>,
    /// Number of grid columns this cell spans, absent when 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    colspan: Option<u32>,
    /// Number of grid rows this cell spans, absent when 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rowspan: Option<u32>,
}

impl TableCell {
    /// Create a new empty cell
    pub fn new() -> Self {
        Self {
            id: NodeId::new(),
            parent: None,
            children: Vec::new(),
            colspan: None,
            rowspan: None,
        }
    }

    /// Create a cell spanning `colspan` columns and `rowspan` rows
    pub fn spanning(colspan: u32, rowspan: u32) -> Self {
        let mut cell = Self::new();
        cell.set_colspan(colspan);
        cell.set_rowspan(rowspan);
        cell
    }

    /// Effective colspan (1 when absent)
    pub fn colspan(&self) -> u32 {
        self.colspan.unwrap_or(1)
    }

    /// Effective rowspan (1 when absent)
    pub fn rowspan(&self) -> u32 {
        self.rowspan.unwrap_or(1)
    }

    /// Stored colspan attribute, `None` for the default
    pub fn colspan_attribute(&self) -> Option<u32> {
        self.colspan
    }

    /// Stored rowspan attribute, `None` for the default
    pub fn rowspan_attribute(&self) -> Option<u32> {
        self.rowspan
    }

    /// Set the colspan; values below 2 are stored as absent
    pub fn set_colspan(&mut self, value: u32) {
        self.colspan = canonical(value.max(1), 1);
    }

    /// Set the rowspan; values below 2 are stored as absent
    pub fn set_rowspan(&mut self, value: u32) {
        self.rowspan = canonical(value.max(1), 1);
    }

    pub fn is_spanning(&self) -> bool {
        self.colspan.is_some() || self.rowspan.is_some()
    }
}

impl Default for TableCell {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for TableCell {
    fn id(&self) -> NodeId {
        self.id
    }

    fn node_type(&self) -> NodeType {
        NodeType::TableCell
    }

    fn children(&self) -> &[NodeId] {
        &self.children
    }

    fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    fn attribute(&self, key: AttributeKey) -> Option<AttributeValue> {
        match key {
            AttributeKey::Colspan => self.colspan.map(AttributeValue::Number),
            AttributeKey::Rowspan => self.rowspan.map(AttributeValue::Number),
            _ => None,
        }
    }

    fn set_attribute(&mut self, key: AttributeKey, value: Option<AttributeValue>) -> Result<()> {
        match key {
            AttributeKey::Colspan => {
                self.set_colspan(expect_number(key, value)?.unwrap_or(1));
                Ok(())
            }
            AttributeKey::Rowspan => {
                self.set_rowspan(expect_number(key, value)?.unwrap_or(1));
                Ok(())
            }
            _ => Err(DocModelError::UnsupportedAttribute {
                key,
                node_type: NodeType::TableCell,
            }),
        }
    }
}

// =============================================================================
// Table Caption
// =============================================================================

/// Caption of a table; holds inline runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableCaption {
    pub(crate) id: NodeId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl TableCaption {
    pub fn new() -> Self {
        Self {
            id: NodeId::new(),
            parent: None,
            children: Vec::new(),
        }
    }
}

impl Default for TableCaption {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for TableCaption {
    fn id(&self) -> NodeId {
        self.id
    }

    fn node_type(&self) -> NodeType {
        NodeType::TableCaption
    }

    fn children(&self) -> &[NodeId] {
        &self.children
    }

    fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }
}

// =============================================================================
// Column Group
// =============================================================================

/// Side table of per-column widths, one `TableColumn` child per grid column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableColumnGroup {
    pub(crate) id: NodeId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl TableColumnGroup {
    pub fn new() -> Self {
        Self {
            id: NodeId::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// IDs of the column records
    pub fn columns(&self) -> &[NodeId] {
        &self.children
    }
}

impl Default for TableColumnGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for TableColumnGroup {
    fn id(&self) -> NodeId {
        self.id
    }

    fn node_type(&self) -> NodeType {
        NodeType::TableColumnGroup
    }

    fn children(&self) -> &[NodeId] {
        &self.children
    }

    fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }
}

/// One record of the column-width side table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableColumn {
    pub(crate) id: NodeId,
    pub(crate) parent: Option<NodeId>,
    width: ColumnWidth,
}

impl TableColumn {
    pub fn new(width: ColumnWidth) -> Self {
        Self {
            id: NodeId::new(),
            parent: None,
            width,
        }
    }

    pub fn width(&self) -> ColumnWidth {
        self.width
    }

    pub fn set_width(&mut self, width: ColumnWidth) {
        self.width = width;
    }
}

impl Node for TableColumn {
    fn id(&self) -> NodeId {
        self.id
    }

    fn node_type(&self) -> NodeType {
        NodeType::TableColumn
    }

    fn children(&self) -> &[NodeId] {
        &[]
    }

    fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    fn can_have_children(&self) -> bool {
        false
    }

    fn attribute(&self, key: AttributeKey) -> Option<AttributeValue> {
        match key {
            AttributeKey::ColumnWidth => Some(AttributeValue::Width(self.width)),
            _ => None,
        }
    }

    fn set_attribute(&mut self, key: AttributeKey, value: Option<AttributeValue>) -> Result<()> {
        match (key, value) {
            (AttributeKey::ColumnWidth, Some(AttributeValue::Width(width))) => {
                self.width = width;
                Ok(())
            }
            (AttributeKey::ColumnWidth, None) => {
                self.width = ColumnWidth::Auto;
                Ok(())
            }
            (AttributeKey::ColumnWidth, Some(other)) => Err(DocModelError::InvalidAttributeValue {
                key,
                value: other.to_string(),
            }),
            _ => Err(DocModelError::UnsupportedAttribute {
                key,
                node_type: NodeType::TableColumn,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_spans_are_canonical() {
        let mut cell = TableCell::new();
        assert_eq!(cell.colspan(), 1);
        assert_eq!(cell.colspan_attribute(), None);

        cell.set_colspan(3);
        assert_eq!(cell.colspan(), 3);
        assert_eq!(cell.colspan_attribute(), Some(3));

        cell.set_colspan(1);
        assert_eq!(cell.colspan_attribute(), None);

        cell.set_rowspan(0); // Invalid but handled
        assert_eq!(cell.rowspan(), 1);
        assert_eq!(cell.rowspan_attribute(), None);
    }

    #[test]
    fn test_heading_counts_are_canonical() {
        let mut table = Table::with_headings(2, 0);
        assert_eq!(table.heading_rows(), 2);
        assert_eq!(table.attribute(AttributeKey::HeadingColumns), None);

        table.set_heading_rows(0);
        assert_eq!(table.attribute(AttributeKey::HeadingRows), None);
    }

    #[test]
    fn test_attribute_access_through_node_trait() {
        let mut cell = TableCell::spanning(2, 1);
        assert_eq!(cell.attribute(AttributeKey::Colspan), Some(AttributeValue::Number(2)));
        assert_eq!(cell.attribute(AttributeKey::Rowspan), None);

        cell.set_attribute(AttributeKey::Rowspan, Some(AttributeValue::Number(4))).unwrap();
        assert_eq!(cell.rowspan(), 4);

        cell.set_attribute(AttributeKey::Colspan, None).unwrap();
        assert_eq!(cell.colspan_attribute(), None);

        assert!(cell.set_attribute(AttributeKey::HeadingRows, Some(2.into())).is_err());
        assert!(cell
            .set_attribute(AttributeKey::Colspan, Some(ColumnWidth::Auto.into()))
            .is_err());
    }

    #[test]
    fn test_serialized_cell_omits_default_spans() {
        let json = serde_json::to_value(TableCell::new()).unwrap();
        assert!(json.get("colspan").is_none());
        assert!(json.get("rowspan").is_none());

        let json = serde_json::to_value(TableCell::spanning(1, 3)).unwrap();
        assert_eq!(json["rowspan"], 3);
    }
}
