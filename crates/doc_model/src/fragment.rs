//! Owned, detached subtrees
//!
//! A [`NodeFragment`] is a node plus its descendants, held outside of any
//! [`crate::DocumentTree`]. Fragments are produced by snapshotting part of a tree
//! (clipboard copy, cell cloning) and consumed by [`crate::Writer::insert_fragment`].
//! Node ids inside a fragment are never reused on insertion: every inserted node
//! receives a fresh id.

use crate::{
    AttributeKey, ColumnWidth, Node, NodeId, NodeType, Paragraph, Run, Table, TableCaption,
    TableCell, TableColumn, TableColumnGroup, TableRow,
};
use serde::{Deserialize, Serialize};

/// Any node that can live below the document root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Element {
    Table(Table),
    TableRow(TableRow),
    TableCell(TableCell),
    TableCaption(TableCaption),
    TableColumnGroup(TableColumnGroup),
    TableColumn(TableColumn),
    Paragraph(Paragraph),
    Run(Run),
}

impl Element {
    pub fn as_node(&self) -> &dyn Node {
        match self {
            Element::Table(n) => n,
            Element::TableRow(n) => n,
            Element::TableCell(n) => n,
            Element::TableCaption(n) => n,
            Element::TableColumnGroup(n) => n,
            Element::TableColumn(n) => n,
            Element::Paragraph(n) => n,
            Element::Run(n) => n,
        }
    }

    pub fn id(&self) -> NodeId {
        self.as_node().id()
    }

    pub fn node_type(&self) -> NodeType {
        self.as_node().node_type()
    }

    /// Copy of this node with a fresh id, no parent, and no children.
    /// Attributes and run text are kept.
    pub fn detached(&self) -> Element {
        let mut copy = self.clone();
        match &mut copy {
            Element::Table(n) => reset_links(&mut n.id, &mut n.parent, Some(&mut n.children)),
            Element::TableRow(n) => reset_links(&mut n.id, &mut n.parent, Some(&mut n.children)),
            Element::TableCell(n) => reset_links(&mut n.id, &mut n.parent, Some(&mut n.children)),
            Element::TableCaption(n) => {
                reset_links(&mut n.id, &mut n.parent, Some(&mut n.children))
            }
            Element::TableColumnGroup(n) => {
                reset_links(&mut n.id, &mut n.parent, Some(&mut n.children))
            }
            Element::TableColumn(n) => reset_links(&mut n.id, &mut n.parent, None),
            Element::Paragraph(n) => reset_links(&mut n.id, &mut n.parent, Some(&mut n.children)),
            Element::Run(n) => reset_links(&mut n.id, &mut n.parent, None),
        }
        copy
    }
}

fn reset_links(id: &mut NodeId, parent: &mut Option<NodeId>, children: Option<&mut Vec<NodeId>>) {
    *id = NodeId::new();
    *parent = None;
    if let Some(children) = children {
        children.clear();
    }
}

macro_rules! element_from {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Element {
                fn from(node: $variant) -> Self {
                    Element::$variant(node)
                }
            }
        )*
    };
}

element_from!(Table, TableRow, TableCell, TableCaption, TableColumnGroup, TableColumn, Paragraph, Run);

/// A detached node together with its descendants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeFragment {
    pub element: Element,
    pub children: Vec<NodeFragment>,
}

impl NodeFragment {
    pub fn new(element: impl Into<Element>) -> Self {
        Self {
            element: element.into(),
            children: Vec::new(),
        }
    }

    /// Builder-style child append
    pub fn with_child(mut self, child: NodeFragment) -> Self {
        self.children.push(child);
        self
    }

    pub fn push(&mut self, child: NodeFragment) {
        self.children.push(child);
    }

    pub fn id(&self) -> NodeId {
        self.element.id()
    }

    pub fn node_type(&self) -> NodeType {
        self.element.node_type()
    }

    /// A paragraph holding `text` as a single run, or no run at all when empty
    pub fn paragraph(text: &str) -> Self {
        let fragment = NodeFragment::new(Paragraph::new());
        if text.is_empty() {
            fragment
        } else {
            fragment.with_child(NodeFragment::new(Run::new(text)))
        }
    }

    /// Concatenated run text of this subtree; paragraphs are joined by newlines
    pub fn text(&self) -> String {
        match &self.element {
            Element::Run(run) => run.text.clone(),
            Element::Paragraph(_) | Element::TableCaption(_) => {
                self.children.iter().map(NodeFragment::text).collect()
            }
            _ => self
                .children
                .iter()
                .map(NodeFragment::text)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Compact textual rendering of the subtree, e.g.
    /// `table(headingRows=1)[row[cell(colspan=2)["a"]], colgroup[col(25%), col(auto)]]`
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.write_outline(&mut out);
        out
    }

    fn write_outline(&self, out: &mut String) {
        match &self.element {
            Element::Paragraph(_) => out.push_str(&format!("{:?}", self.text())),
            Element::Run(run) => out.push_str(&format!("run({:?})", run.text)),
            Element::TableColumn(column) => out.push_str(&format!("col({})", column.width())),
            Element::TableCaption(_) => out.push_str(&format!("caption[{:?}]", self.text())),
            element => {
                let node = element.as_node();
                out.push_str(node.node_type().name());
                let attributes: Vec<String> = [
                    AttributeKey::HeadingRows,
                    AttributeKey::HeadingColumns,
                    AttributeKey::Colspan,
                    AttributeKey::Rowspan,
                ]
                .iter()
                .filter_map(|key| node.attribute(*key).map(|value| format!("{}={}", key, value)))
                .collect();
                if !attributes.is_empty() {
                    out.push('(');
                    out.push_str(&attributes.join(", "));
                    out.push(')');
                }
                out.push('[');
                for (i, child) in self.children.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    child.write_outline(out);
                }
                out.push(']');
            }
        }
    }
}

// =============================================================================
// Table Builder
// =============================================================================

/// Description of one cell for [`TableBuilder`]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellSpec {
    text: String,
    colspan: u32,
    rowspan: u32,
    bare: bool,
}

impl CellSpec {
    /// A cell holding `text`; each line becomes its own paragraph
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            colspan: 1,
            rowspan: 1,
            bare: false,
        }
    }

    /// A cell with no content at all, not even an empty paragraph
    pub fn bare() -> Self {
        Self {
            bare: true,
            ..Self::new("")
        }
    }

    pub fn colspan(mut self, colspan: u32) -> Self {
        self.colspan = colspan;
        self
    }

    pub fn rowspan(mut self, rowspan: u32) -> Self {
        self.rowspan = rowspan;
        self
    }

    fn build(&self) -> NodeFragment {
        let mut cell = NodeFragment::new(TableCell::spanning(self.colspan, self.rowspan));
        if !self.bare {
            for line in self.text.split('\n') {
                cell.push(NodeFragment::paragraph(line));
            }
        }
        cell
    }
}

impl From<&str> for CellSpec {
    fn from(text: &str) -> Self {
        CellSpec::new(text)
    }
}

impl From<String> for CellSpec {
    fn from(text: String) -> Self {
        CellSpec::new(text)
    }
}

/// Builds table fragments row by row
///
/// ```
/// use doc_model::{CellSpec, TableBuilder};
///
/// let table = TableBuilder::new(vec![
///     vec![CellSpec::new("a").colspan(2)],
///     vec!["b".into(), "c".into()],
/// ])
/// .heading_rows(1)
/// .build();
/// assert_eq!(table.outline(), r#"table(headingRows=1)[row[cell(colspan=2)["a"]], row[cell["b"], cell["c"]]]"#);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TableBuilder {
    rows: Vec<Vec<CellSpec>>,
    heading_rows: u32,
    heading_columns: u32,
    column_widths: Option<Vec<ColumnWidth>>,
    caption: Option<String>,
}

impl TableBuilder {
    pub fn new<R, C>(rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = C>,
        C: Into<CellSpec>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
            ..Self::default()
        }
    }

    /// A `rows x columns` table of empty cells
    pub fn empty(rows: usize, columns: usize) -> Self {
        Self::new((0..rows).map(|_| (0..columns).map(|_| CellSpec::new(""))))
    }

    pub fn heading_rows(mut self, count: u32) -> Self {
        self.heading_rows = count;
        self
    }

    pub fn heading_columns(mut self, count: u32) -> Self {
        self.heading_columns = count;
        self
    }

    pub fn column_widths(mut self, widths: Vec<ColumnWidth>) -> Self {
        self.column_widths = Some(widths);
        self
    }

    pub fn caption(mut self, text: impl Into<String>) -> Self {
        self.caption = Some(text.into());
        self
    }

    pub fn build(&self) -> NodeFragment {
        let mut table = NodeFragment::new(Table::with_headings(self.heading_rows, self.heading_columns));
        for row in &self.rows {
            let mut row_fragment = NodeFragment::new(TableRow::new());
            for cell in row {
                row_fragment.push(cell.build());
            }
            table.push(row_fragment);
        }
        if let Some(widths) = &self.column_widths {
            let mut group = NodeFragment::new(TableColumnGroup::new());
            for width in widths {
                group.push(NodeFragment::new(TableColumn::new(*width)));
            }
            table.push(group);
        }
        if let Some(caption) = &self.caption {
            let mut fragment = NodeFragment::new(TableCaption::new());
            if !caption.is_empty() {
                fragment.push(NodeFragment::new(Run::new(caption.as_str())));
            }
            table.push(fragment);
        }
        table
    }
}
