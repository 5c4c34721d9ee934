//! The only mutation surface of a [`DocumentTree`]
//!
//! Every structural edit validates against the node schema, keeps parent links
//! consistent, and appends a [`Change`] to the tree's change log. Descendants
//! of an inserted or removed subtree are not recorded separately.

use crate::{
    AttributeKey, AttributeValue, Change, DocModelError, DocumentTree, Element, NodeFragment,
    NodeId, Result,
};

/// Mutating handle over a document tree
#[derive(Debug)]
pub struct Writer<'a> {
    tree: &'a mut DocumentTree,
}

impl<'a> Writer<'a> {
    pub fn new(tree: &'a mut DocumentTree) -> Self {
        Self { tree }
    }

    /// Read access to the tree being edited
    pub fn tree(&self) -> &DocumentTree {
        self.tree
    }

    /// Changes recorded in the current batch
    pub fn changes(&self) -> &[Change] {
        self.tree.differ().changes()
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    /// Insert a single childless node. `None` appends at the end.
    pub fn insert(
        &mut self,
        element: impl Into<Element>,
        parent: NodeId,
        index: Option<usize>,
    ) -> Result<NodeId> {
        let element = element.into().detached();
        let node_type = element.node_type();
        let (id, index) = self.attach(element, parent, index)?;
        self.tree.differ_mut().record(Change::Insert {
            node: id,
            node_type,
            parent,
            index,
        });
        Ok(id)
    }

    /// Insert a whole fragment; every node gets a fresh id
    pub fn insert_fragment(
        &mut self,
        fragment: &NodeFragment,
        parent: NodeId,
        index: Option<usize>,
    ) -> Result<NodeId> {
        let node_type = fragment.node_type();
        let id = self.attach_fragment(fragment, parent, index)?;
        let index = self.tree.index_in_parent(id).unwrap_or_default();
        self.tree.differ_mut().record(Change::Insert {
            node: id,
            node_type,
            parent,
            index,
        });
        Ok(id)
    }

    /// Deep-copy an existing subtree to a new position
    pub fn clone_subtree(
        &mut self,
        source: NodeId,
        parent: NodeId,
        index: Option<usize>,
    ) -> Result<NodeId> {
        let fragment = self
            .tree
            .snapshot(source)
            .ok_or(DocModelError::NodeNotFound(source.as_uuid()))?;
        self.insert_fragment(&fragment, parent, index)
    }

    fn attach_fragment(
        &mut self,
        fragment: &NodeFragment,
        parent: NodeId,
        index: Option<usize>,
    ) -> Result<NodeId> {
        let (id, _) = self.attach(fragment.element.detached(), parent, index)?;
        for child in &fragment.children {
            self.attach_fragment(child, id, None)?;
        }
        Ok(id)
    }

    /// Validate, store, and link a detached element
    fn attach(
        &mut self,
        mut element: Element,
        parent: NodeId,
        index: Option<usize>,
    ) -> Result<(NodeId, usize)> {
        let parent_type = self
            .tree
            .node_type(parent)
            .ok_or(DocModelError::NodeNotFound(parent.as_uuid()))?;
        let node_type = element.node_type();
        if !parent_type.accepts(node_type) {
            return Err(DocModelError::InvalidChild {
                parent: parent_type,
                child: node_type,
            });
        }
        let len = self.tree.children_of(parent).len();
        let index = checked_index(parent, index, len)?;

        let id = element.id();
        set_element_parent(&mut element, parent);
        self.tree.store(element);
        if let Some(children) = self.tree.children_mut(parent) {
            children.insert(index, id);
        }
        Ok((id, index))
    }

    // =========================================================================
    // Removal and Movement
    // =========================================================================

    /// Remove a node together with its subtree
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        let (parent, index) = self.detach(id)?;
        let node_type = self
            .tree
            .node_type(id)
            .ok_or(DocModelError::NodeNotFound(id.as_uuid()))?;
        self.tree.purge(id);
        self.tree.differ_mut().record(Change::Remove {
            node: id,
            node_type,
            parent,
            index,
        });
        Ok(())
    }

    /// Remove every child of a node
    pub fn remove_children(&mut self, id: NodeId) -> Result<()> {
        for child in self.tree.children_of(id).to_vec() {
            self.remove(child)?;
        }
        Ok(())
    }

    /// Move a node (with its subtree) under a new parent. `None` appends.
    pub fn move_node(&mut self, id: NodeId, parent: NodeId, index: Option<usize>) -> Result<()> {
        let node_type = self
            .tree
            .node_type(id)
            .ok_or(DocModelError::NodeNotFound(id.as_uuid()))?;
        let parent_type = self
            .tree
            .node_type(parent)
            .ok_or(DocModelError::NodeNotFound(parent.as_uuid()))?;
        if self.tree.is_ancestor_or_self(id, parent) {
            return Err(DocModelError::CyclicMove(id.as_uuid()));
        }
        if !parent_type.accepts(node_type) {
            return Err(DocModelError::InvalidChild {
                parent: parent_type,
                child: node_type,
            });
        }
        let old_parent = self
            .tree
            .parent_of(id)
            .ok_or(DocModelError::NotAttached(id.as_uuid()))?;
        let mut len = self.tree.children_of(parent).len();
        if old_parent == parent {
            len -= 1;
        }
        let index = checked_index(parent, index, len)?;

        let (old_parent, old_index) = self.detach(id)?;
        self.tree.differ_mut().record(Change::Remove {
            node: id,
            node_type,
            parent: old_parent,
            index: old_index,
        });

        if let Some(children) = self.tree.children_mut(parent) {
            children.insert(index, id);
        }
        if let Some(node) = self.tree.node_mut(id) {
            node.set_parent(Some(parent));
        }
        self.tree.differ_mut().record(Change::Insert {
            node: id,
            node_type,
            parent,
            index,
        });
        Ok(())
    }

    /// Move all children of `from` to the end of `to`, keeping their order
    pub fn move_children(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        for child in self.tree.children_of(from).to_vec() {
            self.move_node(child, to, None)?;
        }
        Ok(())
    }

    /// Put `node` inside a new `wrapper` that takes its place
    pub fn wrap(&mut self, node: NodeId, wrapper: impl Into<Element>) -> Result<NodeId> {
        let parent = self
            .tree
            .parent_of(node)
            .ok_or(DocModelError::NotAttached(node.as_uuid()))?;
        let index = self
            .tree
            .index_in_parent(node)
            .ok_or(DocModelError::NotAttached(node.as_uuid()))?;
        let wrapper = self.insert(wrapper, parent, Some(index))?;
        self.move_node(node, wrapper, None)?;
        Ok(wrapper)
    }

    /// Unlink a node from its parent without touching storage
    fn detach(&mut self, id: NodeId) -> Result<(NodeId, usize)> {
        if !self.tree.contains(id) {
            return Err(DocModelError::NodeNotFound(id.as_uuid()));
        }
        let parent = self
            .tree
            .parent_of(id)
            .ok_or(DocModelError::NotAttached(id.as_uuid()))?;
        let index = self
            .tree
            .index_in_parent(id)
            .ok_or(DocModelError::NotAttached(id.as_uuid()))?;
        if let Some(children) = self.tree.children_mut(parent) {
            children.remove(index);
        }
        if let Some(node) = self.tree.node_mut(id) {
            node.set_parent(None);
        }
        Ok((parent, index))
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// Write an attribute. Writing the implicit default removes it.
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        key: AttributeKey,
        value: impl Into<AttributeValue>,
    ) -> Result<()> {
        self.write_attribute(id, key, Some(value.into()))
    }

    pub fn remove_attribute(&mut self, id: NodeId, key: AttributeKey) -> Result<()> {
        self.write_attribute(id, key, None)
    }

    fn write_attribute(
        &mut self,
        id: NodeId,
        key: AttributeKey,
        value: Option<AttributeValue>,
    ) -> Result<()> {
        let node = self
            .tree
            .node_mut(id)
            .ok_or(DocModelError::NodeNotFound(id.as_uuid()))?;
        let node_type = node.node_type();
        let old = node.attribute(key);
        node.set_attribute(key, value)?;
        let new = node.attribute(key);
        if old != new {
            self.tree.differ_mut().record(Change::Attribute {
                node: id,
                node_type,
                key,
                old,
                new,
            });
        }
        Ok(())
    }
}

fn checked_index(parent: NodeId, index: Option<usize>, len: usize) -> Result<usize> {
    match index {
        None => Ok(len),
        Some(i) if i <= len => Ok(i),
        Some(i) => Err(DocModelError::InvalidIndex {
            parent: parent.as_uuid(),
            index: i,
            len,
        }),
    }
}

fn set_element_parent(element: &mut Element, parent: NodeId) {
    let parent = Some(parent);
    match element {
        Element::Table(n) => n.parent = parent,
        Element::TableRow(n) => n.parent = parent,
        Element::TableCell(n) => n.parent = parent,
        Element::TableCaption(n) => n.parent = parent,
        Element::TableColumnGroup(n) => n.parent = parent,
        Element::TableColumn(n) => n.parent = parent,
        Element::Paragraph(n) => n.parent = parent,
        Element::Run(n) => n.parent = parent,
    }
}
