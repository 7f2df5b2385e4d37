//! Arena-based document tree storage
//!
//! "Bad programmers worry about the code. Good programmers worry about
//! data structures and their relationships."
//!
//! This arena eliminates:
//! - Rc/RefCell overhead and borrow juggling while the tree is rewritten
//! - Dangling pointers: a removed node is only unlinked, its slot stays valid
//! - GC pressure (single Vec allocation)
//!
//! ## Memory Layout
//!
//! ```text
//! Arena: Vec<DomNode>
//!        [Node0][Node1][Node2]...
//!         ↑ 4-byte index, not 8-byte pointer
//! ```
//!
//! Nodes are never freed. `remove` detaches a node (and its subtree) from its
//! parent; every traversal starts at the root, so detached nodes simply stop
//! being visited.

use crate::error::{DomError, Result};
use crate::types::{Attribute, DomNode, NodeId, NodeType};
use smallvec::SmallVec;

/// Arena allocator for document nodes
#[derive(Debug, Clone)]
pub struct DomArena {
    /// All nodes stored sequentially (cache-friendly)
    nodes: Vec<DomNode>,

    /// Root node ID (if set)
    root_id: Option<NodeId>,
}

impl DomArena {
    /// Create a new empty arena
    pub fn new() -> Self {
        Self {
            nodes: Vec::with_capacity(1024), // Pre-allocate for typical page
            root_id: None,
        }
    }

    /// Create arena with specific capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            root_id: None,
        }
    }

    /// Add a node to the arena, returns its ID
    ///
    /// The node's `node_id` is overwritten with its slot index.
    pub fn add_node(&mut self, mut node: DomNode) -> NodeId {
        let node_id = self.nodes.len() as NodeId;
        node.node_id = node_id;
        self.nodes.push(node);
        node_id
    }

    /// Allocate a detached element
    pub fn create_element(&mut self, tag: &str, attributes: Vec<Attribute>) -> NodeId {
        let mut node = DomNode::new(0, NodeType::Element, tag.to_string());
        node.attributes = attributes;
        self.add_node(node)
    }

    /// Allocate a detached text node
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        let mut node = DomNode::new(0, NodeType::Text, "#text".to_string());
        node.node_value = text.into();
        self.add_node(node)
    }

    /// Get node by ID (immutable)
    pub fn get(&self, node_id: NodeId) -> Result<&DomNode> {
        self.nodes
            .get(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by ID (mutable)
    pub fn get_mut(&mut self, node_id: NodeId) -> Result<&mut DomNode> {
        self.nodes
            .get_mut(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Set root node
    pub fn set_root(&mut self, node_id: NodeId) -> Result<()> {
        // Verify node exists
        self.get(node_id)?;
        self.root_id = Some(node_id);
        Ok(())
    }

    /// Get root node ID
    pub fn root_id(&self) -> Option<NodeId> {
        self.root_id
    }

    /// Get root node
    pub fn root(&self) -> Result<&DomNode> {
        let root_id = self.root_id.ok_or(DomError::InvalidNodeType {
            expected: "document root".to_string(),
            actual: "none".to_string(),
        })?;
        self.get(root_id)
    }

    /// Total number of allocated nodes, detached ones included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if arena is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Child IDs of a node, borrowed from the live list
    pub fn children(&self, node_id: NodeId) -> Result<&[NodeId]> {
        Ok(self.get(node_id)?.children_ids.as_slice())
    }

    /// Owned copy of a node's child list
    ///
    /// Anything that mutates the tree while walking it must iterate this
    /// copy, never the live list.
    pub fn children_snapshot(&self, node_id: NodeId) -> Result<SmallVec<[NodeId; 4]>> {
        Ok(self.get(node_id)?.children_ids.clone())
    }

    /// Get parent of a node
    pub fn parent(&self, node_id: NodeId) -> Result<Option<&DomNode>> {
        let node = self.get(node_id)?;
        match node.parent_id {
            Some(parent_id) => Ok(Some(self.get(parent_id)?)),
            None => Ok(None),
        }
    }

    /// True if the node is reachable from the root
    pub fn is_attached(&self, node_id: NodeId) -> bool {
        let Some(root_id) = self.root_id else {
            return false;
        };

        let mut current = Some(node_id);
        while let Some(id) = current {
            if id == root_id {
                return true;
            }
            current = match self.get(id) {
                Ok(node) => node.parent_id,
                Err(_) => return false,
            };
        }
        false
    }

    /// Append `child` as the last child of `parent`
    ///
    /// An attached child is moved, not duplicated.
    pub fn append_child(&mut self, parent_id: NodeId, child_id: NodeId) -> Result<()> {
        self.ensure_container(parent_id)?;
        self.get(child_id)?;
        self.detach(child_id)?;

        self.get_mut(parent_id)?.children_ids.push(child_id);
        self.get_mut(child_id)?.parent_id = Some(parent_id);
        Ok(())
    }

    /// Insert `new_id` immediately before `reference_id` under the same parent
    pub fn insert_before(&mut self, new_id: NodeId, reference_id: NodeId) -> Result<()> {
        let parent_id = self
            .get(reference_id)?
            .parent_id
            .ok_or(DomError::Detached(reference_id))?;
        self.get(new_id)?;
        self.detach(new_id)?;

        let parent = self.get_mut(parent_id)?;
        let position = parent
            .children_ids
            .iter()
            .position(|&id| id == reference_id)
            .ok_or(DomError::NotAChild {
                parent: parent_id,
                child: reference_id,
            })?;
        parent.children_ids.insert(position, new_id);

        self.get_mut(new_id)?.parent_id = Some(parent_id);
        Ok(())
    }

    /// Unlink a node (and its subtree) from its parent
    ///
    /// Removing an already detached node is a no-op.
    pub fn remove(&mut self, node_id: NodeId) -> Result<()> {
        self.detach(node_id)
    }

    fn detach(&mut self, node_id: NodeId) -> Result<()> {
        let Some(parent_id) = self.get(node_id)?.parent_id else {
            return Ok(());
        };

        let parent = self.get_mut(parent_id)?;
        let position = parent
            .children_ids
            .iter()
            .position(|&id| id == node_id)
            .ok_or(DomError::NotAChild {
                parent: parent_id,
                child: node_id,
            })?;
        parent.children_ids.remove(position);

        self.get_mut(node_id)?.parent_id = None;
        Ok(())
    }

    fn ensure_container(&self, node_id: NodeId) -> Result<()> {
        let node = self.get(node_id)?;
        match node.node_type {
            NodeType::Element | NodeType::Document => Ok(()),
            other => Err(DomError::InvalidNodeType {
                expected: "element or document".to_string(),
                actual: other.as_str().to_string(),
            }),
        }
    }

    /// Traverse tree depth-first (iterative, no recursion)
    ///
    /// This is the "good taste" version - no special cases for leaf nodes
    pub fn traverse_df<F>(&self, start_id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(&DomNode) -> Result<()>,
    {
        let mut stack = vec![start_id];

        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id)?;
            visit(node)?;

            // Push children in reverse order (so they're visited left-to-right)
            for &child_id in node.children_ids.iter().rev() {
                stack.push(child_id);
            }
        }

        Ok(())
    }

    /// Pre-order IDs of every node reachable from the root
    pub fn attached_ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::new();
        if let Some(root_id) = self.root_id {
            // Ignore dangling ids here, the walk only reports what it can reach
            let _ = self.traverse_df(root_id, |node| {
                ids.push(node.node_id);
                Ok(())
            });
        }
        ids
    }

    /// Find attached nodes matching predicate, in document order
    pub fn find<F>(&self, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&DomNode) -> bool,
    {
        self.attached_ids()
            .into_iter()
            .filter(|&id| self.get(id).map(&predicate).unwrap_or(false))
            .collect()
    }

    /// Find first attached node matching predicate
    pub fn find_one<F>(&self, predicate: F) -> Option<NodeId>
    where
        F: Fn(&DomNode) -> bool,
    {
        self.attached_ids()
            .into_iter()
            .find(|&id| self.get(id).map(&predicate).unwrap_or(false))
    }

    /// Find all attached elements by tag name
    pub fn find_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.find(|node| node.has_tag(tag))
    }
}

impl Default for DomArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document_with_div() -> (DomArena, NodeId, NodeId) {
        let mut arena = DomArena::new();
        let root = arena.add_node(DomNode::new(
            0,
            NodeType::Document,
            "#document".to_string(),
        ));
        arena.set_root(root).unwrap();
        let div = arena.create_element("div", Vec::new());
        arena.append_child(root, div).unwrap();
        (arena, root, div)
    }

    #[test]
    fn test_arena_basic() {
        let mut arena = DomArena::new();

        let id = arena.create_element("div", vec![Attribute::new("id", "main")]);
        assert_eq!(id, 0);

        let retrieved = arena.get(id).unwrap();
        assert_eq!(retrieved.node_name, "div");
        assert_eq!(retrieved.node_id, 0);
        assert_eq!(retrieved.attr("id"), Some("main"));
    }

    #[test]
    fn test_traverse_df() {
        let (mut arena, root, div) = document_with_div();
        let span1 = arena.create_element("span", Vec::new());
        let span2 = arena.create_element("p", Vec::new());
        arena.append_child(div, span1).unwrap();
        arena.append_child(div, span2).unwrap();

        let mut visited = Vec::new();
        arena
            .traverse_df(root, |node| {
                visited.push(node.node_name.clone());
                Ok(())
            })
            .unwrap();

        assert_eq!(visited, vec!["#document", "div", "span", "p"]);
    }

    #[test]
    fn test_insert_before_and_remove() {
        let (mut arena, _root, div) = document_with_div();
        let text = arena.create_text("gain or loss");
        arena.append_child(div, text).unwrap();

        let wrapper = arena.create_element("span", Vec::new());
        arena.insert_before(wrapper, text).unwrap();
        assert_eq!(arena.children(div).unwrap(), &[wrapper, text]);

        arena.remove(text).unwrap();
        assert_eq!(arena.children(div).unwrap(), &[wrapper]);
        assert!(arena.get(text).unwrap().parent_id.is_none());
        assert!(!arena.is_attached(text));
        assert!(arena.is_attached(wrapper));

        // Second remove is a no-op
        arena.remove(text).unwrap();
    }

    #[test]
    fn test_insert_before_detached_reference_fails() {
        let (mut arena, _root, _div) = document_with_div();
        let orphan = arena.create_text("orphan");
        let wrapper = arena.create_element("span", Vec::new());

        let err = arena.insert_before(wrapper, orphan).unwrap_err();
        assert!(matches!(err, DomError::Detached(id) if id == orphan));
    }

    #[test]
    fn test_append_to_text_fails() {
        let (mut arena, _root, div) = document_with_div();
        let text = arena.create_text("leaf");
        arena.append_child(div, text).unwrap();
        let child = arena.create_text("nope");

        assert!(matches!(
            arena.append_child(text, child),
            Err(DomError::InvalidNodeType { .. })
        ));
    }

    #[test]
    fn test_snapshot_is_independent_of_mutation() {
        let (mut arena, _root, div) = document_with_div();
        let a = arena.create_text("a");
        let b = arena.create_text("b");
        arena.append_child(div, a).unwrap();
        arena.append_child(div, b).unwrap();

        let snapshot = arena.children_snapshot(div).unwrap();
        arena.remove(a).unwrap();

        assert_eq!(snapshot.as_slice(), &[a, b]);
        assert_eq!(arena.children(div).unwrap(), &[b]);
    }

    #[test]
    fn test_find_skips_detached_nodes() {
        let (mut arena, _root, div) = document_with_div();
        let span = arena.create_element("span", Vec::new());
        arena.append_child(div, span).unwrap();
        let _loose = arena.create_element("span", Vec::new());

        assert_eq!(arena.find_by_tag("SPAN"), vec![span]);
    }
}
