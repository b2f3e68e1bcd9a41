//! Arena holding the nodes of one or more directory trees.

use std::collections::HashMap;

use crate::error::TreeError;
use crate::node::{DirectoryNode, LeafNode, Node, NodeId};
use crate::sort::sort_children;

/// Arena of directory and leaf nodes.
///
/// Ownership is expressed by membership: a directory owns the nodes listed in
/// its `children`, and removing a subtree removes all of them from the arena.
/// `parent` links are plain ids used for navigation only.
#[derive(Debug, Default)]
pub struct DirTree {
    nodes: HashMap<NodeId, Node>,
    next_id: u64,
}

impl DirTree {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node and return its id.
    pub fn insert(&mut self, node: Node) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        id
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Get a node or fail with [`TreeError::UnknownNode`].
    pub fn node(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.nodes.get(&id).ok_or(TreeError::UnknownNode { id })
    }

    /// Get a directory node.
    pub fn dir(&self, id: NodeId) -> Result<&DirectoryNode, TreeError> {
        match self.node(id)? {
            Node::Directory(dir) => Ok(dir),
            Node::Leaf(leaf) => Err(TreeError::NotADirectory {
                path: leaf.path.clone(),
            }),
        }
    }

    /// Get a mutable directory node.
    pub fn dir_mut(&mut self, id: NodeId) -> Result<&mut DirectoryNode, TreeError> {
        match self.nodes.get_mut(&id) {
            Some(Node::Directory(dir)) => Ok(dir),
            Some(Node::Leaf(leaf)) => Err(TreeError::NotADirectory {
                path: leaf.path.clone(),
            }),
            None => Err(TreeError::UnknownNode { id }),
        }
    }

    /// Get a leaf node, if `id` is one.
    pub fn leaf(&self, id: NodeId) -> Option<&LeafNode> {
        self.nodes.get(&id).and_then(Node::as_leaf)
    }

    /// Parent of a node, if it has one.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(Node::parent)
    }

    /// Find a direct child of `dir` by exact name.
    pub fn child_named(&self, dir: NodeId, name: &str) -> Option<NodeId> {
        let dir = self.dir(dir).ok()?;
        dir.children
            .iter()
            .copied()
            .find(|child| self.get(*child).is_some_and(|n| n.name() == name))
    }

    /// Append an already inserted node to `dir` and re-sort.
    pub fn attach(&mut self, dir: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.dir(dir)?;
        let node = self
            .nodes
            .get_mut(&child)
            .ok_or(TreeError::UnknownNode { id: child })?;
        node.set_parent(Some(dir));
        self.dir_mut(dir)?.children.push(child);
        self.sort(dir)
    }

    /// Remove `child` from its parent's `children`.
    ///
    /// Returns the index it occupied, or `None` if the parent no longer lists
    /// it (or it has no parent). The node itself stays in the arena.
    pub fn detach(&mut self, child: NodeId) -> Option<usize> {
        let parent = self.parent_of(child)?;
        let dir = self.dir_mut(parent).ok()?;
        let index = dir.children.iter().position(|c| *c == child)?;
        dir.children.remove(index);
        Some(index)
    }

    /// Put `new` where `old` sits in its parent's children, then re-sort.
    ///
    /// Returns the index that was replaced, or `None` if `old` was not found.
    pub fn replace_child(&mut self, old: NodeId, new: NodeId) -> Option<usize> {
        let parent = self.parent_of(old)?;
        let dir = self.dir_mut(parent).ok()?;
        let index = dir.children.iter().position(|c| *c == old)?;
        dir.children[index] = new;
        if let Some(node) = self.nodes.get_mut(&new) {
            node.set_parent(Some(parent));
        }
        self.sort(parent).ok()?;
        Some(index)
    }

    /// Remove a node and every descendant from the arena.
    ///
    /// Does not touch the parent's `children`; call [`detach`](Self::detach)
    /// first for a live node. Returns the number of removed entries.
    pub fn remove_subtree(&mut self, id: NodeId) -> usize {
        let mut stack = vec![id];
        let mut removed = 0;
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                removed += 1;
                if let Node::Directory(dir) = node {
                    stack.extend(dir.children);
                }
            }
        }
        removed
    }

    /// Re-order a directory's children according to its sort setting.
    pub fn sort(&mut self, dir: NodeId) -> Result<(), TreeError> {
        let (method, mut children) = {
            let d = self.dir(dir)?;
            (d.settings.sorting, d.children.clone())
        };
        sort_children(&mut children, method, |id| self.nodes.get(&id));
        self.dir_mut(dir)?.children = children;
        Ok(())
    }

    /// Ids of all descendants of `id`, depth first, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(Node::Directory(dir)) = self.nodes.get(&current) {
                for child in dir.children.iter().rev() {
                    out.push(*child);
                    stack.push(*child);
                }
            }
        }
        out
    }
}
