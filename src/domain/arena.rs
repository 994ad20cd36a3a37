use generational_arena::Arena;
use tracing::{debug, instrument};

use crate::domain::error::{TreeError, TreeResult};
use crate::domain::node::{Node, NodeHandle};

/// Arena owning every node of a tree, attached or not.
///
/// Parent and child lists hold handles into the arena, so the cyclic
/// parent/child reference graph never turns into an ownership cycle.
/// All link mutations go through the arena and keep both directions in sync:
/// `child ∈ parent.children` exactly when `parent ∈ child.parents`.
#[derive(Debug)]
pub struct NodeArena<T> {
    arena: Arena<Node<T>>,
}

impl<T> Default for NodeArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> NodeArena<T> {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.arena.contains(handle.0)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn get(&self, handle: NodeHandle) -> Option<&Node<T>> {
        self.arena.get(handle.0)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn get_mut(&mut self, handle: NodeHandle) -> Option<&mut Node<T>> {
        self.arena.get_mut(handle.0)
    }

    /// Iterates over every node in the arena in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeHandle, &Node<T>)> {
        self.arena.iter().map(|(idx, node)| (NodeHandle(idx), node))
    }

    /// Scans the whole arena for a node with the given id.
    ///
    /// Unlike tree lookups this also finds detached nodes.
    pub fn find_by_id(&self, id: &str) -> Option<NodeHandle> {
        self.iter()
            .find(|(_, node)| node.id == id)
            .map(|(handle, _)| handle)
    }

    /// Stores a new, unlinked node.
    #[instrument(level = "debug", skip_all)]
    pub fn insert(&mut self, id: impl Into<String>, title: T) -> TreeResult<NodeHandle> {
        let id = id.into();
        if self.find_by_id(&id).is_some() {
            return Err(TreeError::DuplicateId(id));
        }
        debug!(%id, "inserting node");
        let handle = NodeHandle(self.arena.insert(Node::new(id, title)));
        Ok(handle)
    }

    /// Unlinks a node from all its neighbours and drops it from the arena.
    ///
    /// The handle and any copies of it go stale.
    #[instrument(level = "debug", skip(self))]
    pub fn remove(&mut self, handle: NodeHandle) -> Option<Node<T>> {
        let mut node = self.arena.remove(handle.0)?;
        for parent in node.parents.drain(..) {
            if let Some(parent) = self.arena.get_mut(parent.0) {
                parent.children.retain(|&c| c != handle);
            }
        }
        for child in node.children.drain(..) {
            if let Some(child) = self.arena.get_mut(child.0) {
                child.parents.retain(|&p| p != handle);
            }
        }
        Some(node)
    }

    fn node(&self, handle: NodeHandle) -> TreeResult<&Node<T>> {
        self.get(handle).ok_or(TreeError::StaleHandle(handle))
    }

    fn node_mut(&mut self, handle: NodeHandle) -> TreeResult<&mut Node<T>> {
        self.get_mut(handle).ok_or(TreeError::StaleHandle(handle))
    }

    /// Links `child` under `parent`, updating both sides.
    ///
    /// Returns `Ok(false)` without touching anything when the link already
    /// exists. A node can never be linked to itself.
    #[instrument(level = "debug", skip(self))]
    pub fn add_child(&mut self, parent: NodeHandle, child: NodeHandle) -> TreeResult<bool> {
        let child_node = self.node(child)?;
        if parent == child {
            return Err(TreeError::CycleDetected {
                node: child_node.id.clone(),
                parent: child_node.id.clone(),
            });
        }
        if self.node(parent)?.is_parent_of(child) {
            return Ok(false);
        }
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parents.push(parent);
        debug!(?parent, ?child, "linked");
        Ok(true)
    }

    /// Unlinks `child` from `parent`, updating both sides.
    ///
    /// Returns `Ok(false)` when the two nodes were not linked.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_child(&mut self, parent: NodeHandle, child: NodeHandle) -> TreeResult<bool> {
        self.node(child)?;
        let parent_node = self.node_mut(parent)?;
        let Some(pos) = parent_node.children.iter().position(|&c| c == child) else {
            return Ok(false);
        };
        parent_node.children.remove(pos);
        let child_node = self.node_mut(child)?;
        if let Some(pos) = child_node.parents.iter().position(|&p| p == parent) {
            child_node.parents.remove(pos);
        }
        debug!(?parent, ?child, "unlinked");
        Ok(true)
    }

    /// Parent-side counterpart of [`add_child`](Self::add_child).
    pub fn add_parent(&mut self, node: NodeHandle, parent: NodeHandle) -> TreeResult<bool> {
        self.add_child(parent, node)
    }

    /// Parent-side counterpart of [`remove_child`](Self::remove_child).
    pub fn remove_parent(&mut self, node: NodeHandle, parent: NodeHandle) -> TreeResult<bool> {
        self.remove_child(parent, node)
    }
}
