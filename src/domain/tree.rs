use std::collections::HashSet;

use tracing::{debug, instrument};

use crate::config::Settings;
use crate::domain::arena::NodeArena;
use crate::domain::error::{TreeError, TreeResult};
use crate::domain::node::{Node, NodeHandle};
use crate::domain::traverse::{self, BreadthFirst, TraversalStrategy, Walk};

/// Rooted multi-parent node graph.
///
/// The tree keeps no index of its nodes: `nodes`, `size`, `height` and every
/// lookup walk the live graph from the root, so a mutation is visible to the
/// next query without any invalidation step.
#[derive(Debug)]
pub struct Tree<T> {
    arena: NodeArena<T>,
    root: Option<NodeHandle>,
    traversal: TraversalStrategy,
    check_cycles: bool,
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Tree<T> {
    pub fn new() -> Self {
        Self::with_settings(&Settings::default())
    }

    pub fn with_settings(settings: &Settings) -> Self {
        Self {
            arena: NodeArena::new(),
            root: None,
            traversal: settings.traversal,
            check_cycles: settings.check_cycles,
        }
    }

    /// Strategy used by the `*_default` helpers and [`insert`](Self::insert).
    pub fn default_traversal(&self) -> TraversalStrategy {
        self.traversal
    }

    pub fn checks_cycles(&self) -> bool {
        self.check_cycles
    }

    pub fn arena(&self) -> &NodeArena<T> {
        &self.arena
    }

    /// Direct access to link management, bypassing cycle checks.
    pub fn arena_mut(&mut self) -> &mut NodeArena<T> {
        &mut self.arena
    }

    pub fn node(&self, handle: NodeHandle) -> Option<&Node<T>> {
        self.arena.get(handle)
    }

    pub fn node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node<T>> {
        self.arena.get_mut(handle)
    }

    /// Stores a detached node; attach it with [`add_node`](Self::add_node) or
    /// make it the root with [`set_root`](Self::set_root).
    pub fn create_node(&mut self, id: impl Into<String>, title: T) -> TreeResult<NodeHandle> {
        self.arena.insert(id, title)
    }

    pub fn root(&self) -> Option<NodeHandle> {
        self.root
    }

    pub fn set_root(&mut self, root: Option<NodeHandle>) {
        debug!(?root, "set root");
        self.root = root;
    }

    /// Creates a node and makes it the root.
    pub fn insert_root(&mut self, id: impl Into<String>, title: T) -> TreeResult<NodeHandle> {
        let handle = self.create_node(id, title)?;
        self.set_root(Some(handle));
        Ok(handle)
    }

    /// All nodes reachable from the root in breadth-first order.
    pub fn nodes(&self) -> Vec<NodeHandle> {
        let mut nodes = Vec::new();
        if let Some(root) = self.root {
            self.get_branch(&mut nodes, root);
        }
        nodes
    }

    pub fn size(&self) -> usize {
        BreadthFirst::new(&self.arena, self.root).count()
    }

    pub fn height(&self) -> usize {
        traverse::height(&self.arena, self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Iterates from `entry` in the given order.
    pub fn walk(&self, strategy: TraversalStrategy, entry: NodeHandle) -> Walk<'_, T> {
        Walk::new(&self.arena, strategy, Some(entry))
    }

    /// Applies `callback` to every node reachable from `entry`.
    pub fn traverse<F>(&self, strategy: TraversalStrategy, entry: NodeHandle, mut callback: F)
    where
        F: FnMut(NodeHandle, &Node<T>),
    {
        for (handle, node) in self.walk(strategy, entry) {
            callback(handle, node);
        }
    }

    /// Appends every node reachable breadth-first from `start` to `branch`.
    pub fn get_branch(&self, branch: &mut Vec<NodeHandle>, start: NodeHandle) {
        branch.extend(BreadthFirst::new(&self.arena, Some(start)).map(|(handle, _)| handle));
    }

    /// First node reachable from the root whose id equals `id`.
    #[instrument(level = "trace", skip(self))]
    pub fn find_node(&self, id: &str, strategy: TraversalStrategy) -> Option<NodeHandle> {
        let root = self.root?;
        self.walk(strategy, root)
            .find(|(_, node)| node.id == id)
            .map(|(handle, _)| handle)
    }

    pub fn find_node_default(&self, id: &str) -> Option<NodeHandle> {
        self.find_node(id, self.traversal)
    }

    /// Attaches `node` under the node with id `parent_id`.
    ///
    /// Re-attaching under an existing parent is a no-op.
    #[instrument(level = "debug", skip(self))]
    pub fn add_node(
        &mut self,
        node: NodeHandle,
        parent_id: &str,
        strategy: TraversalStrategy,
    ) -> TreeResult<()> {
        let parent = self
            .find_node(parent_id, strategy)
            .ok_or_else(|| TreeError::MissingParent(parent_id.to_string()))?;
        self.attach(parent, node)?;
        Ok(())
    }

    /// Creates a node and attaches it under `parent_id` in one step.
    ///
    /// On failure the created node is dropped again.
    pub fn insert(
        &mut self,
        id: impl Into<String>,
        title: T,
        parent_id: &str,
    ) -> TreeResult<NodeHandle> {
        let handle = self.create_node(id, title)?;
        if let Err(e) = self.add_node(handle, parent_id, self.traversal) {
            self.arena.remove(handle);
            return Err(e);
        }
        Ok(handle)
    }

    /// Relocates node `id` under `new_parent_id`.
    ///
    /// Without `keep_children` the node's children are first promoted onto
    /// every current parent of the node, so the subtree stays reachable.
    /// The node ends with the new parent as its only parent.
    #[instrument(level = "debug", skip(self))]
    pub fn move_node(
        &mut self,
        id: &str,
        new_parent_id: &str,
        keep_children: bool,
        strategy: TraversalStrategy,
    ) -> TreeResult<()> {
        let node = self
            .find_node(id, strategy)
            .ok_or_else(|| TreeError::NodeNotFound(id.to_string()))?;
        let parent = self
            .find_node(new_parent_id, strategy)
            .ok_or_else(|| TreeError::CannotMoveRoot(new_parent_id.to_string()))?;
        if !self.node_ref(node)?.has_parent() {
            return Err(TreeError::CannotMoveRoot(id.to_string()));
        }
        // Without kept children the node ends up a leaf, so only a self link can close a cycle
        let closes_cycle = if keep_children && self.check_cycles {
            self.reaches(node, parent)
        } else {
            node == parent
        };
        if closes_cycle {
            return Err(self.cycle_error(node, parent));
        }

        if !keep_children {
            self.promote_children(node)?;
        }
        self.detach_from_parents(node)?;
        self.arena.add_child(parent, node)?;
        debug!(id, new_parent_id, "moved node");
        Ok(())
    }

    /// Detaches node `id` from every parent and hands its handle back.
    ///
    /// With `keep_children` the children are promoted onto the removed node's
    /// parents first; otherwise they leave the tree together with it. The
    /// node itself stays in the arena until [`purge_detached`](Self::purge_detached).
    #[instrument(level = "debug", skip(self))]
    pub fn remove_node(
        &mut self,
        id: &str,
        keep_children: bool,
        strategy: TraversalStrategy,
    ) -> TreeResult<NodeHandle> {
        let node = self
            .find_node(id, strategy)
            .ok_or_else(|| TreeError::NodeNotFound(id.to_string()))?;
        if !self.node_ref(node)?.has_parent() {
            return Err(TreeError::CannotRemoveRoot(id.to_string()));
        }

        if keep_children {
            self.promote_children(node)?;
        }
        self.detach_from_parents(node)?;
        debug!(id, keep_children, "removed node");
        Ok(node)
    }

    /// Drops every arena node that is no longer reachable from the root.
    ///
    /// Returns the dropped ids and payloads; their handles go stale.
    #[instrument(level = "debug", skip(self))]
    pub fn purge_detached(&mut self) -> Vec<(String, T)> {
        let reachable: HashSet<NodeHandle> = self.nodes().into_iter().collect();
        let detached: Vec<NodeHandle> = self
            .arena
            .iter()
            .map(|(handle, _)| handle)
            .filter(|handle| !reachable.contains(handle))
            .collect();
        debug!(count = detached.len(), "purging detached nodes");
        detached
            .into_iter()
            .filter_map(|handle| self.arena.remove(handle))
            .map(|node| (node.id, node.title))
            .collect()
    }

    /// Links `child` under `parent`, rejecting links that would close a cycle.
    pub(crate) fn attach(&mut self, parent: NodeHandle, child: NodeHandle) -> TreeResult<bool> {
        self.node_ref(child)?;
        if parent == child || (self.check_cycles && self.reaches(child, parent)) {
            return Err(self.cycle_error(child, parent));
        }
        self.arena.add_child(parent, child)
    }

    fn node_ref(&self, handle: NodeHandle) -> TreeResult<&Node<T>> {
        self.arena.get(handle).ok_or(TreeError::StaleHandle(handle))
    }

    /// Whether `target` is `from` or one of its descendants.
    fn reaches(&self, from: NodeHandle, target: NodeHandle) -> bool {
        BreadthFirst::new(&self.arena, Some(from)).any(|(handle, _)| handle == target)
    }

    fn cycle_error(&self, node: NodeHandle, parent: NodeHandle) -> TreeError {
        let id_of = |h: NodeHandle| {
            self.arena
                .get(h)
                .map(|n| n.id.clone())
                .unwrap_or_else(|| format!("{h:?}"))
        };
        TreeError::CycleDetected {
            node: id_of(node),
            parent: id_of(parent),
        }
    }

    /// Re-parents every child of `node` onto all of `node`'s parents.
    fn promote_children(&mut self, node: NodeHandle) -> TreeResult<()> {
        let parents = self.node_ref(node)?.parents.clone();
        loop {
            let Some(&child) = self.node_ref(node)?.children.first() else {
                break;
            };
            for &parent in &parents {
                if parent != child {
                    self.arena.add_child(parent, child)?;
                }
            }
            self.arena.remove_child(node, child)?;
        }
        Ok(())
    }

    fn detach_from_parents(&mut self, node: NodeHandle) -> TreeResult<()> {
        loop {
            let Some(&parent) = self.node_ref(node)?.parents.first() else {
                break;
            };
            self.arena.remove_child(parent, node)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traverse::TraversalStrategy::{BreadthFirst as Bfs, DepthFirst as Dfs};

    fn sample() -> Tree<&'static str> {
        let mut tree = Tree::new();
        tree.insert_root("r", "root").unwrap();
        tree.insert("a", "A", "r").unwrap();
        tree.insert("b", "B", "a").unwrap();
        tree
    }

    #[test]
    fn given_empty_tree_when_measured_then_zero() {
        let tree: Tree<()> = Tree::new();
        assert_eq!(tree.root(), None);
        assert_eq!(tree.size(), 0);
        assert_eq!(tree.height(), 0);
        assert!(tree.nodes().is_empty());
        assert_eq!(tree.find_node("r", Bfs), None);
    }

    #[test]
    fn given_root_only_when_measured_then_height_one() {
        let mut tree = Tree::new();
        tree.insert_root("r", "root node").unwrap();
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.size(), 1);
    }

    #[test]
    fn given_chain_when_searched_with_either_strategy_then_found() {
        let tree = sample();
        for strategy in [Bfs, Dfs] {
            let b = tree.find_node("b", strategy).unwrap();
            assert_eq!(*tree.node(b).unwrap().title(), "B");
        }
    }

    #[test]
    fn given_failing_insert_when_parent_missing_then_node_not_kept() {
        let mut tree = sample();
        let err = tree.insert("x", "X", "nope").unwrap_err();
        assert_eq!(err, TreeError::MissingParent("nope".into()));
        assert_eq!(tree.arena().len(), 3);
        assert!(tree.arena().find_by_id("x").is_none());
    }

    #[test]
    fn given_move_of_root_when_requested_then_rejected() {
        let mut tree = sample();
        assert_eq!(
            tree.move_node("r", "b", false, Bfs).unwrap_err(),
            TreeError::CannotMoveRoot("r".into())
        );
        assert_eq!(tree.height(), 3);
    }

    #[test]
    fn given_callback_when_traversed_then_visits_every_node() {
        let tree = sample();
        let mut seen = Vec::new();
        tree.traverse(Dfs, tree.root().unwrap(), |_, node| seen.push(node.id().to_string()));
        assert_eq!(seen, vec!["b", "a", "r"]);
    }

    #[test]
    fn given_detached_nodes_when_purged_then_handles_go_stale() {
        let mut tree = sample();
        let a = tree.remove_node("a", false, Bfs).unwrap();
        let b = tree.arena().find_by_id("b").unwrap();
        let mut purged = tree.purge_detached();
        purged.sort();
        assert_eq!(purged, vec![("a".to_string(), "A"), ("b".to_string(), "B")]);
        assert!(tree.node(a).is_none());
        assert!(tree.node(b).is_none());
        assert_eq!(tree.arena().len(), 1);
    }
}
