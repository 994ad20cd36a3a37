//! Breadth-first and depth-first walkers plus height computation.
//!
//! Every walk owns its queue or stack and its visited set, so nothing is
//! shared between calls. A node reachable through several parents is yielded
//! once, and a cycle in the graph cannot make a walk loop forever.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::domain::arena::NodeArena;
use crate::domain::node::{Node, NodeHandle};

/// Order in which lookups and mutations walk the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalStrategy {
    /// Level order
    #[default]
    BreadthFirst,
    /// Post-order: every child subtree before the node itself
    DepthFirst,
}

impl fmt::Display for TraversalStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraversalStrategy::BreadthFirst => write!(f, "breadth_first"),
            TraversalStrategy::DepthFirst => write!(f, "depth_first"),
        }
    }
}

impl FromStr for TraversalStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "breadth_first" | "bfs" => Ok(TraversalStrategy::BreadthFirst),
            "depth_first" | "dfs" => Ok(TraversalStrategy::DepthFirst),
            other => Err(format!("unknown traversal strategy: {other}")),
        }
    }
}

/// Level-order walk backed by a FIFO queue.
pub struct BreadthFirst<'a, T> {
    arena: &'a NodeArena<T>,
    queue: VecDeque<NodeHandle>,
    visited: HashSet<NodeHandle>,
}

impl<'a, T> BreadthFirst<'a, T> {
    #[instrument(level = "trace", skip(arena))]
    pub fn new(arena: &'a NodeArena<T>, entry: Option<NodeHandle>) -> Self {
        let mut queue = VecDeque::new();
        let mut visited = HashSet::new();
        if let Some(entry) = entry.filter(|&h| arena.contains(h)) {
            queue.push_back(entry);
            visited.insert(entry);
        }
        Self {
            arena,
            queue,
            visited,
        }
    }
}

impl<'a, T> Iterator for BreadthFirst<'a, T> {
    type Item = (NodeHandle, &'a Node<T>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.queue.pop_front() {
            if let Some(node) = self.arena.get(current) {
                for &child in node.children() {
                    if self.visited.insert(child) {
                        self.queue.push_back(child);
                    }
                }
                return Some((current, node));
            }
        }
        None
    }
}

/// Post-order walk backed by an explicit stack.
///
/// A node is claimed by the first path that expands it, matching what a
/// recursive walk with a visited set would produce.
pub struct DepthFirst<'a, T> {
    arena: &'a NodeArena<T>,
    stack: Vec<(NodeHandle, bool)>,
    visited: HashSet<NodeHandle>,
}

impl<'a, T> DepthFirst<'a, T> {
    #[instrument(level = "trace", skip(arena))]
    pub fn new(arena: &'a NodeArena<T>, entry: Option<NodeHandle>) -> Self {
        let mut stack = Vec::new();
        if let Some(entry) = entry.filter(|&h| arena.contains(h)) {
            stack.push((entry, false));
        }
        Self {
            arena,
            stack,
            visited: HashSet::new(),
        }
    }
}

impl<'a, T> Iterator for DepthFirst<'a, T> {
    type Item = (NodeHandle, &'a Node<T>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current, expanded)) = self.stack.pop() {
            let Some(node) = self.arena.get(current) else {
                continue;
            };
            if expanded {
                return Some((current, node));
            }
            if !self.visited.insert(current) {
                continue;
            }
            self.stack.push((current, true));
            // Reverse so the first child is expanded first
            for &child in node.children().iter().rev() {
                if !self.visited.contains(&child) {
                    self.stack.push((child, false));
                }
            }
        }
        None
    }
}

/// Walk selected at runtime from a [`TraversalStrategy`].
pub enum Walk<'a, T> {
    BreadthFirst(BreadthFirst<'a, T>),
    DepthFirst(DepthFirst<'a, T>),
}

impl<'a, T> Walk<'a, T> {
    pub fn new(
        arena: &'a NodeArena<T>,
        strategy: TraversalStrategy,
        entry: Option<NodeHandle>,
    ) -> Self {
        match strategy {
            TraversalStrategy::BreadthFirst => {
                Walk::BreadthFirst(BreadthFirst::new(arena, entry))
            }
            TraversalStrategy::DepthFirst => Walk::DepthFirst(DepthFirst::new(arena, entry)),
        }
    }
}

impl<'a, T> Iterator for Walk<'a, T> {
    type Item = (NodeHandle, &'a Node<T>);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Walk::BreadthFirst(walk) => walk.next(),
            Walk::DepthFirst(walk) => walk.next(),
        }
    }
}

/// Longest child chain below `entry`, counting `entry` itself.
///
/// A leaf has height 1 and a missing entry height 0. Edges pointing back into
/// the path currently being measured are ignored.
#[instrument(level = "debug", skip(arena))]
pub fn height<T>(arena: &NodeArena<T>, entry: Option<NodeHandle>) -> usize {
    let mut memo = HashMap::new();
    let mut path = HashSet::new();
    entry.map_or(0, |entry| branch_height(arena, entry, &mut memo, &mut path))
}

fn branch_height<T>(
    arena: &NodeArena<T>,
    handle: NodeHandle,
    memo: &mut HashMap<NodeHandle, usize>,
    path: &mut HashSet<NodeHandle>,
) -> usize {
    if let Some(&known) = memo.get(&handle) {
        return known;
    }
    let Some(node) = arena.get(handle) else {
        return 0;
    };
    path.insert(handle);
    let mut max_child = 0;
    for &child in node.children() {
        if path.contains(&child) {
            continue;
        }
        max_child = max_child.max(branch_height(arena, child, memo, path));
    }
    path.remove(&handle);
    let result = 1 + max_child;
    memo.insert(handle, result);
    result
}
