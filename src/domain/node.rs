use generational_arena::Index;

/// Stable handle to a node stored in a [`NodeArena`](crate::domain::NodeArena).
///
/// Handles stay valid while the node lives in the arena, including after it
/// has been detached from the tree. Once the node is purged the handle goes
/// stale and every lookup through it returns `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(pub(crate) Index);

/// Graph node carrying an identifier, an opaque payload and its links.
#[derive(Debug, Clone)]
pub struct Node<T> {
    /// Lookup key, unique within an arena
    pub(crate) id: String,
    /// Payload, never interpreted by the tree
    pub(crate) title: T,
    /// Parent handles in link order
    pub(crate) parents: Vec<NodeHandle>,
    /// Child handles in link order
    pub(crate) children: Vec<NodeHandle>,
}

impl<T> Node<T> {
    pub(crate) fn new(id: impl Into<String>, title: T) -> Self {
        Self {
            id: id.into(),
            title,
            parents: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &T {
        &self.title
    }

    pub fn title_mut(&mut self) -> &mut T {
        &mut self.title
    }

    pub fn parents(&self) -> &[NodeHandle] {
        &self.parents
    }

    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn has_parent(&self) -> bool {
        !self.parents.is_empty()
    }

    pub fn is_parent_of(&self, child: NodeHandle) -> bool {
        self.children.contains(&child)
    }

    pub fn is_child_of(&self, parent: NodeHandle) -> bool {
        self.parents.contains(&parent)
    }
}
