//! Tree builder for assembling multi-parent hierarchies from declarations.

use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::config::Settings;
use crate::domain::error::{TreeError, TreeResult};
use crate::domain::node::NodeHandle;
use crate::domain::tree::Tree;

struct Declaration<T> {
    id: String,
    title: T,
    parents: Vec<String>,
}

/// Constructs a [`Tree`] from `(id, title, parent ids)` declarations.
///
/// Declarations may come in any order; parents are resolved once every node
/// is known. Exactly one declaration must have no parents, it becomes the
/// root.
pub struct TreeBuilder<T> {
    declarations: Vec<Declaration<T>>,
    settings: Settings,
}

impl<T> Default for TreeBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TreeBuilder<T> {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            declarations: Vec::new(),
            settings,
        }
    }

    /// Declares a node and the ids of its parents.
    pub fn node<I, S>(&mut self, id: impl Into<String>, title: T, parents: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declarations.push(Declaration {
            id: id.into(),
            title,
            parents: parents.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Creates every declared node, links it to its parents and sets the root.
    #[instrument(level = "debug", skip(self))]
    pub fn build(&mut self) -> TreeResult<Tree<T>> {
        let mut tree = Tree::with_settings(&self.settings);
        if self.declarations.is_empty() {
            return Ok(tree);
        }

        let mut handles: HashMap<String, NodeHandle> = HashMap::new();
        let mut links: Vec<(NodeHandle, Vec<String>)> = Vec::new();
        let mut roots: Vec<NodeHandle> = Vec::new();
        for decl in self.declarations.drain(..) {
            let handle = tree.create_node(decl.id.clone(), decl.title)?;
            handles.insert(decl.id, handle);
            if decl.parents.is_empty() {
                roots.push(handle);
            }
            links.push((handle, decl.parents));
        }

        let root = match roots.as_slice() {
            [root] => *root,
            [] => {
                // Every node has a parent, so the declarations loop back on themselves
                let (first, parents) = &links[0];
                let id = node_id(&tree, *first);
                return Err(TreeError::CycleDetected {
                    node: id,
                    parent: parents[0].clone(),
                });
            }
            [_, second, ..] => return Err(TreeError::InvalidRoot(node_id(&tree, *second))),
        };
        tree.set_root(Some(root));

        for (child, parents) in links {
            for parent_id in parents {
                let parent = *handles
                    .get(&parent_id)
                    .ok_or(TreeError::MissingParent(parent_id))?;
                tree.attach(parent, child)?;
            }
        }
        debug!(size = tree.size(), "built tree");
        Ok(tree)
    }
}

fn node_id<T>(tree: &Tree<T>, handle: NodeHandle) -> String {
    tree.node(handle)
        .map(|n| n.id().to_string())
        .unwrap_or_default()
}
