//! In-memory multi-parent node graph ("tree") with symmetric parent/child
//! links, breadth-first and depth-first traversal, and structural mutation.
//!
//! Nodes live in a generational arena and refer to each other through
//! [`NodeHandle`]s, so a node may have any number of parents without creating
//! ownership cycles.
//!
//! ```
//! use dagtree::{TraversalStrategy, Tree};
//!
//! let mut tree = Tree::new();
//! tree.insert_root("r", "root").unwrap();
//! tree.insert("a", "A", "r").unwrap();
//! tree.insert("b", "B", "a").unwrap();
//! assert_eq!(tree.height(), 3);
//!
//! tree.remove_node("a", true, TraversalStrategy::BreadthFirst).unwrap();
//! assert_eq!(tree.size(), 2);
//! assert_eq!(tree.height(), 2);
//! ```

pub mod config;
pub mod domain;
pub mod errors;
pub mod util;

pub use config::Settings;
pub use domain::{
    Node, NodeArena, NodeHandle, TraversalStrategy, Tree, TreeBuilder, TreeError, TreeResult,
};
pub use errors::{ConfigError, ConfigResult};
