//! Domain layer: nodes, link management, traversal and tree mutation
//!
//! This layer is independent of external concerns (no I/O, no config loading).

pub mod arena;
pub mod builder;
pub mod error;
pub mod node;
pub mod traverse;
pub mod tree;

pub use arena::NodeArena;
pub use builder::TreeBuilder;
pub use error::{TreeError, TreeResult};
pub use node::{Node, NodeHandle};
pub use traverse::{height, BreadthFirst, DepthFirst, TraversalStrategy, Walk};
pub use tree::Tree;
