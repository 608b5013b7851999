//! An ordered set of keys kept in a self-balancing AVL tree.
//!
//! Insert, remove and search take O(log n) comparisons. After every
//! completed operation each node's subtrees differ in height by at most one.

mod error;
mod tree;

pub use error::{Error, Result};
pub use tree::AvlTree;
