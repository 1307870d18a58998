//! An ordered dictionary implemented with an AVL tree.
//!
//! [`AvlTree`] supports search, insertion with a choice of starting point
//! ([`Start`]), deletion by node handle or by key, and in-order export. Each
//! mutation returns how much rebalancing it took, and the tree keeps the
//! maximum key and the share of perfectly balanced nodes up to date without
//! rescanning.
//!
//! Optional features:
//! - `tracing`: log rotations and rejected handles through the `tracing` crate.
//! - `serde`: serialize and deserialize a tree as an ordered map.
//! - `consistency_check`: expose `AvlTree::check_consistency` outside of tests.

#[macro_use]
mod tracing_helpers;

mod handle;
mod node;
mod tree;

#[cfg(feature = "serde")]
mod serialize;

pub use handle::{HandleError, NodeHandle};
pub use node::NodeRef;
pub use tree::{AvlTree, Start};

#[cfg(test)]
mod proptests;
