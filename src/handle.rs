use std::fmt;

use thiserror::Error;

use crate::node::NodePtr;

/// Identifies a tree and the state of its node set.
///
/// `generation` moves whenever a node may have been freed or had its entry
/// moved to another node, which is exactly when an old handle stops being
/// safe to follow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Stamp {
    pub(crate) tree: u64,
    pub(crate) generation: u64,
}

/// Names a node of an [`AvlTree`](crate::AvlTree) without borrowing the tree.
///
/// Obtained from [`NodeRef::handle`](crate::NodeRef::handle). A handle keeps
/// resolving through insertions and value overwrites, but any removal from
/// the tree (including [`clear`](crate::AvlTree::clear)) invalidates it, and
/// it never resolves against a different tree.
pub struct NodeHandle<K, V> {
    node_ptr: NodePtr<K, V>,
    stamp: Stamp,
}

/// Why a [`NodeHandle`] could not be resolved.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HandleError {
    /// The handle was taken from another tree.
    #[error("node handle belongs to a different tree")]
    ForeignTree,

    /// A removal happened after the handle was taken.
    #[error("node handle is stale: taken at generation {handle}, tree is at generation {tree}")]
    Stale { handle: u64, tree: u64 },
}

impl<K, V> NodeHandle<K, V> {
    pub(crate) fn new(node_ptr: NodePtr<K, V>, stamp: Stamp) -> Self {
        Self { node_ptr, stamp }
    }

    /// Returns the node pointer if the handle is still valid for a tree in state `current`.
    pub(crate) fn resolve(self, current: Stamp) -> Result<NodePtr<K, V>, HandleError> {
        if self.stamp.tree != current.tree {
            return Err(HandleError::ForeignTree);
        }
        if self.stamp.generation != current.generation {
            return Err(HandleError::Stale {
                handle: self.stamp.generation,
                tree: current.generation,
            });
        }
        Ok(self.node_ptr)
    }
}

impl<K, V> Clone for NodeHandle<K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for NodeHandle<K, V> {}

impl<K, V> PartialEq for NodeHandle<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.node_ptr == other.node_ptr && self.stamp == other.stamp
    }
}

impl<K, V> Eq for NodeHandle<K, V> {}

impl<K, V> fmt::Debug for NodeHandle<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeHandle")
            .field("tree", &self.stamp.tree)
            .field("generation", &self.stamp.generation)
            .finish()
    }
}
