use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::handle::{NodeHandle, Stamp};

pub(crate) type NodePtr<K, V> = NonNull<Node<K, V>>;
pub(crate) type Link<K, V> = Option<NodePtr<K, V>>;

/// Height of a missing child.
pub(crate) const MISSING_HEIGHT: i32 = -1;

pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) left: Link<K, V>,
    pub(crate) right: Link<K, V>,
    pub(crate) parent: Link<K, V>,
    pub(crate) height: i32,
    pub(crate) balance: i32,
}

impl<K, V> Node<K, V> {
    /// Allocates a leaf. Both children are missing, so its height and balance are 0.
    pub(crate) fn create(parent: Link<K, V>, key: K, value: V) -> NodePtr<K, V> {
        let boxed = Box::new(Node {
            key,
            value,
            parent,
            left: None,
            right: None,
            height: 0,
            balance: 0,
        });
        NonNull::from(Box::leak(boxed))
    }

    /// Frees a node and hands back its entry.
    ///
    /// # Safety
    ///
    /// `node_ptr` must come from `Node::create`, must not have been destroyed
    /// before, and must be unreachable from the tree once this returns.
    pub(crate) unsafe fn destroy(node_ptr: NodePtr<K, V>) -> (K, V) {
        let boxed = unsafe { Box::from_raw(node_ptr.as_ptr()) };
        let Node { key, value, .. } = *boxed;
        (key, value)
    }
}

pub(crate) fn link_height<K, V>(link: Link<K, V>) -> i32 {
    match link {
        None => MISSING_HEIGHT,
        Some(node_ptr) => unsafe { node_ptr.as_ref().height },
    }
}

pub(crate) fn leftmost<K, V>(mut node_ptr: NodePtr<K, V>) -> NodePtr<K, V> {
    while let Some(left_ptr) = unsafe { node_ptr.as_ref().left } {
        node_ptr = left_ptr;
    }
    node_ptr
}

pub(crate) fn rightmost<K, V>(mut node_ptr: NodePtr<K, V>) -> NodePtr<K, V> {
    while let Some(right_ptr) = unsafe { node_ptr.as_ref().right } {
        node_ptr = right_ptr;
    }
    node_ptr
}

/// A shared view of one node of an [`AvlTree`](crate::AvlTree).
///
/// The view borrows the tree, so the tree cannot change while it is alive.
/// Use [`handle`](NodeRef::handle) to name the node across a mutation,
/// e.g. to [`delete`](crate::AvlTree::delete) it.
pub struct NodeRef<'a, K, V> {
    node_ptr: NodePtr<K, V>,
    stamp: Stamp,
    marker: PhantomData<&'a Node<K, V>>,
}

impl<'a, K, V> NodeRef<'a, K, V> {
    pub(crate) fn new(node_ptr: NodePtr<K, V>, stamp: Stamp) -> Self {
        Self {
            node_ptr,
            stamp,
            marker: PhantomData,
        }
    }

    fn node(&self) -> &'a Node<K, V> {
        unsafe { &*self.node_ptr.as_ptr() }
    }

    fn wrap(&self, link: Link<K, V>) -> Option<NodeRef<'a, K, V>> {
        link.map(|node_ptr| NodeRef::new(node_ptr, self.stamp))
    }

    /// Key stored in this node.
    pub fn key(&self) -> &'a K {
        &self.node().key
    }

    /// Value stored in this node.
    pub fn value(&self) -> &'a V {
        &self.node().value
    }

    /// Height of the subtree rooted here; a leaf has height 0.
    pub fn height(&self) -> i32 {
        self.node().height
    }

    /// Height of the left subtree minus height of the right subtree,
    /// counting a missing child as height -1.
    pub fn balance_factor(&self) -> i32 {
        self.node().balance
    }

    /// Returns `true` if the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.node().left.is_none() && self.node().right.is_none()
    }

    /// Left child, holding the smaller keys.
    pub fn left(&self) -> Option<NodeRef<'a, K, V>> {
        self.wrap(self.node().left)
    }

    /// Right child, holding the larger keys.
    pub fn right(&self) -> Option<NodeRef<'a, K, V>> {
        self.wrap(self.node().right)
    }

    /// Parent node, or `None` at the root.
    pub fn parent(&self) -> Option<NodeRef<'a, K, V>> {
        self.wrap(self.node().parent)
    }

    /// Returns the node holding the next larger key, if any.
    pub fn successor(&self) -> Option<NodeRef<'a, K, V>> {
        if let Some(right_ptr) = self.node().right {
            return self.wrap(Some(leftmost(right_ptr)));
        }
        let mut child_ptr = self.node_ptr;
        let mut current = self.node().parent;
        while let Some(parent_ptr) = current {
            let parent = unsafe { parent_ptr.as_ref() };
            if parent.right != Some(child_ptr) {
                break;
            }
            child_ptr = parent_ptr;
            current = parent.parent;
        }
        self.wrap(current)
    }

    /// Returns a handle naming this node that outlives the borrow of the tree.
    pub fn handle(&self) -> NodeHandle<K, V> {
        NodeHandle::new(self.node_ptr, self.stamp)
    }
}

impl<K, V> Clone for NodeRef<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for NodeRef<'_, K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for NodeRef<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("key", self.key())
            .field("value", self.value())
            .field("height", &self.height())
            .field("balance_factor", &self.balance_factor())
            .finish()
    }
}
