mod rebalance;

use std::cmp::Ordering;
use std::fmt;
use std::mem;
use std::sync::atomic::{self, AtomicU64};

use crate::handle::{HandleError, NodeHandle, Stamp};
use crate::node::{self, Link, Node, NodePtr, NodeRef};
use rebalance::Mode;

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(0);

/// Where [`AvlTree::insert`] starts looking for the place of a new key.
///
/// Both starts produce the same tree; they differ only in how many nodes
/// are visited on the way.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Start {
    /// Descend from the root.
    #[default]
    Root,
    /// Climb from the node holding the maximum key up to the first ancestor
    /// with a smaller key, then descend from there. A key larger than the
    /// current maximum is attached below the maximum without any descent.
    Max,
}

/// An ordered dictionary implemented with an AVL tree.
///
/// Besides the usual map operations the tree keeps the node holding the
/// maximum key and the number of nodes whose balance factor is 0, and every
/// mutation reports how much rebalancing work it did.
///
/// ```
/// use avl_dict::{AvlTree, Start};
/// let mut tree = AvlTree::new();
/// tree.insert(1, "one", Start::Root);
/// tree.insert(2, "two", Start::Max);
/// tree.insert(3, "three", Start::Max);
/// assert_eq!(tree.root().map(|root| *root.key()), Some(2));
///
/// let node = tree.search(&1).unwrap().handle();
/// tree.delete(node);
/// assert!(tree.search(&1).is_none());
/// assert_eq!(tree.max_key(), Some(&3));
/// ```
pub struct AvlTree<K, V> {
    root: Link<K, V>,
    max_node: Link<K, V>,
    num_nodes: usize,
    num_balanced: usize,
    id: u64,
    generation: u64,
}

enum InsertPos<K, V> {
    Occupied(NodePtr<K, V>),
    Vacant(Link<K, V>),
}

#[allow(clippy::enum_variant_names)]
enum Direction {
    FromParent,
    FromLeft,
    FromRight,
}

impl<K, V> AvlTree<K, V> {
    /// Creates an empty tree.
    /// No memory is allocated until the first entry is inserted.
    pub fn new() -> Self {
        Self {
            root: None,
            max_node: None,
            num_nodes: 0,
            num_balanced: 0,
            id: NEXT_TREE_ID.fetch_add(1, atomic::Ordering::Relaxed),
            generation: 0,
        }
    }

    /// Returns true if the tree contains no entries.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of entries in the tree.
    pub fn len(&self) -> usize {
        self.num_nodes
    }

    /// Returns the height of the tree: 0 for a single entry, -1 when empty.
    pub fn height(&self) -> i32 {
        node::link_height(self.root)
    }

    /// Returns the number of nodes whose balance factor is 0.
    pub fn zero_balance_count(&self) -> usize {
        self.num_balanced
    }

    /// Returns the fraction of nodes whose balance factor is 0, or 0.0 for an empty tree.
    pub fn balance_ratio(&self) -> f64 {
        if self.num_nodes == 0 {
            return 0.0;
        }
        self.num_balanced as f64 / self.num_nodes as f64
    }

    /// Returns the root node.
    pub fn root(&self) -> Option<NodeRef<'_, K, V>> {
        self.node_ref(self.root)
    }

    /// Returns the node holding the maximum key.
    pub fn max(&self) -> Option<NodeRef<'_, K, V>> {
        self.node_ref(self.max_node)
    }

    /// Returns the maximum key.
    pub fn max_key(&self) -> Option<&K> {
        self.max_node.map(|node_ptr| &unsafe { &*node_ptr.as_ptr() }.key)
    }

    /// Returns all entries ordered by key.
    pub fn avl_to_array(&self) -> Vec<(&K, &V)> {
        let mut entries = Vec::with_capacity(self.num_nodes);
        self.inorder(|node_ptr| {
            let node = unsafe { &*node_ptr.as_ptr() };
            entries.push((&node.key, &node.value));
        });
        entries
    }

    /// Clears the tree, deallocating all memory.
    /// Invalidates every outstanding [`NodeHandle`].
    pub fn clear(&mut self) {
        debug_log!(tree = self.id, nodes = self.num_nodes, "clearing tree");
        self.postorder(|node_ptr| unsafe {
            Node::destroy(node_ptr);
        });
        self.root = None;
        self.max_node = None;
        self.num_nodes = 0;
        self.num_balanced = 0;
        self.generation += 1;
    }

    /// Resolves a handle taken from this tree.
    pub fn node(&self, handle: NodeHandle<K, V>) -> Result<NodeRef<'_, K, V>, HandleError> {
        let node_ptr = handle.resolve(self.stamp())?;
        Ok(NodeRef::new(node_ptr, self.stamp()))
    }

    fn stamp(&self) -> Stamp {
        Stamp {
            tree: self.id,
            generation: self.generation,
        }
    }

    fn node_ref(&self, link: Link<K, V>) -> Option<NodeRef<'_, K, V>> {
        link.map(|node_ptr| NodeRef::new(node_ptr, self.stamp()))
    }

    fn rightmost(&self) -> Link<K, V> {
        self.root.map(node::rightmost)
    }

    /// Puts `new` where `old` hangs below `parent`, or at the root when there is no parent.
    fn replace_child(&mut self, parent: Link<K, V>, old: NodePtr<K, V>, new: Link<K, V>) {
        match parent {
            None => self.root = new,
            Some(mut parent_ptr) => unsafe {
                if parent_ptr.as_ref().left == Some(old) {
                    parent_ptr.as_mut().left = new;
                } else {
                    parent_ptr.as_mut().right = new;
                }
            },
        }
    }

    #[cfg(any(test, feature = "consistency_check"))]
    fn preorder<F: FnMut(NodePtr<K, V>)>(&self, f: F) {
        self.traverse(f, |_| {}, |_| {});
    }

    fn inorder<F: FnMut(NodePtr<K, V>)>(&self, f: F) {
        self.traverse(|_| {}, f, |_| {});
    }

    fn postorder<F: FnMut(NodePtr<K, V>)>(&self, f: F) {
        self.traverse(|_| {}, |_| {}, f);
    }

    fn traverse<Pre, In, Post>(&self, mut preorder: Pre, mut inorder: In, mut postorder: Post)
    where
        Pre: FnMut(NodePtr<K, V>),
        In: FnMut(NodePtr<K, V>),
        Post: FnMut(NodePtr<K, V>),
    {
        if let Some(mut node_ptr) = self.root {
            let mut dir = Direction::FromParent;
            loop {
                match dir {
                    Direction::FromParent => {
                        preorder(node_ptr);
                        if let Some(left_ptr) = unsafe { node_ptr.as_ref().left } {
                            node_ptr = left_ptr;
                        } else {
                            dir = Direction::FromLeft;
                        }
                    }
                    Direction::FromLeft => {
                        inorder(node_ptr);
                        if let Some(right_ptr) = unsafe { node_ptr.as_ref().right } {
                            node_ptr = right_ptr;
                            dir = Direction::FromParent;
                        } else {
                            dir = Direction::FromRight;
                        }
                    }
                    Direction::FromRight => {
                        // Post order traversal is used for node deletion,
                        // so make sure not to use node pointer after postorder call.
                        if let Some(parent_ptr) = unsafe { node_ptr.as_ref().parent } {
                            if Some(node_ptr) == unsafe { parent_ptr.as_ref().left } {
                                dir = Direction::FromLeft;
                            } else {
                                dir = Direction::FromRight;
                            }
                            postorder(node_ptr);
                            node_ptr = parent_ptr;
                        } else {
                            postorder(node_ptr);
                            break;
                        }
                    }
                }
            }
        }
    }
}

impl<K: Ord, V> AvlTree<K, V> {
    /// Returns the node holding `key`.
    pub fn search(&self, key: &K) -> Option<NodeRef<'_, K, V>> {
        self.node_ref(self.find(key))
    }

    /// Returns a reference to the value corresponding to the key.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.find(key).map(|node_ptr| &unsafe { &*node_ptr.as_ptr() }.value)
    }

    /// Returns true if the tree contains `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Inserts a key-value pair, starting the search for its place at `start`.
    ///
    /// If the key is already present its value is replaced and nothing else
    /// changes. Returns the rebalancing cost: one per rotation plus one per
    /// ancestor whose height changed without a rotation.
    pub fn insert(&mut self, key: K, value: V, start: Start) -> usize {
        let parent = match self.find_insert_pos(&key, start) {
            InsertPos::Occupied(mut node_ptr) => {
                unsafe { node_ptr.as_mut().value = value };
                return 0;
            }
            InsertPos::Vacant(parent) => parent,
        };

        let node_ptr = Node::create(parent, key, value);
        unsafe {
            match parent {
                None => self.root = Some(node_ptr),
                Some(mut parent_ptr) => {
                    if node_ptr.as_ref().key < parent_ptr.as_ref().key {
                        parent_ptr.as_mut().left = Some(node_ptr);
                    } else {
                        parent_ptr.as_mut().right = Some(node_ptr);
                    }
                }
            }
            let is_new_max = match self.max_node {
                None => true,
                Some(max_ptr) => node_ptr.as_ref().key > max_ptr.as_ref().key,
            };
            if is_new_max {
                self.max_node = Some(node_ptr);
            }
        }
        self.num_nodes += 1;
        self.num_balanced += 1;

        self.rebalance_upward(parent, Mode::Insert)
    }

    /// Deletes the node named by `handle` and returns the rebalancing cost.
    ///
    /// A handle that does not resolve against this tree is ignored and
    /// reported as no work; see [`try_delete`](Self::try_delete) for the reason.
    pub fn delete(&mut self, handle: NodeHandle<K, V>) -> usize {
        match self.try_delete(handle) {
            Ok(rebalanced) => rebalanced,
            Err(_error) => {
                warn_log!(tree = self.id, error = %_error, "ignoring delete");
                0
            }
        }
    }

    /// Deletes the node named by `handle` and returns the rebalancing cost,
    /// or the reason the handle does not name a node of this tree.
    pub fn try_delete(&mut self, handle: NodeHandle<K, V>) -> Result<usize, HandleError> {
        let node_ptr = handle.resolve(self.stamp())?;
        let (_, _, rebalanced) = self.unlink_node(node_ptr);
        Ok(rebalanced)
    }

    /// Removes a key from the tree.
    /// Returns the value at the key if the key was previously in the tree.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let node_ptr = self.find(key)?;
        debug_assert!(self.num_nodes >= 1);
        let (_, value, _) = self.unlink_node(node_ptr);
        debug_assert!(self.find(key).is_none());
        Some(value)
    }

    /// Asserts every structural invariant of the tree, panicking on the first violation.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        unsafe {
            // Check root link
            if let Some(root_ptr) = self.root {
                assert!(root_ptr.as_ref().parent.is_none());
            }

            // Check tree nodes
            let mut num_nodes = 0;
            let mut num_balanced = 0;
            self.preorder(|node_ptr| {
                let node = node_ptr.as_ref();

                // Check link for left child node
                if let Some(left_ptr) = node.left {
                    assert!(left_ptr.as_ref().parent == Some(node_ptr));
                    assert!(left_ptr.as_ref().key < node.key);
                }

                // Check link for right child node
                if let Some(right_ptr) = node.right {
                    assert!(right_ptr.as_ref().parent == Some(node_ptr));
                    assert!(right_ptr.as_ref().key > node.key);
                }

                // Check height and balance factor
                let left_height = node::link_height(node.left);
                let right_height = node::link_height(node.right);
                assert_eq!(node.height, 1 + std::cmp::max(left_height, right_height));
                assert_eq!(node.balance, left_height - right_height);

                // Check AVL condition (nearly balance)
                assert!(node.balance.abs() <= 1);

                if node.balance == 0 {
                    num_balanced += 1;
                }
                num_nodes += 1;
            });

            // Check counters
            assert_eq!(num_nodes, self.num_nodes);
            assert_eq!(num_balanced, self.num_balanced);

            // Check key order
            let entries = self.avl_to_array();
            assert!(entries.windows(2).all(|pair| pair[0].0 < pair[1].0));

            // Check maximum
            assert!(self.max_node == self.rightmost());
            if let Some(max_ptr) = self.max_node {
                assert!(max_ptr.as_ref().right.is_none());
            }
        }
    }

    fn find(&self, key: &K) -> Link<K, V> {
        let mut current = self.root;
        while let Some(node_ptr) = current {
            current = unsafe {
                match key.cmp(&node_ptr.as_ref().key) {
                    Ordering::Equal => break,
                    Ordering::Less => node_ptr.as_ref().left,
                    Ordering::Greater => node_ptr.as_ref().right,
                }
            }
        }
        current
    }

    fn find_insert_pos(&self, key: &K, start: Start) -> InsertPos<K, V> {
        let mut parent: Link<K, V> = None;
        let mut current = match start {
            Start::Root => self.root,
            Start::Max => self.climb_from_max(key),
        };
        while let Some(node_ptr) = current {
            parent = current;
            current = unsafe {
                match key.cmp(&node_ptr.as_ref().key) {
                    Ordering::Equal => return InsertPos::Occupied(node_ptr),
                    Ordering::Less => node_ptr.as_ref().left,
                    Ordering::Greater => node_ptr.as_ref().right,
                }
            }
        }
        InsertPos::Vacant(parent)
    }

    /// Finds the lowest node on the path from the maximum to the root whose
    /// key is smaller than `key`. Every key above it lies in its subtree,
    /// so descending from it reaches the same place as descending from the root.
    fn climb_from_max(&self, key: &K) -> Link<K, V> {
        let mut current = self.max_node;
        while let Some(node_ptr) = current {
            if unsafe { *key > node_ptr.as_ref().key } {
                return current;
            }
            current = unsafe { node_ptr.as_ref().parent };
        }
        self.root
    }

    /// Removes a node from the tree, frees it and rebalances.
    /// Returns the removed entry and the rebalancing cost.
    fn unlink_node(&mut self, node_ptr: NodePtr<K, V>) -> (K, V, usize) {
        unsafe {
            // A node with two children trades its entry with its successor,
            // which has no left child and is removed in its place.
            let mut target_ptr = node_ptr;
            if let (Some(_), Some(right_ptr)) = (node_ptr.as_ref().left, node_ptr.as_ref().right) {
                let successor_ptr = node::leftmost(right_ptr);
                let node = &mut *node_ptr.as_ptr();
                let successor = &mut *successor_ptr.as_ptr();
                mem::swap(&mut node.key, &mut successor.key);
                mem::swap(&mut node.value, &mut successor.value);
                target_ptr = successor_ptr;
            }

            // Target node is stem or leaf
            debug_assert!(
                target_ptr.as_ref().left.is_none() || target_ptr.as_ref().right.is_none()
            );
            if target_ptr.as_ref().balance == 0 {
                self.num_balanced -= 1;
            }
            let child = target_ptr.as_ref().left.or(target_ptr.as_ref().right);
            let parent = target_ptr.as_ref().parent;
            if let Some(mut child_ptr) = child {
                child_ptr.as_mut().parent = parent;
            }
            self.replace_child(parent, target_ptr, child);

            self.num_nodes -= 1;
            if self.max_node == Some(target_ptr) {
                self.max_node = self.rightmost();
            }
            self.generation += 1;

            let (key, value) = Node::destroy(target_ptr);

            // Parent of removed node might be out of balance now
            let rebalanced = self.rebalance_upward(parent, Mode::Delete);
            (key, value, rebalanced)
        }
    }
}

impl<K, V> Drop for AvlTree<K, V> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<K, V> Default for AvlTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone, V: Clone> Clone for AvlTree<K, V> {
    fn clone(&self) -> Self {
        let mut tree = Self::new();
        self.inorder(|node_ptr| {
            let node = unsafe { node_ptr.as_ref() };
            tree.insert(node.key.clone(), node.value.clone(), Start::Max);
        });
        tree
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for AvlTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.avl_to_array()).finish()
    }
}

impl<K: Ord, V> Extend<(K, V)> for AvlTree<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value, Start::Root);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for AvlTree<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}
