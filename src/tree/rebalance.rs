//! Rotations and the upward rebalancing walk shared by insert and delete.

use std::cmp;

use super::AvlTree;
use crate::node::{self, Link, NodePtr};

/// Which mutation started a rebalancing walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Mode {
    /// One rotation restores the height the subtree had before the insert,
    /// so the walk ends after it.
    Insert,
    /// A rotation may leave the subtree one level shorter, so the walk goes on.
    Delete,
}

impl<K, V> AvlTree<K, V> {
    /// Walks from `start_from` up towards the root, refreshing heights and
    /// balance factors and rotating where a node is out of balance.
    ///
    /// Returns the number of rotations plus the number of nodes whose
    /// height changed without a rotation.
    pub(super) fn rebalance_upward(&mut self, start_from: Link<K, V>, mode: Mode) -> usize {
        let mut operations = 0;
        let mut current = start_from;
        while let Some(node_ptr) = current {
            let old_height = unsafe { node_ptr.as_ref().height };
            self.adjust_node(node_ptr);
            let (height, balance) = unsafe {
                let node = node_ptr.as_ref();
                (node.height, node.balance)
            };

            if balance.abs() < 2 {
                if height == old_height {
                    // Nothing above this node can have changed
                    break;
                }
                operations += 1;
                current = unsafe { node_ptr.as_ref().parent };
                continue;
            }

            let (subtree_ptr, rotations) = self.restore_balance(node_ptr, mode);
            operations += rotations;
            if mode == Mode::Insert {
                break;
            }
            current = unsafe { subtree_ptr.as_ref().parent };
        }
        trace_log!(tree = self.id, ?mode, operations, "rebalanced");
        operations
    }

    /// Recomputes height and balance factor of a node from its children,
    /// keeping the count of nodes with balance factor 0 in step.
    fn adjust_node(&mut self, mut node_ptr: NodePtr<K, V>) {
        let node = unsafe { node_ptr.as_mut() };
        let left_height = node::link_height(node.left);
        let right_height = node::link_height(node.right);
        let old_balance = node.balance;
        node.height = 1 + cmp::max(left_height, right_height);
        node.balance = left_height - right_height;
        match (old_balance == 0, node.balance == 0) {
            (true, false) => self.num_balanced -= 1,
            (false, true) => self.num_balanced += 1,
            _ => {}
        }
    }

    /// Restores the AVL condition at a node whose balance factor is +2 or -2.
    /// Returns the new root of the subtree and the number of rotations done.
    fn restore_balance(&mut self, node_ptr: NodePtr<K, V>, mode: Mode) -> (NodePtr<K, V>, usize) {
        unsafe {
            let balance = node_ptr.as_ref().balance;
            debug_assert!(balance.abs() == 2);
            if balance < 0 {
                // Right heavy
                let right = node_ptr.as_ref().right;
                let right_balance = right.map_or(0, |right_ptr| right_ptr.as_ref().balance);
                debug_assert!(mode == Mode::Delete || right_balance != 0);
                if right_balance <= 0 {
                    (self.rotate_left(node_ptr), 1)
                } else {
                    if let Some(right_ptr) = right {
                        self.rotate_right(right_ptr);
                    }
                    (self.rotate_left(node_ptr), 2)
                }
            } else {
                // Left heavy
                let left = node_ptr.as_ref().left;
                let left_balance = left.map_or(0, |left_ptr| left_ptr.as_ref().balance);
                debug_assert!(mode == Mode::Delete || left_balance != 0);
                if left_balance >= 0 {
                    (self.rotate_right(node_ptr), 1)
                } else {
                    if let Some(left_ptr) = left {
                        self.rotate_left(left_ptr);
                    }
                    (self.rotate_right(node_ptr), 2)
                }
            }
        }
    }

    /// Lifts the right child of `node_ptr` into its place and returns it.
    fn rotate_left(&mut self, mut node_ptr: NodePtr<K, V>) -> NodePtr<K, V> {
        unsafe {
            let Some(mut right_ptr) = node_ptr.as_ref().right else {
                return node_ptr;
            };
            trace_log!(tree = self.id, height = node_ptr.as_ref().height, "rotate left");

            node_ptr.as_mut().right = right_ptr.as_ref().left;
            if let Some(mut right_left_ptr) = right_ptr.as_ref().left {
                right_left_ptr.as_mut().parent = Some(node_ptr);
            }

            let parent = node_ptr.as_ref().parent;
            right_ptr.as_mut().parent = parent;
            self.replace_child(parent, node_ptr, Some(right_ptr));

            right_ptr.as_mut().left = Some(node_ptr);
            node_ptr.as_mut().parent = Some(right_ptr);

            self.adjust_node(node_ptr);
            self.adjust_node(right_ptr);
            right_ptr
        }
    }

    /// Lifts the left child of `node_ptr` into its place and returns it.
    fn rotate_right(&mut self, mut node_ptr: NodePtr<K, V>) -> NodePtr<K, V> {
        unsafe {
            let Some(mut left_ptr) = node_ptr.as_ref().left else {
                return node_ptr;
            };
            trace_log!(tree = self.id, height = node_ptr.as_ref().height, "rotate right");

            node_ptr.as_mut().left = left_ptr.as_ref().right;
            if let Some(mut left_right_ptr) = left_ptr.as_ref().right {
                left_right_ptr.as_mut().parent = Some(node_ptr);
            }

            let parent = node_ptr.as_ref().parent;
            left_ptr.as_mut().parent = parent;
            self.replace_child(parent, node_ptr, Some(left_ptr));

            left_ptr.as_mut().right = Some(node_ptr);
            node_ptr.as_mut().parent = Some(left_ptr);

            self.adjust_node(node_ptr);
            self.adjust_node(left_ptr);
            left_ptr
        }
    }
}
