use super::*;

use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Insert(u16, u32, Start),
    Remove(u16),
    Delete(u16),
    Search(u16),
}

fn start_strategy() -> impl Strategy<Value = Start> {
    prop_oneof![Just(Start::Root), Just(Start::Max)]
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    // A narrow key space makes overwrites and deletes of present keys common.
    let key = 0u16..512;
    let op = prop_oneof![
        50 => (key.clone(), any::<u32>(), start_strategy())
            .prop_map(|(k, v, start)| Op::Insert(k, v, start)),
        15 => key.clone().prop_map(Op::Remove),
        15 => key.clone().prop_map(Op::Delete),
        20 => key.prop_map(Op::Search),
    ];
    prop::collection::vec(op, 0..=1000)
}

fn count_balanced(tree: &AvlTree<u16, u32>) -> usize {
    fn visit(node: Option<NodeRef<'_, u16, u32>>) -> usize {
        match node {
            None => 0,
            Some(node) => {
                usize::from(node.balance_factor() == 0) + visit(node.left()) + visit(node.right())
            }
        }
    }
    visit(tree.root())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in ops_strategy()) {
        let mut t: AvlTree<u16, u32> = AvlTree::new();
        let mut m: BTreeMap<u16, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value, start) => {
                    let existed = m.insert(key, value).is_some();
                    let rebalanced = t.insert(key, value, start);
                    if existed {
                        prop_assert_eq!(rebalanced, 0);
                    }
                }
                Op::Remove(key) => {
                    prop_assert_eq!(t.remove(&key), m.remove(&key));
                }
                Op::Delete(key) => {
                    let handle = t.search(&key).map(|node| node.handle());
                    prop_assert_eq!(handle.is_some(), m.remove(&key).is_some());
                    if let Some(handle) = handle {
                        prop_assert!(t.try_delete(handle).is_ok());
                    }
                }
                Op::Search(key) => {
                    let got_t = t.search(&key).map(|node| *node.value());
                    prop_assert_eq!(got_t, m.get(&key).copied());
                }
            }

            prop_assert_eq!(t.len(), m.len());
            prop_assert_eq!(t.max_key(), m.keys().next_back());
        }

        t.check_consistency();
        prop_assert_eq!(t.zero_balance_count(), count_balanced(&t));
        let got: Vec<(u16, u32)> = t.avl_to_array().into_iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(u16, u32)> = m.into_iter().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_start_hint_does_not_change_shape(keys in prop::collection::vec(any::<i16>(), 0..=500)) {
        let mut from_root = AvlTree::new();
        let mut from_max = AvlTree::new();
        for key in &keys {
            let root_cost = from_root.insert(*key, (), Start::Root);
            let max_cost = from_max.insert(*key, (), Start::Max);
            prop_assert_eq!(root_cost, max_cost);
        }
        from_max.check_consistency();

        let mut lhs = Vec::new();
        let mut rhs = Vec::new();
        let mut stack = vec![(from_root.root(), from_max.root())];
        while let Some((a, b)) = stack.pop() {
            match (a, b) {
                (Some(a), Some(b)) => {
                    lhs.push((*a.key(), a.height(), a.balance_factor()));
                    rhs.push((*b.key(), b.height(), b.balance_factor()));
                    stack.push((a.left(), b.left()));
                    stack.push((a.right(), b.right()));
                }
                (None, None) => {}
                _ => prop_assert!(false, "trees differ in shape"),
            }
        }
        prop_assert_eq!(lhs, rhs);
    }

    #[test]
    fn prop_round_trip_to_empty(keys in prop::collection::btree_set(any::<i32>(), 0..=300)) {
        let mut t = AvlTree::new();
        for key in &keys {
            t.insert(*key, *key, Start::Max);
        }
        prop_assert_eq!(t.len(), keys.len());
        for key in keys.iter().rev() {
            prop_assert_eq!(t.remove(key), Some(*key));
        }
        prop_assert!(t.is_empty());
        prop_assert!(t.root().is_none());
        prop_assert!(t.max().is_none());
        prop_assert_eq!(t.zero_balance_count(), 0);
    }
}
