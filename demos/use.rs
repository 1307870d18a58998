use avl_dict::{AvlTree, Start};

fn main() {
    let mut tree = AvlTree::new();
    let mut rebalanced = 0;
    for (key, value) in [(0, "zero"), (1, "one"), (2, "two"), (3, "three"), (4, "four")] {
        rebalanced += tree.insert(key, value, Start::Max);
    }
    rebalanced += tree.insert(2, "two", Start::Root);
    assert_eq!(tree.get(&1), Some(&"one"));

    if let Some(handle) = tree.search(&1).map(|node| node.handle()) {
        rebalanced += tree.delete(handle);
    }
    assert!(tree.search(&1).is_none());

    for (k, v) in tree.avl_to_array() {
        println!("{k} => {v}");
    }
    println!("size: {}", tree.len());
    println!("max: {:?}", tree.max_key());
    println!("balanced share: {:.2}", tree.balance_ratio());
    println!("rebalancing operations: {rebalanced}");
}
