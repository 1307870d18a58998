use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

use avl_dict::{AvlTree, Start};

const N: usize = 100_000;

pub fn benchmarks(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    let values: Vec<i32> = (1..=N).map(|_| rng.gen()).collect();
    let ascending: Vec<i32> = (0..N as i32).collect();

    for (name, start) in [("root", Start::Root), ("max", Start::Max)] {
        c.bench_function(&format!("tree_insert_random_{name}"), |b| {
            b.iter_batched(
                AvlTree::new,
                |mut tree| {
                    for value in &values {
                        tree.insert(*value, *value, start);
                    }
                    tree
                },
                BatchSize::LargeInput,
            )
        });

        c.bench_function(&format!("tree_insert_ascending_{name}"), |b| {
            b.iter_batched(
                AvlTree::new,
                |mut tree| {
                    for value in &ascending {
                        tree.insert(*value, *value, start);
                    }
                    tree
                },
                BatchSize::LargeInput,
            )
        });
    }

    let mut tree = AvlTree::new();
    for value in &values {
        tree.insert(*value, *value, Start::Root);
    }

    c.bench_function("tree_search", |b| {
        b.iter(|| {
            for value in &values {
                black_box(tree.search(value).map(|node| *node.value()));
            }
        })
    });

    c.bench_function("tree_to_array", |b| {
        b.iter(|| black_box(tree.avl_to_array().len()))
    });

    c.bench_function("tree_remove", |b| {
        b.iter_batched(
            || tree.clone(),
            |mut tree| {
                for value in &values {
                    tree.remove(value);
                }
                tree
            },
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, benchmarks);
criterion_main!(benches);
