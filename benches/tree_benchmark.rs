use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use linseq::{AvlTree, DynArray, FixedArray, Key, List, Sequence};
use rand::prelude::*;
use rbtree::RBTree;
use std::collections::BTreeMap;
use std::ops::Range;

const TREE_SIZE: Key = 100000;

fn random_insertion_order() -> Vec<Key> {
    let mut rng = rand::thread_rng();
    let mut keys: Vec<Key> = (0..TREE_SIZE).collect();

    keys.shuffle(&mut rng);

    keys
}

fn init_random_data(count: usize, range_opt: Option<Range<Key>>) -> Vec<Key> {
    let mut rng = rand::thread_rng();
    let range = range_opt.unwrap_or(0..TREE_SIZE);
    let range = rand::distributions::Uniform::new(range.start, range.end);

    (0..count).map(|_| rng.sample(&range)).collect()
}

fn init_large_btree() -> BTreeMap<Key, Key> {
    random_insertion_order().into_iter().map(|key| (key, key)).collect()
}

fn init_large_avl_tree() -> AvlTree {
    let mut tree = AvlTree::new();

    for key in random_insertion_order() {
        tree.insert(key, key).unwrap();
    }

    tree
}

fn bench_baseline_multi_insertions(data: Vec<Key>) {
    let mut tree = BTreeMap::new();

    for key in data {
        tree.insert(key, key);
    }
}

fn bench_rbtree_multi_insertions(data: Vec<Key>) {
    let mut tree = RBTree::new();

    for key in data {
        tree.insert(key, key);
    }
}

fn bench_multi_insertions(data: Vec<Key>) {
    let mut tree = AvlTree::new();

    for key in data {
        tree.insert(key, key).unwrap();
    }
}

fn bench_baseline_random_lookups(tree: BTreeMap<Key, Key>, keys: Vec<Key>) {
    for key in keys {
        assert!(tree.contains_key(&key));
    }
}

fn bench_random_lookups(tree: AvlTree, keys: Vec<Key>) {
    for key in keys {
        assert!(tree.contains_key(key));
    }
}

fn bench_baseline_random_deletions(mut tree: BTreeMap<Key, Key>, keys: Vec<Key>) {
    for key in keys {
        tree.remove(&key);
    }
}

fn bench_random_deletions(mut tree: AvlTree, keys: Vec<Key>) {
    for key in keys {
        tree.remove(key);
    }
}

fn cursor_iteration(tree: AvlTree) {
    let mut cursor = tree.front();
    let mut expected = 0;

    while let Some(key) = tree.key(&cursor) {
        assert_eq!(key, expected);
        expected += 1;
        tree.advance(&mut cursor).unwrap();
    }
}

fn inorder_iteration(tree: AvlTree) {
    for (i, (key, _)) in tree.iter().enumerate() {
        assert_eq!(i, key as usize);
    }
}

fn inorder_iteration_btree(tree: BTreeMap<Key, Key>) {
    for (i, &key) in tree.keys().enumerate() {
        assert_eq!(i, key as usize);
    }
}

fn middle_insertions<S: Sequence>(count: usize) {
    let mut seq = S::create().unwrap();

    for value in 0..count {
        let mut cursor = seq.front();
        seq.set_position(&mut cursor, (seq.len() / 2) as isize).unwrap();
        seq.insert_before(&mut cursor, value as i32).unwrap();
    }
}

fn rear_insertions<S: Sequence>(count: usize) {
    let mut seq = S::create().unwrap();

    for value in 0..count {
        seq.insert_rear(value as i32).unwrap();
    }
}

mod insert_delete {
    use super::*;

    pub fn bench_insert_delete(mut tree: AvlTree, insertions: &[Key], deletions: &[Key]) {
        for &key in deletions {
            tree.remove(key);
        }
        for &key in insertions {
            tree.insert(key, key).unwrap();
        }
    }

    pub fn bench_baseline_insert_delete(
        mut tree: BTreeMap<Key, Key>,
        insertions: &[Key],
        deletions: &[Key],
    ) {
        for key in deletions {
            tree.remove(key);
        }
        for &key in insertions {
            tree.insert(key, key);
        }
    }
}

fn avl_tree_benchmark(c: &mut Criterion) {
    c.bench_function("baseline tree insert delete", |b| {
        b.iter_batched(
            || {
                (
                    init_large_btree(),
                    init_random_data(2000, Some(100000..300000)),
                    init_random_data(2000, None),
                )
            },
            |(tree, to_insert, holes)| {
                insert_delete::bench_baseline_insert_delete(tree, &to_insert, &holes)
            },
            BatchSize::LargeInput,
        )
    });

    c.bench_function("tree insert delete", |b| {
        b.iter_batched(
            || {
                (
                    init_large_avl_tree(),
                    init_random_data(2000, Some(100000..300000)),
                    init_random_data(2000, None),
                )
            },
            |(tree, to_insert, holes)| insert_delete::bench_insert_delete(tree, &to_insert, &holes),
            BatchSize::LargeInput,
        )
    });

    c.bench_function("baseline tree 100K insertions", |b| {
        b.iter_batched(
            random_insertion_order,
            bench_baseline_multi_insertions,
            BatchSize::LargeInput,
        )
    });

    c.bench_function("rbtree 100K insertions", |b| {
        b.iter_batched(
            random_insertion_order,
            bench_rbtree_multi_insertions,
            BatchSize::LargeInput,
        )
    });

    c.bench_function("tree 100K insertions", |b| {
        b.iter_batched(
            random_insertion_order,
            bench_multi_insertions,
            BatchSize::LargeInput,
        )
    });

    c.bench_function("baseline tree random lookups", |b| {
        b.iter_batched(
            || (init_large_btree(), init_random_data(5000, None)),
            |(tree, keys)| bench_baseline_random_lookups(tree, keys),
            BatchSize::LargeInput,
        )
    });

    c.bench_function("tree random lookups", |b| {
        b.iter_batched(
            || (init_large_avl_tree(), init_random_data(5000, None)),
            |(tree, keys)| bench_random_lookups(tree, keys),
            BatchSize::LargeInput,
        )
    });

    c.bench_function("baseline tree random deletions", |b| {
        b.iter_batched(
            || (init_large_btree(), init_random_data(5000, None)),
            |(tree, keys)| bench_baseline_random_deletions(tree, keys),
            BatchSize::LargeInput,
        )
    });

    c.bench_function("tree random deletions", |b| {
        b.iter_batched(
            || (init_large_avl_tree(), init_random_data(5000, None)),
            |(tree, keys)| bench_random_deletions(tree, keys),
            BatchSize::LargeInput,
        )
    });

    c.bench_function("tree inorder iteration", |b| {
        b.iter_batched(init_large_avl_tree, inorder_iteration, BatchSize::LargeInput)
    });

    c.bench_function("tree cursor iteration", |b| {
        b.iter_batched(init_large_avl_tree, cursor_iteration, BatchSize::LargeInput)
    });

    c.bench_function("baseline tree inorder iteration", |b| {
        b.iter_batched(init_large_btree, inorder_iteration_btree, BatchSize::LargeInput)
    });
}

fn positional_benchmark(c: &mut Criterion) {
    c.bench_function("fixed array 10K rear insertions", |b| {
        b.iter(|| rear_insertions::<FixedArray>(10000))
    });

    c.bench_function("dyn array 10K rear insertions", |b| {
        b.iter(|| rear_insertions::<DynArray>(10000))
    });

    c.bench_function("list 10K rear insertions", |b| {
        b.iter(|| rear_insertions::<List>(10000))
    });

    c.bench_function("dyn array 2K middle insertions", |b| {
        b.iter(|| middle_insertions::<DynArray>(2000))
    });

    c.bench_function("list 2K middle insertions", |b| {
        b.iter(|| middle_insertions::<List>(2000))
    });
}

criterion_group!(benches, avl_tree_benchmark, positional_benchmark);
criterion_main!(benches);
