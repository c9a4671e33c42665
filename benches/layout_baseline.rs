use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use flexlayout::{Dimension, FlexStyle, FlexWrap, LayoutTree, NodeKey, Size};

fn wide_tree(branches: usize, leaves_per_branch: usize) -> (LayoutTree, NodeKey) {
    let mut tree = LayoutTree::new();
    let root = tree.new_node(FlexStyle::default().with_updates(|s| s.flex_wrap = FlexWrap::Wrap));
    for _ in 0..branches {
        let branch = tree.new_node(FlexStyle::default().with_updates(|s| {
            s.width = Dimension::Points(120.0);
            s.height = Dimension::Points(80.0);
        }));
        tree.add_child(root, branch).unwrap();
        for leaf_index in 0..leaves_per_branch {
            let leaf = tree.new_node(FlexStyle::default().with_updates(|s| {
                s.flex_grow = 1.0 + leaf_index as f64;
                s.height = Dimension::Points(10.0);
            }));
            tree.add_child(branch, leaf).unwrap();
        }
    }
    (tree, root)
}

fn deep_tree(depth: usize) -> (LayoutTree, NodeKey) {
    let mut tree = LayoutTree::new();
    let root = tree.new_node(FlexStyle::default());
    let mut cursor = root;
    for level in 0..depth {
        let next = tree.new_node(FlexStyle::default().with_updates(|s| s.flex_grow = 1.0));
        let sibling = tree.new_node(FlexStyle::default().with_updates(|s| {
            s.width = Dimension::Points(10.0 + level as f64);
        }));
        tree.add_child(cursor, next).unwrap();
        tree.add_child(cursor, sibling).unwrap();
        cursor = next;
    }
    (tree, root)
}

fn bench_layout(c: &mut Criterion) {
    // Alternate the availability so every iteration performs a real pass
    // instead of answering from the cache.
    c.bench_function("wide_100x5", |b| {
        let (mut tree, root) = wide_tree(100, 5);
        let mut flip = false;
        b.iter(|| {
            flip = !flip;
            let width = if flip { 1280.0 } else { 1281.0 };
            black_box(tree.compute(root, Size::new(width, 720.0)))
        });
    });

    c.bench_function("deep_64", |b| {
        let (mut tree, root) = deep_tree(64);
        let mut flip = false;
        b.iter(|| {
            flip = !flip;
            let width = if flip { 800.0 } else { 801.0 };
            black_box(tree.compute(root, Size::new(width, 600.0)))
        });
    });

    c.bench_function("wide_100x5_cached", |b| {
        let (mut tree, root) = wide_tree(100, 5);
        tree.compute(root, Size::new(1280.0, 720.0));
        b.iter(|| black_box(tree.compute(root, Size::new(1280.0, 720.0))));
    });
}

criterion_group!(benches, bench_layout);
criterion_main!(benches);
