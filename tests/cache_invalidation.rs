use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use flexlayout::{approx_eq, Dimension, FlexStyle, LayoutTree, Size};

fn style(build: impl FnOnce(&mut FlexStyle)) -> FlexStyle {
    FlexStyle::default().with_updates(build)
}

/// A second compute with the same root and availability is a cache hit:
/// nothing recomputes and every rect is byte-identical.
#[test]
fn repeat_compute_hits_the_cache() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut tree = LayoutTree::new();
    let root = tree.new_node(FlexStyle::default());
    let children: Vec<_> = (0..3)
        .map(|_| tree.new_node(style(|s| s.flex_grow = 1.0)))
        .collect();
    for &child in &children {
        tree.add_child(root, child).unwrap();
    }

    let first = tree.compute(root, Size::new(300.0, 100.0));
    assert_eq!(first, 4);
    let before: Vec<_> = children.iter().map(|&c| tree.layout(c)).collect();

    let second = tree.compute(root, Size::new(300.0, 100.0));
    assert_eq!(second, 0);
    assert_eq!(tree.perf_cache_hits_last(), 1);
    let after: Vec<_> = children.iter().map(|&c| tree.layout(c)).collect();
    assert_eq!(before, after);
}

/// Changing the availability defeats the cache and relayouts.
#[test]
fn different_availability_recomputes() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut tree = LayoutTree::new();
    let root = tree.new_node(FlexStyle::default());
    let child = tree.new_node(style(|s| s.flex_grow = 1.0));
    tree.add_child(root, child).unwrap();

    tree.compute(root, Size::new(300.0, 100.0));
    let recomputed = tree.compute(root, Size::new(400.0, 100.0));
    assert!(recomputed > 0);
    assert!(approx_eq(tree.layout(child).width, 400.0));
}

/// set_style dirties the node and its ancestor chain, and the next
/// compute picks the change up.
#[test]
fn set_style_invalidates_and_recomputes() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut tree = LayoutTree::new();
    let root = tree.new_node(FlexStyle::default());
    let parent = tree.new_node(style(|s| s.flex_grow = 1.0));
    let child = tree.new_node(style(|s| s.width = Dimension::Points(50.0)));
    tree.add_child(root, parent).unwrap();
    tree.add_child(parent, child).unwrap();

    tree.compute(root, Size::new(300.0, 100.0));
    assert!(!tree.is_dirty(root));

    tree.set_style(child, style(|s| s.width = Dimension::Points(80.0))).unwrap();
    assert!(tree.is_dirty(child));
    assert!(tree.is_dirty(parent));
    assert!(tree.is_dirty(root));

    let count = tree.compute(root, Size::new(300.0, 100.0));
    assert!(count > 0);
    assert!(approx_eq(tree.layout(child).width, 80.0));
    assert!(!tree.is_dirty(root));
}

/// A clean sibling subtree whose box did not change is skipped while a
/// dirty one recomputes.
#[test]
fn clean_sibling_subtrees_are_skipped() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut tree = LayoutTree::new();
    let root = tree.new_node(FlexStyle::default());
    let mut grandchildren = Vec::new();
    let branches: Vec<_> = (0..3)
        .map(|_| {
            let branch = tree.new_node(style(|s| s.width = Dimension::Points(100.0)));
            let leaf = tree.new_node(style(|s| s.width = Dimension::Points(10.0)));
            tree.add_child(branch, leaf).unwrap();
            grandchildren.push(leaf);
            branch
        })
        .collect();
    for &branch in &branches {
        tree.add_child(root, branch).unwrap();
    }

    tree.compute(root, Size::new(400.0, 100.0));

    // Dirty one branch only.
    tree.set_style(grandchildren[0], style(|s| s.width = Dimension::Points(20.0))).unwrap();
    tree.compute(root, Size::new(400.0, 100.0));

    assert!(approx_eq(tree.layout(grandchildren[0]).width, 20.0));
    // The clean branches answered from cache.
    assert!(tree.perf_cache_hits_last() >= 2);
}

/// Measure callbacks only rerun when their constraints change.
#[test]
fn measure_callback_results_are_cached() {
    let _ = env_logger::builder().is_test(true).try_init();

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let mut tree = LayoutTree::new();
    let root = tree.new_node(FlexStyle::default());
    let leaf = tree.new_leaf(
        FlexStyle::default(),
        Box::new(move |_aw, _ah| {
            counter.fetch_add(1, Ordering::SeqCst);
            Size::new(80.0, 20.0)
        }),
    );
    tree.add_child(root, leaf).unwrap();

    tree.compute(root, Size::new(300.0, 100.0));
    let after_first = calls.load(Ordering::SeqCst);
    assert!(after_first > 0);

    tree.compute(root, Size::new(300.0, 100.0));
    assert_eq!(calls.load(Ordering::SeqCst), after_first);
}

/// invalidate_cache forces the next compute to do work again.
#[test]
fn invalidate_cache_forces_recompute() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut tree = LayoutTree::new();
    let root = tree.new_node(FlexStyle::default());
    let child = tree.new_node(style(|s| s.flex_grow = 1.0));
    tree.add_child(root, child).unwrap();

    tree.compute(root, Size::new(300.0, 100.0));
    assert_eq!(tree.compute(root, Size::new(300.0, 100.0)), 0);

    tree.invalidate_cache(child);
    assert!(tree.is_dirty(root));
    assert!(tree.compute(root, Size::new(300.0, 100.0)) > 0);
}

/// add_child and remove_child dirty the tree and reshape the layout.
#[test]
fn structural_changes_invalidate() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut tree = LayoutTree::new();
    let root = tree.new_node(FlexStyle::default());
    let first = tree.new_node(style(|s| s.flex_grow = 1.0));
    tree.add_child(root, first).unwrap();
    tree.compute(root, Size::new(300.0, 100.0));
    assert!(approx_eq(tree.layout(first).width, 300.0));

    let second = tree.new_node(style(|s| s.flex_grow = 1.0));
    tree.add_child(root, second).unwrap();
    assert!(tree.is_dirty(root));
    tree.compute(root, Size::new(300.0, 100.0));
    assert!(approx_eq(tree.layout(first).width, 150.0));

    tree.remove_child(root, second).unwrap();
    tree.compute(root, Size::new(300.0, 100.0));
    assert!(approx_eq(tree.layout(first).width, 300.0));
}

/// Construction-time structural violations fail loudly.
#[test]
fn structural_violations_error() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut tree = LayoutTree::new();
    let parent = tree.new_node(FlexStyle::default());
    let child = tree.new_node(FlexStyle::default());
    let other = tree.new_node(FlexStyle::default());
    tree.add_child(parent, child).unwrap();

    // Double-parenting.
    assert!(tree.add_child(other, child).is_err());
    // Self-attachment.
    assert!(tree.add_child(parent, parent).is_err());
    // Cycle: parent is an ancestor of child.
    assert!(tree.add_child(child, parent).is_err());
    // Children on a measured leaf.
    let leaf = tree.new_leaf(FlexStyle::default(), Box::new(|_aw, _ah| Size::ZERO));
    assert!(tree.add_child(leaf, other).is_err());
    // Measure callback on a node with children.
    assert!(tree
        .set_measure_func(parent, Some(Box::new(|_aw, _ah| Size::ZERO)))
        .is_err());
    // Removing a non-child.
    assert!(tree.remove_child(parent, other).is_err());
}

/// Detached and re-attached nodes lose their old parent pointer first.
#[test]
fn reattachment_moves_the_subtree() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut tree = LayoutTree::new();
    let root = tree.new_node(FlexStyle::default());
    let old_home = tree.new_node(style(|s| s.flex_grow = 1.0));
    let new_home = tree.new_node(style(|s| s.flex_grow = 1.0));
    let wanderer = tree.new_node(style(|s| s.width = Dimension::Points(10.0)));
    tree.add_child(root, old_home).unwrap();
    tree.add_child(root, new_home).unwrap();
    tree.add_child(old_home, wanderer).unwrap();
    assert_eq!(tree.parent(wanderer), Some(old_home));

    tree.remove_child(old_home, wanderer).unwrap();
    assert_eq!(tree.parent(wanderer), None);
    tree.add_child(new_home, wanderer).unwrap();
    assert_eq!(tree.parent(wanderer), Some(new_home));
    assert_eq!(tree.child_count(old_home), 0);
}
