use flexlayout::{
    approx_eq, AlignItems, AvailableSpace, Dimension, Edges, FlexDirection, FlexStyle,
    LayoutTree, MeasureFunc, Size, Spacing,
};

fn style(build: impl FnOnce(&mut FlexStyle)) -> FlexStyle {
    FlexStyle::default().with_updates(build)
}

/// Text-like content: 40 wide at min-content, 120 at max-content, fits
/// anything in between, 20 tall.
fn text_like() -> MeasureFunc {
    Box::new(|avail_width, _avail_height| {
        let width = match avail_width {
            AvailableSpace::Definite(value) => value.clamp(40.0, 120.0),
            AvailableSpace::MinContent => 40.0,
            AvailableSpace::MaxContent => 120.0,
        };
        Size::new(width, 20.0)
    })
}

#[test]
fn leaf_intrinsic_widths_come_from_the_measure_callback() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut tree = LayoutTree::new();
    let leaf = tree.new_leaf(FlexStyle::default(), text_like());

    assert!(approx_eq(tree.min_content_width(leaf), 40.0));
    assert!(approx_eq(tree.max_content_width(leaf), 120.0));
    assert!(approx_eq(tree.min_content_height(leaf), 20.0));
    assert!(approx_eq(tree.max_content_height(leaf), 20.0));
}

/// Row containers sum child min-content widths plus gaps; columns take
/// the max.
#[test]
fn container_intrinsics_follow_the_main_axis() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut tree = LayoutTree::new();
    let row = tree.new_node(style(|s| s.gap = 10.0));
    let column = tree.new_node(style(|s| s.flex_direction = FlexDirection::Column));
    for container in [row, column] {
        for _ in 0..2 {
            let leaf = tree.new_leaf(FlexStyle::default(), text_like());
            tree.add_child(container, leaf).unwrap();
        }
    }

    assert!(approx_eq(tree.min_content_width(row), 90.0));
    assert!(approx_eq(tree.max_content_width(row), 250.0));
    assert!(approx_eq(tree.min_content_width(column), 40.0));
    assert!(approx_eq(tree.max_content_width(column), 120.0));
    // Heights swap roles: rows take the max, columns sum.
    assert!(approx_eq(tree.min_content_height(row), 20.0));
    assert!(approx_eq(tree.min_content_height(column), 40.0));
}

/// Padding and border are part of the intrinsic (border-box) size.
#[test]
fn intrinsics_include_padding_and_border() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut tree = LayoutTree::new();
    let container = tree.new_node(style(|s| {
        s.padding = Spacing::all(5.0);
        s.border = Edges::all(2.0);
    }));
    let leaf = tree.new_leaf(FlexStyle::default(), text_like());
    tree.add_child(container, leaf).unwrap();

    assert!(approx_eq(tree.min_content_width(container), 54.0));
    assert!(approx_eq(tree.max_content_width(container), 134.0));
}

/// A definite pixel width short-circuits the content query.
#[test]
fn explicit_width_wins_over_content() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut tree = LayoutTree::new();
    let node = tree.new_node(style(|s| s.width = Dimension::Points(77.0)));

    assert!(approx_eq(tree.min_content_width(node), 77.0));
    assert!(approx_eq(tree.max_content_width(node), 77.0));
}

/// Percent dimensions are undefined inside intrinsic queries and fall
/// through to content.
#[test]
fn percent_resolves_to_undefined_in_intrinsic_context() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut tree = LayoutTree::new();
    let container = tree.new_node(FlexStyle::default());
    let child = tree.new_node(style(|s| s.width = Dimension::Percent(50.0)));
    tree.add_child(container, child).unwrap();

    assert!(approx_eq(tree.min_content_width(container), 0.0));
}

/// `min_content <= fit_content(avail) <= max_content` for any
/// availability, and the clamp argument caps the result.
#[test]
fn fit_content_is_bounded_and_clampable() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut tree = LayoutTree::new();
    let leaf = tree.new_leaf(FlexStyle::default(), text_like());

    let min = tree.min_content_width(leaf);
    let max = tree.max_content_width(leaf);
    for avail in [0.0, 25.0, 60.0, 120.0, 500.0] {
        let fit = tree.fit_content_width(leaf, avail, None);
        assert!(min <= fit + 1e-3 && fit <= max + 1e-3, "avail {avail}: fit {fit} outside [{min}, {max}]");
    }
    assert!(approx_eq(tree.fit_content_width(leaf, 60.0, None), 60.0));
    assert!(approx_eq(tree.fit_content_width(leaf, 500.0, Some(100.0)), 100.0));
}

/// A measured leaf with auto sizes takes its max-content main size as
/// flex basis and its measured cross size.
#[test]
fn measured_leaf_sizes_itself_in_a_row() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut tree = LayoutTree::new();
    let root = tree.new_node(style(|s| s.align_items = AlignItems::FlexStart));
    let leaf = tree.new_leaf(FlexStyle::default(), text_like());
    tree.add_child(root, leaf).unwrap();

    tree.compute(root, Size::new(300.0, 100.0));

    let rect = tree.layout(leaf);
    assert!(approx_eq(rect.width, 120.0));
    assert!(approx_eq(rect.height, 20.0));
}

/// min-content as an explicit dimension dispatches the intrinsic query
/// during compute.
#[test]
fn min_content_dimension_sizes_the_root() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut tree = LayoutTree::new();
    let root = tree.new_node(style(|s| s.width = Dimension::MinContent));
    let a = tree.new_node(style(|s| {
        s.width = Dimension::Points(30.0);
        s.height = Dimension::Points(10.0);
    }));
    let b = tree.new_node(style(|s| {
        s.width = Dimension::Points(40.0);
        s.height = Dimension::Points(10.0);
    }));
    tree.add_child(root, a).unwrap();
    tree.add_child(root, b).unwrap();

    tree.compute(root, Size::new(500.0, 100.0));

    assert!(approx_eq(tree.layout(root).width, 70.0));
}

/// fit-content with a clamp as a style dimension.
#[test]
fn fit_content_dimension_with_clamp() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut tree = LayoutTree::new();
    let root = tree.new_node(style(|s| s.width = Dimension::FitContent(Some(100.0))));
    let wide = tree.new_node(style(|s| {
        s.width = Dimension::Points(180.0);
        s.height = Dimension::Points(10.0);
    }));
    tree.add_child(root, wide).unwrap();

    tree.compute(root, Size::new(500.0, 50.0));

    assert!(approx_eq(tree.layout(root).width, 100.0));
}
