//! Core layout traversal: size resolution, child placement, absolute
//! positioning and hidden-subtree zeroing.
//!
//! Placement is split into a shallow step ([`place_immediate_children`])
//! that settles one container's children and returns the list of children
//! still needing internal layout. The sequential driver recurses that
//! list directly; the parallel driver fans it out at the root.

use log::trace;
use smallvec::SmallVec;

use crate::geometry::{AvailableSpace, Edges, LayoutRect, Point, Size};
use crate::layout::cache::{CachedMeasurement, SizingMode};
use crate::layout::flex::{self, FlexItem};
use crate::layout::{in_flow_children, intrinsic, LayoutPass};
use crate::style::{clamp_optional, AlignItems, Dimension, Display, FlexStyle, Position};
use crate::{LayoutTree, NodeKey};

/// Children a placement step still has to recurse into, with their
/// assigned border-box sizes.
pub(crate) type RecurseList = Vec<(NodeKey, f64, f64)>;

/// Resolve the root's own box, record rect and cache entry, and settle
/// its immediate children. Returns the recursion work list.
pub(crate) fn compute_node_shallow(
    tree: &LayoutTree,
    root: NodeKey,
    available: Size,
    pass: &mut LayoutPass,
) -> RecurseList {
    let (width, height) = resolve_node_size(tree, root, available, pass);
    trace!("layout root {root:?}: available {available:?} -> {width}x{height}");
    pass.rects.insert(root, LayoutRect::new(0.0, 0.0, width, height));
    pass.caches.insert(
        root,
        CachedMeasurement {
            avail_width: available.width,
            avail_height: available.height,
            width_mode: SizingMode::Exactly,
            height_mode: SizingMode::Exactly,
            computed_width: width,
            computed_height: height,
        },
    );
    place_immediate_children(tree, root, width, height, pass)
}

/// Depth-first recursion over a work list, skipping clean subtrees whose
/// cached box matches the newly assigned one.
pub(crate) fn recurse_sequential(tree: &LayoutTree, list: &RecurseList, pass: &mut LayoutPass) {
    for &(child, width, height) in list {
        if subtree_cache_valid(tree, child, width, height) {
            pass.cache_hits += 1;
            continue;
        }
        let sublist = place_immediate_children(tree, child, width, height, pass);
        recurse_sequential(tree, &sublist, pass);
    }
}

/// A clean subtree whose previous box matches the new one exactly keeps
/// its layout: descendant rects are parent-relative, so nothing inside
/// can have moved.
pub(crate) fn subtree_cache_valid(tree: &LayoutTree, node: NodeKey, width: f64, height: f64) -> bool {
    !tree.is_dirty(node)
        && tree
            .cached_measurement(node)
            .is_some_and(|cached| cached.matches(width, height, SizingMode::Exactly, SizingMode::Exactly))
}

/// Resolve a node's own border-box size against the given availability.
/// Intrinsic dimension variants dispatch to the content queries, the
/// aspect ratio derives missing axes, and min/max clamp last (min wins).
pub(crate) fn resolve_node_size(
    tree: &LayoutTree,
    node: NodeKey,
    available: Size,
    pass: &mut LayoutPass,
) -> (f64, f64) {
    let Some(style) = tree.style(node) else { return (0.0, 0.0) };
    let mut width = resolve_axis_dimension(tree, node, style.width, Some(available.width), true, pass);
    let mut height = resolve_axis_dimension(tree, node, style.height, Some(available.height), false, pass);

    if let Some(ratio) = style.aspect_ratio {
        if ratio > 0.0 {
            match (width, height) {
                (Some(w), None) => height = Some(w / ratio),
                (None, Some(h)) => width = Some(h * ratio),
                (None, None) => {
                    width = Some(available.width);
                    height = Some(available.width / ratio);
                }
                _ => {}
            }
        }
    }

    let width = clamp_optional(
        width.unwrap_or(available.width),
        style.min_width.resolve(Some(available.width)),
        style.max_width.resolve(Some(available.width)),
    )
    .max(0.0);
    let height = clamp_optional(
        height.unwrap_or(available.height),
        style.min_height.resolve(Some(available.height)),
        style.max_height.resolve(Some(available.height)),
    )
    .max(0.0);
    (width, height)
}

/// Resolve one dimension on one axis, dispatching the intrinsic variants
/// to the content queries. `horizontal` selects the width axis.
fn resolve_axis_dimension(
    tree: &LayoutTree,
    node: NodeKey,
    dimension: Dimension,
    available: Option<f64>,
    horizontal: bool,
    pass: &mut LayoutPass,
) -> Option<f64> {
    match dimension {
        Dimension::MinContent => Some(if horizontal {
            intrinsic::min_content_width(tree, node, pass)
        } else {
            intrinsic::min_content_height(tree, node, pass)
        }),
        Dimension::MaxContent => Some(if horizontal {
            intrinsic::max_content_width(tree, node, pass)
        } else {
            intrinsic::max_content_height(tree, node, pass)
        }),
        Dimension::FitContent(clamp) => {
            let avail = available.unwrap_or(f64::INFINITY);
            Some(if horizontal {
                intrinsic::fit_content_width(tree, node, avail, clamp, pass)
            } else {
                intrinsic::fit_content_height(tree, node, avail, clamp, pass)
            })
        }
        other => other.resolve(available),
    }
}

/// Settle one container's children: partition, collect lines, resolve
/// flexible lengths, distribute and align, then write child rects in the
/// parent's border-box frame. Absolute children resolve against the
/// padding box; hidden subtrees zero out.
pub(crate) fn place_immediate_children(
    tree: &LayoutTree,
    node: NodeKey,
    width: f64,
    height: f64,
    pass: &mut LayoutPass,
) -> RecurseList {
    let mut recurse: RecurseList = Vec::new();
    let Some(style) = tree.style(node) else { return recurse };
    if tree.children(node).is_empty() {
        return recurse;
    }

    let resolved_dir = style.flex_direction.resolved(style.direction);
    let row = resolved_dir.is_row();
    let padding = style.padding.resolve(width, height);
    let border = style.border;
    let inner_width = (width - padding.horizontal() - border.horizontal()).max(0.0);
    let inner_height = (height - padding.vertical() - border.vertical()).max(0.0);
    let origin = Point { x: border.left + padding.left, y: border.top + padding.top };
    let main_avail = if row { inner_width } else { inner_height };
    let cross_avail = if row { inner_height } else { inner_width };
    let gap = style.get_gap(resolved_dir);

    let mut flex_children: SmallVec<NodeKey, 8> = SmallVec::new();
    let mut absolute_children: SmallVec<NodeKey, 4> = SmallVec::new();
    let mut hidden_children: SmallVec<NodeKey, 4> = SmallVec::new();
    partition_children(tree, node, &mut flex_children, &mut absolute_children, &mut hidden_children, pass);

    let items: Vec<FlexItem> = flex_children
        .iter()
        .map(|&child| prepare_item(tree, child, style, row, inner_width, inner_height, main_avail, pass))
        .collect();

    let wrap = style.flex_wrap;
    let mut lines = flex::collect_lines(items, main_avail, wrap, gap, row);
    let single_line = lines.len() == 1;

    for line in lines.iter_mut() {
        flex::resolve_flexible_lengths(line, main_avail, gap, row);

        // Hypothetical cross sizes, honoring the aspect ratio now that
        // the main size is settled.
        for item in &mut line.items {
            let mut cross = item.cross_resolved;
            if cross.is_none() {
                if let Some(ratio) = item.aspect_ratio {
                    if ratio > 0.0 {
                        cross = Some(if row { item.main / ratio } else { item.main * ratio });
                    }
                }
            }
            let cross_value = match cross {
                Some(value) => value,
                None => hypothetical_cross_content(tree, item.key, item.main, row, pass),
            };
            item.cross = clamp_optional(cross_value, item.min_cross, item.max_cross).max(0.0);
        }

        if row {
            let mut shared: Option<f64> = None;
            for item in &mut line.items {
                if item.align == AlignItems::Baseline {
                    let raw = baseline_of(tree, item.key, item.main, item.cross, pass);
                    item.baseline = raw;
                    let candidate = raw + item.margin.top;
                    shared = Some(shared.map_or(candidate, |current| current.max(candidate)));
                }
            }
            line.baseline = shared;
        }

        line.cross = if single_line { cross_avail } else { flex::measure_line_cross(line, row) };
    }

    flex::align_content_offsets(&mut lines, cross_avail, style.align_content, wrap);

    for line in lines.iter_mut() {
        flex::position_main(line, style.justify_content, main_avail, gap, row);
        if resolved_dir.is_reverse() {
            for item in &mut line.items {
                item.main_pos = main_avail - item.main_pos - item.main;
            }
        }
        for item in &mut line.items {
            flex::align_cross(item, line.cross, row, line.baseline);
            let (x, y, item_width, item_height) = if row {
                (
                    origin.x + item.main_pos,
                    origin.y + line.cross_pos + item.cross_pos,
                    item.main,
                    item.cross,
                )
            } else {
                (
                    origin.x + line.cross_pos + item.cross_pos,
                    origin.y + item.main_pos,
                    item.cross,
                    item.main,
                )
            };
            let rect = LayoutRect::new(x, y, item_width.max(0.0), item_height.max(0.0));
            pass.rects.insert(item.key, rect);
            pass.caches.insert(
                item.key,
                CachedMeasurement {
                    avail_width: rect.width,
                    avail_height: rect.height,
                    width_mode: SizingMode::Exactly,
                    height_mode: SizingMode::Exactly,
                    computed_width: rect.width,
                    computed_height: rect.height,
                },
            );
            if !tree.children(item.key).is_empty() {
                recurse.push((item.key, rect.width, rect.height));
            }
        }
    }

    for &child in &absolute_children {
        place_absolute(tree, child, width, height, &border, &mut recurse, pass);
    }
    for &child in &hidden_children {
        zero_subtree(tree, child, pass);
    }

    recurse
}

/// Split direct children into flex items, absolutes and hidden nodes.
/// `display: contents` children generate no box (zero rect) and their
/// children take their place, recursively.
fn partition_children(
    tree: &LayoutTree,
    node: NodeKey,
    flex_children: &mut SmallVec<NodeKey, 8>,
    absolute_children: &mut SmallVec<NodeKey, 4>,
    hidden_children: &mut SmallVec<NodeKey, 4>,
    pass: &mut LayoutPass,
) {
    for &child in tree.children(node) {
        let Some(style) = tree.style(child) else { continue };
        match style.display {
            Display::None => hidden_children.push(child),
            Display::Contents => {
                pass.rects.insert(child, LayoutRect::ZERO);
                partition_children(tree, child, flex_children, absolute_children, hidden_children, pass);
            }
            Display::Flex => {
                if style.position == Position::Absolute {
                    absolute_children.push(child);
                } else {
                    flex_children.push(child);
                }
            }
        }
    }
}

/// Build the flex-item record for one in-flow child.
fn prepare_item(
    tree: &LayoutTree,
    child: NodeKey,
    container_style: &FlexStyle,
    row: bool,
    inner_width: f64,
    inner_height: f64,
    main_avail: f64,
    pass: &mut LayoutPass,
) -> FlexItem {
    let mut item = FlexItem::new(child, 0.0);
    let Some(style) = tree.style(child) else { return item };

    let cross_avail = if row { inner_height } else { inner_width };
    item.margin = style.margin.resolve(inner_width, inner_height);
    item.main_start_auto = style.margin.main_start_is_auto(row);
    item.main_end_auto = style.margin.main_end_is_auto(row);
    item.grow = style.flex_grow.max(0.0);
    item.shrink = style.flex_shrink.max(0.0);
    item.align = style.effective_align(container_style.align_items);
    item.aspect_ratio = style.aspect_ratio;

    item.cross_resolved =
        resolve_axis_dimension(tree, child, style.cross_size(row), Some(cross_avail), !row, pass);

    // Hypothetical main size: flex-basis first, then the main-axis
    // dimension, then a definite cross size transferred through the
    // aspect ratio, then content for measured leaves, else zero.
    let base = resolve_axis_dimension(tree, child, style.flex_basis, Some(main_avail), row, pass)
        .or_else(|| resolve_axis_dimension(tree, child, style.main_size(row), Some(main_avail), row, pass))
        .or_else(|| match (style.aspect_ratio, item.cross_resolved) {
            (Some(ratio), Some(cross)) if ratio > 0.0 => {
                Some(if row { cross * ratio } else { cross / ratio })
            }
            _ => None,
        })
        .or_else(|| {
            tree.has_measure_func(child).then(|| {
                let measured = intrinsic::measure_leaf(
                    tree,
                    child,
                    AvailableSpace::MaxContent,
                    AvailableSpace::MaxContent,
                    pass,
                );
                if row { measured.width } else { measured.height }
            })
        })
        .unwrap_or(0.0)
        .max(0.0);
    item.base = base;
    item.main = base;

    item.min_main = resolve_axis_dimension(tree, child, style.main_min_size(row), Some(main_avail), row, pass);
    item.max_main = resolve_axis_dimension(tree, child, style.main_max_size(row), Some(main_avail), row, pass);
    item.min_cross =
        resolve_axis_dimension(tree, child, style.cross_min_size(row), Some(cross_avail), !row, pass);
    item.max_cross =
        resolve_axis_dimension(tree, child, style.cross_max_size(row), Some(cross_avail), !row, pass);
    item.cross_is_auto = style.cross_size(row).is_auto() && style.aspect_ratio.is_none();
    item
}

/// Content-driven cross size for an item whose cross dimension stays
/// undefined: measured leaves measure at their settled main size,
/// containers fall back to their max-content cross extent.
fn hypothetical_cross_content(
    tree: &LayoutTree,
    node: NodeKey,
    main: f64,
    row: bool,
    pass: &mut LayoutPass,
) -> f64 {
    if tree.has_measure_func(node) {
        let measured = if row {
            intrinsic::measure_leaf(tree, node, AvailableSpace::Definite(main), AvailableSpace::MaxContent, pass)
        } else {
            intrinsic::measure_leaf(tree, node, AvailableSpace::MaxContent, AvailableSpace::Definite(main), pass)
        };
        if row { measured.height } else { measured.width }
    } else if !tree.children(node).is_empty() {
        if row {
            intrinsic::max_content_height(tree, node, pass)
        } else {
            intrinsic::max_content_width(tree, node, pass)
        }
    } else {
        0.0
    }
}

/// Baseline offset from the top of a node's box. Uses the registered
/// callback when present, otherwise recurses into the first in-flow
/// child (preferring a baseline-aligned one) offset by the content-box
/// top, and bottoms out at the box height. Memoized per pass.
pub(crate) fn baseline_of(
    tree: &LayoutTree,
    node: NodeKey,
    width: f64,
    height: f64,
    pass: &mut LayoutPass,
) -> f64 {
    if let Some(&memoized) = pass.baselines.get(&node) {
        return memoized;
    }
    let value = match tree.baseline(node, width, height) {
        Some(from_callback) => from_callback,
        None => {
            let children = in_flow_children(tree, node);
            match children.first() {
                None => height,
                Some(&first) => {
                    let Some(style) = tree.style(node) else { return height };
                    let pick = children
                        .iter()
                        .copied()
                        .find(|&candidate| {
                            tree.style(candidate).is_some_and(|child_style| {
                                child_style.effective_align(style.align_items) == AlignItems::Baseline
                            })
                        })
                        .unwrap_or(first);
                    let padding = style.padding.resolve(width, height);
                    let (child_width, child_height) = match tree.style(pick) {
                        Some(child_style) => (
                            child_style.width.resolve(Some(width)).unwrap_or(0.0),
                            child_style.height.resolve(Some(height)).unwrap_or(0.0),
                        ),
                        None => (0.0, 0.0),
                    };
                    style.border.top + padding.top + baseline_of(tree, pick, child_width, child_height, pass)
                }
            }
        }
    };
    pass.baselines.insert(node, value);
    value
}

/// Resolve an absolutely positioned child against the parent's padding
/// box and write its rect relative to the parent border-box origin.
fn place_absolute(
    tree: &LayoutTree,
    child: NodeKey,
    parent_width: f64,
    parent_height: f64,
    border: &Edges,
    recurse: &mut RecurseList,
    pass: &mut LayoutPass,
) {
    let Some(style) = tree.style(child) else { return };
    let padding_box_width = (parent_width - border.horizontal()).max(0.0);
    let padding_box_height = (parent_height - border.vertical()).max(0.0);
    let margin = style.margin.resolve(padding_box_width, padding_box_height);

    let left = style.left.resolve(Some(padding_box_width));
    let right = style.right.resolve(Some(padding_box_width));
    let top = style.top.resolve(Some(padding_box_height));
    let bottom = style.bottom.resolve(Some(padding_box_height));

    let mut width = resolve_axis_dimension(tree, child, style.width, Some(padding_box_width), true, pass);
    let mut height = resolve_axis_dimension(tree, child, style.height, Some(padding_box_height), false, pass);

    // Opposing insets with an auto size derive the size.
    if width.is_none() {
        if let (Some(l), Some(r)) = (left, right) {
            width = Some((padding_box_width - l - r - margin.horizontal()).max(0.0));
        }
    }
    if height.is_none() {
        if let (Some(t), Some(b)) = (top, bottom) {
            height = Some((padding_box_height - t - b - margin.vertical()).max(0.0));
        }
    }
    if let Some(ratio) = style.aspect_ratio {
        if ratio > 0.0 {
            match (width, height) {
                (Some(w), None) => height = Some(w / ratio),
                (None, Some(h)) => width = Some(h * ratio),
                _ => {}
            }
        }
    }

    let width = clamp_optional(
        width.unwrap_or(padding_box_width),
        style.min_width.resolve(Some(padding_box_width)),
        style.max_width.resolve(Some(padding_box_width)),
    )
    .max(0.0);
    let height = clamp_optional(
        height.unwrap_or(padding_box_height),
        style.min_height.resolve(Some(padding_box_height)),
        style.max_height.resolve(Some(padding_box_height)),
    )
    .max(0.0);

    let x = border.left
        + match (left, right) {
            (Some(l), _) => l + margin.left,
            (None, Some(r)) => padding_box_width - r - width - margin.right,
            (None, None) => margin.left,
        };
    let y = border.top
        + match (top, bottom) {
            (Some(t), _) => t + margin.top,
            (None, Some(b)) => padding_box_height - b - height - margin.bottom,
            (None, None) => margin.top,
        };

    let rect = LayoutRect::new(x, y, width, height);
    pass.rects.insert(child, rect);
    pass.caches.insert(
        child,
        CachedMeasurement {
            avail_width: width,
            avail_height: height,
            width_mode: SizingMode::Exactly,
            height_mode: SizingMode::Exactly,
            computed_width: width,
            computed_height: height,
        },
    );
    if !tree.children(child).is_empty() {
        recurse.push((child, width, height));
    }
}

/// `display: none` zeroes the node and every descendant.
fn zero_subtree(tree: &LayoutTree, node: NodeKey, pass: &mut LayoutPass) {
    pass.rects.insert(node, LayoutRect::ZERO);
    for &child in tree.children(node) {
        zero_subtree(tree, child, pass);
    }
}
