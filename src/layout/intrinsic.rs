//! Intrinsic (content-driven) sizing: min-content, max-content and
//! fit-content queries over a subtree.
//!
//! Percent dimensions resolve to undefined inside intrinsic queries and
//! fall through to the content-based path; this breaks the circular
//! dependency between a parent sized by its content and a child sized by
//! its parent without a constraint solver.

use crate::geometry::{AvailableSpace, Size};
use crate::layout::cache::{CachedMeasurement, SizingMode};
use crate::layout::{in_flow_children, IntrinsicKind, LayoutPass};
use crate::style::{clamp_optional, Dimension};
use crate::{LayoutTree, NodeKey};

pub(crate) fn min_content_width(tree: &LayoutTree, node: NodeKey, pass: &mut LayoutPass) -> f64 {
    content_width(tree, node, IntrinsicKind::MinWidth, pass)
}

pub(crate) fn max_content_width(tree: &LayoutTree, node: NodeKey, pass: &mut LayoutPass) -> f64 {
    content_width(tree, node, IntrinsicKind::MaxWidth, pass)
}

pub(crate) fn min_content_height(tree: &LayoutTree, node: NodeKey, pass: &mut LayoutPass) -> f64 {
    content_height(tree, node, IntrinsicKind::MinHeight, pass)
}

pub(crate) fn max_content_height(tree: &LayoutTree, node: NodeKey, pass: &mut LayoutPass) -> f64 {
    content_height(tree, node, IntrinsicKind::MaxHeight, pass)
}

/// `min(max_content, max(min_content, available))`, optionally clamped.
pub(crate) fn fit_content_width(
    tree: &LayoutTree,
    node: NodeKey,
    available: f64,
    clamp: Option<f64>,
    pass: &mut LayoutPass,
) -> f64 {
    let min = min_content_width(tree, node, pass);
    let max = max_content_width(tree, node, pass);
    let mut fit = max.min(min.max(available));
    if let Some(limit) = clamp {
        fit = fit.min(limit);
    }
    fit.max(0.0)
}

pub(crate) fn fit_content_height(
    tree: &LayoutTree,
    node: NodeKey,
    available: f64,
    clamp: Option<f64>,
    pass: &mut LayoutPass,
) -> f64 {
    let min = min_content_height(tree, node, pass);
    let max = max_content_height(tree, node, pass);
    let mut fit = max.min(min.max(available));
    if let Some(limit) = clamp {
        fit = fit.min(limit);
    }
    fit.max(0.0)
}

fn content_width(tree: &LayoutTree, node: NodeKey, kind: IntrinsicKind, pass: &mut LayoutPass) -> f64 {
    if let Some(&memoized) = pass.intrinsic.get(&(node, kind)) {
        return memoized;
    }
    let Some(style) = tree.style(node) else { return 0.0 };

    let value = if let Dimension::Points(points) = style.width {
        points.max(0.0)
    } else if let (Some(ratio), Dimension::Points(height)) = (style.aspect_ratio, style.height) {
        // Definite height transfers through the ratio.
        (height * ratio).max(0.0)
    } else {
        let content = if tree.has_measure_func(node) {
            let avail = match kind {
                IntrinsicKind::MinWidth => AvailableSpace::MinContent,
                _ => AvailableSpace::MaxContent,
            };
            measure_leaf(tree, node, avail, AvailableSpace::MaxContent, pass).width
        } else {
            let children = in_flow_children(tree, node);
            let child_kind = match kind {
                IntrinsicKind::MinWidth => IntrinsicKind::MinWidth,
                _ => IntrinsicKind::MaxWidth,
            };
            let resolved = style.flex_direction.resolved(style.direction);
            if resolved.is_row() {
                let gaps = style.get_gap(resolved) * children.len().saturating_sub(1) as f64;
                children
                    .iter()
                    .map(|&child| content_width(tree, child, child_kind, pass))
                    .sum::<f64>()
                    + gaps
            } else {
                children
                    .iter()
                    .map(|&child| content_width(tree, child, child_kind, pass))
                    .fold(0.0, f64::max)
            }
        };
        // Sizes are border-box: add padding and border. Percent padding
        // is undefined here and resolves to zero.
        content + style.padding.resolve(0.0, 0.0).horizontal() + style.border.horizontal()
    };

    let clamped = clamp_optional(
        value,
        style.min_width.resolve(None),
        style.max_width.resolve(None),
    )
    .max(0.0);
    pass.intrinsic.insert((node, kind), clamped);
    clamped
}

fn content_height(tree: &LayoutTree, node: NodeKey, kind: IntrinsicKind, pass: &mut LayoutPass) -> f64 {
    if let Some(&memoized) = pass.intrinsic.get(&(node, kind)) {
        return memoized;
    }
    let Some(style) = tree.style(node) else { return 0.0 };

    let value = if let Dimension::Points(points) = style.height {
        points.max(0.0)
    } else if let (Some(ratio), Dimension::Points(width)) = (style.aspect_ratio, style.width) {
        if ratio > 0.0 { (width / ratio).max(0.0) } else { 0.0 }
    } else {
        let content = if tree.has_measure_func(node) {
            let avail = match kind {
                IntrinsicKind::MinHeight => AvailableSpace::MinContent,
                _ => AvailableSpace::MaxContent,
            };
            measure_leaf(tree, node, AvailableSpace::MaxContent, avail, pass).height
        } else {
            let children = in_flow_children(tree, node);
            let child_kind = match kind {
                IntrinsicKind::MinHeight => IntrinsicKind::MinHeight,
                _ => IntrinsicKind::MaxHeight,
            };
            let resolved = style.flex_direction.resolved(style.direction);
            if resolved.is_row() {
                // Items sit side by side: the tallest child governs.
                children
                    .iter()
                    .map(|&child| content_height(tree, child, child_kind, pass))
                    .fold(0.0, f64::max)
            } else {
                let gaps = style.get_gap(resolved) * children.len().saturating_sub(1) as f64;
                children
                    .iter()
                    .map(|&child| content_height(tree, child, child_kind, pass))
                    .sum::<f64>()
                    + gaps
            }
        };
        content + style.padding.resolve(0.0, 0.0).vertical() + style.border.vertical()
    };

    let clamped = clamp_optional(
        value,
        style.min_height.resolve(None),
        style.max_height.resolve(None),
    )
    .max(0.0);
    pass.intrinsic.insert((node, kind), clamped);
    clamped
}

/// Measure a leaf through its callback, going through the measurement
/// cache first. Definite availability measures under `AtMost`; the
/// content keywords measure unconstrained.
pub(crate) fn measure_leaf(
    tree: &LayoutTree,
    node: NodeKey,
    avail_width: AvailableSpace,
    avail_height: AvailableSpace,
    pass: &mut LayoutPass,
) -> Size {
    let width_mode = SizingMode::from_available(avail_width);
    let height_mode = SizingMode::from_available(avail_height);
    let width_value = avail_width.resolve();
    let height_value = avail_height.resolve();

    let cached = pass
        .caches
        .get(&node)
        .copied()
        .or_else(|| tree.cached_measurement(node));
    if let Some(entry) = cached {
        if entry.matches(width_value, height_value, width_mode, height_mode) {
            pass.cache_hits += 1;
            return Size::new(entry.computed_width, entry.computed_height);
        }
    }

    let measured = match tree.measure(node, avail_width, avail_height) {
        Some(size) => size,
        None => Size::ZERO,
    };
    let measured = Size::new(measured.width.max(0.0), measured.height.max(0.0));
    pass.caches.insert(
        node,
        CachedMeasurement {
            avail_width: width_value,
            avail_height: height_value,
            width_mode,
            height_mode,
            computed_width: measured.width,
            computed_height: measured.height,
        },
    );
    measured
}
