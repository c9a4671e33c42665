//! The layout pass.
//!
//! The pass is pure with respect to the tree: algorithms read `LayoutTree`
//! through shared borrows and write every result into a [`LayoutPass`],
//! which the tree commits afterwards. This is what lets the parallel
//! driver hand disjoint subtrees to workers without any shared mutable
//! state; each worker fills a private pass that is merged after join.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::geometry::LayoutRect;
use crate::style::{Display, Position};
use crate::{LayoutTree, NodeKey};

pub mod cache;
pub mod compute;
pub mod flex;
pub mod intrinsic;
#[cfg(feature = "parallel")]
pub mod parallel;

use self::cache::CachedMeasurement;

/// Which intrinsic quantity a memo entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum IntrinsicKind {
    MinWidth,
    MaxWidth,
    MinHeight,
    MaxHeight,
}

/// Scratch and result state for one compute pass (or one parallel
/// worker's share of it).
#[derive(Default)]
pub(crate) struct LayoutPass {
    /// Final geometry per reached node.
    pub rects: HashMap<NodeKey, LayoutRect>,
    /// Cache entries to commit, replacing each node's cached slot.
    pub caches: HashMap<NodeKey, CachedMeasurement>,
    /// Per-pass baseline memo; baseline queries recurse into children and
    /// would go exponential on deep trees without it.
    pub baselines: HashMap<NodeKey, f64>,
    /// Per-pass intrinsic sizing memo.
    pub intrinsic: HashMap<(NodeKey, IntrinsicKind), f64>,
    /// Nodes answered from a still-valid cache instead of recomputation.
    pub cache_hits: u64,
}

impl LayoutPass {
    /// Fold a worker's partial results into this pass. Subtrees are
    /// disjoint, so key collisions cannot occur for rects; memo collisions
    /// are harmless duplicates.
    pub fn merge(&mut self, other: LayoutPass) {
        self.rects.extend(other.rects);
        self.caches.extend(other.caches);
        self.baselines.extend(other.baselines);
        self.intrinsic.extend(other.intrinsic);
        self.cache_hits += other.cache_hits;
    }
}

/// Children participating in the parent's flex layout, with
/// `display: contents` subtrees flattened in place and `display: none` /
/// absolutely positioned children excluded.
pub(crate) fn in_flow_children(tree: &LayoutTree, node: NodeKey) -> SmallVec<NodeKey, 8> {
    let mut out = SmallVec::new();
    collect_in_flow(tree, node, &mut out);
    out
}

fn collect_in_flow(tree: &LayoutTree, node: NodeKey, out: &mut SmallVec<NodeKey, 8>) {
    for &child in tree.children(node) {
        let Some(style) = tree.style(child) else { continue };
        match style.display {
            Display::None => {}
            Display::Contents => collect_in_flow(tree, child, out),
            Display::Flex => {
                if style.position != Position::Absolute {
                    out.push(child);
                }
            }
        }
    }
}
