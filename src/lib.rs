//! A CSS-Flexbox-compatible 2-D layout engine.
//!
//! Callers build a [`LayoutTree`] of styled nodes, call
//! [`LayoutTree::compute`] with an available size once per frame, and read
//! an absolute `(x, y, width, height)` per node. The engine is independent
//! of any rendering backend: text and other opaque content enter through
//! per-leaf measure callbacks, and results leave as plain
//! [`LayoutRect`]s.
//!
//! Styles are immutable values shared behind `Arc`; mutation of the tree
//! marks the ancestor chain dirty and drops measurement caches, so a
//! subsequent compute does only the work the change requires.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Error};
use log::{debug, trace, warn};
use once_cell::sync::Lazy;

pub mod geometry;
pub mod layout;
mod printing;
pub mod style;

pub use geometry::{
    approx_eq, approx_ge, approx_le, AvailableSpace, Edges, LayoutRect, Point, Size, LAYOUT_EPSILON,
};
pub use layout::cache::{CachedMeasurement, SizingMode};
#[cfg(feature = "parallel")]
pub use layout::parallel::MIN_CHILDREN_FOR_PARALLEL;
pub use style::{
    AlignContent, AlignItems, Dimension, Direction, Display, FlexDirection, FlexStyle, FlexWrap,
    JustifyContent, Position, Spacing,
};

/// Identifier of a node within a [`LayoutTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub u64);

/// Content measurement callback for leaves. Receives the available space
/// on each axis and returns the content's size. Must not touch the tree;
/// it runs on whichever worker owns the leaf's subtree.
pub type MeasureFunc = Box<dyn Fn(AvailableSpace, AvailableSpace) -> Size + Send + Sync>;

/// Baseline callback: given the node's computed width and height, returns
/// the baseline offset from the top of its box.
pub type BaselineFunc = Box<dyn Fn(f64, f64) -> f64 + Send + Sync>;

/// One shared allocation for the default style; hosts that create many
/// unstyled nodes all point here.
static DEFAULT_STYLE: Lazy<Arc<FlexStyle>> = Lazy::new(|| Arc::new(FlexStyle::default()));

/// Kinds of dirtiness affecting a node. Multiple flags combine; a node is
/// dirty while any bit is set, and its layout must not be read until a
/// compute clears it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DirtyKind(u32);

impl DirtyKind {
    pub const NONE: DirtyKind = DirtyKind(0);
    /// Insertion, removal or reparenting.
    pub const STRUCTURE: DirtyKind = DirtyKind(1 << 0);
    /// Style replacement or callback change.
    pub const STYLE: DirtyKind = DirtyKind(1 << 1);
    /// Geometry potentially altered; the flag propagated to ancestors.
    pub const LAYOUT: DirtyKind = DirtyKind(1 << 2);

    pub fn or(self, other: DirtyKind) -> DirtyKind {
        DirtyKind(self.0 | other.0)
    }

    pub fn contains(self, other: DirtyKind) -> bool {
        (self.0 & other.0) == other.0
    }

    pub fn is_dirty(self) -> bool {
        self.0 != 0
    }
}

struct LayoutNode {
    style: Arc<FlexStyle>,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
    layout: LayoutRect,
    dirty: DirtyKind,
    measure: Option<MeasureFunc>,
    baseline: Option<BaselineFunc>,
    cached: Option<CachedMeasurement>,
}

impl LayoutNode {
    fn new(style: Arc<FlexStyle>) -> Self {
        Self {
            style,
            parent: None,
            children: Vec::new(),
            layout: LayoutRect::ZERO,
            dirty: DirtyKind::STRUCTURE.or(DirtyKind::LAYOUT),
            measure: None,
            baseline: None,
            cached: None,
        }
    }
}

/// The node arena plus everything a compute pass needs: styles, computed
/// rects, dirty flags, measurement caches and telemetry counters.
pub struct LayoutTree {
    nodes: HashMap<NodeKey, LayoutNode>,
    next_key: u64,
    perf_nodes_laid_out_last: u64,
    perf_nodes_laid_out_total: u64,
    perf_cache_hits_last: u64,
    perf_parallel_subtrees_last: u64,
    perf_layout_time_last_ms: u64,
}

impl Default for LayoutTree {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutTree {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            next_key: 0,
            perf_nodes_laid_out_last: 0,
            perf_nodes_laid_out_total: 0,
            perf_cache_hits_last: 0,
            perf_parallel_subtrees_last: 0,
            perf_layout_time_last_ms: 0,
        }
    }

    /// The shared default style value.
    pub fn default_style() -> Arc<FlexStyle> {
        Arc::clone(&DEFAULT_STYLE)
    }

    fn allocate_key(&mut self) -> NodeKey {
        let key = NodeKey(self.next_key);
        self.next_key += 1;
        key
    }

    /// Create a detached node with the given style.
    pub fn new_node(&mut self, style: FlexStyle) -> NodeKey {
        self.new_node_shared(Arc::new(style))
    }

    /// Create a detached node sharing an existing style allocation.
    pub fn new_node_shared(&mut self, style: Arc<FlexStyle>) -> NodeKey {
        let key = self.allocate_key();
        self.nodes.insert(key, LayoutNode::new(style));
        trace!("created node {key:?}");
        key
    }

    /// Create a measured leaf. Leaves with a measure callback can never
    /// take children.
    pub fn new_leaf(&mut self, style: FlexStyle, measure: MeasureFunc) -> NodeKey {
        let key = self.new_node(style);
        if let Some(node) = self.nodes.get_mut(&key) {
            node.measure = Some(measure);
        }
        key
    }

    /// Attach `child` as the last child of `parent`.
    ///
    /// Fails on unknown keys, on a measured-leaf parent, when the child
    /// already has a parent, or when the edge would create a cycle. These
    /// are programmer errors surfaced at the mutating call.
    pub fn add_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), Error> {
        if !self.nodes.contains_key(&parent) {
            bail!("unknown parent node {parent:?}");
        }
        if !self.nodes.contains_key(&child) {
            bail!("unknown child node {child:?}");
        }
        if parent == child {
            bail!("node {parent:?} cannot be its own child");
        }
        if self.nodes.get(&parent).is_some_and(|node| node.measure.is_some()) {
            bail!("node {parent:?} has a measure callback and cannot take children");
        }
        if self.nodes.get(&child).and_then(|node| node.parent).is_some() {
            bail!("node {child:?} already has a parent; remove it first");
        }
        // The child must not be an ancestor of the parent.
        let mut cursor = self.nodes.get(&parent).and_then(|node| node.parent);
        while let Some(key) = cursor {
            if key == child {
                bail!("attaching {child:?} under {parent:?} would create a cycle");
            }
            cursor = self.nodes.get(&key).and_then(|node| node.parent);
        }

        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
        trace!("attached {child:?} under {parent:?}");
        self.mark_dirty(child, DirtyKind::STRUCTURE.or(DirtyKind::LAYOUT));
        self.mark_dirty(parent, DirtyKind::STRUCTURE.or(DirtyKind::LAYOUT));
        Ok(())
    }

    /// Detach `child` from `parent`. The child keeps its subtree and can
    /// be re-attached elsewhere; it loses the parent back-pointer first.
    pub fn remove_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), Error> {
        let is_child = self
            .nodes
            .get(&child)
            .and_then(|node| node.parent)
            .is_some_and(|current| current == parent);
        if !is_child {
            bail!("{child:?} is not a child of {parent:?}");
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.retain(|&key| key != child);
        }
        self.mark_dirty(parent, DirtyKind::STRUCTURE.or(DirtyKind::LAYOUT));
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = None;
            node.dirty = node.dirty.or(DirtyKind::STRUCTURE.or(DirtyKind::LAYOUT));
            node.cached = None;
        }
        trace!("detached {child:?} from {parent:?}");
        Ok(())
    }

    /// Replace a node's style atomically and dirty the ancestor chain.
    pub fn set_style(&mut self, node: NodeKey, style: FlexStyle) -> Result<(), Error> {
        self.set_style_shared(node, Arc::new(style))
    }

    pub fn set_style_shared(&mut self, node: NodeKey, style: Arc<FlexStyle>) -> Result<(), Error> {
        let Some(entry) = self.nodes.get_mut(&node) else {
            bail!("unknown node {node:?}");
        };
        entry.style = style;
        self.mark_dirty(node, DirtyKind::STYLE.or(DirtyKind::LAYOUT));
        Ok(())
    }

    /// Install or clear a measure callback. Only childless nodes may
    /// carry one.
    pub fn set_measure_func(&mut self, node: NodeKey, measure: Option<MeasureFunc>) -> Result<(), Error> {
        let Some(entry) = self.nodes.get(&node) else {
            bail!("unknown node {node:?}");
        };
        if measure.is_some() && !entry.children.is_empty() {
            bail!("node {node:?} has children and cannot take a measure callback");
        }
        if let Some(entry) = self.nodes.get_mut(&node) {
            entry.measure = measure;
        }
        self.mark_dirty(node, DirtyKind::STYLE.or(DirtyKind::LAYOUT));
        Ok(())
    }

    pub fn set_baseline_func(&mut self, node: NodeKey, baseline: Option<BaselineFunc>) -> Result<(), Error> {
        let Some(entry) = self.nodes.get_mut(&node) else {
            bail!("unknown node {node:?}");
        };
        entry.baseline = baseline;
        self.mark_dirty(node, DirtyKind::STYLE.or(DirtyKind::LAYOUT));
        Ok(())
    }

    /// Drop a node's measurement cache and dirty its ancestor chain.
    pub fn invalidate_cache(&mut self, node: NodeKey) {
        self.mark_dirty(node, DirtyKind::LAYOUT);
    }

    /// Mark a node dirty and propagate `LAYOUT` up the parent chain,
    /// dropping caches along the way. Propagation stops at ancestors that
    /// already carry the flag.
    pub fn mark_dirty(&mut self, node: NodeKey, kind: DirtyKind) {
        let Some(entry) = self.nodes.get_mut(&node) else { return };
        entry.dirty = entry.dirty.or(kind);
        entry.cached = None;
        let mut cursor = entry.parent;
        while let Some(key) = cursor {
            let Some(ancestor) = self.nodes.get_mut(&key) else { break };
            if ancestor.dirty.contains(DirtyKind::LAYOUT) {
                break;
            }
            ancestor.dirty = ancestor.dirty.or(DirtyKind::LAYOUT);
            ancestor.cached = None;
            cursor = ancestor.parent;
        }
    }

    // Accessors -----------------------------------------------------------

    pub fn style(&self, node: NodeKey) -> Option<&FlexStyle> {
        self.nodes.get(&node).map(|entry| entry.style.as_ref())
    }

    pub fn children(&self, node: NodeKey) -> &[NodeKey] {
        self.nodes.get(&node).map(|entry| entry.children.as_slice()).unwrap_or(&[])
    }

    pub fn child_count(&self, node: NodeKey) -> usize {
        self.children(node).len()
    }

    pub fn parent(&self, node: NodeKey) -> Option<NodeKey> {
        self.nodes.get(&node).and_then(|entry| entry.parent)
    }

    /// Computed geometry; valid only while the node is clean.
    pub fn layout(&self, node: NodeKey) -> LayoutRect {
        self.nodes.get(&node).map(|entry| entry.layout).unwrap_or(LayoutRect::ZERO)
    }

    pub fn is_dirty(&self, node: NodeKey) -> bool {
        self.nodes.get(&node).map(|entry| entry.dirty.is_dirty()).unwrap_or(false)
    }

    pub fn dirty_kind_of(&self, node: NodeKey) -> DirtyKind {
        self.nodes.get(&node).map(|entry| entry.dirty).unwrap_or(DirtyKind::NONE)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Keys of all detached roots, in creation order.
    pub fn roots(&self) -> Vec<NodeKey> {
        let mut keys: Vec<NodeKey> = self
            .nodes
            .iter()
            .filter(|(_, entry)| entry.parent.is_none())
            .map(|(&key, _)| key)
            .collect();
        keys.sort();
        keys
    }

    pub(crate) fn cached_measurement(&self, node: NodeKey) -> Option<CachedMeasurement> {
        self.nodes.get(&node).and_then(|entry| entry.cached)
    }

    pub(crate) fn has_measure_func(&self, node: NodeKey) -> bool {
        self.nodes.get(&node).is_some_and(|entry| entry.measure.is_some())
    }

    pub(crate) fn measure(
        &self,
        node: NodeKey,
        avail_width: AvailableSpace,
        avail_height: AvailableSpace,
    ) -> Option<Size> {
        self.nodes
            .get(&node)
            .and_then(|entry| entry.measure.as_ref())
            .map(|func| func(avail_width, avail_height))
    }

    pub(crate) fn baseline(&self, node: NodeKey, width: f64, height: f64) -> Option<f64> {
        self.nodes
            .get(&node)
            .and_then(|entry| entry.baseline.as_ref())
            .map(|func| func(width, height))
    }

    // Compute entry points ------------------------------------------------

    /// Lay out the subtree under `root` within `available`, sequentially.
    /// Writes every reachable node's layout, clears dirty flags and
    /// refreshes caches. Returns the number of nodes laid out; 0 on a
    /// full cache hit or an unknown root. Never fails.
    pub fn compute(&mut self, root: NodeKey, available: Size) -> usize {
        let start = Instant::now();
        if !self.nodes.contains_key(&root) {
            warn!("compute called with unknown root {root:?}");
            return 0;
        }
        if self.full_tree_cache_hit(root, available) {
            debug!("compute {root:?}: clean tree, cached result reused");
            self.record_cache_only_pass(start);
            return 0;
        }
        let mut pass = layout::LayoutPass::default();
        let list = layout::compute::compute_node_shallow(&*self, root, available, &mut pass);
        layout::compute::recurse_sequential(&*self, &list, &mut pass);
        self.commit(pass, 0, start)
    }

    /// Lay out like [`Self::compute`], dispatching independent child
    /// subtrees to rayon once the root and its direct children are
    /// settled. Produces results identical to the sequential path.
    #[cfg(feature = "parallel")]
    pub fn compute_parallel(
        &mut self,
        root: NodeKey,
        available: Size,
        pool: Option<&rayon::ThreadPool>,
    ) -> usize {
        let start = Instant::now();
        if !self.nodes.contains_key(&root) {
            warn!("compute_parallel called with unknown root {root:?}");
            return 0;
        }
        if self.full_tree_cache_hit(root, available) {
            debug!("compute_parallel {root:?}: clean tree, cached result reused");
            self.record_cache_only_pass(start);
            return 0;
        }
        let (pass, dispatched) = layout::parallel::run(&*self, root, available, pool);
        self.commit(pass, dispatched, start)
    }

    fn full_tree_cache_hit(&self, root: NodeKey, available: Size) -> bool {
        if self.is_dirty(root) {
            return false;
        }
        self.cached_measurement(root).is_some_and(|cached| {
            cached.matches(available.width, available.height, SizingMode::Exactly, SizingMode::Exactly)
        })
    }

    fn record_cache_only_pass(&mut self, start: Instant) {
        self.perf_nodes_laid_out_last = 0;
        self.perf_cache_hits_last = 1;
        self.perf_parallel_subtrees_last = 0;
        self.perf_layout_time_last_ms = start.elapsed().as_millis() as u64;
    }

    fn commit(&mut self, pass: layout::LayoutPass, parallel_subtrees: usize, start: Instant) -> usize {
        let count = pass.rects.len();
        for (key, rect) in pass.rects {
            if let Some(node) = self.nodes.get_mut(&key) {
                node.layout = rect;
                node.dirty = DirtyKind::NONE;
            }
        }
        for (key, cached) in pass.caches {
            if let Some(node) = self.nodes.get_mut(&key) {
                node.cached = Some(cached);
            }
        }
        self.perf_nodes_laid_out_last = count as u64;
        self.perf_nodes_laid_out_total = self.perf_nodes_laid_out_total.saturating_add(count as u64);
        self.perf_cache_hits_last = pass.cache_hits;
        self.perf_parallel_subtrees_last = parallel_subtrees as u64;
        self.perf_layout_time_last_ms = start.elapsed().as_millis() as u64;
        debug!(
            "layout pass complete: {count} nodes, {} cache hits, {} parallel subtrees",
            self.perf_cache_hits_last, self.perf_parallel_subtrees_last
        );
        count
    }

    // Intrinsic queries ---------------------------------------------------

    /// Smallest width the subtree can take without overflowing.
    pub fn min_content_width(&self, node: NodeKey) -> f64 {
        let mut pass = layout::LayoutPass::default();
        layout::intrinsic::min_content_width(self, node, &mut pass)
    }

    /// Width the subtree takes with no constraint at all.
    pub fn max_content_width(&self, node: NodeKey) -> f64 {
        let mut pass = layout::LayoutPass::default();
        layout::intrinsic::max_content_width(self, node, &mut pass)
    }

    pub fn min_content_height(&self, node: NodeKey) -> f64 {
        let mut pass = layout::LayoutPass::default();
        layout::intrinsic::min_content_height(self, node, &mut pass)
    }

    pub fn max_content_height(&self, node: NodeKey) -> f64 {
        let mut pass = layout::LayoutPass::default();
        layout::intrinsic::max_content_height(self, node, &mut pass)
    }

    /// `min(max_content, max(min_content, available))`, optionally capped.
    pub fn fit_content_width(&self, node: NodeKey, available: f64, clamp: Option<f64>) -> f64 {
        let mut pass = layout::LayoutPass::default();
        layout::intrinsic::fit_content_width(self, node, available, clamp, &mut pass)
    }

    pub fn fit_content_height(&self, node: NodeKey, available: f64, clamp: Option<f64>) -> f64 {
        let mut pass = layout::LayoutPass::default();
        layout::intrinsic::fit_content_height(self, node, available, clamp, &mut pass)
    }

    // Telemetry -----------------------------------------------------------

    /// Nodes laid out by the last compute.
    pub fn perf_nodes_laid_out_last(&self) -> u64 {
        self.perf_nodes_laid_out_last
    }

    /// Cumulative nodes laid out across computes.
    pub fn perf_nodes_laid_out_total(&self) -> u64 {
        self.perf_nodes_laid_out_total
    }

    /// Cache hits (skipped subtrees and reused measurements) in the last
    /// compute.
    pub fn perf_cache_hits_last(&self) -> u64 {
        self.perf_cache_hits_last
    }

    /// Subtrees dispatched to the worker pool by the last parallel
    /// compute; 0 when the sequential fallback ran.
    pub fn perf_parallel_subtrees_last(&self) -> u64 {
        self.perf_parallel_subtrees_last
    }

    /// Wall-clock duration of the last compute in milliseconds.
    pub fn perf_layout_time_last_ms(&self) -> u64 {
        self.perf_layout_time_last_ms
    }
}
