//! Depth-1 fork-join parallel layout.
//!
//! Once the root's inner box and its direct children's boxes are settled,
//! sibling subtrees are layout-independent: each worker reads the shared
//! tree and fills a private [`LayoutPass`], and the partial passes are
//! merged after the join. Recursion inside a worker stays sequential;
//! nested parallelism inflates contention without measurable gain on
//! typical trees.

use log::debug;
use rayon::prelude::*;

use crate::geometry::Size;
use crate::layout::compute::{
    compute_node_shallow, place_immediate_children, recurse_sequential, subtree_cache_valid,
};
use crate::layout::LayoutPass;
use crate::{LayoutTree, NodeKey};

/// Fan-outs smaller than this run sequentially; the pool costs more than
/// it saves on tiny sibling sets.
pub const MIN_CHILDREN_FOR_PARALLEL: usize = 3;

/// Run a full pass, dispatching the root's child subtrees to rayon.
/// Returns the merged pass and the number of subtrees dispatched (0 when
/// the sequential fallback ran).
pub(crate) fn run(
    tree: &LayoutTree,
    root: NodeKey,
    available: Size,
    pool: Option<&rayon::ThreadPool>,
) -> (LayoutPass, usize) {
    let mut pass = LayoutPass::default();
    let list = compute_node_shallow(tree, root, available, &mut pass);

    if list.len() < MIN_CHILDREN_FOR_PARALLEL {
        recurse_sequential(tree, &list, &mut pass);
        return (pass, 0);
    }

    let subtree_pass = |entry: &(NodeKey, f64, f64)| -> LayoutPass {
        let (child, width, height) = *entry;
        let mut local = LayoutPass::default();
        if subtree_cache_valid(tree, child, width, height) {
            local.cache_hits = 1;
            return local;
        }
        let sublist = place_immediate_children(tree, child, width, height, &mut local);
        recurse_sequential(tree, &sublist, &mut local);
        local
    };

    let partials: Vec<LayoutPass> = match pool {
        Some(pool) => pool.install(|| list.par_iter().map(subtree_pass).collect()),
        None => list.par_iter().map(subtree_pass).collect(),
    };
    let dispatched = partials.len();
    debug!("parallel layout dispatched {dispatched} subtrees from {root:?}");
    for partial in partials {
        pass.merge(partial);
    }
    (pass, dispatched)
}
