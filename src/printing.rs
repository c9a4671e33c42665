//! Debug rendering of the tree with computed geometry.

use std::fmt;

use crate::{LayoutTree, NodeKey};

impl fmt::Debug for LayoutTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "LAYOUT TREE ({} nodes)", self.node_count())?;

        fn write_indent(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
            for _ in 0..depth {
                f.write_str("  ")?;
            }
            Ok(())
        }

        fn fmt_node(
            tree: &LayoutTree,
            key: NodeKey,
            f: &mut fmt::Formatter<'_>,
            depth: usize,
        ) -> fmt::Result {
            write_indent(f, depth)?;
            let rect = tree.layout(key);
            let marker = if tree.is_dirty(key) { " (dirty)" } else { "" };
            writeln!(
                f,
                "{key:?} [x={:.1} y={:.1} w={:.1} h={:.1}]{marker}",
                rect.x, rect.y, rect.width, rect.height
            )?;
            for &child in tree.children(key) {
                fmt_node(tree, child, f, depth + 1)?;
            }
            Ok(())
        }

        for root in self.roots() {
            fmt_node(self, root, f, 0)?;
        }
        Ok(())
    }
}
