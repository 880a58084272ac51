//! Node classification by topological role.

use crate::graph::view::GraphView;
use crate::model::node::NodeType;

/// Classifies every node of `view` (arena order).
///
/// Nodes without parent are [NodeType::Root] (this includes isolated
/// single nodes), nodes without children [NodeType::End], nodes with more
/// than one child [NodeType::Branch], all others [NodeType::Slab].
pub fn classify(view: &GraphView) -> Vec<NodeType> {
    (0..view.len())
        .map(|v| {
            if view.is_root(v) {
                NodeType::Root
            } else if view.is_leaf(v) {
                NodeType::End
            } else if view.is_branch(v) {
                NodeType::Branch
            } else {
                NodeType::Slab
            }
        })
        .collect()
}
