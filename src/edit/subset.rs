//! Subsetting a skeleton to a set of nodes.

use crate::error::{Result, SkeletonError};
use crate::graph::geodesic::lowest_common_ancestor;
use crate::graph::VertexIndex;
use crate::model::node::{Node, NodeId};
use crate::model::skeleton::{ConnectorPolicy, Skeleton};
use std::collections::HashMap;
use tracing::debug;

/// Options for [`Skeleton::subset`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubsetOptions {
    /// Expand the node set to its [connected superset](Skeleton::connected_superset) first
    pub prevent_fragments: bool,
    /// What happens to connectors on dropped nodes
    pub connectors: ConnectorPolicy,
}

impl SubsetOptions {
    /// Plain subset, connectors on dropped nodes are dropped.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the result connected within each original tree.
    pub fn prevent_fragments(mut self) -> Self {
        self.prevent_fragments = true;
        self
    }

    /// Moves connectors on dropped nodes to their nearest kept ancestor.
    pub fn reattach_connectors(mut self) -> Self {
        self.connectors = ConnectorPolicy::Reattach;
        self
    }
}

impl Skeleton {
    /// Retains exactly the given nodes.
    ///
    /// Nodes whose parent is not retained become roots. Node order is
    /// preserved.
    ///
    /// # Errors
    /// [SkeletonError::NotFound] if an id does not exist.
    pub fn subset(&mut self, keep: &[NodeId], options: SubsetOptions) -> Result<()> {
        let mut skeleton = self.lock();
        let view = skeleton.graph();
        let mut mask = vec![false; view.len()];
        for v in view.require_all(keep)? {
            mask[v] = true;
        }
        skeleton.subset_indices(mask, options)
    }

    /// Retains the nodes for which `predicate` returns `true`.
    pub fn subset_by<F>(&mut self, predicate: F, options: SubsetOptions) -> Result<()>
    where
        F: Fn(&Node) -> bool,
    {
        let mut skeleton = self.lock();
        let mask = skeleton.nodes().iter().map(predicate).collect();
        skeleton.subset_indices(mask, options)
    }

    /// Retains the nodes whose entry in `mask` (node table order) is `true`.
    ///
    /// # Errors
    /// [SkeletonError::Schema] if the mask length differs from the number of nodes.
    pub fn subset_mask(&mut self, mask: &[bool], options: SubsetOptions) -> Result<()> {
        if mask.len() != self.n_nodes() {
            return Err(SkeletonError::Schema(format!(
                "mask has {} entries for {} nodes",
                mask.len(),
                self.n_nodes()
            )));
        }
        let mut skeleton = self.lock();
        skeleton.subset_indices(mask.to_vec(), options)
    }

    /// Returns the smallest connected superset of `ids` within each tree.
    ///
    /// For every tree holding some of the nodes, adds all nodes on the paths
    /// from those nodes to their lowest common ancestor. The result is in
    /// node table order.
    ///
    /// # Errors
    /// [SkeletonError::NotFound] if an id does not exist.
    pub fn connected_superset(&self, ids: &[NodeId]) -> Result<Vec<NodeId>> {
        let view = self.graph();
        let mask = connected_superset_mask(self, &view.require_all(ids)?);
        Ok(mask
            .iter()
            .enumerate()
            .filter(|(_, keep)| **keep)
            .map(|(v, _)| view.id(v))
            .collect())
    }

    /// Applies a subset given as mask over arena indices.
    pub(crate) fn subset_indices(&mut self, mut mask: Vec<bool>, options: SubsetOptions) -> Result<()> {
        if options.prevent_fragments {
            let selected: Vec<VertexIndex> = (0..mask.len()).filter(|v| mask[*v]).collect();
            mask = connected_superset_mask(self, &selected);
        }

        let nodes: Vec<Node> = self
            .nodes()
            .iter()
            .zip(&mask)
            .filter(|(_, keep)| **keep)
            .map(|(node, _)| {
                let mut node = node.clone();
                let parent_kept = self
                    .graph()
                    .index_of(node.parent_id())
                    .is_some_and(|p| mask[p]);
                if !parent_kept {
                    node.set_parent(None);
                }
                node
            })
            .collect();

        debug!(kept = nodes.len(), total = mask.len(), "subsetting skeleton");
        self.commit(nodes, options.connectors)
    }
}

/// Mask of the minimal connected superset of `selected` within each tree.
fn connected_superset_mask(skeleton: &Skeleton, selected: &[VertexIndex]) -> Vec<bool> {
    let view = skeleton.graph();
    let component = view.component_roots();

    let mut groups: HashMap<VertexIndex, Vec<VertexIndex>> = HashMap::new();
    for v in selected {
        groups.entry(component[*v]).or_default().push(*v);
    }

    let mut mask = vec![false; view.len()];
    for members in groups.values() {
        let mut lca = members[0];
        for v in &members[1..] {
            // Same tree, so an ancestor always exists
            lca = lowest_common_ancestor(view, lca, *v).unwrap_or(lca);
        }
        mask[lca] = true;
        for v in members {
            for u in view.ancestors(*v) {
                if u == lca || mask[u] {
                    break;
                }
                mask[u] = true;
            }
        }
    }
    mask
}
