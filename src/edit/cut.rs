//! Cutting a skeleton into distal and proximal fragments.

use crate::error::{Result, SkeletonError};
use crate::model::node::NodeId;
use crate::model::skeleton::{ConnectorPolicy, Skeleton};
use std::collections::HashSet;
use tracing::debug;

impl Skeleton {
    /// Cuts the skeleton at `cut_node` and returns `(distal, proximal)`.
    ///
    /// The distal fragment is the subtree rooted at `cut_node` (which
    /// becomes its root); the proximal fragment is everything else plus
    /// `cut_node` as a new leaf. The cut node's connectors go with the
    /// distal fragment; tags go with every fragment holding the node.
    ///
    /// # Errors
    /// - [SkeletonError::MultipleRoots] unless the skeleton is a single tree
    /// - [SkeletonError::NotFound] if `cut_node` does not exist
    /// - [SkeletonError::Structural] if `cut_node` is the root
    pub fn cut_at(&self, cut_node: NodeId) -> Result<(Skeleton, Skeleton)> {
        let num_roots = self.n_roots();
        if num_roots != 1 {
            return Err(SkeletonError::MultipleRoots { num_roots });
        }
        self.split_at(cut_node)
    }

    /// Cuts the skeleton at several nodes, in order.
    ///
    /// Each cut is applied to whichever fragment currently holds the node
    /// as a non-root; the two resulting fragments replace it in place
    /// (distal before proximal). The output order is therefore only
    /// distal-before-proximal for a single cut.
    ///
    /// # Errors
    /// As [`Skeleton::cut_at`]; additionally [SkeletonError::Structural] if a
    /// later cut node has become a fragment root.
    pub fn cut(&self, cut_nodes: &[NodeId]) -> Result<Vec<Skeleton>> {
        let num_roots = self.n_roots();
        if num_roots != 1 {
            return Err(SkeletonError::MultipleRoots { num_roots });
        }
        self.graph().require_all(cut_nodes)?;

        let mut fragments = vec![self.clone()];
        for &cut_node in cut_nodes {
            let position = fragments
                .iter()
                .position(|f| f.graph().index_of(cut_node).is_some_and(|v| !f.graph().is_root(v)))
                .ok_or_else(|| {
                    SkeletonError::Structural(format!("cannot cut at root (node {cut_node})"))
                })?;
            let (distal, proximal) = fragments[position].split_at(cut_node)?;
            fragments.splice(position..=position, [distal, proximal]);
        }
        debug!(cuts = cut_nodes.len(), fragments = fragments.len(), "cut skeleton");
        Ok(fragments)
    }

    /// Splits the tree holding `cut_node`; other trees stay with the proximal part.
    fn split_at(&self, cut_node: NodeId) -> Result<(Skeleton, Skeleton)> {
        let view = self.graph();
        let c = view.require(cut_node)?;
        if view.is_root(c) {
            return Err(SkeletonError::Structural(format!(
                "cannot cut at root (node {cut_node})"
            )));
        }

        let distal_set: HashSet<usize> = view.subtree(c).into_iter().collect();
        let mut distal_nodes = Vec::with_capacity(distal_set.len());
        let mut proximal_nodes = Vec::with_capacity(view.len() - distal_set.len() + 1);
        for (v, node) in self.nodes().iter().enumerate() {
            if v == c {
                let mut new_root = node.clone();
                new_root.set_parent(None);
                distal_nodes.push(new_root);
                proximal_nodes.push(node.clone());
            } else if distal_set.contains(&v) {
                distal_nodes.push(node.clone());
            } else {
                proximal_nodes.push(node.clone());
            }
        }

        let mut distal = self.clone();
        distal.commit(distal_nodes, ConnectorPolicy::Drop)?;
        let mut proximal = self.clone();
        proximal.commit(proximal_nodes, ConnectorPolicy::Drop)?;
        proximal.connectors_mut().retain(|c| c.node_id != cut_node);
        Ok((distal, proximal))
    }
}
