//! Inserting and removing individual nodes.

use crate::error::{Result, SkeletonError};
use crate::geometry::{Point, distance, lerp};
use crate::graph::VertexIndex;
use crate::model::node::{Node, NodeId};
use crate::model::skeleton::{ConnectorPolicy, Skeleton};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Where to place a node inserted on an edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InsertPosition {
    /// Fraction of the way from parent (0) to child (1)
    Fraction(f64),
    /// Explicit coordinates
    Point(Point),
}

impl Default for InsertPosition {
    fn default() -> Self {
        InsertPosition::Fraction(0.5)
    }
}

impl Skeleton {
    /// Inserts a new node on each `(parent, child)` edge.
    ///
    /// The radius is interpolated linearly between parent and child (unknown
    /// if either is unknown). New ids continue above the current maximum.
    ///
    /// # Arguments
    /// * `edges` - `(parent, child)` pairs
    /// * `positions` - One position per edge, or empty for midpoints
    /// * `validate` - Check that every pair is an existing edge
    ///
    /// # Returns
    /// The ids of the new nodes, in the order of `edges`.
    ///
    /// # Errors
    /// - [SkeletonError::NotFound] if a node does not exist
    /// - [SkeletonError::Schema] if `positions` has the wrong length or a
    ///   fraction lies outside `[0, 1]`
    /// - [SkeletonError::Structural] if `validate` is set and a pair is not an
    ///   edge, or if the insertion would create a cycle
    pub fn insert_nodes(
        &mut self,
        edges: &[(NodeId, NodeId)],
        positions: &[InsertPosition],
        validate: bool,
    ) -> Result<Vec<NodeId>> {
        if !positions.is_empty() && positions.len() != edges.len() {
            return Err(SkeletonError::Schema(format!(
                "{} positions given for {} edges",
                positions.len(),
                edges.len()
            )));
        }
        for position in positions {
            if let InsertPosition::Fraction(t) = position {
                if !(0.0..=1.0).contains(t) {
                    return Err(SkeletonError::Schema(format!(
                        "insert fraction {t} is outside [0, 1]"
                    )));
                }
            }
        }
        let mut skeleton = self.lock();
        let view = skeleton.graph();
        let mut nodes = skeleton.nodes().to_vec();
        let mut next_id = nodes.iter().map(Node::id).max().map_or(1, |m| m + 1);
        let mut new_ids = Vec::with_capacity(edges.len());

        for (i, &(parent, child)) in edges.iter().enumerate() {
            let p = view.require(parent)?;
            let c = view.require(child)?;
            if validate && nodes[c].parent() != Some(parent) {
                return Err(SkeletonError::Structural(format!(
                    "{parent} -> {child} is not an edge"
                )));
            }

            let from = *nodes[p].position();
            let to = *nodes[c].position();
            let (position, t) = match positions.get(i).copied().unwrap_or_default() {
                InsertPosition::Fraction(t) => (lerp(&from, &to, t), t),
                InsertPosition::Point(point) => {
                    let before = distance(&from, &point);
                    let total = before + distance(&point, &to);
                    let t = if total > 0.0 { before / total } else { 0.5 };
                    (point, t)
                }
            };
            let radius = match (nodes[p].radius(), nodes[c].radius()) {
                (Some(a), Some(b)) => Some(a + (b - a) * t),
                _ => None,
            };

            nodes.push(Node::new(next_id, Some(parent), position, radius));
            nodes[c].set_parent(Some(next_id));
            new_ids.push(next_id);
            next_id += 1;
        }

        debug!(inserted = new_ids.len(), "inserting nodes");
        skeleton.commit(nodes, ConnectorPolicy::Drop)?;
        Ok(new_ids)
    }

    /// Removes nodes without disconnecting the tree.
    ///
    /// Children of a removed node are reattached to its nearest surviving
    /// ancestor (`1→2→3` without `2` becomes `1→3`). A removed root with a
    /// single surviving child lineage passes the root role on. Connectors and
    /// tags on removed nodes are dropped.
    ///
    /// # Errors
    /// - [SkeletonError::NotFound] if an id does not exist
    /// - [SkeletonError::Structural] if removing a root would split its tree
    pub fn remove_nodes(&mut self, ids: &[NodeId]) -> Result<()> {
        let mut skeleton = self.lock();
        let view = skeleton.graph();
        let removed: HashSet<VertexIndex> = view.require_all(ids)?.into_iter().collect();
        let component = view.component_roots();

        let mut new_roots_per_tree: HashMap<VertexIndex, usize> = HashMap::new();
        let mut nodes = Vec::with_capacity(view.len() - removed.len());
        for (v, node) in skeleton.nodes().iter().enumerate() {
            if removed.contains(&v) {
                continue;
            }
            let new_parent = view
                .ancestors(v)
                .skip(1)
                .find(|a| !removed.contains(a))
                .map(|a| view.id(a));
            if new_parent.is_none() {
                *new_roots_per_tree.entry(component[v]).or_insert(0) += 1;
            }
            let mut node = node.clone();
            node.set_parent(new_parent);
            nodes.push(node);
        }

        if let Some((root, _)) = new_roots_per_tree.iter().find(|(_, n)| **n > 1) {
            return Err(SkeletonError::Structural(format!(
                "removing root {} would split its tree",
                view.id(*root)
            )));
        }

        debug!(removed = removed.len(), "removing nodes");
        skeleton.commit(nodes, ConnectorPolicy::Drop)
    }
}
