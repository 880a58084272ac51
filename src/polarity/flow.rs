//! Synapse flow centrality.
//!
//! For a node `v`, let `distal_pre`/`distal_post` be the synapses in the
//! subtree of `v` (including `v` itself) and `proximal_*` the remainder.
//! The flow through `v` counts the input→output paths passing it:
//!
//! | Mode | Flow |
//! |------|------|
//! | centrifugal | `proximal_post × distal_pre` |
//! | centripetal | `distal_post × proximal_pre` |
//! | sum | both added |
//!
//! Distal counts are accumulated in one post-order pass, which yields the
//! same numbers as evaluating the distal relation between every node and
//! every synapse-bearing node.

use crate::error::{Result, SkeletonError};
use crate::graph::view::GraphView;
use crate::model::connector::ConnectorKind;
use crate::model::skeleton::Skeleton;
use serde::{Deserialize, Serialize};

/// Direction of the paths counted by flow centrality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowMode {
    /// Proximal inputs to distal outputs
    Centrifugal,
    /// Distal inputs to proximal outputs
    Centripetal,
    /// Both directions
    #[default]
    Sum,
}

/// Pre- and postsynapse counts per node (arena order).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynapseCounts {
    /// Presynapses on each node
    pub pre: Vec<u64>,
    /// Postsynapses on each node
    pub post: Vec<u64>,
}

impl SynapseCounts {
    /// Total number of presynapses.
    pub fn total_pre(&self) -> u64 {
        self.pre.iter().sum()
    }

    /// Total number of postsynapses.
    pub fn total_post(&self) -> u64 {
        self.post.iter().sum()
    }

    /// Accumulates the counts over each subtree (node itself included).
    pub fn distal(&self, view: &GraphView) -> SynapseCounts {
        let mut distal = self.clone();
        for v in view.post_order_iter() {
            if let Some(p) = view.parent(v) {
                distal.pre[p] += distal.pre[v];
                distal.post[p] += distal.post[v];
            }
        }
        distal
    }
}

/// Computes the flow through every node from subtree counts.
pub fn flow_centrality(counts: &SynapseCounts, distal: &SynapseCounts, mode: FlowMode) -> Vec<f64> {
    let total_pre = counts.total_pre();
    let total_post = counts.total_post();
    distal
        .pre
        .iter()
        .zip(&distal.post)
        .map(|(&dist_pre, &dist_post)| {
            let centrifugal = (total_post - dist_post) * dist_pre;
            let centripetal = dist_post * (total_pre - dist_pre);
            let flow = match mode {
                FlowMode::Centrifugal => centrifugal,
                FlowMode::Centripetal => centripetal,
                FlowMode::Sum => centrifugal + centripetal,
            };
            flow as f64
        })
        .collect()
}

impl Skeleton {
    /// Counts pre- and postsynapses per node (node table order).
    ///
    /// # Errors
    /// - [SkeletonError::MissingData] if there are no connectors
    /// - [SkeletonError::Schema] if a connector is neither pre nor post
    pub fn synapse_counts(&self) -> Result<SynapseCounts> {
        if !self.has_connectors() {
            return Err(SkeletonError::MissingData(
                "skeleton has no connectors".to_string(),
            ));
        }
        let view = self.graph();
        let mut counts = SynapseCounts {
            pre: vec![0; view.len()],
            post: vec![0; view.len()],
        };
        for connector in self.connectors() {
            let v = view.require(connector.node_id)?;
            match &connector.kind {
                ConnectorKind::Pre => counts.pre[v] += 1,
                ConnectorKind::Post => counts.post[v] += 1,
                ConnectorKind::Other(label) => {
                    return Err(SkeletonError::Schema(format!(
                        "connector {} has type \"{label}\", expected pre/post or 0/1",
                        connector.connector_id
                    )));
                }
            }
        }
        Ok(counts)
    }

    /// Computes the synapse flow centrality of every node (node table order).
    ///
    /// # Errors
    /// [SkeletonError::MultipleRoots] unless the skeleton is a single tree,
    /// otherwise as [`Skeleton::synapse_counts`].
    pub fn flow_centrality(&self, mode: FlowMode) -> Result<Vec<f64>> {
        let num_roots = self.n_roots();
        if num_roots != 1 {
            return Err(SkeletonError::MultipleRoots { num_roots });
        }
        let counts = self.synapse_counts()?;
        let distal = counts.distal(self.graph());
        Ok(flow_centrality(&counts, &distal, mode))
    }
}
