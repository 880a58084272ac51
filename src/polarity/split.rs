//! Axon/dendrite split.
//!
//! # Algorithm
//! 1. Compute flow centrality; the *linker* is every node whose flow is at
//!    least `flow_threshold × max_flow`.
//! 2. Removing the linker leaves two or more fragments. Each is classified
//!    as axon or dendrite, by synapse ratios ([SplitMethod::Prepost]) or by
//!    whether it holds the root ([SplitMethod::Distance]).
//! 3. Optionally, the *cell body fiber* is carved out: the zero-flow path
//!    from the root down to (not including) the first node where synapse
//!    bearing branches diverge or flow starts.
//!
//! [`Skeleton::label_compartments`] writes the result onto the nodes;
//! [`Skeleton::split_axon_dendrite`] additionally returns one skeleton per
//! compartment, reconnecting fragmented pieces through their connected
//! superset (linker nodes excluded).

use crate::edit::subset::SubsetOptions;
use crate::error::{Result, SkeletonError};
use crate::graph::VertexIndex;
use crate::model::node::{Compartment, Node, NodeId};
use crate::model::skeleton::Skeleton;
use crate::polarity::flow::{FlowMode, flow_centrality};
use crate::polarity::segregation::segregation_index;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

// =#========================================================================#=
// OPTIONS
// =#========================================================================#=
/// How fragments are classified as axon or dendrite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMethod {
    /// Axon if the fragment holds a larger share of all presynapses than of
    /// all postsynapses
    #[default]
    Prepost,
    /// Dendrite if the fragment holds the root, axon otherwise
    Distance,
}

/// Options for the axon/dendrite split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitOptions {
    /// Linker nodes have at least this fraction of the maximum flow
    pub flow_threshold: f64,
    /// Flow centrality mode
    pub flow_mode: FlowMode,
    /// Fragment classification
    pub split: SplitMethod,
    /// Carve out the cell body fiber
    pub cell_body_fiber: bool,
    /// Reroot to the soma (if set) before analysing
    pub reroot_to_soma: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        SplitOptions {
            flow_threshold: 0.9,
            flow_mode: FlowMode::Sum,
            split: SplitMethod::Prepost,
            cell_body_fiber: true,
            reroot_to_soma: true,
        }
    }
}

/// A skeleton split into compartments.
#[derive(Debug, Clone)]
pub struct CompartmentSplit {
    /// Axon nodes (and those reconnecting them)
    pub axon: Skeleton,
    /// Dendrite nodes (and those reconnecting them)
    pub dendrite: Skeleton,
    /// High-flow nodes between axon and dendrite
    pub linker: Skeleton,
    /// Cell body fiber, if requested and present
    pub cell_body_fiber: Option<Skeleton>,
    /// Segregation index of the axon/dendrite partition
    pub segregation_index: f64,
}

// =#========================================================================#=
// SPLIT
// =#========================================================================#=
impl Skeleton {
    /// Labels every node with its compartment.
    ///
    /// With `reroot_to_soma` set and a soma present, the skeleton is rerooted
    /// to the soma first.
    ///
    /// # Returns
    /// The segregation index of the axon/dendrite partition.
    ///
    /// # Errors
    /// - [SkeletonError::MultipleRoots] unless the skeleton is a single tree
    /// - [SkeletonError::MissingData] without connectors, or if there is no
    ///   flow (e.g. only one synapse type)
    /// - [SkeletonError::Schema] for connectors that are neither pre nor post
    /// - [SkeletonError::Structural] if `flow_threshold` is not in (0, 1]
    pub fn label_compartments(&mut self, options: &SplitOptions) -> Result<f64> {
        if !(options.flow_threshold > 0.0 && options.flow_threshold <= 1.0) {
            return Err(SkeletonError::Structural(format!(
                "flow threshold must be in (0, 1], got {}",
                options.flow_threshold
            )));
        }
        let num_roots = self.n_roots();
        if num_roots != 1 {
            return Err(SkeletonError::MultipleRoots { num_roots });
        }
        // Validate connectors before any rerooting
        self.synapse_counts()?;

        // Working copy; `self` is only replaced on success
        let mut skeleton = self.clone();
        if options.reroot_to_soma {
            if let Some(soma) = skeleton.soma() {
                skeleton.reroot(soma)?;
            }
        }

        let view = skeleton.graph();
        let counts = skeleton.synapse_counts()?;
        let distal = counts.distal(view);
        let flow = flow_centrality(&counts, &distal, options.flow_mode);
        let max_flow = flow.iter().copied().fold(0.0, f64::max);
        if max_flow <= 0.0 {
            return Err(SkeletonError::MissingData(
                "no synapse flow; both pre- and postsynapses are required".to_string(),
            ));
        }
        let is_linker: Vec<bool> = flow
            .iter()
            .map(|f| *f >= max_flow * options.flow_threshold)
            .collect();

        // Fragments left after removing the linker, labelled in pre-order
        let mut fragment_of: Vec<Option<usize>> = vec![None; view.len()];
        let mut fragment_counts: Vec<(u64, u64)> = Vec::new();
        let mut fragment_has_root: Vec<bool> = Vec::new();
        for v in view.pre_order_iter() {
            if is_linker[v] {
                continue;
            }
            let fragment = match view.parent(v).and_then(|p| fragment_of[p]) {
                Some(f) => f,
                None => {
                    fragment_counts.push((0, 0));
                    fragment_has_root.push(view.is_root(v));
                    fragment_counts.len() - 1
                }
            };
            fragment_of[v] = Some(fragment);
            fragment_counts[fragment].0 += counts.pre[v];
            fragment_counts[fragment].1 += counts.post[v];
        }

        let (total_pre, total_post) = (counts.total_pre(), counts.total_post());
        let is_axon: Vec<bool> = fragment_counts
            .iter()
            .zip(&fragment_has_root)
            .map(|((pre, post), has_root)| match options.split {
                SplitMethod::Distance => !has_root,
                SplitMethod::Prepost if pre + post == 0 => !has_root,
                SplitMethod::Prepost => {
                    let pre_share = *pre as f64 / total_pre.max(1) as f64;
                    let post_share = *post as f64 / total_post.max(1) as f64;
                    pre_share > post_share
                }
            })
            .collect();

        let mut labels: Vec<Option<Compartment>> = (0..view.len())
            .map(|v| match fragment_of[v] {
                None => Some(Compartment::Linker),
                Some(f) if is_axon[f] => Some(Compartment::Axon),
                Some(_) => Some(Compartment::Dendrite),
            })
            .collect();

        if options.cell_body_fiber {
            for v in cell_body_fiber(&skeleton, &flow, &distal.pre, &distal.post) {
                if labels[v] == Some(Compartment::Dendrite) {
                    labels[v] = Some(Compartment::CellBodyFiber);
                }
            }
        }

        // Partition of synapses into axon vs dendrite (linker and fiber count as dendrite side)
        let mut partition = [(0u64, 0u64); 2];
        for (v, label) in labels.iter().enumerate() {
            let side = usize::from(*label == Some(Compartment::Axon));
            partition[side].0 += counts.pre[v];
            partition[side].1 += counts.post[v];
        }
        let index = segregation_index(&partition);

        debug!(
            fragments = fragment_counts.len(),
            linker = is_linker.iter().filter(|l| **l).count(),
            max_flow,
            segregation_index = index,
            total_pre,
            total_post,
            "labelled compartments"
        );
        skeleton.set_compartments(labels);
        self.replace_with(skeleton);
        Ok(index)
    }

    /// Splits a copy of the skeleton into compartments.
    ///
    /// Axon and dendrite pieces separated by other compartments are
    /// reconnected through their connected superset, never through linker
    /// nodes. The skeleton itself is not modified.
    ///
    /// # Errors
    /// As [`Skeleton::label_compartments`].
    pub fn split_axon_dendrite(&self, options: &SplitOptions) -> Result<CompartmentSplit> {
        let mut labelled = self.clone();
        let index = labelled.label_compartments(options)?;

        let ids_with = |compartment: Compartment| -> Vec<NodeId> {
            labelled
                .nodes()
                .iter()
                .filter(|n| n.compartment() == Some(compartment))
                .map(Node::id)
                .collect()
        };
        let excluded: HashSet<NodeId> = ids_with(Compartment::Linker)
            .into_iter()
            .chain(ids_with(Compartment::CellBodyFiber))
            .collect();

        let reconnected = |compartment: Compartment| -> Result<Skeleton> {
            let superset: Vec<NodeId> = labelled
                .connected_superset(&ids_with(compartment))?
                .into_iter()
                .filter(|id| !excluded.contains(id))
                .collect();
            let mut part = labelled.clone();
            part.subset(&superset, SubsetOptions::new())?;
            Ok(part)
        };
        let plain = |compartment: Compartment| -> Result<Skeleton> {
            let mut part = labelled.clone();
            part.subset(&ids_with(compartment), SubsetOptions::new())?;
            Ok(part)
        };

        let axon = reconnected(Compartment::Axon)?;
        let dendrite = reconnected(Compartment::Dendrite)?;
        let linker = plain(Compartment::Linker)?;
        let fiber = plain(Compartment::CellBodyFiber)?;
        Ok(CompartmentSplit {
            axon,
            dendrite,
            linker,
            cell_body_fiber: (!fiber.is_empty()).then_some(fiber),
            segregation_index: index,
        })
    }
}

/// Zero-flow path from the root towards the first node where more than one
/// synapse-bearing branch leaves (or flow begins).
fn cell_body_fiber(skeleton: &Skeleton, flow: &[f64], distal_pre: &[u64], distal_post: &[u64]) -> Vec<VertexIndex> {
    let view = skeleton.graph();
    let mut fiber = Vec::new();
    let Some(&root) = view.roots().first() else {
        return fiber;
    };
    let mut v = root;
    loop {
        if flow[v] > 0.0 {
            break;
        }
        let active: Vec<VertexIndex> = view
            .children(v)
            .iter()
            .copied()
            .filter(|c| distal_pre[*c] + distal_post[*c] > 0)
            .collect();
        let [next] = active.as_slice() else { break };
        fiber.push(v);
        v = *next;
    }
    fiber
}
