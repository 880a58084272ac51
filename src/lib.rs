//! Skeletree is a tree-graph engine for neuron skeletons.
//!
//! A neuron skeleton is a forest (usually a single tree) of 3-D points
//! with synapse annotations ("connectors"). This crate provides the data
//! model and the algorithms operating on it, all sharing one graph
//! abstraction and one set of structural invariants.
//! Core functionality provided:
//! - Model: [Skeleton] with node, connector and tag tables, built from
//!   column tables or programmatically via [SkeletonBuilder]. See
//!   [crate::model] for details.
//! - Queries: node classification, small/long segments, geodesic
//!   distance matrices, distal/proximal relations, Strahler order.
//!   See [crate::graph].
//! - Editing: reroot, cut, subset, insert/remove nodes, pruning (by
//!   Strahler order, twig length, longest neurite, volume), rewiring from
//!   an undirected graph, merging duplicate nodes. See [crate::edit].
//! - Healing: reconnecting fragments via a minimum spanning tree over
//!   nearest-neighbour candidates, stitching independent skeletons.
//!   See [crate::heal].
//! - Polarity: synapse flow centrality, segregation index, axon/dendrite
//!   split. See [crate::polarity].
//! - Batch processing over collections, optionally in parallel.
//!   See [crate::batch].
//!
//! Invariants (unique ids, existing parents, no cycles, types matching the
//! topology, connectors and tags on existing nodes) hold after every public
//! operation. Mutations are atomic: an operation returning an error leaves
//! the skeleton unchanged.
//!
//! Limitations:
//! - No file formats; tables come from the caller
//! - No rendering, mesh processing or similarity scoring
//!
//! # Usage patterns
//! Build a skeleton and query it:
//! ```
//! use skeletree::{SkeletonBuilder, NodeType};
//!
//! let mut builder = SkeletonBuilder::new();
//! let root = builder.add_root([0.0, 0.0, 0.0]);
//! let branch = builder.add_child(root, [1.0, 0.0, 0.0]);
//! let a = builder.add_child(branch, [2.0, 1.0, 0.0]);
//! let b = builder.add_child(branch, [2.0, -1.0, 0.0]);
//! let skeleton = builder.build().unwrap();
//!
//! assert_eq!(skeleton.node_type_of(branch).unwrap(), NodeType::Branch);
//! assert_eq!(skeleton.n_leafs(), 2);
//! assert!(skeleton.distal_to(a, root).unwrap());
//! assert!(!skeleton.distal_to(a, b).unwrap());
//! ```
//!
//! ## Example Editing
//!
//! ```
//! use skeletree::{SkeletonBuilder, HealOptions};
//!
//! let mut builder = SkeletonBuilder::new();
//! let root = builder.add_root([0.0, 0.0, 0.0]);
//! let mid = builder.add_child(root, [1.0, 0.0, 0.0]);
//! builder.add_child(mid, [2.0, 0.0, 0.0]);
//! let skeleton = builder.build().unwrap();
//!
//! // Cut into distal and proximal fragment ...
//! let (distal, proximal) = skeleton.cut_at(mid).unwrap();
//! assert_eq!(distal.n_nodes(), 2);
//! assert_eq!(proximal.n_nodes(), 2);
//!
//! // ... and stitch them back together
//! let (healed, report) = skeletree::stitch_skeletons(vec![distal, proximal], &HealOptions::new()).unwrap();
//! assert!(healed.is_tree());
//! assert_eq!(report.edges_added.len(), 1);
//! ```

pub mod batch;
pub mod config;
pub mod edit;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod heal;
pub mod model;
pub mod polarity;

pub use crate::config::{Config, ProcessingContext};
pub use crate::error::{ConfigError, Result, SkeletonError};
pub use crate::heal::{HealMethod, HealOptions, HealReport, OnDisconnected, stitch_skeletons};
pub use crate::model::{
    Compartment, Connector, ConnectorKind, ConnectorPolicy, Dotprops, MeshNeuron, Neuron, Node,
    NodeId, NodeTable, NodeType, Skeleton, SkeletonBuilder, Tags,
};

use crate::model::table::ConnectorTable;

// ============================================================================
// Quick API
// ============================================================================
/// Creates a skeleton from a node table and an optional connector table.
///
/// See [`Skeleton::from_table`] for the validation performed.
pub fn skeleton_from_tables(
    nodes: &NodeTable,
    connectors: Option<&ConnectorTable>,
) -> Result<Skeleton> {
    let skeleton = Skeleton::from_table(nodes)?;
    match connectors {
        Some(table) => skeleton.with_connector_table(table),
        None => Ok(skeleton),
    }
}

/// Heals every skeleton of a collection with the same options.
///
/// See [`Skeleton::heal`] and [`batch::map_skeletons`].
pub fn heal_all(
    skeletons: Vec<Skeleton>,
    options: &HealOptions,
    context: &ProcessingContext,
) -> Result<batch::BatchOutcome<Skeleton>> {
    batch::map_skeletons(skeletons, context, |mut skeleton| {
        skeleton.heal(options)?;
        Ok(skeleton)
    })
}
