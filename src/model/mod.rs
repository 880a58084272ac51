//! Data model of a neuron skeleton.
//!
//! The [Skeleton] owns three tables: nodes ([Node]), connectors
//! ([Connector]) and [Tags]. The node table is the single source of truth;
//! the [GraphView](crate::graph::GraphView) and node types are caches
//! derived from it.
//!
//! Nodes are stored in an arena: internally they are addressed by their row
//! ([VertexIndex](crate::graph::VertexIndex)), never by references, which
//! keeps every mutation a plain rebuild of a `Vec<Node>`.
//!
//! Other neuron kinds ([MeshNeuron], [Dotprops]) share capabilities through
//! the [Neuron] sum type.

/// Programmatic construction of skeletons
pub mod builder;
/// Synapse annotations
pub mod connector;
/// Tangent-vector point clouds
pub mod dotprops;
/// Neuron sum type and mesh neurons
pub mod neuron;
/// Node records, node types and compartments
pub mod node;
/// The skeleton with its caches and mutation guard
pub mod skeleton;
/// Column tables and schema resolution
pub mod table;
/// Node tags
pub mod tags;

pub use builder::SkeletonBuilder;
pub use connector::{Connector, ConnectorId, ConnectorKind};
pub use dotprops::Dotprops;
pub use neuron::{MeshNeuron, Neuron};
pub use node::{Compartment, NO_PARENT, Node, NodeId, NodeType};
pub use skeleton::{ConnectorPolicy, MutationGuard, Skeleton};
pub use table::{Column, ConnectorTable, NodeTable, Table};
pub use tags::Tags;
