//! Node records of a skeleton's node table.

use crate::geometry::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a node, unique within one skeleton.
pub type NodeId = i64;

/// Parent id sentinel marking a root node.
pub const NO_PARENT: NodeId = -1;

// =#========================================================================#=
// NODE TYPE
// =#========================================================================#=
/// Topological role of a node, derived from the current topology.
///
/// - **Root**: has no parent (takes precedence over all others)
/// - **End**: has no children
/// - **Branch**: has more than one child
/// - **Slab**: exactly one child
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// Node without parent
    Root,
    /// Node with more than one child
    Branch,
    /// Node with exactly one child
    Slab,
    /// Node without children (leaf)
    End,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            NodeType::Root => "root",
            NodeType::Branch => "branch",
            NodeType::Slab => "slab",
            NodeType::End => "end",
        };
        write!(f, "{s}")
    }
}

// =#========================================================================#=
// COMPARTMENT
// =#========================================================================#=
/// Compartment label written by the axon/dendrite split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compartment {
    /// Output compartment
    Axon,
    /// Input compartment
    Dendrite,
    /// High-flow region connecting axon and dendrite (primary neurite)
    Linker,
    /// Flow-free fiber between soma and the first branch point carrying flow
    CellBodyFiber,
}

impl fmt::Display for Compartment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Compartment::Axon => "axon",
            Compartment::Dendrite => "dendrite",
            Compartment::Linker => "linker",
            Compartment::CellBodyFiber => "cellbodyfiber",
        };
        write!(f, "{s}")
    }
}

// =#========================================================================#=
// NODE
// =#========================================================================#=
/// A single record of the node table.
///
/// # Invariants
/// - `parent` is [NO_PARENT] for roots, otherwise the id of an existing node
///   of the same skeleton (checked by the skeleton, not the node)
/// - `radius` is `None` when unknown; negative input radii are read as unknown
/// - `node_type` is maintained by the owning skeleton and only ever reflects
///   the topology of the last committed node table
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    parent: NodeId,
    position: Point,
    radius: Option<f64>,
    node_type: NodeType,
    compartment: Option<Compartment>,
}

impl Node {
    /// Creates a new node.
    ///
    /// # Arguments
    /// * `id` - Node id (non-negative)
    /// * `parent` - Parent id, or `None` for a root
    /// * `position` - Coordinates
    /// * `radius` - Radius, or `None`/negative if unknown
    pub fn new(id: NodeId, parent: Option<NodeId>, position: Point, radius: Option<f64>) -> Self {
        Node {
            id,
            parent: parent.unwrap_or(NO_PARENT),
            position,
            radius: radius.filter(|r| *r >= 0.0),
            node_type: if parent.is_none() {
                NodeType::Root
            } else {
                NodeType::End
            },
            compartment: None,
        }
    }

    /// Returns the id of this node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the parent id, or `None` if this node is a root.
    pub fn parent(&self) -> Option<NodeId> {
        if self.parent < 0 { None } else { Some(self.parent) }
    }

    /// Returns the raw parent id, [NO_PARENT] for roots.
    pub fn parent_id(&self) -> NodeId {
        if self.parent < 0 { NO_PARENT } else { self.parent }
    }

    /// Returns `true` if this node has no parent.
    pub fn is_root(&self) -> bool {
        self.parent < 0
    }

    /// Returns the position of this node.
    pub fn position(&self) -> &Point {
        &self.position
    }

    /// Returns the radius, or `None` if unknown.
    pub fn radius(&self) -> Option<f64> {
        self.radius
    }

    /// Returns the topological role of this node.
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    /// Returns the compartment label, if a split has been computed.
    pub fn compartment(&self) -> Option<Compartment> {
        self.compartment
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent.unwrap_or(NO_PARENT);
    }

    pub(crate) fn set_id(&mut self, id: NodeId) {
        self.id = id;
    }

    pub(crate) fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub(crate) fn set_radius(&mut self, radius: Option<f64>) {
        self.radius = radius.filter(|r| *r >= 0.0);
    }

    pub(crate) fn set_node_type(&mut self, node_type: NodeType) {
        self.node_type = node_type;
    }

    pub(crate) fn set_compartment(&mut self, compartment: Option<Compartment>) {
        self.compartment = compartment;
    }
}
