//! Programmatic construction of skeletons.

use crate::error::Result;
use crate::geometry::Point;
use crate::model::connector::{Connector, ConnectorId, ConnectorKind};
use crate::model::node::{Node, NodeId};
use crate::model::skeleton::Skeleton;
use crate::model::tags::Tags;

/// Incremental builder for a [Skeleton].
///
/// Nodes are collected as-is; all invariants (unique ids, existing
/// parents, no cycles, connectors on existing nodes) are checked once by
/// [`SkeletonBuilder::build`].
///
/// # Example
/// ```
/// use skeletree::SkeletonBuilder;
///
/// let mut builder = SkeletonBuilder::new();
/// let root = builder.add_root([0.0, 0.0, 0.0]);
/// let tip = builder.add_child(root, [1.0, 0.0, 0.0]);
/// builder.add_connector(tip, "pre");
/// let skeleton = builder.build().unwrap();
/// assert_eq!(skeleton.n_nodes(), 2);
/// assert_eq!(skeleton.cable_length(), 1.0);
/// ```
#[derive(Debug, Default)]
pub struct SkeletonBuilder {
    nodes: Vec<Node>,
    connectors: Vec<Connector>,
    tags: Tags,
    soma: Option<NodeId>,
    name: Option<String>,
    units: Option<String>,
    next_id: NodeId,
    next_connector_id: ConnectorId,
}

impl SkeletonBuilder {
    /// Creates an empty builder; generated node ids start at 1.
    pub fn new() -> Self {
        Self {
            next_id: 1,
            next_connector_id: 1,
            ..Default::default()
        }
    }

    /// Creates an empty builder with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut builder = Self::new();
        builder.nodes.reserve(capacity);
        builder
    }

    /// Sets the name of the skeleton.
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the coordinate units of the skeleton.
    pub fn units(&mut self, units: impl Into<String>) -> &mut Self {
        self.units = Some(units.into());
        self
    }

    /// Marks `id` as the soma.
    pub fn soma(&mut self, id: NodeId) -> &mut Self {
        self.soma = Some(id);
        self
    }

    /// Adds a root at `position` with a generated id.
    pub fn add_root(&mut self, position: Point) -> NodeId {
        let id = self.next_id;
        self.add_node(id, None, position, None);
        id
    }

    /// Adds a child of `parent` at `position` with a generated id.
    pub fn add_child(&mut self, parent: NodeId, position: Point) -> NodeId {
        let id = self.next_id;
        self.add_node(id, Some(parent), position, None);
        id
    }

    /// Adds a node with an explicit id, parent and radius.
    ///
    /// Generated ids continue above the largest id seen so far.
    pub fn add_node(
        &mut self,
        id: NodeId,
        parent: Option<NodeId>,
        position: Point,
        radius: Option<f64>,
    ) -> &mut Self {
        self.nodes.push(Node::new(id, parent, position, radius));
        self.next_id = self.next_id.max(id + 1);
        self
    }

    /// Adds a connector at the position of node `node_id` with a generated id.
    ///
    /// The connector is placed at the origin if the node has not been added
    /// yet; [`SkeletonBuilder::build`] rejects connectors on unknown nodes.
    pub fn add_connector(&mut self, node_id: NodeId, kind: impl Into<ConnectorKind>) -> ConnectorId {
        let position = self
            .nodes
            .iter()
            .rev()
            .find(|n| n.id() == node_id)
            .map_or([0.0; 3], |n| *n.position());
        let connector_id = self.next_connector_id;
        self.next_connector_id += 1;
        self.connectors
            .push(Connector::new(connector_id, node_id, position, kind));
        connector_id
    }

    /// Tags node `id` with `label`.
    pub fn add_tag(&mut self, label: impl Into<String>, id: NodeId) -> &mut Self {
        self.tags.add(label, id);
        self
    }

    /// Returns the number of nodes added so far.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Validates the collected data and creates the skeleton.
    ///
    /// # Errors
    /// [Structural](crate::SkeletonError::Structural) for broken parent
    /// links, [NotFound](crate::SkeletonError::NotFound) for connectors,
    /// tags or soma referencing unknown nodes.
    pub fn build(self) -> Result<Skeleton> {
        let mut skeleton = Skeleton::from_nodes(self.nodes)?
            .with_connectors(self.connectors)?
            .with_tags(self.tags)?;
        if let Some(soma) = self.soma {
            skeleton = skeleton.with_soma(soma)?;
        }
        if let Some(name) = self.name {
            skeleton = skeleton.with_name(name);
        }
        if let Some(units) = self.units {
            skeleton = skeleton.with_units(units);
        }
        Ok(skeleton)
    }
}
