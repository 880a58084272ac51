//! The skeleton: a neuron represented as a forest of 3-D points.
//!
//! Provides [Skeleton], which owns the node table (single source of truth),
//! the connector table and the tags, plus lazily built caches derived from
//! the node table: the [GraphView] and the small segments. Every mutation
//! goes through [`Skeleton::commit`], which validates the new table before
//! swapping it in, so a failing operation leaves the skeleton untouched.
//!
//! Mutating operations live in [crate::edit], [crate::heal] and
//! [crate::polarity]; this module holds construction, accessors and the
//! read-only queries.

use crate::error::{Result, SkeletonError};
use crate::geometry::{BoundingBox, Point};
use crate::graph::geodesic::{self, GeodesicMatrix, GeodesicOptions};
use crate::graph::segments::{self, SegmentWeight};
use crate::graph::strahler::{StrahlerMethod, strahler_index};
use crate::graph::{GraphView, VertexIndex, classify};
use crate::model::connector::Connector;
use crate::model::node::{Compartment, Node, NodeId, NodeType};
use crate::model::table::{ConnectorTable, NodeTable, Table};
use crate::model::tags::Tags;
use ndarray::Array2;
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use std::ops::{Deref, DerefMut};
use tracing::debug;

// =#========================================================================#=
// CONNECTOR POLICY
// =#========================================================================#=
/// What happens to connectors whose node is removed by a mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectorPolicy {
    /// Drop them
    #[default]
    Drop,
    /// Move them to their nearest surviving ancestor (dropped if there is none)
    Reattach,
}

// =$========================================================================$=
// SKELETON
// =$========================================================================$=
/// A neuron skeleton: rooted trees of 3-D points with synapse annotations.
///
/// # Structure
/// - `nodes` is the authoritative node table; ids are unique, every parent
///   exists, there are no cycles. These invariants hold after every public
///   operation.
/// - Usually a single tree; several roots are legal (e.g. before
///   [healing](Skeleton::heal)) but rejected by operations that need one tree.
/// - Node types are re-derived whenever the topology changes.
/// - Caches are exclusively owned; cloning a skeleton clones its caches.
#[derive(Debug, Default)]
pub struct Skeleton {
    /// Optional name, e.g. for logging
    name: Option<String>,
    /// Physical units of the coordinates, e.g. "nm"
    units: Option<String>,
    /// Soma node, if known
    soma: Option<NodeId>,

    /// Node table (single source of truth)
    nodes: Vec<Node>,
    /// Connector table; every connector references an existing node
    connectors: Vec<Connector>,
    /// Tags; every tagged id references an existing node
    tags: Tags,

    /// Derived graph; empty until first access after a mutation
    graph: OnceCell<GraphView>,
    /// Derived small segments (as node ids)
    small_segments: OnceCell<Vec<Vec<NodeId>>>,

    /// Depth of nested [MutationGuard]s
    lock_depth: usize,
    /// Node types are stale and must be re-derived when the last guard drops
    needs_classification: bool,
}

impl Clone for Skeleton {
    /// Clones tables and caches; the clone is never locked.
    ///
    /// A clone taken under a lock has its deferred node types derived here.
    fn clone(&self) -> Self {
        let mut copy = Skeleton {
            name: self.name.clone(),
            units: self.units.clone(),
            soma: self.soma,
            nodes: self.nodes.clone(),
            connectors: self.connectors.clone(),
            tags: self.tags.clone(),
            graph: self.graph.clone(),
            small_segments: self.small_segments.clone(),
            lock_depth: 0,
            needs_classification: self.needs_classification,
        };
        if copy.needs_classification {
            copy.classify_nodes();
        }
        copy
    }
}

// ============================================================================
// Construction (pub)
// ============================================================================
impl Skeleton {
    /// Creates an empty skeleton.
    pub fn new() -> Self {
        Skeleton::default()
    }

    /// Creates a skeleton from node records.
    ///
    /// # Errors
    /// [SkeletonError::Structural] if ids are not unique, a parent does not
    /// exist, or the parent links contain a cycle.
    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self> {
        let mut skeleton = Skeleton::new();
        skeleton.set_nodes(nodes)?;
        Ok(skeleton)
    }

    /// Creates a skeleton from a node table.
    ///
    /// # Errors
    /// [SkeletonError::Schema] for missing or malformed columns, otherwise
    /// as [`Skeleton::from_nodes`].
    pub fn from_table(table: &NodeTable) -> Result<Self> {
        Self::from_nodes(table.to_nodes()?)
    }

    /// Attaches a name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attaches coordinate units.
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    /// Attaches connectors, see [`Skeleton::set_connectors`].
    pub fn with_connectors(mut self, connectors: Vec<Connector>) -> Result<Self> {
        self.set_connectors(connectors)?;
        Ok(self)
    }

    /// Attaches connectors from a connector table.
    pub fn with_connector_table(self, table: &ConnectorTable) -> Result<Self> {
        let connectors = table.to_connectors()?;
        self.with_connectors(connectors)
    }

    /// Sets the soma node, see [`Skeleton::set_soma`].
    pub fn with_soma(mut self, soma: NodeId) -> Result<Self> {
        self.set_soma(Some(soma))?;
        Ok(self)
    }

    /// Attaches tags; every tagged node must exist.
    pub fn with_tags(mut self, tags: Tags) -> Result<Self> {
        for (_, ids) in tags.iter() {
            for id in ids {
                self.require(*id)?;
            }
        }
        self.tags = tags;
        Ok(self)
    }
}

// ============================================================================
// Setters (pub)
// ============================================================================
impl Skeleton {
    /// Replaces the node table.
    ///
    /// Connectors and tags referencing nodes that no longer exist are
    /// dropped; the soma is unset if it disappears.
    pub fn set_nodes(&mut self, nodes: Vec<Node>) -> Result<()> {
        self.commit(nodes, ConnectorPolicy::Drop)
    }

    /// Replaces the node table from a column table.
    pub fn set_node_table(&mut self, table: &NodeTable) -> Result<()> {
        self.set_nodes(table.to_nodes()?)
    }

    /// Replaces the connector table.
    ///
    /// # Errors
    /// [SkeletonError::NotFound] if a connector references a missing node.
    pub fn set_connectors(&mut self, connectors: Vec<Connector>) -> Result<()> {
        for connector in &connectors {
            if !self.contains(connector.node_id) {
                return Err(SkeletonError::NotFound(format!(
                    "connector {} references node {} which does not exist",
                    connector.connector_id, connector.node_id
                )));
            }
        }
        self.connectors = connectors;
        Ok(())
    }

    /// Sets (or clears) the soma node.
    pub fn set_soma(&mut self, soma: Option<NodeId>) -> Result<()> {
        if let Some(id) = soma {
            self.require(id)?;
        }
        self.soma = soma;
        Ok(())
    }

    /// Tags node `id` with `label`.
    pub fn add_tag(&mut self, label: impl Into<String>, id: NodeId) -> Result<()> {
        self.require(id)?;
        self.tags.add(label, id);
        Ok(())
    }

    /// Moves a node; edge lengths (and thus the graph view) change.
    pub fn set_position(&mut self, id: NodeId, position: Point) -> Result<()> {
        let i = self.require(id)?;
        self.nodes[i].set_position(position);
        self.invalidate_caches();
        Ok(())
    }

    /// Sets the radius of a node (`None` or negative for unknown).
    pub fn set_radius(&mut self, id: NodeId, radius: Option<f64>) -> Result<()> {
        let i = self.require(id)?;
        self.nodes[i].set_radius(radius);
        Ok(())
    }

    /// Sets the name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }
}

// ============================================================================
// Getters / Accessors (pub)
// ============================================================================
impl Skeleton {
    /// Returns the name, if set.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the coordinate units, if set.
    pub fn units(&self) -> Option<&str> {
        self.units.as_deref()
    }

    /// Returns the soma node, if set.
    pub fn soma(&self) -> Option<NodeId> {
        self.soma
    }

    /// Returns the node table.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns the connector table.
    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    /// Returns `true` if connectors are present.
    pub fn has_connectors(&self) -> bool {
        !self.connectors.is_empty()
    }

    /// Returns the presynapses.
    pub fn presynapses(&self) -> impl Iterator<Item = &Connector> {
        self.connectors.iter().filter(|c| c.kind.is_pre())
    }

    /// Returns the postsynapses.
    pub fn postsynapses(&self) -> impl Iterator<Item = &Connector> {
        self.connectors.iter().filter(|c| c.kind.is_post())
    }

    /// Returns the tags.
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Returns the node with the given id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.graph().index_of(id).map(|i| &self.nodes[i])
    }

    /// Returns `true` if a node with this id exists.
    pub fn contains(&self, id: NodeId) -> bool {
        self.graph().index_of(id).is_some()
    }

    /// Returns the type of node `id`.
    pub fn node_type_of(&self, id: NodeId) -> Result<NodeType> {
        let i = self.require(id)?;
        Ok(self.nodes[i].node_type())
    }

    /// Returns the number of nodes.
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if there are no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the graph view, building it if necessary.
    pub fn graph(&self) -> &GraphView {
        self.graph
            .get_or_init(|| GraphView::build_unchecked(&self.nodes))
    }

    /// Returns the root ids in node table order.
    pub fn roots(&self) -> Vec<NodeId> {
        let view = self.graph();
        view.roots().iter().map(|r| view.id(*r)).collect()
    }

    /// Returns the number of roots (= number of trees).
    pub fn n_roots(&self) -> usize {
        self.graph().roots().len()
    }

    /// Returns `true` if the skeleton is exactly one tree.
    pub fn is_tree(&self) -> bool {
        self.n_roots() == 1
    }

    /// Returns the single root.
    ///
    /// # Errors
    /// [SkeletonError::MultipleRoots] if there is not exactly one root.
    pub fn root(&self) -> Result<NodeId> {
        match self.roots().as_slice() {
            [root] => Ok(*root),
            roots => Err(SkeletonError::MultipleRoots {
                num_roots: roots.len(),
            }),
        }
    }

    /// Returns the ids of leaf nodes (type end).
    pub fn leafs(&self) -> Vec<NodeId> {
        let view = self.graph();
        view.leaves().into_iter().map(|v| view.id(v)).collect()
    }

    /// Returns the ids of branch points (type branch).
    pub fn branch_points(&self) -> Vec<NodeId> {
        let view = self.graph();
        view.branch_points().into_iter().map(|v| view.id(v)).collect()
    }

    /// Returns the number of leaf nodes.
    pub fn n_leafs(&self) -> usize {
        self.graph().leaves().len()
    }

    /// Returns the number of branch points.
    pub fn n_branches(&self) -> usize {
        self.graph().branch_points().len()
    }

    /// Returns the total cable length (sum of all edge lengths).
    pub fn cable_length(&self) -> f64 {
        self.graph().total_weight()
    }

    /// Returns the bounding box of all nodes, or `None` if there are none.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.nodes.iter().map(Node::position))
    }

    /// Returns the compartment label of every node (node table order).
    pub fn compartments(&self) -> Vec<Option<Compartment>> {
        self.nodes.iter().map(Node::compartment).collect()
    }

    /// Returns the node table as columns.
    pub fn node_table(&self) -> NodeTable {
        Table::from_nodes(&self.nodes)
    }

    /// Returns the connector table as columns.
    pub fn connector_table(&self) -> ConnectorTable {
        Table::from_connectors(&self.connectors)
    }

    /// Checks every structural invariant.
    ///
    /// # Errors
    /// [SkeletonError::Structural] for broken parent links or stale node
    /// types, [SkeletonError::NotFound] for dangling connectors or tags.
    pub fn validate(&self) -> Result<()> {
        let view = GraphView::build(&self.nodes)?;
        let types = classify(&view);
        for (node, expected) in self.nodes.iter().zip(types) {
            if node.node_type() != expected {
                return Err(SkeletonError::Structural(format!(
                    "node {} is typed {} but topology says {expected}",
                    node.id(),
                    node.node_type()
                )));
            }
        }
        for connector in &self.connectors {
            view.require(connector.node_id)?;
        }
        for (_, ids) in self.tags.iter() {
            view.require_all(ids)?;
        }
        if let Some(soma) = self.soma {
            view.require(soma)?;
        }
        Ok(())
    }
}

// ============================================================================
// Queries (pub)
// ============================================================================
impl Skeleton {
    /// Returns the small segments as node ids, see [segments::small_segments].
    pub fn small_segments(&self) -> &[Vec<NodeId>] {
        self.small_segments.get_or_init(|| {
            let view = self.graph();
            debug!(nodes = view.len(), "building small segments");
            segments::small_segments(view)
                .into_iter()
                .map(|s| s.into_iter().map(|v| view.id(v)).collect())
                .collect()
        })
    }

    /// Returns the long segments as node ids, see [segments::long_segments].
    pub fn long_segments(&self, weight: SegmentWeight) -> Vec<Vec<NodeId>> {
        let view = self.graph();
        segments::long_segments(view, weight)
            .into_iter()
            .map(|s| s.into_iter().map(|v| view.id(v)).collect())
            .collect()
    }

    /// Returns the cable length of a known-valid segment (no validation;
    /// unknown ids contribute nothing).
    pub fn segment_length(&self, segment: &[NodeId]) -> f64 {
        let view = self.graph();
        let indices: Vec<VertexIndex> = segment.iter().filter_map(|id| view.index_of(*id)).collect();
        segments::segment_length(view, &indices)
    }

    /// Computes geodesic distances between nodes.
    ///
    /// # Arguments
    /// * `sources` - Row nodes, `None` for all nodes
    /// * `targets` - Column nodes, `None` for all nodes
    /// * `options` - Direction, weighting and limit
    ///
    /// # Errors
    /// [SkeletonError::NotFound] if a source or target does not exist.
    pub fn geodesic_matrix(
        &self,
        sources: Option<&[NodeId]>,
        targets: Option<&[NodeId]>,
        options: &GeodesicOptions,
    ) -> Result<GeodesicMatrix> {
        let view = self.graph();
        let sources = sources.map_or_else(|| view.ids().to_vec(), <[NodeId]>::to_vec);
        let targets = targets.map_or_else(|| view.ids().to_vec(), <[NodeId]>::to_vec);
        let source_idx = view.require_all(&sources)?;
        let target_idx = view.require_all(&targets)?;
        let distances = geodesic::geodesic_matrix(view, &source_idx, &target_idx, options);
        Ok(GeodesicMatrix {
            sources,
            targets,
            distances,
        })
    }

    /// Returns `true` if `b` lies on the path from `a` to the root
    /// (`a` is distal to `b`). Every node is distal to itself.
    pub fn distal_to(&self, a: NodeId, b: NodeId) -> Result<bool> {
        let view = self.graph();
        Ok(geodesic::distal_to(view, view.require(a)?, view.require(b)?))
    }

    /// Evaluates [`Skeleton::distal_to`] for all pairs of `a` (rows) and `b` (columns).
    pub fn distal_matrix(&self, a: &[NodeId], b: &[NodeId]) -> Result<Array2<bool>> {
        let view = self.graph();
        Ok(geodesic::distal_matrix(
            view,
            &view.require_all(a)?,
            &view.require_all(b)?,
        ))
    }

    /// Returns the path length from every node to its root (node table order).
    pub fn dist_to_root(&self) -> Vec<f64> {
        geodesic::dist_to_root(self.graph())
    }

    /// Returns the undirected geodesic distance between two nodes
    /// (infinite if they are in different trees).
    pub fn dist_between(&self, a: NodeId, b: NodeId) -> Result<f64> {
        let view = self.graph();
        Ok(geodesic::dist_between(view, view.require(a)?, view.require(b)?))
    }

    /// Returns the node ids on the path from `a` to `b`, or `None` if they
    /// are in different trees.
    pub fn path(&self, a: NodeId, b: NodeId) -> Result<Option<Vec<NodeId>>> {
        let view = self.graph();
        let path = geodesic::path(view, view.require(a)?, view.require(b)?);
        Ok(path.map(|p| p.into_iter().map(|v| view.id(v)).collect()))
    }

    /// Returns the Strahler index of every node (node table order).
    pub fn strahler_index(&self, method: StrahlerMethod) -> Vec<u32> {
        strahler_index(self.graph(), method)
    }
}

// =$========================================================================$=
// MUTATION PROTOCOL
// =$========================================================================$=
/// Scoped lock over a chain of mutations.
///
/// Acquired at the top of every mutating operation. While at least one
/// guard is alive, re-deriving node types is deferred; when the outermost
/// guard drops (on success and error paths alike) the types are brought
/// up to date. Graph caches are invalidated immediately by every commit.
pub struct MutationGuard<'a> {
    skeleton: &'a mut Skeleton,
}

impl Deref for MutationGuard<'_> {
    type Target = Skeleton;

    fn deref(&self) -> &Skeleton {
        self.skeleton
    }
}

impl DerefMut for MutationGuard<'_> {
    fn deref_mut(&mut self) -> &mut Skeleton {
        self.skeleton
    }
}

impl Drop for MutationGuard<'_> {
    fn drop(&mut self) {
        self.skeleton.lock_depth -= 1;
        if self.skeleton.lock_depth == 0 && self.skeleton.needs_classification {
            self.skeleton.classify_nodes();
        }
    }
}

impl Skeleton {
    /// Acquires a [MutationGuard].
    pub fn lock(&mut self) -> MutationGuard<'_> {
        self.lock_depth += 1;
        MutationGuard { skeleton: self }
    }

    /// Returns `true` while a chain of mutations is in progress.
    pub fn is_locked(&self) -> bool {
        self.lock_depth > 0
    }

    /// Returns the arena index of `id`.
    pub(crate) fn require(&self, id: NodeId) -> Result<VertexIndex> {
        self.graph().require(id)
    }

    /// Swaps in a new node table after validating it.
    ///
    /// Connectors on removed nodes are handled per `policy`, tags on removed
    /// nodes are dropped, and a removed soma is unset. On error nothing changes.
    pub(crate) fn commit(&mut self, nodes: Vec<Node>, policy: ConnectorPolicy) -> Result<()> {
        let view = GraphView::build(&nodes)?;

        let surviving: HashSet<NodeId> = nodes.iter().map(Node::id).collect();
        let mut connectors = Vec::with_capacity(self.connectors.len());
        for connector in &self.connectors {
            if surviving.contains(&connector.node_id) {
                connectors.push(connector.clone());
            } else if policy == ConnectorPolicy::Reattach {
                if let Some(anchor) = self.surviving_ancestor(connector.node_id, &surviving) {
                    let mut moved = connector.clone();
                    moved.node_id = anchor;
                    connectors.push(moved);
                }
            }
        }

        let num_removed = self.nodes.len().saturating_sub(nodes.len());
        debug!(
            skeleton = self.name.as_deref().unwrap_or(""),
            nodes = nodes.len(),
            removed = num_removed,
            connectors = connectors.len(),
            "committing node table"
        );

        self.tags.retain_nodes(&surviving);
        if self.soma.is_some_and(|s| !surviving.contains(&s)) {
            self.soma = None;
        }
        self.connectors = connectors;
        self.nodes = nodes;
        self.invalidate_caches();
        let _ = self.graph.set(view);

        self.needs_classification = true;
        if self.lock_depth == 0 {
            self.classify_nodes();
        }
        Ok(())
    }

    /// Nearest ancestor (in the current table) of `id` contained in `surviving`.
    fn surviving_ancestor(&self, id: NodeId, surviving: &HashSet<NodeId>) -> Option<NodeId> {
        let view = self.graph();
        let start = view.index_of(id)?;
        view.ancestors(start)
            .map(|v| view.id(v))
            .find(|a| surviving.contains(a))
    }

    /// Drops all derived caches.
    pub(crate) fn invalidate_caches(&mut self) {
        self.graph = OnceCell::new();
        self.small_segments = OnceCell::new();
    }

    /// Re-derives the node types from the current graph.
    fn classify_nodes(&mut self) {
        let types = classify(self.graph());
        for (node, node_type) in self.nodes.iter_mut().zip(types) {
            node.set_node_type(node_type);
        }
        self.needs_classification = false;
    }

    /// Writes compartment labels (node table order); not a topology change.
    pub(crate) fn set_compartments(&mut self, labels: Vec<Option<Compartment>>) {
        for (node, label) in self.nodes.iter_mut().zip(labels) {
            node.set_compartment(label);
        }
    }

    /// Mutable access to the connectors for internal bookkeeping.
    pub(crate) fn connectors_mut(&mut self) -> &mut Vec<Connector> {
        &mut self.connectors
    }

    /// Mutable access to the tags for internal bookkeeping.
    pub(crate) fn tags_mut(&mut self) -> &mut Tags {
        &mut self.tags
    }

    /// Sets the soma without validation.
    pub(crate) fn set_soma_unchecked(&mut self, soma: Option<NodeId>) {
        self.soma = soma;
    }

    /// Swaps in a skeleton prepared on a working copy, keeping the lock state.
    pub(crate) fn replace_with(&mut self, other: Skeleton) {
        let lock_depth = self.lock_depth;
        *self = other;
        self.lock_depth = lock_depth;
        self.needs_classification = true;
        if lock_depth == 0 {
            self.classify_nodes();
        }
    }
}
