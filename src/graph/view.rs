//! Derived graph representation of a skeleton's node table.
//!
//! Provides [GraphView], an arena over the node table where every node is
//! addressed by its [VertexIndex] (its row in the node table), parents and
//! children are stored as indices, and every child→parent edge carries its
//! Euclidean length as weight. Also provides traversal iterators and the
//! export to [petgraph] graphs.

use crate::error::{Result, SkeletonError};
use crate::geometry::distance;
use crate::model::node::{Node, NodeId};
use petgraph::graph::DiGraph;
use std::collections::HashMap;

/// Index of a node in the arena (its row in the node table).
pub type VertexIndex = usize;

// =$========================================================================$=
// GRAPH VIEW
// =$========================================================================$=
/// Child→parent graph over the nodes of one skeleton.
///
/// Built from the node table and cached by the skeleton until the next
/// mutation. Never authoritative: the node table is.
///
/// # Structure
/// - Arena order equals node table order.
/// - `weights[v]` is the distance between `v` and its parent (0 for roots).
/// - `roots` are listed in node table order.
#[derive(Debug, Clone)]
pub struct GraphView {
    ids: Vec<NodeId>,
    index: HashMap<NodeId, VertexIndex>,
    parents: Vec<Option<VertexIndex>>,
    children: Vec<Vec<VertexIndex>>,
    weights: Vec<f64>,
    roots: Vec<VertexIndex>,
}

// ============================================================================
// Construction (pub(crate))
// ============================================================================
impl GraphView {
    /// Builds the view and checks all tree invariants.
    ///
    /// # Errors
    /// [SkeletonError::Structural] on negative or duplicate node ids, parents
    /// that do not exist, or cycles.
    pub(crate) fn build(nodes: &[Node]) -> Result<Self> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if node.id() < 0 {
                return Err(SkeletonError::Structural(format!(
                    "node id {} is negative",
                    node.id()
                )));
            }
            if index.insert(node.id(), i).is_some() {
                return Err(SkeletonError::Structural(format!(
                    "duplicate node id {}",
                    node.id()
                )));
            }
        }
        for node in nodes {
            if let Some(parent) = node.parent() {
                if !index.contains_key(&parent) {
                    return Err(SkeletonError::Structural(format!(
                        "node {} references parent {parent} which does not exist",
                        node.id()
                    )));
                }
            }
        }

        let view = Self::assemble(nodes, index);

        // Every node must be reachable from a root, otherwise it sits on a cycle
        let reached = view.pre_order_iter().count();
        if reached != view.len() {
            let mut seen = vec![false; view.len()];
            for v in view.pre_order_iter() {
                seen[v] = true;
            }
            let culprit = seen.iter().position(|s| !s).unwrap_or(0);
            return Err(SkeletonError::cycle(view.ids[culprit]));
        }

        Ok(view)
    }

    /// Builds the view from a table known to be valid.
    ///
    /// Duplicate ids resolve to their last occurrence and missing parents
    /// are treated as roots; never fails.
    pub(crate) fn build_unchecked(nodes: &[Node]) -> Self {
        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id(), i))
            .collect();
        Self::assemble(nodes, index)
    }

    fn assemble(nodes: &[Node], index: HashMap<NodeId, VertexIndex>) -> Self {
        let n = nodes.len();
        let mut parents = vec![None; n];
        let mut children = vec![Vec::new(); n];
        let mut weights = vec![0.0; n];
        let mut roots = Vec::new();

        for (i, node) in nodes.iter().enumerate() {
            match node.parent().and_then(|p| index.get(&p).copied()) {
                Some(p) => {
                    parents[i] = Some(p);
                    children[p].push(i);
                    weights[i] = distance(node.position(), nodes[p].position());
                }
                None => roots.push(i),
            }
        }

        GraphView {
            ids: nodes.iter().map(Node::id).collect(),
            index,
            parents,
            children,
            weights,
            roots,
        }
    }
}

// ============================================================================
// Getters / Accessors (pub)
// ============================================================================
impl GraphView {
    /// Returns the number of nodes.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if there are no nodes.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns the node id at arena index `v`.
    ///
    /// # Panics
    /// Panics if `v` is out of bounds.
    pub fn id(&self, v: VertexIndex) -> NodeId {
        self.ids[v]
    }

    /// Returns all node ids in arena order.
    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    /// Returns the arena index of node `id`, if it exists.
    pub fn index_of(&self, id: NodeId) -> Option<VertexIndex> {
        self.index.get(&id).copied()
    }

    /// Returns the arena index of node `id`.
    ///
    /// # Errors
    /// [SkeletonError::NotFound] if there is no such node.
    pub fn require(&self, id: NodeId) -> Result<VertexIndex> {
        self.index_of(id)
            .ok_or_else(|| SkeletonError::node_not_found(id))
    }

    /// Returns the arena indices of all `ids`, failing on the first unknown id.
    pub fn require_all(&self, ids: &[NodeId]) -> Result<Vec<VertexIndex>> {
        ids.iter().map(|id| self.require(*id)).collect()
    }

    /// Returns the parent of `v`, or `None` for roots.
    pub fn parent(&self, v: VertexIndex) -> Option<VertexIndex> {
        self.parents[v]
    }

    /// Returns the children of `v`.
    pub fn children(&self, v: VertexIndex) -> &[VertexIndex] {
        &self.children[v]
    }

    /// Returns the length of the edge from `v` to its parent (0 for roots).
    pub fn weight(&self, v: VertexIndex) -> f64 {
        self.weights[v]
    }

    /// Returns the root indices in node table order.
    pub fn roots(&self) -> &[VertexIndex] {
        &self.roots
    }

    /// Returns `true` if `v` has no parent.
    pub fn is_root(&self, v: VertexIndex) -> bool {
        self.parents[v].is_none()
    }

    /// Returns `true` if `v` has no children.
    pub fn is_leaf(&self, v: VertexIndex) -> bool {
        self.children[v].is_empty()
    }

    /// Returns `true` if `v` has more than one child.
    pub fn is_branch(&self, v: VertexIndex) -> bool {
        self.children[v].len() > 1
    }

    /// Returns the non-root leaves in arena order.
    pub fn leaves(&self) -> Vec<VertexIndex> {
        (0..self.len())
            .filter(|&v| self.is_leaf(v) && !self.is_root(v))
            .collect()
    }

    /// Returns the non-root branch points in arena order.
    pub fn branch_points(&self) -> Vec<VertexIndex> {
        (0..self.len())
            .filter(|&v| self.is_branch(v) && !self.is_root(v))
            .collect()
    }

    /// Returns the sum of all edge weights.
    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Returns the root of the tree containing `v`.
    pub fn root_of(&self, v: VertexIndex) -> VertexIndex {
        self.ancestors(v).last().unwrap_or(v)
    }

    /// For every node, the index of the root of its tree.
    pub fn component_roots(&self) -> Vec<VertexIndex> {
        let mut component = vec![0; self.len()];
        for v in self.pre_order_iter() {
            component[v] = match self.parents[v] {
                Some(p) => component[p],
                None => v,
            };
        }
        component
    }

    /// Returns the number of nodes per tree, keyed by root index.
    pub fn component_sizes(&self) -> HashMap<VertexIndex, usize> {
        let mut sizes = HashMap::with_capacity(self.roots.len());
        for root in self.component_roots() {
            *sizes.entry(root).or_insert(0) += 1;
        }
        sizes
    }

    /// Returns all nodes of the subtree rooted at `v` (including `v`), in pre-order.
    pub fn subtree(&self, v: VertexIndex) -> Vec<VertexIndex> {
        let mut nodes = Vec::new();
        let mut stack = vec![v];
        while let Some(u) = stack.pop() {
            nodes.push(u);
            stack.extend(self.children[u].iter().rev());
        }
        nodes
    }

    /// Number of edges between each node and its root.
    pub fn depths(&self) -> Vec<usize> {
        let mut depth = vec![0; self.len()];
        for v in self.pre_order_iter() {
            if let Some(p) = self.parents[v] {
                depth[v] = depth[p] + 1;
            }
        }
        depth
    }

    /// Exports the view as a directed petgraph with child→parent edges.
    ///
    /// Node weights are node ids and `NodeIndex::new(v)` corresponds to arena index `v`.
    pub fn to_petgraph(&self) -> DiGraph<NodeId, f64> {
        let mut graph = DiGraph::with_capacity(self.len(), self.len());
        for id in &self.ids {
            graph.add_node(*id);
        }
        for (v, parent) in self.parents.iter().enumerate() {
            if let Some(p) = parent {
                graph.add_edge(
                    petgraph::graph::NodeIndex::new(v),
                    petgraph::graph::NodeIndex::new(*p),
                    self.weights[v],
                );
            }
        }
        graph
    }
}

// =$========================================================================$=
// ITERATORS
// =$========================================================================$=
impl GraphView {
    /// Returns an iterator over all trees in post-order (children before parents).
    ///
    /// Trees are visited in root order; useful for aggregating from leaves upward.
    pub fn post_order_iter(&self) -> PostOrderIter<'_> {
        PostOrderIter::new(self)
    }

    /// Returns an iterator over all trees in pre-order (parents before children).
    ///
    /// Useful for propagating data from roots to leaves.
    pub fn pre_order_iter(&self) -> PreOrderIter<'_> {
        PreOrderIter::new(self)
    }

    /// Returns an iterator walking from `v` (inclusive) to its root (inclusive).
    pub fn ancestors(&self, v: VertexIndex) -> AncestorIter<'_> {
        AncestorIter {
            view: self,
            next: Some(v),
        }
    }
}

/// Iterator for post-order traversal (children before parents).
///
/// Stack-based, so deep unbranched neurites do not overflow the call stack.
pub struct PostOrderIter<'a> {
    view: &'a GraphView,
    stack: Vec<(VertexIndex, bool)>, // (index, children_visited)
}

impl<'a> PostOrderIter<'a> {
    fn new(view: &'a GraphView) -> Self {
        let stack = view.roots.iter().rev().map(|r| (*r, false)).collect();
        PostOrderIter { view, stack }
    }
}

impl Iterator for PostOrderIter<'_> {
    type Item = VertexIndex;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((v, children_visited)) = self.stack.pop() {
            if children_visited || self.view.is_leaf(v) {
                return Some(v);
            }
            self.stack.push((v, true));
            // Reverse so that the first child is processed first
            for child in self.view.children[v].iter().rev() {
                self.stack.push((*child, false));
            }
        }
        None
    }
}

/// Iterator for pre-order traversal (parents before children).
pub struct PreOrderIter<'a> {
    view: &'a GraphView,
    stack: Vec<VertexIndex>,
}

impl<'a> PreOrderIter<'a> {
    fn new(view: &'a GraphView) -> Self {
        let stack = view.roots.iter().rev().copied().collect();
        PreOrderIter { view, stack }
    }
}

impl Iterator for PreOrderIter<'_> {
    type Item = VertexIndex;

    fn next(&mut self) -> Option<Self::Item> {
        let v = self.stack.pop()?;
        self.stack.extend(self.view.children[v].iter().rev());
        Some(v)
    }
}

/// Iterator from a node towards its root.
pub struct AncestorIter<'a> {
    view: &'a GraphView,
    next: Option<VertexIndex>,
}

impl Iterator for AncestorIter<'_> {
    type Item = VertexIndex;

    fn next(&mut self) -> Option<Self::Item> {
        let v = self.next?;
        self.next = self.view.parents[v];
        Some(v)
    }
}
