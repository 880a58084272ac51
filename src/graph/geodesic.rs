//! Geodesic (along-the-arbor) distances and distal/proximal relations.
//!
//! * [geodesic_matrix] - Dijkstra from each source over a petgraph copy of
//!   the view, directed (child→parent only) or undirected
//! * [distal_to] / [distal_matrix] - "is `b` on the path from `a` to the root"
//! * [dist_to_root], [dist_between], [path] - single-tree helpers
//!
//! Unreachable pairs are reported as `f64::INFINITY`, never as errors.

use crate::graph::view::{GraphView, VertexIndex};
use crate::model::node::NodeId;
use ndarray::Array2;
use petgraph::algo::dijkstra;
use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::{Directed, EdgeType, Undirected};
use serde::{Deserialize, Serialize};

// =#========================================================================#=
// OPTIONS
// =#========================================================================#=
/// Edge weighting for distance computations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeWeight {
    /// Euclidean edge length
    #[default]
    Length,
    /// Every edge counts 1 (hop count)
    Unweighted,
}

/// Options for [geodesic_matrix].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GeodesicOptions {
    /// Only follow edges child→parent (distance towards the root)
    pub directed: bool,
    /// Edge weighting
    pub weight: EdgeWeight,
    /// Distances above this limit are reported as infinite
    pub limit: Option<f64>,
}

impl GeodesicOptions {
    /// Undirected, length-weighted, unlimited.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts paths to the child→parent direction.
    pub fn directed(mut self) -> Self {
        self.directed = true;
        self
    }

    /// Counts hops instead of cable length.
    pub fn unweighted(mut self) -> Self {
        self.weight = EdgeWeight::Unweighted;
        self
    }

    /// Sets a distance limit.
    pub fn with_limit(mut self, limit: f64) -> Self {
        self.limit = Some(limit);
        self
    }
}

// =#========================================================================#=
// GEODESIC MATRIX
// =#========================================================================#=
/// Distances between a list of sources (rows) and targets (columns).
#[derive(Debug, Clone, PartialEq)]
pub struct GeodesicMatrix {
    /// Row labels
    pub sources: Vec<NodeId>,
    /// Column labels
    pub targets: Vec<NodeId>,
    /// `distances[[i, j]]` is the distance from `sources[i]` to `targets[j]`
    pub distances: Array2<f64>,
}

impl GeodesicMatrix {
    /// Returns the distance between two node ids, or `None` if either is
    /// not part of this matrix.
    pub fn get(&self, source: NodeId, target: NodeId) -> Option<f64> {
        let i = self.sources.iter().position(|s| *s == source)?;
        let j = self.targets.iter().position(|t| *t == target)?;
        Some(self.distances[[i, j]])
    }
}

/// Computes geodesic distances from every source to every target.
///
/// Runs one Dijkstra per source. In directed mode a target is reachable
/// only if it lies on the path from the source to its root.
pub fn geodesic_matrix(
    view: &GraphView,
    sources: &[VertexIndex],
    targets: &[VertexIndex],
    options: &GeodesicOptions,
) -> Array2<f64> {
    if options.directed {
        let graph: Graph<NodeId, f64, Directed> = weighted_graph(view, options.weight);
        fill_matrix(&graph, sources, targets, options.limit)
    } else {
        let graph: Graph<NodeId, f64, Undirected> = weighted_graph(view, options.weight);
        fill_matrix(&graph, sources, targets, options.limit)
    }
}

/// Copies the view into a petgraph graph with child→parent edges.
///
/// `NodeIndex::new(v)` corresponds to arena index `v`.
fn weighted_graph<Ty: EdgeType>(view: &GraphView, weight: EdgeWeight) -> Graph<NodeId, f64, Ty> {
    let mut graph = Graph::with_capacity(view.len(), view.len());
    for id in view.ids() {
        graph.add_node(*id);
    }
    for v in 0..view.len() {
        if let Some(p) = view.parent(v) {
            let w = match weight {
                EdgeWeight::Length => view.weight(v),
                EdgeWeight::Unweighted => 1.0,
            };
            graph.add_edge(NodeIndex::new(v), NodeIndex::new(p), w);
        }
    }
    graph
}

fn fill_matrix<Ty: EdgeType>(
    graph: &Graph<NodeId, f64, Ty>,
    sources: &[VertexIndex],
    targets: &[VertexIndex],
    limit: Option<f64>,
) -> Array2<f64> {
    let mut matrix = Array2::from_elem((sources.len(), targets.len()), f64::INFINITY);
    for (i, source) in sources.iter().enumerate() {
        let costs = dijkstra(graph, NodeIndex::new(*source), None, |e| *e.weight());
        for (j, target) in targets.iter().enumerate() {
            if let Some(d) = costs.get(&NodeIndex::new(*target)) {
                if limit.is_none_or(|l| *d <= l) {
                    matrix[[i, j]] = *d;
                }
            }
        }
    }
    matrix
}

// =#========================================================================#=
// DISTAL / PROXIMAL
// =#========================================================================#=
/// Returns `true` if `b` lies on the path from `a` to its root.
///
/// A node is always distal to itself. Nodes on separate branches are
/// neither distal nor proximal to one another.
pub fn distal_to(view: &GraphView, a: VertexIndex, b: VertexIndex) -> bool {
    view.ancestors(a).any(|v| v == b)
}

/// Evaluates [distal_to] for every pair: `result[[i, j]] == distal_to(a[i], b[j])`.
pub fn distal_matrix(view: &GraphView, a: &[VertexIndex], b: &[VertexIndex]) -> Array2<bool> {
    let mut matrix = Array2::from_elem((a.len(), b.len()), false);
    let mut on_path = vec![false; view.len()];
    for (i, source) in a.iter().enumerate() {
        for v in view.ancestors(*source) {
            on_path[v] = true;
        }
        for (j, target) in b.iter().enumerate() {
            matrix[[i, j]] = on_path[*target];
        }
        for v in view.ancestors(*source) {
            on_path[v] = false;
        }
    }
    matrix
}

// =#========================================================================#=
// SINGLE-TREE HELPERS
// =#========================================================================#=
/// Path length from every node to its root (arena order).
pub fn dist_to_root(view: &GraphView) -> Vec<f64> {
    let mut dists = vec![0.0; view.len()];
    for v in view.pre_order_iter() {
        if let Some(p) = view.parent(v) {
            dists[v] = dists[p] + view.weight(v);
        }
    }
    dists
}

/// Returns the lowest common ancestor of `a` and `b`, or `None` if they
/// are in different trees.
pub fn lowest_common_ancestor(view: &GraphView, a: VertexIndex, b: VertexIndex) -> Option<VertexIndex> {
    let mut on_path = vec![false; view.len()];
    for v in view.ancestors(a) {
        on_path[v] = true;
    }
    view.ancestors(b).find(|v| on_path[*v])
}

/// Undirected geodesic distance between `a` and `b` (infinite across trees).
pub fn dist_between(view: &GraphView, a: VertexIndex, b: VertexIndex) -> f64 {
    match lowest_common_ancestor(view, a, b) {
        Some(lca) => {
            let up = |from: VertexIndex| -> f64 {
                view.ancestors(from)
                    .take_while(|v| *v != lca)
                    .map(|v| view.weight(v))
                    .sum()
            };
            up(a) + up(b)
        }
        None => f64::INFINITY,
    }
}

/// Node sequence from `a` to `b` through their lowest common ancestor.
pub fn path(view: &GraphView, a: VertexIndex, b: VertexIndex) -> Option<Vec<VertexIndex>> {
    let lca = lowest_common_ancestor(view, a, b)?;
    let mut forward: Vec<_> = view.ancestors(a).take_while(|v| *v != lca).collect();
    forward.push(lca);
    let backward: Vec<_> = view.ancestors(b).take_while(|v| *v != lca).collect();
    forward.extend(backward.into_iter().rev());
    Some(forward)
}
