//! Reconnecting fragments into a single tree.
//!
//! # Algorithm
//! 1. Split the skeleton into its trees (one per root).
//! 2. Per tree, index the candidate nodes (all nodes, or only leaves and
//!    roots) in an R*-tree.
//! 3. For every pair of trees, find the closest pair of candidate nodes;
//!    these form the edges of a small quotient graph with one vertex per
//!    tree.
//! 4. Kruskal's algorithm (via [UnionFind]) selects a minimum spanning tree
//!    of the quotient graph, skipping edges longer than `max_dist`.
//! 5. The selected edges are added to the undirected node graph, which is
//!    handed to [`Skeleton::rewire`].
//!
//! [stitch_skeletons] merges independent skeletons (remapping colliding
//! node ids) and heals the result.

mod stitch;

pub use stitch::stitch_skeletons;

use crate::error::{Result, SkeletonError};
use crate::geometry::{Point, distance};
use crate::graph::VertexIndex;
use crate::model::node::NodeId;
use crate::model::skeleton::Skeleton;
use petgraph::unionfind::UnionFind;
use rstar::RTree;
use rstar::primitives::GeomWithData;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

// =#========================================================================#=
// OPTIONS
// =#========================================================================#=
/// Which nodes are considered as endpoints of new edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealMethod {
    /// Every node
    All,
    /// Only leaves and roots (much cheaper, usually sufficient)
    #[default]
    LeafsRoots,
}

/// What to do if fragments remain after healing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnDisconnected {
    /// Fail with [SkeletonError::DisconnectedResult], leaving the skeleton unchanged
    #[default]
    Error,
    /// Keep all fragments
    Keep,
    /// Keep only the largest fragment
    Drop,
}

/// Options for [`Skeleton::heal`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealOptions {
    /// Candidate endpoints of new edges
    pub method: HealMethod,
    /// New edges longer than this are not added
    pub max_dist: Option<f64>,
    /// Fragments with fewer nodes are not stitched
    pub min_size: Option<usize>,
    /// Handling of fragments that remain
    pub on_disconnected: OnDisconnected,
}

impl HealOptions {
    /// Leaf/root candidates, no distance limit, fail if fragments remain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the candidate method.
    pub fn method(mut self, method: HealMethod) -> Self {
        self.method = method;
        self
    }

    /// Sets the maximum length of new edges.
    pub fn max_dist(mut self, max_dist: f64) -> Self {
        self.max_dist = Some(max_dist);
        self
    }

    /// Sets the minimum fragment size.
    pub fn min_size(mut self, min_size: usize) -> Self {
        self.min_size = Some(min_size);
        self
    }

    /// Sets the handling of remaining fragments.
    pub fn on_disconnected(mut self, on_disconnected: OnDisconnected) -> Self {
        self.on_disconnected = on_disconnected;
        self
    }
}

/// Summary of a heal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HealReport {
    /// Number of trees before healing
    pub fragments_before: usize,
    /// Number of trees after healing
    pub fragments_after: usize,
    /// New edges as `(node, node, length)`
    pub edges_added: Vec<(NodeId, NodeId, f64)>,
    /// Nodes discarded with dropped fragments
    pub nodes_dropped: usize,
}

// =#========================================================================#=
// HEALING
// =#========================================================================#=
/// Closest pair of candidate nodes between two fragments.
#[derive(Debug, Clone, Copy)]
struct QuotientEdge {
    fragment_a: usize,
    fragment_b: usize,
    node_a: VertexIndex,
    node_b: VertexIndex,
    dist: f64,
}

type IndexedNode = GeomWithData<Point, VertexIndex>;

impl Skeleton {
    /// Reconnects all trees of the skeleton into one.
    ///
    /// New edges are chosen to minimise their total length. If the skeleton
    /// has a soma, the tree holding it keeps its root; otherwise the first
    /// root in table order does.
    ///
    /// # Errors
    /// [SkeletonError::DisconnectedResult] if fragments remain (because of
    /// `max_dist` or `min_size`) and `on_disconnected` is
    /// [OnDisconnected::Error]; the skeleton is then unchanged.
    pub fn heal(&mut self, options: &HealOptions) -> Result<HealReport> {
        let mut skeleton = self.lock();
        let view = skeleton.graph();
        let positions: Vec<Point> = skeleton.nodes().iter().map(|n| *n.position()).collect();

        // One fragment per root, in root order
        let component = view.component_roots();
        let root_rank: HashMap<VertexIndex, usize> =
            view.roots().iter().enumerate().map(|(i, r)| (*r, i)).collect();
        let mut fragments: Vec<Vec<VertexIndex>> = vec![Vec::new(); view.roots().len()];
        for (v, root) in component.iter().enumerate() {
            if let Some(rank) = root_rank.get(root) {
                fragments[*rank].push(v);
            }
        }
        let mut report = HealReport {
            fragments_before: fragments.len(),
            fragments_after: fragments.len(),
            ..Default::default()
        };
        if fragments.len() <= 1 {
            return Ok(report);
        }

        let min_size = options.min_size.unwrap_or(0);
        let eligible: Vec<usize> = (0..fragments.len())
            .filter(|f| fragments[*f].len() >= min_size)
            .collect();
        let trees: Vec<RTree<IndexedNode>> = eligible
            .iter()
            .map(|f| {
                let candidates: Vec<IndexedNode> = fragments[*f]
                    .iter()
                    .filter(|v| match options.method {
                        HealMethod::All => true,
                        HealMethod::LeafsRoots => view.is_leaf(**v) || view.is_root(**v),
                    })
                    .map(|v| GeomWithData::new(positions[*v], *v))
                    .collect();
                RTree::bulk_load(candidates)
            })
            .collect();

        let mut quotient = Vec::new();
        for i in 0..eligible.len() {
            for j in i + 1..eligible.len() {
                if let Some(edge) = closest_pair(eligible[i], &trees[i], eligible[j], &trees[j]) {
                    quotient.push(edge);
                }
            }
        }
        quotient.sort_by(|x, y| x.dist.total_cmp(&y.dist));

        // Kruskal over the quotient graph
        let mut union = UnionFind::<usize>::new(fragments.len());
        let mut selected = Vec::new();
        for edge in quotient {
            if options.max_dist.is_some_and(|max| edge.dist > max) {
                break;
            }
            if union.union(edge.fragment_a, edge.fragment_b) {
                selected.push(edge);
            }
        }

        let mut merged: HashMap<usize, Vec<usize>> = HashMap::new();
        for f in 0..fragments.len() {
            merged.entry(union.find(f)).or_default().push(f);
        }
        report.fragments_after = merged.len();
        report.edges_added = selected
            .iter()
            .map(|e| (view.id(e.node_a), view.id(e.node_b), e.dist))
            .collect();

        let mut graph = skeleton.to_undirected();
        for edge in &selected {
            graph.add_edge(view.id(edge.node_a), view.id(edge.node_b), edge.dist);
        }

        if merged.len() > 1 {
            match options.on_disconnected {
                OnDisconnected::Error => {
                    return Err(SkeletonError::DisconnectedResult {
                        num_fragments: merged.len(),
                    });
                }
                OnDisconnected::Keep => {
                    warn!(fragments = merged.len(), "healing left disconnected fragments");
                }
                OnDisconnected::Drop => {
                    let size = |group: &Vec<usize>| -> usize {
                        group.iter().map(|f| fragments[*f].len()).sum()
                    };
                    // Largest group; ties go to the group holding the earliest root
                    let keep = merged
                        .values()
                        .max_by(|x, y| size(x).cmp(&size(y)).then(y[0].cmp(&x[0])))
                        .map(|group| union.find(group[0]));
                    for (f, members) in fragments.iter().enumerate() {
                        if Some(union.find(f)) != keep {
                            for v in members {
                                graph.remove_node(view.id(*v));
                                report.nodes_dropped += 1;
                            }
                        }
                    }
                    report.fragments_after = 1;
                    warn!(
                        dropped = report.nodes_dropped,
                        "dropped nodes of fragments that could not be healed"
                    );
                }
            }
        }

        let root = skeleton
            .soma()
            .and_then(|soma| view.index_of(soma))
            .map(|v| view.id(view.root_of(v)))
            .filter(|id| graph.contains_node(*id));
        debug!(
            before = report.fragments_before,
            after = report.fragments_after,
            edges = report.edges_added.len(),
            "healing skeleton"
        );
        skeleton.rewire(&graph, root)?;
        Ok(report)
    }
}

/// Closest candidate pair between two fragments, or `None` if either has
/// no candidates. Queries from the smaller index into the larger one.
fn closest_pair(
    a: usize,
    tree_a: &RTree<IndexedNode>,
    b: usize,
    tree_b: &RTree<IndexedNode>,
) -> Option<QuotientEdge> {
    let (query, target, flipped) = if tree_a.size() <= tree_b.size() {
        (tree_a, tree_b, false)
    } else {
        (tree_b, tree_a, true)
    };
    let mut best: Option<(f64, VertexIndex, VertexIndex)> = None;
    for node in query.iter() {
        if let Some(nearest) = target.nearest_neighbor(node.geom()) {
            let dist = distance(node.geom(), nearest.geom());
            if best.is_none_or(|(d, _, _)| dist < d) {
                best = Some((dist, node.data, nearest.data));
            }
        }
    }
    best.map(|(dist, from_query, from_target)| {
        let (node_a, node_b) = if flipped {
            (from_target, from_query)
        } else {
            (from_query, from_target)
        };
        QuotientEdge {
            fragment_a: a,
            fragment_b: b,
            node_a,
            node_b,
            dist,
        }
    })
}
