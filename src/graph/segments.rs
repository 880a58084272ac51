//! Decomposition of a skeleton into linear segments.
//!
//! * [small_segments] - runs between branch points, leaves and roots; the
//!   atomic unit of pruning and most per-edge algorithms
//! * [long_segments] - maximal child→parent walks, always following the
//!   branch that reaches farthest from the root
//!
//! All segments are ordered child→parent: the first entry is the distal
//! seed, the last entry the node the segment attaches to.

use crate::graph::geodesic::dist_to_root;
use crate::graph::view::{GraphView, VertexIndex};
use serde::{Deserialize, Serialize};

/// A segment as arena indices, ordered child→parent.
pub type Segment = Vec<VertexIndex>;

/// Distance measure used to rank long segments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentWeight {
    /// Physical cable length (sum of Euclidean edge lengths)
    #[default]
    Length,
    /// Number of edges
    Nodes,
}

/// Breaks the skeleton at every branch point and leaf.
///
/// Each segment starts at a seed (a leaf or a non-root branch point) and
/// walks towards the root up to and including the next branch point or
/// root. Every edge belongs to exactly one segment. Seeds are taken in
/// arena order. A tree without edges yields no segments.
pub fn small_segments(view: &GraphView) -> Vec<Segment> {
    let mut segments = Vec::new();
    for seed in 0..view.len() {
        if view.is_root(seed) || !(view.is_leaf(seed) || view.is_branch(seed)) {
            continue;
        }
        let mut segment = vec![seed];
        let mut current = seed;
        while let Some(parent) = view.parent(current) {
            segment.push(parent);
            if view.is_root(parent) || view.is_branch(parent) {
                break;
            }
            current = parent;
        }
        segments.push(segment);
    }
    segments
}

/// Groups edges into the longest possible child→parent walks.
///
/// Leaves are processed by descending distance to their root (ties in
/// arena order); each walk stops at the root or at the first node already
/// covered by an earlier walk (that node is included as attachment point).
/// The result is sorted by descending segment length in the given measure.
pub fn long_segments(view: &GraphView, weight: SegmentWeight) -> Vec<Segment> {
    let dists = match weight {
        SegmentWeight::Length => dist_to_root(view),
        SegmentWeight::Nodes => view.depths().into_iter().map(|d| d as f64).collect(),
    };

    let mut leaves = view.leaves();
    leaves.sort_by(|a, b| dists[*b].total_cmp(&dists[*a]));

    let mut seen = vec![false; view.len()];
    let mut segments: Vec<(f64, Segment)> = Vec::with_capacity(leaves.len());
    for leaf in leaves {
        let mut segment = Vec::new();
        for v in view.ancestors(leaf) {
            segment.push(v);
            if seen[v] {
                break;
            }
            seen[v] = true;
        }
        let first = segment[0];
        let last = segment[segment.len() - 1];
        segments.push((dists[first] - dists[last], segment));
    }

    // Stable sort keeps processing order for equal lengths
    segments.sort_by(|a, b| b.0.total_cmp(&a.0));
    segments.into_iter().map(|(_, s)| s).collect()
}

/// Sums the edge weights along a segment.
///
/// Fast path without validation: `segment` must be a child→parent walk,
/// as returned by [small_segments] or [long_segments].
pub fn segment_length(view: &GraphView, segment: &[VertexIndex]) -> f64 {
    match segment.split_last() {
        Some((_, edges)) => edges.iter().map(|v| view.weight(*v)).sum(),
        None => 0.0,
    }
}
