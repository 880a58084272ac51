//! Tangent-vector point clouds ("dotprops").
//!
//! A [Dotprops] is the point-cloud form of a neuron consumed by similarity
//! scoring: a set of points, each with a unit tangent vector and either a
//! length (from skeleton edges) or an alpha value (from the local point
//! distribution). Downstream code never sees the node/parent structure.

use crate::error::{Result, SkeletonError};
use crate::geometry::{BoundingBox, Point, distance, midpoint, unit_vector};
use crate::model::skeleton::Skeleton;
use rstar::RTree;
use rstar::primitives::GeomWithData;

/// Points with unit tangent vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct Dotprops {
    /// Point positions
    pub points: Vec<Point>,
    /// Unit tangent vector per point
    pub vectors: Vec<Point>,
    /// Edge length per point (only for skeleton-derived dotprops)
    pub lengths: Option<Vec<f64>>,
    /// Linearity of the neighbourhood per point, in [0, 1] (only kNN-derived)
    pub alpha: Option<Vec<f64>>,
    /// Number of neighbours used for the tangent estimate
    pub k: Option<usize>,
    /// Coordinate units
    pub units: Option<String>,
}

impl Dotprops {
    /// Builds dotprops from the edges of a skeleton.
    ///
    /// One point per child→parent edge: the edge midpoint, the unit vector
    /// from parent to child and the edge length. Zero-length edges are
    /// skipped.
    pub fn from_skeleton(skeleton: &Skeleton) -> Self {
        let view = skeleton.graph();
        let nodes = skeleton.nodes();
        let mut points = Vec::with_capacity(view.len());
        let mut vectors = Vec::with_capacity(view.len());
        let mut lengths = Vec::with_capacity(view.len());
        for v in 0..view.len() {
            let Some(p) = view.parent(v) else { continue };
            let child = nodes[v].position();
            let parent = nodes[p].position();
            if let Some(vector) = unit_vector(parent, child) {
                points.push(midpoint(parent, child));
                vectors.push(vector);
                lengths.push(distance(parent, child));
            }
        }
        Dotprops {
            points,
            vectors,
            lengths: Some(lengths),
            alpha: None,
            k: None,
            units: skeleton.units().map(str::to_string),
        }
    }

    /// Builds dotprops from an unordered point cloud.
    ///
    /// For every point the `k` nearest points (including itself) are looked
    /// up in an R*-tree; the tangent is the first principal component of
    /// their covariance and `alpha = (λ1 - λ2) / (λ1 + λ2 + λ3)`.
    ///
    /// # Errors
    /// [SkeletonError::MissingData] if `k < 2` or there are fewer than `k` points.
    pub fn from_points(points: &[Point], k: usize) -> Result<Self> {
        if k < 2 || points.len() < k {
            return Err(SkeletonError::MissingData(format!(
                "need at least k = {k} >= 2 points, got {}",
                points.len()
            )));
        }
        let tree = RTree::bulk_load(
            points
                .iter()
                .enumerate()
                .map(|(i, p)| GeomWithData::new(*p, i))
                .collect(),
        );

        let mut vectors = Vec::with_capacity(points.len());
        let mut alpha = Vec::with_capacity(points.len());
        for p in points {
            let neighbours: Vec<Point> = tree
                .nearest_neighbor_iter(p)
                .take(k)
                .map(|n| *n.geom())
                .collect();
            let (values, vecs) = symmetric_eigen(covariance(&neighbours));
            let sum: f64 = values.iter().sum();
            alpha.push(if sum > 0.0 {
                (values[0] - values[1]) / sum
            } else {
                0.0
            });
            vectors.push(vecs[0]);
        }

        Ok(Dotprops {
            points: points.to_vec(),
            vectors,
            lengths: None,
            alpha: Some(alpha),
            k: Some(k),
            units: None,
        })
    }

    /// Returns the number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if there are no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns the bounding box of the points, or `None` if there are none.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.points.iter())
    }
}

/// Covariance matrix of a point set.
fn covariance(points: &[Point]) -> [[f64; 3]; 3] {
    let n = points.len() as f64;
    let mut mean = [0.0; 3];
    for p in points {
        for d in 0..3 {
            mean[d] += p[d] / n;
        }
    }
    let mut cov = [[0.0; 3]; 3];
    for p in points {
        for i in 0..3 {
            for j in 0..3 {
                cov[i][j] += (p[i] - mean[i]) * (p[j] - mean[j]) / n;
            }
        }
    }
    cov
}

/// Eigen decomposition of a symmetric 3x3 matrix (cyclic Jacobi).
///
/// Returns eigenvalues in descending order and the matching unit
/// eigenvectors.
fn symmetric_eigen(mut a: [[f64; 3]; 3]) -> ([f64; 3], [Point; 3]) {
    let mut v = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
    for _ in 0..50 {
        let off = a[0][1].powi(2) + a[0][2].powi(2) + a[1][2].powi(2);
        if off < 1e-22 {
            break;
        }
        for (p, q) in [(0, 1), (0, 2), (1, 2)] {
            if a[p][q].abs() < 1e-300 {
                continue;
            }
            let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
            let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
            let c = 1.0 / (t * t + 1.0).sqrt();
            let s = t * c;
            // a' = J^T a J
            for k in 0..3 {
                let akp = a[k][p];
                let akq = a[k][q];
                a[k][p] = c * akp - s * akq;
                a[k][q] = s * akp + c * akq;
            }
            for k in 0..3 {
                let apk = a[p][k];
                let aqk = a[q][k];
                a[p][k] = c * apk - s * aqk;
                a[q][k] = s * apk + c * aqk;
            }
            for row in v.iter_mut() {
                let vp = row[p];
                let vq = row[q];
                row[p] = c * vp - s * vq;
                row[q] = s * vp + c * vq;
            }
        }
    }

    let mut order = [0, 1, 2];
    order.sort_by(|i, j| a[*j][*j].total_cmp(&a[*i][*i]));
    let values = order.map(|i| a[i][i]);
    let vectors = order.map(|i| [v[0][i], v[1][i], v[2][i]]);
    (values, vectors)
}
