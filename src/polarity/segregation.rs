//! Segregation index.
//!
//! Measures how cleanly a partition into fragments separates pre- from
//! postsynapses: `1 - S / S_norm`, where `S` is the synapse-weighted mean
//! entropy of the fragments and `S_norm` the entropy of the whole. 0 means
//! every fragment is as mixed as the whole, 1 perfect separation.

use crate::error::{Result, SkeletonError};
use crate::model::skeleton::Skeleton;

/// Entropy (natural log) of a two-class distribution; 0 for empty input.
fn entropy(pre: u64, post: u64) -> f64 {
    let total = (pre + post) as f64;
    if total == 0.0 {
        return 0.0;
    }
    [pre, post]
        .iter()
        .map(|n| *n as f64 / total)
        .filter(|p| *p > 0.0)
        .map(|p| -p * p.ln())
        .sum()
}

/// Segregation index of fragments given as `(pre, post)` counts.
///
/// Returns 0.0 when the whole has no synapses of one of the two types
/// (nothing to segregate), never NaN.
pub fn segregation_index(fragments: &[(u64, u64)]) -> f64 {
    let total_pre: u64 = fragments.iter().map(|f| f.0).sum();
    let total_post: u64 = fragments.iter().map(|f| f.1).sum();
    let s_norm = entropy(total_pre, total_post);
    if s_norm == 0.0 {
        return 0.0;
    }
    let total = (total_pre + total_post) as f64;
    let s: f64 = fragments
        .iter()
        .map(|(pre, post)| (pre + post) as f64 * entropy(*pre, *post))
        .sum::<f64>()
        / total;
    (1.0 - s / s_norm).clamp(0.0, 1.0)
}

impl Skeleton {
    /// Segregation index of a hypothetical cut at every node (node table order).
    ///
    /// Cutting at `v` separates the subtree of `v` from the rest; at the
    /// root this leaves one fragment and the index is 0.
    ///
    /// # Errors
    /// As [`Skeleton::flow_centrality`].
    pub fn arbor_segregation_index(&self) -> Result<Vec<f64>> {
        let num_roots = self.n_roots();
        if num_roots != 1 {
            return Err(SkeletonError::MultipleRoots { num_roots });
        }
        let counts = self.synapse_counts()?;
        let distal = counts.distal(self.graph());
        let (total_pre, total_post) = (counts.total_pre(), counts.total_post());
        Ok(distal
            .pre
            .iter()
            .zip(&distal.post)
            .map(|(&pre, &post)| {
                segregation_index(&[(pre, post), (total_pre - pre, total_post - post)])
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entropy_bounds() {
        assert_eq!(entropy(0, 0), 0.0);
        assert_eq!(entropy(5, 0), 0.0);
        assert!((entropy(3, 3) - std::f64::consts::LN_2).abs() < 1e-12);
    }
}
