//! Strahler order of skeleton nodes.

use crate::graph::view::GraphView;
use serde::{Deserialize, Serialize};

/// Variant of the Strahler index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrahlerMethod {
    /// Increment only where the highest incoming index occurs on at least two branches
    #[default]
    Standard,
    /// Increment at every branch point
    Greedy,
}

/// Computes the Strahler index of every node (arena order).
///
/// Leaves start at 1. A node with a single child inherits its index. At a
/// branch point the highest incoming index is taken and, for
/// [StrahlerMethod::Standard], incremented if it arrives on two or more
/// branches; [StrahlerMethod::Greedy] always increments.
pub fn strahler_index(view: &GraphView, method: StrahlerMethod) -> Vec<u32> {
    let mut index = vec![1; view.len()];
    for v in view.post_order_iter() {
        let children = view.children(v);
        match children {
            [] => index[v] = 1,
            [only] => index[v] = index[*only],
            _ => {
                let max = children.iter().map(|c| index[*c]).max().unwrap_or(1);
                let num_max = children.iter().filter(|c| index[**c] == max).count();
                index[v] = match method {
                    StrahlerMethod::Greedy => max + 1,
                    StrahlerMethod::Standard if num_max > 1 => max + 1,
                    StrahlerMethod::Standard => max,
                };
            }
        }
    }
    index
}
