//! Pruning: compute a retain set from some metric, then subset.

use crate::edit::subset::SubsetOptions;
use crate::error::{Result, SkeletonError};
use crate::geometry::{Volume, lerp};
use crate::graph::segments::{SegmentWeight, long_segments, segment_length, small_segments};
use crate::graph::strahler::{StrahlerMethod, strahler_index};
use crate::model::node::Node;
use crate::model::skeleton::{ConnectorPolicy, Skeleton};
use tracing::debug;

// =#========================================================================#=
// OPTIONS
// =#========================================================================#=
/// Which Strahler orders [`Skeleton::prune_by_strahler`] removes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrahlerCut {
    /// Remove exactly these orders
    Orders(Vec<u32>),
    /// Remove all orders up to and including this one
    UpTo(u32),
    /// Keep only the given number of highest orders
    KeepHighest(u32),
}

/// Options for [`Skeleton::prune_twigs`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TwigOptions {
    /// Trim exactly `size` off every terminal branch instead of dropping
    /// whole terminal segments
    pub exact: bool,
    /// Simple method only: repeat until no terminal segment is shorter than `size`
    pub recursive: bool,
    /// Upper bound on rounds when `recursive` is set
    pub max_rounds: Option<usize>,
}

/// Side of a volume whose nodes [`Skeleton::prune_by_volume`] keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VolumeSide {
    /// Keep nodes inside the volume
    #[default]
    Inside,
    /// Keep nodes outside the volume
    Outside,
}

// =#========================================================================#=
// PRUNING
// =#========================================================================#=
impl Skeleton {
    /// Removes branches by Strahler order.
    ///
    /// # Arguments
    /// * `cut` - Orders to remove
    /// * `method` - Strahler variant
    /// * `relocate_connectors` - Move connectors of removed nodes to the
    ///   nearest kept ancestor instead of dropping them
    pub fn prune_by_strahler(
        &mut self,
        cut: StrahlerCut,
        method: StrahlerMethod,
        relocate_connectors: bool,
    ) -> Result<()> {
        let mut skeleton = self.lock();
        let orders = strahler_index(skeleton.graph(), method);
        let max_order = orders.iter().copied().max().unwrap_or(0);
        let remove = |order: u32| match &cut {
            StrahlerCut::Orders(orders) => orders.contains(&order),
            StrahlerCut::UpTo(n) => order <= *n,
            StrahlerCut::KeepHighest(n) => order + n <= max_order,
        };
        let mask = orders.iter().map(|o| !remove(*o)).collect();

        let mut options = SubsetOptions::new();
        if relocate_connectors {
            options = options.reattach_connectors();
        }
        debug!(?cut, max_order, "pruning by Strahler order");
        skeleton.subset_indices(mask, options)
    }

    /// Removes terminal twigs shorter than `size`.
    ///
    /// The simple method drops whole terminal segments (leaf up to, not
    /// including, the branch point) shorter than `size`; segments reaching
    /// the root are never dropped. The exact method removes every non-root
    /// node whose farthest distal leaf is closer than `size` and places a
    /// new leaf exactly `size` from the old tip on every partially removed
    /// edge.
    ///
    /// # Errors
    /// [SkeletonError::Structural] if `size` is negative or NaN.
    pub fn prune_twigs(&mut self, size: f64, options: TwigOptions) -> Result<()> {
        if size.is_nan() || size < 0.0 {
            return Err(SkeletonError::Structural(format!(
                "twig size must be a non-negative number, got {size}"
            )));
        }
        let mut skeleton = self.lock();
        if options.exact {
            return skeleton.prune_twigs_exact(size);
        }

        let mut round = 0;
        loop {
            round += 1;
            let removed = skeleton.prune_twigs_simple(size)?;
            debug!(round, removed, "pruned twigs");
            let more_rounds = options.recursive && options.max_rounds.is_none_or(|max| round < max);
            if removed == 0 || !more_rounds {
                return Ok(());
            }
        }
    }

    /// One round of simple twig pruning; returns the number of removed nodes.
    fn prune_twigs_simple(&mut self, size: f64) -> Result<usize> {
        let view = self.graph();
        let mut mask = vec![true; view.len()];
        let mut removed = 0;
        for segment in small_segments(view) {
            let seed = segment[0];
            let Some(&attachment) = segment.last() else { continue };
            if !view.is_leaf(seed) || view.is_root(attachment) {
                continue;
            }
            if segment_length(view, &segment) < size {
                for v in &segment[..segment.len() - 1] {
                    mask[*v] = false;
                    removed += 1;
                }
            }
        }
        if removed > 0 {
            self.subset_indices(mask, SubsetOptions::new())?;
        }
        Ok(removed)
    }

    fn prune_twigs_exact(&mut self, size: f64) -> Result<()> {
        let view = self.graph();

        // Distance from every node to its farthest distal leaf
        let mut reach = vec![0.0f64; view.len()];
        for v in view.post_order_iter() {
            reach[v] = view
                .children(v)
                .iter()
                .map(|c| reach[*c] + view.weight(*c))
                .fold(0.0, f64::max);
        }
        let keep = |v: usize| view.is_root(v) || reach[v] >= size;

        let mut nodes: Vec<Node> = Vec::with_capacity(view.len());
        let mut new_leaves = Vec::new();
        let mut next_id = view.ids().iter().copied().max().map_or(1, |m| m + 1);
        for (v, node) in self.nodes().iter().enumerate() {
            if keep(v) {
                nodes.push(node.clone());
                continue;
            }
            let Some(p) = view.parent(v) else { continue };
            if !keep(p) {
                continue;
            }
            // Edge p→v is cut partially: the new tip sits `size` short of the farthest leaf
            let remaining = view.weight(v) + reach[v] - size;
            if remaining > 0.0 && view.weight(v) > 0.0 {
                let t = remaining / view.weight(v);
                let parent = &self.nodes()[p];
                let radius = match (parent.radius(), node.radius()) {
                    (Some(a), Some(b)) => Some(a + (b - a) * t),
                    _ => None,
                };
                let position = lerp(parent.position(), node.position(), t);
                new_leaves.push(Node::new(next_id, Some(parent.id()), position, radius));
                next_id += 1;
            }
        }
        debug!(
            kept = nodes.len(),
            new_leaves = new_leaves.len(),
            "exact twig pruning"
        );
        nodes.extend(new_leaves);
        self.commit(nodes, ConnectorPolicy::Drop)
    }

    /// Keeps only the `n` longest neurites.
    ///
    /// Neurites are the long segments by cable length: the first runs from
    /// the farthest leaf to the root, each further one from a leaf to where
    /// it joins an earlier one.
    ///
    /// # Arguments
    /// * `n` - Number of neurites to keep (at least 1)
    /// * `reroot_soma` - Reroot to the soma first, if one is set
    ///
    /// # Errors
    /// [SkeletonError::MultipleRoots] unless the skeleton is a single tree,
    /// [SkeletonError::Structural] if `n` is 0.
    pub fn prune_by_longest_neurite(&mut self, n: usize, reroot_soma: bool) -> Result<()> {
        if n == 0 {
            return Err(SkeletonError::Structural(
                "must keep at least one neurite".to_string(),
            ));
        }
        let num_roots = self.n_roots();
        if num_roots != 1 {
            return Err(SkeletonError::MultipleRoots { num_roots });
        }
        let mut skeleton = self.lock();
        if reroot_soma {
            if let Some(soma) = skeleton.soma() {
                skeleton.reroot(soma)?;
            }
        }
        let view = skeleton.graph();
        let mut mask = vec![false; view.len()];
        mask[view.roots()[0]] = true;
        for segment in long_segments(view, SegmentWeight::Length).into_iter().take(n) {
            for v in segment {
                mask[v] = true;
            }
        }
        skeleton.subset_indices(mask, SubsetOptions::new())
    }

    /// Keeps the nodes on one side of a volume.
    ///
    /// # Arguments
    /// * `volume` - Any [Volume]
    /// * `side` - Whether nodes inside or outside are kept
    /// * `prevent_fragments` - Keep the result connected within each tree
    pub fn prune_by_volume<V>(&mut self, volume: &V, side: VolumeSide, prevent_fragments: bool) -> Result<()>
    where
        V: Volume + ?Sized,
    {
        let mut skeleton = self.lock();
        let mask = skeleton
            .nodes()
            .iter()
            .map(|n| volume.contains(n.position()) == (side == VolumeSide::Inside))
            .collect();
        let mut options = SubsetOptions::new();
        options.prevent_fragments = prevent_fragments;
        skeleton.subset_indices(mask, options)
    }
}
