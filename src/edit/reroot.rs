//! Rerooting.

use crate::error::{Result, SkeletonError};
use crate::graph::VertexIndex;
use crate::model::node::NodeId;
use crate::model::skeleton::{ConnectorPolicy, Skeleton};
use tracing::debug;

impl Skeleton {
    /// Makes `new_root` the root of its tree.
    ///
    /// Reverses the parent links along the path from `new_root` to the old
    /// root; all other links stay. Other trees of the skeleton are not
    /// touched. No-op if `new_root` already is a root.
    ///
    /// # Errors
    /// [SkeletonError::NotFound] if `new_root` does not exist.
    pub fn reroot(&mut self, new_root: NodeId) -> Result<()> {
        let mut skeleton = self.lock();
        let view = skeleton.graph();
        let v = view.require(new_root)?;
        if view.is_root(v) {
            return Ok(());
        }

        let chain: Vec<VertexIndex> = view.ancestors(v).collect();
        let mut nodes = skeleton.nodes().to_vec();
        nodes[v].set_parent(None);
        for pair in chain.windows(2) {
            nodes[pair[1]].set_parent(Some(view.id(pair[0])));
        }
        debug!(new_root, path_len = chain.len(), "rerooting");
        skeleton.commit(nodes, ConnectorPolicy::Drop)
    }

    /// Reroots to the single node carrying `tag`.
    ///
    /// # Errors
    /// [SkeletonError::NotFound] if the tag does not exist or does not
    /// resolve to exactly one node.
    pub fn reroot_to_tag(&mut self, tag: &str) -> Result<()> {
        let ids = self.tags().get(tag).ok_or_else(|| SkeletonError::tag_not_found(tag))?;
        let id = match ids {
            [id] => *id,
            _ => {
                return Err(SkeletonError::NotFound(format!(
                    "tag \"{tag}\" resolves to {} nodes, expected exactly one",
                    ids.len()
                )));
            }
        };
        self.reroot(id)
    }
}
