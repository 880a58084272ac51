//! Node tags of a skeleton.
//!
//! Provides the [Tags] struct, mapping label strings (e.g. "soma",
//! "ends") to the ids of the nodes carrying them.

use crate::model::node::NodeId;
use std::collections::{BTreeMap, HashMap, HashSet};

// =#========================================================================#=
// TAGS
// =#========================================================================#=
/// Mapping from tag label to tagged node ids.
///
/// Labels are kept in sorted order; node ids keep insertion order and are
/// deduplicated on insert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tags {
    tags: BTreeMap<String, Vec<NodeId>>,
}

impl Tags {
    /// Creates an empty tag map.
    pub fn new() -> Self {
        Tags::default()
    }

    /// Tags node `id` with `label`.
    pub fn add(&mut self, label: impl Into<String>, id: NodeId) {
        let ids = self.tags.entry(label.into()).or_default();
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    /// Returns the nodes tagged with `label`, or `None` if the tag does not exist.
    pub fn get(&self, label: &str) -> Option<&[NodeId]> {
        self.tags.get(label).map(Vec::as_slice)
    }

    /// Removes a whole tag and returns its nodes.
    pub fn remove(&mut self, label: &str) -> Option<Vec<NodeId>> {
        self.tags.remove(label)
    }

    /// Returns an iterator over `(label, node ids)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[NodeId])> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Returns the number of labels.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Returns `true` if there are no labels.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Drops all ids not contained in `existing`, and tags that become empty.
    pub(crate) fn retain_nodes(&mut self, existing: &HashSet<NodeId>) {
        for ids in self.tags.values_mut() {
            ids.retain(|id| existing.contains(id));
        }
        self.tags.retain(|_, ids| !ids.is_empty());
    }

    /// Renames node ids according to `remap`; ids not in the map stay as they are.
    ///
    /// Ids that collapse onto the same node keep only their first occurrence.
    pub(crate) fn remap(&mut self, remap: &HashMap<NodeId, NodeId>) {
        for ids in self.tags.values_mut() {
            for id in ids.iter_mut() {
                if let Some(new_id) = remap.get(id) {
                    *id = *new_id;
                }
            }
            let mut seen = HashSet::with_capacity(ids.len());
            ids.retain(|id| seen.insert(*id));
        }
    }

    /// Adds all tags of `other`.
    pub(crate) fn extend(&mut self, other: &Tags) {
        for (label, ids) in other.iter() {
            for id in ids {
                self.add(label, *id);
            }
        }
    }
}
