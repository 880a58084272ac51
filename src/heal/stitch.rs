//! Merging independent skeletons.

use crate::error::{Result, SkeletonError};
use crate::heal::{HealOptions, HealReport};
use crate::model::node::{Node, NodeId};
use crate::model::skeleton::Skeleton;
use crate::model::tags::Tags;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Merges skeletons into one and heals the result.
///
/// The master skeleton keeps its node ids, soma, name and units. It is the
/// first skeleton with a soma, otherwise the one with the most nodes
/// (earliest wins ties). Node ids of the other skeletons that collide with
/// ids already taken are remapped to fresh ids above the overall maximum;
/// the remap is applied to parents, connectors and tags.
///
/// # Returns
/// The stitched skeleton and the heal report.
///
/// # Errors
/// [SkeletonError::MissingData] if `skeletons` is empty, otherwise as
/// [`Skeleton::heal`].
pub fn stitch_skeletons(
    skeletons: Vec<Skeleton>,
    options: &HealOptions,
) -> Result<(Skeleton, HealReport)> {
    let master = master_index(&skeletons)
        .ok_or_else(|| SkeletonError::MissingData("no skeletons to stitch".to_string()))?;

    let mut next_id = skeletons
        .iter()
        .flat_map(|s| s.nodes().iter().map(Node::id))
        .max()
        .map_or(1, |m| m + 1);
    let mut taken: HashSet<NodeId> = skeletons[master].nodes().iter().map(Node::id).collect();

    let mut nodes = skeletons[master].nodes().to_vec();
    let mut connectors = skeletons[master].connectors().to_vec();
    let mut tags = skeletons[master].tags().clone();
    let mut remapped = 0;

    for (i, other) in skeletons.iter().enumerate() {
        if i == master {
            continue;
        }
        let mut remap: HashMap<NodeId, NodeId> = HashMap::new();
        for node in other.nodes() {
            if taken.contains(&node.id()) {
                remap.insert(node.id(), next_id);
                next_id += 1;
            }
        }
        remapped += remap.len();

        for node in other.nodes() {
            let mut node = node.clone();
            if let Some(new_id) = remap.get(&node.id()) {
                node.set_id(*new_id);
            }
            if let Some(new_parent) = node.parent().and_then(|p| remap.get(&p)) {
                node.set_parent(Some(*new_parent));
            }
            taken.insert(node.id());
            nodes.push(node);
        }
        for connector in other.connectors() {
            let mut connector = connector.clone();
            if let Some(new_id) = remap.get(&connector.node_id) {
                connector.node_id = *new_id;
            }
            connectors.push(connector);
        }
        let mut other_tags: Tags = other.tags().clone();
        other_tags.remap(&remap);
        tags.extend(&other_tags);
    }

    debug!(
        skeletons = skeletons.len(),
        master,
        remapped,
        nodes = nodes.len(),
        "stitching skeletons"
    );

    let template = &skeletons[master];
    let mut stitched = Skeleton::from_nodes(nodes)?
        .with_connectors(connectors)?
        .with_tags(tags)?;
    if let Some(soma) = template.soma() {
        stitched = stitched.with_soma(soma)?;
    }
    if let Some(name) = template.name() {
        stitched = stitched.with_name(name);
    }
    if let Some(units) = template.units() {
        stitched = stitched.with_units(units);
    }

    let report = stitched.heal(options)?;
    Ok((stitched, report))
}

/// First skeleton with a soma, else the largest (earliest on ties).
fn master_index(skeletons: &[Skeleton]) -> Option<usize> {
    if let Some(i) = skeletons.iter().position(|s| s.soma().is_some()) {
        return Some(i);
    }
    let mut best: Option<usize> = None;
    for (i, skeleton) in skeletons.iter().enumerate() {
        if best.is_none_or(|b| skeleton.n_nodes() > skeletons[b].n_nodes()) {
            best = Some(i);
        }
    }
    best
}
