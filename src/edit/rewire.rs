//! Regenerating parent links from an undirected graph.
//!
//! [`Skeleton::to_undirected`] exports the topology as a petgraph
//! [UnGraphMap]; callers (e.g. the healer) modify that graph and hand it
//! back to [`Skeleton::rewire`], which re-derives a rooted forest by
//! depth-first traversal. [`Skeleton::merge_duplicate_nodes`] is built on
//! the same pair.

use crate::error::{Result, SkeletonError};
use crate::geometry::distance;
use crate::model::node::{Node, NodeId};
use crate::model::skeleton::{ConnectorPolicy, Skeleton};
use petgraph::graphmap::UnGraphMap;
use petgraph::unionfind::UnionFind;
use rstar::RTree;
use rstar::primitives::GeomWithData;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

impl Skeleton {
    /// Exports the topology as an undirected graph.
    ///
    /// Every node becomes a graph node (isolated roots included); every
    /// child→parent link an edge weighted with its Euclidean length.
    pub fn to_undirected(&self) -> UnGraphMap<NodeId, f64> {
        let view = self.graph();
        let mut graph = UnGraphMap::with_capacity(view.len(), view.len());
        for id in view.ids() {
            graph.add_node(*id);
        }
        for v in 0..view.len() {
            if let Some(p) = view.parent(v) {
                graph.add_edge(view.id(v), view.id(p), view.weight(v));
            }
        }
        graph
    }

    /// Re-derives all parent links from an undirected graph.
    ///
    /// Each connected component of `graph` becomes one tree, traversed
    /// depth-first from its root: `root` for the component holding it,
    /// otherwise the first current root in the component, otherwise its
    /// first node in table order. Edges not on the traversal tree (i.e.
    /// cycles) are ignored. Nodes absent from `graph` are dropped together
    /// with their connectors.
    ///
    /// # Errors
    /// [SkeletonError::NotFound] if `graph` or `root` references an unknown node.
    pub fn rewire(&mut self, graph: &UnGraphMap<NodeId, f64>, root: Option<NodeId>) -> Result<()> {
        let mut skeleton = self.lock();
        let view = skeleton.graph();
        for id in graph.nodes() {
            view.require(id)?;
        }
        if let Some(root) = root {
            if !graph.contains_node(root) {
                return Err(SkeletonError::node_not_found(root));
            }
        }

        let seeds = root
            .into_iter()
            .chain(view.roots().iter().map(|r| view.id(*r)))
            .chain(view.ids().iter().copied());
        let mut parents: HashMap<NodeId, Option<NodeId>> = HashMap::with_capacity(graph.node_count());
        for seed in seeds {
            if !graph.contains_node(seed) || parents.contains_key(&seed) {
                continue;
            }
            parents.insert(seed, None);
            let mut stack = vec![seed];
            while let Some(current) = stack.pop() {
                for next in graph.neighbors(current) {
                    if let Entry::Vacant(e) = parents.entry(next) {
                        e.insert(Some(current));
                        stack.push(next);
                    }
                }
            }
        }

        let nodes: Vec<Node> = skeleton
            .nodes()
            .iter()
            .filter_map(|node| {
                let parent = parents.get(&node.id())?;
                let mut node = node.clone();
                node.set_parent(*parent);
                Some(node)
            })
            .collect();
        debug!(
            nodes = nodes.len(),
            edges = graph.edge_count(),
            "rewiring skeleton"
        );
        skeleton.commit(nodes, ConnectorPolicy::Drop)
    }

    /// Collapses nodes closer than `tolerance` onto one representative.
    ///
    /// Groups of nearby nodes are merged onto their first node in table
    /// order; connectors and tags move with them. Merging can close loops:
    /// each cycle is broken by removing its edge with the lowest combined
    /// endpoint degree. The tree is then re-derived from the (merged) first
    /// root.
    ///
    /// # Returns
    /// The number of nodes merged away.
    pub fn merge_duplicate_nodes(&mut self, tolerance: f64) -> Result<usize> {
        let mut skeleton = self.lock();
        let view = skeleton.graph();
        let n = view.len();

        let tree = RTree::bulk_load(
            skeleton
                .nodes()
                .iter()
                .enumerate()
                .map(|(i, node)| GeomWithData::new(*node.position(), i))
                .collect(),
        );
        let mut groups = UnionFind::<usize>::new(n);
        for (i, node) in skeleton.nodes().iter().enumerate() {
            for close in tree.locate_within_distance(*node.position(), tolerance * tolerance) {
                groups.union(i, close.data);
            }
        }

        // Representative of a group: its first member in table order
        let mut first_member: HashMap<usize, usize> = HashMap::new();
        let rep: Vec<usize> = (0..n)
            .map(|i| *first_member.entry(groups.find(i)).or_insert(i))
            .collect();
        let merged = (0..n).filter(|i| rep[*i] != *i).count();
        if merged == 0 {
            return Ok(0);
        }

        let nodes = skeleton.nodes();
        let mut graph = UnGraphMap::new();
        for i in 0..n {
            if rep[i] == i {
                graph.add_node(view.id(i));
            }
        }
        for v in 0..n {
            if let Some(p) = view.parent(v) {
                let (a, b) = (rep[v], rep[p]);
                if a != b {
                    let w = distance(nodes[a].position(), nodes[b].position());
                    graph.add_edge(view.id(a), view.id(b), w);
                }
            }
        }
        let broken = break_cycles(&mut graph);

        let id_map: HashMap<NodeId, NodeId> =
            (0..n).map(|i| (view.id(i), view.id(rep[i]))).collect();
        let root = view.roots().first().map(|r| view.id(rep[*r]));
        debug!(merged, broken, "merging duplicate nodes");

        let mut work = skeleton.clone();
        for connector in work.connectors_mut() {
            if let Some(new_id) = id_map.get(&connector.node_id) {
                connector.node_id = *new_id;
            }
        }
        work.tags_mut().remap(&id_map);
        let soma = work.soma().and_then(|s| id_map.get(&s).copied());
        work.set_soma_unchecked(soma);
        work.rewire(&graph, root)?;
        skeleton.replace_with(work);
        Ok(merged)
    }
}

/// Removes edges until `graph` is a forest; returns the number removed.
///
/// Cycles are found one at a time: the first edge (in insertion order)
/// whose endpoints are already connected closes a cycle together with the
/// forest path between them. Of that cycle, the edge with the smallest
/// combined endpoint degree is removed.
fn break_cycles(graph: &mut UnGraphMap<NodeId, f64>) -> usize {
    let mut removed = 0;
    while let Some(cycle) = find_cycle(graph) {
        let degree = |id: NodeId| graph.neighbors(id).count();
        let weakest = cycle
            .iter()
            .copied()
            .min_by_key(|(a, b)| degree(*a) + degree(*b));
        match weakest {
            Some((a, b)) => {
                graph.remove_edge(a, b);
                removed += 1;
            }
            None => break,
        }
    }
    removed
}

/// Returns the edges of one cycle of `graph`, or `None` if it is a forest.
fn find_cycle(graph: &UnGraphMap<NodeId, f64>) -> Option<Vec<(NodeId, NodeId)>> {
    let index: HashMap<NodeId, usize> = graph.nodes().enumerate().map(|(i, n)| (n, i)).collect();
    let mut components = UnionFind::<usize>::new(index.len());
    let mut forest: HashMap<NodeId, Vec<NodeId>> = HashMap::new();

    for (a, b, _) in graph.all_edges() {
        if components.union(index[&a], index[&b]) {
            forest.entry(a).or_default().push(b);
            forest.entry(b).or_default().push(a);
            continue;
        }
        // a and b already connected: the forest path b..a plus edge (a, b) is a cycle
        let mut previous: HashMap<NodeId, NodeId> = HashMap::new();
        let mut seen: HashSet<NodeId> = HashSet::from([a]);
        let mut queue = VecDeque::from([a]);
        while let Some(current) = queue.pop_front() {
            if current == b {
                break;
            }
            for next in forest.get(&current).into_iter().flatten() {
                if seen.insert(*next) {
                    previous.insert(*next, current);
                    queue.push_back(*next);
                }
            }
        }
        let mut cycle = vec![(a, b)];
        let mut current = b;
        while let Some(prev) = previous.get(&current) {
            cycle.push((*prev, current));
            current = *prev;
        }
        return Some(cycle);
    }
    None
}
