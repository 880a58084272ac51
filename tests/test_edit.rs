use skeletree::edit::{InsertPosition, StrahlerCut, SubsetOptions, TwigOptions, VolumeSide};
use skeletree::geometry::{BoundingBox, Point, Sphere};
use skeletree::graph::StrahlerMethod;
use skeletree::{Connector, Node, NodeType, Skeleton, SkeletonError};

/// 1 → 2 → 3 → 4 along x with a side branch 2 → 5 along y; unit edges.
fn y_tree() -> Skeleton {
    Skeleton::from_nodes(vec![
        Node::new(1, None, [0.0, 0.0, 0.0], None),
        Node::new(2, Some(1), [1.0, 0.0, 0.0], None),
        Node::new(3, Some(2), [2.0, 0.0, 0.0], None),
        Node::new(4, Some(3), [3.0, 0.0, 0.0], None),
        Node::new(5, Some(2), [1.0, 1.0, 0.0], None),
    ])
    .unwrap()
}

/// Unbranched chain 1 → 2 → ... → n along x with unit edges.
fn chain(n: i64) -> Skeleton {
    let nodes = (1..=n)
        .map(|id| {
            let parent = (id > 1).then_some(id - 1);
            Node::new(id, parent, [(id - 1) as f64, 0.0, 0.0], None)
        })
        .collect();
    Skeleton::from_nodes(nodes).unwrap()
}

fn ids(skeleton: &Skeleton) -> Vec<i64> {
    skeleton.nodes().iter().map(Node::id).collect()
}

fn parent_of(skeleton: &Skeleton, id: i64) -> Option<i64> {
    skeleton.node(id).unwrap().parent()
}

// ============= Reroot =============

#[test]
fn test_reroot() {
    let mut skeleton = y_tree();
    skeleton.reroot(4).unwrap();
    assert_eq!(skeleton.roots(), vec![4]);
    assert_eq!(parent_of(&skeleton, 3), Some(4));
    assert_eq!(parent_of(&skeleton, 2), Some(3));
    assert_eq!(parent_of(&skeleton, 1), Some(2));
    assert_eq!(parent_of(&skeleton, 5), Some(2));
    assert_eq!(skeleton.node_type_of(4).unwrap(), NodeType::Root);
    assert_eq!(skeleton.node_type_of(1).unwrap(), NodeType::End);
    assert!((skeleton.cable_length() - 4.0).abs() < 1e-12);
    assert!(skeleton.validate().is_ok());
}

#[test]
fn test_reroot_round_trip() {
    let original = y_tree();
    let mut skeleton = original.clone();
    skeleton.reroot(5).unwrap();
    skeleton.reroot(1).unwrap();
    for node in original.nodes() {
        assert_eq!(parent_of(&skeleton, node.id()), node.parent());
        assert_eq!(skeleton.node_type_of(node.id()).unwrap(), node.node_type());
    }
}

#[test]
fn test_reroot_to_current_root_is_noop() {
    let mut skeleton = y_tree();
    skeleton.reroot(1).unwrap();
    assert_eq!(skeleton.roots(), vec![1]);
    assert!(skeleton.reroot(99).unwrap_err().is_not_found());
}

#[test]
fn test_reroot_to_tag() {
    let mut skeleton = y_tree();
    skeleton.add_tag("soma", 5).unwrap();
    skeleton.reroot_to_tag("soma").unwrap();
    assert_eq!(skeleton.roots(), vec![5]);
    assert!(skeleton.reroot_to_tag("missing").unwrap_err().is_not_found());

    skeleton.add_tag("ends", 1).unwrap();
    skeleton.add_tag("ends", 4).unwrap();
    assert!(skeleton.reroot_to_tag("ends").unwrap_err().is_not_found());
    assert_eq!(skeleton.roots(), vec![5]);
}

// ============= Cut =============

#[test]
fn test_cut_at() {
    let skeleton = y_tree()
        .with_connectors(vec![
            Connector::new(1, 2, [1.0, 0.0, 0.0], "pre"),
            Connector::new(2, 1, [0.0, 0.0, 0.0], "post"),
        ])
        .unwrap();
    let (distal, proximal) = skeleton.cut_at(2).unwrap();

    assert_eq!(ids(&distal), vec![2, 3, 4, 5]);
    assert_eq!(distal.roots(), vec![2]);
    assert_eq!(distal.node_type_of(2).unwrap(), NodeType::Root);
    assert_eq!(ids(&proximal), vec![1, 2]);
    assert_eq!(proximal.node_type_of(2).unwrap(), NodeType::End);

    // Connectors on the cut node go distal
    assert_eq!(distal.connectors().len(), 1);
    assert_eq!(distal.connectors()[0].node_id, 2);
    assert_eq!(proximal.connectors().len(), 1);
    assert_eq!(proximal.connectors()[0].node_id, 1);

    // Cable is preserved
    let total = distal.cable_length() + proximal.cable_length();
    assert!((total - skeleton.cable_length()).abs() < 1e-12);
    // Original untouched
    assert_eq!(skeleton.n_nodes(), 5);
}

#[test]
fn test_cut_at_root_fails() {
    let skeleton = y_tree();
    assert!(skeleton.cut_at(1).unwrap_err().is_structural());
    assert!(skeleton.cut_at(99).unwrap_err().is_not_found());
}

#[test]
fn test_cut_requires_single_tree() {
    let mut skeleton = y_tree();
    skeleton.subset(&[1, 3, 4], SubsetOptions::new()).unwrap();
    assert!(matches!(
        skeleton.cut_at(4),
        Err(SkeletonError::MultipleRoots { num_roots: 2 })
    ));
}

#[test]
fn test_cut_multiple() {
    let fragments = y_tree().cut(&[2, 3]).unwrap();
    let sets: Vec<Vec<i64>> = fragments.iter().map(ids).collect();
    assert_eq!(sets, vec![vec![3, 4], vec![2, 3, 5], vec![1, 2]]);
    for fragment in &fragments {
        assert!(fragment.is_tree());
    }
}

// ============= Subset =============

#[test]
fn test_subset_creates_roots() {
    let mut skeleton = y_tree();
    skeleton.subset(&[1, 3, 4], SubsetOptions::new()).unwrap();
    assert_eq!(ids(&skeleton), vec![1, 3, 4]);
    assert_eq!(skeleton.roots(), vec![1, 3]);
    assert!(skeleton.validate().is_ok());
}

#[test]
fn test_subset_prevent_fragments() {
    let mut skeleton = y_tree();
    skeleton
        .subset(&[1, 3, 4], SubsetOptions::new().prevent_fragments())
        .unwrap();
    assert_eq!(ids(&skeleton), vec![1, 2, 3, 4]);
    assert!(skeleton.is_tree());
}

#[test]
fn test_subset_drops_annotations() {
    let mut skeleton = y_tree()
        .with_connectors(vec![Connector::new(1, 5, [1.0, 1.0, 0.0], "pre")])
        .unwrap()
        .with_soma(5)
        .unwrap();
    skeleton.add_tag("tip", 5).unwrap();
    skeleton.subset(&[1, 2, 3, 4], SubsetOptions::new()).unwrap();
    assert!(skeleton.connectors().is_empty());
    assert!(skeleton.tags().get("tip").is_none());
    assert_eq!(skeleton.soma(), None);
}

#[test]
fn test_subset_reattaches_connectors() {
    let mut skeleton = y_tree()
        .with_connectors(vec![Connector::new(1, 5, [1.0, 1.0, 0.0], "pre")])
        .unwrap();
    skeleton
        .subset(&[1, 2, 3, 4], SubsetOptions::new().reattach_connectors())
        .unwrap();
    assert_eq!(skeleton.connectors()[0].node_id, 2);
}

#[test]
fn test_subset_errors_leave_skeleton_unchanged() {
    let mut skeleton = y_tree();
    assert!(skeleton.subset(&[1, 99], SubsetOptions::new()).unwrap_err().is_not_found());
    assert!(matches!(
        skeleton.subset_mask(&[true, false], SubsetOptions::new()),
        Err(SkeletonError::Schema(_))
    ));
    assert_eq!(skeleton.n_nodes(), 5);
    assert!(skeleton.validate().is_ok());
}

#[test]
fn test_subset_by_predicate() {
    let mut skeleton = y_tree();
    skeleton
        .subset_by(|n| n.position()[1] == 0.0, SubsetOptions::new())
        .unwrap();
    assert_eq!(ids(&skeleton), vec![1, 2, 3, 4]);
    assert_eq!(skeleton.node_type_of(2).unwrap(), NodeType::Slab);
}

#[test]
fn test_connected_superset() {
    let skeleton = y_tree();
    assert_eq!(skeleton.connected_superset(&[4, 5]).unwrap(), vec![2, 3, 4, 5]);
    assert_eq!(skeleton.connected_superset(&[3]).unwrap(), vec![3]);
}

// ============= Insert / remove =============

#[test]
fn test_insert_midpoint() {
    let mut skeleton = y_tree();
    let new_ids = skeleton.insert_nodes(&[(2, 3)], &[], true).unwrap();
    assert_eq!(new_ids, vec![6]);
    assert_eq!(skeleton.node(6).unwrap().position(), &[1.5, 0.0, 0.0]);
    assert_eq!(parent_of(&skeleton, 6), Some(2));
    assert_eq!(parent_of(&skeleton, 3), Some(6));
    assert_eq!(skeleton.node_type_of(6).unwrap(), NodeType::Slab);
    assert!((skeleton.cable_length() - 4.0).abs() < 1e-12);
}

#[test]
fn test_insert_interpolates_radius() {
    let mut skeleton = Skeleton::from_nodes(vec![
        Node::new(1, None, [0.0, 0.0, 0.0], Some(2.0)),
        Node::new(2, Some(1), [4.0, 0.0, 0.0], Some(4.0)),
    ])
    .unwrap();
    let new_ids = skeleton
        .insert_nodes(&[(1, 2)], &[InsertPosition::Point([1.0, 0.0, 0.0])], true)
        .unwrap();
    assert_eq!(skeleton.node(new_ids[0]).unwrap().radius(), Some(2.5));

    let more = skeleton
        .insert_nodes(&[(new_ids[0], 2)], &[InsertPosition::Fraction(0.5)], true)
        .unwrap();
    assert_eq!(skeleton.node(more[0]).unwrap().position(), &[2.5, 0.0, 0.0]);
    assert_eq!(skeleton.node(more[0]).unwrap().radius(), Some(3.25));
}

#[test]
fn test_insert_rejects_non_edge() {
    let mut skeleton = y_tree();
    assert!(skeleton.insert_nodes(&[(1, 3)], &[], true).unwrap_err().is_structural());
    assert!(matches!(
        skeleton.insert_nodes(&[(1, 2)], &[InsertPosition::default(); 2], true),
        Err(SkeletonError::Schema(_))
    ));
    assert_eq!(skeleton.n_nodes(), 5);
}

#[test]
fn test_insert_fraction_out_of_range() {
    let mut skeleton = y_tree();
    for t in [-0.5, 1.5, f64::NAN] {
        assert!(matches!(
            skeleton.insert_nodes(&[(2, 3)], &[InsertPosition::Fraction(t)], true),
            Err(SkeletonError::Schema(_))
        ));
    }
    assert_eq!(skeleton.n_nodes(), 5);
    assert_eq!(parent_of(&skeleton, 3), Some(2));

    // Both ends of the edge are accepted
    let new_ids = skeleton
        .insert_nodes(&[(2, 3)], &[InsertPosition::Fraction(1.0)], true)
        .unwrap();
    assert_eq!(skeleton.node(new_ids[0]).unwrap().position(), &[2.0, 0.0, 0.0]);
}

#[test]
fn test_remove_nodes_reattaches_children() {
    let mut skeleton = y_tree();
    skeleton.remove_nodes(&[2]).unwrap();
    assert_eq!(ids(&skeleton), vec![1, 3, 4, 5]);
    assert_eq!(parent_of(&skeleton, 3), Some(1));
    assert_eq!(parent_of(&skeleton, 5), Some(1));
    assert_eq!(skeleton.node_type_of(1).unwrap(), NodeType::Root);
    let expected = 2.0 + 1.0 + 2f64.sqrt();
    assert!((skeleton.cable_length() - expected).abs() < 1e-12);
}

#[test]
fn test_remove_root() {
    let mut skeleton = y_tree();
    skeleton.remove_nodes(&[1]).unwrap();
    assert_eq!(skeleton.roots(), vec![2]);

    // Removing the branch point root would leave two roots
    let mut skeleton = y_tree();
    skeleton.reroot(2).unwrap();
    assert!(skeleton.remove_nodes(&[2]).unwrap_err().is_structural());
    assert_eq!(skeleton.n_nodes(), 5);
}

// ============= Pruning =============

#[test]
fn test_prune_by_strahler() {
    // 1 → 2 → (3, 4); 1 → 5 → (6, 7)
    let nodes = vec![
        Node::new(1, None, [0.0, 0.0, 0.0], None),
        Node::new(2, Some(1), [-1.0, 1.0, 0.0], None),
        Node::new(3, Some(2), [-2.0, 2.0, 0.0], None),
        Node::new(4, Some(2), [0.0, 2.0, 0.0], None),
        Node::new(5, Some(1), [1.0, 1.0, 0.0], None),
        Node::new(6, Some(5), [1.0, 2.0, 0.0], None),
        Node::new(7, Some(5), [2.0, 2.0, 0.0], None),
    ];
    let skeleton = Skeleton::from_nodes(nodes)
        .unwrap()
        .with_connectors(vec![Connector::new(1, 3, [-2.0, 2.0, 0.0], "post")])
        .unwrap();

    let mut pruned = skeleton.clone();
    pruned
        .prune_by_strahler(StrahlerCut::UpTo(1), StrahlerMethod::Standard, true)
        .unwrap();
    assert_eq!(ids(&pruned), vec![1, 2, 5]);
    assert_eq!(pruned.connectors()[0].node_id, 2);

    let mut pruned = skeleton.clone();
    pruned
        .prune_by_strahler(StrahlerCut::Orders(vec![1]), StrahlerMethod::Standard, false)
        .unwrap();
    assert_eq!(ids(&pruned), vec![1, 2, 5]);
    assert!(pruned.connectors().is_empty());

    let mut pruned = skeleton.clone();
    pruned
        .prune_by_strahler(StrahlerCut::KeepHighest(1), StrahlerMethod::Standard, false)
        .unwrap();
    assert_eq!(ids(&pruned), vec![1]);
}

#[test]
fn test_prune_twigs_simple() {
    // Main neurite 1 → 2 → 3 → 4 (10 per edge) with a 2-long twig 2 → 5
    let mut skeleton = Skeleton::from_nodes(vec![
        Node::new(1, None, [0.0, 0.0, 0.0], None),
        Node::new(2, Some(1), [10.0, 0.0, 0.0], None),
        Node::new(3, Some(2), [20.0, 0.0, 0.0], None),
        Node::new(4, Some(3), [30.0, 0.0, 0.0], None),
        Node::new(5, Some(2), [10.0, 2.0, 0.0], None),
    ])
    .unwrap();
    skeleton.prune_twigs(5.0, TwigOptions::default()).unwrap();
    assert_eq!(ids(&skeleton), vec![1, 2, 3, 4]);
    assert_eq!(skeleton.node_type_of(2).unwrap(), NodeType::Slab);
}

#[test]
fn test_prune_twigs_keeps_root_segment() {
    let mut skeleton = chain(2);
    let options = TwigOptions {
        recursive: true,
        ..Default::default()
    };
    skeleton.prune_twigs(5.0, options).unwrap();
    assert_eq!(skeleton.n_nodes(), 2);
}

#[test]
fn test_prune_twigs_exact() {
    let mut skeleton = chain(4);
    let options = TwigOptions {
        exact: true,
        ..Default::default()
    };
    skeleton.prune_twigs(1.5, options).unwrap();
    assert_eq!(ids(&skeleton), vec![1, 2, 5]);
    assert_eq!(skeleton.node(5).unwrap().position(), &[1.5, 0.0, 0.0]);
    assert!((skeleton.cable_length() - 1.5).abs() < 1e-12);
}

#[test]
fn test_prune_twigs_rejects_negative_size() {
    let mut skeleton = y_tree();
    assert!(skeleton.prune_twigs(-1.0, TwigOptions::default()).unwrap_err().is_structural());
    assert!(skeleton.prune_twigs(f64::NAN, TwigOptions::default()).is_err());
}

#[test]
fn test_prune_by_longest_neurite() {
    let mut skeleton = y_tree();
    skeleton.prune_by_longest_neurite(1, false).unwrap();
    assert_eq!(ids(&skeleton), vec![1, 2, 3, 4]);

    let mut skeleton = y_tree();
    assert!(skeleton.prune_by_longest_neurite(0, false).unwrap_err().is_structural());
    skeleton.prune_by_longest_neurite(2, false).unwrap();
    assert_eq!(skeleton.n_nodes(), 5);
}

#[test]
fn test_prune_by_longest_neurite_from_soma() {
    let mut skeleton = y_tree().with_soma(4).unwrap();
    skeleton.prune_by_longest_neurite(1, true).unwrap();
    assert_eq!(skeleton.roots(), vec![4]);
    // From 4, the tips 1 and 5 are both 3 away; the first in table order wins
    assert_eq!(ids(&skeleton), vec![1, 2, 3, 4]);
}

#[test]
fn test_prune_by_volume() {
    let bbox = BoundingBox::new([-0.5, -0.5, -0.5], [2.5, 0.5, 0.5]);

    let mut inside = y_tree();
    inside.prune_by_volume(&bbox, VolumeSide::Inside, false).unwrap();
    assert_eq!(ids(&inside), vec![1, 2, 3]);

    let mut outside = y_tree();
    outside.prune_by_volume(&bbox, VolumeSide::Outside, false).unwrap();
    assert_eq!(ids(&outside), vec![4, 5]);
    assert_eq!(outside.n_roots(), 2);

    let mut connected = y_tree();
    connected.prune_by_volume(&bbox, VolumeSide::Outside, true).unwrap();
    assert_eq!(ids(&connected), vec![2, 3, 4, 5]);
    assert!(connected.is_tree());
}

#[test]
fn test_prune_by_custom_volume() {
    let mut skeleton = y_tree();
    let sphere = Sphere {
        center: [0.0, 0.0, 0.0],
        radius: 1.2,
    };
    skeleton.prune_by_volume(&sphere, VolumeSide::Inside, false).unwrap();
    assert_eq!(ids(&skeleton), vec![1, 2]);

    let mut skeleton = y_tree();
    let left_half = |p: &Point| p[0] < 1.5;
    skeleton.prune_by_volume(&left_half, VolumeSide::Inside, false).unwrap();
    assert_eq!(ids(&skeleton), vec![1, 2, 5]);
}

// ============= Rewire =============

#[test]
fn test_rewire() {
    let mut skeleton = y_tree();
    let mut graph = skeleton.to_undirected();
    assert_eq!(graph.node_count(), 5);
    assert_eq!(graph.edge_count(), 4);

    graph.remove_edge(2, 5);
    graph.add_edge(4, 5, 2.0);
    skeleton.rewire(&graph, None).unwrap();
    assert_eq!(skeleton.roots(), vec![1]);
    assert_eq!(parent_of(&skeleton, 5), Some(4));
    assert_eq!(skeleton.n_branches(), 0);

    skeleton.rewire(&graph, Some(5)).unwrap();
    assert_eq!(skeleton.roots(), vec![5]);
    assert_eq!(parent_of(&skeleton, 1), Some(2));
}

#[test]
fn test_rewire_drops_missing_and_rejects_unknown() {
    let mut skeleton = y_tree();
    let mut graph = skeleton.to_undirected();
    graph.remove_node(5);
    skeleton.rewire(&graph, None).unwrap();
    assert_eq!(ids(&skeleton), vec![1, 2, 3, 4]);

    graph.add_edge(4, 42, 1.0);
    assert!(skeleton.rewire(&graph, None).unwrap_err().is_not_found());
    assert_eq!(skeleton.n_nodes(), 4);
}

#[test]
fn test_merge_duplicate_nodes_joins_fragments() {
    let skeleton = Skeleton::from_nodes(vec![
        Node::new(1, None, [0.0, 0.0, 0.0], None),
        Node::new(2, Some(1), [1.0, 0.0, 0.0], None),
        Node::new(3, Some(2), [2.0, 0.0, 0.0], None),
        Node::new(10, None, [2.0, 0.0, 0.001], None),
        Node::new(11, Some(10), [3.0, 0.0, 0.0], None),
    ])
    .unwrap();
    let mut skeleton = skeleton
        .with_connectors(vec![Connector::new(1, 10, [2.0, 0.0, 0.0], "pre")])
        .unwrap();
    skeleton.add_tag("joint", 10).unwrap();

    let merged = skeleton.merge_duplicate_nodes(0.01).unwrap();
    assert_eq!(merged, 1);
    assert_eq!(ids(&skeleton), vec![1, 2, 3, 11]);
    assert!(skeleton.is_tree());
    assert_eq!(parent_of(&skeleton, 11), Some(3));
    assert_eq!(skeleton.connectors()[0].node_id, 3);
    assert_eq!(skeleton.tags().get("joint").unwrap(), &[3]);
}

#[test]
fn test_merge_duplicate_nodes_breaks_cycles() {
    // Two paths from 1 end at (almost) the same point
    let mut skeleton = Skeleton::from_nodes(vec![
        Node::new(1, None, [0.0, 0.0, 0.0], None),
        Node::new(2, Some(1), [1.0, 0.0, 0.0], None),
        Node::new(3, Some(2), [1.0, 1.0, 0.0], None),
        Node::new(4, Some(1), [0.0, 1.0, 0.0], None),
        Node::new(5, Some(4), [1.0, 1.0, 0.001], None),
    ])
    .unwrap();
    assert_eq!(skeleton.merge_duplicate_nodes(0.01).unwrap(), 1);
    assert_eq!(skeleton.n_nodes(), 4);
    assert!(skeleton.is_tree());
    assert_eq!(skeleton.roots(), vec![1]);
    assert!(skeleton.validate().is_ok());
}

#[test]
fn test_merge_collapses_shared_tags() {
    let mut skeleton = Skeleton::from_nodes(vec![
        Node::new(1, None, [0.0, 0.0, 0.0], None),
        Node::new(2, Some(1), [1.0, 0.0, 0.0], None),
        Node::new(3, Some(2), [1.0, 0.0, 0.0], None),
        Node::new(4, Some(3), [2.0, 0.0, 0.0], None),
    ])
    .unwrap();
    skeleton.add_tag("mark", 2).unwrap();
    skeleton.add_tag("mark", 3).unwrap();

    assert_eq!(skeleton.merge_duplicate_nodes(1e-6).unwrap(), 1);
    assert_eq!(skeleton.tags().get("mark").unwrap(), &[2]);
    skeleton.reroot_to_tag("mark").unwrap();
    assert_eq!(skeleton.roots(), vec![2]);
}

#[test]
fn test_merge_without_duplicates_is_noop() {
    let mut skeleton = y_tree();
    assert_eq!(skeleton.merge_duplicate_nodes(0.1).unwrap(), 0);
    assert_eq!(skeleton.n_nodes(), 5);
}
