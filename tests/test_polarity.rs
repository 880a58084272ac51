use skeletree::polarity::{FlowMode, SplitMethod, SplitOptions, segregation_index};
use skeletree::{Compartment, Connector, Node, Skeleton, SkeletonError};

/// Soma 1 with a dendrite 1 → 8 → 9 carrying postsynapses and an axon
/// 1 → 2 → 3 → (4, 5) carrying presynapses.
///
/// With `stem`, the soma hangs off a synapse-free fiber 100 → 101 → 1.
fn polarized(stem: bool) -> Skeleton {
    let mut nodes = Vec::new();
    let soma_parent = if stem {
        nodes.push(Node::new(100, None, [0.0, 0.0, -2.0], None));
        nodes.push(Node::new(101, Some(100), [0.0, 0.0, -1.0], None));
        Some(101)
    } else {
        None
    };
    nodes.extend([
        Node::new(1, soma_parent, [0.0, 0.0, 0.0], None),
        Node::new(2, Some(1), [1.0, 0.0, 0.0], None),
        Node::new(3, Some(2), [2.0, 0.0, 0.0], None),
        Node::new(4, Some(3), [3.0, 1.0, 0.0], None),
        Node::new(5, Some(3), [3.0, -1.0, 0.0], None),
        Node::new(8, Some(1), [-1.0, 0.0, 0.0], None),
        Node::new(9, Some(8), [-2.0, 0.0, 0.0], None),
    ]);

    let mut connectors = Vec::new();
    let mut add = |node_id: i64, kind: &str| {
        let id = connectors.len() as i64 + 1;
        connectors.push(Connector::new(id, node_id, [0.0; 3], kind));
    };
    add(4, "pre");
    add(4, "pre");
    add(5, "pre");
    add(5, "pre");
    add(8, "post");
    add(9, "post");
    add(9, "post");
    add(9, "post");

    Skeleton::from_nodes(nodes)
        .unwrap()
        .with_connectors(connectors)
        .unwrap()
}

fn compartment_of(skeleton: &Skeleton, id: i64) -> Option<Compartment> {
    skeleton.node(id).unwrap().compartment()
}

// ============= Segregation index =============

#[test]
fn test_segregation_index_boundaries() {
    assert_eq!(segregation_index(&[(5, 0), (0, 5)]), 1.0);
    assert_eq!(segregation_index(&[(5, 5)]), 0.0);
    assert_eq!(segregation_index(&[(2, 2), (3, 3)]), 0.0);
    // Nothing to segregate
    assert_eq!(segregation_index(&[(3, 0)]), 0.0);
    assert_eq!(segregation_index(&[]), 0.0);

    let partial = segregation_index(&[(4, 1), (1, 4)]);
    assert!(partial > 0.0 && partial < 1.0);
}

#[test]
fn test_arbor_segregation_index() {
    let skeleton = polarized(false);
    let index = skeleton.arbor_segregation_index().unwrap();
    // Table order: 1, 2, 3, 4, 5, 8, 9
    assert_eq!(index[0], 0.0);
    assert_eq!(index[1], 1.0);
    assert_eq!(index[2], 1.0);
    assert!(index[3] > 0.0 && index[3] < 1.0);
}

// ============= Flow centrality =============

#[test]
fn test_flow_centrality() {
    let skeleton = polarized(false);
    let sum = skeleton.flow_centrality(FlowMode::Sum).unwrap();
    assert_eq!(sum, vec![0.0, 16.0, 16.0, 8.0, 8.0, 16.0, 12.0]);

    let centrifugal = skeleton.flow_centrality(FlowMode::Centrifugal).unwrap();
    assert_eq!(centrifugal, vec![0.0, 16.0, 16.0, 8.0, 8.0, 0.0, 0.0]);

    let centripetal = skeleton.flow_centrality(FlowMode::Centripetal).unwrap();
    assert_eq!(centripetal, vec![0.0, 0.0, 0.0, 0.0, 0.0, 16.0, 12.0]);
}

#[test]
fn test_synapse_counts() {
    let skeleton = polarized(false);
    let counts = skeleton.synapse_counts().unwrap();
    assert_eq!(counts.total_pre(), 4);
    assert_eq!(counts.total_post(), 4);
    let distal = counts.distal(skeleton.graph());
    assert_eq!(distal.pre[0], 4);
    assert_eq!(distal.post[5], 4);
}

#[test]
fn test_flow_requires_connectors() {
    let skeleton = Skeleton::from_nodes(vec![
        Node::new(1, None, [0.0; 3], None),
        Node::new(2, Some(1), [1.0, 0.0, 0.0], None),
    ])
    .unwrap();
    assert!(matches!(
        skeleton.flow_centrality(FlowMode::Sum),
        Err(SkeletonError::MissingData(_))
    ));
}

#[test]
fn test_flow_rejects_unknown_connector_type() {
    let skeleton = polarized(false)
        .with_connectors(vec![Connector::new(1, 4, [0.0; 3], "gap_junction")])
        .unwrap();
    assert!(matches!(
        skeleton.flow_centrality(FlowMode::Sum),
        Err(SkeletonError::Schema(_))
    ));
}

#[test]
fn test_flow_requires_single_tree() {
    let mut skeleton = polarized(false);
    skeleton
        .subset(&[1, 2, 4, 5, 8, 9], skeletree::edit::SubsetOptions::new())
        .unwrap();
    assert!(matches!(
        skeleton.flow_centrality(FlowMode::Sum),
        Err(SkeletonError::MultipleRoots { num_roots: 3 })
    ));
}

// ============= Axon / dendrite split =============

#[test]
fn test_label_compartments() {
    let mut skeleton = polarized(false);
    let index = skeleton.label_compartments(&SplitOptions::default()).unwrap();
    assert_eq!(index, 1.0);

    assert_eq!(compartment_of(&skeleton, 1), Some(Compartment::Dendrite));
    assert_eq!(compartment_of(&skeleton, 2), Some(Compartment::Linker));
    assert_eq!(compartment_of(&skeleton, 3), Some(Compartment::Linker));
    assert_eq!(compartment_of(&skeleton, 4), Some(Compartment::Axon));
    assert_eq!(compartment_of(&skeleton, 5), Some(Compartment::Axon));
    assert_eq!(compartment_of(&skeleton, 8), Some(Compartment::Linker));
    assert_eq!(compartment_of(&skeleton, 9), Some(Compartment::Dendrite));
}

#[test]
fn test_label_compartments_cell_body_fiber() {
    let mut skeleton = polarized(true);
    skeleton.label_compartments(&SplitOptions::default()).unwrap();
    assert_eq!(compartment_of(&skeleton, 100), Some(Compartment::CellBodyFiber));
    assert_eq!(compartment_of(&skeleton, 101), Some(Compartment::CellBodyFiber));
    assert_eq!(compartment_of(&skeleton, 1), Some(Compartment::Dendrite));

    let options = SplitOptions {
        cell_body_fiber: false,
        ..Default::default()
    };
    skeleton.label_compartments(&options).unwrap();
    assert_eq!(compartment_of(&skeleton, 100), Some(Compartment::Dendrite));
}

#[test]
fn test_label_compartments_reroots_to_soma() {
    let mut skeleton = polarized(true).with_soma(1).unwrap();
    skeleton.label_compartments(&SplitOptions::default()).unwrap();
    assert_eq!(skeleton.roots(), vec![1]);
    assert_eq!(compartment_of(&skeleton, 100), Some(Compartment::Dendrite));
}

#[test]
fn test_label_compartments_distance_method() {
    let mut skeleton = polarized(false);
    let options = SplitOptions {
        split: SplitMethod::Distance,
        ..Default::default()
    };
    skeleton.label_compartments(&options).unwrap();
    // Only the fragment holding the root counts as dendrite
    assert_eq!(compartment_of(&skeleton, 1), Some(Compartment::Dendrite));
    assert_eq!(compartment_of(&skeleton, 9), Some(Compartment::Axon));
    assert_eq!(compartment_of(&skeleton, 4), Some(Compartment::Axon));
}

#[test]
fn test_label_compartments_errors() {
    let mut skeleton = polarized(false);
    let options = SplitOptions {
        flow_threshold: 0.0,
        ..Default::default()
    };
    assert!(skeleton.label_compartments(&options).unwrap_err().is_structural());

    // Presynapses only: there is no flow
    let mut only_pre = polarized(false)
        .with_connectors(vec![Connector::new(1, 4, [0.0; 3], "pre")])
        .unwrap()
        .with_soma(9)
        .unwrap();
    assert!(matches!(
        only_pre.label_compartments(&SplitOptions::default()),
        Err(SkeletonError::MissingData(_))
    ));
    // The failed split must not have rerooted to the soma
    assert_eq!(only_pre.roots(), vec![1]);
    assert!(only_pre.compartments().iter().all(Option::is_none));
}

#[test]
fn test_split_axon_dendrite() {
    let skeleton = polarized(true);
    let split = skeleton.split_axon_dendrite(&SplitOptions::default()).unwrap();
    assert_eq!(split.segregation_index, 1.0);

    let ids = |s: &Skeleton| s.nodes().iter().map(Node::id).collect::<Vec<_>>();
    assert_eq!(ids(&split.axon), vec![4, 5]);
    assert_eq!(ids(&split.dendrite), vec![1, 9]);
    assert_eq!(ids(&split.linker), vec![2, 3, 8]);
    assert_eq!(ids(split.cell_body_fiber.as_ref().unwrap()), vec![100, 101]);

    // Connectors follow their nodes
    assert_eq!(split.axon.presynapses().count(), 4);
    assert_eq!(split.dendrite.postsynapses().count(), 3);
    // Original untouched
    assert!(skeleton.compartments().iter().all(Option::is_none));
}
