use skeletree::polarity::SplitOptions;
use skeletree::{Compartment, Connector, Dotprops, MeshNeuron, Neuron, Node, Skeleton, SkeletonError};
use std::collections::HashMap;

fn y_tree() -> Skeleton {
    Skeleton::from_nodes(vec![
        Node::new(1, None, [0.0, 0.0, 0.0], None),
        Node::new(2, Some(1), [1.0, 0.0, 0.0], None),
        Node::new(3, Some(2), [2.0, 0.0, 0.0], None),
        Node::new(4, Some(3), [3.0, 0.0, 0.0], None),
        Node::new(5, Some(2), [1.0, 1.0, 0.0], None),
    ])
    .unwrap()
    .with_units("um")
}

/// A unit square in the xy plane made of two triangles.
fn square() -> MeshNeuron {
    MeshNeuron::new(
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
        vec![[0, 1, 2], [0, 2, 3]],
    )
    .unwrap()
}

// ============= Dotprops =============

#[test]
fn test_dotprops_from_skeleton() {
    let dotprops = Dotprops::from_skeleton(&y_tree());
    assert_eq!(dotprops.len(), 4);
    assert_eq!(dotprops.points[0], [0.5, 0.0, 0.0]);
    assert_eq!(dotprops.vectors[0], [1.0, 0.0, 0.0]);
    assert_eq!(dotprops.vectors[3], [0.0, 1.0, 0.0]);
    assert_eq!(dotprops.lengths.as_ref().unwrap(), &vec![1.0; 4]);
    assert!(dotprops.alpha.is_none());
    assert_eq!(dotprops.units.as_deref(), Some("um"));
}

#[test]
fn test_dotprops_skip_zero_length_edges() {
    let skeleton = Skeleton::from_nodes(vec![
        Node::new(1, None, [0.0; 3], None),
        Node::new(2, Some(1), [0.0; 3], None),
        Node::new(3, Some(2), [0.0, 0.0, 2.0], None),
    ])
    .unwrap();
    let dotprops = Dotprops::from_skeleton(&skeleton);
    assert_eq!(dotprops.len(), 1);
    assert_eq!(dotprops.lengths.unwrap(), vec![2.0]);
}

#[test]
fn test_dotprops_from_planar_points() {
    let points: Vec<_> = (0..5)
        .flat_map(|x| (0..5).map(move |y| [x as f64, y as f64, 0.0]))
        .collect();
    let dotprops = Dotprops::from_points(&points, 9).unwrap();
    assert_eq!(dotprops.k, Some(9));
    for (vector, alpha) in dotprops.vectors.iter().zip(dotprops.alpha.as_ref().unwrap()) {
        assert!(vector[2].abs() < 1e-9);
        assert!(*alpha > -1e-9 && *alpha < 1.0 + 1e-9);
    }
}

// ============= Mesh neuron =============

#[test]
fn test_mesh_rejects_bad_face() {
    let result = MeshNeuron::new(vec![[0.0; 3], [1.0, 0.0, 0.0]], vec![[0, 1, 2]]);
    assert!(matches!(result, Err(SkeletonError::Schema(_))));
}

#[test]
fn test_mesh_with_skeleton() {
    let skeleton = Skeleton::from_nodes(vec![
        Node::new(1, None, [0.0, 0.5, 0.0], None),
        Node::new(2, Some(1), [1.0, 0.5, 0.0], None),
    ])
    .unwrap();
    let mesh = square().with_skeleton(skeleton.clone(), vec![1, 2, 2, 1]).unwrap();
    assert_eq!(mesh.vertex_map(), Some(&[1, 2, 2, 1][..]));
    assert_eq!(mesh.skeleton().unwrap().n_nodes(), 2);

    let labels = HashMap::from([(2, "far")]);
    assert_eq!(
        mesh.project_node_labels(&labels).unwrap(),
        vec![None, Some("far"), Some("far"), None]
    );

    // Wrong length and unknown node
    assert!(matches!(
        square().with_skeleton(skeleton.clone(), vec![1, 2]),
        Err(SkeletonError::Schema(_))
    ));
    assert!(square().with_skeleton(skeleton, vec![1, 2, 3, 1]).unwrap_err().is_not_found());
}

#[test]
fn test_mesh_projects_compartments() {
    assert!(matches!(
        square().project_compartments(),
        Err(SkeletonError::MissingData(_))
    ));

    // Dendrite 1 → 2 → (5, 6) with inputs, axon 1 → 3 → (7, 8) with outputs
    let mut skeleton = Skeleton::from_nodes(vec![
        Node::new(1, None, [0.0, 0.0, 0.0], None),
        Node::new(2, Some(1), [-1.0, 0.0, 0.0], None),
        Node::new(3, Some(1), [1.0, 0.0, 0.0], None),
        Node::new(5, Some(2), [-2.0, 1.0, 0.0], None),
        Node::new(6, Some(2), [-2.0, -1.0, 0.0], None),
        Node::new(7, Some(3), [2.0, 1.0, 0.0], None),
        Node::new(8, Some(3), [2.0, -1.0, 0.0], None),
    ])
    .unwrap()
    .with_connectors(vec![
        Connector::new(1, 5, [-2.0, 1.0, 0.0], "post"),
        Connector::new(2, 6, [-2.0, -1.0, 0.0], "post"),
        Connector::new(3, 7, [2.0, 1.0, 0.0], "pre"),
        Connector::new(4, 8, [2.0, -1.0, 0.0], "pre"),
    ])
    .unwrap();
    skeleton.label_compartments(&SplitOptions::default()).unwrap();

    let mesh = square().with_skeleton(skeleton, vec![5, 7, 8, 6]).unwrap();
    let projected = mesh.project_compartments().unwrap();
    assert_eq!(projected[0], Some(Compartment::Dendrite));
    assert_eq!(projected[1], Some(Compartment::Axon));
    assert_eq!(projected[2], Some(Compartment::Axon));
    assert_eq!(projected[3], Some(Compartment::Dendrite));
}

// ============= Neuron =============

#[test]
fn test_neuron_kinds() {
    let tree: Neuron = y_tree().into();
    let mesh: Neuron = square()
        .with_units("nm")
        .with_connectors(vec![Connector::new(1, 0, [0.5, 0.5, 0.0], "pre")])
        .into();
    let dots: Neuron = Dotprops::from_skeleton(&y_tree()).into();

    assert_eq!(tree.units(), Some("um"));
    assert_eq!(mesh.units(), Some("nm"));
    assert_eq!(dots.units(), Some("um"));

    assert_eq!(tree.bounding_box().unwrap().max, [3.0, 1.0, 0.0]);
    assert_eq!(mesh.bounding_box().unwrap().max, [1.0, 1.0, 0.0]);
    assert_eq!(dots.bounding_box().unwrap().min, [0.5, 0.0, 0.0]);

    assert!(tree.connectors().is_empty());
    assert_eq!(mesh.connectors().len(), 1);
    assert!(dots.skeleton().is_none());
    assert!(mesh.skeleton().is_none());
    assert_eq!(tree.skeleton().unwrap().n_nodes(), 5);
}

#[test]
fn test_neuron_to_dotprops() {
    let tree: Neuron = y_tree().into();
    assert_eq!(tree.to_dotprops(5).unwrap().len(), 4);

    let mesh: Neuron = square().with_units("nm").into();
    let dotprops = mesh.to_dotprops(3).unwrap();
    assert_eq!(dotprops.len(), 4);
    assert_eq!(dotprops.units.as_deref(), Some("nm"));
    assert!(mesh.to_dotprops(10).is_err());
}
