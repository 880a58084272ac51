//! Neuron kinds and their shared capabilities.
//!
//! [Neuron] is a sum type over the three representations a neuron can
//! have: a [Skeleton] (tree), a [MeshNeuron] (surface) or [Dotprops]
//! (point cloud). Capabilities common to all kinds (bounding box, units,
//! connectors, conversion to dotprops) are implemented per variant.

use crate::error::{Result, SkeletonError};
use crate::geometry::{BoundingBox, Point};
use crate::model::connector::Connector;
use crate::model::dotprops::Dotprops;
use crate::model::node::{Compartment, NodeId};
use crate::model::skeleton::Skeleton;
use std::collections::HashMap;

// =#========================================================================#=
// MESH NEURON
// =#========================================================================#=
/// A neuron represented by a triangle mesh.
///
/// Mesh operations are out of scope; the mesh is only carried along. An
/// externally computed skeleton can be attached together with a
/// vertex→node map, which allows per-node results to be projected back
/// onto the mesh vertices.
#[derive(Debug, Clone, Default)]
pub struct MeshNeuron {
    vertices: Vec<Point>,
    faces: Vec<[usize; 3]>,
    skeleton: Option<Skeleton>,
    vertex_map: Option<Vec<NodeId>>,
    connectors: Vec<Connector>,
    units: Option<String>,
}

impl MeshNeuron {
    /// Creates a mesh neuron.
    ///
    /// # Errors
    /// [SkeletonError::Schema] if a face references a vertex that does not exist.
    pub fn new(vertices: Vec<Point>, faces: Vec<[usize; 3]>) -> Result<Self> {
        if let Some(face) = faces.iter().find(|f| f.iter().any(|v| *v >= vertices.len())) {
            return Err(SkeletonError::Schema(format!(
                "face {face:?} references a vertex beyond {}",
                vertices.len()
            )));
        }
        Ok(MeshNeuron {
            vertices,
            faces,
            ..Default::default()
        })
    }

    /// Attaches a skeleton and the node id of every vertex.
    ///
    /// # Errors
    /// [SkeletonError::Schema] if `vertex_map` does not have one entry per
    /// vertex, [SkeletonError::NotFound] if it references an unknown node.
    pub fn with_skeleton(mut self, skeleton: Skeleton, vertex_map: Vec<NodeId>) -> Result<Self> {
        if vertex_map.len() != self.vertices.len() {
            return Err(SkeletonError::Schema(format!(
                "vertex map has {} entries for {} vertices",
                vertex_map.len(),
                self.vertices.len()
            )));
        }
        skeleton.graph().require_all(&vertex_map)?;
        self.skeleton = Some(skeleton);
        self.vertex_map = Some(vertex_map);
        Ok(self)
    }

    /// Attaches connectors (positions only; mesh connectors have no node).
    pub fn with_connectors(mut self, connectors: Vec<Connector>) -> Self {
        self.connectors = connectors;
        self
    }

    /// Sets the coordinate units.
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    /// Returns the vertices.
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Returns the faces (vertex index triples).
    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    /// Returns the attached skeleton, if any.
    pub fn skeleton(&self) -> Option<&Skeleton> {
        self.skeleton.as_ref()
    }

    /// Returns the node id of every vertex, if a skeleton is attached.
    pub fn vertex_map(&self) -> Option<&[NodeId]> {
        self.vertex_map.as_deref()
    }

    /// Projects per-node labels onto the mesh vertices.
    ///
    /// Vertices whose node has no label get `None`.
    ///
    /// # Errors
    /// [SkeletonError::MissingData] if no skeleton is attached.
    pub fn project_node_labels<T: Clone>(&self, labels: &HashMap<NodeId, T>) -> Result<Vec<Option<T>>> {
        let vertex_map = self.vertex_map.as_ref().ok_or_else(|| {
            SkeletonError::MissingData("mesh neuron has no skeleton attached".to_string())
        })?;
        Ok(vertex_map.iter().map(|id| labels.get(id).cloned()).collect())
    }

    /// Projects the compartment labels of the attached skeleton onto the vertices.
    pub fn project_compartments(&self) -> Result<Vec<Option<Compartment>>> {
        let skeleton = self.skeleton.as_ref().ok_or_else(|| {
            SkeletonError::MissingData("mesh neuron has no skeleton attached".to_string())
        })?;
        let labels: HashMap<NodeId, Compartment> = skeleton
            .nodes()
            .iter()
            .filter_map(|n| n.compartment().map(|c| (n.id(), c)))
            .collect();
        self.project_node_labels(&labels)
    }
}

// =#========================================================================#=
// NEURON
// =#========================================================================#=
/// Any neuron representation.
#[derive(Debug, Clone)]
pub enum Neuron {
    /// Skeleton (tree of points)
    Tree(Skeleton),
    /// Surface mesh
    Mesh(MeshNeuron),
    /// Point cloud with tangent vectors
    Dotprops(Dotprops),
}

impl Neuron {
    /// Returns the bounding box, or `None` for an empty neuron.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        match self {
            Neuron::Tree(skeleton) => skeleton.bounding_box(),
            Neuron::Mesh(mesh) => BoundingBox::from_points(mesh.vertices.iter()),
            Neuron::Dotprops(dotprops) => dotprops.bounding_box(),
        }
    }

    /// Returns the coordinate units, if known.
    pub fn units(&self) -> Option<&str> {
        match self {
            Neuron::Tree(skeleton) => skeleton.units(),
            Neuron::Mesh(mesh) => mesh.units.as_deref(),
            Neuron::Dotprops(dotprops) => dotprops.units.as_deref(),
        }
    }

    /// Returns the connectors; dotprops carry none.
    pub fn connectors(&self) -> &[Connector] {
        match self {
            Neuron::Tree(skeleton) => skeleton.connectors(),
            Neuron::Mesh(mesh) => &mesh.connectors,
            Neuron::Dotprops(_) => &[],
        }
    }

    /// Returns the attached skeleton, if this kind has one.
    pub fn skeleton(&self) -> Option<&Skeleton> {
        match self {
            Neuron::Tree(skeleton) => Some(skeleton),
            Neuron::Mesh(mesh) => mesh.skeleton(),
            Neuron::Dotprops(_) => None,
        }
    }

    /// Converts to dotprops.
    ///
    /// Skeletons use their edges (`k` is ignored), meshes their vertices
    /// with `k` nearest neighbours; dotprops are returned unchanged.
    pub fn to_dotprops(&self, k: usize) -> Result<Dotprops> {
        match self {
            Neuron::Tree(skeleton) => Ok(Dotprops::from_skeleton(skeleton)),
            Neuron::Mesh(mesh) => {
                let mut dotprops = Dotprops::from_points(&mesh.vertices, k)?;
                dotprops.units = mesh.units.clone();
                Ok(dotprops)
            }
            Neuron::Dotprops(dotprops) => Ok(dotprops.clone()),
        }
    }
}

impl From<Skeleton> for Neuron {
    fn from(skeleton: Skeleton) -> Self {
        Neuron::Tree(skeleton)
    }
}

impl From<MeshNeuron> for Neuron {
    fn from(mesh: MeshNeuron) -> Self {
        Neuron::Mesh(mesh)
    }
}

impl From<Dotprops> for Neuron {
    fn from(dotprops: Dotprops) -> Self {
        Neuron::Dotprops(dotprops)
    }
}
