//! Scene arena - transform nodes, materials, and geometry behind stable handles
//!
//! The scene is the hand-off point to an external renderer. Nodes form an
//! owned tree: each node has exactly one parent (or none for roots) and the
//! parent lists its children. Handles are plain indices assigned at
//! insertion; nodes are never removed, so a handle stays valid for the life
//! of the scene.

use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::geometry::Mesh;
use crate::material::Material;

/// Handle to a node in a [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

/// Handle to a material in a [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialId(u32);

/// Handle to a geometry in a [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeometryId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shape data attached to a mesh node.
///
/// Procedural solids carry their triangles; primitives are described by
/// their parameters and tessellated by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Mesh(Mesh),
    /// Axis along y
    Cylinder {
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
        segments: u32,
    },
    /// Axis along y, apex at +y
    Cone { radius: f32, height: f32, segments: u32 },
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    /// Upper hemisphere squashed along z by `flatten`
    Dome {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
        flatten: f32,
    },
    /// Ring in the xy plane
    Torus {
        radius: f32,
        tube: f32,
        radial_segments: u32,
        tubular_segments: u32,
    },
    Cuboid { size: Vec3 },
    /// Flat disc in the xy plane
    Disc { radius: f32, segments: u32 },
    /// Flat ring in the xy plane
    Annulus {
        inner_radius: f32,
        outer_radius: f32,
        segments: u32,
    },
    /// Tube swept along a path
    Tube {
        path: Vec<Vec3>,
        radius: f32,
        radial_segments: u32,
    },
}

/// Local transform; rotation is XYZ Euler angles in radians
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn matrix(&self) -> Mat4 {
        let r = self.rotation;
        Mat4::from_scale_rotation_translation(
            self.scale,
            Quat::from_euler(EulerRot::XYZ, r.x, r.y, r.z),
            self.translation,
        )
    }
}

/// A node in the scene tree. Nodes with both geometry and material are meshes;
/// the rest are groups.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub name: Option<String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub transform: Transform,
    pub geometry: Option<GeometryId>,
    pub material: Option<MaterialId>,
    /// Draw-order hint for the transparent pass
    pub render_order: i32,
}

impl Node {
    pub fn group(name: &str) -> Self {
        Self::default().named(name)
    }

    pub fn mesh(geometry: GeometryId, material: MaterialId) -> Self {
        Self {
            geometry: Some(geometry),
            material: Some(material),
            ..Self::default()
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn at(mut self, translation: Vec3) -> Self {
        self.transform.translation = translation;
        self
    }

    pub fn rotated(mut self, rotation: Vec3) -> Self {
        self.transform.rotation = rotation;
        self
    }

    pub fn scaled(mut self, scale: Vec3) -> Self {
        self.transform.scale = scale;
        self
    }

    pub fn order(mut self, render_order: i32) -> Self {
        self.render_order = render_order;
        self
    }

    pub fn is_mesh(&self) -> bool {
        self.geometry.is_some() && self.material.is_some()
    }
}

/// Arena owning every node, material, and geometry of the model
#[derive(Debug, Default)]
pub struct Scene {
    nodes: Vec<Node>,
    materials: Vec<Material>,
    geometries: Vec<Geometry>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryId {
        self.geometries.push(geometry);
        GeometryId(self.geometries.len() as u32 - 1)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() as u32 - 1)
    }

    /// Insert a node under `parent` (or as a root) and return its handle
    pub fn add(&mut self, parent: Option<NodeId>, mut node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        node.parent = None;
        node.children.clear();
        if let Some(p) = parent.and_then(|p| self.nodes.get_mut(p.index())) {
            p.children.push(id);
            node.parent = parent;
        }
        self.nodes.push(node);
        id
    }

    /// Convenience for the common "geometry + material + node" triple
    pub fn add_mesh(
        &mut self,
        parent: NodeId,
        geometry: Geometry,
        material: Material,
        configure: impl FnOnce(Node) -> Node,
    ) -> NodeId {
        let geometry = self.add_geometry(geometry);
        let material = self.add_material(material);
        self.add(Some(parent), configure(Node::mesh(geometry, material)))
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0 as usize)
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id.0 as usize)
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&Geometry> {
        self.geometries.get(id.0 as usize)
    }

    /// Material of a mesh node
    pub fn node_material(&self, id: NodeId) -> Option<&Material> {
        self.node(id)
            .and_then(|n| n.material)
            .and_then(|m| self.material(m))
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i as u32), n))
    }

    pub fn materials_mut(&mut self) -> impl Iterator<Item = &mut Material> {
        self.materials.iter_mut()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    /// First node carrying the given name
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes()
            .find(|(_, n)| n.name.as_deref() == Some(name))
            .map(|(id, _)| id)
    }

    /// `root` and everything below it, depth first
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            out.push(id);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Mesh nodes among `root` and its descendants
    pub fn mesh_descendants(&self, root: NodeId) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|id| self.node(*id).is_some_and(Node::is_mesh))
            .collect()
    }

    /// `id` followed by its parent chain up to the root
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(id).map(|_| id), move |current| {
            self.node(*current).and_then(|n| n.parent)
        })
    }

    pub fn set_rotation_z(&mut self, id: NodeId, angle: f32) {
        if let Some(node) = self.node_mut(id) {
            node.transform.rotation.z = angle;
        }
    }

    pub fn set_scale(&mut self, id: NodeId, scale: Vec3) {
        if let Some(node) = self.node_mut(id) {
            node.transform.scale = scale;
        }
    }

    /// Composed transform from the root down to `id`
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let chain: Vec<NodeId> = self.ancestors(id).collect();
        chain
            .iter()
            .rev()
            .filter_map(|n| self.node(*n))
            .fold(Mat4::IDENTITY, |acc, n| acc * n.transform.matrix())
    }
}
