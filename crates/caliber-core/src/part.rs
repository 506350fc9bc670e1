//! Parts - described, pickable units of the movement

use serde::Serialize;

use crate::catalog::{CatalogError, PartCatalog};
use crate::scene::{NodeId, Scene};

/// What a part renders as
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Renderable {
    /// One mesh node
    Single { node: NodeId },
    /// A group whose mesh descendants all belong to the part
    Composite { root: NodeId, meshes: Vec<NodeId> },
}

impl Renderable {
    pub fn single(node: NodeId) -> Self {
        Renderable::Single { node }
    }

    /// Collect the mesh descendants of `root` at construction time
    pub fn composite(scene: &Scene, root: NodeId) -> Self {
        Renderable::Composite {
            root,
            meshes: scene.mesh_descendants(root),
        }
    }

    /// Node a pick has to resolve to for this part
    pub fn root(&self) -> NodeId {
        match self {
            Renderable::Single { node } => *node,
            Renderable::Composite { root, .. } => *root,
        }
    }

    /// Mesh nodes whose materials a highlight touches
    pub fn meshes(&self) -> &[NodeId] {
        match self {
            Renderable::Single { node } => std::slice::from_ref(node),
            Renderable::Composite { meshes, .. } => meshes,
        }
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.root() == node || self.meshes().contains(&node)
    }
}

/// A catalogued part bound to its scene nodes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Part {
    pub id: String,
    pub name: String,
    pub name_en: String,
    pub description: String,
    pub renderable: Renderable,
}

impl Part {
    /// Look `id` up in the catalog and bind it to `renderable`
    pub fn from_catalog(
        catalog: &PartCatalog,
        id: &str,
        renderable: Renderable,
    ) -> Result<Self, CatalogError> {
        let entry = catalog.get(id)?;
        Ok(Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
            name_en: entry.name_en.clone(),
            description: entry.description.clone(),
            renderable,
        })
    }
}
