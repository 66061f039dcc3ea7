//! Scene graph and hierarchical scene organization.
//!
//! Nodes live in an arena owned by [`SceneGraph`] and refer to each other by
//! [`NodeId`]. A node is either a group (transform plus children) or a mesh
//! (a geometry and a material, both shared by id). Lights and fog hang off
//! the scene itself. The renderer never walks the tree directly; it asks for
//! a [`DrawItem`] list with world transforms already composed.

use thiserror::Error;

use crate::data_structures::{
    color::Color,
    geometry::Geometry,
    instance::Instance,
    material::Material,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub usize);

#[derive(Debug, Error, PartialEq)]
pub enum SceneError {
    #[error("unknown scene node {0:?}")]
    UnknownNode(NodeId),
    #[error("opaque mesh '{opaque}' is added after blended mesh '{blended}' under the same parent")]
    BlendOrder { blended: String, opaque: String },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeKind {
    Group,
    Mesh {
        geometry: GeometryId,
        material: MaterialId,
    },
}

#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub transform: Instance,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn group(name: impl Into<String>) -> Self {
        Self::with_kind(name, NodeKind::Group)
    }

    pub fn mesh(name: impl Into<String>, geometry: GeometryId, material: MaterialId) -> Self {
        Self::with_kind(name, NodeKind::Mesh { geometry, material })
    }

    fn with_kind(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            transform: Instance::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Instance) -> Self {
        self.transform = transform;
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Light {
    /// Parallel light shining from `position` towards the origin.
    Directional {
        color: Color,
        intensity: f32,
        position: cgmath::Vector3<f32>,
    },
    /// Sky colour from above blended into ground colour from below.
    Hemisphere {
        sky: Color,
        ground: Color,
        intensity: f32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Fog {
    /// `factor = 1 - exp(-(density * distance)^2)`
    Exp2 { color: Color, density: f32 },
}

/// One mesh ready to draw, with its composed world transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawItem {
    pub node: NodeId,
    pub geometry: GeometryId,
    pub material: MaterialId,
    pub world: Instance,
    pub blended: bool,
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<Option<Node>>,
    roots: Vec<NodeId>,
    geometries: Vec<Geometry>,
    materials: Vec<Material>,
    lights: Vec<Light>,
    pub fog: Option<Fog>,
    pub background: Color,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            background: Color::BLACK,
            ..Default::default()
        }
    }

    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryId {
        self.geometries.push(geometry);
        GeometryId(self.geometries.len() - 1)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&Geometry> {
        self.geometries.get(id.0)
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0)
    }

    pub fn geometries(&self) -> impl Iterator<Item = (GeometryId, &Geometry)> {
        self.geometries.iter().enumerate().map(|(i, g)| (GeometryId(i), g))
    }

    pub fn materials(&self) -> impl Iterator<Item = (MaterialId, &Material)> {
        self.materials.iter().enumerate().map(|(i, m)| (MaterialId(i), m))
    }

    /// Adds a node at the root of the scene.
    pub fn add(&mut self, mut node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = None;
        self.nodes.push(Some(node));
        self.roots.push(id);
        id
    }

    /// Adds a node as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, mut node: Node) -> Result<NodeId, SceneError> {
        if self.node(parent).is_none() {
            return Err(SceneError::UnknownNode(parent));
        }
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        self.nodes.push(Some(node));
        if let Some(parent) = self.node_mut(parent) {
            parent.children.push(id);
        }
        Ok(id)
    }

    /// Detaches a node and its whole subtree. Ids are never reused.
    pub fn remove(&mut self, id: NodeId) -> Result<Node, SceneError> {
        let node = self
            .nodes
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or(SceneError::UnknownNode(id))?;

        match node.parent {
            Some(parent) => {
                if let Some(parent) = self.node_mut(parent) {
                    parent.children.retain(|child| *child != id);
                }
            }
            None => self.roots.retain(|root| *root != id),
        }
        for child in &node.children {
            if let Err(err) = self.remove(*child) {
                log::warn!("Removing subtree of {:?}: {}", id, err);
            }
        }
        Ok(node)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn transform_mut(&mut self, id: NodeId) -> Result<&mut Instance, SceneError> {
        self.node_mut(id)
            .map(|node| &mut node.transform)
            .ok_or(SceneError::UnknownNode(id))
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Transform of `id` composed with all of its ancestors.
    pub fn world_transform(&self, id: NodeId) -> Result<Instance, SceneError> {
        let node = self.node(id).ok_or(SceneError::UnknownNode(id))?;
        match node.parent {
            Some(parent) => Ok(self.world_transform(parent)? * node.transform),
            None => Ok(node.transform),
        }
    }

    /// All meshes in depth-first traversal order.
    pub fn draw_list(&self) -> Vec<DrawItem> {
        let mut items = Vec::new();
        for root in &self.roots {
            self.collect(*root, Instance::new(), &mut items);
        }
        items
    }

    fn collect(&self, id: NodeId, parent_world: Instance, items: &mut Vec<DrawItem>) {
        let Some(node) = self.node(id) else {
            log::warn!("Scene graph references missing node {:?}", id);
            return;
        };
        let world = parent_world * node.transform;
        if let NodeKind::Mesh { geometry, material } = node.kind {
            let blended = self
                .material(material)
                .map(Material::is_blended)
                .unwrap_or(false);
            items.push(DrawItem {
                node: id,
                geometry,
                material,
                world,
                blended,
            });
        }
        for child in &node.children {
            self.collect(*child, world, items);
        }
    }

    /// Checks that, under every parent, no opaque mesh follows a blended one.
    pub fn check_blend_order(&self) -> Result<(), SceneError> {
        self.check_siblings(&self.roots)?;
        for node in self.nodes.iter().flatten() {
            self.check_siblings(&node.children)?;
        }
        Ok(())
    }

    fn check_siblings(&self, siblings: &[NodeId]) -> Result<(), SceneError> {
        let mut first_blended: Option<&Node> = None;
        for node in siblings.iter().filter_map(|id| self.node(*id)) {
            let NodeKind::Mesh { material, .. } = node.kind else {
                continue;
            };
            let blended = self
                .material(material)
                .map(Material::is_blended)
                .unwrap_or(false);
            match (blended, first_blended) {
                (true, None) => first_blended = Some(node),
                (false, Some(blended)) => {
                    return Err(SceneError::BlendOrder {
                        blended: blended.name.clone(),
                        opaque: node.name.clone(),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Distinct texture map paths referenced by materials, in first-use order.
    pub fn texture_sources(&self) -> Vec<String> {
        let mut sources: Vec<String> = Vec::new();
        for map in self.materials.iter().filter_map(|m| m.map.as_ref()) {
            if !sources.contains(map) {
                sources.push(map.clone());
            }
        }
        sources
    }
}
