//! Scene graph the optimizer walks and edits
//!
//! Nodes live in a flat arena addressed by [`NodeId`]. Each node carries a
//! local transform, an activity flag, a `persistent` flag for nodes that belong
//! to a stored asset library rather than the live scene, and a list of
//! components.

use crate::mesh::TriangleMesh;
use crate::transform::Transform3D;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Index of a node inside a [`SceneGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Editor static flags, combined as a bit set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StaticFlags(u32);

impl StaticFlags {
    pub const NONE: Self = Self(0);
    pub const BATCHING: Self = Self(1 << 0);
    pub const OCCLUDEE: Self = Self(1 << 1);
    pub const OCCLUDER: Self = Self(1 << 2);
    pub const REFLECTION_PROBE: Self = Self(1 << 3);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

impl std::ops::BitOr for StaticFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// A drawable primitive: geometry plus the materials it is drawn with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshRenderer {
    pub mesh: Option<TriangleMesh>,
    /// Material asset paths; `None` entries are unassigned slots
    pub materials: Vec<Option<String>>,
    pub enabled: bool,
}

impl Default for MeshRenderer {
    fn default() -> Self {
        Self {
            mesh: None,
            materials: Vec::new(),
            enabled: true,
        }
    }
}

impl MeshRenderer {
    pub fn new(mesh: TriangleMesh, material: impl Into<String>) -> Self {
        Self {
            mesh: Some(mesh),
            materials: vec![Some(material.into())],
            enabled: true,
        }
    }

    /// The first material slot, which is the one shared by the whole mesh
    pub fn shared_material(&self) -> Option<&str> {
        self.materials.first()?.as_deref()
    }
}

/// One detail level of a [`Component::LodGroup`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LodLevel {
    /// Relative screen height below which the next level takes over
    pub screen_height: f32,
    pub renderers: Vec<NodeId>,
}

/// How a light contributes to lighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LightBakeType {
    #[default]
    Realtime,
    Mixed,
    /// Only present in lightmaps, no runtime cost
    Baked,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Light {
    pub bake_type: LightBakeType,
    pub intensity: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            bake_type: LightBakeType::Realtime,
            intensity: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Component {
    Renderer(MeshRenderer),
    Light(Light),
    Collider,
    Rigidbody,
    AudioSource { clip: Option<String> },
    LodGroup { levels: Vec<LodLevel> },
    /// A component whose script or type can no longer be resolved
    Missing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneNode {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub local: Transform3D,
    pub active: bool,
    pub persistent: bool,
    pub static_flags: StaticFlags,
    pub components: Vec<Component>,
}

impl Default for SceneNode {
    fn default() -> Self {
        Self {
            name: String::new(),
            parent: None,
            children: Vec::new(),
            local: Transform3D::identity(),
            active: true,
            persistent: false,
            static_flags: StaticFlags::NONE,
            components: Vec::new(),
        }
    }
}

impl SceneNode {
    pub fn renderer(&self) -> Option<&MeshRenderer> {
        self.components.iter().find_map(|c| match c {
            Component::Renderer(r) => Some(r),
            _ => None,
        })
    }

    pub fn renderer_mut(&mut self) -> Option<&mut MeshRenderer> {
        self.components.iter_mut().find_map(|c| match c {
            Component::Renderer(r) => Some(r),
            _ => None,
        })
    }

    pub fn has_collider(&self) -> bool {
        self.components.iter().any(|c| matches!(c, Component::Collider))
    }

    pub fn has_rigidbody(&self) -> bool {
        self.components.iter().any(|c| matches!(c, Component::Rigidbody))
    }

    pub fn light(&self) -> Option<&Light> {
        self.components.iter().find_map(|c| match c {
            Component::Light(l) => Some(l),
            _ => None,
        })
    }

    pub fn light_mut(&mut self) -> Option<&mut Light> {
        self.components.iter_mut().find_map(|c| match c {
            Component::Light(l) => Some(l),
            _ => None,
        })
    }

    pub fn lod_group(&self) -> Option<&[LodLevel]> {
        self.components.iter().find_map(|c| match c {
            Component::LodGroup { levels } => Some(levels.as_slice()),
            _ => None,
        })
    }

    pub fn missing_component_count(&self) -> usize {
        self.components
            .iter()
            .filter(|c| matches!(c, Component::Missing))
            .count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a top-level node
    pub fn add_root(&mut self, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(SceneNode {
            name: name.into(),
            ..Default::default()
        });
        id
    }

    /// Add a node under `parent` with an identity local transform
    pub fn add_child(&mut self, parent: NodeId, name: impl Into<String>) -> Result<NodeId> {
        self.check(parent)?;
        let id = NodeId(self.nodes.len());
        self.nodes.push(SceneNode {
            name: name.into(),
            parent: Some(parent),
            ..Default::default()
        });
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id.0)
    }

    /// Like [`node`](Self::node) but reports a missing id as an error
    pub fn get(&self, id: NodeId) -> Result<&SceneNode> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| Error::NotFound(format!("scene node {}", id.0)))
    }

    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut SceneNode> {
        self.nodes
            .get_mut(id.0)
            .ok_or_else(|| Error::NotFound(format!("scene node {}", id.0)))
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    /// Names from the root down to `id`, joined by `/`
    pub fn path_of(&self, id: NodeId) -> Result<String> {
        let mut names = vec![self.get(id)?.name.as_str()];
        let mut current = self.get(id)?.parent;
        while let Some(parent) = current {
            if names.len() > self.nodes.len() {
                return Err(Error::InvalidData(format!(
                    "scene node {} is part of a parent cycle",
                    id.0
                )));
            }
            let node = self.get(parent)?;
            names.push(node.name.as_str());
            current = node.parent;
        }
        names.reverse();
        Ok(names.join("/"))
    }

    /// First node whose [`path_of`](Self::path_of) equals `path`
    pub fn find_by_path(&self, path: &str) -> Option<NodeId> {
        self.ids()
            .find(|&id| self.path_of(id).is_ok_and(|p| p == path))
    }

    /// Topmost ancestor of `id`
    pub fn root_of(&self, id: NodeId) -> Result<NodeId> {
        let mut current = id;
        for _ in 0..=self.nodes.len() {
            match self.get(current)?.parent {
                Some(parent) => current = parent,
                None => return Ok(current),
            }
        }
        Err(Error::InvalidData(format!(
            "scene node {} is part of a parent cycle",
            id.0
        )))
    }

    /// Nodes of the live scene: every node, active or not, whose root is not
    /// a persistent asset.
    pub fn live_nodes(&self) -> Vec<NodeId> {
        self.ids()
            .filter(|&id| {
                self.root_of(id)
                    .ok()
                    .and_then(|root| self.node(root))
                    .is_some_and(|root| !root.persistent)
            })
            .collect()
    }

    /// `id` followed by all of its descendants in pre-order, inactive ones included
    pub fn descendants(&self, id: NodeId) -> Result<Vec<NodeId>> {
        self.check(id)?;
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if out.len() > self.nodes.len() {
                return Err(Error::InvalidData(format!(
                    "scene node {} is part of a child cycle",
                    id.0
                )));
            }
            out.push(current);
            let node = self.get(current)?;
            stack.extend(node.children.iter().rev().copied());
        }
        Ok(out)
    }

    pub fn local_to_world(&self, id: NodeId) -> Result<Transform3D> {
        let mut transform = self.get(id)?.local;
        let mut current = self.get(id)?.parent;
        let mut steps = 0;
        while let Some(parent) = current {
            steps += 1;
            if steps > self.nodes.len() {
                return Err(Error::InvalidData(format!(
                    "scene node {} is part of a parent cycle",
                    id.0
                )));
            }
            let node = self.get(parent)?;
            transform = node.local * transform;
            current = node.parent;
        }
        Ok(transform)
    }

    pub fn world_to_local(&self, id: NodeId) -> Result<Transform3D> {
        self.local_to_world(id)?.inverse().ok_or_else(|| {
            Error::InvalidData(format!("scene node {} has a singular transform", id.0))
        })
    }

    /// Check parent/child links for consistency, e.g. after loading from disk
    pub fn validate(&self) -> Result<()> {
        for id in self.ids() {
            let node = &self.nodes[id.0];
            if let Some(parent) = node.parent {
                let parent_node = self.get(parent)?;
                if !parent_node.children.contains(&id) {
                    return Err(Error::InvalidData(format!(
                        "scene node {} names {} as parent but is not among its children",
                        id.0, parent.0
                    )));
                }
            }
            for &child in &node.children {
                if self.get(child)?.parent != Some(id) {
                    return Err(Error::InvalidData(format!(
                        "scene node {} lists {} as child but the child disagrees",
                        id.0, child.0
                    )));
                }
            }
            self.root_of(id)?;
        }
        Ok(())
    }

    fn check(&self, id: NodeId) -> Result<()> {
        self.get(id).map(|_| ())
    }
}
