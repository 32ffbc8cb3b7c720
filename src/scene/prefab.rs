//! Source objects for thumbnail batches.
//!
//! A [`Prefab`] is an immutable node tree. [`Scene::instantiate`] spawns a
//! live copy of it; the prefab itself never enters the world.
//!
//! [`Scene::instantiate`]: crate::scene::Scene::instantiate

use crate::asset::{Handle, Mesh};
use crate::scene::Transform;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum PrefabError {
    #[error("failed to read {path}: {message}")]
    Read { path: PathBuf, message: String },
    #[error("failed to parse prefab {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to import glTF {path}: {source}")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },
    #[error("{path} contains no scene nodes")]
    EmptyModel { path: PathBuf },
    #[error("unsupported prefab format: {0}")]
    UnsupportedFormat(PathBuf),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prefab {
    pub name: String,
    pub root: PrefabNode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefabNode {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub transform: NodeTransform,
    #[serde(default)]
    pub mesh: Option<MeshSource>,
    #[serde(default = "PrefabNode::default_color")]
    pub color: [f32; 4],
    #[serde(default = "PrefabNode::default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub children: Vec<PrefabNode>,
}

impl PrefabNode {
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: NodeTransform::default(),
            mesh: None,
            color: Self::default_color(),
            visible: Self::default_visible(),
            children: Vec::new(),
        }
    }

    pub fn with_mesh(name: impl Into<String>, mesh: MeshSource) -> Self {
        Self {
            mesh: Some(mesh),
            ..Self::empty(name)
        }
    }

    pub fn at(mut self, translation: Vec3) -> Self {
        self.transform.translation = translation.to_array();
        self
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    pub fn with_child(mut self, child: PrefabNode) -> Self {
        self.children.push(child);
        self
    }

    /// Depth-first iteration over this node and its descendants.
    pub fn walk(&self) -> Vec<&PrefabNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    const fn default_visible() -> bool {
        true
    }

    const fn default_color() -> [f32; 4] {
        [0.8, 0.8, 0.8, 1.0]
    }
}

/// JSON-friendly TRS; rotation is a quaternion in `[x, y, z, w]` order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeTransform {
    #[serde(default)]
    pub translation: [f32; 3],
    #[serde(default = "NodeTransform::identity_rotation")]
    pub rotation: [f32; 4],
    #[serde(default = "NodeTransform::unit_scale")]
    pub scale: [f32; 3],
}

impl NodeTransform {
    const fn identity_rotation() -> [f32; 4] {
        [0.0, 0.0, 0.0, 1.0]
    }

    const fn unit_scale() -> [f32; 3] {
        [1.0, 1.0, 1.0]
    }

    pub fn to_transform(&self) -> Transform {
        let rotation = Quat::from_array(self.rotation);
        let rotation = if rotation.length_squared() > 0.0 {
            rotation.normalize()
        } else {
            Quat::IDENTITY
        };
        Transform::from_trs(
            Vec3::from(self.translation),
            rotation,
            Vec3::from(self.scale),
        )
    }
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self {
            translation: [0.0; 3],
            rotation: Self::identity_rotation(),
            scale: Self::unit_scale(),
        }
    }
}

/// Geometry attached to a prefab node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "primitive", rename_all = "snake_case")]
pub enum MeshSource {
    Cube {
        #[serde(default = "MeshSource::unit")]
        size: f32,
    },
    Sphere {
        #[serde(default = "MeshSource::half")]
        radius: f32,
        #[serde(default = "MeshSource::default_segments")]
        segments: u32,
        #[serde(default = "MeshSource::default_rings")]
        rings: u32,
    },
    Plane {
        #[serde(default = "MeshSource::unit")]
        size: f32,
    },
    /// Mesh already registered in the scene's asset store (glTF imports).
    #[serde(skip)]
    Asset(Handle<Mesh>),
}

impl MeshSource {
    const fn unit() -> f32 {
        1.0
    }

    const fn half() -> f32 {
        0.5
    }

    const fn default_segments() -> u32 {
        24
    }

    const fn default_rings() -> u32 {
        12
    }
}

impl Prefab {
    pub fn new(name: impl Into<String>, root: PrefabNode) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }

    pub fn from_json_str(json: &str, origin: &Path) -> Result<Self, PrefabError> {
        serde_json::from_str(json).map_err(|source| PrefabError::Json {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Loads a JSON prefab description.
    pub fn load_json(path: &Path) -> Result<Self, PrefabError> {
        let bytes = crate::io::load_binary(path).map_err(|message| PrefabError::Read {
            path: path.to_path_buf(),
            message,
        })?;
        let text = String::from_utf8_lossy(&bytes);
        let prefab = Self::from_json_str(&text, path)?;
        log::debug!(
            "Loaded prefab '{}' with {} nodes from {:?}",
            prefab.name,
            prefab.node_count(),
            path
        );
        Ok(prefab)
    }

    pub fn node_count(&self) -> usize {
        self.root.walk().len()
    }

    pub fn renderable_count(&self) -> usize {
        self.root
            .walk()
            .into_iter()
            .filter(|n| n.visible && n.mesh.is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_prefab_fills_defaults() {
        let json = r#"{
            "name": "Crate",
            "root": {
                "name": "body",
                "mesh": { "primitive": "cube", "size": 2.0 },
                "children": [
                    { "name": "lid", "transform": { "translation": [0, 1, 0] },
                      "mesh": { "primitive": "plane" } },
                    { "name": "anchor" }
                ]
            }
        }"#;
        let prefab = Prefab::from_json_str(json, Path::new("crate.json")).unwrap();
        assert_eq!(prefab.name, "Crate");
        assert_eq!(prefab.root.mesh, Some(MeshSource::Cube { size: 2.0 }));
        assert_eq!(prefab.root.children[0].mesh, Some(MeshSource::Plane { size: 1.0 }));
        assert_eq!(prefab.root.children[0].transform.scale, [1.0; 3]);
        assert!(prefab.root.visible);
        assert_eq!(prefab.node_count(), 3);
        assert_eq!(prefab.renderable_count(), 2);
    }

    #[test]
    fn invalid_json_reports_path() {
        let err = Prefab::from_json_str("{", Path::new("broken.json")).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn zero_quaternion_becomes_identity() {
        let t = NodeTransform {
            rotation: [0.0; 4],
            ..NodeTransform::default()
        };
        assert_eq!(t.to_transform().rotation, Quat::IDENTITY);
    }

    #[test]
    fn walk_is_depth_first_in_order() {
        let root = PrefabNode::empty("a")
            .with_child(PrefabNode::empty("b").with_child(PrefabNode::empty("c")))
            .with_child(PrefabNode::empty("d"));
        let names: Vec<_> = root.walk().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c", "d"]);
    }
}
