// scene/scene.rs
use super::components::*;
use super::internal::transforms;
use super::prefab::{MeshSource, Prefab, PrefabNode};
use crate::asset::{Assets, Handle, Mesh, MeshError};
use crate::renderer::primitives::{cube_mesh, plane_mesh, sphere_mesh};
use crate::renderer::Material;
use crate::scene::{Aabb, EntityBuilder, Transform};
use glam::Vec3;
use hecs::{Entity, World};
use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("node '{node}' references mesh {mesh:?} which is not loaded")]
    MissingMesh { node: String, mesh: Handle<Mesh> },
    #[error("node '{node}' has invalid geometry: {source}")]
    Mesh {
        node: String,
        #[source]
        source: MeshError,
    },
}

/// Primitive parameters as exact bit patterns, so equal requests share a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum PrimitiveKey {
    Cube(u32),
    Sphere(u32, u32, u32),
    Plane(u32),
}

pub struct Scene {
    pub world: World,
    pub assets: Assets,
    primitives: HashMap<PrimitiveKey, Handle<Mesh>>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            assets: Assets::default(),
            primitives: HashMap::new(),
        }
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> Handle<Mesh> {
        self.assets.meshes.insert(mesh)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.world.contains(entity)
    }

    pub fn entity_count(&self) -> u32 {
        self.world.len()
    }

    pub fn update_transforms(&mut self) {
        transforms::propagate_transforms(&mut self.world);
    }

    /// Spawns a live copy of `prefab` with its root placed at `position`.
    ///
    /// All meshes are resolved before anything is spawned, so a failed
    /// instantiation leaves the world untouched.
    pub fn instantiate(&mut self, prefab: &Prefab, position: Vec3) -> Result<Entity, SceneError> {
        let nodes = prefab.root.walk();
        let mut meshes = Vec::with_capacity(nodes.len());
        for node in &nodes {
            meshes.push(self.resolve_mesh(node)?);
        }

        // spawn_node visits nodes in the same pre-order as walk()
        let mut meshes = meshes.into_iter();
        let root = self.spawn_node(&prefab.root, &prefab.name, None, &mut meshes);
        if let Ok(mut t) = self.world.get::<&mut TransformComponent>(root) {
            t.0.translation = position;
        }
        transforms::propagate_subtree(&mut self.world, root, Transform::IDENTITY);

        log::debug!(
            "Instantiated '{}' as {:?} ({} entities)",
            prefab.name,
            root,
            nodes.len()
        );
        Ok(root)
    }

    fn spawn_node(
        &mut self,
        node: &PrefabNode,
        fallback_name: &str,
        parent: Option<Entity>,
        meshes: &mut impl Iterator<Item = Option<Handle<Mesh>>>,
    ) -> Entity {
        let name = if node.name.is_empty() {
            fallback_name.to_string()
        } else {
            node.name.clone()
        };
        let mut builder = EntityBuilder::new(&mut self.world)
            .with_name(name)
            .with_transform(node.transform.to_transform())
            .visible(node.visible);
        if let Some(mesh) = meshes.next().flatten() {
            builder = builder
                .with_mesh(mesh)
                .with_material(Material::new(node.color));
        }
        if let Some(parent) = parent {
            builder = builder.with_parent(parent);
        }
        let entity = builder.spawn();

        if let Some(parent) = parent {
            self.attach_child(parent, entity);
        }
        for child in &node.children {
            self.spawn_node(child, fallback_name, Some(entity), meshes);
        }
        entity
    }

    /// Despawns `entity` and all of its descendants. Returns how many
    /// entities were removed.
    pub fn destroy(&mut self, entity: Entity) -> usize {
        if !self.world.contains(entity) {
            return 0;
        }

        let parent = self.world.get::<&Parent>(entity).ok().map(|p| p.0);
        if let Some(parent) = parent {
            if let Ok(mut children) = self.world.get::<&mut Children>(parent) {
                children.0.retain(|&c| c != entity);
            }
        }

        let doomed = self.descendants(entity);
        let mut removed = 0;
        for e in doomed {
            if self.world.despawn(e).is_ok() {
                removed += 1;
            }
        }
        log::trace!("Destroyed {:?} ({} entities)", entity, removed);
        removed
    }

    /// `entity` followed by every entity below it.
    pub fn descendants(&self, entity: Entity) -> Vec<Entity> {
        let mut out = Vec::new();
        let mut stack = vec![entity];
        while let Some(e) = stack.pop() {
            if !self.world.contains(e) {
                continue;
            }
            out.push(e);
            if let Ok(children) = self.world.get::<&Children>(e) {
                stack.extend(children.0.iter().rev().copied());
            }
        }
        out
    }

    pub fn world_transform(&self, entity: Entity) -> Option<Transform> {
        if let Ok(wt) = self.world.get::<&WorldTransform>(entity) {
            return Some(wt.0);
        }
        self.world
            .get::<&TransformComponent>(entity)
            .ok()
            .map(|t| t.0)
    }

    pub fn world_position(&self, entity: Entity) -> Option<Vec3> {
        self.world_transform(entity).map(|t| t.translation)
    }

    /// World-space boxes of every visible mesh in the subtree under `entity`.
    pub fn renderable_bounds(&self, entity: Entity) -> Vec<Aabb> {
        self.descendants(entity)
            .into_iter()
            .filter_map(|e| {
                let visible = self.world.get::<&Visible>(e).map(|v| v.0).unwrap_or(true);
                if !visible {
                    return None;
                }
                let mesh = self.world.get::<&MeshComponent>(e).ok()?.0;
                let local = self.assets.meshes.get(mesh)?.local_bounds()?;
                let world = self.world_transform(e)?;
                Some(local.transformed(&world.matrix()))
            })
            .collect()
    }

    fn attach_child(&mut self, parent: Entity, child: Entity) {
        let appended = match self.world.get::<&mut Children>(parent) {
            Ok(mut children) => {
                children.0.push(child);
                true
            }
            Err(_) => false,
        };
        if !appended {
            if let Err(e) = self.world.insert_one(parent, Children(vec![child])) {
                log::error!("Failed to attach {:?} to {:?}: {:?}", child, parent, e);
            }
        }
    }

    fn resolve_mesh(&mut self, node: &PrefabNode) -> Result<Option<Handle<Mesh>>, SceneError> {
        let Some(source) = node.mesh else {
            return Ok(None);
        };

        let key = match source {
            MeshSource::Asset(handle) => {
                if self.assets.meshes.contains(handle) {
                    return Ok(Some(handle));
                }
                return Err(SceneError::MissingMesh {
                    node: node.name.clone(),
                    mesh: handle,
                });
            }
            MeshSource::Cube { size } => PrimitiveKey::Cube(size.to_bits()),
            MeshSource::Sphere {
                radius,
                segments,
                rings,
            } => PrimitiveKey::Sphere(radius.to_bits(), segments, rings),
            MeshSource::Plane { size } => PrimitiveKey::Plane(size.to_bits()),
        };

        if let Some(&handle) = self.primitives.get(&key) {
            return Ok(Some(handle));
        }

        let (vertices, indices) = key.generate();
        let mesh = Mesh::new(vertices, indices).map_err(|source| SceneError::Mesh {
            node: node.name.clone(),
            source,
        })?;
        let handle = self.add_mesh(mesh);
        self.primitives.insert(key, handle);
        Ok(Some(handle))
    }
}

impl PrimitiveKey {
    fn generate(self) -> (Vec<crate::renderer::Vertex>, Vec<u32>) {
        match self {
            PrimitiveKey::Cube(size) => cube_mesh(f32::from_bits(size)),
            PrimitiveKey::Sphere(radius, segments, rings) => {
                sphere_mesh(f32::from_bits(radius), segments, rings)
            }
            PrimitiveKey::Plane(size) => plane_mesh(f32::from_bits(size)),
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::prefab::PrefabNode;

    fn two_cubes() -> Prefab {
        Prefab::new(
            "Pair",
            PrefabNode::with_mesh("left", MeshSource::Cube { size: 2.0 }).with_child(
                PrefabNode::with_mesh("right", MeshSource::Cube { size: 2.0 })
                    .at(Vec3::new(4.0, 0.0, 0.0)),
            ),
        )
    }

    #[test]
    fn instantiate_places_root_and_links_children() {
        let mut scene = Scene::new();
        let root = scene.instantiate(&two_cubes(), Vec3::ZERO).unwrap();

        let children = scene.world.get::<&Children>(root).unwrap().0.clone();
        assert_eq!(children.len(), 1);
        let child_pos = scene.world_position(children[0]).unwrap();
        assert_eq!(child_pos, Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(scene.entity_count(), 2);
    }

    #[test]
    fn root_translation_is_replaced_by_position() {
        let mut scene = Scene::new();
        let prefab = Prefab::new(
            "Offset",
            PrefabNode::with_mesh("body", MeshSource::Cube { size: 1.0 }).at(Vec3::splat(9.0)),
        );
        let root = scene.instantiate(&prefab, Vec3::new(1.0, 0.0, 0.0)).unwrap();
        assert_eq!(scene.world_position(root), Some(Vec3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn destroy_removes_whole_subtree() {
        let mut scene = Scene::new();
        let before = scene.entity_count();
        let root = scene.instantiate(&two_cubes(), Vec3::ZERO).unwrap();
        assert_eq!(scene.destroy(root), 2);
        assert_eq!(scene.entity_count(), before);
        assert!(!scene.contains(root));
        assert_eq!(scene.destroy(root), 0);
    }

    #[test]
    fn renderable_bounds_are_world_space() {
        let mut scene = Scene::new();
        let root = scene.instantiate(&two_cubes(), Vec3::ZERO).unwrap();
        let boxes = scene.renderable_bounds(root);
        assert_eq!(boxes.len(), 2);
        assert!(boxes
            .iter()
            .any(|b| b.center().abs_diff_eq(Vec3::new(4.0, 0.0, 0.0), 1e-6)));
    }

    #[test]
    fn hidden_nodes_are_not_measured() {
        let mut scene = Scene::new();
        let mut node = PrefabNode::with_mesh("ghost", MeshSource::Cube { size: 1.0 });
        node.visible = false;
        let root = scene.instantiate(&Prefab::new("Ghost", node), Vec3::ZERO).unwrap();
        assert!(scene.renderable_bounds(root).is_empty());
    }

    #[test]
    fn missing_asset_spawns_nothing() {
        let mut scene = Scene::new();
        let prefab = Prefab::new(
            "Broken",
            PrefabNode::with_mesh("ok", MeshSource::Cube { size: 1.0 }).with_child(
                PrefabNode::with_mesh("bad", MeshSource::Asset(Handle::new(42))),
            ),
        );
        let err = scene.instantiate(&prefab, Vec3::ZERO).unwrap_err();
        assert!(matches!(err, SceneError::MissingMesh { .. }));
        assert_eq!(scene.entity_count(), 0);
    }

    #[test]
    fn identical_primitives_share_one_mesh() {
        let mut scene = Scene::new();
        let a = scene.instantiate(&two_cubes(), Vec3::ZERO).unwrap();
        scene.destroy(a);
        scene.instantiate(&two_cubes(), Vec3::ZERO).unwrap();
        assert_eq!(scene.assets.meshes.len(), 1);
    }
}
