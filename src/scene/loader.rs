// scene/loader.rs
//
// Turns files on disk into prefabs. glTF meshes are registered in the scene's
// asset store up front so instantiation only has to reference handles.

use super::prefab::{MeshSource, NodeTransform, Prefab, PrefabError, PrefabNode};
use crate::asset::Mesh;
use crate::renderer::vertex::v;
use crate::renderer::Vertex;
use crate::scene::Scene;
use glam::Vec3;
use std::path::Path;

pub struct PrefabLoader;

impl PrefabLoader {
    /// Loads a `.json` prefab or imports a `.gltf`/`.glb` model.
    pub fn load(path: &Path, scene: &mut Scene) -> Result<Prefab, PrefabError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("json") => Prefab::load_json(path),
            Some("gltf") | Some("glb") => Self::import_gltf(path, scene),
            _ => Err(PrefabError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    pub fn import_gltf(path: &Path, scene: &mut Scene) -> Result<Prefab, PrefabError> {
        let (document, buffers, _images) =
            gltf::import(path).map_err(|source| PrefabError::Gltf {
                path: path.to_path_buf(),
                source,
            })?;

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());

        let Some(gltf_scene) = document
            .default_scene()
            .or_else(|| document.scenes().next())
        else {
            return Err(PrefabError::EmptyModel {
                path: path.to_path_buf(),
            });
        };

        let mut root = PrefabNode::empty(name.clone());
        for node in gltf_scene.nodes() {
            root.children.push(Self::load_node(&node, &buffers, scene));
        }
        if root.children.is_empty() {
            return Err(PrefabError::EmptyModel {
                path: path.to_path_buf(),
            });
        }

        let prefab = Prefab::new(name, root);
        log::info!(
            "Imported glTF {:?}: {} nodes, {} renderable",
            path,
            prefab.node_count(),
            prefab.renderable_count()
        );
        Ok(prefab)
    }

    fn load_node(node: &gltf::Node, buffers: &[gltf::buffer::Data], scene: &mut Scene) -> PrefabNode {
        let node_name = node.name().unwrap_or("Unnamed").to_string();
        let (translation, rotation, scale) = node.transform().decomposed();

        let mut out = PrefabNode::empty(node_name.clone());
        out.transform = NodeTransform {
            translation,
            rotation,
            scale,
        };

        if let Some(mesh) = node.mesh() {
            let primitives: Vec<_> = mesh
                .primitives()
                .filter_map(|primitive| Self::load_primitive(&primitive, buffers, scene, &node_name))
                .collect();

            // a single primitive lives on the node itself, several become children
            if primitives.len() == 1 {
                let (source, color) = primitives[0];
                out.mesh = Some(source);
                out.color = color;
            } else {
                for (i, (source, color)) in primitives.into_iter().enumerate() {
                    out.children.push(
                        PrefabNode::with_mesh(format!("{node_name}.{i}"), source).with_color(color),
                    );
                }
            }
        }

        for child in node.children() {
            out.children.push(Self::load_node(&child, buffers, scene));
        }
        out
    }

    fn load_primitive(
        primitive: &gltf::Primitive,
        buffers: &[gltf::buffer::Data],
        scene: &mut Scene,
        node_name: &str,
    ) -> Option<(MeshSource, [f32; 4])> {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            log::warn!(
                "Skipping non-triangle primitive ({:?}) on node '{}'",
                primitive.mode(),
                node_name
            );
            return None;
        }

        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

        let Some(positions) = reader.read_positions().map(|p| p.collect::<Vec<_>>()) else {
            log::warn!("Primitive on node '{}' has no positions", node_name);
            return None;
        };

        let indices = reader
            .read_indices()
            .map(|i| i.into_u32().collect::<Vec<_>>())
            .unwrap_or_else(|| (0..positions.len() as u32).collect());

        let normals = reader
            .read_normals()
            .map(|n| n.collect::<Vec<_>>())
            .unwrap_or_else(|| flat_normals(&positions, &indices));

        let vertices: Vec<Vertex> = positions
            .iter()
            .zip(normals.iter())
            .map(|(pos, normal)| v(*pos, *normal))
            .collect();

        let mesh = match Mesh::new(vertices, indices) {
            Ok(mesh) => mesh,
            Err(err) => {
                log::warn!("Skipping primitive on node '{}': {}", node_name, err);
                return None;
            }
        };

        log::trace!(
            "    Primitive on '{}': {} triangles",
            node_name,
            mesh.triangle_count()
        );

        let color = primitive
            .material()
            .pbr_metallic_roughness()
            .base_color_factor();
        Some((MeshSource::Asset(scene.add_mesh(mesh)), color))
    }
}

/// Per-vertex normals accumulated from the faces that use each vertex.
fn flat_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut accum = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| i as usize);
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let (pa, pb, pc) = (
            Vec3::from(positions[a]),
            Vec3::from(positions[b]),
            Vec3::from(positions[c]),
        );
        let n = (pb - pa).cross(pc - pa);
        for i in [a, b, c] {
            accum[i] += n;
        }
    }
    accum
        .into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
        .collect()
}
