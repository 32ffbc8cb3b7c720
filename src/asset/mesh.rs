use crate::renderer::Vertex;
use crate::scene::Aabb;
use glam::Vec3;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("index count {0} is not a multiple of 3")]
    NotTriangles(usize),
    #[error("index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
}

/// Indexed triangle list kept on the CPU.
///
/// Both render backends consume the same data; the GPU backend uploads it
/// per frame, so no device buffers live here.
#[derive(Debug, Clone)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    local_bounds: Option<Aabb>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Result<Self, MeshError> {
        if indices.len() % 3 != 0 {
            return Err(MeshError::NotTriangles(indices.len()));
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(MeshError::IndexOutOfRange {
                index,
                vertex_count: vertices.len(),
            });
        }

        let local_bounds = Aabb::from_points(vertices.iter().map(|v| Vec3::from(v.pos)));

        Ok(Self {
            vertices,
            indices,
            local_bounds,
        })
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// `None` for a mesh without vertices.
    pub fn local_bounds(&self) -> Option<Aabb> {
        self.local_bounds
    }

    /// Iterates triangles as vertex triples.
    pub fn triangles(&self) -> impl Iterator<Item = [&Vertex; 3]> + '_ {
        self.indices.chunks_exact(3).map(move |tri| {
            [
                &self.vertices[tri[0] as usize],
                &self.vertices[tri[1] as usize],
                &self.vertices[tri[2] as usize],
            ]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::primitives::cube_mesh;
    use crate::renderer::vertex::v;

    #[test]
    fn cube_bounds_match_size() {
        let (verts, idx) = cube_mesh(2.0);
        let mesh = Mesh::new(verts, idx).unwrap();
        let bounds = mesh.local_bounds().unwrap();
        assert_eq!(bounds.min, Vec3::splat(-1.0));
        assert_eq!(bounds.max, Vec3::splat(1.0));
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn rejects_out_of_range_index() {
        let verts = vec![v([0.0; 3], [0.0, 1.0, 0.0]); 2];
        let err = Mesh::new(verts, vec![0, 1, 2]).unwrap_err();
        assert_eq!(
            err,
            MeshError::IndexOutOfRange {
                index: 2,
                vertex_count: 2
            }
        );
    }

    #[test]
    fn rejects_partial_triangle() {
        let verts = vec![v([0.0; 3], [0.0, 1.0, 0.0]); 3];
        assert_eq!(
            Mesh::new(verts, vec![0, 1]).unwrap_err(),
            MeshError::NotTriangles(2)
        );
    }

    #[test]
    fn empty_mesh_has_no_bounds() {
        let mesh = Mesh::new(Vec::new(), Vec::new()).unwrap();
        assert!(mesh.local_bounds().is_none());
        assert_eq!(mesh.triangles().count(), 0);
    }
}
