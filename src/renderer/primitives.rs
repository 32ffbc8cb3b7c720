use super::vertex::{v, Vertex};
use std::f32::consts::PI;

pub const MAX_SPHERE_SEGMENTS: u32 = 512;
pub const MAX_SPHERE_RINGS: u32 = 256;

/// UV sphere centred on the origin. Tessellation is clamped to
/// `MAX_SPHERE_SEGMENTS` x `MAX_SPHERE_RINGS`.
pub fn sphere_mesh(radius: f32, segments: u32, rings: u32) -> (Vec<Vertex>, Vec<u32>) {
    let segments = segments.clamp(3, MAX_SPHERE_SEGMENTS);
    let rings = rings.clamp(2, MAX_SPHERE_RINGS);
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for ring in 0..=rings {
        let phi = PI * ring as f32 / rings as f32;
        let y = phi.cos();
        let ring_radius = phi.sin();

        for segment in 0..=segments {
            let theta = 2.0 * PI * segment as f32 / segments as f32;
            let x = ring_radius * theta.cos();
            let z = ring_radius * theta.sin();

            // unit sphere: position is the normal
            vertices.push(v([x * radius, y * radius, z * radius], [x, y, z]));
        }
    }

    for ring in 0..rings {
        for segment in 0..segments {
            let current = ring * (segments + 1) + segment;
            let next = current + segments + 1;

            indices.extend_from_slice(&[current, next, current + 1]);
            indices.extend_from_slice(&[current + 1, next, next + 1]);
        }
    }

    (vertices, indices)
}

/// Axis-aligned cube with edge length `size`, centred on the origin.
pub fn cube_mesh(size: f32) -> (Vec<Vertex>, Vec<u32>) {
    let h = size * 0.5;
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        (
            [1.0, 0.0, 0.0],
            [[h, -h, -h], [h, h, -h], [h, h, h], [h, -h, h]],
        ),
        (
            [-1.0, 0.0, 0.0],
            [[-h, -h, h], [-h, h, h], [-h, h, -h], [-h, -h, -h]],
        ),
        (
            [0.0, 1.0, 0.0],
            [[-h, h, -h], [-h, h, h], [h, h, h], [h, h, -h]],
        ),
        (
            [0.0, -1.0, 0.0],
            [[-h, -h, h], [-h, -h, -h], [h, -h, -h], [h, -h, h]],
        ),
        (
            [0.0, 0.0, 1.0],
            [[h, -h, h], [h, h, h], [-h, h, h], [-h, -h, h]],
        ),
        (
            [0.0, 0.0, -1.0],
            [[-h, -h, -h], [-h, h, -h], [h, h, -h], [h, -h, -h]],
        ),
    ];

    let verts = faces
        .iter()
        .flat_map(|(normal, corners)| corners.iter().map(move |&p| v(p, *normal)))
        .collect::<Vec<_>>();

    let idx = (0..6u32)
        .flat_map(|f| {
            let o = f * 4;
            [o, o + 1, o + 2, o, o + 2, o + 3]
        })
        .collect::<Vec<_>>();

    (verts, idx)
}

/// Square in the XZ plane facing +Y.
pub fn plane_mesh(size: f32) -> (Vec<Vertex>, Vec<u32>) {
    let h = size * 0.5;
    let up = [0.0, 1.0, 0.0];
    let verts = vec![
        v([-h, 0.0, -h], up),
        v([-h, 0.0, h], up),
        v([h, 0.0, h], up),
        v([h, 0.0, -h], up),
    ];
    (verts, vec![0, 1, 2, 0, 2, 3])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_counts_look_right() {
        let (v, i) = cube_mesh(1.0);
        assert_eq!(v.len(), 24);
        assert_eq!(i.len(), 36);
    }

    #[test]
    fn cube_extent_follows_size() {
        let (v, _) = cube_mesh(3.0);
        let max = v
            .iter()
            .flat_map(|v| v.pos)
            .fold(f32::MIN, f32::max);
        assert!((max - 1.5).abs() < 1e-6);
    }

    #[test]
    fn sphere_indices_stay_in_range() {
        let (v, i) = sphere_mesh(2.0, 8, 4);
        assert!(i.iter().all(|&idx| (idx as usize) < v.len()));
        assert_eq!(i.len() % 3, 0);
    }

    #[test]
    fn sphere_tessellation_is_clamped() {
        let (v, i) = sphere_mesh(1.0, u32::MAX, u32::MAX);
        let expected = (MAX_SPHERE_RINGS as usize + 1) * (MAX_SPHERE_SEGMENTS as usize + 1);
        assert_eq!(v.len(), expected);
        assert!(i.iter().all(|&idx| (idx as usize) < v.len()));
    }

    #[test]
    fn plane_is_flat() {
        let (v, i) = plane_mesh(4.0);
        assert!(v.iter().all(|v| v.pos[1] == 0.0));
        assert_eq!(i.len(), 6);
    }
}
