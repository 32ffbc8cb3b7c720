// thumbnail/bounds.rs
use crate::scene::{Aabb, Scene};
use glam::Vec3;
use hecs::Entity;

/// Axis-aligned box as centre and size. All size components are >= 0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundsVolume {
    pub center: Vec3,
    pub size: Vec3,
}

impl BoundsVolume {
    pub fn new(center: Vec3, size: Vec3) -> Self {
        Self {
            center,
            size: size.max(Vec3::ZERO),
        }
    }

    pub fn point(center: Vec3) -> Self {
        Self::new(center, Vec3::ZERO)
    }

    pub fn from_aabb(aabb: &Aabb) -> Self {
        Self::new(aabb.center(), aabb.size())
    }

    pub fn max_extent(&self) -> f32 {
        self.size.max_element()
    }

    pub fn min(&self) -> Vec3 {
        self.center - self.size * 0.5
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.size * 0.5
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measured {
    pub bounds: BoundsVolume,
    /// No renderable parts were found; `bounds` is a point.
    pub degenerate: bool,
}

/// Union of the world boxes of every visible mesh under `entity`.
pub fn compute_bounds(scene: &Scene, entity: Entity) -> Measured {
    match union_all(&scene.renderable_bounds(entity)) {
        Some(aabb) => Measured {
            bounds: BoundsVolume::from_aabb(&aabb),
            degenerate: false,
        },
        None => Measured {
            bounds: BoundsVolume::point(scene.world_position(entity).unwrap_or(Vec3::ZERO)),
            degenerate: true,
        },
    }
}

pub fn union_all(boxes: &[Aabb]) -> Option<Aabb> {
    let (first, rest) = boxes.split_first()?;
    Some(rest.iter().fold(*first, |acc, b| acc.union(b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MeshSource, Prefab, PrefabNode};

    #[test]
    fn union_is_the_minimal_enclosing_box() {
        let boxes = [
            Aabb::new(Vec3::new(-1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 1.0)),
            Aabb::new(Vec3::new(2.0, -3.0, 0.5), Vec3::new(4.0, -2.0, 2.0)),
        ];
        let u = union_all(&boxes).expect("union");
        assert_eq!(u.min, Vec3::new(-1.0, -3.0, 0.0));
        assert_eq!(u.max, Vec3::new(4.0, 1.0, 2.0));
        assert!(union_all(&[]).is_none());
    }

    #[test]
    fn nested_children_contribute() {
        let mut scene = Scene::new();
        let prefab = Prefab::new(
            "Stack",
            PrefabNode::with_mesh("base", MeshSource::Cube { size: 2.0 }).with_child(
                PrefabNode::empty("arm").at(Vec3::new(0.0, 3.0, 0.0)).with_child(
                    PrefabNode::with_mesh("tip", MeshSource::Cube { size: 1.0 })
                        .at(Vec3::new(0.0, 1.0, 0.0)),
                ),
            ),
        );
        let root = scene.instantiate(&prefab, Vec3::ZERO).expect("spawn");

        let m = compute_bounds(&scene, root);
        assert!(!m.degenerate);
        assert!((m.bounds.min() - Vec3::new(-1.0, -1.0, -1.0)).length() < 1e-5);
        assert!((m.bounds.max() - Vec3::new(1.0, 4.5, 1.0)).length() < 1e-5);
    }

    #[test]
    fn no_renderables_gives_zero_box_at_reference_position() {
        let mut scene = Scene::new();
        let prefab = Prefab::new("Empty", PrefabNode::empty("root"));
        let pos = Vec3::new(3.0, -2.0, 1.0);
        let root = scene.instantiate(&prefab, pos).expect("spawn");

        let m = compute_bounds(&scene, root);
        assert!(m.degenerate);
        assert_eq!(m.bounds.size, Vec3::ZERO);
        assert_eq!(m.bounds.center, pos);
    }

    #[test]
    fn hidden_parts_are_ignored() {
        let mut scene = Scene::new();
        let mut hidden = PrefabNode::with_mesh("ghost", MeshSource::Cube { size: 10.0 });
        hidden.visible = false;
        let prefab = Prefab::new(
            "Mixed",
            PrefabNode::with_mesh("body", MeshSource::Cube { size: 1.0 }).with_child(hidden),
        );
        let root = scene.instantiate(&prefab, Vec3::ZERO).expect("spawn");
        let m = compute_bounds(&scene, root);
        assert!((m.bounds.size - Vec3::ONE).length() < 1e-5);
    }
}
