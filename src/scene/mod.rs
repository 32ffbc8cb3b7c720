// scene/mod.rs

pub mod aabb;
pub mod builder;
pub mod camera;
pub mod components;
pub(crate) mod internal;
pub mod loader;
pub mod prefab;
pub mod scene;
pub mod transform;

pub use aabb::Aabb;
pub use builder::EntityBuilder;
pub use camera::{Camera, ClearFlags};
pub use loader::PrefabLoader;
pub use prefab::{MeshSource, NodeTransform, Prefab, PrefabError, PrefabNode};
pub use scene::{Scene, SceneError};
pub use transform::Transform;

pub use components::{
    Children, MaterialComponent, MeshComponent, Name, Parent, TransformComponent, Visible,
    WorldTransform,
};
