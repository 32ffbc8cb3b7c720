// scene/builder.rs
// Fluent wrapper over hecs::EntityBuilder

use hecs::World;

use super::components::*;
use crate::asset::Handle;
use crate::asset::Mesh;
use crate::renderer::Material;
use crate::scene::{Camera, Transform};

pub struct EntityBuilder<'w> {
    world: &'w mut World,
    builder: hecs::EntityBuilder,
}

impl<'w> EntityBuilder<'w> {
    pub fn new(world: &'w mut World) -> Self {
        Self {
            world,
            builder: hecs::EntityBuilder::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.builder.add(Name::new(name));
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.builder.add(TransformComponent(transform));
        self
    }

    pub fn with_mesh(mut self, mesh: Handle<Mesh>) -> Self {
        self.builder.add(MeshComponent(mesh));
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.builder.add(MaterialComponent(material));
        self
    }

    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.builder.add(camera);
        self
    }

    pub fn with_parent(mut self, parent: hecs::Entity) -> Self {
        self.builder.add(Parent(parent));
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.builder.add(Visible(visible));
        self
    }

    pub fn spawn(&mut self) -> hecs::Entity {
        self.world.spawn(self.builder.build())
    }
}
