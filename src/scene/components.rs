// scene/components.rs
// Plain hecs components

use crate::asset::Handle;
use crate::asset::Mesh;
use crate::renderer::Material;
use crate::scene::Transform;

// ============================================================================
// Core Rendering Components
// ============================================================================

/// Local transform (relative to `Parent`, or world space for roots)
#[derive(Debug, Clone, Copy)]
pub struct TransformComponent(pub Transform);

/// World-space transform (computed from hierarchy)
#[derive(Debug, Clone, Copy)]
pub struct WorldTransform(pub Transform);

#[derive(Debug, Clone, Copy)]
pub struct MeshComponent(pub Handle<Mesh>);

#[derive(Debug, Clone, Copy)]
pub struct MaterialComponent(pub Material);

/// Hidden entities are neither drawn nor measured.
#[derive(Debug, Clone, Copy)]
pub struct Visible(pub bool);

impl Default for Visible {
    fn default() -> Self {
        Self(true)
    }
}

// ============================================================================
// Utility Components
// ============================================================================

#[derive(Debug, Clone)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

// ============================================================================
// Hierarchy Components
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct Parent(pub hecs::Entity);

#[derive(Debug, Clone)]
pub struct Children(pub Vec<hecs::Entity>);
