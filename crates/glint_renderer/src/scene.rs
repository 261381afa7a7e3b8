//! Scene representation: flat collections of renderable primitives.

use glint_core::Mesh;
use glint_math::Vec3;

use crate::material::MaterialHandle;

/// A sphere primitive.
#[derive(Debug, Clone, Copy)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
    pub material: MaterialHandle,
}

/// A triangle primitive.
///
/// Winding: `cross(v3 - v2, v1 - v2)` gives the outward normal
/// (counter-clockwise seen from the outside).
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub v1: Vec3,
    pub v2: Vec3,
    pub v3: Vec3,
    pub material: MaterialHandle,
}

/// A scene of spheres and triangles.
///
/// Primitive order is not observable: closest-hit selection is
/// order-independent.
#[derive(Debug, Default)]
pub struct Scene {
    pub spheres: Vec<Sphere>,
    pub triangles: Vec<Triangle>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sphere.
    pub fn add_sphere(&mut self, center: Vec3, radius: f32, material: MaterialHandle) {
        self.spheres.push(Sphere {
            center,
            radius,
            material,
        });
    }

    /// Add a triangle.
    pub fn add_triangle(&mut self, v1: Vec3, v2: Vec3, v3: Vec3, material: MaterialHandle) {
        self.triangles.push(Triangle {
            v1,
            v2,
            v3,
            material,
        });
    }

    /// Add every triangle of a mesh with a single material.
    pub fn add_mesh(&mut self, mesh: &Mesh, material: MaterialHandle) {
        for [v1, v2, v3] in mesh.extract_triangle_vertices() {
            self.add_triangle(v1, v2, v3, material);
        }
        log::debug!(
            "added mesh \"{}\" to scene: {} triangles",
            mesh.name,
            mesh.triangle_count()
        );
    }
}
