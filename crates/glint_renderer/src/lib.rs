//! Glint Renderer - CPU Path Tracing
//!
//! A Monte Carlo path tracer over spheres and triangle meshes. Triangle
//! intersection queries are answered by an SAH-built kd-tree.

mod camera;
mod intersect;
mod kdtree;
mod material;
pub mod ppm;
mod renderer;
mod scene;

pub use camera::{Camera, CameraTarget, Viewport};
pub use intersect::{intersect_sphere, intersect_triangle, SurfaceInteraction, EPSILON};
pub use kdtree::{BuildOptions, KdTree};
pub use material::{
    gen_f32, gen_range_f32, random_unit_vec3, scatter, Color, Material, MaterialHandle,
    MaterialStore, ScatterResult,
};
pub use renderer::{render, render_pixel, render_serial, ImageBuffer, RenderOptions};
pub use scene::{Scene, Sphere, Triangle};

/// Re-export Vec3 and common math types from glint_math
pub use glint_math::{Extent3, Ray, Vec3};
