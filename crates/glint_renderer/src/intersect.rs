//! Analytic ray intersection primitives.

use glint_math::{Ray, Vec3};

use crate::material::MaterialHandle;
use crate::scene::{Sphere, Triangle};

/// Minimum accepted hit distance. Guards against rays re-intersecting the
/// surface they scattered from, since scattered rays originate exactly at
/// the hit point.
pub const EPSILON: f32 = 0.001;

/// Record of a ray-surface intersection.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceInteraction {
    /// Surface normal at the hit point. NOT required to be unit length;
    /// sphere hits report the unnormalized center-to-point vector.
    pub normal: Vec3,
    /// Parametric hit distance along the ray. `INFINITY` means no hit.
    pub distance: f32,
    /// Material at the hit point
    pub material: MaterialHandle,
}

/// Intersect a ray with a sphere.
///
/// Assumes a unit-length ray direction, which reduces the quadratic to
/// `t^2 + b t + c`. The reported normal is unnormalized and is not flipped
/// for rays originating inside the sphere.
pub fn intersect_sphere(ray: &Ray, sphere: &Sphere) -> Option<SurfaceInteraction> {
    let origin = ray.origin() - sphere.center;
    // a = dot(direction, direction), which is 1 for unit directions
    let b = 2.0 * origin.dot(ray.direction());
    let c = origin.dot(origin) - sphere.radius * sphere.radius;
    let delta = b * b - 4.0 * c;
    if delta < 0.0 {
        return None;
    }

    let sqrt_delta = 0.5 * delta.sqrt();
    let half_b = -0.5 * b;
    // Prefer the near root, fall back to the far one
    let mut distance = half_b - sqrt_delta;
    if distance < EPSILON {
        distance = half_b + sqrt_delta;
        if distance < EPSILON {
            return None;
        }
    }

    let normal = ray.origin() + ray.direction() * distance - sphere.center;
    Some(SurfaceInteraction {
        normal,
        distance,
        material: sphere.material,
    })
}

/// Ray-plane intersection helper for the triangle test.
fn intersect_plane(ray: &Ray, plane_normal: Vec3, plane_distance: f32) -> Option<f32> {
    let angle_cos = ray.direction().dot(plane_normal);
    let distance = (plane_distance - ray.origin().dot(plane_normal)) / angle_cos;
    if angle_cos.abs() > f32::EPSILON && distance >= EPSILON {
        Some(distance)
    } else {
        None
    }
}

/// Intersect a ray with a triangle.
///
/// The winding convention is `cross(v3 - v2, v1 - v2)` for the outward
/// normal (counter-clockwise seen from the outside). The inside test runs
/// on signed volumes against the unnormalized plane normal rather than
/// precomputed barycentric bases.
pub fn intersect_triangle(ray: &Ray, triangle: &Triangle) -> Option<SurfaceInteraction> {
    let u_vec = triangle.v1 - triangle.v2;
    let v_vec = triangle.v3 - triangle.v2;
    let plane_normal_unnormalized = v_vec.cross(u_vec);
    let plane_normal = plane_normal_unnormalized.normalize();
    let plane_distance = triangle.v2.dot(plane_normal);
    let distance = intersect_plane(ray, plane_normal, plane_distance)?;

    let pr = distance * ray.direction();
    // det is negative when the triangle is CCW toward the ray, positive
    // when CW; dividing by -det keeps u and v positive for interior hits in
    // both cases.
    let det = pr.dot(plane_normal_unnormalized);
    let pa = triangle.v1 - ray.origin();
    let pb = triangle.v2 - ray.origin();
    let pc = triangle.v3 - ray.origin();
    let u = pr.dot(pa.cross(pc)) / -det;
    let v = pr.dot(pc.cross(pb)) / -det;
    if u >= 0.0 && v >= 0.0 && u + v <= 1.0 {
        Some(SurfaceInteraction {
            normal: plane_normal,
            distance,
            material: triangle.material,
        })
    } else {
        None
    }
}
