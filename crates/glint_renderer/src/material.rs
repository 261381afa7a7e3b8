//! Materials and surface scattering.

use glint_math::{Ray, Vec3};
use rand::RngCore;

/// Color type alias (RGB values typically 0-1)
pub type Color = Vec3;

/// Opaque handle into a [`MaterialStore`].
///
/// Handles are stable for the lifetime of the store; the store is
/// append-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialHandle(u32);

/// A surface material.
///
/// Three behaviors in priority order: transmissive, metallic, lambertian.
#[derive(Debug, Clone, Copy)]
pub struct Material {
    /// Base reflectance color, components in [0, 1]
    pub albedo: Color,
    /// Mirror-like reflection with roughness perturbation
    pub metallic: bool,
    /// Roughness of a metallic surface, 0.0 = perfect mirror
    pub roughness: f32,
    /// Dielectric refraction (glass)
    pub transmissive: bool,
    /// Index of refraction of a transmissive surface
    pub ior: f32,
}

impl Material {
    /// A diffuse material.
    pub fn lambertian(albedo: Color) -> Self {
        Self {
            albedo,
            metallic: false,
            roughness: 0.0,
            transmissive: false,
            ior: 1.0,
        }
    }

    /// A reflective material. `roughness` 0.0 is a perfect mirror.
    pub fn metal(albedo: Color, roughness: f32) -> Self {
        Self {
            albedo,
            metallic: true,
            roughness: roughness.clamp(0.0, 1.0),
            transmissive: false,
            ior: 1.0,
        }
    }

    /// A refractive material (1.0 = air, 1.5 = glass, 2.4 = diamond).
    pub fn dielectric(albedo: Color, ior: f32) -> Self {
        Self {
            albedo,
            metallic: false,
            roughness: 0.0,
            transmissive: true,
            ior,
        }
    }
}

/// Append-only table of materials addressed by [`MaterialHandle`].
///
/// The store is populated before rendering and never mutated during it, so
/// it is shared by reference across render workers without synchronization.
#[derive(Debug, Default)]
pub struct MaterialStore {
    materials: Vec<Material>,
}

impl MaterialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a material and return its handle. No deduplication.
    pub fn create(&mut self, material: Material) -> MaterialHandle {
        let index = self.materials.len() as u32;
        self.materials.push(material);
        MaterialHandle(index)
    }

    /// Look up a material. An out-of-range handle is a programming error
    /// and panics.
    pub fn get(&self, handle: MaterialHandle) -> &Material {
        &self.materials[handle.0 as usize]
    }

    /// Number of materials in the store.
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

/// Result of scattering a ray off a material.
#[derive(Debug, Clone, Copy)]
pub struct ScatterResult {
    /// The scattered ray, originating at the hit point
    pub ray: Ray,
    /// Color attenuation applied to light carried by the scattered ray
    pub attenuation: Color,
}

/// Scatter an incoming ray at a surface hit.
///
/// The scattering formulas assume a unit `normal`; intersectors may report
/// unnormalized normals, so callers normalize before scattering. The
/// scattered ray originates exactly at the hit point; the intersection-time
/// epsilon guards against self-intersection instead of an origin offset.
pub fn scatter(
    rng: &mut dyn RngCore,
    store: &MaterialStore,
    incident: &Ray,
    distance: f32,
    normal: Vec3,
    handle: MaterialHandle,
) -> Option<ScatterResult> {
    let material = store.get(handle);
    let hit_point = incident.origin() + incident.direction() * distance;

    if material.transmissive {
        let cos_theta = incident.direction().dot(normal);
        let front_facing = cos_theta < 0.0;
        let ior_ratio = if front_facing {
            1.0 / material.ior
        } else {
            material.ior
        };
        let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
        let direction = if ior_ratio * sin_theta > 1.0 {
            // Total internal reflection
            reflect(incident.direction(), normal)
        } else {
            refract(incident.direction(), normal, ior_ratio)
        };
        Some(ScatterResult {
            ray: Ray::new(hit_point, direction),
            attenuation: material.albedo,
        })
    } else if material.metallic {
        let reflected = reflect(incident.direction(), normal);
        let perturbation = material.roughness * random_unit_vec3(rng);
        // Flip the perturbation if it would push the ray under the surface
        let direction = if (reflected + perturbation).dot(normal) > 0.0 {
            (reflected + perturbation).normalize()
        } else {
            (reflected - perturbation).normalize()
        };
        Some(ScatterResult {
            ray: Ray::new(hit_point, direction),
            attenuation: material.albedo,
        })
    } else {
        // Lambertian
        let scatter_direction = normal + random_unit_vec3(rng);
        // Catch degenerate scatter direction
        let direction = if scatter_direction.length_squared() < 1e-8 {
            normal
        } else {
            scatter_direction.normalize()
        };
        Some(ScatterResult {
            ray: Ray::new(hit_point, direction),
            attenuation: material.albedo,
        })
    }
}

// =============================================================================
// Helper functions
// =============================================================================

/// Reflect a vector about a normal.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * n.dot(v) * n
}

/// Refract a vector through a surface.
///
/// `eta` is the ratio of indices of refraction. Returns the zero vector when
/// refraction is impossible; callers catch total internal reflection before
/// reaching that branch.
#[inline]
pub fn refract(v: Vec3, n: Vec3, eta: f32) -> Vec3 {
    let cos_theta = v.dot(n);
    let k = 1.0 - eta * eta * (1.0 - cos_theta * cos_theta);
    if k >= 0.0 {
        eta * v - (eta * cos_theta + k.sqrt()) * n
    } else {
        Vec3::ZERO
    }
}

/// Generate a random f32 in [0, 1) from an RngCore.
///
/// This is needed because `dyn RngCore` can't use `Rng::gen()` directly.
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    // Same algorithm as rand's Standard distribution for f32
    let bits = rng.next_u32();
    (bits >> 8) as f32 * (1.0 / (1u32 << 24) as f32)
}

/// Generate a random f32 in [lo, hi).
#[inline]
pub fn gen_range_f32(rng: &mut dyn RngCore, lo: f32, hi: f32) -> f32 {
    lo + (hi - lo) * gen_f32(rng)
}

/// Generate a random unit vector by sampling the unit cube and normalizing.
pub fn random_unit_vec3(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let v = Vec3::new(
            gen_range_f32(rng, -1.0, 1.0),
            gen_range_f32(rng, -1.0, 1.0),
            gen_range_f32(rng, -1.0, 1.0),
        );
        let len_sq = v.length_squared();
        if len_sq > 1e-6 {
            return v / len_sq.sqrt();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn store_with(material: Material) -> (MaterialStore, MaterialHandle) {
        let mut store = MaterialStore::new();
        let handle = store.create(material);
        (store, handle)
    }

    #[test]
    fn test_store_handles_are_stable() {
        let mut store = MaterialStore::new();
        let a = store.create(Material::lambertian(Color::new(0.1, 0.2, 0.3)));
        let b = store.create(Material::metal(Color::ONE, 0.5));

        assert_ne!(a, b);
        assert_eq!(store.get(a).albedo, Color::new(0.1, 0.2, 0.3));
        assert!(store.get(b).metallic);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_reflect() {
        let v = Vec3::new(1.0, -1.0, 0.0);
        let n = Vec3::Y;
        assert_eq!(reflect(v, n), Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_random_unit_vec3_is_unit() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let v = random_unit_vec3(&mut rng);
            assert!((v.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_lambertian_scatters_into_hemisphere() {
        let (store, handle) = store_with(Material::lambertian(Color::splat(0.5)));
        let mut rng = StdRng::seed_from_u64(42);
        let normal = Vec3::Y;
        let incident = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, -1.0, 0.0));

        for _ in 0..200 {
            let result = scatter(&mut rng, &store, &incident, 1.0, normal, handle).unwrap();
            assert!(result.ray.direction().dot(normal) >= 0.0);
            assert_eq!(result.attenuation, Color::splat(0.5));
            assert_eq!(result.ray.origin(), Vec3::ZERO);
        }
    }

    #[test]
    fn test_metal_scatters_off_surface() {
        let (store, handle) = store_with(Material::metal(Color::ONE, 1.0));
        let mut rng = StdRng::seed_from_u64(42);
        let normal = Vec3::Y;
        let incident = Ray::new(Vec3::new(-1.0, 1.0, 0.0), Vec3::new(1.0, -1.0, 0.0).normalize());

        for _ in 0..200 {
            let result = scatter(&mut rng, &store, &incident, 2.0f32.sqrt(), normal, handle)
                .expect("metal always scatters");
            assert!(result.ray.direction().dot(normal) >= 0.0);
        }
    }

    #[test]
    fn test_dielectric_total_internal_reflection() {
        let (store, handle) = store_with(Material::dielectric(Color::ONE, 1.5));
        let mut rng = StdRng::seed_from_u64(1);
        // Outward normal; the ray travels inside the glass at a grazing
        // angle, so dot(direction, normal) > 0 and eta * sin > 1.
        let normal = Vec3::Y;
        let direction = Vec3::new(0.9, 0.1, 0.0).normalize();
        let incident = Ray::new(Vec3::new(0.0, -1.0, 0.0), direction);

        let result = scatter(&mut rng, &store, &incident, 1.0, normal, handle).unwrap();
        // Reflected, not refracted: the scattered ray stays on the inside.
        assert!(result.ray.direction().dot(normal) < 0.0);
        let expected = reflect(direction, normal);
        assert!((result.ray.direction() - expected).length() < 1e-6);
    }

    #[test]
    fn test_dielectric_refraction_reciprocity() {
        // Refract through a flat interface, then back through the inverse
        // interface; the incident direction must be restored.
        let normal = Vec3::Y;
        let incident = Vec3::new(0.3, -1.0, 0.1).normalize();
        let eta = 1.0 / 1.5;

        let inside = refract(incident, normal, eta);
        let restored = refract(inside, normal, 1.0 / eta);
        assert!((restored - incident).length() < 1e-5);
    }

    #[test]
    fn test_dielectric_always_scatters() {
        let (store, handle) = store_with(Material::dielectric(Color::ONE, 1.5));
        let mut rng = StdRng::seed_from_u64(3);
        let incident = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, -1.0, 0.0));

        assert!(scatter(&mut rng, &store, &incident, 1.0, Vec3::Y, handle).is_some());
    }
}
