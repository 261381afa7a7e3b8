//! Core path tracing renderer.
//!
//! Implements Monte Carlo path tracing with:
//! - Recursive ray bouncing with a configurable depth cap
//! - Stratified sub-pixel sampling
//! - Gamma correction

use glint_math::Ray;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;

use crate::camera::{Camera, CameraTarget, Viewport};
use crate::intersect::{intersect_sphere, SurfaceInteraction};
use crate::kdtree::{BuildOptions, KdTree};
use crate::material::{scatter, Color, MaterialStore};
use crate::scene::Scene;

/// Render configuration.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Rays per pixel; rounded down to the nearest square for the
    /// stratification grid
    pub samples: u32,
    /// Maximum ray bounce depth
    pub bounces: u32,
    /// Base seed of the per-pixel RNG streams
    pub seed: u64,
    /// kd-tree build configuration
    pub kd: BuildOptions,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            samples: 16,
            bounces: 8,
            seed: 0,
            kd: BuildOptions::default(),
        }
    }
}

/// Find the nearest hit in the scene: triangles through the kd-tree,
/// spheres by linear scan.
fn intersect_scene(scene: &Scene, tree: &KdTree, ray: &Ray) -> Option<SurfaceInteraction> {
    let mut best = tree.intersect(scene, ray);
    for sphere in &scene.spheres {
        if let Some(interaction) = intersect_sphere(ray, sphere) {
            if best.map_or(true, |b| interaction.distance < b.distance) {
                best = Some(interaction);
            }
        }
    }
    best
}

/// Sky gradient background.
fn sky_gradient(ray: &Ray) -> Color {
    let t = 0.5 * (ray.direction().y + 1.0);
    let white = Color::new(1.0, 1.0, 1.0);
    let blue = Color::new(0.5, 0.7, 1.0);
    (1.0 - t) * white + t * blue
}

/// Compute the color seen by a ray.
///
/// Traces the ray through the scene, bouncing off surfaces and accumulating
/// attenuation until the bounce cap, a miss, or an absorbed scatter.
fn cast_ray(
    rng: &mut dyn RngCore,
    store: &MaterialStore,
    scene: &Scene,
    tree: &KdTree,
    ray: &Ray,
    bounce: u32,
    bounces: u32,
) -> Color {
    if bounce >= bounces {
        return Color::ZERO;
    }

    match intersect_scene(scene, tree, ray) {
        Some(interaction) => {
            // Sphere normals come back unnormalized
            let normal = interaction.normal.normalize();
            match scatter(
                rng,
                store,
                ray,
                interaction.distance,
                normal,
                interaction.material,
            ) {
                Some(result) => {
                    let color =
                        cast_ray(rng, store, scene, tree, &result.ray, bounce + 1, bounces);
                    result.attenuation * color
                }
                None => Color::ZERO,
            }
        }
        None => sky_gradient(ray),
    }
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Render a single pixel with stratified multi-sampling.
///
/// Fires an S x S grid of sub-pixel rays where `S = floor(sqrt(samples))`,
/// averages, and gamma-corrects the result.
pub fn render_pixel(
    store: &MaterialStore,
    scene: &Scene,
    tree: &KdTree,
    camera: &Camera,
    viewport: &Viewport,
    x: u32,
    y: u32,
    options: &RenderOptions,
    rng: &mut dyn RngCore,
) -> Color {
    let samples_root = (options.samples as f32).sqrt() as u32;
    let mut pixel = Color::ZERO;
    for sample in 0..samples_root * samples_root {
        let sx = sample % samples_root;
        let sy = sample / samples_root;
        let u = (x as f32 + sx as f32 / samples_root as f32) / (camera.image_width - 1) as f32;
        let v = (y as f32 + sy as f32 / samples_root as f32) / (camera.image_height - 1) as f32;
        let direction = (viewport.top_left + u * camera.viewport_width * viewport.right
            - v * camera.viewport_height * viewport.up)
            .normalize();
        let ray = Ray::new(camera.position, direction);
        pixel += cast_ray(rng, store, scene, tree, &ray, 0, options.bounces);
    }
    pixel /= (samples_root * samples_root) as f32;

    Color::new(
        linear_to_gamma(pixel.x),
        linear_to_gamma(pixel.y),
        linear_to_gamma(pixel.z),
    )
}

/// The RNG stream of a single pixel.
///
/// Streams are derived from the base seed and the pixel index so the
/// rendered image does not depend on pixel scheduling.
fn pixel_rng(seed: u64, width: u32, x: u32, y: u32) -> StdRng {
    StdRng::seed_from_u64(seed.wrapping_add(y as u64 * width as u64 + x as u64))
}

/// Image buffer for storing render output.
///
/// Pixels are row-major, top row first; values are post-gamma.
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; (width * height) as usize],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        self.pixels[(y * self.width + x) as usize] = color;
    }
}

/// Render the scene into an image buffer, rows fanned out over rayon.
///
/// Deterministic for a fixed seed: every pixel owns its RNG stream, so the
/// result is identical to [`render_serial`] no matter how rayon schedules
/// the rows. The look-at basis is undefined when the target sits directly
/// above or below the camera.
pub fn render(
    store: &MaterialStore,
    scene: &Scene,
    camera: &Camera,
    target: &CameraTarget,
    options: &RenderOptions,
) -> ImageBuffer {
    let tree = KdTree::build(scene, &options.kd);
    let viewport = Viewport::new(camera, target);
    log::info!(
        "rendering {}x{} at {} samples, {} bounces",
        camera.image_width,
        camera.image_height,
        options.samples,
        options.bounces
    );

    let width = camera.image_width;
    let tree = &tree;
    let viewport = &viewport;
    let pixels: Vec<Color> = (0..camera.image_height)
        .into_par_iter()
        .flat_map_iter(|y| {
            (0..width).map(move |x| {
                let mut rng = pixel_rng(options.seed, width, x, y);
                render_pixel(store, scene, tree, camera, viewport, x, y, options, &mut rng)
            })
        })
        .collect();

    ImageBuffer {
        width,
        height: camera.image_height,
        pixels,
    }
}

/// Single-threaded reference renderer. Produces the same image as
/// [`render`].
pub fn render_serial(
    store: &MaterialStore,
    scene: &Scene,
    camera: &Camera,
    target: &CameraTarget,
    options: &RenderOptions,
) -> ImageBuffer {
    let tree = KdTree::build(scene, &options.kd);
    let viewport = Viewport::new(camera, target);

    let mut image = ImageBuffer::new(camera.image_width, camera.image_height);
    for y in 0..camera.image_height {
        for x in 0..camera.image_width {
            let mut rng = pixel_rng(options.seed, camera.image_width, x, y);
            let color = render_pixel(
                store, scene, &tree, camera, &viewport, x, y, options, &mut rng,
            );
            image.set(x, y, color);
        }
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use glint_math::Vec3;

    #[test]
    fn test_sky_gradient() {
        // Ray pointing up should be more blue (less red than white)
        let up_ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0));
        let up_color = sky_gradient(&up_ray);

        let down_ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, -1.0, 0.0));
        let down_color = sky_gradient(&down_ray);

        assert!(
            up_color.x < down_color.x,
            "up_color.x={} should be < down_color.x={}",
            up_color.x,
            down_color.x
        );
        assert_eq!(down_color, Color::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_linear_to_gamma_roundtrip() {
        for p in [0.0f32, 0.1, 0.25, 0.5, 0.9, 1.0] {
            let gamma = linear_to_gamma(p);
            assert!((gamma * gamma - p).abs() < 1e-6);
        }
        assert_eq!(linear_to_gamma(-1.0), 0.0);
    }

    #[test]
    fn test_empty_scene_is_sky() {
        let store = MaterialStore::new();
        let scene = Scene::new();
        let camera = Camera::new(Vec3::new(2.0, 2.0, 5.0), 90.0, 1.0, 10);
        let target = CameraTarget {
            position: Vec3::ZERO,
        };
        let options = RenderOptions {
            samples: 1,
            ..Default::default()
        };

        let image = render(&store, &scene, &camera, &target, &options);
        let viewport = Viewport::new(&camera, &target);

        for y in 0..10u32 {
            for x in 0..10u32 {
                let u = x as f32 / 9.0;
                let v = y as f32 / 9.0;
                let direction = (viewport.top_left + u * camera.viewport_width * viewport.right
                    - v * camera.viewport_height * viewport.up)
                    .normalize();
                let sky = sky_gradient(&Ray::new(camera.position, direction));
                let expected = Color::new(
                    linear_to_gamma(sky.x),
                    linear_to_gamma(sky.y),
                    linear_to_gamma(sky.z),
                );
                assert!((image.get(x, y) - expected).length() < 1e-6);
            }
        }

        // Reproducible bit-for-bit
        let again = render(&store, &scene, &camera, &target, &options);
        assert_eq!(image.pixels, again.pixels);
    }

    #[test]
    fn test_single_bounce_terminates_black() {
        // One bounce cannot terminate before the depth cap: the scattered
        // ray contributes black, so the attenuated result is black.
        let mut store = MaterialStore::new();
        let grey = store.create(Material::lambertian(Color::splat(0.5)));
        let mut scene = Scene::new();
        scene.add_sphere(Vec3::ZERO, 1.0, grey);

        let camera = Camera::new(Vec3::new(0.0, 0.0, 5.0), 90.0, 1.0, 11);
        let target = CameraTarget {
            position: Vec3::ZERO,
        };
        let options = RenderOptions {
            samples: 1,
            bounces: 1,
            ..Default::default()
        };

        let image = render(&store, &scene, &camera, &target, &options);
        assert_eq!(image.get(5, 5), Color::ZERO);
    }

    #[test]
    fn test_render_matches_serial() {
        let mut store = MaterialStore::new();
        let grey = store.create(Material::lambertian(Color::splat(0.5)));
        let shiny = store.create(Material::metal(Color::new(0.8, 0.6, 0.2), 0.3));

        let mut scene = Scene::new();
        scene.add_sphere(Vec3::new(0.0, -100.5, -1.0), 100.0, grey);
        scene.add_sphere(Vec3::new(1.0, 0.0, -1.0), 0.5, shiny);
        scene.add_triangle(
            Vec3::new(-2.0, 0.0, -2.0),
            Vec3::new(0.0, 0.0, -2.0),
            Vec3::new(-1.0, 1.5, -2.0),
            grey,
        );

        let camera = Camera::new(Vec3::new(0.0, 0.5, 2.0), 60.0, 1.0, 16);
        let target = CameraTarget {
            position: Vec3::new(0.0, 0.0, -1.0),
        };
        let options = RenderOptions {
            samples: 4,
            bounces: 4,
            seed: 7,
            ..Default::default()
        };

        let parallel = render(&store, &scene, &camera, &target, &options);
        let serial = render_serial(&store, &scene, &camera, &target, &options);
        assert_eq!(parallel.pixels, serial.pixels);

        let again = render(&store, &scene, &camera, &target, &options);
        assert_eq!(parallel.pixels, again.pixels);

        // Byte-identical all the way through the image writer
        let mut first = Vec::new();
        crate::ppm::write_ppm(&mut first, &parallel).unwrap();
        let mut second = Vec::new();
        crate::ppm::write_ppm(&mut second, &again).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_triangle_hit_through_tree() {
        let mut store = MaterialStore::new();
        let grey = store.create(Material::lambertian(Color::splat(0.4)));
        let mut scene = Scene::new();
        scene.add_triangle(
            Vec3::new(-1.0, -1.0, -2.0),
            Vec3::new(1.0, -1.0, -2.0),
            Vec3::new(0.0, 1.0, -2.0),
            grey,
        );

        let tree = KdTree::build(&scene, &BuildOptions::default());
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let hit = intersect_scene(&scene, &tree, &ray).unwrap();
        assert!((hit.distance - 2.0).abs() < 1e-5);
        assert!((hit.normal - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_spheres_and_triangles_pick_closer() {
        let mut store = MaterialStore::new();
        let grey = store.create(Material::lambertian(Color::splat(0.4)));
        let mut scene = Scene::new();
        // Triangle behind the sphere along -z
        scene.add_triangle(
            Vec3::new(-2.0, -2.0, -5.0),
            Vec3::new(2.0, -2.0, -5.0),
            Vec3::new(0.0, 2.0, -5.0),
            grey,
        );
        scene.add_sphere(Vec3::new(0.0, 0.0, -3.0), 0.5, grey);

        let tree = KdTree::build(&scene, &BuildOptions::default());
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let hit = intersect_scene(&scene, &tree, &ray).unwrap();
        assert!((hit.distance - 2.5).abs() < 1e-5);
    }
}
