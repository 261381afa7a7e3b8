//! Simple path tracer example.
//!
//! Renders a basic scene with spheres and a triangle and saves to PPM.

use glint_renderer::{
    ppm, render, Camera, CameraTarget, Color, Material, MaterialStore, RenderOptions, Scene, Vec3,
};
use std::fs::File;
use std::io::BufWriter;

fn main() {
    println!("Glint Path Tracer - Simple Example");
    println!("==================================");

    let mut store = MaterialStore::new();
    let ground = store.create(Material::lambertian(Color::new(0.5, 0.5, 0.5)));
    let glass = store.create(Material::dielectric(Color::ONE, 1.5));
    let brown = store.create(Material::lambertian(Color::new(0.4, 0.2, 0.1)));
    let steel = store.create(Material::metal(Color::new(0.7, 0.6, 0.5), 0.0));

    let mut scene = Scene::new();
    scene.add_sphere(Vec3::new(0.0, -1000.0, 0.0), 1000.0, ground);
    scene.add_sphere(Vec3::new(0.0, 1.0, 0.0), 1.0, glass);
    scene.add_sphere(Vec3::new(-4.0, 1.0, 0.0), 1.0, brown);
    scene.add_sphere(Vec3::new(4.0, 1.0, 0.0), 1.0, steel);
    scene.add_triangle(
        Vec3::new(-2.0, 0.0, -3.0),
        Vec3::new(2.0, 0.0, -3.0),
        Vec3::new(0.0, 3.0, -3.0),
        brown,
    );

    let camera = Camera::new(Vec3::new(13.0, 2.0, 3.0), 20.0, 16.0 / 9.0, 450);
    let target = CameraTarget {
        position: Vec3::new(0.0, 0.0, 0.0),
    };
    let options = RenderOptions {
        samples: 49,
        bounces: 10,
        ..Default::default()
    };

    println!(
        "Rendering {}x{} @ {} spp...",
        camera.image_width, camera.image_height, options.samples
    );

    let start = std::time::Instant::now();
    let image = render(&store, &scene, &camera, &target, &options);
    println!("Rendered in {:?}", start.elapsed());

    let filename = "output.ppm";
    let file = File::create(filename).expect("Failed to create output file");
    let mut writer = BufWriter::new(file);
    ppm::write_ppm(&mut writer, &image).expect("Failed to save image");
    println!("Saved to {}", filename);
}
