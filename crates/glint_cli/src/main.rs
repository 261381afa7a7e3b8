//! Process entry for the glint path tracer.
//!
//! Usage: `glint <scene.obj> <image-height> <samples> <out.ppm> [out.png]`

use std::fs::File;
use std::io::BufWriter;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use glint_core::obj::import_obj;
use glint_renderer::{
    ppm, render, Camera, CameraTarget, Color, ImageBuffer, Material, MaterialStore, RenderOptions,
    Scene, Vec3,
};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 5 {
        bail!("usage: {} <scene.obj> <image-height> <samples> <out.ppm> [out.png]", args[0]);
    }
    let scene_path = &args[1];
    let image_height: u32 = args[2]
        .parse()
        .with_context(|| format!("invalid image height \"{}\"", args[2]))?;
    let samples: u32 = args[3]
        .parse()
        .with_context(|| format!("invalid sample count \"{}\"", args[3]))?;
    let output_ppm = &args[4];
    let output_png = args.get(5);

    let mut store = MaterialStore::new();
    let green_diffuse = store.create(Material::lambertian(Color::new(0.8, 0.8, 0.0)));
    let grey_diffuse = store.create(Material::lambertian(Color::new(0.4, 0.4, 0.4)));

    let bytes = std::fs::read(scene_path)
        .with_context(|| format!("could not open file \"{}\" for reading", scene_path))?;
    let meshes = import_obj(&bytes)
        .with_context(|| format!("could not import \"{}\"", scene_path))?;

    let mut scene = Scene::new();
    for mesh in &meshes {
        log::info!(
            "adding mesh \"{}\" ({} triangles)",
            mesh.name,
            mesh.triangle_count()
        );
        scene.add_mesh(mesh, grey_diffuse);
    }
    // Ground sphere below the imported geometry
    scene.add_sphere(Vec3::new(0.0, -201.0, -3.0), 200.0, green_diffuse);

    let camera = Camera::new(Vec3::new(2.0, 2.0, 5.0), 90.0, 16.0 / 9.0, image_height);
    let target = CameraTarget {
        position: Vec3::ZERO,
    };
    let options = RenderOptions {
        samples,
        bounces: 8,
        seed: 7849034,
        ..Default::default()
    };

    let start = Instant::now();
    let image = render(&store, &scene, &camera, &target, &options);
    log::info!("rendering took {:?}", start.elapsed());

    let file = File::create(output_ppm)
        .with_context(|| format!("could not open file \"{}\" for writing", output_ppm))?;
    let mut writer = BufWriter::new(file);
    ppm::write_ppm(&mut writer, &image)
        .with_context(|| format!("could not write \"{}\"", output_ppm))?;
    println!("Image dumped to {}", output_ppm);

    if let Some(path) = output_png {
        save_png(&image, path).with_context(|| format!("could not write \"{}\"", path))?;
        println!("Image dumped to {}", path);
    }

    Ok(())
}

fn save_png(buffer: &ImageBuffer, path: &str) -> Result<()> {
    let mut png = image::RgbImage::new(buffer.width, buffer.height);
    for y in 0..buffer.height {
        for x in 0..buffer.width {
            let color = buffer.get(x, y);
            png.get_pixel_mut(x, y).0 = [
                (255.999 * color.x.clamp(0.0, 1.0)) as u8,
                (255.999 * color.y.clamp(0.0, 1.0)) as u8,
                (255.999 * color.z.clamp(0.0, 1.0)) as u8,
            ];
        }
    }
    png.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}
