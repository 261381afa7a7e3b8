//! Camera and viewport derivation for ray generation.

use glint_math::{Mat3, Vec3};

/// Camera for generating primary rays.
///
/// The viewport dimensions and image width are derived from the vertical
/// field of view, the aspect ratio and the image height.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    /// Eye position in world space
    pub position: Vec3,
    /// Vertical field of view in degrees
    pub vfov: f32,
    /// width / height
    pub aspect_ratio: f32,
    /// Width of the viewport in world units at the focal plane
    pub viewport_width: f32,
    /// Height of the viewport in world units at the focal plane
    pub viewport_height: f32,
    pub focal_length: f32,
    /// Width of the generated image in pixels
    pub image_width: u32,
    /// Height of the generated image in pixels
    pub image_height: u32,
}

impl Camera {
    /// Create a camera from its independent parameters.
    pub fn new(position: Vec3, vfov: f32, aspect_ratio: f32, image_height: u32) -> Self {
        let fov_tan = (0.5 * vfov.to_radians()).tan();
        let viewport_height = 2.0 * fov_tan;
        let viewport_width = viewport_height * aspect_ratio;
        let image_width = (image_height as f32 * aspect_ratio) as u32;

        Self {
            position,
            vfov,
            aspect_ratio,
            viewport_width,
            viewport_height,
            focal_length: 1.0,
            image_width,
            image_height,
        }
    }
}

/// The camera's look-at point.
#[derive(Debug, Clone, Copy)]
pub struct CameraTarget {
    pub position: Vec3,
}

/// World-space viewport basis derived from a camera and its target.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub right: Vec3,
    pub up: Vec3,
    /// World-space position of the viewport's top-left corner relative to
    /// the eye
    pub top_left: Vec3,
}

impl Viewport {
    /// Derive the look-at basis.
    // TODO: Handle targets directly above or below the camera, where the
    // cross product with world-up degenerates to zero.
    pub fn new(camera: &Camera, target: &CameraTarget) -> Self {
        let view = (target.position - camera.position).normalize();
        let right = view.cross(Vec3::Y).normalize();
        let up = right.cross(view);
        let rotation = Mat3::from_cols(right, up, view);
        let top_left = rotation
            * Vec3::new(
                -0.5 * camera.viewport_width,
                0.5 * camera.viewport_height,
                camera.focal_length,
            );

        Self {
            right,
            up,
            top_left,
        }
    }
}
