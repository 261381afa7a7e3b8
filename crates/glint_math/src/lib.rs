// Re-export glam for convenience
pub use glam::*;

// Glint math types
mod extent;
mod ray;
pub use extent::Extent3;
pub use ray::Ray;
