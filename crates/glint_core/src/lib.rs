//! Glint Core - mesh geometry and scene import.
//!
//! This crate provides:
//!
//! - **Mesh**: vertex positions + triangle indices, the geometry currency
//!   of the renderer
//! - **OBJ support**: Wavefront OBJ file parsing into meshes
//!
//! # Example
//!
//! ```ignore
//! use glint_core::obj::import_obj;
//!
//! let bytes = std::fs::read("scene.obj")?;
//! let meshes = import_obj(&bytes)?;
//! println!("Loaded {} meshes", meshes.len());
//! ```

pub mod mesh;
pub mod obj;

// Re-export commonly used types
pub use mesh::Mesh;
pub use obj::{import_obj, ObjError};
