//! Wavefront OBJ file parser.
//!
//! This module provides line-by-line parsing of OBJ text files.
//! The parser is intentionally simple and handles the most common OBJ
//! records.
//!
//! # Supported Syntax
//!
//! - `v x y z` — vertex position
//! - `f a b c ...` — face, triangulated as a fan; `a/b/c` index forms and
//!   negative (relative) indices are accepted
//! - `o name` / `g name` — starts a new named mesh
//! - `vn`, `vt`, `s`, `mtllib`, `usemtl`, comments — ignored
//!
//! Texture coordinates, normals and materials are parsed past but not kept;
//! the renderer shades from face geometry alone.

use glint_math::Vec3;
use thiserror::Error;

use crate::mesh::Mesh;

/// Errors that can occur during OBJ parsing.
#[derive(Error, Debug)]
pub enum ObjError {
    #[error("invalid UTF-8 in OBJ data: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("line {line}: malformed {record} record: {message}")]
    Malformed {
        line: usize,
        record: &'static str,
        message: String,
    },

    #[error("line {line}: invalid number \"{token}\"")]
    InvalidNumber { line: usize, token: String },

    #[error("line {line}: face references vertex {index} but only {count} vertices are defined")]
    IndexOutOfRange {
        line: usize,
        index: i64,
        count: usize,
    },
}

/// Result type for import operations.
pub type ObjResult<T> = Result<T, ObjError>;

/// Parse an OBJ byte buffer into a list of meshes.
///
/// Every `o`/`g` record starts a new mesh; files without either yield a
/// single unnamed mesh. Vertex positions are shared OBJ-style across the
/// whole file, so each produced mesh carries the full position array and
/// its own index list.
pub fn import_obj(bytes: &[u8]) -> ObjResult<Vec<Mesh>> {
    let content = std::str::from_utf8(bytes)?;

    let mut positions: Vec<Vec3> = Vec::new();
    // (name, indices) for every object seen so far
    let mut objects: Vec<(String, Vec<u32>)> = Vec::new();

    for (line_index, raw_line) in content.lines().enumerate() {
        let line_number = line_index + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let record = tokens.next().unwrap();
        match record {
            "v" => {
                let position = parse_vec3(line_number, &mut tokens)?;
                positions.push(position);
            }
            "o" | "g" => {
                let name = tokens.collect::<Vec<_>>().join(" ");
                objects.push((name, Vec::new()));
            }
            "f" => {
                let corners = tokens
                    .map(|token| parse_face_index(line_number, token, positions.len()))
                    .collect::<ObjResult<Vec<u32>>>()?;
                if corners.len() < 3 {
                    return Err(ObjError::Malformed {
                        line: line_number,
                        record: "f",
                        message: format!("face has {} vertices, need at least 3", corners.len()),
                    });
                }

                if objects.is_empty() {
                    objects.push((String::new(), Vec::new()));
                }
                let indices = &mut objects.last_mut().unwrap().1;
                // Fan triangulation for polygons
                for i in 1..corners.len() - 1 {
                    indices.push(corners[0]);
                    indices.push(corners[i]);
                    indices.push(corners[i + 1]);
                }
            }
            // Normals, texcoords, smoothing groups and materials are not
            // used by the renderer.
            "vn" | "vt" | "vp" | "s" | "mtllib" | "usemtl" => {}
            other => {
                log::warn!("line {}: skipping unknown OBJ record \"{}\"", line_number, other);
            }
        }
    }

    let meshes: Vec<Mesh> = objects
        .into_iter()
        .filter(|(name, indices)| {
            if indices.is_empty() {
                log::warn!("OBJ object \"{}\" has no faces, skipping", name);
                false
            } else {
                true
            }
        })
        .map(|(name, indices)| Mesh::new(name, positions.clone(), indices))
        .collect();

    for mesh in &meshes {
        log::debug!(
            "imported mesh \"{}\": {} vertices, {} triangles",
            mesh.name,
            mesh.vertex_count(),
            mesh.triangle_count()
        );
    }

    Ok(meshes)
}

fn parse_vec3<'a>(
    line: usize,
    tokens: &mut impl Iterator<Item = &'a str>,
) -> ObjResult<Vec3> {
    let mut components = [0.0f32; 3];
    for component in &mut components {
        let token = tokens.next().ok_or(ObjError::Malformed {
            line,
            record: "v",
            message: "expected 3 coordinates".to_string(),
        })?;
        *component = token.parse().map_err(|_| ObjError::InvalidNumber {
            line,
            token: token.to_string(),
        })?;
    }
    Ok(Vec3::from_array(components))
}

/// Parse one face corner (`7`, `7/1`, `7//3`, `7/1/3` or `-1`) into a
/// zero-based position index.
fn parse_face_index(line: usize, token: &str, vertex_count: usize) -> ObjResult<u32> {
    let position_token = token.split('/').next().unwrap();
    let index: i64 = position_token
        .parse()
        .map_err(|_| ObjError::InvalidNumber {
            line,
            token: token.to_string(),
        })?;

    // OBJ indices are 1-based; negative indices count back from the most
    // recently defined vertex.
    let resolved = if index > 0 {
        index - 1
    } else if index < 0 {
        vertex_count as i64 + index
    } else {
        -1
    };

    if resolved < 0 || resolved >= vertex_count as i64 {
        return Err(ObjError::IndexOutOfRange {
            line,
            index,
            count: vertex_count,
        });
    }
    Ok(resolved as u32)
}
