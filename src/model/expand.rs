//! Vertex expansion: any accepted description in, flat indexed triangles out.

use std::collections::HashMap;

use glam::Vec3;

use crate::error::FeedError;
use crate::model::geometry::MAX_VERTICES;
use crate::model::payload::{FaceList, GeometryDescription, MeshDescription, WavefrontDescription};

/// Marks an unused fourth corner in a wavefront face.
const NO_CORNER: f64 = -1.0;

#[derive(Debug, Clone, Copy)]
pub struct ExpandOptions {
    /// Fan-triangulate polygons. When off, every face must already be a triangle.
    pub faces_to_triangles: bool,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self { faces_to_triangles: true }
    }
}

/// Flat arrays: three floats per vertex, three indices per triangle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExpandedVertexData {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub position_indices: Vec<u16>,
}

pub fn expand_vertex_data(
    description: &GeometryDescription,
    options: ExpandOptions,
) -> Result<ExpandedVertexData, FeedError> {
    match description {
        GeometryDescription::Mesh(mesh) => expand_mesh(mesh, options),
        GeometryDescription::Wavefront(obj) => expand_wavefront(obj, options),
    }
}

fn expand_mesh(mesh: &MeshDescription, options: ExpandOptions) -> Result<ExpandedVertexData, FeedError> {
    let vertex_count = mesh.positions.len();
    if vertex_count > MAX_VERTICES {
        return Err(FeedError::TooManyVertices { count: vertex_count });
    }

    let mut triangles: Vec<[u32; 3]> = Vec::new();
    match &mesh.faces {
        FaceList::Triangles(flat) => {
            if flat.len() % 3 != 0 {
                return Err(FeedError::Ragged { what: "triangle indices", len: flat.len(), group: 3 });
            }
            for tri in flat.chunks_exact(3) {
                triangles.push([
                    checked_index(tri[0], vertex_count)?,
                    checked_index(tri[1], vertex_count)?,
                    checked_index(tri[2], vertex_count)?,
                ]);
            }
        }
        FaceList::Polygons(faces) => {
            for (face, corners) in faces.iter().enumerate() {
                if corners.len() < 3 {
                    return Err(FeedError::DegenerateFace { face, corners: corners.len() });
                }
                if !options.faces_to_triangles && corners.len() != 3 {
                    return Err(FeedError::NonTriangularFace { face, corners: corners.len() });
                }
                let corners = corners
                    .iter()
                    .map(|&i| checked_index(i, vertex_count))
                    .collect::<Result<Vec<_>, _>>()?;
                // Fan around the first corner
                for k in 1..corners.len() - 1 {
                    triangles.push([corners[0], corners[k], corners[k + 1]]);
                }
            }
        }
    }

    let normals = match &mesh.normals {
        Some(normals) => {
            if normals.len() != vertex_count {
                return Err(FeedError::LengthMismatch {
                    what: "normals",
                    expected: vertex_count,
                    actual: normals.len(),
                });
            }
            normals.clone()
        }
        None => smooth_normals(&mesh.positions, &triangles),
    };

    Ok(ExpandedVertexData {
        positions: mesh.positions.iter().flatten().copied().collect(),
        normals: normals.iter().flatten().copied().collect(),
        position_indices: triangles.iter().flatten().map(|&i| i as u16).collect(),
    })
}

fn expand_wavefront(
    obj: &WavefrontDescription,
    options: ExpandOptions,
) -> Result<ExpandedVertexData, FeedError> {
    if obj.vertex_positions.len() % 3 != 0 {
        return Err(FeedError::Ragged {
            what: "vertexPositions",
            len: obj.vertex_positions.len(),
            group: 3,
        });
    }
    let positions: Vec<[f32; 3]> = obj
        .vertex_positions
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();

    // Offsets into the index arrays, three per triangle
    let slots = triangle_slots(&obj.vertex_position_indices, options)?;

    let position_of = |slot: usize| checked_index(obj.vertex_position_indices[slot], positions.len());

    match (&obj.vertex_normals, &obj.vertex_normal_indices) {
        (Some(normal_data), Some(normal_indices)) => {
            if normal_indices.len() != obj.vertex_position_indices.len() {
                return Err(FeedError::LengthMismatch {
                    what: "vertexNormalIndices",
                    expected: obj.vertex_position_indices.len(),
                    actual: normal_indices.len(),
                });
            }
            if normal_data.len() % 3 != 0 {
                return Err(FeedError::Ragged { what: "vertexNormals", len: normal_data.len(), group: 3 });
            }
            let normal_count = normal_data.len() / 3;

            // Each distinct (position, normal) corner becomes one output vertex
            let mut corner_map: HashMap<(u32, u32), u16> = HashMap::new();
            let mut out = ExpandedVertexData::default();
            for slot in slots.iter().flatten().copied() {
                let p = position_of(slot)?;
                let n = checked_index(normal_indices[slot], normal_count)?;
                let next = corner_map.len();
                let vertex = match corner_map.get(&(p, n)) {
                    Some(&v) => v,
                    None => {
                        if next >= MAX_VERTICES {
                            return Err(FeedError::TooManyVertices { count: next + 1 });
                        }
                        let (p, n) = (p as usize, n as usize);
                        out.positions.extend_from_slice(&obj.vertex_positions[p * 3..p * 3 + 3]);
                        out.normals.extend_from_slice(&normal_data[n * 3..n * 3 + 3]);
                        corner_map.insert((p as u32, n as u32), next as u16);
                        next as u16
                    }
                };
                out.position_indices.push(vertex);
            }
            Ok(out)
        }
        (normals, _) => {
            if positions.len() > MAX_VERTICES {
                return Err(FeedError::TooManyVertices { count: positions.len() });
            }
            let triangles = slots
                .iter()
                .map(|s| Ok([position_of(s[0])?, position_of(s[1])?, position_of(s[2])?]))
                .collect::<Result<Vec<[u32; 3]>, FeedError>>()?;

            // Normals without their own indices are taken as per-position
            let normals = match normals {
                Some(flat) if flat.len() == obj.vertex_positions.len() => flat.clone(),
                Some(flat) => {
                    return Err(FeedError::LengthMismatch {
                        what: "vertexNormals",
                        expected: obj.vertex_positions.len(),
                        actual: flat.len(),
                    })
                }
                None => smooth_normals(&positions, &triangles).into_iter().flatten().collect(),
            };

            Ok(ExpandedVertexData {
                positions: obj.vertex_positions.clone(),
                normals,
                position_indices: triangles.iter().flatten().map(|&i| i as u16).collect(),
            })
        }
    }
}

/// Group wavefront index slots into triangles.
///
/// With triangulation on, faces are four slots wide and a `-1` fourth slot marks a
/// triangle; quads split along the 0-2 diagonal. With it off, slots are plain triples.
fn triangle_slots(indices: &[f64], options: ExpandOptions) -> Result<Vec<[usize; 3]>, FeedError> {
    let mut slots = Vec::new();
    if options.faces_to_triangles {
        if indices.len() % 4 != 0 {
            return Err(FeedError::Ragged { what: "vertexPositionIndices", len: indices.len(), group: 4 });
        }
        for (face, quad) in indices.chunks_exact(4).enumerate() {
            let base = face * 4;
            slots.push([base, base + 1, base + 2]);
            if quad[3] != NO_CORNER {
                slots.push([base, base + 2, base + 3]);
            }
        }
    } else {
        if indices.len() % 3 != 0 {
            return Err(FeedError::Ragged { what: "vertexPositionIndices", len: indices.len(), group: 3 });
        }
        slots.extend((0..indices.len() / 3).map(|t| [t * 3, t * 3 + 1, t * 3 + 2]));
    }
    Ok(slots)
}

fn checked_index(raw: f64, vertex_count: usize) -> Result<u32, FeedError> {
    if !raw.is_finite() || raw.fract() != 0.0 {
        return Err(FeedError::NonIntegralIndex { value: raw });
    }
    let index = raw as i64;
    if index < 0 || index as usize >= vertex_count {
        return Err(FeedError::IndexOutOfRange { index, vertex_count });
    }
    Ok(index as u32)
}

/// Area-weighted vertex normals; vertices on no triangle point up.
fn smooth_normals(positions: &[[f32; 3]], triangles: &[[u32; 3]]) -> Vec<[f32; 3]> {
    let mut acc = vec![Vec3::ZERO; positions.len()];
    for tri in triangles {
        let [a, b, c] = tri.map(|i| Vec3::from(positions[i as usize]));
        let face_normal = (b - a).cross(c - a);
        for &i in tri {
            acc[i as usize] += face_normal;
        }
    }
    acc.into_iter()
        .map(|n| {
            let n = n.normalize_or_zero();
            if n == Vec3::ZERO { Vec3::Y.to_array() } else { n.to_array() }
        })
        .collect()
}
