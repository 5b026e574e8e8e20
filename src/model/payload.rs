//! Wire shapes accepted from the geometry feed.
//!
//! Two JSON layouts are understood. The mesh layout carries nested position
//! triples plus either polygon faces or a flat triangle index list:
//!
//! ```json
//! { "positions": [[0,0,0],[1,0,0],[0,1,0]], "facesOrIndices": [[0,1,2]] }
//! ```
//!
//! The wavefront layout is what OBJ parsers commonly emit: flat coordinate arrays
//! and four indices per face, `-1` padding the fourth slot of a triangle.
//!
//! ```json
//! { "vertexPositions": [0,0,0, 1,0,0, 0,1,0], "vertexPositionIndices": [0,1,2,-1] }
//! ```

use serde::Deserialize;

use crate::error::FeedError;

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GeometryDescription {
    Mesh(MeshDescription),
    Wavefront(WavefrontDescription),
}

impl GeometryDescription {
    pub fn from_json(raw: &str) -> Result<Self, FeedError> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeshDescription {
    pub positions: Vec<[f32; 3]>,
    #[serde(rename = "facesOrIndices", alias = "faces", alias = "indices")]
    pub faces: FaceList,
    /// One normal per position; computed from the faces when absent.
    #[serde(default)]
    pub normals: Option<Vec<[f32; 3]>>,
}

/// Indices are read as numbers of any JSON form (`2`, `2.0`, `-1`); integrality and
/// range are checked during expansion.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FaceList {
    Polygons(Vec<Vec<f64>>),
    Triangles(Vec<f64>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WavefrontDescription {
    pub vertex_positions: Vec<f32>,
    pub vertex_position_indices: Vec<f64>,
    #[serde(default)]
    pub vertex_normals: Option<Vec<f32>>,
    #[serde(default)]
    pub vertex_normal_indices: Option<Vec<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_polygon_faces() {
        let desc = GeometryDescription::from_json(
            r#"{"positions":[[0,0,0],[1,0,0],[0,1,0]],"facesOrIndices":[[0,1,2]]}"#,
        )
        .unwrap();
        match desc {
            GeometryDescription::Mesh(mesh) => {
                assert_eq!(mesh.positions.len(), 3);
                assert!(matches!(mesh.faces, FaceList::Polygons(ref f) if f == &vec![vec![0.0, 1.0, 2.0]]));
                assert!(mesh.normals.is_none());
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn test_parses_flat_indices_alias() {
        let desc = GeometryDescription::from_json(
            r#"{"positions":[[0,0,0],[1,0,0],[0,1,0]],"indices":[0,1,2]}"#,
        )
        .unwrap();
        assert!(matches!(
            desc,
            GeometryDescription::Mesh(MeshDescription { faces: FaceList::Triangles(_), .. })
        ));
    }

    #[test]
    fn test_parses_wavefront_layout() {
        let desc = GeometryDescription::from_json(
            r#"{"vertexPositions":[0,0,0,1,0,0,0,1,0],"vertexPositionIndices":[0,1,2,-1]}"#,
        )
        .unwrap();
        match desc {
            GeometryDescription::Wavefront(w) => {
                assert_eq!(w.vertex_positions.len(), 9);
                assert_eq!(w.vertex_position_indices, vec![0.0, 1.0, 2.0, -1.0]);
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn test_parses_float_written_indices() {
        let desc = GeometryDescription::from_json(
            r#"{"positions":[[0,0,0],[1,0,0],[0,1,0]],"facesOrIndices":[[0.0,1.0,2.0]]}"#,
        )
        .unwrap();
        assert!(matches!(
            desc,
            GeometryDescription::Mesh(MeshDescription { faces: FaceList::Polygons(_), .. })
        ));
    }

    #[test]
    fn test_rejects_unknown_shape() {
        let err = GeometryDescription::from_json(r#"{"verts":[1,2,3]}"#).unwrap_err();
        assert!(matches!(err, FeedError::Decode(_)));
        assert!(GeometryDescription::from_json("not json").is_err());
    }
}
