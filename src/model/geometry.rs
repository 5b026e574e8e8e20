use crate::error::FeedError;
use crate::model::expand::ExpandedVertexData;

/// Largest vertex count addressable by 16-bit indices.
pub const MAX_VERTICES: usize = u16::MAX as usize + 1;

/// A validated triangle mesh ready for upload.
///
/// Construction goes through [`GeometryRecord::new`], so a record in hand always
/// satisfies: indices come in triples, every index addresses a vertex, and there is
/// exactly one normal per position.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryRecord {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    indices: Vec<u16>,
}

impl GeometryRecord {
    pub fn new(
        positions: Vec<[f32; 3]>,
        normals: Vec<[f32; 3]>,
        indices: Vec<u16>,
    ) -> Result<Self, FeedError> {
        if positions.len() > MAX_VERTICES {
            return Err(FeedError::TooManyVertices { count: positions.len() });
        }
        if normals.len() != positions.len() {
            return Err(FeedError::LengthMismatch {
                what: "normals",
                expected: positions.len(),
                actual: normals.len(),
            });
        }
        if indices.len() % 3 != 0 {
            return Err(FeedError::Ragged { what: "triangle indices", len: indices.len(), group: 3 });
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(FeedError::IndexOutOfRange {
                index: bad as i64,
                vertex_count: positions.len(),
            });
        }
        Ok(Self { positions, normals, indices })
    }

    /// Build from the flat arrays produced by vertex expansion.
    pub fn from_expanded(data: ExpandedVertexData) -> Result<Self, FeedError> {
        let positions = triples("positions", &data.positions)?;
        let normals = triples("normals", &data.normals)?;
        Self::new(positions, normals, data.position_indices)
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

fn triples(what: &'static str, flat: &[f32]) -> Result<Vec<[f32; 3]>, FeedError> {
    if flat.len() % 3 != 0 {
        return Err(FeedError::Ragged { what, len: flat.len(), group: 3 });
    }
    Ok(flat.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> (Vec<[f32; 3]>, Vec<[f32; 3]>) {
        (
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![[0.0, 0.0, 1.0]; 3],
        )
    }

    #[test]
    fn test_accepts_valid_triangle() {
        let (p, n) = triangle();
        let record = GeometryRecord::new(p, n, vec![0, 1, 2]).unwrap();
        assert_eq!(record.index_count(), 3);
        assert_eq!(record.vertex_count(), 3);
    }

    #[test]
    fn test_rejects_out_of_range_index() {
        let (p, n) = triangle();
        let err = GeometryRecord::new(p, n, vec![0, 1, 3]).unwrap_err();
        assert!(matches!(err, FeedError::IndexOutOfRange { index: 3, vertex_count: 3 }));
    }

    #[test]
    fn test_rejects_normal_count_mismatch() {
        let (p, _) = triangle();
        let err = GeometryRecord::new(p, vec![[0.0, 0.0, 1.0]], vec![0, 1, 2]).unwrap_err();
        assert!(matches!(err, FeedError::LengthMismatch { expected: 3, actual: 1, .. }));
    }

    #[test]
    fn test_rejects_partial_triangle() {
        let (p, n) = triangle();
        let err = GeometryRecord::new(p, n, vec![0, 1]).unwrap_err();
        assert!(matches!(err, FeedError::Ragged { len: 2, group: 3, .. }));
    }

    #[test]
    fn test_empty_record_is_valid() {
        let record = GeometryRecord::new(Vec::new(), Vec::new(), Vec::new()).unwrap();
        assert!(record.is_empty());
        assert_eq!(record.index_count(), 0);
    }

    #[test]
    fn test_from_expanded_rejects_ragged_positions() {
        let data = ExpandedVertexData {
            positions: vec![0.0, 1.0],
            normals: Vec::new(),
            position_indices: Vec::new(),
        };
        assert!(matches!(
            GeometryRecord::from_expanded(data),
            Err(FeedError::Ragged { what: "positions", .. })
        ));
    }

    #[test]
    fn test_vertex_cap_boundary() {
        let at_cap = GeometryRecord::new(
            vec![[0.0; 3]; MAX_VERTICES],
            vec![[0.0, 1.0, 0.0]; MAX_VERTICES],
            vec![0, 1, 65535],
        )
        .unwrap();
        assert_eq!(at_cap.indices(), &[0, 1, 65535]);

        let over = GeometryRecord::new(
            vec![[0.0; 3]; MAX_VERTICES + 1],
            vec![[0.0, 1.0, 0.0]; MAX_VERTICES + 1],
            vec![0, 1, 2],
        );
        assert!(matches!(over, Err(FeedError::TooManyVertices { count: 65537 })));
    }
}
