use crate::model::{GeometryRecord, PendingGeometry};

/// Creates one complete GPU buffer set (positions, normals, indices) from a record.
pub trait MeshUploader {
    type Buffers;

    fn upload(&self, record: &GeometryRecord) -> Self::Buffers;
}

/// Something that can record an indexed draw of a buffer set.
pub trait MeshPass<B> {
    fn draw_mesh(&mut self, buffers: &B, index_count: u32);
}

/// The buffer set currently drawn, with its index count.
pub struct ActiveMeshBuffers<B> {
    pub buffers: B,
    pub index_count: u32,
}

/// Owns the drawn mesh and swaps in pending geometry between frames.
///
/// Updates are double-buffered: a pending record is uploaded into a fresh buffer set
/// first, and only the finished set replaces `active`, together with its index count,
/// in a single assignment. A draw therefore always sees one complete set.
pub struct GpuBufferManager<U: MeshUploader> {
    uploader: U,
    pending: PendingGeometry,
    active: Option<ActiveMeshBuffers<U::Buffers>>,
    /// Number of swaps so far
    generation: u64,
}

impl<U: MeshUploader> GpuBufferManager<U> {
    pub fn new(uploader: U, pending: PendingGeometry) -> Self {
        Self { uploader, pending, active: None, generation: 0 }
    }

    /// Drain the pending slot into the GPU. Returns whether a new set went live.
    pub fn apply_pending_if_any(&mut self) -> bool {
        let Some(record) = self.pending.take() else {
            return false;
        };

        let staged = self.uploader.upload(&record);
        self.generation += 1;
        self.active = Some(ActiveMeshBuffers {
            buffers: staged,
            index_count: record.index_count(),
        });

        tracing::debug!(
            vertices = record.vertex_count(),
            indices = record.index_count(),
            generation = self.generation,
            "uploaded mesh buffers"
        );
        true
    }

    /// Record the mesh draw. Nothing is issued while the index count is zero.
    pub fn draw<P: MeshPass<U::Buffers> + ?Sized>(&self, pass: &mut P) -> bool {
        match &self.active {
            Some(active) if active.index_count > 0 => {
                pass.draw_mesh(&active.buffers, active.index_count);
                true
            }
            _ => false,
        }
    }

    pub fn index_count(&self) -> u32 {
        self.active.as_ref().map_or(0, |a| a.index_count)
    }

    pub fn active(&self) -> Option<&ActiveMeshBuffers<U::Buffers>> {
        self.active.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::cell::Cell;

    use super::*;

    /// Host-memory copy of what would have gone to the GPU.
    #[derive(Debug, Clone, PartialEq)]
    pub struct CpuMesh {
        pub positions: Vec<[f32; 3]>,
        pub normals: Vec<[f32; 3]>,
        pub indices: Vec<u16>,
    }

    #[derive(Default)]
    pub struct CpuUploader {
        pub uploads: Cell<usize>,
    }

    impl MeshUploader for CpuUploader {
        type Buffers = CpuMesh;

        fn upload(&self, record: &GeometryRecord) -> CpuMesh {
            self.uploads.set(self.uploads.get() + 1);
            CpuMesh {
                positions: record.positions().to_vec(),
                normals: record.normals().to_vec(),
                indices: record.indices().to_vec(),
            }
        }
    }

    /// Records each draw as (first position, index count).
    #[derive(Default)]
    pub struct RecordingPass {
        pub draws: Vec<(Option<[f32; 3]>, u32)>,
    }

    impl MeshPass<CpuMesh> for RecordingPass {
        fn draw_mesh(&mut self, buffers: &CpuMesh, index_count: u32) {
            self.draws.push((buffers.positions.first().copied(), index_count));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::controller::GeometryFeedListener;

    fn manager() -> (GpuBufferManager<CpuUploader>, GeometryFeedListener) {
        let pending = PendingGeometry::new();
        let listener = GeometryFeedListener::new(pending.clone());
        (GpuBufferManager::new(CpuUploader::default(), pending), listener)
    }

    fn triangle_at(x: f32) -> String {
        format!(r#"{{"positions":[[{x},0,0],[1,0,0],[0,1,0]],"facesOrIndices":[[0,1,2]]}}"#)
    }

    #[test]
    fn test_zero_state_draw_is_noop() {
        let (buffers, _) = manager();
        let mut pass = RecordingPass::default();
        assert_eq!(buffers.index_count(), 0);
        assert!(!buffers.draw(&mut pass));
        assert!(pass.draws.is_empty());
    }

    #[test]
    fn test_last_write_wins_before_apply() {
        let (mut buffers, mut listener) = manager();
        listener.on_payload(&triangle_at(5.0));
        listener.on_payload(&triangle_at(7.0));
        assert!(buffers.apply_pending_if_any());

        let active = buffers.active().unwrap();
        assert_eq!(active.buffers.positions[0], [7.0, 0.0, 0.0]);
        assert_eq!(buffers.uploader.uploads.get(), 1);
    }

    #[test]
    fn test_invalid_payload_leaves_active_untouched() {
        let (mut buffers, mut listener) = manager();
        listener.on_payload(&triangle_at(2.0));
        buffers.apply_pending_if_any();
        let before = buffers.active().unwrap().buffers.clone();

        assert!(!listener.on_payload(r#"{"positions":[[0,0,0],[1,0,0],[0,1,0]],"facesOrIndices":[[0,1,9]]}"#));
        assert!(!buffers.apply_pending_if_any());

        assert_eq!(buffers.index_count(), 3);
        assert_eq!(buffers.active().unwrap().buffers, before);
        assert_eq!(buffers.generation(), 1);
    }

    #[test]
    fn test_apply_is_idempotent_without_new_pending() {
        let (mut buffers, mut listener) = manager();
        listener.on_payload(&triangle_at(1.0));
        assert!(buffers.apply_pending_if_any());
        let first = buffers.active().unwrap().buffers.clone();

        assert!(!buffers.apply_pending_if_any());
        assert_eq!(buffers.active().unwrap().buffers, first);
        assert_eq!(buffers.generation(), 1);
        assert_eq!(buffers.uploader.uploads.get(), 1);
    }

    #[test]
    fn test_empty_update_clears_drawing() {
        let (mut buffers, mut listener) = manager();
        listener.on_payload(&triangle_at(1.0));
        buffers.apply_pending_if_any();
        listener.on_payload(r#"{"positions":[],"facesOrIndices":[]}"#);
        assert!(buffers.apply_pending_if_any());

        let mut pass = RecordingPass::default();
        assert!(!buffers.draw(&mut pass));
        assert!(pass.draws.is_empty());
        assert_eq!(buffers.generation(), 2);
    }
}
