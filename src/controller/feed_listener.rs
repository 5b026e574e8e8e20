use crate::error::FeedError;
use crate::model::{expand_vertex_data, ExpandOptions, GeometryDescription, GeometryRecord, PendingGeometry};

/// Decodes feed payloads and publishes them as pending geometry.
///
/// Malformed payloads are dropped here and never reach the render loop.
pub struct GeometryFeedListener {
    pending: PendingGeometry,
    options: ExpandOptions,
    accepted: u64,
    dropped: u64,
}

impl GeometryFeedListener {
    pub fn new(pending: PendingGeometry) -> Self {
        Self {
            pending,
            options: ExpandOptions { faces_to_triangles: true },
            accepted: 0,
            dropped: 0,
        }
    }

    /// Handle one inbound message. Returns whether it was published.
    pub fn on_payload(&mut self, raw: &str) -> bool {
        match decode_payload(raw, self.options) {
            Ok(record) => {
                let vertices = record.vertex_count();
                let indices = record.index_count();
                if self.pending.publish(record).is_some() {
                    tracing::debug!("superseded unconsumed pending geometry");
                }
                self.accepted += 1;
                tracing::debug!(vertices, indices, "geometry payload accepted");
                true
            }
            Err(e) => {
                self.dropped += 1;
                tracing::warn!(error = %e, bytes = raw.len(), "dropping malformed geometry payload");
                false
            }
        }
    }

    /// Binary frames are accepted when they carry UTF-8 JSON.
    pub fn on_binary_payload(&mut self, raw: &[u8]) -> bool {
        match std::str::from_utf8(raw) {
            Ok(text) => self.on_payload(text),
            Err(_) => {
                let e = FeedError::NotUtf8;
                self.dropped += 1;
                tracing::warn!(error = %e, bytes = raw.len(), "dropping malformed geometry payload");
                false
            }
        }
    }

    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Parse, expand and validate one payload.
pub fn decode_payload(raw: &str, options: ExpandOptions) -> Result<GeometryRecord, FeedError> {
    let description = GeometryDescription::from_json(raw)?;
    let expanded = expand_vertex_data(&description, options)?;
    GeometryRecord::from_expanded(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = r#"{"positions":[[0,0,0],[1,0,0],[0,1,0]],"facesOrIndices":[[0,1,2]]}"#;
    const QUAD: &str = r#"{"positions":[[0,0,0],[1,0,0],[1,1,0],[0,1,0]],"facesOrIndices":[[0,1,2,3]]}"#;

    #[test]
    fn test_valid_payload_is_published() {
        let pending = PendingGeometry::new();
        let mut listener = GeometryFeedListener::new(pending.clone());
        assert!(listener.on_payload(TRIANGLE));
        let record = pending.take().unwrap();
        assert_eq!(record.index_count(), 3);
        assert_eq!(record.positions(), &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        assert_eq!(listener.accepted(), 1);
    }

    #[test]
    fn test_second_payload_overwrites_first() {
        let pending = PendingGeometry::new();
        let mut listener = GeometryFeedListener::new(pending.clone());
        listener.on_payload(TRIANGLE);
        listener.on_payload(QUAD);
        assert_eq!(pending.take().unwrap().index_count(), 6);
        assert!(pending.take().is_none());
    }

    #[test]
    fn test_malformed_payload_keeps_previous_pending() {
        let pending = PendingGeometry::new();
        let mut listener = GeometryFeedListener::new(pending.clone());
        listener.on_payload(TRIANGLE);

        assert!(!listener.on_payload("{ not json"));
        assert!(!listener.on_payload(r#"{"positions":[[0,0,0]],"facesOrIndices":[[0,1,2]]}"#));
        assert!(!listener.on_payload(r#"{"positions":[[0,0,0],[1,0,0],[0,1,0]],"indices":[0,1]}"#));

        assert_eq!(listener.dropped(), 3);
        assert_eq!(pending.take().unwrap().index_count(), 3);
    }

    #[test]
    fn test_binary_payload() {
        let pending = PendingGeometry::new();
        let mut listener = GeometryFeedListener::new(pending.clone());
        assert!(listener.on_binary_payload(TRIANGLE.as_bytes()));
        assert!(!listener.on_binary_payload(&[0xff, 0xfe, 0x00]));
        assert_eq!(listener.dropped(), 1);
        assert!(pending.take().is_some());
    }
}
