// MODEL: camera orientation and geometry data
pub mod camera;
pub mod expand;
pub mod geometry;
pub mod payload;
pub mod pending;

pub use camera::{CameraFrame, OrientationState};
pub use expand::{expand_vertex_data, ExpandOptions, ExpandedVertexData};
pub use geometry::GeometryRecord;
pub use payload::GeometryDescription;
pub use pending::PendingGeometry;
