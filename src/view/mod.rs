// VIEW: GPU setup and rendering
pub mod render;
pub mod gpu_init;

pub use render::{MeshBuffers, SurfaceRecovery, SurfaceRenderer, WgpuMeshUploader};
pub use gpu_init::GpuContext;
