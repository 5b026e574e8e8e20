// CONTROLLER: input, feed handling, buffer swaps and the frame loop
pub mod input;
pub mod camera_controller;
pub mod feed_listener;
pub mod gpu_buffers;
pub mod frame_loop;

pub use input::{PointerEvent, PointerTracker};
pub use camera_controller::CameraController;
pub use feed_listener::GeometryFeedListener;
pub use gpu_buffers::{ActiveMeshBuffers, GpuBufferManager, MeshPass, MeshUploader};
pub use frame_loop::{FrameSurface, LoopState, RenderLoop, SceneUniform};
