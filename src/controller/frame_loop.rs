use std::cell::RefCell;
use std::rc::Rc;

use glam::{Mat4, Vec3};

use crate::controller::camera_controller::CameraController;
use crate::controller::gpu_buffers::{GpuBufferManager, MeshPass, MeshUploader};
use crate::model::camera::{self, CameraFrame};

/// Uniform block shared by the mesh vertex and fragment stages.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniform {
    pub model_view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub light_position: [f32; 3],
    pub _pad0: f32,
    pub camera_position: [f32; 3],
    pub _pad1: f32,
}

impl SceneUniform {
    pub fn new(frame: &CameraFrame, projection: Mat4, light_position: Vec3) -> Self {
        Self {
            model_view: frame.view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            light_position: light_position.to_array(),
            _pad0: 0.0,
            camera_position: frame.eye.to_array(),
            _pad1: 0.0,
        }
    }
}

/// One presentable frame: clear, upload uniforms, record draws, present.
pub trait FrameSurface {
    type Buffers;
    type Error;

    /// Clear color and depth, write `uniforms`, let `record` issue draws into the
    /// pass, then submit and present.
    fn render_frame<F>(&mut self, uniforms: &SceneUniform, record: F) -> Result<(), Self::Error>
    where
        F: FnOnce(&mut dyn MeshPass<Self::Buffers>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    NotStarted,
    Running,
}

/// Per-tick driver tying camera, pending geometry and drawing together.
pub struct RenderLoop<U: MeshUploader> {
    camera: Rc<RefCell<CameraController>>,
    buffers: GpuBufferManager<U>,
    projection: Mat4,
    light_position: Vec3,
    state: LoopState,
    ticks: u64,
}

impl<U: MeshUploader> RenderLoop<U> {
    pub fn new(
        camera: Rc<RefCell<CameraController>>,
        buffers: GpuBufferManager<U>,
        light_position: Vec3,
    ) -> Self {
        Self {
            camera,
            buffers,
            projection: camera::projection(),
            light_position,
            state: LoopState::NotStarted,
            ticks: 0,
        }
    }

    pub fn start(&mut self) {
        if self.state == LoopState::Running {
            tracing::warn!("render loop already running");
            return;
        }
        self.state = LoopState::Running;
        tracing::info!(light = ?self.light_position, "render loop started");
    }

    /// Run one frame. Ticks before [`start`](Self::start) do nothing.
    ///
    /// Pending geometry is applied before the frame's draw is recorded, so the draw
    /// sees the previous complete buffer set or the new one, never a mix.
    pub fn tick<S>(&mut self, surface: &mut S) -> Result<(), S::Error>
    where
        S: FrameSurface<Buffers = U::Buffers>,
    {
        if self.state != LoopState::Running {
            return Ok(());
        }

        let frame = self.camera.borrow().compute_frame();
        let uniforms = SceneUniform::new(&frame, self.projection, self.light_position);

        self.buffers.apply_pending_if_any();

        let buffers = &self.buffers;
        surface.render_frame(&uniforms, |pass| {
            buffers.draw(pass);
        })?;

        self.ticks += 1;
        Ok(())
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn buffers(&self) -> &GpuBufferManager<U> {
        &self.buffers
    }
}
