use std::sync::Arc;

use wgpu::util::DeviceExt;
use wgpu::*;

use crate::controller::{FrameSurface, MeshPass, MeshUploader, SceneUniform};
use crate::model::GeometryRecord;
use crate::view::GpuContext;

pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

/// The three GPU buffers of one uploaded mesh.
pub struct MeshBuffers {
    pub positions: Buffer,
    pub normals: Buffer,
    pub indices: Buffer,
}

/// Uploads geometry records as fresh wgpu buffers.
pub struct WgpuMeshUploader {
    device: Arc<Device>,
}

impl WgpuMeshUploader {
    pub fn new(device: Arc<Device>) -> Self {
        Self { device }
    }
}

impl MeshUploader for WgpuMeshUploader {
    type Buffers = MeshBuffers;

    fn upload(&self, record: &GeometryRecord) -> MeshBuffers {
        MeshBuffers {
            positions: buffer_init(
                &self.device,
                "mesh_positions",
                bytemuck::cast_slice(record.positions()),
                BufferUsages::VERTEX,
            ),
            normals: buffer_init(
                &self.device,
                "mesh_normals",
                bytemuck::cast_slice(record.normals()),
                BufferUsages::VERTEX,
            ),
            indices: buffer_init(
                &self.device,
                "mesh_indices",
                bytemuck::cast_slice(record.indices()),
                BufferUsages::INDEX,
            ),
        }
    }
}

/// Empty meshes still get a small buffer so the set is always complete.
fn buffer_init(device: &Device, label: &str, contents: &[u8], usage: BufferUsages) -> Buffer {
    const PLACEHOLDER: [u8; COPY_BUFFER_ALIGNMENT as usize] = [0; COPY_BUFFER_ALIGNMENT as usize];
    let contents = if contents.is_empty() { &PLACEHOLDER[..] } else { contents };
    device.create_buffer_init(&util::BufferInitDescriptor { label: Some(label), contents, usage })
}

impl MeshPass<MeshBuffers> for RenderPass<'_> {
    fn draw_mesh(&mut self, buffers: &MeshBuffers, index_count: u32) {
        self.set_vertex_buffer(0, buffers.positions.slice(..));
        self.set_vertex_buffer(1, buffers.normals.slice(..));
        self.set_index_buffer(buffers.indices.slice(..), IndexFormat::Uint16);
        self.draw_indexed(0..index_count, 0, 0..1);
    }
}

pub fn create_depth_texture(device: &Device, width: u32, height: u32) -> (Texture, TextureView) {
    let depth_texture = device.create_texture(&TextureDescriptor {
        label: Some("depth_texture"),
        size: Extent3d { width, height, depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth_texture.create_view(&TextureViewDescriptor::default());
    (depth_texture, depth_view)
}

pub struct SceneResources {
    pub scene_buffer: Buffer,
    pub bind_group_layout: BindGroupLayout,
    pub scene_bind_group: BindGroup,
}

pub fn create_scene_resources(device: &Device) -> SceneResources {
    let scene_buffer = device.create_buffer(&BufferDescriptor {
        label: Some("scene_buffer"),
        size: std::mem::size_of::<SceneUniform>() as BufferAddress,
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let bind_group_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("scene_bind_group_layout"),
        entries: &[BindGroupLayoutEntry {
            binding: 0,
            visibility: ShaderStages::VERTEX | ShaderStages::FRAGMENT,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    });

    let scene_bind_group = device.create_bind_group(&BindGroupDescriptor {
        label: Some("scene_bind_group"),
        layout: &bind_group_layout,
        entries: &[BindGroupEntry { binding: 0, resource: scene_buffer.as_entire_binding() }],
    });

    SceneResources { scene_buffer, bind_group_layout, scene_bind_group }
}

pub fn create_mesh_pipeline(
    device: &Device,
    format: TextureFormat,
    bind_group_layout: &BindGroupLayout,
) -> RenderPipeline {
    let shader = device.create_shader_module(ShaderModuleDescriptor {
        label: Some("mesh_shader"),
        source: ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("mesh_pipeline_layout"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    // Positions and normals live in separate buffers
    let vec3_stride = std::mem::size_of::<[f32; 3]>() as BufferAddress;

    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("mesh_pipeline"),
        layout: Some(&pipeline_layout),
        vertex: VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[
                VertexBufferLayout {
                    array_stride: vec3_stride,
                    step_mode: VertexStepMode::Vertex,
                    attributes: &[VertexAttribute { offset: 0, shader_location: 0, format: VertexFormat::Float32x3 }],
                },
                VertexBufferLayout {
                    array_stride: vec3_stride,
                    step_mode: VertexStepMode::Vertex,
                    attributes: &[VertexAttribute { offset: 0, shader_location: 1, format: VertexFormat::Float32x3 }],
                },
            ],
            compilation_options: Default::default(),
        },
        fragment: Some(FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(ColorTargetState { format, blend: Some(BlendState::REPLACE), write_mask: ColorWrites::ALL })],
            compilation_options: Default::default(),
        }),
        primitive: PrimitiveState {
            topology: PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: FrontFace::Ccw,
            // Streamed meshes carry no winding guarantee
            cull_mode: None,
            polygon_mode: PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        }),
        multisample: MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    })
}

///////////////////////////////////////////////////////////////////////////////

/// Everything needed to present a frame on the window or canvas surface.
pub struct SurfaceRenderer {
    gpu: GpuContext,
    pipeline: RenderPipeline,
    scene: SceneResources,
    _depth_texture: Texture,
    depth_view: TextureView,
    clear_color: Color,
}

impl SurfaceRenderer {
    pub fn new(gpu: GpuContext, clear_color: Color) -> Self {
        let scene = create_scene_resources(&gpu.device);
        let pipeline = create_mesh_pipeline(&gpu.device, gpu.format, &scene.bind_group_layout);
        let (depth_texture, depth_view) = create_depth_texture(&gpu.device, gpu.config.width, gpu.config.height);
        Self { gpu, pipeline, scene, _depth_texture: depth_texture, depth_view, clear_color }
    }

    pub fn uploader(&self) -> WgpuMeshUploader {
        WgpuMeshUploader::new(self.gpu.device.clone())
    }

    /// Re-apply the surface configuration at `width` x `height` physical pixels and
    /// rebuild the depth buffer to match. Returns `false` for a zero-sized surface,
    /// which cannot be configured; nothing should be drawn until it grows again.
    pub fn reconfigure(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.gpu.config.width = width;
        self.gpu.config.height = height;
        self.gpu.surface.configure(&self.gpu.device, &self.gpu.config);

        let (depth_texture, depth_view) = create_depth_texture(&self.gpu.device, width, height);
        self._depth_texture = depth_texture;
        self.depth_view = depth_view;

        tracing::debug!(width, height, "surface reconfigured");
        true
    }

    /// Current configured size in physical pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.gpu.config.width, self.gpu.config.height)
    }
}

/// What the frame driver does after a failed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceRecovery {
    /// Drop this frame and try again on the next one.
    Skip,
    /// The swapchain no longer matches the window; reconfigure, then continue.
    Reconfigure,
    /// Stop rendering.
    Fatal,
}

impl SurfaceRecovery {
    pub fn for_error(error: &SurfaceError) -> Self {
        match error {
            SurfaceError::Timeout => Self::Skip,
            SurfaceError::Outdated => Self::Reconfigure,
            _ => Self::Fatal,
        }
    }
}

impl FrameSurface for SurfaceRenderer {
    type Buffers = MeshBuffers;
    type Error = SurfaceError;

    fn render_frame<F>(&mut self, uniforms: &SceneUniform, record: F) -> Result<(), SurfaceError>
    where
        F: FnOnce(&mut dyn MeshPass<MeshBuffers>),
    {
        let frame = self.gpu.surface.get_current_texture()?;
        let view = frame.texture.create_view(&TextureViewDescriptor::default());

        self.gpu.queue.write_buffer(&self.scene.scene_buffer, 0, bytemuck::bytes_of(uniforms));

        let mut encoder = self.gpu.device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("frame_encoder"),
        });

        {
            let mut rp = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("mesh_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(self.clear_color),
                        store: StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            rp.set_pipeline(&self.pipeline);
            rp.set_bind_group(0, &self.scene.scene_bind_group, &[]);
            record(&mut rp);
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outdated_surface_is_reconfigured() {
        assert_eq!(SurfaceRecovery::for_error(&SurfaceError::Outdated), SurfaceRecovery::Reconfigure);
    }

    #[test]
    fn test_timeout_skips_one_frame() {
        assert_eq!(SurfaceRecovery::for_error(&SurfaceError::Timeout), SurfaceRecovery::Skip);
    }

    #[test]
    fn test_lost_and_out_of_memory_are_fatal() {
        assert_eq!(SurfaceRecovery::for_error(&SurfaceError::Lost), SurfaceRecovery::Fatal);
        assert_eq!(SurfaceRecovery::for_error(&SurfaceError::OutOfMemory), SurfaceRecovery::Fatal);
    }
}
