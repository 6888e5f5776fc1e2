//! wgpu implementation of [`OrthographicDepthSource`].

use std::collections::HashMap;
use std::num::NonZeroU64;

use alphamask_core::{
    CaptureError, OrthoCamera, OrthographicDepthSource, PixelGrid, RenderTargetId,
};

use crate::error::GpuError;
use crate::mesh::{GpuMesh, SceneMesh};
use crate::readback::read_r32float;

/// Colour format of the depth visualization target.
pub const DEPTH_VIS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
}

/// Off-screen colour + depth attachments for one capture.
struct DepthTarget {
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    size: u32,
}

/// Rasterizes [`SceneMesh`]es through the depth-visualization shader.
pub struct GpuDepthSource {
    device: wgpu::Device,
    queue: wgpu::Queue,
    /// `None` when the adapter cannot render the visualization format.
    pipeline: Option<wgpu::RenderPipeline>,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    meshes: Vec<GpuMesh>,
    targets: HashMap<RenderTargetId, DepthTarget>,
    next_id: u64,
    max_target_size: u32,
}

/// Whether `adapter` can render into the visualization format.
pub fn adapter_supports_depth_visualization(adapter: &wgpu::Adapter) -> bool {
    adapter
        .get_texture_format_features(DEPTH_VIS_FORMAT)
        .allowed_usages
        .contains(wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC)
}

impl GpuDepthSource {
    /// Request an adapter and device and build the source. Blocks.
    pub fn create_blocking() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            ..Default::default()
        }))?;
        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("alphamask_device"),
            required_limits: adapter.limits(),
            ..Default::default()
        }))?;
        tracing::info!("GPU depth source using adapter {}", adapter.get_info().name);
        Ok(Self::new(device, queue, &adapter))
    }

    /// Build the source on an existing device.
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, adapter: &wgpu::Adapter) -> Self {
        let depth_supported = adapter_supports_depth_visualization(adapter);
        if !depth_supported {
            tracing::warn!("adapter cannot render {DEPTH_VIS_FORMAT:?}; depth capture disabled");
        }

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("alphamask_camera_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(size_of::<CameraUniform>() as u64),
                },
                count: None,
            }],
        });

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("alphamask_camera_uniform"),
            size: size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("alphamask_camera_bind_group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let pipeline = depth_supported.then(|| create_pipeline(&device, &camera_layout));

        let max_target_size = device.limits().max_texture_dimension_2d;

        Self {
            device,
            queue,
            pipeline,
            camera_buffer,
            camera_bind_group,
            meshes: Vec::new(),
            targets: HashMap::new(),
            next_id: 1,
            max_target_size,
        }
    }

    /// Upload a mesh into the scene. Empty meshes are skipped.
    pub fn add_mesh(&mut self, mesh: &SceneMesh) {
        if mesh.indices.is_empty() {
            return;
        }
        self.meshes.push(GpuMesh::upload(&self.device, mesh));
    }

    pub fn clear_meshes(&mut self) {
        self.meshes.clear();
    }

    /// Targets allocated and not yet released.
    pub fn live_targets(&self) -> usize {
        self.targets.len()
    }

    fn create_depth_target(&self, size: u32) -> DepthTarget {
        let extent = wgpu::Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: 1,
        };
        let color = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("alphamask_depth_vis_target"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_VIS_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let depth = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("alphamask_depth_attachment"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        DepthTarget {
            color_view: color.create_view(&wgpu::TextureViewDescriptor::default()),
            depth_view: depth.create_view(&wgpu::TextureViewDescriptor::default()),
            color,
            size,
        }
    }

    fn unsupported(&self) -> CaptureError {
        CaptureError::UnsupportedBackend {
            backend: self.backend_name().to_string(),
        }
    }

    fn target(&self, id: RenderTargetId) -> Result<&DepthTarget, GpuError> {
        self.targets.get(&id).ok_or(GpuError::UnknownTarget(id))
    }
}

/// Depth-visualization pipeline. Only built when the adapter can render
/// [`DEPTH_VIS_FORMAT`]; wgpu rejects the colour state otherwise.
fn create_pipeline(
    device: &wgpu::Device,
    camera_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("alphamask_render_depth_shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/render_depth.wgsl").into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("alphamask_render_depth_pipeline_layout"),
        bind_group_layouts: &[camera_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("alphamask_render_depth_pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: size_of::<[f32; 3]>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &VERTEX_ATTRIBUTES,
            }],
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: DEPTH_VIS_FORMAT,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        multiview: None,
        cache: None,
    })
}

impl OrthographicDepthSource for GpuDepthSource {
    fn backend_name(&self) -> &str {
        "wgpu"
    }

    fn supports_depth_visualization(&self) -> bool {
        self.pipeline.is_some()
    }

    fn create_target(&mut self, size: u32) -> Result<RenderTargetId, CaptureError> {
        if self.pipeline.is_none() {
            return Err(self.unsupported());
        }
        if size > self.max_target_size {
            return Err(GpuError::TargetTooLarge {
                size,
                limit: self.max_target_size,
            }
            .into());
        }
        let id = RenderTargetId(self.next_id);
        self.next_id += 1;
        let target = self.create_depth_target(size);
        self.targets.insert(id, target);
        Ok(id)
    }

    fn render_depth(
        &mut self,
        camera: &OrthoCamera,
        target: RenderTargetId,
    ) -> Result<(), CaptureError> {
        let Some(pipeline) = &self.pipeline else {
            return Err(self.unsupported());
        };
        let target = self.target(target)?;

        let uniform = CameraUniform {
            view_proj: camera.view_projection().to_cols_array_2d(),
        };
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&uniform));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("alphamask_render_depth_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("alphamask_render_depth_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.color_view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &self.camera_bind_group, &[]);
            for mesh in &self.meshes {
                pass.set_vertex_buffer(0, mesh.vertices.slice(..));
                pass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(GpuError::from)?;

        tracing::debug!(
            size = target.size,
            meshes = self.meshes.len(),
            "rendered depth visualization"
        );
        Ok(())
    }

    fn read_target(&mut self, target: RenderTargetId) -> Result<PixelGrid, CaptureError> {
        let target = self.target(target)?;
        let intensities = read_r32float(&self.device, &self.queue, &target.color, target.size)?;
        PixelGrid::from_depth(target.size, &intensities)
    }

    fn release_target(&mut self, target: RenderTargetId) {
        if let Some(t) = self.targets.remove(&target) {
            t.color.destroy();
        }
    }
}
