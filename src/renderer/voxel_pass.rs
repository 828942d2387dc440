use anyhow::{Context, Result};

use super::targets::{RenderTargets, TARGET_FORMAT};
use super::PANEL_FORMAT;
use crate::camera::Camera;
use crate::voxel::VoxelGrid;

const WORKGROUP_SIZE: u32 = 8;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Globals {
    view_proj: [[f32; 4]; 4],
    inv_view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    grid_dims: [f32; 4],
}

impl Globals {
    pub fn new(camera: &Camera, grid_extent: (u32, u32, u32)) -> Self {
        let view_proj = camera.view_project();
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            inv_view_proj: view_proj.inverse().to_cols_array_2d(),
            camera_pos: camera.position.extend(1.0).to_array(),
            grid_dims: [
                grid_extent.0 as f32,
                grid_extent.1 as f32,
                grid_extent.2 as f32,
                0.0,
            ],
        }
    }
}

/// Raymarches the voxel density texture in a compute pass, then composites
/// the albedo target into the viewport panel texture.
pub struct VoxelPass {
    compute_pipeline: wgpu::ComputePipeline,
    display_pipeline: wgpu::RenderPipeline,
    globals_buf: wgpu::Buffer,
    scene_bg: wgpu::BindGroup,
    target_bgl: wgpu::BindGroupLayout,
    display_bgl: wgpu::BindGroupLayout,
    display_sampler: wgpu::Sampler,
    // Rebuilt whenever the render targets are recreated. Encoding with a
    // binding older than the current targets is a hard error.
    target_bg: Option<wgpu::BindGroup>,
    display_bg: Option<wgpu::BindGroup>,
    _voxel_texture: wgpu::Texture,
}

impl VoxelPass {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, grid: &VoxelGrid) -> Result<Self> {
        let (gw, gh, gd) = grid.extent();
        let voxel_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Voxel Density"),
            size: wgpu::Extent3d { width: gw, height: gh, depth_or_array_layers: gd },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D3,
            format: wgpu::TextureFormat::R32Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &voxel_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            grid.as_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * gw),
                rows_per_image: Some(gh),
            },
            wgpu::Extent3d { width: gw, height: gh, depth_or_array_layers: gd },
        );
        let voxel_view = voxel_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let globals_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Globals Buffer"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let scene_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene BGL"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D3,
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    },
                    count: None,
                },
            ],
        });
        let scene_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene BG"),
            layout: &scene_bgl,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: globals_buf.as_entire_binding() },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&voxel_view),
                },
            ],
        });

        let storage_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::StorageTexture {
                access: wgpu::StorageTextureAccess::WriteOnly,
                format: TARGET_FORMAT,
                view_dimension: wgpu::TextureViewDimension::D2,
            },
            count: None,
        };
        let target_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Target BGL"),
            entries: &[storage_entry(0), storage_entry(1), storage_entry(2)],
        });

        let compute_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Voxel Raymarch Shader"),
            source: wgpu::ShaderSource::Wgsl(
                include_str!("../../assets/shaders/voxel_raymarch.wgsl").into(),
            ),
        });
        let compute_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Voxel Compute Layout"),
            bind_group_layouts: &[&scene_bgl, &target_bgl],
            push_constant_ranges: &[],
        });
        let compute_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Voxel Raymarch Pipeline"),
            layout: Some(&compute_layout),
            module: &compute_shader,
            entry_point: Some("cs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        let display_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Display BGL"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let display_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Display Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let display_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Viewport Blit Shader"),
            source: wgpu::ShaderSource::Wgsl(
                include_str!("../../assets/shaders/viewport_blit.wgsl").into(),
            ),
        });
        let display_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Display Layout"),
            bind_group_layouts: &[&display_bgl],
            push_constant_ranges: &[],
        });
        let display_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Viewport Blit Pipeline"),
            layout: Some(&display_layout),
            vertex: wgpu::VertexState {
                module: &display_shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &display_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: PANEL_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Ok(Self {
            compute_pipeline,
            display_pipeline,
            globals_buf,
            scene_bg,
            target_bgl,
            display_bgl,
            display_sampler,
            target_bg: None,
            display_bg: None,
            _voxel_texture: voxel_texture,
        })
    }

    /// Rebuild the target-facing bind groups against freshly created targets.
    pub fn bind_targets(&mut self, device: &wgpu::Device, targets: &RenderTargets) {
        self.target_bg = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Target BG"),
            layout: &self.target_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(targets.albedo_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(targets.depth_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(targets.normal_view()),
                },
            ],
        }));
        self.display_bg = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Display BG"),
            layout: &self.display_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(targets.albedo_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.display_sampler),
                },
            ],
        }));
    }

    /// Drop the target-facing bind groups. Called when the targets they point
    /// at are destroyed, so a stale binding can never reach a dispatch.
    pub fn invalidate_target_bindings(&mut self) {
        self.target_bg = None;
        self.display_bg = None;
    }

    pub fn write_globals(&self, queue: &wgpu::Queue, globals: &Globals) {
        queue.write_buffer(&self.globals_buf, 0, bytemuck::bytes_of(globals));
    }

    /// Record the compute dispatch and the panel composite for one frame.
    pub fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        targets: &RenderTargets,
        panel_view: &wgpu::TextureView,
    ) -> Result<()> {
        let target_bg = self.target_bg.as_ref().context("Compute targets not bound")?;
        let display_bg = self.display_bg.as_ref().context("Display targets not bound")?;
        let (width, height) = targets.size();

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Voxel Raymarch Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.compute_pipeline);
            pass.set_bind_group(0, &self.scene_bg, &[]);
            pass.set_bind_group(1, target_bg, &[]);
            pass.dispatch_workgroups(
                width.div_ceil(WORKGROUP_SIZE),
                height.div_ceil(WORKGROUP_SIZE),
                1,
            );
        }

        // The pass boundary is the compute-to-sample barrier; the display
        // draw below must stay in submission order after the dispatch.
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Viewport Blit Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: panel_view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r: 0.05, g: 0.06, b: 0.1, a: 1.0 }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.display_pipeline);
            pass.set_bind_group(0, display_bg, &[]);
            pass.draw(0..3, 0..1);
        }

        Ok(())
    }
}
