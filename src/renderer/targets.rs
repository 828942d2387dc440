use anyhow::{ensure, Result};

/// Storage format shared by all three targets. Written by the compute pass,
/// sampled by the display pass.
pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// GPU images written by the voxel compute pass, sized to the viewport panel.
///
/// Resizing is whole-value replacement only: the owner drops the old set and
/// creates a new one. Nothing here is mutated in place after creation.
pub struct RenderTargets {
    _albedo: wgpu::Texture,
    _depth: wgpu::Texture,
    _normal: wgpu::Texture,
    albedo_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    normal_view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl RenderTargets {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Result<Self> {
        ensure!(width > 0 && height > 0, "Render targets require non-zero dimensions");
        let max_dim = device.limits().max_texture_dimension_2d;
        ensure!(
            width <= max_dim && height <= max_dim,
            "Render target size {width}x{height} exceeds device limit {max_dim}"
        );

        let make = |label: &str| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: TARGET_FORMAT,
                usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            })
        };

        let albedo = make("Albedo Target");
        let depth = make("Depth Target");
        let normal = make("Normal Target");

        let albedo_view = albedo.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());
        let normal_view = normal.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self {
            _albedo: albedo,
            _depth: depth,
            _normal: normal,
            albedo_view,
            depth_view,
            normal_view,
            width,
            height,
        })
    }

    pub fn albedo_view(&self) -> &wgpu::TextureView {
        &self.albedo_view
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    pub fn normal_view(&self) -> &wgpu::TextureView {
        &self.normal_view
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
