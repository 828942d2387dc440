mod egui_pass;
mod targets;
mod voxel_pass;
mod window_surface;

pub use targets::{RenderTargets, TARGET_FORMAT};
pub use voxel_pass::{Globals, VoxelPass};
pub use window_surface::{SurfaceFrame, WindowSurface};

use anyhow::{Context, Result};
use egui_wgpu::{Renderer as EguiRenderer, ScreenDescriptor};
use winit::dpi::PhysicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::Window;

use crate::config::WindowConfig;
use crate::voxel::VoxelGrid;

/// Format of the texture the viewport panel displays through egui.
pub const PANEL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Facade over the window surface, the voxel pass and its render targets.
pub struct Renderer {
    surface: WindowSurface,
    targets: Option<RenderTargets>,
    voxel_pass: Option<VoxelPass>,
}

impl Renderer {
    pub fn new(window_cfg: &WindowConfig) -> Self {
        Self { surface: WindowSurface::new(window_cfg), targets: None, voxel_pass: None }
    }

    pub fn ensure_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        self.surface.ensure_window(event_loop)
    }

    /// Upload the density grid and build the compute/display pipelines.
    pub fn init_voxel_pass(&mut self, grid: &VoxelGrid) -> Result<()> {
        let (device, queue) = self.surface.device_and_queue()?;
        self.voxel_pass = Some(VoxelPass::new(device, queue, grid)?);
        Ok(())
    }

    pub fn device(&self) -> Result<&wgpu::Device> {
        self.surface.device()
    }

    pub fn queue(&self) -> Result<&wgpu::Queue> {
        self.surface.queue()
    }

    pub fn window(&self) -> Option<&Window> {
        self.surface.window()
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.surface.size()
    }

    pub fn surface_format(&self) -> Result<wgpu::TextureFormat> {
        self.surface.surface_format()
    }

    pub fn pixels_per_point(&self) -> f32 {
        self.surface.pixels_per_point()
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.surface.aspect_ratio()
    }

    /// Authoritative window size: queried from the OS window when one
    /// exists, not from the value cached at the last resize event.
    pub fn window_size(&self) -> (u32, u32) {
        match self.surface.window() {
            Some(window) => {
                let size = window.inner_size();
                (size.width, size.height)
            }
            None => (self.surface.size().width, self.surface.size().height),
        }
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.surface.resize(new_size);
    }

    pub fn targets(&self) -> Option<&RenderTargets> {
        self.targets.as_ref()
    }

    /// Destroy-then-recreate the render targets at the given size.
    ///
    /// The old set is dropped before the new one is built; the compute
    /// bindings are invalidated with it and must be rebuilt through
    /// [`Renderer::rebind_compute_targets`] before the next dispatch.
    pub fn recreate_targets(&mut self, width: u32, height: u32) -> Result<()> {
        if let Some(pass) = self.voxel_pass.as_mut() {
            pass.invalidate_target_bindings();
        }
        self.targets = None;
        let device = self.surface.device()?;
        self.targets = Some(
            RenderTargets::new(device, width, height)
                .with_context(|| format!("Failed to recreate render targets at {width}x{height}"))?,
        );
        Ok(())
    }

    pub fn rebind_compute_targets(&mut self) -> Result<()> {
        let device = self.surface.device()?;
        let targets = self.targets.as_ref().context("Render targets missing")?;
        let pass = self.voxel_pass.as_mut().context("Voxel pass not initialized")?;
        pass.bind_targets(device, targets);
        Ok(())
    }

    pub fn write_globals(&self, globals: &Globals) -> Result<()> {
        let queue = self.surface.queue()?;
        let pass = self.voxel_pass.as_ref().context("Voxel pass not initialized")?;
        pass.write_globals(queue, globals);
        Ok(())
    }

    /// Run the voxel passes for this frame and hand back the surface frame
    /// for the egui pass. Dispatch happens only once a panel texture and
    /// render targets both exist.
    pub fn render_scene(&mut self, panel_view: Option<&wgpu::TextureView>) -> Result<SurfaceFrame> {
        let frame = self.surface.acquire_surface_frame()?;
        if let (Some(pass), Some(targets), Some(panel_view)) =
            (self.voxel_pass.as_ref(), self.targets.as_ref(), panel_view)
        {
            let (device, queue) = self.surface.device_and_queue()?;
            let mut encoder = device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("Voxel Encoder") });
            pass.encode(&mut encoder, targets, panel_view)?;
            queue.submit(std::iter::once(encoder.finish()));
        }
        Ok(frame)
    }

    pub fn render_egui(
        &mut self,
        painter: &mut EguiRenderer,
        paint_jobs: &[egui::ClippedPrimitive],
        screen: &ScreenDescriptor,
        frame: SurfaceFrame,
    ) -> Result<()> {
        let (device, queue) = self.surface.device_and_queue()?;
        egui_pass::render(device, queue, painter, paint_jobs, screen, frame)
    }
}
