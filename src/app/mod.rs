pub mod frame_update;
mod ui_windows;
mod viewport_panel;

pub use viewport_panel::ViewportPanel;

use crate::camera::{self, Camera};
use crate::config::{AppConfig, AppConfigOverrides};
use crate::input::{Input, InputEvent};
use crate::renderer::{Globals, Renderer};
use crate::time::{FrameData, FrameTimer};
use crate::update_flags::UpdateFlags;
use crate::voxel::VoxelGrid;

use anyhow::{Context, Result};
use glam::Vec3;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};

use egui::Context as EguiCtx;
use egui_wgpu::{Renderer as EguiRenderer, RendererOptions, ScreenDescriptor};
use egui_winit::State as EguiWinit;

pub fn run() -> Result<()> {
    run_with_overrides(AppConfigOverrides::default())
}

pub fn run_with_overrides(overrides: AppConfigOverrides) -> Result<()> {
    let mut config = AppConfig::load_or_default("config/app.json");
    config.apply_overrides(&overrides);
    let event_loop = EventLoop::new().context("Failed to create winit event loop")?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app).context("Event loop execution failed")?;
    Ok(())
}

pub struct App {
    config: AppConfig,
    renderer: Renderer,
    camera: Camera,
    input: Input,
    flags: UpdateFlags,
    timer: FrameTimer,
    frame_data: FrameData,
    panel: ViewportPanel,
    grid: VoxelGrid,
    should_close: bool,

    // egui
    egui_ctx: EguiCtx,
    egui_winit: Option<EguiWinit>,
    egui_renderer: Option<EguiRenderer>,
    egui_screen: Option<ScreenDescriptor>,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let mut camera = Camera::new(camera::DEFAULT_POSITION, Vec3::ZERO);
        camera.fov_deg = config.camera.fov_deg.clamp(camera::FOV_MIN_DEG, camera::FOV_MAX_DEG);
        camera.set_clip(config.camera.near_clip, config.camera.far_clip);
        camera
            .set_aspect_ratio(config.window.width as f32 / config.window.height.max(1) as f32);
        camera.update_view();
        camera.update_project();

        let size = config.voxel.grid_size.max(1);
        let mut grid = VoxelGrid::new(size, size, size);
        let half = size as f32 * 0.5;
        grid.fill_sphere(Vec3::splat(half), config.voxel.sphere_radius.clamp(0.0, 1.0) * half);

        let renderer = Renderer::new(&config.window);

        Self {
            config,
            renderer,
            camera,
            input: Input::new(),
            flags: UpdateFlags::empty(),
            timer: FrameTimer::new(),
            frame_data: FrameData::default(),
            panel: ViewportPanel::new(),
            grid,
            should_close: false,
            egui_ctx: EguiCtx::default(),
            egui_winit: None,
            egui_renderer: None,
            egui_screen: None,
        }
    }
}

/// The real implementor of the resize contract: render targets and the panel
/// texture on the viewport side, the wgpu surface on the window side.
struct AppSurfaces<'a> {
    renderer: &'a mut Renderer,
    panel: &'a mut ViewportPanel,
    egui_renderer: &'a mut EguiRenderer,
}

impl frame_update::FrameSurfaces for AppSurfaces<'_> {
    fn viewport_size(&self) -> (u32, u32) {
        self.panel.size()
    }

    fn window_size(&self) -> (u32, u32) {
        self.renderer.window_size()
    }

    fn recreate_render_targets(&mut self, width: u32, height: u32) -> Result<()> {
        self.renderer.recreate_targets(width, height)?;
        let device = self.renderer.device()?;
        self.panel.rebuild(device, self.egui_renderer, width, height)
    }

    fn resize_window_surface(&mut self, width: u32, height: u32) -> Result<()> {
        self.renderer.resize(PhysicalSize::new(width, height));
        Ok(())
    }

    fn rebind_compute_targets(&mut self) -> Result<()> {
        self.renderer.rebind_compute_targets()
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(err) = self.renderer.ensure_window(event_loop) {
            log::error!("Renderer initialization error: {err:?}");
            self.should_close = true;
            return;
        }

        if self.egui_winit.is_none() {
            if let Some(window) = self.renderer.window() {
                let state = EguiWinit::new(
                    self.egui_ctx.clone(),
                    egui::ViewportId::ROOT,
                    window,
                    Some(self.renderer.pixels_per_point()),
                    window.theme(),
                    None,
                );
                self.egui_winit = Some(state);
            }
        }

        let egui_renderer = match (self.renderer.device(), self.renderer.surface_format()) {
            (Ok(device), Ok(format)) => EguiRenderer::new(device, format, RendererOptions::default()),
            (Err(err), _) | (_, Err(err)) => {
                log::error!("Unable to initialize egui renderer: {err:?}");
                self.should_close = true;
                return;
            }
        };
        self.egui_renderer = Some(egui_renderer);
        let size = self.renderer.size();
        self.egui_screen = Some(ScreenDescriptor {
            size_in_pixels: [size.width, size.height],
            pixels_per_point: self.renderer.pixels_per_point(),
        });

        if let Err(err) = self.renderer.init_voxel_pass(&self.grid) {
            log::error!("Voxel pass initialization error: {err:?}");
            self.should_close = true;
            return;
        }

        log::info!(
            "{} started: {}x{} window, {}^3 voxel grid",
            self.config.window.title,
            size.width,
            size.height,
            self.grid.width(),
        );
    }

    fn window_event(&mut self, _el: &ActiveEventLoop, id: winit::window::WindowId, event: WindowEvent) {
        // egui gets first refusal on window events.
        let mut consumed = false;
        if let (Some(window), Some(state)) = (self.renderer.window(), self.egui_winit.as_mut()) {
            if id == window.id() {
                consumed = state.on_window_event(window, &event).consumed;
            }
        }
        if !consumed {
            self.input.apply(InputEvent::from_window_event(&event), &mut self.flags);
        }

        if let WindowEvent::Resized(size) = &event {
            if let Some(sd) = &mut self.egui_screen {
                sd.size_in_pixels = [size.width, size.height];
            }
        }
    }

    fn device_event(&mut self, _e: &ActiveEventLoop, _dev: winit::event::DeviceId, ev: DeviceEvent) {
        self.input.apply(InputEvent::from_device_event(&ev), &mut self.flags);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_close || self.flags.contains(UpdateFlags::STOP) {
            self.flags.remove(UpdateFlags::STOP);
            log::info!("Stopping");
            event_loop.exit();
            return;
        }

        self.timer.begin();

        let raw_input = {
            let Some(window) = self.renderer.window() else {
                return;
            };
            let Some(state) = self.egui_winit.as_mut() else {
                return;
            };
            state.take_egui_input(window)
        };

        // UI layout runs before the drain so a panel size change observed
        // this frame is reconciled this frame.
        let ctx = self.egui_ctx.clone();
        let full_output = ctx.run(raw_input, |ctx| {
            self.panel.ui(ctx, &mut self.flags);
            ui_windows::diagnostics_window(ctx, &self.frame_data);
            ui_windows::controls_window(ctx);
        });

        let Some(egui_renderer) = self.egui_renderer.as_mut() else {
            return;
        };
        {
            let mut surfaces = AppSurfaces {
                renderer: &mut self.renderer,
                panel: &mut self.panel,
                egui_renderer,
            };
            if let Err(err) = frame_update::drain_update_flags(
                &mut self.flags,
                &self.input.state,
                &mut self.camera,
                &mut surfaces,
            ) {
                log::error!("Frame update failed, cannot continue: {err:?}");
                self.should_close = true;
                return;
            }
        }

        if let Err(err) = self
            .renderer
            .write_globals(&Globals::new(&self.camera, self.grid.extent()))
        {
            log::warn!("Camera upload failed: {err:?}");
        }
        // A panel still waiting for reallocation has no texture worth
        // dispatching into; the UI keeps its last image until the rebuild.
        let panel_view = if self.panel.needs_rebuild() { None } else { self.panel.view() };
        let frame = match self.renderer.render_scene(panel_view) {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!("Render error: {err:?}");
                self.input.clear_frame();
                return;
            }
        };

        let egui::FullOutput { platform_output, textures_delta, shapes, .. } = full_output;
        if let (Some(window), Some(state)) = (self.renderer.window(), self.egui_winit.as_mut()) {
            state.handle_platform_output(window, platform_output);
        }

        if let (Some(painter), Some(screen)) = (self.egui_renderer.as_mut(), self.egui_screen.as_ref())
        {
            if let (Ok(device), Ok(queue)) = (self.renderer.device(), self.renderer.queue()) {
                for (id, delta) in &textures_delta.set {
                    painter.update_texture(device, queue, *id, delta);
                }
            }
            let meshes = self.egui_ctx.tessellate(shapes, screen.pixels_per_point);
            if let Err(err) = self.renderer.render_egui(painter, &meshes, screen, frame) {
                log::warn!("Egui render error: {err:?}");
            }
            for id in &textures_delta.free {
                painter.free_texture(id);
            }
        } else {
            frame.present();
        }

        if self.timer.end(&mut self.frame_data) {
            log::debug!(
                "avg {:.1} fps / {:.3} ms",
                self.frame_data.avg_fps,
                self.frame_data.avg_frame_time
            );
        }
        self.input.clear_frame();

        if let Some(window) = self.renderer.window() {
            window.request_redraw();
        }
    }
}
