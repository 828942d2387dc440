use anyhow::Result;
use egui_wgpu::Renderer as EguiRenderer;

use crate::renderer::PANEL_FORMAT;
use crate::update_flags::UpdateFlags;

const PANEL_TITLE: &str = "Viewport";
const DEFAULT_PANEL_SIZE: (u32, u32) = (800, 600);

struct PanelTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    egui_id: egui::TextureId,
}

/// The UI panel that hosts the rendered image.
///
/// Owns the color texture the display pass writes into and its egui
/// registration. `width`/`height` track the last-known content-region size;
/// when layout reports a different size the panel raises the resize flags and
/// marks itself for rebuild. The renderer side clears `needs_rebuild` by
/// calling [`ViewportPanel::rebuild`].
pub struct ViewportPanel {
    width: u32,
    height: u32,
    needs_rebuild: bool,
    texture: Option<PanelTexture>,
}

impl ViewportPanel {
    pub fn new() -> Self {
        Self {
            width: DEFAULT_PANEL_SIZE.0,
            height: DEFAULT_PANEL_SIZE.1,
            needs_rebuild: true,
            texture: None,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn needs_rebuild(&self) -> bool {
        self.needs_rebuild
    }

    pub fn view(&self) -> Option<&wgpu::TextureView> {
        self.texture.as_ref().map(|t| &t.view)
    }

    /// Lay out the panel for this frame. A content-region size change raises
    /// both resize flags: the targets follow the panel, the camera aspect
    /// follows the window, and the two are reconciled independently by the
    /// frame drain.
    pub fn ui(&mut self, ctx: &egui::Context, flags: &mut UpdateFlags) {
        egui::Window::new(PANEL_TITLE)
            .default_size([DEFAULT_PANEL_SIZE.0 as f32, DEFAULT_PANEL_SIZE.1 as f32])
            .show(ctx, |ui| {
                let avail = ui.available_size();
                let ppp = ui.ctx().pixels_per_point();
                let width = (avail.x * ppp).round().max(0.0) as u32;
                let height = (avail.y * ppp).round().max(0.0) as u32;

                let size_changed = width != self.width || height != self.height;
                let missing_texture = self.texture.is_none() && width > 0 && height > 0;
                if size_changed || missing_texture {
                    self.width = width;
                    self.height = height;
                    self.needs_rebuild = true;
                    flags.insert(UpdateFlags::VIEWPORT_RESIZE | UpdateFlags::RESIZE);
                }

                if let Some(texture) = &self.texture {
                    ui.image((texture.egui_id, avail));
                }
            });
    }

    /// Replace the display texture at the given size and re-register it with
    /// egui. Clears `needs_rebuild`.
    pub fn rebuild(
        &mut self,
        device: &wgpu::Device,
        egui_renderer: &mut EguiRenderer,
        width: u32,
        height: u32,
    ) -> Result<()> {
        if let Some(old) = self.texture.take() {
            egui_renderer.free_texture(&old.egui_id);
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Viewport Panel Texture"),
            size: wgpu::Extent3d { width: width.max(1), height: height.max(1), depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: PANEL_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let egui_id = egui_renderer.register_native_texture(device, &view, wgpu::FilterMode::Linear);

        self.texture = Some(PanelTexture { _texture: texture, view, egui_id });
        self.width = width;
        self.height = height;
        self.needs_rebuild = false;
        Ok(())
    }
}

impl Default for ViewportPanel {
    fn default() -> Self {
        Self::new()
    }
}
