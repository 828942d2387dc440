use anyhow::{Context, Result};

use crate::camera::Camera;
use crate::input::InputState;
use crate::update_flags::UpdateFlags;

/// Radians of orbit per pixel of gated mouse motion.
pub const ORBIT_SENSITIVITY: f32 = 0.005;
/// Field-of-view degrees per scroll line. Negative so scrolling up zooms in.
pub const ZOOM_DEGREES_PER_LINE: f32 = -2.0;

/// Resize contract between the flag drain and the owners of the
/// GPU-adjacent surfaces.
///
/// Sizes are always re-queried through this trait rather than trusted from
/// the flag that announced them: the panel and the OS window resize on
/// independent cadences, and whichever value was cached when the flag was
/// raised may already be stale by the time the drain runs.
pub trait FrameSurfaces {
    /// Current content-region size of the viewport panel, in pixels.
    fn viewport_size(&self) -> (u32, u32);
    /// Current OS window size, in pixels.
    fn window_size(&self) -> (u32, u32);
    /// Destroy and recreate the render targets (and the panel's display
    /// texture on the owning side) at the given size.
    fn recreate_render_targets(&mut self, width: u32, height: u32) -> Result<()>;
    /// Reconfigure the window surface for a new window size.
    fn resize_window_surface(&mut self, width: u32, height: u32) -> Result<()>;
    /// Re-bind the compute pass image bindings to the recreated targets.
    fn rebind_compute_targets(&mut self) -> Result<()>;
}

/// Drain the accumulated flags for this frame, in fixed priority order.
///
/// Each step is conditional on its flag and clears that flag on exit, so a
/// second call with no new events is a true no-op. Camera-affecting steps
/// share a single view/projection recompute at the end regardless of how many
/// of them fired. `STOP` is left set for the frame loop to observe.
///
/// Resource recreation is not transactional: a failure leaves the pipeline
/// partially rebuilt and is returned as fatal.
pub fn drain_update_flags(
    flags: &mut UpdateFlags,
    input: &InputState,
    camera: &mut Camera,
    surfaces: &mut dyn FrameSurfaces,
) -> Result<()> {
    let mut camera_touched = false;
    let mut targets_recreated = false;

    if flags.contains(UpdateFlags::VIEWPORT_RESIZE) {
        let (width, height) = surfaces.viewport_size();
        if width > 0 && height > 0 {
            surfaces
                .recreate_render_targets(width, height)
                .context("Render target recreation failed after viewport resize")?;
            targets_recreated = true;
        }
        flags.remove(UpdateFlags::VIEWPORT_RESIZE);
    }

    if flags.contains(UpdateFlags::RESIZE) {
        let (width, height) = surfaces.window_size();
        if width > 0 && height > 0 {
            surfaces
                .resize_window_surface(width, height)
                .context("Surface reconfiguration failed after window resize")?;
            camera.set_aspect_ratio(width as f32 / height as f32);
            camera_touched = true;
        }
        flags.remove(UpdateFlags::RESIZE);
    }

    if flags.contains(UpdateFlags::ORBIT) {
        camera.orbit(input.mouse_dx * ORBIT_SENSITIVITY, input.mouse_dy * ORBIT_SENSITIVITY);
        camera_touched = true;
        flags.remove(UpdateFlags::ORBIT);
    }

    if flags.contains(UpdateFlags::ZOOM) {
        camera.zoom_fov(input.scroll_dy * ZOOM_DEGREES_PER_LINE);
        camera_touched = true;
        flags.remove(UpdateFlags::ZOOM);
    }

    if camera_touched {
        camera.update_view();
        camera.update_project();
    }

    if targets_recreated {
        surfaces
            .rebind_compute_targets()
            .context("Compute re-bind failed after target recreation")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum SurfaceCall {
        RecreateTargets(u32, u32),
        ResizeSurface(u32, u32),
        Rebind,
    }

    struct FakeSurfaces {
        viewport: (u32, u32),
        window: (u32, u32),
        calls: Vec<SurfaceCall>,
        fail_recreate: bool,
    }

    impl FakeSurfaces {
        fn new(viewport: (u32, u32), window: (u32, u32)) -> Self {
            Self { viewport, window, calls: Vec::new(), fail_recreate: false }
        }
    }

    impl FrameSurfaces for FakeSurfaces {
        fn viewport_size(&self) -> (u32, u32) {
            self.viewport
        }

        fn window_size(&self) -> (u32, u32) {
            self.window
        }

        fn recreate_render_targets(&mut self, width: u32, height: u32) -> Result<()> {
            if self.fail_recreate {
                return Err(anyhow!("out of memory"));
            }
            self.calls.push(SurfaceCall::RecreateTargets(width, height));
            Ok(())
        }

        fn resize_window_surface(&mut self, width: u32, height: u32) -> Result<()> {
            self.calls.push(SurfaceCall::ResizeSurface(width, height));
            Ok(())
        }

        fn rebind_compute_targets(&mut self) -> Result<()> {
            self.calls.push(SurfaceCall::Rebind);
            Ok(())
        }
    }

    #[test]
    fn batched_matrix_update_runs_once_for_resize_plus_orbit() {
        let mut camera = Camera::default();
        let mut input = InputState::default();
        input.mouse_dx = 12.0;
        input.mouse_dy = -4.0;
        let mut flags = UpdateFlags::RESIZE | UpdateFlags::ORBIT;
        let mut surfaces = FakeSurfaces::new((800, 600), (1600, 900));

        let (view_before, proj_before) = camera.matrix_updates_for_test();
        drain_update_flags(&mut flags, &input, &mut camera, &mut surfaces).expect("drain");
        let (view_after, proj_after) = camera.matrix_updates_for_test();

        assert_eq!(view_after - view_before, 1, "update_view must run exactly once");
        assert_eq!(proj_after - proj_before, 1, "update_project must run exactly once");
        assert_eq!(camera.aspect, 1600.0 / 900.0);
    }

    #[test]
    fn drain_clears_every_flag_it_handles() {
        let mut camera = Camera::default();
        let input = InputState::default();
        let mut flags = UpdateFlags::VIEWPORT_RESIZE
            | UpdateFlags::RESIZE
            | UpdateFlags::ORBIT
            | UpdateFlags::ZOOM
            | UpdateFlags::STOP;
        let mut surfaces = FakeSurfaces::new((640, 360), (1280, 720));

        drain_update_flags(&mut flags, &input, &mut camera, &mut surfaces).expect("drain");
        assert_eq!(flags, UpdateFlags::STOP, "STOP is the frame loop's to consume");
    }

    #[test]
    fn second_drain_without_new_events_is_a_no_op() {
        let mut camera = Camera::default();
        let input = InputState::default();
        let mut flags = UpdateFlags::VIEWPORT_RESIZE | UpdateFlags::ORBIT;
        let mut surfaces = FakeSurfaces::new((640, 360), (1280, 720));

        drain_update_flags(&mut flags, &input, &mut camera, &mut surfaces).expect("first drain");
        let calls_after_first = surfaces.calls.len();
        let updates_after_first = camera.matrix_updates_for_test();

        drain_update_flags(&mut flags, &input, &mut camera, &mut surfaces).expect("second drain");
        assert_eq!(surfaces.calls.len(), calls_after_first, "no resource work on empty flags");
        assert_eq!(camera.matrix_updates_for_test(), updates_after_first, "no matrix recompute");
    }

    #[test]
    fn viewport_is_reconciled_before_window_when_both_fire() {
        let mut camera = Camera::default();
        let input = InputState::default();
        let mut flags = UpdateFlags::RESIZE | UpdateFlags::VIEWPORT_RESIZE;
        let mut surfaces = FakeSurfaces::new((512, 256), (1920, 1080));

        drain_update_flags(&mut flags, &input, &mut camera, &mut surfaces).expect("drain");
        assert_eq!(
            surfaces.calls,
            vec![
                SurfaceCall::RecreateTargets(512, 256),
                SurfaceCall::ResizeSurface(1920, 1080),
                SurfaceCall::Rebind,
            ]
        );
        assert_eq!(camera.aspect, 1920.0 / 1080.0, "aspect comes from the window, not the panel");
    }

    #[test]
    fn sizes_come_from_the_owner_queries() {
        let mut camera = Camera::default();
        let input = InputState::default();
        let mut flags = UpdateFlags::VIEWPORT_RESIZE;
        // The drain must use whatever the owner reports now, not a value
        // captured when the flag was raised.
        let mut surfaces = FakeSurfaces::new((333, 444), (1280, 720));

        drain_update_flags(&mut flags, &input, &mut camera, &mut surfaces).expect("drain");
        assert_eq!(surfaces.calls[0], SurfaceCall::RecreateTargets(333, 444));
    }

    #[test]
    fn collapsed_viewport_skips_recreation_but_still_clears_the_flag() {
        let mut camera = Camera::default();
        let input = InputState::default();
        let mut flags = UpdateFlags::VIEWPORT_RESIZE;
        let mut surfaces = FakeSurfaces::new((0, 0), (1280, 720));

        drain_update_flags(&mut flags, &input, &mut camera, &mut surfaces).expect("drain");
        assert!(surfaces.calls.is_empty());
        assert!(flags.is_empty());
    }

    #[test]
    fn orbit_scales_accumulated_deltas_by_sensitivity() {
        let mut camera = Camera::default();
        let mut reference = camera.clone();
        let mut input = InputState::default();
        input.mouse_dx = 40.0;
        input.mouse_dy = -20.0;
        let mut flags = UpdateFlags::ORBIT;
        let mut surfaces = FakeSurfaces::new((800, 600), (1280, 720));

        drain_update_flags(&mut flags, &input, &mut camera, &mut surfaces).expect("drain");

        reference.orbit(40.0 * ORBIT_SENSITIVITY, -20.0 * ORBIT_SENSITIVITY);
        assert!((camera.position - reference.position).length() < 1e-5);
    }

    #[test]
    fn zoom_scales_scroll_delta() {
        let mut camera = Camera::default();
        let mut input = InputState::default();
        input.scroll_dy = 3.0;
        let mut flags = UpdateFlags::ZOOM;
        let mut surfaces = FakeSurfaces::new((800, 600), (1280, 720));

        let fov_before = camera.fov_deg;
        drain_update_flags(&mut flags, &input, &mut camera, &mut surfaces).expect("drain");
        assert_eq!(camera.fov_deg, fov_before + 3.0 * ZOOM_DEGREES_PER_LINE);
    }

    #[test]
    fn recreation_failure_is_fatal_and_skips_rebind() {
        let mut camera = Camera::default();
        let input = InputState::default();
        let mut flags = UpdateFlags::VIEWPORT_RESIZE;
        let mut surfaces = FakeSurfaces::new((800, 600), (1280, 720));
        surfaces.fail_recreate = true;

        let err = drain_update_flags(&mut flags, &input, &mut camera, &mut surfaces)
            .expect_err("recreation failure must bubble");
        assert!(err.to_string().contains("Render target recreation failed"));
        assert!(!surfaces.calls.contains(&SurfaceCall::Rebind));
    }
}
