use crate::time::FrameData;

pub fn diagnostics_window(ctx: &egui::Context, frame_data: &FrameData) {
    egui::Window::new("Diagnostics").show(ctx, |ui| {
        ui.label(format!("Average FPS: {:.1}", frame_data.avg_fps));
        ui.label(format!("Average Frame Time: {:.3} ms", frame_data.avg_frame_time));
    });
}

pub fn controls_window(ctx: &egui::Context) {
    egui::Window::new("Controls").show(ctx, |ui| {
        ui.label("Orbit: Alt + right mouse drag");
        ui.label("Zoom: mouse wheel");
        ui.label("Quit: Escape");
    });
}
