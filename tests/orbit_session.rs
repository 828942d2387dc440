use std::f32::consts::PI;

use voxtrace::camera::{Camera, FOV_MIN_DEG};

const EPS: f32 = 1e-4;

#[test]
fn orbit_then_zoom_from_default_camera() {
    let mut camera = Camera::default();
    let initial_radius = (camera.position - camera.target).length();
    let initial_fov = camera.fov_deg;

    camera.orbit(PI / 4.0, PI / 8.0);
    camera.zoom_fov(-30.0);

    let expected_fov = (initial_fov - 30.0).max(FOV_MIN_DEG);
    assert_eq!(camera.fov_deg, expected_fov);

    let radius = (camera.position - camera.target).length();
    assert!((radius - initial_radius).abs() < EPS, "orbit changed the radius: {radius}");

    camera.update_view();
    camera.update_project();
    assert!(!camera.view_project().to_cols_array().iter().any(|v| v.is_nan() || v.is_infinite()));
}

#[test]
fn long_orbit_session_stays_well_formed() {
    let mut camera = Camera::default();
    let initial_radius = (camera.position - camera.target).length();

    for i in 0..500 {
        let step = i as f32 * 0.01;
        camera.orbit(0.05 * step.cos(), 0.03 * step.sin());
    }

    let radius = (camera.position - camera.target).length();
    assert!((radius - initial_radius).abs() < 1e-2, "radius drifted to {radius}");
    assert!((camera.forward.length() - 1.0).abs() < EPS);
    assert!((camera.up.length() - 1.0).abs() < EPS);
    assert!(camera.forward.dot(camera.up).abs() < EPS);

    let aimed = (camera.target - camera.position).normalize();
    assert!((camera.forward - aimed).length() < EPS, "forward stopped tracking the target");
}
