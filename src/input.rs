use winit::event::{DeviceEvent, ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{Key, NamedKey};

use crate::update_flags::UpdateFlags;

/// Accumulated per-frame input.
///
/// The mouse and scroll deltas are frame-local: they are reset by
/// [`Input::clear_frame`] at the end of every frame and only ever hold the
/// motion observed since then. The `*_held` booleans are level-triggered and
/// persist across frames until the matching release event arrives.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputState {
    pub mouse_dx: f32,
    pub mouse_dy: f32,
    pub scroll_dx: f32,
    pub scroll_dy: f32,

    pub lmb_held: bool,
    pub mmb_held: bool,
    pub rmb_held: bool,

    pub alt_held: bool,
    pub ctrl_held: bool,
    pub shift_held: bool,
}

/// Platform events reduced to the cases the aggregator cares about.
pub enum InputEvent {
    Key { key: Key, pressed: bool },
    MouseMove { dx: f32, dy: f32 },
    Wheel { dx: f32, dy: f32 },
    MouseButton { button: MouseButton, pressed: bool },
    WindowResized,
    CloseRequested,
    Other,
}

impl InputEvent {
    pub fn from_window_event(ev: &WindowEvent) -> Self {
        match ev {
            WindowEvent::KeyboardInput { event, .. } => InputEvent::Key {
                key: event.logical_key.clone(),
                pressed: event.state == ElementState::Pressed,
            },
            WindowEvent::MouseInput { state, button, .. } => InputEvent::MouseButton {
                button: *button,
                pressed: *state == ElementState::Pressed,
            },
            WindowEvent::MouseWheel { delta, .. } => {
                let (dx, dy) = match delta {
                    MouseScrollDelta::LineDelta(x, y) => (*x, *y),
                    MouseScrollDelta::PixelDelta(p) => (p.x as f32, p.y as f32),
                };
                InputEvent::Wheel { dx, dy }
            }
            WindowEvent::Resized(_) => InputEvent::WindowResized,
            WindowEvent::CloseRequested => InputEvent::CloseRequested,
            _ => InputEvent::Other,
        }
    }

    pub fn from_device_event(ev: &DeviceEvent) -> Self {
        match ev {
            DeviceEvent::MouseMotion { delta: (dx, dy) } => {
                InputEvent::MouseMove { dx: *dx as f32, dy: *dy as f32 }
            }
            _ => InputEvent::Other,
        }
    }
}

/// Folds the raw event stream into [`InputState`] and raised [`UpdateFlags`].
#[derive(Default)]
pub struct Input {
    pub state: InputState,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event in arrival order. Unrecognized events are dropped.
    pub fn apply(&mut self, event: InputEvent, flags: &mut UpdateFlags) {
        match event {
            InputEvent::Key { key, pressed } => self.apply_key(&key, pressed, flags),
            InputEvent::MouseButton { button, pressed } => match button {
                MouseButton::Left => self.state.lmb_held = pressed,
                MouseButton::Middle => self.state.mmb_held = pressed,
                MouseButton::Right => self.state.rmb_held = pressed,
                _ => {}
            },
            InputEvent::MouseMove { dx, dy } => {
                // Orbit gate: motion only counts while Alt and the right
                // button are both down. Anything else is dropped outright.
                if self.state.alt_held && self.state.rmb_held {
                    self.state.mouse_dx += dx;
                    self.state.mouse_dy += dy;
                    flags.insert(UpdateFlags::ORBIT);
                }
            }
            InputEvent::Wheel { dx, dy } => {
                self.state.scroll_dx += dx;
                self.state.scroll_dy += dy;
                flags.insert(UpdateFlags::ZOOM);
            }
            InputEvent::WindowResized => {
                flags.insert(UpdateFlags::RESIZE);
            }
            InputEvent::CloseRequested => {
                flags.insert(UpdateFlags::STOP);
            }
            InputEvent::Other => {}
        }
    }

    fn apply_key(&mut self, key: &Key, pressed: bool, flags: &mut UpdateFlags) {
        match key {
            Key::Named(NamedKey::Escape) => {
                if pressed {
                    flags.insert(UpdateFlags::STOP);
                }
            }
            Key::Named(NamedKey::Alt) => self.state.alt_held = pressed,
            Key::Named(NamedKey::Shift) => self.state.shift_held = pressed,
            Key::Named(NamedKey::Control) => {
                // Press-only: release is not tracked. Pinned by
                // tests::ctrl_stays_latched_after_release.
                if pressed {
                    self.state.ctrl_held = true;
                }
            }
            _ => {}
        }
    }

    /// Reset the frame-local deltas. Held-button and modifier state survives.
    pub fn clear_frame(&mut self) {
        self.state.mouse_dx = 0.0;
        self.state.mouse_dy = 0.0;
        self.state.scroll_dx = 0.0;
        self.state.scroll_dy = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(named: NamedKey, pressed: bool) -> InputEvent {
        InputEvent::Key { key: Key::Named(named), pressed }
    }

    fn button(button: MouseButton, pressed: bool) -> InputEvent {
        InputEvent::MouseButton { button, pressed }
    }

    #[test]
    fn orbit_motion_requires_alt_and_right_button() {
        let mut input = Input::new();
        let mut flags = UpdateFlags::empty();

        input.apply(InputEvent::MouseMove { dx: 4.0, dy: -2.0 }, &mut flags);
        assert_eq!(input.state.mouse_dx, 0.0);
        assert!(!flags.contains(UpdateFlags::ORBIT));

        input.apply(key(NamedKey::Alt, true), &mut flags);
        input.apply(InputEvent::MouseMove { dx: 4.0, dy: -2.0 }, &mut flags);
        assert_eq!(input.state.mouse_dx, 0.0, "alt alone must not open the gate");

        input.apply(button(MouseButton::Right, true), &mut flags);
        input.apply(InputEvent::MouseMove { dx: 4.0, dy: -2.0 }, &mut flags);
        assert_eq!(input.state.mouse_dx, 4.0);
        assert_eq!(input.state.mouse_dy, -2.0);
        assert!(flags.contains(UpdateFlags::ORBIT));
    }

    #[test]
    fn gated_motion_accumulates_across_events() {
        let mut input = Input::new();
        let mut flags = UpdateFlags::empty();
        input.apply(key(NamedKey::Alt, true), &mut flags);
        input.apply(button(MouseButton::Right, true), &mut flags);

        input.apply(InputEvent::MouseMove { dx: 1.0, dy: 2.0 }, &mut flags);
        input.apply(InputEvent::MouseMove { dx: 3.0, dy: -1.0 }, &mut flags);
        assert_eq!(input.state.mouse_dx, 4.0);
        assert_eq!(input.state.mouse_dy, 1.0);
    }

    #[test]
    fn alt_clears_on_release() {
        let mut input = Input::new();
        let mut flags = UpdateFlags::empty();
        input.apply(key(NamedKey::Alt, true), &mut flags);
        assert!(input.state.alt_held);
        input.apply(key(NamedKey::Alt, false), &mut flags);
        assert!(!input.state.alt_held);
    }

    #[test]
    fn ctrl_stays_latched_after_release() {
        let mut input = Input::new();
        let mut flags = UpdateFlags::empty();
        input.apply(key(NamedKey::Control, true), &mut flags);
        assert!(input.state.ctrl_held);
        input.apply(key(NamedKey::Control, false), &mut flags);
        assert!(input.state.ctrl_held, "ctrl release is deliberately not handled");
    }

    #[test]
    fn escape_and_close_raise_stop() {
        let mut input = Input::new();
        let mut flags = UpdateFlags::empty();
        input.apply(key(NamedKey::Escape, true), &mut flags);
        assert!(flags.contains(UpdateFlags::STOP));

        let mut flags = UpdateFlags::empty();
        input.apply(InputEvent::CloseRequested, &mut flags);
        assert!(flags.contains(UpdateFlags::STOP));
    }

    #[test]
    fn wheel_accumulates_and_raises_zoom() {
        let mut input = Input::new();
        let mut flags = UpdateFlags::empty();
        input.apply(InputEvent::Wheel { dx: 0.0, dy: 1.0 }, &mut flags);
        input.apply(InputEvent::Wheel { dx: 0.0, dy: 2.0 }, &mut flags);
        assert_eq!(input.state.scroll_dy, 3.0);
        assert!(flags.contains(UpdateFlags::ZOOM));
    }

    #[test]
    fn window_resize_raises_resize_flag() {
        let mut input = Input::new();
        let mut flags = UpdateFlags::empty();
        input.apply(InputEvent::WindowResized, &mut flags);
        assert!(flags.contains(UpdateFlags::RESIZE));
    }

    #[test]
    fn clear_frame_resets_deltas_but_keeps_held_state() {
        let mut input = Input::new();
        let mut flags = UpdateFlags::empty();
        input.apply(key(NamedKey::Alt, true), &mut flags);
        input.apply(button(MouseButton::Right, true), &mut flags);
        input.apply(InputEvent::MouseMove { dx: 9.0, dy: 9.0 }, &mut flags);
        input.apply(InputEvent::Wheel { dx: 1.0, dy: 1.0 }, &mut flags);

        input.clear_frame();
        assert_eq!(input.state.mouse_dx, 0.0);
        assert_eq!(input.state.mouse_dy, 0.0);
        assert_eq!(input.state.scroll_dx, 0.0);
        assert_eq!(input.state.scroll_dy, 0.0);
        assert!(input.state.alt_held);
        assert!(input.state.rmb_held);
    }
}
