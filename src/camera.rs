use glam::{Mat4, Quat, Vec3};

pub const FOV_MIN_DEG: f32 = 5.0;
pub const FOV_MAX_DEG: f32 = 180.0;

pub const DEFAULT_POSITION: Vec3 = Vec3::new(2.121, 2.121, 2.121);
pub const DEFAULT_FOV_DEG: f32 = 30.0;
pub const DEFAULT_ASPECT: f32 = 16.0 / 9.0;
pub const DEFAULT_NEAR_CLIP: f32 = 0.1;
pub const DEFAULT_FAR_CLIP: f32 = 1000.0;

const WORLD_UP: Vec3 = Vec3::Y;

/// Perspective orbit camera driving the voxel raymarch pass.
///
/// `view` and `proj` are cached and only rewritten by [`Camera::update_view`]
/// and [`Camera::update_project`]. Mutators leave them stale on purpose so a
/// frame's worth of orbit/zoom/resize changes can be batched into a single
/// matrix recompute before submission.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
    /// Orbit pivot. Independent of `position` except during orbit and dolly.
    pub target: Vec3,
    pub fov_deg: f32,
    pub aspect: f32,
    pub near_clip: f32,
    pub far_clip: f32,
    view: Mat4,
    proj: Mat4,
    #[cfg(test)]
    view_updates: usize,
    #[cfg(test)]
    proj_updates: usize,
}

impl Camera {
    pub fn new(position: Vec3, target: Vec3) -> Self {
        let mut camera = Self {
            position,
            forward: Vec3::NEG_Z,
            up: WORLD_UP,
            target,
            fov_deg: DEFAULT_FOV_DEG,
            aspect: DEFAULT_ASPECT,
            near_clip: DEFAULT_NEAR_CLIP,
            far_clip: DEFAULT_FAR_CLIP,
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
            #[cfg(test)]
            view_updates: 0,
            #[cfg(test)]
            proj_updates: 0,
        };
        camera.forward = (target - position).normalize();
        camera.orthonormalize();
        camera.update_view();
        camera.update_project();
        camera
    }

    pub fn right(&self) -> Vec3 {
        self.forward.cross(self.up).normalize()
    }

    fn orthonormalize(&mut self) {
        self.forward = self.forward.normalize();
        let right = self.forward.cross(self.up).normalize();
        self.up = right.cross(self.forward).normalize();
    }

    pub fn translate_world(&mut self, delta: Vec3) {
        self.position += delta;
    }

    /// Offset `position` in the camera's right/up/forward basis.
    pub fn translate_local(&mut self, delta: Vec3) {
        let right = self.right();
        self.position += right * delta.x + self.up * delta.y + self.forward * delta.z;
    }

    /// Yaw about the current up vector, then pitch about the resulting right
    /// vector. Roll is never applied.
    pub fn rotate(&mut self, yaw: f32, pitch: f32) {
        let yaw_rot = Quat::from_axis_angle(self.up, yaw);
        self.forward = (yaw_rot * self.forward).normalize();
        self.up = (yaw_rot * self.up).normalize();

        let pitch_rot = Quat::from_axis_angle(self.right(), pitch);
        self.forward = (pitch_rot * self.forward).normalize();
        self.up = (pitch_rot * self.up).normalize();

        self.orthonormalize();
    }

    /// Rotate `position` around `target` at constant radius.
    ///
    /// After the call `forward` points at `target` again.
    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        let offset = self.position - self.target;

        let yaw_rot = Quat::from_axis_angle(self.up, delta_yaw);
        let offset = yaw_rot * offset;
        let right = (yaw_rot * self.right()).normalize();

        let pitch_rot = Quat::from_axis_angle(right, delta_pitch);
        let offset = pitch_rot * offset;

        self.position = self.target + offset;
        self.forward = (self.target - self.position).normalize();
        self.up = (pitch_rot * (yaw_rot * self.up)).normalize();
        self.orthonormalize();
    }

    /// Saturating field-of-view change, clamped to `[FOV_MIN_DEG, FOV_MAX_DEG]`.
    pub fn zoom_fov(&mut self, delta_degrees: f32) {
        self.fov_deg = (self.fov_deg + delta_degrees).clamp(FOV_MIN_DEG, FOV_MAX_DEG);
    }

    /// Move both `position` and `target` along `forward`. Positive amounts
    /// dolly forward. Unlike translation this preserves the orbit radius.
    pub fn dolly(&mut self, amount: f32) {
        self.position += self.forward * amount;
        self.target += self.forward * amount;
    }

    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    pub fn set_clip(&mut self, near_clip: f32, far_clip: f32) {
        self.near_clip = near_clip;
        self.far_clip = far_clip;
    }

    pub fn update_view(&mut self) {
        self.view = Mat4::look_at_rh(self.position, self.position + self.forward, self.up);
        #[cfg(test)]
        {
            self.view_updates += 1;
        }
    }

    pub fn update_project(&mut self) {
        self.proj = Mat4::perspective_rh(
            self.fov_deg.to_radians(),
            self.aspect.max(0.0001),
            self.near_clip,
            self.far_clip,
        );
        #[cfg(test)]
        {
            self.proj_updates += 1;
        }
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn proj(&self) -> Mat4 {
        self.proj
    }

    /// Combined matrix. Assumes `view` and `proj` are already current.
    pub fn view_project(&self) -> Mat4 {
        self.proj * self.view
    }

    #[cfg(test)]
    pub fn matrix_updates_for_test(&self) -> (usize, usize) {
        (self.view_updates, self.proj_updates)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(DEFAULT_POSITION, Vec3::ZERO)
    }
}
