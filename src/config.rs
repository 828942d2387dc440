use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    pub fullscreen: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "CameraConfig::default_fov_deg")]
    pub fov_deg: f32,
    #[serde(default = "CameraConfig::default_near_clip")]
    pub near_clip: f32,
    #[serde(default = "CameraConfig::default_far_clip")]
    pub far_clip: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoxelConfig {
    /// Edge length of the cubic density grid, in voxels.
    #[serde(default = "VoxelConfig::default_grid_size")]
    pub grid_size: u32,
    /// Sphere radius as a fraction of the grid half-extent, in `(0, 1]`.
    #[serde(default = "VoxelConfig::default_sphere_radius")]
    pub sphere_radius: f32,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    pub window: WindowConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub voxel: VoxelConfig,
}

#[derive(Debug, Clone, Default)]
pub struct AppConfigOverrides {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub vsync: Option<bool>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Voxtrace".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
            fullscreen: false,
        }
    }
}

impl CameraConfig {
    const fn default_fov_deg() -> f32 {
        30.0
    }

    const fn default_near_clip() -> f32 {
        0.1
    }

    const fn default_far_clip() -> f32 {
        1000.0
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_deg: Self::default_fov_deg(),
            near_clip: Self::default_near_clip(),
            far_clip: Self::default_far_clip(),
        }
    }
}

impl VoxelConfig {
    const fn default_grid_size() -> u32 {
        64
    }

    const fn default_sphere_radius() -> f32 {
        0.8
    }
}

impl Default for VoxelConfig {
    fn default() -> Self {
        Self {
            grid_size: Self::default_grid_size(),
            sphere_radius: Self::default_sphere_radius(),
        }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                log::warn!("Config load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &AppConfigOverrides) {
        if let Some(width) = overrides.width {
            self.window.width = width;
        }
        if let Some(height) = overrides.height {
            self.window.height = height;
        }
        if let Some(vsync) = overrides.vsync {
            self.window.vsync = vsync;
        }
    }
}
