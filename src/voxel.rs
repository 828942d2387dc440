use glam::Vec3;

/// Dense scalar density field, one `f32` per voxel.
///
/// Storage is z-major: `z * width * height + y * width + x`, matching the
/// layer order the 3D texture upload expects.
#[derive(Debug, Clone)]
pub struct VoxelGrid {
    data: Vec<f32>,
    width: u32,
    height: u32,
    depth: u32,
}

impl VoxelGrid {
    pub fn new(width: u32, height: u32, depth: u32) -> Self {
        Self {
            data: vec![0.0; (width * height * depth) as usize],
            width,
            height,
            depth,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn extent(&self) -> (u32, u32, u32) {
        (self.width, self.height, self.depth)
    }

    fn index(&self, x: u32, y: u32, z: u32) -> usize {
        (z * self.width * self.height + y * self.width + x) as usize
    }

    pub fn at(&self, x: u32, y: u32, z: u32) -> f32 {
        self.data[self.index(x, y, z)]
    }

    pub fn set(&mut self, x: u32, y: u32, z: u32, value: f32) {
        let i = self.index(x, y, z);
        self.data[i] = value;
    }

    /// Write a hard-edged density sphere. Voxels whose center falls within
    /// `radius` of `center` (in voxel units) get density 1.0.
    pub fn fill_sphere(&mut self, center: Vec3, radius: f32) {
        let radius_sq = radius * radius;
        for z in 0..self.depth {
            for y in 0..self.height {
                for x in 0..self.width {
                    let p = Vec3::new(x as f32 + 0.5, y as f32 + 0.5, z as f32 + 0.5);
                    if (p - center).length_squared() <= radius_sq {
                        self.set(x, y, z, 1.0);
                    }
                }
            }
        }
    }

    /// Raw bytes for the GPU upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}
