/// Placement and rotation matrices for generated meshes
use nalgebra::{Matrix4, Point3, Vector3};

/// Rotation state around three axes (in radians)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RotationState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl RotationState {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }
}

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Rotation matrix applying Z, then Y, then X
    pub fn rotation_matrix(rotation: &RotationState) -> Matrix4<f32> {
        let rx = Matrix4::new_rotation(Vector3::new(rotation.x, 0.0, 0.0));
        let ry = Matrix4::new_rotation(Vector3::new(0.0, rotation.y, 0.0));
        let rz = Matrix4::new_rotation(Vector3::new(0.0, 0.0, rotation.z));
        rz * ry * rx
    }

    pub fn translation_matrix(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    pub fn scale_matrix(sx: f32, sy: f32, sz: f32) -> Matrix4<f32> {
        Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz))
    }

    /// Where a generated mesh lands in the world: scale pixels to world
    /// units, spin around Z, then move to `origin`.
    pub fn placement(
        origin: Point3<f32>,
        rotation_z: f32,
        x_scale: f32,
        y_scale: f32,
        z_scale: f32,
    ) -> Matrix4<f32> {
        let rotation = Self::rotation_matrix(&RotationState::new(0.0, 0.0, rotation_z));
        Self::translation_matrix(origin.x, origin.y, origin.z)
            * rotation
            * Self::scale_matrix(x_scale, y_scale, z_scale)
    }

    /// Placement for an image of `pixel_width` x `pixel_height` pixels that
    /// should cover `world_width` x `world_height` units, with `height` world
    /// units of elevation per unit of mesh Z.
    pub fn fit_image(
        origin: Point3<f32>,
        rotation_z: f32,
        pixel_width: u32,
        pixel_height: u32,
        world_width: f32,
        world_height: f32,
        height: f32,
    ) -> Matrix4<f32> {
        let sx = if pixel_width > 0 { world_width / pixel_width as f32 } else { 1.0 };
        let sy = if pixel_height > 0 { world_height / pixel_height as f32 } else { 1.0 };
        Self::placement(origin, rotation_z, sx, sy, height)
    }
}
