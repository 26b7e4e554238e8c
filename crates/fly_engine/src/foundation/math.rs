//! Math utilities and types
//!
//! nalgebra aliases plus the matrix builders the renderer needs. Matrices use
//! OpenGL conventions: column-major storage, right-handed view space and
//! clip-space depth in [-1, 1].

pub use nalgebra::{Matrix3, Matrix4, Vector2, Vector3};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Common math utilities
pub mod utils {
    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees.to_radians()
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians.to_degrees()
    }
}

/// Matrix builders on top of nalgebra
pub trait Mat4Ext {
    /// Rotation about the X axis, angle in degrees
    fn rotation_x_deg(degrees: f32) -> Self;

    /// Rotation about the Y axis, angle in degrees
    fn rotation_y_deg(degrees: f32) -> Self;

    /// Rotation about the Z axis, angle in degrees
    fn rotation_z_deg(degrees: f32) -> Self;

    /// OpenGL perspective projection with a vertical field of view in degrees
    fn perspective_gl(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self;

    /// Upper-left 3x3 block (rotation and scale part)
    fn upper_left_3x3(&self) -> Mat3;
}

impl Mat4Ext for Mat4 {
    fn rotation_x_deg(degrees: f32) -> Self {
        Self::from_axis_angle(&Vec3::x_axis(), utils::deg_to_rad(degrees))
    }

    fn rotation_y_deg(degrees: f32) -> Self {
        Self::from_axis_angle(&Vec3::y_axis(), utils::deg_to_rad(degrees))
    }

    fn rotation_z_deg(degrees: f32) -> Self {
        Self::from_axis_angle(&Vec3::z_axis(), utils::deg_to_rad(degrees))
    }

    fn perspective_gl(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self::new_perspective(aspect, utils::deg_to_rad(fov_y_degrees), near, far)
    }

    fn upper_left_3x3(&self) -> Mat3 {
        self.fixed_view::<3, 3>(0, 0).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rotation_quarter_turn() {
        let rot = Mat4::rotation_y_deg(90.0);
        let v = rot.transform_vector(&Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(v, Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-6);
    }

    #[test]
    fn test_perspective_maps_near_plane_to_minus_one() {
        let proj = Mat4::perspective_gl(45.0, 1.6, 0.1, 1000.0);
        let clip = proj * nalgebra::Vector4::new(0.0, 0.0, -0.1, 1.0);
        assert_relative_eq!(clip.z / clip.w, -1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_upper_left_block() {
        let m = Mat4::new_nonuniform_scaling(&Vec3::new(2.0, 3.0, 4.0))
            * Mat4::new_translation(&Vec3::new(5.0, 6.0, 7.0));
        let block = m.upper_left_3x3();
        assert_relative_eq!(block, Mat3::from_diagonal(&Vec3::new(2.0, 3.0, 4.0)));
    }
}
