//! # Scene Camera
//!
//! The camera is an [`Actor`] whose model matrix is used directly as the view
//! matrix: moving the camera by `+z` moves the world towards the viewer.
//! Projection follows OpenGL conventions (right-handed view space, clip depth
//! in [-1, 1]).

use crate::foundation::math::{Mat4, Mat4Ext, Vec3};

use super::Actor;

/// Default vertical field of view in degrees
pub const DEFAULT_FOV: f32 = 45.0;
/// Default near plane distance
pub const DEFAULT_NEAR: f32 = 0.1;
/// Default far plane distance
pub const DEFAULT_FAR: f32 = 1000.0;

/// Perspective camera
///
/// # Screen Size
/// The aspect ratio is derived from the last [`Camera::set_screen_size`]
/// call. Both dimensions are clamped to at least one pixel, so a minimised
/// window still yields a finite, non-zero aspect.
#[derive(Debug, Clone)]
pub struct Camera {
    actor: Actor,
    fov: f32,
    near: f32,
    far: f32,
    screen_width: u32,
    screen_height: u32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            actor: Actor::new(),
            fov: DEFAULT_FOV,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
            screen_width: 1,
            screen_height: 1,
        }
    }
}

impl Camera {
    /// Camera at the origin with the default lens
    pub fn new() -> Self {
        Self::default()
    }

    /// Change the vertical field of view
    ///
    /// # Arguments
    /// * `fov` - Angle in degrees; values outside (0, 180) are ignored and the
    ///   previous value stays in place
    pub fn set_fov(&mut self, fov: f32) {
        if fov > 0.0 && fov < 180.0 {
            self.fov = fov;
        } else {
            log::trace!("Ignoring field of view {fov}");
        }
    }

    /// Vertical field of view in degrees
    pub const fn fov(&self) -> f32 {
        self.fov
    }

    /// Record the screen size used for the aspect ratio
    pub fn set_screen_size(&mut self, width: u32, height: u32) {
        self.screen_width = width.max(1);
        self.screen_height = height.max(1);
    }

    /// Width divided by height
    pub fn aspect(&self) -> f32 {
        self.screen_width as f32 / self.screen_height as f32
    }

    /// Perspective projection from the current lens and screen size
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_gl(self.fov, self.aspect(), self.near, self.far)
    }

    /// View matrix as of the last [`Camera::update`]
    pub const fn view_matrix(&self) -> &Mat4 {
        self.actor.matrix()
    }

    /// Near plane distance
    pub const fn near(&self) -> f32 {
        self.near
    }

    /// Far plane distance
    pub const fn far(&self) -> f32 {
        self.far
    }

    /// Rebuild the view matrix
    pub fn update(&mut self) {
        self.actor.update();
    }

    /// Camera position
    pub const fn position(&self) -> Vec3 {
        self.actor.position()
    }

    /// Place the camera
    pub fn set_position(&mut self, position: Vec3) {
        self.actor.set_position(position);
    }

    /// Replace the camera angles (degrees)
    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.actor.set_rotation(rotation);
    }

    /// Offset the camera
    pub fn move_by(&mut self, offset: Vec3) {
        self.actor.move_by(offset);
    }

    /// Turn the camera (degrees)
    pub fn rotate_by(&mut self, offset: Vec3) {
        self.actor.rotate_by(offset);
    }

    /// Underlying transform
    pub const fn actor(&self) -> &Actor {
        &self.actor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_lens() {
        let camera = Camera::new();
        assert_eq!(camera.fov(), 45.0);
        assert_eq!(camera.near(), 0.1);
        assert_eq!(camera.far(), 1000.0);
    }

    #[test]
    fn test_out_of_range_fov_is_ignored() {
        let mut camera = Camera::new();
        camera.set_fov(60.0);
        for bad in [0.0, -10.0, 180.0, 270.0] {
            camera.set_fov(bad);
            assert_eq!(camera.fov(), 60.0);
        }
    }

    #[test]
    fn test_aspect_survives_zero_height() {
        let mut camera = Camera::new();
        camera.set_screen_size(640, 400);
        assert_relative_eq!(camera.aspect(), 1.6);
        camera.set_screen_size(640, 0);
        assert_relative_eq!(camera.aspect(), 640.0);
        assert!(camera.projection_matrix().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_minimised_window_keeps_finite_projection() {
        let mut camera = Camera::new();
        for (width, height) in [(0, 0), (0, 400)] {
            camera.set_screen_size(width, height);
            assert!(camera.aspect() > 0.0);
            assert!(camera.projection_matrix().iter().all(|v| v.is_finite()));
        }
        assert_relative_eq!(camera.aspect(), 1.0 / 400.0);
    }

    #[test]
    fn test_projection_matches_lens() {
        let mut camera = Camera::new();
        camera.set_screen_size(800, 800);
        let proj = camera.projection_matrix();
        let focal = 1.0 / (45.0_f32.to_radians() / 2.0).tan();
        assert_relative_eq!(proj[(0, 0)], focal, epsilon = 1e-5);
        assert_relative_eq!(proj[(1, 1)], focal, epsilon = 1e-5);
    }

    #[test]
    fn test_view_matrix_follows_actor() {
        let mut camera = Camera::new();
        camera.set_position(Vec3::new(0.0, 0.0, -10.0));
        camera.update();
        let p = camera.view_matrix().transform_point(&nalgebra::Point3::origin());
        assert_relative_eq!(p.z, -10.0);
    }
}
