//! Placed object in the world
//!
//! An [`Actor`] carries position, Euler rotation (degrees) and scale, and
//! caches the model matrix built from them. The cache only changes in
//! [`Actor::update`], so every draw within a frame sees the same matrix even
//! if a setter runs in between.

use crate::foundation::math::{Mat4, Mat4Ext, Vec3};

/// Position, rotation and scale with a cached model matrix
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    position: Vec3,
    rotation: Vec3,
    scale: Vec3,
    model: Mat4,
}

impl Default for Actor {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            model: Mat4::identity(),
        }
    }
}

impl Actor {
    /// Actor at the origin with unit scale
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the model matrix
    ///
    /// The composition is `Scale · Rx · Ry · Rz · Translate`, applied to
    /// column vectors, so translation happens first in the actor's own
    /// rotated and scaled frame.
    pub fn update(&mut self) {
        self.model = Self::compose(&self.position, &self.rotation, &self.scale);
    }

    /// Model matrix for the given transform parts
    pub fn compose(position: &Vec3, rotation: &Vec3, scale: &Vec3) -> Mat4 {
        Mat4::new_nonuniform_scaling(scale)
            * Mat4::rotation_x_deg(rotation.x)
            * Mat4::rotation_y_deg(rotation.y)
            * Mat4::rotation_z_deg(rotation.z)
            * Mat4::new_translation(position)
    }

    /// Model matrix as of the last [`Actor::update`]
    pub const fn matrix(&self) -> &Mat4 {
        &self.model
    }

    /// Current position
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Current Euler angles in degrees
    pub const fn rotation(&self) -> Vec3 {
        self.rotation
    }

    /// Current per-axis scale
    pub const fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Place the actor
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Replace the Euler angles (degrees)
    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
    }

    /// Replace the per-axis scale
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    /// Same scale on every axis
    pub fn set_uniform_scale(&mut self, value: f32) {
        self.scale = Vec3::new(value, value, value);
    }

    /// Offset the position
    pub fn move_by(&mut self, offset: Vec3) {
        self.position += offset;
    }

    /// Add to the Euler angles (degrees)
    pub fn rotate_by(&mut self, offset: Vec3) {
        self.rotation += offset;
    }

    /// Add to every scale component
    pub fn grow_by(&mut self, offset: Vec3) {
        self.scale += offset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_matrix_only_changes_on_update() {
        let mut actor = Actor::new();
        actor.set_position(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(actor.matrix(), &Mat4::identity());

        actor.update();
        let origin = actor.matrix().transform_point(&nalgebra::Point3::origin());
        assert_relative_eq!(origin.coords, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_translation_is_scaled() {
        let mut actor = Actor::new();
        actor.set_position(Vec3::new(1.0, 0.0, 0.0));
        actor.set_uniform_scale(2.0);
        actor.update();
        let origin = actor.matrix().transform_point(&nalgebra::Point3::origin());
        assert_relative_eq!(origin.coords, Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_negative_y_scale_mirrors() {
        let mut actor = Actor::new();
        actor.set_scale(Vec3::new(1.0, -1.0, 1.0));
        actor.update();
        let p = actor.matrix().transform_point(&nalgebra::Point3::new(0.0, 5.0, 0.0));
        assert_relative_eq!(p.y, -5.0);
    }

    #[test]
    fn test_relative_motion_accumulates() {
        let mut actor = Actor::new();
        actor.move_by(Vec3::new(1.0, 0.0, 0.0));
        actor.move_by(Vec3::new(0.0, -2.0, 0.0));
        actor.rotate_by(Vec3::new(0.0, 90.0, 0.0));
        actor.rotate_by(Vec3::new(0.0, 90.0, 0.0));
        actor.grow_by(Vec3::new(0.5, 0.5, 0.5));
        assert_eq!(actor.position(), Vec3::new(1.0, -2.0, 0.0));
        assert_eq!(actor.rotation(), Vec3::new(0.0, 180.0, 0.0));
        assert_eq!(actor.scale(), Vec3::new(1.5, 1.5, 1.5));
    }
}
