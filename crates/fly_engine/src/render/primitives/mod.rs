//! Scene primitives
//!
//! Placed objects ([`Actor`]), the [`Camera`] and GPU [`Mesh`]es.

pub mod actor;
pub mod camera;
pub mod mesh;

pub use actor::Actor;
pub use camera::Camera;
pub use mesh::{Mesh, MotionState};
